//! Route handlers. Each mutating handler runs one database operation and
//! redirects back to a listing page with a flash message.

use actix_web::{web, HttpRequest, HttpResponse};
use tera::Tera;

use super::db::{
    self, AddWine, ConsumeWine, DeleteConsumption, DeleteWine, EditConsumption, EditWine,
    ListConsumptions, ListWines, Pool, RestockOutcome, RestockWine,
};
use super::error::{Error, Result};
use super::form::{self, DeleteConsumptionForm, TastingForm, WineFields, WineForm};
use super::views::{self, IndexParams, ViewMode};

pub mod util;

use self::util::{page, redirect, Flash};

const WINES_PAGE: &str = "/";
const CONSUMPTIONS_PAGE: &str = "/consumptions";

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: Pool,
    pub templates: Tera,
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/wines", web::post().to(add_wine))
        .route("/wines/{id}/edit", web::post().to(edit_wine))
        .route("/wines/{id}/consume", web::post().to(consume_wine))
        .route("/wines/{id}/restock", web::post().to(restock_wine))
        .route("/wines/{id}/delete", web::post().to(delete_wine))
        .route("/consumptions", web::get().to(consumption_history))
        .route("/consumptions/{id}/edit", web::post().to(edit_consumption))
        .route("/consumptions/{id}/delete", web::post().to(delete_consumption));
}

#[derive(Debug, Deserialize)]
struct IndexQuery {
    q: Option<String>,
    status: Option<String>,
    view: Option<String>,
}

/// Lists wines, optionally filtered by a search term and status.
async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<IndexQuery>,
) -> Result<HttpResponse> {
    let search_term = query.q.as_deref().unwrap_or("").trim();
    let status_filter = query.status.as_deref().unwrap_or("");

    let listing = db::execute(
        &state.db,
        ListWines {
            search: form::clean_text(Some(search_term)),
            status: status_filter.parse().ok(),
        },
    )
    .await?;

    let flash = Flash::from_request(&req);
    let params = IndexParams {
        search_term,
        status_filter,
        view_mode: ViewMode::from_param(query.view.as_deref()),
    };
    let body = views::index(&state.templates, &listing, &params, flash.as_ref())?;

    Ok(page(body, flash.is_some()))
}

/// Route handler for adding a wine to the cellar.
///
/// Expects the following POST data, all optional except `name`:
///
/// - `name`, `varietal`, `region`, `purchase_location`, `notes`: free text
/// - `vintage`, `quantity`: integers (quantity defaults to 1)
/// - `price_paid`: decimal amount
async fn add_wine(state: web::Data<AppState>, form: web::Form<WineForm>) -> Result<HttpResponse> {
    let query = AddWine {
        fields: WineFields::from(&*form),
    };

    match db::execute(&state.db, query).await {
        Ok(wine) => {
            info!("Added wine {} ({})", wine.id, wine.name);
            Ok(redirect(WINES_PAGE, Flash::success("Wine added to your cellar.")))
        }
        Err(Error::Validation(message)) => Ok(redirect(WINES_PAGE, Flash::error(message))),
        Err(e) => Err(e),
    }
}

/// Route handler for overwriting every field of a wine.
async fn edit_wine(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Form<WineForm>,
) -> Result<HttpResponse> {
    let query = EditWine {
        wine_id: path.into_inner(),
        fields: WineFields::from(&*form),
    };

    match db::execute(&state.db, query).await {
        Ok(wine) => Ok(redirect(
            WINES_PAGE,
            Flash::success(format!("Updated {}.", wine.name)),
        )),
        Err(Error::Validation(message)) => Ok(redirect(WINES_PAGE, Flash::error(message))),
        Err(e) => Err(e),
    }
}

/// Route handler for drinking one bottle.
///
/// Optional POST data `tasting_notes`, `experience_notes` and `rating` are
/// recorded on the new consumption entry, and copied onto the wine when given.
async fn consume_wine(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Form<TastingForm>,
) -> Result<HttpResponse> {
    let query = ConsumeWine {
        wine_id: path.into_inner(),
        tasting: (&*form).into(),
    };
    let (wine, entry) = db::execute(&state.db, query).await?;

    debug!("Recorded consumption {} for wine {}", entry.id, wine.id);
    Ok(redirect(
        WINES_PAGE,
        Flash::success(format!("Marked a bottle of {} as enjoyed.", wine.name)),
    ))
}

async fn restock_wine(state: web::Data<AppState>, path: web::Path<i32>) -> Result<HttpResponse> {
    let query = RestockWine {
        wine_id: path.into_inner(),
    };
    let wine = db::execute(&state.db, query).await?;

    Ok(redirect(
        WINES_PAGE,
        Flash::success(format!("Restocked {}.", wine.name)),
    ))
}

async fn delete_wine(state: web::Data<AppState>, path: web::Path<i32>) -> Result<HttpResponse> {
    let query = DeleteWine {
        wine_id: path.into_inner(),
    };
    let wine = db::execute(&state.db, query).await?;

    info!("Deleted wine {} ({})", wine.id, wine.name);
    Ok(redirect(
        WINES_PAGE,
        Flash::info(format!("Removed {} from your cellar.", wine.name)),
    ))
}

async fn consumption_history(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let entries = db::execute(&state.db, ListConsumptions).await?;

    let flash = Flash::from_request(&req);
    let body = views::consumptions(&state.templates, &entries, flash.as_ref())?;

    Ok(page(body, flash.is_some()))
}

async fn edit_consumption(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Form<TastingForm>,
) -> Result<HttpResponse> {
    let query = EditConsumption {
        consumption_id: path.into_inner(),
        tasting: (&*form).into(),
    };
    let entry = db::execute(&state.db, query).await?;

    Ok(redirect(
        CONSUMPTIONS_PAGE,
        Flash::success(format!("Updated notes for {}.", entry.wine_name)),
    ))
}

/// Route handler for removing a consumption entry.
///
/// POST data `restock=1` puts the bottle back into the linked wine's
/// inventory, when that wine still exists.
async fn delete_consumption(
    state: web::Data<AppState>,
    path: web::Path<i32>,
    form: web::Form<DeleteConsumptionForm>,
) -> Result<HttpResponse> {
    let query = DeleteConsumption {
        consumption_id: path.into_inner(),
        restock: form.restock_requested(),
    };
    let (entry, outcome) = db::execute(&state.db, query).await?;

    let flash = match outcome {
        RestockOutcome::WineMissing => Flash::info(
            "Consumption removed, but the linked cellar entry was missing so inventory was unchanged.",
        ),
        RestockOutcome::Restocked => Flash::success(format!(
            "Removed consumption entry for {} and restored inventory.",
            entry.wine_name
        )),
        RestockOutcome::NotRequested => Flash::success(format!(
            "Removed consumption entry for {}.",
            entry.wine_name
        )),
    };

    Ok(redirect(CONSUMPTIONS_PAGE, flash))
}
