//! HTML pages, rendered with Tera from templates compiled into the binary.

use tera::{Context, Tera};

use super::api::util::Flash;
use super::db::{CellarStats, WineListing};
use super::error::Result;
use super::models::{Consumption, Wine};

const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Builds the template set used by every page.
pub fn templates() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        ("index.html", include_str!("../templates/index.html")),
        ("consumptions.html", include_str!("../templates/consumptions.html")),
    ])?;
    Ok(tera)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Cards,
    Table,
}

impl ViewMode {
    /// Anything other than `table` falls back to cards.
    pub fn from_param(value: Option<&str>) -> ViewMode {
        match value {
            Some("table") => ViewMode::Table,
            _ => ViewMode::Cards,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Cards => "cards",
            ViewMode::Table => "table",
        }
    }
}

#[derive(Serialize)]
struct WineView<'a> {
    id: i32,
    name: &'a str,
    varietal: Option<&'a str>,
    region: Option<&'a str>,
    vintage: Option<i32>,
    quantity: i32,
    status: &'static str,
    status_label: &'static str,
    price_paid: Option<String>,
    purchase_location: Option<&'a str>,
    notes: Option<&'a str>,
    tasting_notes: Option<&'a str>,
    experience_notes: Option<&'a str>,
    rating: Option<String>,
    created_at: String,
}

impl<'a> From<&'a Wine> for WineView<'a> {
    fn from(wine: &'a Wine) -> WineView<'a> {
        WineView {
            id: wine.id,
            name: &wine.name,
            varietal: wine.varietal.as_deref(),
            region: wine.region.as_deref(),
            vintage: wine.vintage,
            quantity: wine.safe_quantity(),
            status: wine.status.as_str(),
            status_label: wine.status_label(),
            price_paid: wine.price_paid.map(|p| p.to_string()),
            purchase_location: wine.purchase_location.as_deref(),
            notes: wine.notes.as_deref(),
            tasting_notes: wine.tasting_notes.as_deref(),
            experience_notes: wine.experience_notes.as_deref(),
            rating: wine.rating.map(|r| r.to_string()),
            created_at: wine.created_at.format(DISPLAY_TIME_FORMAT).to_string(),
        }
    }
}

#[derive(Serialize)]
struct ConsumptionView<'a> {
    id: i32,
    wine_id: Option<i32>,
    wine_name: &'a str,
    consumed_at: String,
    quantity: i32,
    rating: Option<String>,
    tasting_notes: Option<&'a str>,
    experience_notes: Option<&'a str>,
}

impl<'a> From<&'a Consumption> for ConsumptionView<'a> {
    fn from(entry: &'a Consumption) -> ConsumptionView<'a> {
        ConsumptionView {
            id: entry.id,
            wine_id: entry.wine_id,
            wine_name: &entry.wine_name,
            consumed_at: entry.consumed_at.format(DISPLAY_TIME_FORMAT).to_string(),
            quantity: entry.quantity,
            rating: entry.rating.map(|r| r.to_string()),
            tasting_notes: entry.tasting_notes.as_deref(),
            experience_notes: entry.experience_notes.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct StatsView {
    total: i64,
    cellar: i64,
    enjoyed: i64,
}

impl From<CellarStats> for StatsView {
    fn from(stats: CellarStats) -> StatsView {
        StatsView {
            total: stats.total,
            cellar: stats.cellar,
            enjoyed: stats.enjoyed,
        }
    }
}

/// Inputs echoed back on the listing page.
pub struct IndexParams<'a> {
    pub search_term: &'a str,
    pub status_filter: &'a str,
    pub view_mode: ViewMode,
}

pub fn index(
    tera: &Tera,
    listing: &WineListing,
    params: &IndexParams,
    flash: Option<&Flash>,
) -> Result<String> {
    let wines: Vec<WineView> = listing.wines.iter().map(WineView::from).collect();

    let mut context = Context::new();
    context.insert("wines", &wines);
    context.insert("stats", &StatsView::from(listing.stats));
    context.insert("search_term", params.search_term);
    context.insert("status_filter", params.status_filter);
    context.insert("view_mode", params.view_mode.as_str());
    context.insert("flash", &flash);

    Ok(tera.render("index.html", &context)?)
}

pub fn consumptions(tera: &Tera, entries: &[Consumption], flash: Option<&Flash>) -> Result<String> {
    let entries: Vec<ConsumptionView> = entries.iter().map(ConsumptionView::from).collect();

    let mut context = Context::new();
    context.insert("consumptions", &entries);
    context.insert("flash", &flash);

    Ok(tera.render("consumptions.html", &context)?)
}
