use actix_web::web;
use chrono::Utc;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, CustomizeConnection};
use diesel::sql_types::Integer;
use diesel::sqlite::SqliteConnection;

use std::marker::Send;

use super::error::{Error, Result};
use super::form::{Tasting, WineFields};
use super::models::{Consumption, NewConsumption, NewWine, Status, Wine};
use super::schema;

pub type Pool = r2d2::Pool<r2d2::ConnectionManager<SqliteConnection>>;

no_arg_sql_function!(last_insert_rowid, Integer);

/// Per-connection settings. SQLite only enforces `ON DELETE SET NULL` when
/// foreign keys are switched on, and that setting does not persist.
pub fn configure(conn: &SqliteConnection) -> QueryResult<()> {
    conn.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")
}

#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> ::std::result::Result<(), r2d2::Error> {
        configure(conn).map_err(r2d2::Error::QueryError)
    }
}

/// Opens a connection pool to the SQLite database at `database_url`.
pub fn connect(database_url: &str, max_size: u32) -> Result<Pool> {
    let manager = r2d2::ConnectionManager::<SqliteConnection>::new(database_url);

    Ok(r2d2::Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)?)
}

/// A single unit of database work, run inside one transaction.
pub trait Query {
    type Item: Send;

    fn execute(&self, conn: &SqliteConnection) -> Result<Self::Item>;
}

/// Runs `query` on the blocking thread pool with a pooled connection.
pub async fn execute<T>(pool: &Pool, query: T) -> Result<T::Item>
where
    T: Query + Send + 'static,
    T::Item: 'static,
{
    let pool = pool.clone();

    Ok(web::block(move || -> Result<T::Item> {
        let conn = pool.get()?;
        query.execute(&conn)
    })
    .await?)
}

fn find_wine(conn: &SqliteConnection, wine_id: i32) -> Result<Wine> {
    schema::wine::table
        .find(wine_id)
        .first::<Wine>(conn)
        .optional()?
        .ok_or(Error::WineNotFound(wine_id))
}

fn find_consumption(conn: &SqliteConnection, consumption_id: i32) -> Result<Consumption> {
    schema::consumption::table
        .find(consumption_id)
        .first::<Consumption>(conn)
        .optional()?
        .ok_or(Error::ConsumptionNotFound(consumption_id))
}

/*************************************/
/** List Wines query                **/
/*************************************/

#[derive(Debug, Default, Clone)]
pub struct ListWines {
    pub search: Option<String>,
    pub status: Option<Status>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellarStats {
    pub total: i64,
    pub cellar: i64,
    pub enjoyed: i64,
}

#[derive(Debug)]
pub struct WineListing {
    pub wines: Vec<Wine>,
    pub stats: CellarStats,
}

impl Query for ListWines {
    type Item = WineListing;

    fn execute(&self, conn: &SqliteConnection) -> Result<WineListing> {
        use self::schema::wine::dsl::*;

        let mut query = wine.into_boxed();

        if let Some(term) = &self.search {
            // SQLite's LIKE is case-insensitive for ASCII.
            let pattern = format!("%{}%", term);
            query = query.filter(
                name.like(pattern.clone())
                    .or(varietal.like(pattern.clone()))
                    .or(region.like(pattern.clone()))
                    .or(purchase_location.like(pattern.clone()))
                    .or(notes.like(pattern)),
            );
        }
        if let Some(filter) = self.status {
            query = query.filter(status.eq(filter));
        }

        let wines = query
            .order((created_at.desc(), id.desc()))
            .load::<Wine>(conn)?;

        let stats = CellarStats {
            total: wine.count().get_result(conn)?,
            cellar: wine.filter(status.eq(Status::Cellar)).count().get_result(conn)?,
            enjoyed: wine.filter(status.eq(Status::Enjoyed)).count().get_result(conn)?,
        };

        Ok(WineListing { wines, stats })
    }
}

/*************************************/
/** Add Wine message                **/
/*************************************/

pub struct AddWine {
    pub fields: WineFields,
}

impl Query for AddWine {
    type Item = Wine;

    fn execute(&self, conn: &SqliteConnection) -> Result<Wine> {
        use self::schema::wine::dsl::*;

        let fields = &self.fields;
        let wine_name = fields
            .name
            .as_deref()
            .ok_or(Error::Validation("Wine name is required."))?;

        let new_wine = NewWine {
            name: wine_name,
            varietal: fields.varietal.as_deref(),
            region: fields.region.as_deref(),
            vintage: fields.vintage,
            quantity: fields.quantity.unwrap_or(1).max(0),
            status: Status::Cellar,
            price_paid: fields.price_paid,
            purchase_location: fields.purchase_location.as_deref(),
            notes: fields.notes.as_deref(),
            created_at: Utc::now().naive_utc(),
        };

        conn.transaction::<_, Error, _>(|| {
            diesel::insert_into(wine).values(&new_wine).execute(conn)?;
            let new_id = diesel::select(last_insert_rowid).get_result::<i32>(conn)?;
            find_wine(conn, new_id)
        })
    }
}

/*************************************/
/** Edit Wine message               **/
/*************************************/

pub struct EditWine {
    pub wine_id: i32,
    pub fields: WineFields,
}

impl Query for EditWine {
    type Item = Wine;

    fn execute(&self, conn: &SqliteConnection) -> Result<Wine> {
        conn.transaction::<_, Error, _>(|| {
            let mut wine = find_wine(conn, self.wine_id)?;

            let fields = &self.fields;
            wine.name = fields
                .name
                .clone()
                .ok_or(Error::Validation("Wine name is required to edit."))?;
            wine.varietal = fields.varietal.clone();
            wine.region = fields.region.clone();
            wine.vintage = fields.vintage;
            wine.quantity = fields.quantity.unwrap_or(0).max(0);
            wine.price_paid = fields.price_paid;
            wine.purchase_location = fields.purchase_location.clone();
            wine.notes = fields.notes.clone();
            wine.tasting_notes = fields.tasting.tasting_notes.clone();
            wine.experience_notes = fields.tasting.experience_notes.clone();
            wine.rating = fields.tasting.rating;
            wine.settle_status();

            diesel::update(&wine).set(&wine).execute(conn)?;
            Ok(wine)
        })
    }
}

/*************************************/
/** Consume Wine message            **/
/*************************************/

pub struct ConsumeWine {
    pub wine_id: i32,
    pub tasting: Tasting,
}

impl Query for ConsumeWine {
    type Item = (Wine, Consumption);

    fn execute(&self, conn: &SqliteConnection) -> Result<(Wine, Consumption)> {
        use self::schema::consumption::dsl::consumption;

        conn.transaction::<_, Error, _>(|| {
            let mut wine = find_wine(conn, self.wine_id)?;
            let tasting = &self.tasting;

            // Blank feedback keeps whatever the wine already had.
            if tasting.tasting_notes.is_some() {
                wine.tasting_notes = tasting.tasting_notes.clone();
            }
            if tasting.experience_notes.is_some() {
                wine.experience_notes = tasting.experience_notes.clone();
            }
            if tasting.rating.is_some() {
                wine.rating = tasting.rating;
            }
            wine.take_bottle();

            diesel::update(&wine).set(&wine).execute(conn)?;

            let new_consumption = NewConsumption {
                wine_id: Some(wine.id),
                wine_name: &wine.name,
                consumed_at: Utc::now().naive_utc(),
                quantity: 1,
                rating: tasting.rating,
                tasting_notes: tasting.tasting_notes.as_deref(),
                experience_notes: tasting.experience_notes.as_deref(),
            };
            diesel::insert_into(consumption)
                .values(&new_consumption)
                .execute(conn)?;
            let new_id = diesel::select(last_insert_rowid).get_result::<i32>(conn)?;

            let record = find_consumption(conn, new_id)?;
            Ok((wine, record))
        })
    }
}

/*************************************/
/** Restock Wine message            **/
/*************************************/

pub struct RestockWine {
    pub wine_id: i32,
}

impl Query for RestockWine {
    type Item = Wine;

    fn execute(&self, conn: &SqliteConnection) -> Result<Wine> {
        conn.transaction::<_, Error, _>(|| {
            let mut wine = find_wine(conn, self.wine_id)?;
            wine.add_bottles(1);

            diesel::update(&wine).set(&wine).execute(conn)?;
            Ok(wine)
        })
    }
}

/*************************************/
/** Delete Wine message             **/
/*************************************/

pub struct DeleteWine {
    pub wine_id: i32,
}

impl Query for DeleteWine {
    type Item = Wine;

    fn execute(&self, conn: &SqliteConnection) -> Result<Wine> {
        conn.transaction::<_, Error, _>(|| {
            let wine = find_wine(conn, self.wine_id)?;

            // Consumption rows are detached by the foreign key.
            diesel::delete(&wine).execute(conn)?;
            Ok(wine)
        })
    }
}

/*************************************/
/** List Consumptions query         **/
/*************************************/

pub struct ListConsumptions;

impl Query for ListConsumptions {
    type Item = Vec<Consumption>;

    fn execute(&self, conn: &SqliteConnection) -> Result<Vec<Consumption>> {
        use self::schema::consumption::dsl::*;

        Ok(consumption
            .order((consumed_at.desc(), id.desc()))
            .load::<Consumption>(conn)?)
    }
}

/*************************************/
/** Edit Consumption message        **/
/*************************************/

pub struct EditConsumption {
    pub consumption_id: i32,
    pub tasting: Tasting,
}

impl Query for EditConsumption {
    type Item = Consumption;

    fn execute(&self, conn: &SqliteConnection) -> Result<Consumption> {
        conn.transaction::<_, Error, _>(|| {
            let mut record = find_consumption(conn, self.consumption_id)?;
            record.tasting_notes = self.tasting.tasting_notes.clone();
            record.experience_notes = self.tasting.experience_notes.clone();
            record.rating = self.tasting.rating;

            diesel::update(&record).set(&record).execute(conn)?;
            Ok(record)
        })
    }
}

/*************************************/
/** Delete Consumption message      **/
/*************************************/

/// Removes a consumption entry. With `restock`, the entry's quantity goes back
/// onto the linked wine, any quantity below 1 counting as a single bottle.
pub struct DeleteConsumption {
    pub consumption_id: i32,
    pub restock: bool,
}

/// What happened to the inventory when a consumption was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestockOutcome {
    NotRequested,
    Restocked,
    WineMissing,
}

impl Query for DeleteConsumption {
    type Item = (Consumption, RestockOutcome);

    fn execute(&self, conn: &SqliteConnection) -> Result<(Consumption, RestockOutcome)> {
        conn.transaction::<_, Error, _>(|| {
            let record = find_consumption(conn, self.consumption_id)?;

            let outcome = if !self.restock {
                RestockOutcome::NotRequested
            } else {
                let linked = match record.wine_id {
                    Some(wine_id) => schema::wine::table
                        .find(wine_id)
                        .first::<Wine>(conn)
                        .optional()?,
                    None => None,
                };

                match linked {
                    Some(mut wine) => {
                        wine.add_bottles(record.quantity.max(1));
                        diesel::update(&wine).set(&wine).execute(conn)?;
                        RestockOutcome::Restocked
                    }
                    None => RestockOutcome::WineMissing,
                }
            };

            diesel::delete(&record).execute(conn)?;
            Ok((record, outcome))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::{parse_rating, WineForm};
    use crate::migrations;
    use diesel::Connection;

    fn connection() -> SqliteConnection {
        let conn = SqliteConnection::establish(":memory:").unwrap();
        configure(&conn).unwrap();
        migrations::run_pending(&conn).unwrap();
        conn
    }

    fn fields(name: &str) -> WineFields {
        WineFields::from(&WineForm {
            name: Some(name.to_owned()),
            ..WineForm::default()
        })
    }

    fn add(conn: &SqliteConnection, fields: WineFields) -> Wine {
        AddWine { fields }.execute(conn).unwrap()
    }

    fn consume(conn: &SqliteConnection, wine_id: i32) -> (Wine, Consumption) {
        ConsumeWine {
            wine_id,
            tasting: Tasting::default(),
        }
        .execute(conn)
        .unwrap()
    }

    fn reload(conn: &SqliteConnection, wine_id: i32) -> Wine {
        find_wine(conn, wine_id).unwrap()
    }

    #[test]
    fn add_wine_defaults() {
        let conn = connection();
        let wine = add(&conn, fields("Chateau Margaux"));

        assert_eq!(wine.name, "Chateau Margaux");
        assert_eq!(wine.quantity, 1);
        assert_eq!(wine.status, Status::Cellar);
        assert_eq!(wine.rating, None);
        assert_eq!(wine.tasting_notes, None);
    }

    #[test]
    fn add_wine_requires_a_name() {
        let conn = connection();
        let err = AddWine {
            fields: fields("   "),
        }
        .execute(&conn)
        .unwrap_err();

        assert!(match err {
            Error::Validation(_) => true,
            _ => false,
        });
        let listing = ListWines::default().execute(&conn).unwrap();
        assert_eq!(listing.stats.total, 0);
    }

    #[test]
    fn add_wine_with_zero_or_negative_quantity_stays_in_cellar() {
        let conn = connection();

        let mut zero = fields("Empty Lot");
        zero.quantity = Some(0);
        let wine = add(&conn, zero);
        assert_eq!(wine.quantity, 0);
        assert_eq!(wine.status, Status::Cellar);

        let mut negative = fields("Negative Lot");
        negative.quantity = Some(-4);
        let wine = add(&conn, negative);
        assert_eq!(wine.quantity, 0);
        assert_eq!(wine.status, Status::Cellar);
    }

    #[test]
    fn add_wine_stores_price() {
        let conn = connection();
        let wine = add(
            &conn,
            WineFields::from(&WineForm {
                name: Some("Sancerre".to_owned()),
                price_paid: Some("27.5".to_owned()),
                vintage: Some("twenty".to_owned()),
                ..WineForm::default()
            }),
        );

        let stored = reload(&conn, wine.id);
        assert_eq!(stored.price_paid.map(|p| p.to_string()), Some("27.50".to_owned()));
        assert_eq!(stored.vintage, None);
    }

    #[test]
    fn edit_with_zero_quantity_forces_enjoyed() {
        let conn = connection();
        let wine = add(&conn, fields("Chianti"));

        let mut edit = fields("Chianti Classico");
        edit.quantity = Some(0);
        let edited = EditWine {
            wine_id: wine.id,
            fields: edit,
        }
        .execute(&conn)
        .unwrap();

        assert_eq!(edited.status, Status::Enjoyed);
        let stored = reload(&conn, wine.id);
        assert_eq!(stored.name, "Chianti Classico");
        assert_eq!(stored.status, Status::Enjoyed);
    }

    #[test]
    fn edit_with_bottles_promotes_enjoyed_back_to_cellar() {
        let conn = connection();
        let wine = add(&conn, fields("Malbec"));
        consume(&conn, wine.id);
        assert_eq!(reload(&conn, wine.id).status, Status::Enjoyed);

        let mut edit = fields("Malbec");
        edit.quantity = Some(3);
        EditWine {
            wine_id: wine.id,
            fields: edit,
        }
        .execute(&conn)
        .unwrap();

        let stored = reload(&conn, wine.id);
        assert_eq!(stored.quantity, 3);
        assert_eq!(stored.status, Status::Cellar);
    }

    #[test]
    fn edit_overwrites_every_field() {
        let conn = connection();
        let wine = add(
            &conn,
            WineFields::from(&WineForm {
                name: Some("Riesling".to_owned()),
                region: Some("Mosel".to_owned()),
                quantity: Some("2".to_owned()),
                ..WineForm::default()
            }),
        );

        let mut edit = fields("Riesling");
        edit.quantity = Some(2);
        EditWine {
            wine_id: wine.id,
            fields: edit,
        }
        .execute(&conn)
        .unwrap();

        assert_eq!(reload(&conn, wine.id).region, None);
    }

    #[test]
    fn edit_with_blank_name_changes_nothing() {
        let conn = connection();
        let wine = add(&conn, fields("Pinot Noir"));

        let mut edit = fields("");
        edit.quantity = Some(0);
        let err = EditWine {
            wine_id: wine.id,
            fields: edit,
        }
        .execute(&conn)
        .unwrap_err();

        assert!(match err {
            Error::Validation(_) => true,
            _ => false,
        });
        let stored = reload(&conn, wine.id);
        assert_eq!(stored.name, "Pinot Noir");
        assert_eq!(stored.quantity, 1);
        assert_eq!(stored.status, Status::Cellar);
    }

    #[test]
    fn edit_unknown_wine_is_not_found_even_with_blank_name() {
        let conn = connection();
        let err = EditWine {
            wine_id: 99,
            fields: fields(""),
        }
        .execute(&conn)
        .unwrap_err();

        assert!(err.is_not_found());
    }

    #[test]
    fn consuming_last_bottle_records_consumption() {
        let conn = connection();
        let wine = add(&conn, fields("Amarone"));

        let (consumed, record) = consume(&conn, wine.id);
        assert_eq!(consumed.quantity, 0);
        assert_eq!(consumed.status, Status::Enjoyed);
        assert_eq!(record.quantity, 1);
        assert_eq!(record.wine_id, Some(wine.id));
        assert_eq!(record.wine_name, "Amarone");

        let history = ListConsumptions.execute(&conn).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn consuming_an_empty_lot_still_records_and_stays_at_zero() {
        let conn = connection();
        let wine = add(&conn, fields("Tokaji"));
        consume(&conn, wine.id);
        let (again, _) = consume(&conn, wine.id);

        assert_eq!(again.quantity, 0);
        assert_eq!(again.status, Status::Enjoyed);
        assert_eq!(ListConsumptions.execute(&conn).unwrap().len(), 2);
    }

    #[test]
    fn consume_only_overwrites_supplied_feedback() {
        let conn = connection();
        let mut initial = fields("Brunello");
        initial.quantity = Some(3);
        let wine = add(&conn, initial);

        let (_, first) = ConsumeWine {
            wine_id: wine.id,
            tasting: Tasting {
                tasting_notes: Some("Cherry and leather".to_owned()),
                experience_notes: Some("Birthday dinner".to_owned()),
                rating: parse_rating(Some("4.5")),
            },
        }
        .execute(&conn)
        .unwrap();
        assert_eq!(first.rating.map(|r| r.to_string()), Some("4.5".to_owned()));

        let (after, second) = ConsumeWine {
            wine_id: wine.id,
            tasting: Tasting {
                tasting_notes: None,
                experience_notes: Some("Quiet night in".to_owned()),
                rating: None,
            },
        }
        .execute(&conn)
        .unwrap();

        assert_eq!(after.quantity, 1);
        assert_eq!(after.status, Status::Cellar);
        assert_eq!(after.tasting_notes.as_deref(), Some("Cherry and leather"));
        assert_eq!(after.experience_notes.as_deref(), Some("Quiet night in"));
        assert_eq!(after.rating.map(|r| r.to_string()), Some("4.5".to_owned()));

        assert_eq!(second.tasting_notes, None);
        assert_eq!(second.rating, None);
        assert_eq!(second.experience_notes.as_deref(), Some("Quiet night in"));

        let stored = reload(&conn, wine.id);
        assert_eq!(stored.rating.map(|r| r.to_string()), Some("4.5".to_owned()));
    }

    #[test]
    fn consume_unknown_wine_is_not_found() {
        let conn = connection();
        let err = ConsumeWine {
            wine_id: 7,
            tasting: Tasting::default(),
        }
        .execute(&conn)
        .unwrap_err();

        assert!(err.is_not_found());
        assert!(ListConsumptions.execute(&conn).unwrap().is_empty());
    }

    #[test]
    fn restock_returns_enjoyed_wine_to_cellar() {
        let conn = connection();
        let wine = add(&conn, fields("Vouvray"));
        consume(&conn, wine.id);

        let restocked = RestockWine { wine_id: wine.id }.execute(&conn).unwrap();
        assert_eq!(restocked.quantity, 1);
        assert_eq!(restocked.status, Status::Cellar);
        assert_eq!(reload(&conn, wine.id).quantity, 1);
        assert_eq!(ListConsumptions.execute(&conn).unwrap().len(), 1);
    }

    #[test]
    fn restock_unknown_wine_is_not_found() {
        let conn = connection();
        assert!(RestockWine { wine_id: 3 }
            .execute(&conn)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn deleting_a_wine_detaches_its_consumptions() {
        let conn = connection();
        let wine = add(&conn, fields("Barbaresco"));
        consume(&conn, wine.id);

        DeleteWine { wine_id: wine.id }.execute(&conn).unwrap();

        assert!(find_wine(&conn, wine.id).unwrap_err().is_not_found());
        let history = ListConsumptions.execute(&conn).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].wine_id, None);
        assert_eq!(history[0].wine_name, "Barbaresco");
    }

    #[test]
    fn delete_unknown_wine_is_not_found() {
        let conn = connection();
        assert!(DeleteWine { wine_id: 12 }
            .execute(&conn)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn search_matches_any_text_field_case_insensitively() {
        let conn = connection();
        add(
            &conn,
            WineFields::from(&WineForm {
                name: Some("Silver Oak".to_owned()),
                varietal: Some("Cabernet Sauvignon".to_owned()),
                ..WineForm::default()
            }),
        );
        add(
            &conn,
            WineFields::from(&WineForm {
                name: Some("Cloudy Bay".to_owned()),
                purchase_location: Some("Airport duty free".to_owned()),
                ..WineForm::default()
            }),
        );

        let search = |term: &str| {
            ListWines {
                search: Some(term.to_owned()),
                status: None,
            }
            .execute(&conn)
            .unwrap()
        };

        let cab = search("cab");
        assert_eq!(cab.wines.len(), 1);
        assert_eq!(cab.wines[0].name, "Silver Oak");
        assert_eq!(cab.stats.total, 2);

        assert_eq!(search("DUTY").wines[0].name, "Cloudy Bay");
        assert!(search("rioja").wines.is_empty());
    }

    #[test]
    fn listing_filters_by_status_and_counts() {
        let conn = connection();
        let first = add(&conn, fields("First"));
        let second = add(&conn, fields("Second"));
        add(&conn, fields("Third"));
        consume(&conn, first.id);

        let all = ListWines::default().execute(&conn).unwrap();
        assert_eq!(
            all.stats,
            CellarStats {
                total: 3,
                cellar: 2,
                enjoyed: 1
            }
        );
        let names: Vec<_> = all.wines.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Third", "Second", "First"]);

        let enjoyed = ListWines {
            search: None,
            status: Some(Status::Enjoyed),
        }
        .execute(&conn)
        .unwrap();
        assert_eq!(enjoyed.wines.len(), 1);
        assert_eq!(enjoyed.wines[0].id, first.id);

        let cellar = ListWines {
            search: None,
            status: Some(Status::Cellar),
        }
        .execute(&conn)
        .unwrap();
        assert!(cellar.wines.iter().all(|w| w.id != first.id));
        assert!(cellar.wines.iter().any(|w| w.id == second.id));
    }

    #[test]
    fn consumption_history_newest_first() {
        let conn = connection();
        let a = add(&conn, fields("Older"));
        let b = add(&conn, fields("Newer"));
        consume(&conn, a.id);
        consume(&conn, b.id);

        let history = ListConsumptions.execute(&conn).unwrap();
        let names: Vec<_> = history.iter().map(|c| c.wine_name.as_str()).collect();
        assert_eq!(names, vec!["Newer", "Older"]);
    }

    #[test]
    fn edit_consumption_overwrites_feedback_only() {
        let conn = connection();
        let wine = add(&conn, fields("Cava"));
        let (_, record) = ConsumeWine {
            wine_id: wine.id,
            tasting: Tasting {
                tasting_notes: Some("Toasty".to_owned()),
                experience_notes: None,
                rating: parse_rating(Some("3")),
            },
        }
        .execute(&conn)
        .unwrap();

        let edited = EditConsumption {
            consumption_id: record.id,
            tasting: Tasting {
                tasting_notes: None,
                experience_notes: Some("Picnic".to_owned()),
                rating: parse_rating(Some("-1")),
            },
        }
        .execute(&conn)
        .unwrap();

        assert_eq!(edited.tasting_notes, None);
        assert_eq!(edited.experience_notes.as_deref(), Some("Picnic"));
        assert_eq!(edited.rating.map(|r| r.to_string()), Some("0.0".to_owned()));

        let stored = reload(&conn, wine.id);
        assert_eq!(stored.tasting_notes.as_deref(), Some("Toasty"));
        assert_eq!(stored.rating.map(|r| r.to_string()), Some("3.0".to_owned()));
    }

    #[test]
    fn edit_unknown_consumption_is_not_found() {
        let conn = connection();
        let err = EditConsumption {
            consumption_id: 5,
            tasting: Tasting::default(),
        }
        .execute(&conn)
        .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_consumption_with_restock_refills_wine() {
        let conn = connection();
        let wine = add(&conn, fields("Grenache"));
        let (_, record) = consume(&conn, wine.id);

        let (_, outcome) = DeleteConsumption {
            consumption_id: record.id,
            restock: true,
        }
        .execute(&conn)
        .unwrap();

        assert_eq!(outcome, RestockOutcome::Restocked);
        let stored = reload(&conn, wine.id);
        assert_eq!(stored.quantity, 1);
        assert_eq!(stored.status, Status::Cellar);
        assert!(ListConsumptions.execute(&conn).unwrap().is_empty());
    }

    #[test]
    fn delete_consumption_without_restock_leaves_inventory() {
        let conn = connection();
        let wine = add(&conn, fields("Syrah"));
        let (_, record) = consume(&conn, wine.id);

        let (_, outcome) = DeleteConsumption {
            consumption_id: record.id,
            restock: false,
        }
        .execute(&conn)
        .unwrap();

        assert_eq!(outcome, RestockOutcome::NotRequested);
        assert_eq!(reload(&conn, wine.id).quantity, 0);
        assert!(ListConsumptions.execute(&conn).unwrap().is_empty());
    }

    #[test]
    fn delete_orphaned_consumption_with_restock_reports_missing_wine() {
        let conn = connection();
        let wine = add(&conn, fields("Zinfandel"));
        let survivor = add(&conn, fields("Survivor"));
        let (_, record) = consume(&conn, wine.id);
        DeleteWine { wine_id: wine.id }.execute(&conn).unwrap();

        let (removed, outcome) = DeleteConsumption {
            consumption_id: record.id,
            restock: true,
        }
        .execute(&conn)
        .unwrap();

        assert_eq!(outcome, RestockOutcome::WineMissing);
        assert_eq!(removed.wine_name, "Zinfandel");
        assert!(ListConsumptions.execute(&conn).unwrap().is_empty());
        assert_eq!(reload(&conn, survivor.id).quantity, 1);
    }

    fn edit_quantity(conn: &SqliteConnection, wine: &Wine, quantity: i32) {
        let mut edit = fields(&wine.name);
        edit.quantity = Some(quantity);
        EditWine {
            wine_id: wine.id,
            fields: edit,
        }
        .execute(conn)
        .unwrap();
    }

    #[test]
    fn restock_saturates_at_max_quantity() {
        let conn = connection();
        let wine = add(&conn, fields("Magnum"));
        edit_quantity(&conn, &wine, i32::MAX);

        let restocked = RestockWine { wine_id: wine.id }.execute(&conn).unwrap();
        assert_eq!(restocked.quantity, i32::MAX);
        assert_eq!(reload(&conn, wine.id).quantity, i32::MAX);
    }

    #[test]
    fn delete_consumption_restock_saturates_at_max_quantity() {
        let conn = connection();
        let wine = add(&conn, fields("Jeroboam"));
        let (_, record) = consume(&conn, wine.id);
        edit_quantity(&conn, &wine, i32::MAX);

        let (_, outcome) = DeleteConsumption {
            consumption_id: record.id,
            restock: true,
        }
        .execute(&conn)
        .unwrap();

        assert_eq!(outcome, RestockOutcome::Restocked);
        let stored = reload(&conn, wine.id);
        assert_eq!(stored.quantity, i32::MAX);
        assert_eq!(stored.status, Status::Cellar);
    }

    #[test]
    fn delete_unknown_consumption_is_not_found() {
        let conn = connection();
        let err = DeleteConsumption {
            consumption_id: 1,
            restock: true,
        }
        .execute(&conn)
        .unwrap_err();
        assert!(err.is_not_found());
    }
}
