#![allow(proc_macro_derive_resolution_fallback)] // See: https://github.com/diesel-rs/diesel/issues/1785

use super::schema::*;
use chrono::NaiveDateTime;
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Where a wine currently lives: still on the rack, or fully drunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsExpression, FromSqlRow)]
#[sql_type = "Text"]
pub enum Status {
    Cellar,
    Enjoyed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Cellar => "cellar",
            Status::Enjoyed => "enjoyed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Cellar => "In Cellar",
            Status::Enjoyed => "Enjoyed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Status, String> {
        match s {
            "cellar" => Ok(Status::Cellar),
            "enjoyed" => Ok(Status::Enjoyed),
            other => Err(format!("unknown wine status `{}`", other)),
        }
    }
}

impl ToSql<Text, Sqlite> for Status {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Sqlite>) -> serialize::Result {
        <str as ToSql<Text, Sqlite>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Sqlite> for Status {
    fn from_sql(bytes: Option<&<Sqlite as Backend>::RawValue>) -> deserialize::Result<Self> {
        let text = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
        Ok(text.parse::<Status>()?)
    }
}

/// Price paid for a bottle, two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, AsExpression, FromSqlRow)]
#[sql_type = "Text"]
pub struct Price(Decimal);

/// Tasting score between 0.0 and 5.0, one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, AsExpression, FromSqlRow)]
#[sql_type = "Text"]
pub struct Rating(Decimal);

impl Price {
    pub const SCALE: u32 = 2;

    pub fn new(value: Decimal) -> Price {
        Price(quantize(value, Self::SCALE))
    }
}

impl Rating {
    pub const SCALE: u32 = 1;

    pub fn lowest() -> Rating {
        Rating(Decimal::new(0, 1))
    }

    pub fn highest() -> Rating {
        Rating(Decimal::new(50, 1))
    }

    /// Rounds to one decimal place, then clamps into `[0.0, 5.0]`.
    pub fn clamped(value: Decimal) -> Rating {
        let rounded = Rating(quantize(value, Self::SCALE));
        rounded.max(Rating::lowest()).min(Rating::highest())
    }
}

/// Half-even rounding to exactly `scale` decimal places.
fn quantize(value: Decimal, scale: u32) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(scale);
    rounded
}

// Stored as decimal text in NUMERIC columns. SQLite may hand the value back as
// an INTEGER or REAL rendering ("12", "3.5"), so the scale is restored on read.
macro_rules! decimal_column {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl ToSql<Text, Sqlite> for $name {
            fn to_sql<W: Write>(&self, out: &mut Output<W, Sqlite>) -> serialize::Result {
                let text = self.0.to_string();
                <str as ToSql<Text, Sqlite>>::to_sql(text.as_str(), out)
            }
        }

        impl FromSql<Text, Sqlite> for $name {
            fn from_sql(bytes: Option<&<Sqlite as Backend>::RawValue>) -> deserialize::Result<Self> {
                let text = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
                let mut value = Decimal::from_str(text.trim())?;
                value.rescale($name::SCALE);
                Ok($name(value))
            }
        }
    };
}

decimal_column!(Price);
decimal_column!(Rating);

#[derive(Debug, Clone, Queryable, Identifiable, AsChangeset)]
#[table_name = "wine"]
#[changeset_options(treat_none_as_null = "true")]
pub struct Wine {
    pub id: i32,
    pub name: String,
    pub varietal: Option<String>,
    pub region: Option<String>,
    pub vintage: Option<i32>,
    pub quantity: i32,
    pub status: Status,
    pub price_paid: Option<Price>,
    pub purchase_location: Option<String>,
    pub notes: Option<String>,
    pub tasting_notes: Option<String>,
    pub experience_notes: Option<String>,
    pub rating: Option<Rating>,
    pub created_at: NaiveDateTime,
}

impl Wine {
    pub fn safe_quantity(&self) -> i32 {
        self.quantity.max(0)
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }

    /// Takes one bottle off the rack. Quantity never drops below zero, and an
    /// empty lot is marked as enjoyed.
    pub fn take_bottle(&mut self) {
        if self.quantity > 0 {
            self.quantity -= 1;
        }
        if self.quantity <= 0 {
            self.quantity = 0;
            self.status = Status::Enjoyed;
        }
    }

    /// Puts `count` bottles back on the rack. Saturates at `i32::MAX`.
    pub fn add_bottles(&mut self, count: i32) {
        self.quantity = self.quantity.saturating_add(count);
        if self.quantity > 0 && self.status == Status::Enjoyed {
            self.status = Status::Cellar;
        }
    }

    /// Status rule applied after a full edit: zero bottles means enjoyed,
    /// anything else brings an enjoyed wine back into the cellar.
    pub fn settle_status(&mut self) {
        if self.quantity == 0 {
            self.status = Status::Enjoyed;
        } else if self.status == Status::Enjoyed {
            self.status = Status::Cellar;
        }
    }
}

#[derive(Insertable)]
#[table_name = "wine"]
pub struct NewWine<'a> {
    pub name: &'a str,
    pub varietal: Option<&'a str>,
    pub region: Option<&'a str>,
    pub vintage: Option<i32>,
    pub quantity: i32,
    pub status: Status,
    pub price_paid: Option<Price>,
    pub purchase_location: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, AsChangeset)]
#[table_name = "consumption"]
#[changeset_options(treat_none_as_null = "true")]
pub struct Consumption {
    pub id: i32,
    pub wine_id: Option<i32>,
    pub wine_name: String,
    pub consumed_at: NaiveDateTime,
    pub quantity: i32,
    pub rating: Option<Rating>,
    pub tasting_notes: Option<String>,
    pub experience_notes: Option<String>,
}

#[derive(Insertable)]
#[table_name = "consumption"]
pub struct NewConsumption<'a> {
    pub wine_id: Option<i32>,
    pub wine_name: &'a str,
    pub consumed_at: NaiveDateTime,
    pub quantity: i32,
    pub rating: Option<Rating>,
    pub tasting_notes: Option<&'a str>,
    pub experience_notes: Option<&'a str>,
}
