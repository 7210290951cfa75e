//! Form payloads and the lenient field parsers shared by the handlers.
//!
//! Every field arrives as optional text. Optional numeric fields that fail to
//! parse are treated as absent rather than rejected.

use super::models::{Price, Rating};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Fields posted by the add and edit wine forms.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct WineForm {
    pub name: Option<String>,
    pub varietal: Option<String>,
    pub region: Option<String>,
    pub vintage: Option<String>,
    pub quantity: Option<String>,
    pub price_paid: Option<String>,
    pub purchase_location: Option<String>,
    pub notes: Option<String>,
    pub tasting_notes: Option<String>,
    pub experience_notes: Option<String>,
    pub rating: Option<String>,
}

/// Tasting feedback posted when consuming a bottle or editing a consumption.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TastingForm {
    pub tasting_notes: Option<String>,
    pub experience_notes: Option<String>,
    pub rating: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct DeleteConsumptionForm {
    pub restock: Option<String>,
}

impl DeleteConsumptionForm {
    pub fn restock_requested(&self) -> bool {
        self.restock.as_ref().map(String::as_str) == Some("1")
    }
}

/// Parsed wine fields. `name` is `None` when the form left it blank.
#[derive(Debug, Clone, PartialEq)]
pub struct WineFields {
    pub name: Option<String>,
    pub varietal: Option<String>,
    pub region: Option<String>,
    pub vintage: Option<i32>,
    pub quantity: Option<i32>,
    pub price_paid: Option<Price>,
    pub purchase_location: Option<String>,
    pub notes: Option<String>,
    pub tasting: Tasting,
}

/// Parsed tasting feedback.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Tasting {
    pub tasting_notes: Option<String>,
    pub experience_notes: Option<String>,
    pub rating: Option<Rating>,
}

impl<'a> From<&'a WineForm> for WineFields {
    fn from(form: &'a WineForm) -> WineFields {
        WineFields {
            name: clean_text(form.name.as_deref()),
            varietal: clean_text(form.varietal.as_deref()),
            region: clean_text(form.region.as_deref()),
            vintage: parse_int(form.vintage.as_deref()),
            quantity: parse_int(form.quantity.as_deref()),
            price_paid: parse_price(form.price_paid.as_deref()),
            purchase_location: clean_text(form.purchase_location.as_deref()),
            notes: clean_text(form.notes.as_deref()),
            tasting: Tasting {
                tasting_notes: clean_text(form.tasting_notes.as_deref()),
                experience_notes: clean_text(form.experience_notes.as_deref()),
                rating: parse_rating(form.rating.as_deref()),
            },
        }
    }
}

impl<'a> From<&'a TastingForm> for Tasting {
    fn from(form: &'a TastingForm) -> Tasting {
        Tasting {
            tasting_notes: clean_text(form.tasting_notes.as_deref()),
            experience_notes: clean_text(form.experience_notes.as_deref()),
            rating: parse_rating(form.rating.as_deref()),
        }
    }
}

/// Trims the value; blank text becomes `None`.
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

pub fn parse_int(value: Option<&str>) -> Option<i32> {
    value.and_then(|v| v.trim().parse::<i32>().ok())
}

pub fn parse_price(value: Option<&str>) -> Option<Price> {
    parse_decimal(value).map(Price::new)
}

/// Parses a rating, rounding to one decimal and clamping into `[0.0, 5.0]`.
/// Blank or malformed input yields `None`.
pub fn parse_rating(value: Option<&str>) -> Option<Rating> {
    if let Some(rating) = parse_decimal(value) {
        return Some(Rating::clamped(rating));
    }

    // Too large for a Decimal, e.g. "1e30": only the sign survives clamping.
    let wide = value?.trim().parse::<f64>().ok().filter(|v| v.is_finite())?;
    if wide.is_sign_negative() {
        Some(Rating::lowest())
    } else {
        Some(Rating::highest())
    }
}

fn parse_decimal(value: Option<&str>) -> Option<Decimal> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }

    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .ok()
}
