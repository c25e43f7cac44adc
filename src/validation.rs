//! Accepted payload shapes for creating and updating catalog items.
//!
//! Payloads are deserialized leniently and then checked field by field, so a
//! single response can report every problem at once. A payload with any error
//! is rejected as a whole.

use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::models::{ItemModel, ItemStatus};

pub const NAME_MAX_LEN: usize = 200;
pub const COUNTRY_MAX_LEN: usize = 100;
pub const DENOMINATION_MAX_LEN: usize = 100;
pub const CATALOG_REFERENCE_MAX_LEN: usize = 100;
pub const YEAR_MIN: i64 = 0;
pub const YEAR_MAX: i64 = 2100;

/// Field errors collected while validating one payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn single(message: impl Into<String>) -> Self {
        Self(vec![message.into()])
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn messages(&self) -> &[String] {
        &self.0
    }

    fn finish<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Presence-aware field of an update payload.
///
/// `Missing` means the key was absent and the stored value is kept; `Null`
/// means the caller explicitly cleared it.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Missing
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

impl<T> Patch<T> {
    /// Maps a present value; `None` from `f` turns the field into `Null`.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Option<U>) -> Patch<U> {
        match self {
            Patch::Missing => Patch::Missing,
            Patch::Null => Patch::Null,
            Patch::Value(value) => f(value).map_or(Patch::Null, Patch::Value),
        }
    }

    pub fn apply_to(self, target: &mut Option<T>) {
        match self {
            Patch::Missing => {}
            Patch::Null => *target = None,
            Patch::Value(value) => *target = Some(value),
        }
    }
}

/// Body of `POST /items`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreateItemPayload {
    pub name: Option<String>,
    pub country: Option<String>,
    pub denomination: Option<String>,
    pub year: Option<i64>,
    pub catalog_reference: Option<String>,
    pub description: Option<String>,
    pub estimated_value: Option<f64>,
    pub market_value: Option<f64>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub image_path: Option<String>,
}

/// Body of `PATCH /items/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateItemPayload {
    pub name: Patch<String>,
    pub country: Patch<String>,
    pub denomination: Patch<String>,
    pub year: Patch<i64>,
    pub catalog_reference: Patch<String>,
    pub description: Patch<String>,
    pub estimated_value: Patch<f64>,
    pub market_value: Patch<f64>,
    pub status: Patch<String>,
    pub notes: Patch<String>,
    pub image_path: Patch<String>,
}

/// A create payload that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewItem {
    pub name: String,
    pub country: String,
    pub denomination: String,
    pub year: Option<i32>,
    pub catalog_reference: Option<String>,
    pub description: Option<String>,
    pub estimated_value: Option<f64>,
    pub market_value: Option<f64>,
    pub status: ItemStatus,
    pub notes: Option<String>,
    pub image_path: Option<String>,
}

/// An update payload that passed validation. Required columns use `Option`
/// (they can change but never be cleared); nullable columns use `Patch`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub country: Option<String>,
    pub denomination: Option<String>,
    pub year: Patch<i32>,
    pub catalog_reference: Patch<String>,
    pub description: Patch<String>,
    pub estimated_value: Patch<f64>,
    pub market_value: Patch<f64>,
    pub status: Option<ItemStatus>,
    pub notes: Patch<String>,
    pub image_path: Patch<String>,
}

impl CreateItemPayload {
    pub fn validate(self) -> Result<NewItem, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = required_text("name", self.name, NAME_MAX_LEN, &mut errors);
        let country = required_text("country", self.country, COUNTRY_MAX_LEN, &mut errors);
        let denomination = required_text(
            "denomination",
            self.denomination,
            DENOMINATION_MAX_LEN,
            &mut errors,
        );
        let year = self.year.and_then(|y| check_year(y, &mut errors));
        let catalog_reference = self.catalog_reference.and_then(|v| {
            optional_text("catalog_reference", v, Some(CATALOG_REFERENCE_MAX_LEN), &mut errors)
        });
        let description = self
            .description
            .and_then(|v| optional_text("description", v, None, &mut errors));
        let estimated_value = self
            .estimated_value
            .and_then(|v| check_amount("estimated_value", v, &mut errors));
        let market_value = self
            .market_value
            .and_then(|v| check_amount("market_value", v, &mut errors));
        let status = match self.status {
            Some(s) => parse_status(&s, &mut errors),
            None => Some(ItemStatus::default()),
        };
        let notes = self
            .notes
            .and_then(|v| optional_text("notes", v, None, &mut errors));
        let image_path = self
            .image_path
            .and_then(|v| optional_text("image_path", v, None, &mut errors));

        match (name, country, denomination, status) {
            (Some(name), Some(country), Some(denomination), Some(status)) => errors.finish(NewItem {
                name,
                country,
                denomination,
                year,
                catalog_reference,
                description,
                estimated_value,
                market_value,
                status,
                notes,
                image_path,
            }),
            _ => Err(errors),
        }
    }
}

impl UpdateItemPayload {
    pub fn validate(self) -> Result<ItemChanges, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = required_patch("name", self.name, &mut errors, |v, errors| {
            required_text("name", Some(v), NAME_MAX_LEN, errors)
        });
        let country = required_patch("country", self.country, &mut errors, |v, errors| {
            required_text("country", Some(v), COUNTRY_MAX_LEN, errors)
        });
        let denomination =
            required_patch("denomination", self.denomination, &mut errors, |v, errors| {
                required_text("denomination", Some(v), DENOMINATION_MAX_LEN, errors)
            });
        let status = required_patch("status", self.status, &mut errors, |v, errors| {
            parse_status(&v, errors)
        });

        let changes = ItemChanges {
            name,
            country,
            denomination,
            year: self.year.and_then(|y| check_year(y, &mut errors)),
            catalog_reference: self.catalog_reference.and_then(|v| {
                optional_text("catalog_reference", v, Some(CATALOG_REFERENCE_MAX_LEN), &mut errors)
            }),
            description: self
                .description
                .and_then(|v| optional_text("description", v, None, &mut errors)),
            estimated_value: self
                .estimated_value
                .and_then(|v| check_amount("estimated_value", v, &mut errors)),
            market_value: self
                .market_value
                .and_then(|v| check_amount("market_value", v, &mut errors)),
            status,
            notes: self
                .notes
                .and_then(|v| optional_text("notes", v, None, &mut errors)),
            image_path: self
                .image_path
                .and_then(|v| optional_text("image_path", v, None, &mut errors)),
        };

        errors.finish(changes)
    }
}

impl ItemChanges {
    /// Sparse merge: only fields present in the update overwrite `item`.
    pub fn apply_to(self, item: &mut ItemModel) {
        if let Some(name) = self.name {
            item.name = name;
        }
        if let Some(country) = self.country {
            item.country = country;
        }
        if let Some(denomination) = self.denomination {
            item.denomination = denomination;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
        self.year.apply_to(&mut item.year);
        self.catalog_reference.apply_to(&mut item.catalog_reference);
        self.description.apply_to(&mut item.description);
        self.estimated_value.apply_to(&mut item.estimated_value);
        self.market_value.apply_to(&mut item.market_value);
        self.notes.apply_to(&mut item.notes);
        self.image_path.apply_to(&mut item.image_path);
    }
}

fn required_text(
    field: &str,
    value: Option<String>,
    max_len: usize,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let value = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    match value {
        None => {
            errors.push(format!("{} is required", field));
            None
        }
        Some(v) if v.chars().count() > max_len => {
            errors.push(format!("{} must be at most {} characters", field, max_len));
            None
        }
        Some(v) => Some(v),
    }
}

/// Blank text counts as absent.
fn optional_text(
    field: &str,
    value: String,
    max_len: Option<usize>,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(max_len) = max_len {
        if trimmed.chars().count() > max_len {
            errors.push(format!("{} must be at most {} characters", field, max_len));
            return None;
        }
    }
    Some(trimmed.to_string())
}

fn required_patch<T>(
    field: &str,
    patch: Patch<String>,
    errors: &mut ValidationErrors,
    check: impl FnOnce(String, &mut ValidationErrors) -> Option<T>,
) -> Option<T> {
    match patch {
        Patch::Missing => None,
        Patch::Null => {
            errors.push(format!("{} cannot be null", field));
            None
        }
        Patch::Value(value) => check(value, errors),
    }
}

fn check_year(year: i64, errors: &mut ValidationErrors) -> Option<i32> {
    if (YEAR_MIN..=YEAR_MAX).contains(&year) {
        i32::try_from(year).ok()
    } else {
        errors.push(format!(
            "year must be an integer between {} and {}",
            YEAR_MIN, YEAR_MAX
        ));
        None
    }
}

fn check_amount(field: &str, value: f64, errors: &mut ValidationErrors) -> Option<f64> {
    if value.is_finite() && value >= 0.0 {
        Some(value)
    } else {
        errors.push(format!("{} must be a non-negative number", field));
        None
    }
}

fn parse_status(value: &str, errors: &mut ValidationErrors) -> Option<ItemStatus> {
    match value.parse::<ItemStatus>() {
        Ok(status) => Some(status),
        Err(()) => {
            let allowed: Vec<&str> = ItemStatus::ALL.iter().map(ItemStatus::as_str).collect();
            errors.push(format!("status must be one of: {}", allowed.join(", ")));
            None
        }
    }
}
