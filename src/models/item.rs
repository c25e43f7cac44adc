use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Acquisition status of a catalog item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ItemStatus {
    #[default]
    Owned,
    Sold,
    Wishlist,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 3] = [ItemStatus::Owned, ItemStatus::Sold, ItemStatus::Wishlist];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Owned => "owned",
            ItemStatus::Sold => "sold",
            ItemStatus::Wishlist => "wishlist",
        }
    }
}

impl FromStr for ItemStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or(())
    }
}

/// Row of the `currency_items` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ItemModel {
    pub id: i64,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Flat projection returned by `GET /items/{id}/export`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemExport {
    pub name: String,
    pub country: String,
    pub denomination: String,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub estimated_value: Option<f64>,
    pub market_value: Option<f64>,
    pub status: ItemStatus,
    pub notes: Option<String>,
}

impl From<ItemModel> for ItemExport {
    fn from(model: ItemModel) -> Self {
        Self {
            name: model.name,
            country: model.country,
            denomination: model.denomination,
            year: model.year,
            description: model.description,
            estimated_value: model.estimated_value,
            market_value: model.market_value,
            status: model.status,
            notes: model.notes,
        }
    }
}
