//! Menu Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Menu item entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Base unit price in yen
    pub price: Decimal,
    pub is_available: bool,
    #[serde(default)]
    pub options: Vec<MenuOption>,
}

/// Selectable option with its price delta
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuOption {
    pub id: Uuid,
    pub name: String,
    /// Added to the item unit price, may be zero
    pub price_delta: Decimal,
}

impl MenuItem {
    /// Look up an option choice by id
    pub fn find_option(&self, option_id: Uuid) -> Option<&MenuOption> {
        self.options.iter().find(|o| o.id == option_id)
    }
}
