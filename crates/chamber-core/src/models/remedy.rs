//! Remedy inventory models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::{ConstraintKind, ConstraintViolation};

/// Manufacturing strength of a remedy.
///
/// Decimal ("X") potencies and the centesimal 30/60/200 scale; nothing else is stocked.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Potency {
    #[serde(rename = "1X")]
    X1,
    #[serde(rename = "2X")]
    X2,
    #[serde(rename = "6X")]
    X6,
    #[serde(rename = "12X")]
    X12,
    #[serde(rename = "200")]
    C200,
    #[serde(rename = "30")]
    C30,
    #[serde(rename = "60")]
    C60,
}

impl Potency {
    pub const ALL: [Potency; 7] = [
        Potency::X1,
        Potency::X2,
        Potency::X6,
        Potency::X12,
        Potency::C200,
        Potency::C30,
        Potency::C60,
    ];

    /// Stored text value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Potency::X1 => "1X",
            Potency::X2 => "2X",
            Potency::X6 => "6X",
            Potency::X12 => "12X",
            Potency::C200 => "200",
            Potency::C30 => "30",
            Potency::C60 => "60",
        }
    }
}

impl fmt::Display for Potency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Potency {
    type Err = ConstraintViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Potency::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| ConstraintViolation {
                kind: ConstraintKind::CheckViolation,
                message: format!("potency must be one of 1X, 2X, 6X, 12X, 200, 30, 60, got {:?}", s),
            })
    }
}

/// An inventory item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Remedy {
    /// Row ID - None until inserted
    pub id: Option<i64>,
    pub name: String,
    pub potency: Potency,
    pub description: Option<String>,
    /// Price charged for new dispensing; past line items keep their own snapshot
    pub current_unit_price: f64,
    pub stock_quantity: i64,
    pub created_at: String,
}

impl Remedy {
    /// Create a new remedy with no stock.
    pub fn new(name: String, potency: Potency, current_unit_price: f64) -> Self {
        Self {
            id: None,
            name,
            potency,
            description: None,
            current_unit_price,
            stock_quantity: 0,
            created_at: super::now_timestamp(),
        }
    }

    /// Display label, e.g. "Arnica Montana 30".
    pub fn label(&self) -> String {
        format!("{} {}", self.name, self.potency)
    }

    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock_quantity >= quantity
    }
}
