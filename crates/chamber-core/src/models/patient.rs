//! Patient models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::db::{ConstraintKind, ConstraintViolation};

/// Recorded gender of a patient. Closed set mirrored by the schema CHECK.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Male,
    Female,
    #[serde(rename = "Third-Gender")]
    ThirdGender,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::ThirdGender];

    /// Stored text value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::ThirdGender => "Third-Gender",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = ConstraintViolation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| ConstraintViolation {
                kind: ConstraintKind::CheckViolation,
                message: format!("gender must be one of Male, Female, Third-Gender, got {:?}", s),
            })
    }
}

/// A person receiving care.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Patient {
    /// Row ID - None until inserted
    pub id: Option<i64>,
    pub name: String,
    /// National identifier, unique when present
    pub nid: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<Gender>,
    pub address: Option<String>,
    /// User who registered the patient
    pub created_by: Option<i64>,
    pub created_at: String,
}

impl Patient {
    /// Create a new patient with required fields.
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            nid: None,
            phone: None,
            age: None,
            gender: None,
            address: None,
            created_by: None,
            created_at: super::now_timestamp(),
        }
    }

    /// National identifier as it should be stored: blank values become NULL
    /// so they never collide on the unique index.
    pub fn nid_for_storage(&self) -> Option<&str> {
        self.nid
            .as_deref()
            .map(str::trim)
            .filter(|nid| !nid.is_empty())
    }

    /// Timestamp-based registration code, e.g. `P20240301093015`.
    pub fn generate_registration_id(at: &NaiveDateTime) -> String {
        format!("P{}", at.format("%Y%m%d%H%M%S"))
    }
}
