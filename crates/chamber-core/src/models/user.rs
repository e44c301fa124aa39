//! Operator account models.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_DOCTOR: &str = "doctor";
pub const ROLE_STAFF: &str = "staff";

/// An operator account.
///
/// `role` is an open string; the store does not constrain it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    /// Row ID - None until inserted
    pub id: Option<i64>,
    /// Unique login name
    pub username: String,
    /// Hex-encoded SHA-256 of the password
    pub hashed_password: String,
    pub full_name: Option<String>,
    /// Free-text role, "staff" by default
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
}

impl User {
    /// Create a new active staff account, hashing the given password.
    pub fn new(username: String, password: &str) -> Self {
        Self {
            id: None,
            username,
            hashed_password: hash_password(password),
            full_name: None,
            role: ROLE_STAFF.to_string(),
            is_active: true,
            created_at: super::now_timestamp(),
        }
    }

    /// Check a plaintext password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        self.hashed_password == hash_password(password)
    }

    /// Admins and doctors may add or edit remedies.
    pub fn can_manage_inventory(&self) -> bool {
        self.is_active && (self.role == ROLE_ADMIN || self.role == ROLE_DOCTOR)
    }

    /// Only admins may edit a visit's billing.
    pub fn can_edit_billing(&self) -> bool {
        self.is_active && self.role == ROLE_ADMIN
    }
}

/// Hash a password as lowercase hex SHA-256.
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}
