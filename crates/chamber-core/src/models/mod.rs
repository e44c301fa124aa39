//! Domain models for the clinic store.

mod patient;
mod payment;
mod remedy;
mod user;
mod views;
mod visit;

pub use patient::*;
pub use payment::*;
pub use remedy::*;
pub use user::*;
pub use views::*;
pub use visit::*;

/// Timestamp layout shared with SQLite's `datetime('now')`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time in storage format.
pub fn now_timestamp() -> String {
    chrono::Utc::now().format(TIMESTAMP_FORMAT).to_string()
}

/// Tolerance used when comparing derived money amounts.
pub const MONEY_EPSILON: f64 = 0.005;

pub(crate) fn amounts_match(a: f64, b: f64) -> bool {
    (a - b).abs() < MONEY_EPSILON
}
