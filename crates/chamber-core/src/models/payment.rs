//! Payment (billing record) models.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::amounts_match;
use crate::db::{DbError, DbResult};

/// Billing status values written by this crate.
///
/// The `status` column itself is free text; other values read back unchanged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "partially paid")]
    PartiallyPaid,
    #[serde(rename = "paid")]
    Paid,
    #[serde(rename = "n/a")]
    NotApplicable,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::PartiallyPaid => "partially paid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::NotApplicable => "n/a",
        }
    }

    /// Status implied by a bill total and the amount paid so far.
    pub fn derive(total_bill: f64, amount_paid: f64) -> Self {
        let due = total_bill - amount_paid;
        if total_bill <= 0.0 {
            PaymentStatus::NotApplicable
        } else if due <= 0.0 {
            PaymentStatus::Paid
        } else if amount_paid > 0.0 {
            PaymentStatus::PartiallyPaid
        } else {
            PaymentStatus::Pending
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The billing record of a visit. One row per visit, updated as payments arrive.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    /// Row ID - None until inserted
    pub id: Option<i64>,
    pub visit_id: i64,
    pub consultation_fee: f64,
    pub medicine_bill: f64,
    /// consultation_fee + medicine_bill
    pub total_bill: f64,
    pub amount_paid: f64,
    /// total_bill - amount_paid
    pub due_amount: f64,
    pub status: String,
    pub created_at: String,
}

impl Payment {
    /// Build a consistent payment record from its inputs.
    pub fn for_visit(visit_id: i64, consultation_fee: f64, medicine_bill: f64, amount_paid: f64) -> Self {
        let mut payment = Self {
            id: None,
            visit_id,
            consultation_fee: 0.0,
            medicine_bill: 0.0,
            total_bill: 0.0,
            amount_paid: 0.0,
            due_amount: 0.0,
            status: PaymentStatus::Pending.as_str().to_string(),
            created_at: super::now_timestamp(),
        };
        payment.apply_amounts(consultation_fee, medicine_bill, amount_paid);
        payment
    }

    /// Replace the input amounts and recompute total, due and status.
    pub fn apply_amounts(&mut self, consultation_fee: f64, medicine_bill: f64, amount_paid: f64) {
        self.consultation_fee = consultation_fee;
        self.medicine_bill = medicine_bill;
        self.amount_paid = amount_paid;
        self.total_bill = consultation_fee + medicine_bill;
        self.due_amount = self.total_bill - amount_paid;
        self.status = PaymentStatus::derive(self.total_bill, amount_paid)
            .as_str()
            .to_string();
    }

    /// Check the billing arithmetic before the row is written.
    pub fn validate(&self) -> DbResult<()> {
        for (field, value) in [
            ("consultation_fee", self.consultation_fee),
            ("medicine_bill", self.medicine_bill),
            ("amount_paid", self.amount_paid),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(DbError::check(format!("{} must be a non-negative amount, got {}", field, value)));
            }
        }
        if !amounts_match(self.total_bill, self.consultation_fee + self.medicine_bill) {
            return Err(DbError::check(format!(
                "total_bill {} does not equal consultation_fee {} + medicine_bill {}",
                self.total_bill, self.consultation_fee, self.medicine_bill
            )));
        }
        if !amounts_match(self.due_amount, self.total_bill - self.amount_paid) {
            return Err(DbError::check(format!(
                "due_amount {} does not equal total_bill {} - amount_paid {}",
                self.due_amount, self.total_bill, self.amount_paid
            )));
        }
        Ok(())
    }
}
