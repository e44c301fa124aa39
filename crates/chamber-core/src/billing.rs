//! Visit billing workflow.
//!
//! Recording a visit is one transaction: the visit row, one line item per
//! dispensed remedy (price snapshotted from inventory), the stock decrement and
//! the visit's payment record either all land or none do.

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{Payment, Visit, VisitMedicine};

/// Billing errors.
#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Insufficient stock for remedy {remedy_id}: requested {requested}, available {available}")]
    InsufficientStock {
        remedy_id: i64,
        requested: i64,
        available: i64,
    },
}

impl From<rusqlite::Error> for BillingError {
    fn from(e: rusqlite::Error) -> Self {
        BillingError::Database(e.into())
    }
}

pub type BillingResult<T> = Result<T, BillingError>;

/// One remedy to dispense.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispenseRequest {
    pub remedy_id: i64,
    pub quantity: i64,
}

/// Everything captured at the front desk for a single visit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VisitRequest {
    pub patient_id: i64,
    pub recorded_by: Option<i64>,
    pub chief_complaint: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub consultation_fee: f64,
    pub amount_paid: f64,
    pub medicines: Vec<DispenseRequest>,
}

/// Outcome of recording a visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitReceipt {
    pub visit_id: i64,
    pub payment_id: i64,
    pub medicine_bill: f64,
    pub total_bill: f64,
    pub due_amount: f64,
    pub status: String,
}

/// Partial override of a visit's billing amounts; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentAdjustment {
    pub consultation_fee: Option<f64>,
    pub medicine_bill: Option<f64>,
    pub amount_paid: Option<f64>,
}

/// Billing coordinator over a database.
pub struct Billing<'a> {
    db: &'a Database,
}

impl<'a> Billing<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record a visit with its dispensed remedies and payment.
    pub fn record_visit(&self, request: &VisitRequest) -> BillingResult<VisitReceipt> {
        let tx = self.db.begin_write()?;

        let mut visit = Visit::new(request.patient_id);
        visit.chief_complaint = request.chief_complaint.clone();
        visit.diagnosis = request.diagnosis.clone();
        visit.notes = request.notes.clone();
        visit.recorded_by = request.recorded_by;
        let visit_id = self.db.insert_visit(&visit)?;

        let mut medicine_bill = 0.0;
        for item in &request.medicines {
            // Re-read per item so repeated remedies see the decremented stock
            let remedy = self
                .db
                .get_remedy(item.remedy_id)?
                .ok_or_else(|| BillingError::NotFound(format!("remedy {}", item.remedy_id)))?;

            if !remedy.has_stock(item.quantity) {
                return Err(BillingError::InsufficientStock {
                    remedy_id: item.remedy_id,
                    requested: item.quantity,
                    available: remedy.stock_quantity,
                });
            }

            let line = VisitMedicine::dispense(visit_id, &remedy, item.quantity)?;
            self.db.insert_visit_medicine(&line)?;
            self.db.adjust_remedy_stock(item.remedy_id, -item.quantity)?;
            medicine_bill += line.line_total;
        }

        let payment = Payment::for_visit(
            visit_id,
            request.consultation_fee,
            medicine_bill,
            request.amount_paid,
        );
        let payment_id = self.db.insert_payment(&payment)?;

        tx.commit()?;
        info!(
            "recorded visit {} for patient {}: {} item(s), total {:.2}, {}",
            visit_id,
            request.patient_id,
            request.medicines.len(),
            payment.total_bill,
            payment.status
        );

        Ok(VisitReceipt {
            visit_id,
            payment_id,
            medicine_bill,
            total_bill: payment.total_bill,
            due_amount: payment.due_amount,
            status: payment.status,
        })
    }

    /// Apply a billing adjustment to a visit and recompute total, due and status.
    pub fn settle_payment(
        &self,
        visit_id: i64,
        adjustment: &PaymentAdjustment,
    ) -> BillingResult<Payment> {
        let mut payment = self
            .db
            .get_payment_for_visit(visit_id)?
            .ok_or_else(|| BillingError::NotFound(format!("payment for visit {}", visit_id)))?;

        payment.apply_amounts(
            adjustment.consultation_fee.unwrap_or(payment.consultation_fee),
            adjustment.medicine_bill.unwrap_or(payment.medicine_bill),
            adjustment.amount_paid.unwrap_or(payment.amount_paid),
        );
        self.db.update_payment(&payment)?;
        info!(
            "settled visit {}: paid {:.2} of {:.2}, {}",
            visit_id, payment.amount_paid, payment.total_bill, payment.status
        );
        Ok(payment)
    }
}
