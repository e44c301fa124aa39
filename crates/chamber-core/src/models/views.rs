//! Rows of the derived reporting views.

use serde::{Deserialize, Serialize};

use super::Potency;

/// One visit with its patient and, once billed, its payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientHistoryRow {
    pub visit_id: i64,
    pub visit_date: String,
    pub chief_complaint: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub patient_id: i64,
    pub patient_name: String,
    pub patient_nid: Option<String>,
    pub patient_phone: Option<String>,
    // Payment columns are None until the visit has a payment row.
    pub consultation_fee: Option<f64>,
    pub medicine_bill: Option<f64>,
    pub total_bill: Option<f64>,
    pub amount_paid: Option<f64>,
    pub due_amount: Option<f64>,
    pub payment_status: Option<String>,
}

impl PatientHistoryRow {
    pub fn is_billed(&self) -> bool {
        self.total_bill.is_some()
    }
}

/// Revenue totals for one calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyRevenueRow {
    /// `YYYY-MM-DD`
    pub revenue_date: String,
    pub payment_count: i64,
    pub total_bill_sum: f64,
    pub amount_paid_sum: f64,
}

impl DailyRevenueRow {
    /// Amount billed that day but not yet collected.
    pub fn outstanding(&self) -> f64 {
        self.total_bill_sum - self.amount_paid_sum
    }
}

/// One dispensed line with its visit, patient and remedy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitMedicineDetailRow {
    pub visit_medicine_id: i64,
    pub visit_id: i64,
    pub visit_date: String,
    pub patient_id: i64,
    pub patient_name: String,
    pub remedy_id: i64,
    pub remedy_name: String,
    pub potency: Potency,
    pub quantity: i64,
    pub unit_price_snapshot: f64,
    pub line_total: f64,
}

/// Counts for the current date, by the database clock.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TodayStats {
    pub today_visits: i64,
    pub today_patients: i64,
}

/// Headline counts for the front desk dashboard.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DashboardCounts {
    pub patients: i64,
    pub visits: i64,
    pub remedies: i64,
    pub today_visits: i64,
}
