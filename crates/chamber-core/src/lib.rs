//! Chamber Core Library
//!
//! Local relational store for a small homeopathic clinic: staff accounts,
//! patients, remedy inventory, visits, dispensed medicines and payments.
//!
//! # Architecture
//!
//! ```text
//!   users ──(created_by / recorded_by, SET NULL)──┐
//!                                                  ▼
//!   patients ──► visits ──┬──► visit_medicines ◄── remedies
//!                         │     (price snapshot)
//!                         └──► payments (one per visit)
//!
//!   views: view_patient_history, view_daily_revenue,
//!          view_visit_medicine_detail, view_today_stats
//! ```
//!
//! # Core Principle
//!
//! **A dispensed line item keeps the price it was sold at.** Changing a remedy's
//! current price never rewrites history.
//!
//! # Modules
//!
//! - [`config`]: Layered store configuration (TOML file + environment)
//! - [`db`]: SQLite schema, CRUD and view queries with constraint classification
//! - [`models`]: Domain types (Patient, Remedy, Visit, Payment, view rows)
//! - [`billing`]: Transactional visit recording and payment settlement
//! - [`lookup`]: Fuzzy remedy lookup for stock checks

pub mod billing;
pub mod config;
pub mod db;
pub mod lookup;
pub mod models;

// Re-export commonly used types
pub use billing::{
    Billing, BillingError, DispenseRequest, PaymentAdjustment, VisitReceipt, VisitRequest,
};
pub use crate::config::StoreConfig;
pub use db::{ConstraintKind, ConstraintViolation, Database, DbError};
pub use lookup::{RemedyLookup, RemedyMatch};
pub use models::{
    DailyRevenueRow, Gender, Patient, PatientHistoryRow, Payment, PaymentStatus, Potency, Remedy,
    TodayStats, User, Visit, VisitMedicine,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ChamberError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<DbError> for ChamberError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Constraint(v) => v.into(),
            DbError::NotFound(what) => ChamberError::NotFound(what),
            other => ChamberError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ConstraintViolation> for ChamberError {
    fn from(v: ConstraintViolation) -> Self {
        ChamberError::ConstraintViolation(v.to_string())
    }
}

impl From<BillingError> for ChamberError {
    fn from(e: BillingError) -> Self {
        match e {
            BillingError::Database(e) => e.into(),
            BillingError::NotFound(what) => ChamberError::NotFound(what),
            e @ BillingError::InsufficientStock { .. } => ChamberError::InvalidInput(e.to_string()),
        }
    }
}

impl From<crate::config::ConfigError> for ChamberError {
    fn from(e: crate::config::ConfigError) -> Self {
        ChamberError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for ChamberError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        ChamberError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<ChamberCore>, ChamberError> {
    let db = Database::open(&path)?;
    Ok(ChamberCore::wrap(db))
}

/// Open the database described by a TOML config file (or `CHAMBER_*` env vars),
/// seeding its configured accounts.
#[uniffi::export]
pub fn open_database_with_config(
    config_path: Option<String>,
) -> Result<Arc<ChamberCore>, ChamberError> {
    let path = config_path.map(PathBuf::from);
    let config = StoreConfig::load(path.as_deref())?;
    let db = Database::open_with_config(&config)?;
    Ok(ChamberCore::wrap(db))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<ChamberCore>, ChamberError> {
    let db = Database::open_in_memory()?;
    Ok(ChamberCore::wrap(db))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
#[derive(uniffi::Object)]
pub struct ChamberCore {
    db: Arc<Mutex<Database>>,
}

impl ChamberCore {
    fn wrap(db: Database) -> Arc<Self> {
        Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }
}

#[uniffi::export]
impl ChamberCore {
    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Register a new patient. `gender` must be Male, Female or Third-Gender.
    #[allow(clippy::too_many_arguments)]
    pub fn create_patient(
        &self,
        name: String,
        nid: Option<String>,
        phone: Option<String>,
        age: Option<i64>,
        gender: Option<String>,
        address: Option<String>,
        created_by: Option<i64>,
    ) -> Result<FfiPatient, ChamberError> {
        let mut patient = Patient::new(name);
        patient.nid = nid;
        patient.phone = phone;
        patient.age = age;
        patient.gender = gender.as_deref().map(str::parse::<Gender>).transpose()?;
        patient.address = address;
        patient.created_by = created_by;

        let db = self.db.lock()?;
        let id = db.insert_patient(&patient)?;
        let stored = db
            .get_patient(id)?
            .ok_or_else(|| ChamberError::NotFound(format!("patient {}", id)))?;
        Ok(stored.into())
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> Result<Option<FfiPatient>, ChamberError> {
        let db = self.db.lock()?;
        let patient = db.get_patient(id)?;
        Ok(patient.map(|p| p.into()))
    }

    /// Search patients by name prefix.
    pub fn search_patients(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiPatient>, ChamberError> {
        let db = self.db.lock()?;
        let patients = db.search_patients(&query, limit as usize)?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Inventory Operations
    // =========================================================================

    /// Add a remedy to inventory. `potency` must be one of 1X, 2X, 6X, 12X, 200, 30, 60.
    pub fn add_remedy(
        &self,
        name: String,
        potency: String,
        description: Option<String>,
        unit_price: f64,
        stock_quantity: i64,
    ) -> Result<FfiRemedy, ChamberError> {
        let mut remedy = Remedy::new(name, potency.parse::<Potency>()?, unit_price);
        remedy.description = description;
        remedy.stock_quantity = stock_quantity;

        let db = self.db.lock()?;
        remedy.id = Some(db.insert_remedy(&remedy)?);
        Ok(remedy.into())
    }

    /// List all remedies by name.
    pub fn list_remedies(&self) -> Result<Vec<FfiRemedy>, ChamberError> {
        let db = self.db.lock()?;
        let remedies = db.list_remedies()?;
        Ok(remedies.into_iter().map(|r| r.into()).collect())
    }

    /// Fuzzy search remedies by name, best match first.
    pub fn find_remedies(
        &self,
        query: String,
        limit: u32,
    ) -> Result<Vec<FfiRemedyMatch>, ChamberError> {
        let db = self.db.lock()?;
        let matches = RemedyLookup::new(&db).find(&query, limit as usize)?;
        Ok(matches.into_iter().map(|m| m.into()).collect())
    }

    // =========================================================================
    // Billing Operations
    // =========================================================================

    /// Record a visit with dispensed remedies and its payment, atomically.
    pub fn record_visit(&self, request: FfiVisitRequest) -> Result<FfiVisitReceipt, ChamberError> {
        let db = self.db.lock()?;
        let receipt = Billing::new(&db).record_visit(&request.into())?;
        Ok(receipt.into())
    }

    /// Override billing amounts of a visit and recompute its status.
    pub fn settle_payment(
        &self,
        visit_id: i64,
        consultation_fee: Option<f64>,
        medicine_bill: Option<f64>,
        amount_paid: Option<f64>,
    ) -> Result<FfiVisitReceipt, ChamberError> {
        let adjustment = PaymentAdjustment {
            consultation_fee,
            medicine_bill,
            amount_paid,
        };
        let db = self.db.lock()?;
        let payment = Billing::new(&db).settle_payment(visit_id, &adjustment)?;
        Ok(payment.into())
    }

    // =========================================================================
    // Reporting Operations
    // =========================================================================

    /// Visit history, newest first. Restricted to one patient when `patient_id` is set.
    pub fn patient_history(
        &self,
        patient_id: Option<i64>,
        limit: Option<u32>,
    ) -> Result<Vec<FfiPatientHistory>, ChamberError> {
        let db = self.db.lock()?;
        let limit = limit.map(|l| l as usize);
        let rows = match patient_id {
            Some(id) => db.patient_history_for(id, limit)?,
            None => db.patient_history(limit)?,
        };
        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Revenue per calendar day, oldest first.
    pub fn daily_revenue(&self) -> Result<Vec<FfiDailyRevenue>, ChamberError> {
        let db = self.db.lock()?;
        let rows = db.daily_revenue()?;
        Ok(rows.into_iter().map(|r| r.into()).collect())
    }

    /// Visits recorded today and patients registered today.
    pub fn today_stats(&self) -> Result<FfiTodayStats, ChamberError> {
        let db = self.db.lock()?;
        Ok(db.today_stats()?.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: Option<i64>,
    pub name: String,
    pub nid: Option<String>,
    pub phone: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub created_by: Option<i64>,
    pub created_at: String,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            nid: patient.nid,
            phone: patient.phone,
            age: patient.age,
            gender: patient.gender.map(|g| g.as_str().to_string()),
            address: patient.address,
            created_by: patient.created_by,
            created_at: patient.created_at,
        }
    }
}

/// FFI-safe remedy.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRemedy {
    pub id: Option<i64>,
    pub name: String,
    pub potency: String,
    pub description: Option<String>,
    pub current_unit_price: f64,
    pub stock_quantity: i64,
}

impl From<Remedy> for FfiRemedy {
    fn from(remedy: Remedy) -> Self {
        Self {
            id: remedy.id,
            name: remedy.name,
            potency: remedy.potency.as_str().to_string(),
            description: remedy.description,
            current_unit_price: remedy.current_unit_price,
            stock_quantity: remedy.stock_quantity,
        }
    }
}

/// FFI-safe remedy lookup result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRemedyMatch {
    pub remedy: FfiRemedy,
    pub score: f64,
}

impl From<RemedyMatch> for FfiRemedyMatch {
    fn from(m: RemedyMatch) -> Self {
        Self {
            remedy: m.remedy.into(),
            score: m.score,
        }
    }
}

/// FFI-safe dispensing request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDispenseItem {
    pub remedy_id: i64,
    pub quantity: i64,
}

/// FFI-safe visit request.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisitRequest {
    pub patient_id: i64,
    pub recorded_by: Option<i64>,
    pub chief_complaint: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub consultation_fee: f64,
    pub amount_paid: f64,
    pub medicines: Vec<FfiDispenseItem>,
}

impl From<FfiVisitRequest> for VisitRequest {
    fn from(req: FfiVisitRequest) -> Self {
        VisitRequest {
            patient_id: req.patient_id,
            recorded_by: req.recorded_by,
            chief_complaint: req.chief_complaint,
            diagnosis: req.diagnosis,
            notes: req.notes,
            consultation_fee: req.consultation_fee,
            amount_paid: req.amount_paid,
            medicines: req
                .medicines
                .into_iter()
                .map(|m| DispenseRequest {
                    remedy_id: m.remedy_id,
                    quantity: m.quantity,
                })
                .collect(),
        }
    }
}

/// FFI-safe billing summary of a visit.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVisitReceipt {
    pub visit_id: i64,
    pub payment_id: Option<i64>,
    pub medicine_bill: f64,
    pub total_bill: f64,
    pub due_amount: f64,
    pub status: String,
}

impl From<VisitReceipt> for FfiVisitReceipt {
    fn from(receipt: VisitReceipt) -> Self {
        Self {
            visit_id: receipt.visit_id,
            payment_id: Some(receipt.payment_id),
            medicine_bill: receipt.medicine_bill,
            total_bill: receipt.total_bill,
            due_amount: receipt.due_amount,
            status: receipt.status,
        }
    }
}

impl From<Payment> for FfiVisitReceipt {
    fn from(payment: Payment) -> Self {
        Self {
            visit_id: payment.visit_id,
            payment_id: payment.id,
            medicine_bill: payment.medicine_bill,
            total_bill: payment.total_bill,
            due_amount: payment.due_amount,
            status: payment.status,
        }
    }
}

/// FFI-safe patient history row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientHistory {
    pub visit_id: i64,
    pub visit_date: String,
    pub chief_complaint: Option<String>,
    pub diagnosis: Option<String>,
    pub patient_id: i64,
    pub patient_name: String,
    pub patient_nid: Option<String>,
    pub total_bill: Option<f64>,
    pub amount_paid: Option<f64>,
    pub due_amount: Option<f64>,
    pub payment_status: Option<String>,
}

impl From<PatientHistoryRow> for FfiPatientHistory {
    fn from(row: PatientHistoryRow) -> Self {
        Self {
            visit_id: row.visit_id,
            visit_date: row.visit_date,
            chief_complaint: row.chief_complaint,
            diagnosis: row.diagnosis,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            patient_nid: row.patient_nid,
            total_bill: row.total_bill,
            amount_paid: row.amount_paid,
            due_amount: row.due_amount,
            payment_status: row.payment_status,
        }
    }
}

/// FFI-safe daily revenue row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDailyRevenue {
    pub revenue_date: String,
    pub payment_count: i64,
    pub total_bill_sum: f64,
    pub amount_paid_sum: f64,
}

impl From<DailyRevenueRow> for FfiDailyRevenue {
    fn from(row: DailyRevenueRow) -> Self {
        Self {
            revenue_date: row.revenue_date,
            payment_count: row.payment_count,
            total_bill_sum: row.total_bill_sum,
            amount_paid_sum: row.amount_paid_sum,
        }
    }
}

/// FFI-safe today counters.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTodayStats {
    pub today_visits: i64,
    pub today_patients: i64,
}

impl From<TodayStats> for FfiTodayStats {
    fn from(stats: TodayStats) -> Self {
        Self {
            today_visits: stats.today_visits,
            today_patients: stats.today_patients,
        }
    }
}
