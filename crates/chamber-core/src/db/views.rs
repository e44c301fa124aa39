//! Reads over the derived reporting views.
//!
//! Every call queries the SQL view afresh, so results always reflect the
//! current base tables.

use rusqlite::Row;

use super::{Database, DbError, DbResult};
use crate::models::{
    DailyRevenueRow, DashboardCounts, PatientHistoryRow, Potency, TodayStats,
    VisitMedicineDetailRow,
};

const HISTORY_COLUMNS: &str = "visit_id, visit_date, chief_complaint, diagnosis, notes, \
                               patient_id, patient_name, patient_nid, patient_phone, \
                               consultation_fee, medicine_bill, total_bill, amount_paid, \
                               due_amount, payment_status";

const DETAIL_COLUMNS: &str = "visit_medicine_id, visit_id, visit_date, patient_id, patient_name, \
                              remedy_id, remedy_name, potency, quantity, unit_price_snapshot, \
                              line_total";

fn history_from_row(row: &Row<'_>) -> rusqlite::Result<PatientHistoryRow> {
    Ok(PatientHistoryRow {
        visit_id: row.get(0)?,
        visit_date: row.get(1)?,
        chief_complaint: row.get(2)?,
        diagnosis: row.get(3)?,
        notes: row.get(4)?,
        patient_id: row.get(5)?,
        patient_name: row.get(6)?,
        patient_nid: row.get(7)?,
        patient_phone: row.get(8)?,
        consultation_fee: row.get(9)?,
        medicine_bill: row.get(10)?,
        total_bill: row.get(11)?,
        amount_paid: row.get(12)?,
        due_amount: row.get(13)?,
        payment_status: row.get(14)?,
    })
}

/// Intermediate detail row with potency as stored text.
struct DetailRow {
    visit_medicine_id: i64,
    visit_id: i64,
    visit_date: String,
    patient_id: i64,
    patient_name: String,
    remedy_id: i64,
    remedy_name: String,
    potency: String,
    quantity: i64,
    unit_price_snapshot: f64,
    line_total: f64,
}

impl DetailRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            visit_medicine_id: row.get(0)?,
            visit_id: row.get(1)?,
            visit_date: row.get(2)?,
            patient_id: row.get(3)?,
            patient_name: row.get(4)?,
            remedy_id: row.get(5)?,
            remedy_name: row.get(6)?,
            potency: row.get(7)?,
            quantity: row.get(8)?,
            unit_price_snapshot: row.get(9)?,
            line_total: row.get(10)?,
        })
    }
}

impl TryFrom<DetailRow> for VisitMedicineDetailRow {
    type Error = DbError;

    fn try_from(row: DetailRow) -> Result<Self, Self::Error> {
        Ok(VisitMedicineDetailRow {
            visit_medicine_id: row.visit_medicine_id,
            visit_id: row.visit_id,
            visit_date: row.visit_date,
            patient_id: row.patient_id,
            patient_name: row.patient_name,
            remedy_id: row.remedy_id,
            remedy_name: row.remedy_name,
            potency: row.potency.parse::<Potency>().map_err(DbError::Constraint)?,
            quantity: row.quantity,
            unit_price_snapshot: row.unit_price_snapshot,
            line_total: row.line_total,
        })
    }
}

impl Database {
    /// Visits with their patient and payment, most recent first.
    pub fn patient_history(&self, limit: Option<usize>) -> DbResult<Vec<PatientHistoryRow>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM view_patient_history ORDER BY visit_date DESC, visit_id DESC LIMIT ?",
            HISTORY_COLUMNS
        ))?;
        let rows = stmt.query_map([limit], history_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// History rows of a single patient, most recent first.
    pub fn patient_history_for(
        &self,
        patient_id: i64,
        limit: Option<usize>,
    ) -> DbResult<Vec<PatientHistoryRow>> {
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM view_patient_history WHERE patient_id = ?1 \
             ORDER BY visit_date DESC, visit_id DESC LIMIT ?2",
            HISTORY_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id, limit], history_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Revenue per calendar date, oldest first.
    pub fn daily_revenue(&self) -> DbResult<Vec<DailyRevenueRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT revenue_date, payment_count, total_bill_sum, amount_paid_sum
            FROM view_daily_revenue
            ORDER BY revenue_date ASC
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(DailyRevenueRow {
                revenue_date: row.get(0)?,
                payment_count: row.get(1)?,
                total_bill_sum: row.get(2)?,
                amount_paid_sum: row.get(3)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Every dispensed line with visit, patient and remedy details.
    pub fn visit_medicine_details(&self) -> DbResult<Vec<VisitMedicineDetailRow>> {
        self.collect_details(
            &format!(
                "SELECT {} FROM view_visit_medicine_detail ORDER BY visit_id, visit_medicine_id",
                DETAIL_COLUMNS
            ),
            None,
        )
    }

    /// Dispensed lines of one visit.
    pub fn visit_medicine_details_for_visit(
        &self,
        visit_id: i64,
    ) -> DbResult<Vec<VisitMedicineDetailRow>> {
        self.collect_details(
            &format!(
                "SELECT {} FROM view_visit_medicine_detail WHERE visit_id = ?1 \
                 ORDER BY visit_medicine_id",
                DETAIL_COLUMNS
            ),
            Some(visit_id),
        )
    }

    /// Visits and new patients dated today, by the database clock (UTC).
    pub fn today_stats(&self) -> DbResult<TodayStats> {
        self.conn
            .query_row(
                "SELECT today_visits, today_patients FROM view_today_stats",
                [],
                |row| {
                    Ok(TodayStats {
                        today_visits: row.get(0)?,
                        today_patients: row.get(1)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    /// Headline counts for the dashboard.
    pub fn dashboard_counts(&self) -> DbResult<DashboardCounts> {
        self.conn
            .query_row(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM patients),
                    (SELECT COUNT(*) FROM visits),
                    (SELECT COUNT(*) FROM remedies),
                    (SELECT today_visits FROM view_today_stats)
                "#,
                [],
                |row| {
                    Ok(DashboardCounts {
                        patients: row.get(0)?,
                        visits: row.get(1)?,
                        remedies: row.get(2)?,
                        today_visits: row.get(3)?,
                    })
                },
            )
            .map_err(Into::into)
    }

    fn collect_details(
        &self,
        sql: &str,
        visit_id: Option<i64>,
    ) -> DbResult<Vec<VisitMedicineDetailRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = match visit_id {
            Some(id) => stmt.query_map([id], DetailRow::read)?.collect::<Result<Vec<_>, _>>()?,
            None => stmt.query_map([], DetailRow::read)?.collect::<Result<Vec<_>, _>>()?,
        };

        rows.into_iter().map(VisitMedicineDetailRow::try_from).collect()
    }
}
