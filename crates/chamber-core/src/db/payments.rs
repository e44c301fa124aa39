//! Payment database operations.

use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Payment;

const PAYMENT_COLUMNS: &str = "id, visit_id, consultation_fee, medicine_bill, total_bill, \
                               amount_paid, due_amount, status, created_at";

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        id: row.get(0)?,
        visit_id: row.get(1)?,
        consultation_fee: row.get(2)?,
        medicine_bill: row.get(3)?,
        total_bill: row.get(4)?,
        amount_paid: row.get(5)?,
        due_amount: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl Database {
    /// Insert the payment record of a visit, returning its row ID.
    ///
    /// Rejects inconsistent totals, and a second payment for the same visit.
    pub fn insert_payment(&self, payment: &Payment) -> DbResult<i64> {
        payment.validate()?;
        self.conn.execute(
            r#"
            INSERT INTO payments (
                visit_id, consultation_fee, medicine_bill, total_bill,
                amount_paid, due_amount, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                payment.visit_id,
                payment.consultation_fee,
                payment.medicine_bill,
                payment.total_bill,
                payment.amount_paid,
                payment.due_amount,
                payment.status,
                payment.created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(
            "inserted payment {} for visit {} (total {:.2}, status {})",
            id, payment.visit_id, payment.total_bill, payment.status
        );
        Ok(id)
    }

    /// Update the amounts and status of an existing payment.
    pub fn update_payment(&self, payment: &Payment) -> DbResult<bool> {
        let Some(id) = payment.id else {
            return Ok(false);
        };
        payment.validate()?;
        let rows_affected = self.conn.execute(
            r#"
            UPDATE payments SET
                consultation_fee = ?2,
                medicine_bill = ?3,
                total_bill = ?4,
                amount_paid = ?5,
                due_amount = ?6,
                status = ?7
            WHERE id = ?1
            "#,
            params![
                id,
                payment.consultation_fee,
                payment.medicine_bill,
                payment.total_bill,
                payment.amount_paid,
                payment.due_amount,
                payment.status,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a payment by ID.
    pub fn get_payment(&self, id: i64) -> DbResult<Option<Payment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM payments WHERE id = ?", PAYMENT_COLUMNS),
                [id],
                payment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get the payment record of a visit, if it has been billed.
    pub fn get_payment_for_visit(&self, visit_id: i64) -> DbResult<Option<Payment>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM payments WHERE visit_id = ?", PAYMENT_COLUMNS),
                [visit_id],
                payment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List payments created within `[from, to]` (inclusive).
    pub fn list_payments_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Payment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM payments WHERE DATE(created_at) BETWEEN ?1 AND ?2 ORDER BY created_at, id",
            PAYMENT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![from.to_string(), to.to_string()], payment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
