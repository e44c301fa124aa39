//! Dispensed line item database operations.
//!
//! Line items are append-only: there is no update API, and the schema trigger
//! rejects any change to `unit_price_snapshot` or `line_total`.

use log::debug;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::VisitMedicine;

const VISIT_MEDICINE_COLUMNS: &str =
    "id, visit_id, remedy_id, quantity, unit_price_snapshot, line_total";

fn visit_medicine_from_row(row: &Row<'_>) -> rusqlite::Result<VisitMedicine> {
    Ok(VisitMedicine {
        id: row.get(0)?,
        visit_id: row.get(1)?,
        remedy_id: row.get(2)?,
        quantity: row.get(3)?,
        unit_price_snapshot: row.get(4)?,
        line_total: row.get(5)?,
    })
}

impl Database {
    /// Insert a dispensed line item, returning its row ID.
    pub fn insert_visit_medicine(&self, line: &VisitMedicine) -> DbResult<i64> {
        line.validate()?;
        self.conn.execute(
            r#"
            INSERT INTO visit_medicines (
                visit_id, remedy_id, quantity, unit_price_snapshot, line_total
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                line.visit_id,
                line.remedy_id,
                line.quantity,
                line.unit_price_snapshot,
                line.line_total,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(
            "inserted visit medicine {} (visit {}, remedy {} x{})",
            id, line.visit_id, line.remedy_id, line.quantity
        );
        Ok(id)
    }

    /// Get a line item by ID.
    pub fn get_visit_medicine(&self, id: i64) -> DbResult<Option<VisitMedicine>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM visit_medicines WHERE id = ?", VISIT_MEDICINE_COLUMNS),
                [id],
                visit_medicine_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List the line items of a visit in dispensing order.
    pub fn list_visit_medicines(&self, visit_id: i64) -> DbResult<Vec<VisitMedicine>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM visit_medicines WHERE visit_id = ? ORDER BY id",
            VISIT_MEDICINE_COLUMNS
        ))?;
        let rows = stmt.query_map([visit_id], visit_medicine_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Sum of line totals for a visit.
    pub fn medicine_bill_for_visit(&self, visit_id: i64) -> DbResult<f64> {
        self.conn
            .query_row(
                "SELECT COALESCE(SUM(line_total), 0.0) FROM visit_medicines WHERE visit_id = ?",
                [visit_id],
                |row| row.get(0),
            )
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConstraintKind;
    use crate::models::{Patient, Potency, Remedy, Visit};

    fn setup_db() -> (Database, i64, i64) {
        let db = Database::open_in_memory().unwrap();
        let patient_id = db.insert_patient(&Patient::new("Rahim".into())).unwrap();
        let visit_id = db.insert_visit(&Visit::new(patient_id)).unwrap();
        let remedy_id = db
            .insert_remedy(&Remedy::new("Arnica Montana".into(), Potency::C30, 50.0))
            .unwrap();
        (db, visit_id, remedy_id)
    }

    #[test]
    fn test_insert_and_list() {
        let (db, visit_id, remedy_id) = setup_db();

        let id = db
            .insert_visit_medicine(&VisitMedicine::new(visit_id, remedy_id, 3, 50.0))
            .unwrap();
        db.insert_visit_medicine(&VisitMedicine::new(visit_id, remedy_id, 1, 50.0))
            .unwrap();

        let line = db.get_visit_medicine(id).unwrap().unwrap();
        assert_eq!(line.line_total, 150.0);

        let lines = db.list_visit_medicines(visit_id).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(db.medicine_bill_for_visit(visit_id).unwrap(), 200.0);
    }

    #[test]
    fn test_empty_bill_is_zero() {
        let (db, visit_id, _) = setup_db();
        assert_eq!(db.medicine_bill_for_visit(visit_id).unwrap(), 0.0);
    }

    #[test]
    fn test_inconsistent_total_not_written() {
        let (db, visit_id, remedy_id) = setup_db();

        let mut line = VisitMedicine::new(visit_id, remedy_id, 3, 50.0);
        line.line_total = 10.0;
        let err = db.insert_visit_medicine(&line).unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::CheckViolation));
        assert!(db.list_visit_medicines(visit_id).unwrap().is_empty());
    }

    #[test]
    fn test_missing_remedy() {
        let (db, visit_id, _) = setup_db();
        let err = db
            .insert_visit_medicine(&VisitMedicine::new(visit_id, 404, 1, 5.0))
            .unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKeyViolation));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let (db, visit_id, remedy_id) = setup_db();
        let err = db
            .insert_visit_medicine(&VisitMedicine::new(visit_id, remedy_id, 0, 50.0))
            .unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::CheckViolation));
    }

    #[test]
    fn test_remedy_delete_restricted() {
        let (db, visit_id, remedy_id) = setup_db();
        db.insert_visit_medicine(&VisitMedicine::new(visit_id, remedy_id, 1, 50.0))
            .unwrap();

        let err = db.delete_remedy(remedy_id).unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKeyViolation));
    }

    #[test]
    fn test_snapshot_update_rejected() {
        let (db, visit_id, remedy_id) = setup_db();
        let id = db
            .insert_visit_medicine(&VisitMedicine::new(visit_id, remedy_id, 3, 50.0))
            .unwrap();

        let err: crate::db::DbError = db
            .conn()
            .execute(
                "UPDATE visit_medicines SET unit_price_snapshot = 60.0 WHERE id = ?",
                [id],
            )
            .unwrap_err()
            .into();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::CheckViolation));
        assert_eq!(db.get_visit_medicine(id).unwrap().unwrap().unit_price_snapshot, 50.0);
    }
}
