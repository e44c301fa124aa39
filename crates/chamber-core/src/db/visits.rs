//! Visit database operations.

use chrono::NaiveDate;
use log::debug;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Visit;

const VISIT_COLUMNS: &str =
    "id, patient_id, visit_date, chief_complaint, diagnosis, notes, recorded_by";

fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    Ok(Visit {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        visit_date: row.get(2)?,
        chief_complaint: row.get(3)?,
        diagnosis: row.get(4)?,
        notes: row.get(5)?,
        recorded_by: row.get(6)?,
    })
}

impl Database {
    /// Insert a new visit, returning its row ID.
    pub fn insert_visit(&self, visit: &Visit) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO visits (
                patient_id, visit_date, chief_complaint, diagnosis, notes, recorded_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                visit.patient_id,
                visit.visit_date,
                visit.chief_complaint,
                visit.diagnosis,
                visit.notes,
                visit.recorded_by,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("inserted visit {} for patient {}", id, visit.patient_id);
        Ok(id)
    }

    /// Update the clinical fields of a visit.
    ///
    /// Patient, date and recorder are fixed once the visit exists.
    pub fn update_visit_clinical(
        &self,
        id: i64,
        chief_complaint: Option<&str>,
        diagnosis: Option<&str>,
        notes: Option<&str>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE visits SET
                chief_complaint = ?2,
                diagnosis = ?3,
                notes = ?4
            WHERE id = ?1
            "#,
            params![id, chief_complaint, diagnosis, notes],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a visit by ID.
    pub fn get_visit(&self, id: i64) -> DbResult<Option<Visit>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM visits WHERE id = ?", VISIT_COLUMNS),
                [id],
                visit_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List a patient's visits, oldest first.
    pub fn list_visits_for_patient(&self, patient_id: i64) -> DbResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM visits WHERE patient_id = ? ORDER BY visit_date, id",
            VISIT_COLUMNS
        ))?;
        let rows = stmt.query_map([patient_id], visit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List visits whose date falls within `[from, to]` (inclusive).
    pub fn list_visits_between(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Visit>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM visits WHERE DATE(visit_date) BETWEEN ?1 AND ?2 ORDER BY visit_date, id",
            VISIT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![from.to_string(), to.to_string()], visit_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Delete a visit. Fails with a foreign key violation once it has line items or a payment.
    pub fn delete_visit(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM visits WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConstraintKind;
    use crate::models::{Patient, Payment};

    fn setup_db() -> (Database, i64) {
        let db = Database::open_in_memory().unwrap();
        let patient_id = db.insert_patient(&Patient::new("Rahim".into())).unwrap();
        (db, patient_id)
    }

    fn visit_on(patient_id: i64, date: &str) -> Visit {
        let mut visit = Visit::new(patient_id);
        visit.visit_date = format!("{} 10:00:00", date);
        visit
    }

    #[test]
    fn test_insert_and_get() {
        let (db, patient_id) = setup_db();

        let mut visit = Visit::new(patient_id);
        visit.chief_complaint = Some("Headache".into());
        let id = db.insert_visit(&visit).unwrap();

        let retrieved = db.get_visit(id).unwrap().unwrap();
        assert_eq!(retrieved.id, Some(id));
        assert_eq!(retrieved.patient_id, patient_id);
        assert_eq!(retrieved.chief_complaint, Some("Headache".into()));
    }

    #[test]
    fn test_missing_patient() {
        let (db, _) = setup_db();
        let err = db.insert_visit(&Visit::new(404)).unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKeyViolation));
    }

    #[test]
    fn test_update_clinical_fields() {
        let (db, patient_id) = setup_db();
        let id = db.insert_visit(&Visit::new(patient_id)).unwrap();

        assert!(db
            .update_visit_clinical(id, Some("Fever"), Some("Influenza"), Some("Follow up in 7 days"))
            .unwrap());

        let retrieved = db.get_visit(id).unwrap().unwrap();
        assert_eq!(retrieved.diagnosis, Some("Influenza".into()));
        assert_eq!(retrieved.notes, Some("Follow up in 7 days".into()));
        assert!(!db.update_visit_clinical(999, None, None, None).unwrap());
    }

    #[test]
    fn test_list_for_patient_and_range() {
        let (db, patient_id) = setup_db();
        let other = db.insert_patient(&Patient::new("Karim".into())).unwrap();

        db.insert_visit(&visit_on(patient_id, "2024-03-01")).unwrap();
        db.insert_visit(&visit_on(patient_id, "2024-03-05")).unwrap();
        db.insert_visit(&visit_on(other, "2024-03-03")).unwrap();
        db.insert_visit(&visit_on(other, "2024-04-01")).unwrap();

        assert_eq!(db.list_visits_for_patient(patient_id).unwrap().len(), 2);

        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let in_march = db.list_visits_between(from, to).unwrap();
        assert_eq!(in_march.len(), 3);
        assert!(in_march.windows(2).all(|w| w[0].visit_date <= w[1].visit_date));
    }

    #[test]
    fn test_delete_restricted_by_payment() {
        let (db, patient_id) = setup_db();
        let id = db.insert_visit(&Visit::new(patient_id)).unwrap();
        db.insert_payment(&Payment::for_visit(id, 100.0, 0.0, 0.0)).unwrap();

        let err = db.delete_visit(id).unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::ForeignKeyViolation));

        let unbilled = db.insert_visit(&Visit::new(patient_id)).unwrap();
        assert!(db.delete_visit(unbilled).unwrap());
    }
}
