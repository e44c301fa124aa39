//! Patient database operations.

use log::debug;
use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Gender, Patient};

const PATIENT_COLUMNS: &str =
    "id, name, nid, phone, age, gender, address, created_by, created_at";

/// LIKE pattern matching names that start with `query`.
fn like_prefix(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 1);
    for c in query.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl Database {
    /// Insert a new patient, returning its row ID.
    pub fn insert_patient(&self, patient: &Patient) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO patients (
                name, nid, phone, age, gender, address, created_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                patient.name,
                patient.nid_for_storage(),
                patient.phone,
                patient.age,
                patient.gender.map(|g| g.as_str()),
                patient.address,
                patient.created_by,
                patient.created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("inserted patient {}", id);
        Ok(id)
    }

    /// Update an existing patient's demographic fields.
    pub fn update_patient(&self, patient: &Patient) -> DbResult<bool> {
        let Some(id) = patient.id else {
            return Ok(false);
        };
        let rows_affected = self.conn.execute(
            r#"
            UPDATE patients SET
                name = ?2,
                nid = ?3,
                phone = ?4,
                age = ?5,
                gender = ?6,
                address = ?7
            WHERE id = ?1
            "#,
            params![
                id,
                patient.name,
                patient.nid_for_storage(),
                patient.phone,
                patient.age,
                patient.gender.map(|g| g.as_str()),
                patient.address,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a patient by ID.
    pub fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE id = ?", PATIENT_COLUMNS),
                [id],
                PatientRow::read,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get a patient by national identifier.
    pub fn get_patient_by_nid(&self, nid: &str) -> DbResult<Option<Patient>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM patients WHERE nid = ?", PATIENT_COLUMNS),
                [nid.trim()],
                PatientRow::read,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Search patients by name (prefix match). `%` and `_` in `query` match literally.
    pub fn search_patients(&self, query: &str, limit: usize) -> DbResult<Vec<Patient>> {
        let pattern = like_prefix(query);
        self.collect_patients(
            &format!(
                "SELECT {} FROM patients WHERE name LIKE ? ESCAPE '\\' ORDER BY name LIMIT ?",
                PATIENT_COLUMNS
            ),
            params![pattern, limit as i64],
        )
    }

    /// List all patients, most recently registered first.
    pub fn list_patients(&self) -> DbResult<Vec<Patient>> {
        self.collect_patients(
            &format!(
                "SELECT {} FROM patients ORDER BY created_at DESC, id DESC",
                PATIENT_COLUMNS
            ),
            params![],
        )
    }

    /// List patients registered by a given user.
    pub fn list_patients_created_by(&self, user_id: i64) -> DbResult<Vec<Patient>> {
        self.collect_patients(
            &format!(
                "SELECT {} FROM patients WHERE created_by = ? ORDER BY created_at, id",
                PATIENT_COLUMNS
            ),
            params![user_id],
        )
    }

    /// Delete a patient. Fails with a foreign key violation while visits exist.
    pub fn delete_patient(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM patients WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn collect_patients(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> DbResult<Vec<Patient>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, PatientRow::read)?;

        let mut patients = Vec::new();
        for row in rows {
            patients.push(row?.try_into()?);
        }
        Ok(patients)
    }
}

/// Intermediate row struct for database mapping.
struct PatientRow {
    id: i64,
    name: String,
    nid: Option<String>,
    phone: Option<String>,
    age: Option<i64>,
    gender: Option<String>,
    address: Option<String>,
    created_by: Option<i64>,
    created_at: String,
}

impl PatientRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            nid: row.get(2)?,
            phone: row.get(3)?,
            age: row.get(4)?,
            gender: row.get(5)?,
            address: row.get(6)?,
            created_by: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}

impl TryFrom<PatientRow> for Patient {
    type Error = DbError;

    fn try_from(row: PatientRow) -> Result<Self, Self::Error> {
        Ok(Patient {
            id: Some(row.id),
            name: row.name,
            nid: row.nid,
            phone: row.phone,
            age: row.age,
            gender: row
                .gender
                .map(|g| g.parse::<Gender>())
                .transpose()
                .map_err(DbError::Constraint)?,
            address: row.address,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}
