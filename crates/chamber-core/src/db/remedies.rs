//! Remedy inventory database operations.

use log::debug;
use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Potency, Remedy};

const REMEDY_COLUMNS: &str =
    "id, name, potency, description, current_unit_price, stock_quantity, created_at";

impl Database {
    /// Insert a new remedy, returning its row ID.
    pub fn insert_remedy(&self, remedy: &Remedy) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO remedies (
                name, potency, description, current_unit_price, stock_quantity, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                remedy.name,
                remedy.potency.as_str(),
                remedy.description,
                remedy.current_unit_price,
                remedy.stock_quantity,
                remedy.created_at,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("inserted remedy {} ({})", id, remedy.label());
        Ok(id)
    }

    /// Update an existing remedy.
    ///
    /// Changing `current_unit_price` only affects future dispensing; recorded
    /// line items keep their snapshot.
    pub fn update_remedy(&self, remedy: &Remedy) -> DbResult<bool> {
        let Some(id) = remedy.id else {
            return Ok(false);
        };
        let rows_affected = self.conn.execute(
            r#"
            UPDATE remedies SET
                name = ?2,
                potency = ?3,
                description = ?4,
                current_unit_price = ?5,
                stock_quantity = ?6
            WHERE id = ?1
            "#,
            params![
                id,
                remedy.name,
                remedy.potency.as_str(),
                remedy.description,
                remedy.current_unit_price,
                remedy.stock_quantity,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Add `delta` (may be negative) to a remedy's stock.
    ///
    /// Stock can never drop below zero; such an update is a check violation.
    pub fn adjust_remedy_stock(&self, id: i64, delta: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE remedies SET stock_quantity = stock_quantity + ? WHERE id = ?",
            params![delta, id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a remedy by ID.
    pub fn get_remedy(&self, id: i64) -> DbResult<Option<Remedy>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM remedies WHERE id = ?", REMEDY_COLUMNS),
                [id],
                RemedyRow::read,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List all remedies by name.
    pub fn list_remedies(&self) -> DbResult<Vec<Remedy>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM remedies ORDER BY name, potency",
            REMEDY_COLUMNS
        ))?;
        let rows = stmt.query_map([], RemedyRow::read)?;

        let mut remedies = Vec::new();
        for row in rows {
            remedies.push(row?.try_into()?);
        }
        Ok(remedies)
    }

    /// Delete a remedy. Fails with a foreign key violation once it has been dispensed.
    pub fn delete_remedy(&self, id: i64) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM remedies WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct RemedyRow {
    id: i64,
    name: String,
    potency: String,
    description: Option<String>,
    current_unit_price: f64,
    stock_quantity: i64,
    created_at: String,
}

impl RemedyRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            potency: row.get(2)?,
            description: row.get(3)?,
            current_unit_price: row.get(4)?,
            stock_quantity: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl TryFrom<RemedyRow> for Remedy {
    type Error = DbError;

    fn try_from(row: RemedyRow) -> Result<Self, Self::Error> {
        Ok(Remedy {
            id: Some(row.id),
            name: row.name,
            potency: row.potency.parse::<Potency>().map_err(DbError::Constraint)?,
            description: row.description,
            current_unit_price: row.current_unit_price,
            stock_quantity: row.stock_quantity,
            created_at: row.created_at,
        })
    }
}
