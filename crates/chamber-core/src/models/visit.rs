//! Visit and dispensed line item models.

use serde::{Deserialize, Serialize};

use super::Remedy;
use crate::db::{DbError, DbResult};

/// One encounter of a patient. Clinical fields stay editable after billing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    /// Row ID - None until inserted
    pub id: Option<i64>,
    pub patient_id: i64,
    pub visit_date: String,
    pub chief_complaint: Option<String>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    /// User who recorded the visit
    pub recorded_by: Option<i64>,
}

impl Visit {
    /// Create a visit dated now.
    pub fn new(patient_id: i64) -> Self {
        Self {
            id: None,
            patient_id,
            visit_date: super::now_timestamp(),
            chief_complaint: None,
            diagnosis: None,
            notes: None,
            recorded_by: None,
        }
    }
}

/// A remedy dispensed during a visit.
///
/// `unit_price_snapshot` is the price at the time of dispensing and is never
/// recomputed from the remedy's current price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitMedicine {
    /// Row ID - None until inserted
    pub id: Option<i64>,
    pub visit_id: i64,
    pub remedy_id: i64,
    pub quantity: i64,
    pub unit_price_snapshot: f64,
    pub line_total: f64,
}

impl VisitMedicine {
    /// Create a line item, freezing the given unit price.
    pub fn new(visit_id: i64, remedy_id: i64, quantity: i64, unit_price_snapshot: f64) -> Self {
        Self {
            id: None,
            visit_id,
            remedy_id,
            quantity,
            unit_price_snapshot,
            line_total: quantity as f64 * unit_price_snapshot,
        }
    }

    /// Line item for `quantity` units of a stored remedy at its current price.
    pub fn dispense(visit_id: i64, remedy: &Remedy, quantity: i64) -> DbResult<Self> {
        let remedy_id = remedy
            .id
            .ok_or_else(|| DbError::NotFound(format!("unsaved remedy {}", remedy.label())))?;
        Ok(Self::new(visit_id, remedy_id, quantity, remedy.current_unit_price))
    }

    /// Check that the line total matches quantity times the snapshot price.
    pub fn validate(&self) -> DbResult<()> {
        let expected = self.quantity as f64 * self.unit_price_snapshot;
        if !super::amounts_match(self.line_total, expected) {
            return Err(DbError::check(format!(
                "line_total {} does not equal quantity {} x unit price {}",
                self.line_total, self.quantity, self.unit_price_snapshot
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ConstraintKind;
    use crate::models::Potency;

    #[test]
    fn test_dispense_snapshots_current_price() {
        let mut remedy = Remedy::new("Arnica Montana".into(), Potency::C30, 50.0);
        remedy.id = Some(4);

        let line = VisitMedicine::dispense(9, &remedy, 3).unwrap();
        remedy.current_unit_price = 60.0;

        assert_eq!(line.visit_id, 9);
        assert_eq!(line.remedy_id, 4);
        assert_eq!(line.unit_price_snapshot, 50.0);
        assert_eq!(line.line_total, 150.0);
        assert!(line.validate().is_ok());
    }

    #[test]
    fn test_dispense_unsaved_remedy() {
        let remedy = Remedy::new("Sulphur".into(), Potency::C200, 10.0);
        let err = VisitMedicine::dispense(1, &remedy, 1).unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[test]
    fn test_line_total() {
        let line = VisitMedicine::new(1, 1, 3, 50.0);
        assert_eq!(line.line_total, 150.0);
        assert!(line.validate().is_ok());
    }

    #[test]
    fn test_inconsistent_line_total() {
        let mut line = VisitMedicine::new(1, 1, 3, 50.0);
        line.line_total = 100.0;
        let err = line.validate().unwrap_err();
        assert_eq!(err.constraint_kind(), Some(ConstraintKind::CheckViolation));
    }
}
