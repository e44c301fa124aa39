//! SQLite schema definition.

/// Complete database schema for the clinic store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Users (operator accounts)
-- ============================================================================

CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    hashed_password TEXT NOT NULL,
    full_name TEXT,
    role TEXT NOT NULL DEFAULT 'staff',
    is_active INTEGER NOT NULL DEFAULT 1 CHECK (is_active IN (0, 1)),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Patients
-- ============================================================================

CREATE TABLE IF NOT EXISTS patients (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    nid TEXT UNIQUE,                             -- NULL allowed for any number of rows
    phone TEXT,
    age INTEGER CHECK (age IS NULL OR age >= 0),
    gender TEXT CHECK (gender IN ('Male', 'Female', 'Third-Gender')),
    address TEXT,
    created_by INTEGER REFERENCES users(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_patients_name ON patients(name);
CREATE INDEX IF NOT EXISTS idx_patients_created_by ON patients(created_by);

-- ============================================================================
-- Remedies (inventory)
-- ============================================================================

CREATE TABLE IF NOT EXISTS remedies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    potency TEXT NOT NULL CHECK (potency IN ('1X', '2X', '6X', '12X', '200', '30', '60')),
    description TEXT,
    current_unit_price REAL NOT NULL CHECK (current_unit_price >= 0),
    stock_quantity INTEGER NOT NULL DEFAULT 0 CHECK (stock_quantity >= 0),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_remedies_name ON remedies(name);

-- ============================================================================
-- Visits
-- ============================================================================

CREATE TABLE IF NOT EXISTS visits (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patients(id) ON DELETE RESTRICT,
    visit_date TEXT NOT NULL DEFAULT (datetime('now')),
    chief_complaint TEXT,
    diagnosis TEXT,
    notes TEXT,
    recorded_by INTEGER REFERENCES users(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_visits_patient ON visits(patient_id);
CREATE INDEX IF NOT EXISTS idx_visits_date ON visits(visit_date);

-- ============================================================================
-- Visit Medicines (line items, price snapshot is write-once)
-- ============================================================================

CREATE TABLE IF NOT EXISTS visit_medicines (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visit_id INTEGER NOT NULL REFERENCES visits(id) ON DELETE RESTRICT,
    remedy_id INTEGER NOT NULL REFERENCES remedies(id) ON DELETE RESTRICT,
    quantity INTEGER NOT NULL CHECK (quantity > 0),
    unit_price_snapshot REAL NOT NULL CHECK (unit_price_snapshot >= 0),
    line_total REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_visit_medicines_visit ON visit_medicines(visit_id);
CREATE INDEX IF NOT EXISTS idx_visit_medicines_remedy ON visit_medicines(remedy_id);

CREATE TRIGGER IF NOT EXISTS visit_medicines_snapshot_immutable
BEFORE UPDATE OF unit_price_snapshot, line_total ON visit_medicines
WHEN new.unit_price_snapshot IS NOT old.unit_price_snapshot
  OR new.line_total IS NOT old.line_total
BEGIN
    SELECT RAISE(ABORT, 'unit_price_snapshot and line_total are immutable');
END;

-- ============================================================================
-- Payments (one evolving record per visit)
-- ============================================================================

CREATE TABLE IF NOT EXISTS payments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    visit_id INTEGER NOT NULL UNIQUE REFERENCES visits(id) ON DELETE RESTRICT,
    consultation_fee REAL NOT NULL DEFAULT 0.00,
    medicine_bill REAL NOT NULL DEFAULT 0.00,
    total_bill REAL NOT NULL,
    amount_paid REAL NOT NULL DEFAULT 0.00,
    due_amount REAL NOT NULL DEFAULT 0.00,
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_payments_created ON payments(created_at);

-- ============================================================================
-- Derived Views (computed on read, never materialized)
-- ============================================================================

CREATE VIEW IF NOT EXISTS view_patient_history AS
SELECT
    v.id AS visit_id,
    v.visit_date,
    v.chief_complaint,
    v.diagnosis,
    v.notes,
    p.id AS patient_id,
    p.name AS patient_name,
    p.nid AS patient_nid,
    p.phone AS patient_phone,
    pay.consultation_fee,
    pay.medicine_bill,
    pay.total_bill,
    pay.amount_paid,
    pay.due_amount,
    pay.status AS payment_status
FROM visits v
JOIN patients p ON p.id = v.patient_id
LEFT JOIN payments pay ON pay.visit_id = v.id;

CREATE VIEW IF NOT EXISTS view_daily_revenue AS
SELECT
    DATE(created_at) AS revenue_date,
    COUNT(*) AS payment_count,
    SUM(total_bill) AS total_bill_sum,
    SUM(amount_paid) AS amount_paid_sum
FROM payments
GROUP BY DATE(created_at)
ORDER BY revenue_date ASC;

CREATE VIEW IF NOT EXISTS view_visit_medicine_detail AS
SELECT
    vm.id AS visit_medicine_id,
    v.id AS visit_id,
    v.visit_date,
    p.id AS patient_id,
    p.name AS patient_name,
    r.id AS remedy_id,
    r.name AS remedy_name,
    r.potency,
    vm.quantity,
    vm.unit_price_snapshot,
    vm.line_total
FROM visit_medicines vm
JOIN visits v ON v.id = vm.visit_id
JOIN patients p ON p.id = v.patient_id
JOIN remedies r ON r.id = vm.remedy_id;

CREATE VIEW IF NOT EXISTS view_today_stats AS
SELECT
    (SELECT COUNT(*) FROM visits WHERE DATE(visit_date) = DATE('now')) AS today_visits,
    (SELECT COUNT(*) FROM patients WHERE DATE(created_at) = DATE('now')) AS today_patients;
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = setup_conn();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok());
    }

    #[test]
    fn test_column_defaults() {
        let conn = setup_conn();

        conn.execute(
            "INSERT INTO users (username, hashed_password) VALUES ('frontdesk', 'x')",
            [],
        )
        .unwrap();
        let (role, active): (String, i64) = conn
            .query_row(
                "SELECT role, is_active FROM users WHERE username = 'frontdesk'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(role, "staff");
        assert_eq!(active, 1);

        conn.execute(
            "INSERT INTO remedies (name, potency, current_unit_price) VALUES ('Arnica', '30', 50.0)",
            [],
        )
        .unwrap();
        let stock: i64 = conn
            .query_row("SELECT stock_quantity FROM remedies", [], |row| row.get(0))
            .unwrap();
        assert_eq!(stock, 0);

        conn.execute("INSERT INTO patients (name) VALUES ('Rahim')", []).unwrap();
        conn.execute("INSERT INTO visits (patient_id) VALUES (1)", []).unwrap();
        conn.execute("INSERT INTO payments (visit_id, total_bill) VALUES (1, 0)", [])
            .unwrap();
        let (fee, bill, paid, due, status): (f64, f64, f64, f64, String) = conn
            .query_row(
                "SELECT consultation_fee, medicine_bill, amount_paid, due_amount, status FROM payments",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
            )
            .unwrap();
        assert_eq!((fee, bill, paid, due), (0.0, 0.0, 0.0, 0.0));
        assert_eq!(status, "pending");
    }

    #[test]
    fn test_gender_and_potency_checks() {
        let conn = setup_conn();

        let result = conn.execute(
            "INSERT INTO patients (name, gender) VALUES ('A', 'Unknown')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO patients (name, gender) VALUES ('A', 'Third-Gender')",
            [],
        );
        assert!(result.is_ok());

        let result = conn.execute(
            "INSERT INTO remedies (name, potency, current_unit_price) VALUES ('Arnica', '100', 1.0)",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_snapshot_trigger() {
        let conn = setup_conn();
        conn.execute_batch(
            r#"
            INSERT INTO patients (name) VALUES ('Rahim');
            INSERT INTO visits (patient_id) VALUES (1);
            INSERT INTO remedies (name, potency, current_unit_price, stock_quantity)
                VALUES ('Arnica', '30', 50.0, 10);
            INSERT INTO visit_medicines (visit_id, remedy_id, quantity, unit_price_snapshot, line_total)
                VALUES (1, 1, 3, 50.0, 150.0);
            "#,
        )
        .unwrap();

        let result = conn.execute(
            "UPDATE visit_medicines SET unit_price_snapshot = 60.0 WHERE id = 1",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute("UPDATE visit_medicines SET line_total = 1.0 WHERE id = 1", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_one_payment_per_visit() {
        let conn = setup_conn();
        conn.execute_batch(
            r#"
            INSERT INTO patients (name) VALUES ('Rahim');
            INSERT INTO visits (patient_id) VALUES (1);
            INSERT INTO payments (visit_id, total_bill) VALUES (1, 100);
            "#,
        )
        .unwrap();

        let result = conn.execute("INSERT INTO payments (visit_id, total_bill) VALUES (1, 50)", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_views_exist() {
        let conn = setup_conn();
        let views: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='view' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        assert_eq!(
            views,
            vec![
                "view_daily_revenue",
                "view_patient_history",
                "view_today_stats",
                "view_visit_medicine_detail",
            ]
        );
    }
}
