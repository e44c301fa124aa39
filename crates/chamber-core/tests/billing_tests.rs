//! Billing workflow and facade integration tests against file-backed stores.

use std::io::Write;

use chamber_core::billing::{
    Billing, BillingError, DispenseRequest, PaymentAdjustment, VisitRequest,
};
use chamber_core::config::StoreConfig;
use chamber_core::db::Database;
use chamber_core::models::{Patient, PaymentStatus, Potency, Remedy};
use chamber_core::{open_database, ChamberError, FfiDispenseItem, FfiVisitRequest};
use tempfile::{NamedTempFile, TempDir};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_config(dir: &TempDir) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
database_path = "{}"
busy_timeout_ms = 1000

[[seed_users]]
username = "admin"
password = "admin123"
full_name = "Administrator"
role = "admin"

[[seed_users]]
username = "doctor"
password = "doctor123"
role = "doctor"
"#,
        dir.path().join("clinic.db").display()
    )
    .unwrap();
    file
}

fn stocked_remedy(db: &Database, name: &str, price: f64, stock: i64) -> i64 {
    let mut remedy = Remedy::new(name.into(), Potency::C30, price);
    remedy.stock_quantity = stock;
    db.insert_remedy(&remedy).unwrap()
}

#[test]
fn test_config_opens_and_seeds_store() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let file = write_config(&dir);

    let config = StoreConfig::load(Some(file.path())).unwrap();
    let db = Database::open_with_config(&config).unwrap();

    let admin = db.get_user_by_username("admin").unwrap().unwrap();
    assert!(admin.verify_password("admin123"));
    assert!(admin.can_edit_billing());

    let doctor = db.get_user_by_username("doctor").unwrap().unwrap();
    assert!(doctor.can_manage_inventory());
    assert!(!doctor.can_edit_billing());

    drop(db);

    // Reopening seeds again without duplicating accounts
    let db = Database::open_with_config(&config).unwrap();
    assert_eq!(db.list_users().unwrap().len(), 2);
}

#[test]
fn test_sample_config_parses() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../chamber.toml");
    let config = StoreConfig::load(Some(&path)).unwrap();

    let names: Vec<_> = config.seed_users.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["admin", "doctor", "staff"]);
    assert_eq!(config.busy_timeout_ms, 5000);
}

#[test]
fn test_visit_lifecycle_persists_across_reopen() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clinic.db");

    let visit_id = {
        let db = Database::open(&path).unwrap();
        let patient_id = db.insert_patient(&Patient::new("Rahim".into())).unwrap();
        let arnica = stocked_remedy(&db, "Arnica Montana", 50.0, 10);
        let nux = stocked_remedy(&db, "Nux Vomica", 30.0, 5);

        let receipt = Billing::new(&db)
            .record_visit(&VisitRequest {
                patient_id,
                chief_complaint: Some("Bruising".into()),
                consultation_fee: 200.0,
                amount_paid: 100.0,
                medicines: vec![
                    DispenseRequest { remedy_id: arnica, quantity: 3 },
                    DispenseRequest { remedy_id: nux, quantity: 1 },
                ],
                ..Default::default()
            })
            .unwrap();

        assert_eq!(receipt.medicine_bill, 180.0);
        assert_eq!(receipt.total_bill, 380.0);
        assert_eq!(receipt.due_amount, 280.0);
        assert_eq!(receipt.status, PaymentStatus::PartiallyPaid.as_str());
        receipt.visit_id
    };

    let db = Database::open(&path).unwrap();
    let lines = db.visit_medicine_details_for_visit(visit_id).unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(db.medicine_bill_for_visit(visit_id).unwrap(), 180.0);

    let payment = Billing::new(&db)
        .settle_payment(
            visit_id,
            &PaymentAdjustment {
                amount_paid: Some(380.0),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(payment.due_amount, 0.0);
    assert_eq!(payment.status, "paid");

    let history = db.patient_history(Some(10)).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].payment_status.as_deref(), Some("paid"));
}

#[test]
fn test_failed_visit_leaves_no_trace() {
    init_logging();
    let db = Database::open_in_memory().unwrap();
    let patient_id = db.insert_patient(&Patient::new("Rahim".into())).unwrap();
    let arnica = stocked_remedy(&db, "Arnica Montana", 50.0, 10);
    let sulphur = stocked_remedy(&db, "Sulphur", 20.0, 1);

    let err = Billing::new(&db)
        .record_visit(&VisitRequest {
            patient_id,
            consultation_fee: 200.0,
            medicines: vec![
                DispenseRequest { remedy_id: arnica, quantity: 2 },
                DispenseRequest { remedy_id: sulphur, quantity: 3 },
            ],
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, BillingError::InsufficientStock { available: 1, .. }));

    assert!(db.patient_history(None).unwrap().is_empty());
    assert!(db.visit_medicine_details().unwrap().is_empty());
    assert!(db.daily_revenue().unwrap().is_empty());
    assert_eq!(db.get_remedy(arnica).unwrap().unwrap().stock_quantity, 10);
}

#[test]
fn test_facade_round_trip() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let core = open_database(dir.path().join("clinic.db").display().to_string()).unwrap();

    let patient = core
        .create_patient(
            "Salma".into(),
            Some("  ".into()),
            Some("01700000000".into()),
            Some(34),
            Some("Female".into()),
            None,
            None,
        )
        .unwrap();
    let patient_id = patient.id.unwrap();
    assert_eq!(patient.gender.as_deref(), Some("Female"));
    // Blank identifiers are stored as missing
    assert_eq!(patient.nid, None);

    let err = core
        .create_patient("Bad".into(), None, None, None, Some("Unknown".into()), None, None)
        .unwrap_err();
    assert!(matches!(err, ChamberError::ConstraintViolation(_)));

    let err = core
        .add_remedy("Sulphur".into(), "100".into(), None, 10.0, 5)
        .unwrap_err();
    assert!(matches!(err, ChamberError::ConstraintViolation(_)));

    let remedy = core
        .add_remedy("Belladonna".into(), "200".into(), None, 40.0, 5)
        .unwrap();
    assert_eq!(remedy.potency, "200");

    let matches = core.find_remedies("belladona".into(), 5).unwrap();
    assert_eq!(matches[0].remedy.id, remedy.id);

    let receipt = core
        .record_visit(FfiVisitRequest {
            patient_id,
            recorded_by: None,
            chief_complaint: Some("Fever".into()),
            diagnosis: None,
            notes: None,
            consultation_fee: 100.0,
            amount_paid: 0.0,
            medicines: vec![FfiDispenseItem {
                remedy_id: remedy.id.unwrap(),
                quantity: 2,
            }],
        })
        .unwrap();
    assert_eq!(receipt.total_bill, 180.0);
    assert_eq!(receipt.status, "pending");

    let err = core
        .record_visit(FfiVisitRequest {
            patient_id,
            recorded_by: None,
            chief_complaint: None,
            diagnosis: None,
            notes: None,
            consultation_fee: 100.0,
            amount_paid: 0.0,
            medicines: vec![FfiDispenseItem {
                remedy_id: remedy.id.unwrap(),
                quantity: 4,
            }],
        })
        .unwrap_err();
    assert!(matches!(err, ChamberError::InvalidInput(_)));

    let settled = core
        .settle_payment(receipt.visit_id, None, None, Some(50.0))
        .unwrap();
    assert_eq!(settled.due_amount, 130.0);
    assert_eq!(settled.status, "partially paid");

    let history = core.patient_history(Some(patient_id), None).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].amount_paid, Some(50.0));
    assert!(core.patient_history(Some(patient_id), Some(0)).unwrap().is_empty());

    let revenue = core.daily_revenue().unwrap();
    assert_eq!(revenue.len(), 1);
    assert_eq!(revenue[0].total_bill_sum, 180.0);

    let stats = core.today_stats().unwrap();
    assert_eq!(stats.today_visits, 1);
    assert_eq!(stats.today_patients, 1);

    assert_eq!(core.list_remedies().unwrap()[0].stock_quantity, 3);
    assert!(matches!(
        core.settle_payment(9999, None, None, None).unwrap_err(),
        ChamberError::NotFound(_)
    ));
}
