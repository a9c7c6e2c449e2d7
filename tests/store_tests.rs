//! Business-key upserts against the in-memory results database

use pmtm_import::core::Row;
use pmtm_import::format::RankId;
use pmtm_import::model;
use pmtm_import::sql::{
    Application, Compiler, Flag, Machine, Mpi, OperatingSystem, ParameterRow, Processor, Tracked,
};
use pmtm_import::{DbError, ImportError, MemoryStore, Store, Value};
use tempfile::TempDir;

fn machine(vendor: Option<&str>, name: &str) -> Machine {
    Machine::from(&model::Machine {
        vendor: vendor.map(String::from),
        name: name.into(),
    })
}

fn select(store: &mut MemoryStore, sql: &str) -> Vec<Row> {
    let matched = store.execute(sql).unwrap();
    let rows: Vec<Row> = std::iter::from_fn(|| store.fetch_one().unwrap()).collect();
    assert_eq!(rows.len(), matched);
    rows
}

#[test]
fn test_every_dimension_upsert_is_idempotent() {
    let mut store = MemoryStore::new();

    let app = model::Application {
        name: "DL_Poly".into(),
        version: "v2.17.2".into(),
    };
    let compiler = model::Compiler {
        vendor: "Intel".into(),
        name: "Intel".into(),
        version: "12.1".into(),
    };
    let mpi = model::Mpi {
        vendor: "Intel".into(),
        name: "IntelMPI".into(),
        version: "".into(),
    };
    let os = model::Os {
        vendor: "Red_Hat".into(),
        name: "RHEL".into(),
        version: "4.1.2-46".into(),
        kernel: "Linux_2.6.18".into(),
    };
    let processor = model::Processor {
        vendor: "Intel".into(),
        name: "Xeon X5670".into(),
        arch: "x86_64".into(),
        clock: 2930,
        nprocs: 6,
        nthreads: 2,
    };

    for _ in 0..2 {
        let ids = [
            Tracked::new(Application::from(&app)).fetch_or_save(&mut store).unwrap(),
            Tracked::new(Compiler::from(&compiler)).fetch_or_save(&mut store).unwrap(),
            Tracked::new(Mpi::from(&mpi)).fetch_or_save(&mut store).unwrap(),
            Tracked::new(OperatingSystem::from(&os)).fetch_or_save(&mut store).unwrap(),
            Tracked::new(Processor(processor.clone())).fetch_or_save(&mut store).unwrap(),
            Tracked::new(machine(None, "WILLOW")).fetch_or_save(&mut store).unwrap(),
            Tracked::new(Flag("-O3".into())).fetch_or_save(&mut store).unwrap(),
        ];
        assert!(ids.iter().all(|&id| id == 1));
    }

    for table in [
        "Application",
        "Compiler",
        "MPI",
        "OperatingSystem",
        "Processor",
        "Machine",
        "Flags",
    ] {
        assert_eq!(store.row_count(table).unwrap(), 1, "{}", table);
    }
}

#[test]
fn test_machine_without_vendor_is_distinct() {
    let mut store = MemoryStore::new();
    let bare = Tracked::new(machine(None, "WILLOW")).fetch_or_save(&mut store).unwrap();
    let bull = Tracked::new(machine(Some("Bull"), "WILLOW")).fetch_or_save(&mut store).unwrap();
    let again = Tracked::new(machine(None, "WILLOW")).fetch_or_save(&mut store).unwrap();

    assert_ne!(bare, bull);
    assert_eq!(bare, again);
    assert_eq!(
        select(&mut store, "SELECT Name, Vendor FROM Machine WHERE Vendor IS NULL"),
        vec![vec![Value::Text("WILLOW".into()), Value::Null]]
    );
}

#[test]
fn test_application_build_is_not_part_of_key() {
    let mut store = MemoryStore::new();
    let first = Tracked::new(Application::from(&model::Application {
        name: "Chimaera".into(),
        version: "v1.6.1".into(),
    }))
    .fetch_or_save(&mut store)
    .unwrap();
    let patched = Tracked::new(Application::from(&model::Application {
        name: "Chimaera".into(),
        version: "v1.6.2".into(),
    }))
    .fetch_or_save(&mut store)
    .unwrap();

    assert_eq!(first, patched);
    assert_eq!(store.row_count("Application").unwrap(), 1);
}

#[test]
fn test_parameters_are_never_deduplicated() {
    let mut store = MemoryStore::new();
    let parameter = model::Parameter {
        rank: RankId::parse("3.1").unwrap(),
        name: "eps".into(),
        value: model::ParamValue::classify("1.0e-06"),
    };
    for _ in 0..3 {
        Tracked::new(ParameterRow::new(1, &parameter))
            .save(&mut store, false)
            .unwrap();
    }

    let rows = select(
        &mut store,
        "SELECT Type, DoubleValue, Rank, ThreadID FROM Parameter WHERE Name='eps'",
    );
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0],
        vec![
            Value::Text("Double".into()),
            Value::Float(1.0e-6),
            Value::Integer(3),
            Value::Integer(1),
        ]
    );
}

#[test]
fn test_duplicate_dimension_insert_is_a_constraint_error() {
    let mut store = MemoryStore::new();
    Tracked::new(Flag("-O3".into())).save(&mut store, true).unwrap();
    assert!(matches!(
        Tracked::new(Flag("-O3".into())).save(&mut store, true),
        Err(ImportError::Store(DbError::ConstraintViolation(_)))
    ));
}

#[test]
fn test_non_finite_values_are_rejected() {
    let store = MemoryStore::new();
    assert!(matches!(
        store.literal(&Value::Float(f64::INFINITY)),
        Err(DbError::UnsupportedValue(_))
    ));
    assert_eq!(store.literal(&Value::Text("it's".into())).unwrap(), "'it''s'");
    assert_eq!(store.literal(&Value::Boolean(false)).unwrap(), "FALSE");
    assert_eq!(store.literal(&Value::Null).unwrap(), "NULL");
}

#[test]
fn test_committed_rows_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.db");

    {
        let mut store = MemoryStore::open(&path).unwrap();
        Tracked::new(Flag("-xHOST".into())).fetch_or_save(&mut store).unwrap();
        store.commit().unwrap();
        Tracked::new(Flag("-g".into())).fetch_or_save(&mut store).unwrap();
        store.rollback().unwrap();
    }

    let mut store = MemoryStore::open(&path).unwrap();
    assert_eq!(store.row_count("Flags").unwrap(), 1);
    assert_eq!(
        Tracked::new(Flag("-xHOST".into())).fetch(&mut store).unwrap(),
        Some(1)
    );
    assert_eq!(Tracked::new(Flag("-g".into())).fetch(&mut store).unwrap(), None);
}

#[test]
fn test_unsupported_statements() {
    let mut store = MemoryStore::new();
    assert!(matches!(
        store.execute("DELETE FROM Flags"),
        Err(DbError::UnsupportedOperation(_))
    ));
    assert!(matches!(
        store.execute("SELECT ID FROM Flags; SELECT ID FROM Run"),
        Err(DbError::UnsupportedOperation(_)) | Err(DbError::ParseError(_))
    ));
}
