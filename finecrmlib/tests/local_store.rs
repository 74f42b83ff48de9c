mod common;

use common::{date, sample};
use finecrmlib::{
    backend::memory::MemorySnapshot,
    error::FinecrmError,
    notifications::SettingKey,
    registry::{NewDriver, NewVehicle},
    storage::{AppState, LocalStore, SCHEMA_VERSION},
};
use std::fs;
use tempfile::tempdir;

#[test]
fn missing_file_starts_from_seed() {
    let dir = tempdir().expect("tempdir");
    let store = LocalStore::open(dir.path().join("nested")).expect("open");
    let state = store.load();
    assert_eq!(state, AppState::default());
    assert_eq!(state.drivers.list().len(), 2);
    assert_eq!(state.vehicles.list()[0].license_plate, "А123БВ777");
    assert_eq!(state.offline.vehicles.len(), 2);
}

#[test]
fn malformed_or_foreign_version_falls_back() {
    let dir = tempdir().expect("tempdir");
    let store = LocalStore::open(dir.path()).expect("open");

    fs::write(store.path(), "{ not json").expect("write");
    assert_eq!(store.load(), AppState::default());

    fs::write(store.path(), r#"{"schemaVersion": 99, "drivers": []}"#).expect("write");
    let state = store.load();
    assert_eq!(state.schema_version, SCHEMA_VERSION);
    assert_eq!(state.drivers.list().len(), 2);
}

#[test]
fn save_then_load_roundtrip() {
    let dir = tempdir().expect("tempdir");
    let store = LocalStore::open(dir.path()).expect("open");

    let mut state = AppState::default();
    state.settings.set(SettingKey::Sms, false);
    state.inbox.read.insert("discount-1".into());
    state.offline = MemorySnapshot { fines: sample(), ..MemorySnapshot::default() };
    state
        .drivers
        .add(NewDriver {
            name: "Сидоров Сидор".into(),
            license_number: "50 СС 000111".into(),
            birth_date: Some(date(1979, 11, 2)),
            ..NewDriver::default()
        })
        .expect("add driver");
    store.save(&state).expect("save");

    let back = store.load();
    assert_eq!(back, state);
    assert!(!back.settings.sms_notifications);
    assert_eq!(back.offline.fines.len(), 4);
    assert!(!dir.path().join("state.json.tmp").exists());
}

#[test]
fn driver_registry_add_search_remove() {
    let mut state = AppState::default();
    let id = state
        .drivers
        .add(NewDriver { name: "  Сидоров Сидор ".into(), license_number: "50 СС 000111".into(), ..NewDriver::default() })
        .expect("add")
        .id;
    assert_eq!(id, 3);
    assert_eq!(state.drivers.get(3).map(|d| d.name.as_str()), Some("Сидоров Сидор"));
    assert_eq!(state.drivers.search("петр").len(), 1);
    assert_eq!(state.drivers.search("654321").len(), 1);

    let err = state.drivers.add(NewDriver::default()).unwrap_err();
    assert!(matches!(err, FinecrmError::Validation(_)));

    state.drivers.remove(1).expect("remove");
    assert!(state.drivers.get(1).is_none());
    assert!(matches!(state.drivers.remove(1), Err(FinecrmError::NotFound { entity: "driver", .. })));
}

#[test]
fn vehicle_registry_rejects_duplicate_plate() {
    let mut state = AppState::default();
    let v = state
        .vehicles
        .add(NewVehicle {
            license_plate: "е789жз750".into(),
            brand: "Kia".into(),
            model: "Rio".into(),
            year: Some(2021),
            ..NewVehicle::default()
        })
        .expect("add");
    assert_eq!(v.license_plate, "Е789ЖЗ750");
    assert_eq!(v.id, 3);

    let dup = state.vehicles.add(NewVehicle {
        license_plate: "Е789ЖЗ750".into(),
        brand: "Kia".into(),
        model: "Rio".into(),
        ..NewVehicle::default()
    });
    assert!(matches!(dup, Err(FinecrmError::Validation(_))));
    assert_eq!(state.vehicles.search("bmw").len(), 1);
    assert_eq!(state.vehicles.list().len(), 3);
}
