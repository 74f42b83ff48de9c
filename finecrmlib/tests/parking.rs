mod common;

use common::at;
use finecrmlib::{
    backend::memory::MemoryStore,
    error::FinecrmError,
    model::{ParkingPass, ParkingZone},
    parking::{active_passes, default_pass_number, NewPass, PassStatus},
    traits::PassStore,
};

fn request(until: Option<chrono::NaiveDateTime>) -> NewPass {
    NewPass {
        license_plate: "А123БВ777".into(),
        driver_name: "Иванов Иван Иванович".into(),
        driver_phone: "+7 (999) 123-45-67".into(),
        valid_until: until,
        zone: ParkingZone::Center,
        notes: String::new(),
    }
}

#[test]
fn status_flips_exactly_at_valid_until() {
    let until = at(2024, 6, 1, 12);
    assert_eq!(PassStatus::at(until, at(2024, 6, 1, 11)), PassStatus::Active);
    assert_eq!(PassStatus::at(until, until), PassStatus::Expired);
    assert_eq!(PassStatus::at(until, at(2024, 6, 2, 0)), PassStatus::Expired);
    assert_eq!(PassStatus::Active.to_string(), "Активен");
    assert_eq!(PassStatus::Expired.to_string(), "Истек");
}

#[test]
fn issue_requires_plate_driver_and_date() {
    let err = NewPass::default().validate().unwrap_err();
    match err {
        FinecrmError::Validation(msg) => {
            assert!(msg.contains("госномер"));
            assert!(msg.contains("водитель"));
            assert!(msg.contains("срок действия"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(request(None).validate().is_err());
    assert_eq!(request(Some(at(2024, 6, 1, 12))).validate().expect("valid"), at(2024, 6, 1, 12));
}

#[test]
fn issue_list_and_remove_in_memory() {
    let store = MemoryStore::with_fines(Vec::new());
    let issued = store.issue_pass(&request(Some(at(2099, 1, 1, 0)))).expect("issue");
    assert!(issued.pass_number.starts_with("PP"));

    let passes = store.list_passes().expect("list");
    assert_eq!(passes.len(), 1);
    assert_eq!(passes[0].zone, ParkingZone::Center);
    assert_eq!(passes[0].license_plate, "А123БВ777");

    let id = issued.id.expect("id");
    store.remove_pass(id).expect("remove");
    assert!(store.list_passes().expect("list").is_empty());
    assert!(matches!(store.remove_pass(id), Err(FinecrmError::NotFound { .. })));
}

#[test]
fn active_passes_filters_by_now() {
    let now = at(2024, 6, 1, 12);
    let mk = |id: i64, until| {
        request(Some(until)).into_pass(id, format!("PP{id}"), at(2024, 1, 1, 0)).expect("pass")
    };
    let passes: Vec<ParkingPass> = vec![mk(1, at(2024, 6, 1, 12)), mk(2, at(2024, 7, 1, 0)), mk(3, at(2024, 5, 1, 0))];
    let active: Vec<i64> = active_passes(&passes, now).iter().map(|p| p.id).collect();
    assert_eq!(active, vec![2]);
}

#[test]
fn pass_number_and_zone_names() {
    assert_eq!(default_pass_number(at(2024, 3, 5, 9)), "PP20240305090000");
    assert_eq!("mkad".parse::<ParkingZone>().expect("zone"), ParkingZone::Mkad);
    assert_eq!("Парки".parse::<ParkingZone>().expect("zone"), ParkingZone::Parks);
    assert_eq!(ParkingZone::default().as_str(), "Все зоны");
    assert!("луна".parse::<ParkingZone>().is_err());
}

#[test]
fn pass_wire_shape() {
    let json = r#"{"id":7,"passNumber":"PP1","licensePlate":"А123БВ777","driverName":"Иванов","driverPhone":null,
        "validUntil":"2024-06-01T12:00:00","parkingZones":"МКАД","issuedBy":"admin","notes":null}"#;
    let pass: ParkingPass = serde_json::from_str(json).expect("parse pass");
    assert_eq!(pass.zone, ParkingZone::Mkad);
    assert_eq!(pass.valid_until, at(2024, 6, 1, 12));
    assert_eq!(pass.driver_phone, "");

    let body = serde_json::to_value(request(Some(at(2024, 6, 1, 12)))).expect("serialize");
    assert_eq!(body["parkingZones"], "Центр");
    assert_eq!(body["validUntil"], "2024-06-01T12:00:00");
    assert_eq!(body["licensePlate"], "А123БВ777");
}
