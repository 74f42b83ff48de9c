mod common;

use common::{at, date};
use finecrmlib::{
    model::{DeletedFine, FineStatus, FineUpdate, NewFine, ParkingZone, PlateLookup, VinLookup},
    wire::{self, ErrorBody, FinesEnvelope, HistoryEnvelope, PassesEnvelope, PlateBody},
};
use rust_decimal::Decimal;

const FINES: &str = r#"{
  "fines": [
    {"id": 1, "violationNumber": "18810077240001", "driverName": "Иванов Иван Иванович",
     "licensePlate": "А123БВ777", "violationType": "Превышение скорости",
     "violationDate": "2024-01-15", "amount": 500, "discountAmount": 250.0,
     "status": "Не оплачен", "location": "МКАД 45 км", "description": null,
     "paymentDeadline": "2024-03-15T00:00:00", "createdAt": "2024-01-15T10:30:00.123456"},
    {"id": 2, "violationNumber": "18810077240002", "driverName": "Петров Петр Петрович",
     "licensePlate": "В456ГД199", "violationType": "Парковка",
     "violationDate": "2024-01-16T00:00:00", "amount": 3000.5,
     "status": "Неоплачен", "location": "ул. Арбат"},
    {"id": 3, "violationNumber": "18810077240003", "driverName": "Сидоров", "licensePlate": "К001ММ777",
     "violationType": "Парковка", "violationDate": "2024-01-17", "amount": 1000,
     "status": "Оплачен", "paymentDate": "2024-01-20T08:15:00Z"}
  ]
}"#;

#[test]
fn fines_envelope_normalizes_status_and_dates() {
    let env: FinesEnvelope = serde_json::from_str(FINES).expect("parse fines");
    assert_eq!(env.fines.len(), 3);

    let a = &env.fines[0];
    assert_eq!(a.status, FineStatus::Unpaid);
    assert_eq!(a.description, "");
    assert_eq!(a.amount, Decimal::from(500));
    assert_eq!(a.discount_amount, Some(Decimal::from(250)));
    assert_eq!(a.payment_deadline, Some(date(2024, 3, 15)));
    assert!(a.created_at.is_some());

    let b = &env.fines[1];
    assert_eq!(b.status, FineStatus::Unpaid);
    assert_eq!(b.violation_date, date(2024, 1, 16));
    assert_eq!(b.amount, Decimal::new(30005, 1));

    assert_eq!(env.fines[2].payment_date, Some(at(2024, 1, 20, 8) + chrono::Duration::minutes(15)));
}

#[test]
fn malformed_rows_are_skipped() {
    let body = r#"{"fines":[
        {"id":1,"violationNumber":"18810077240001","violationDate":"2024-01-15","amount":500,"status":"Не оплачен"},
        {"id":2,"violationNumber":"18810077240002","violationDate":null,"amount":700,"status":"Не оплачен"},
        {"id":3,"violationNumber":"18810077240003","violationDate":"2024-01-17","amount":1,"status":"Архив"},
        {"id":4,"violationNumber":"18810077240004","violationDate":"2024-01-18","amount":900,"status":"Оплачен"}
    ]}"#;
    let env: FinesEnvelope = serde_json::from_str(body).expect("parse fines");
    let ids: Vec<i64> = env.fines.iter().map(|f| f.id).collect();
    assert_eq!(ids, vec![1, 4]);

    let err = "Архив".parse::<FineStatus>().unwrap_err();
    assert!(err.to_string().contains("unknown fine status"));

    // без списка конверт не принимается
    assert!(serde_json::from_str::<FinesEnvelope>("{}").is_err());
}

#[test]
fn pass_with_null_zone_gets_default_zone() {
    let body = r#"{"passes":[
        {"id":1,"passNumber":"PP-2024-0001","licensePlate":"А123БВ777","driverName":"Иванов",
         "driverPhone":null,"validUntil":"2024-12-31T23:59:00","parkingZones":null,"notes":null},
        {"id":2,"passNumber":"PP-2024-0002","licensePlate":"В456ГД199","driverName":"Петров",
         "validUntil":null,"parkingZones":"Центр"},
        {"id":3,"passNumber":"PP-2024-0003","licensePlate":"Е789ЖЗ750","driverName":"Сидорова",
         "validUntil":"2024-06-30T00:00:00","parkingZones":"Центр"}
    ]}"#;
    let env: PassesEnvelope = serde_json::from_str(body).expect("parse passes");
    assert_eq!(env.passes.len(), 2);
    assert_eq!(env.passes[0].zone, ParkingZone::All);
    assert_eq!(env.passes[0].driver_phone, "");
    assert_eq!(env.passes[1].id, 3);
    assert_eq!(env.passes[1].zone, ParkingZone::Center);
}

#[test]
fn status_strings_roundtrip() {
    for s in FineStatus::ALL {
        assert_eq!(s.as_str().parse::<FineStatus>().expect("parse"), s);
    }
    assert_eq!(serde_json::to_string(&FineStatus::Deleted).expect("json"), r#""Удален""#);
}

#[test]
fn history_entry_keeps_audit_fields() {
    let body = r#"{"history":[{"id":10,"fineId":3,"violationNumber":"18810077240003","driverName":"Сидоров",
        "licensePlate":"К001ММ777","violationType":"Парковка","violationDate":"2024-01-17","amount":1000,
        "status":"Удален","deletedBy":"admin","deletedAt":"2024-02-01T09:00:00","reason":"Удалено через систему"}]}"#;
    let env: HistoryEnvelope = serde_json::from_str(body).expect("parse history");
    let h: &DeletedFine = &env.history[0];
    assert_eq!(h.fine.id, 10);
    assert_eq!(h.fine_id, Some(3));
    assert_eq!(h.fine.status, FineStatus::Deleted);
    assert_eq!(h.deleted_at, at(2024, 2, 1, 9));
    assert_eq!(h.reason.as_deref(), Some("Удалено через систему"));

    let empty: HistoryEnvelope = serde_json::from_str("{}").expect("parse empty");
    assert!(empty.history.is_empty());
}

#[test]
fn outgoing_bodies_are_camel_case() {
    let req = NewFine {
        violation_number: "18810077240004".into(),
        driver_name: "Иванов Иван Иванович".into(),
        license_plate: "А123БВ777".into(),
        violation_type: "Парковка".into(),
        violation_date: Some(date(2024, 2, 1)),
        amount: Some(Decimal::from(3000)),
        article_code: Some("12.16".into()),
        ..NewFine::default()
    }
    .into_request()
    .expect("valid");
    let v = serde_json::to_value(&req).expect("serialize");
    assert_eq!(v["violationNumber"], "18810077240004");
    assert_eq!(v["violationDate"], "2024-02-01");
    assert_eq!(v["paymentDeadline"], "2024-04-01");
    assert_eq!(v["discountAmount"], 1500.0);
    assert_eq!(v["status"], "Не оплачен");
    assert_eq!(v["articleCode"], "12.16");
    assert!(v.get("driverId").is_none());

    let paid = serde_json::to_value(FineUpdate::paid(at(2024, 2, 5, 14))).expect("serialize");
    assert_eq!(paid, serde_json::json!({"status": "Оплачен", "paymentDate": "2024-02-05T14:00:00"}));
}

#[test]
fn negative_amount_and_excess_discount_rejected() {
    let base = NewFine {
        violation_number: "1".into(),
        driver_name: "Иванов".into(),
        license_plate: "А1".into(),
        violation_date: Some(date(2024, 2, 1)),
        ..NewFine::default()
    };
    let neg = NewFine { amount: Some(Decimal::from(-1)), ..base.clone() };
    assert!(neg.into_request().is_err());
    let excess = NewFine { amount: Some(Decimal::from(100)), discount_amount: Some(Decimal::from(200)), ..base };
    assert!(excess.into_request().is_err());
}

#[test]
fn vin_lookup_found_and_not_found() {
    let found = serde_json::json!({
        "found": true, "vinCode": "XTA21703050123456", "licensePlate": "А123ВВ777",
        "brand": "LADA", "model": "Vesta", "year": 2023, "color": "Синий",
        "ownerName": "Петров Петр Петрович", "insuranceValidUntil": "2025-03-15"
    });
    match wire::vin_lookup_from_json(found).expect("lookup") {
        VinLookup::Found(v) => {
            assert_eq!(v.brand, "LADA");
            assert_eq!(v.year, Some(2023));
            assert_eq!(v.insurance_valid_until, Some(date(2025, 3, 15)));
        }
        VinLookup::NotFound => panic!("expected a vehicle"),
    }
    let missing = serde_json::json!({"found": false, "message": "Автомобиль не найден"});
    assert_eq!(wire::vin_lookup_from_json(missing).expect("lookup"), VinLookup::NotFound);
}

#[test]
fn plate_lookup_reads_snake_case() {
    let body = r#"{"found": true, "id": 5, "license_plate": "А123БВ777", "brand": "Toyota", "model": "Camry",
        "year": 2020, "color": "Черный", "vin": "Z8T4DNFVC8S123789",
        "owner": {"id": 1, "name": "Иванов Иван Иванович", "license_number": "77 АА 123456", "phone": null},
        "fines": {"count": 3, "unpaid_amount": 2500.0}}"#;
    let parsed: PlateBody = serde_json::from_str(body).expect("parse plate");
    match parsed.into_lookup().expect("lookup") {
        PlateLookup::Found(v) => {
            assert_eq!(v.license_plate, "А123БВ777");
            assert_eq!(v.fines.count, 3);
            assert_eq!(v.fines.unpaid_amount, Decimal::from(2500));
            let owner = v.owner.expect("owner");
            assert_eq!(owner.license_number.as_deref(), Some("77 АА 123456"));
            assert_eq!(owner.phone, None);
        }
        PlateLookup::NotFound => panic!("expected a vehicle"),
    }

    let none: PlateBody = serde_json::from_str(r#"{"found": false}"#).expect("parse");
    assert_eq!(none.into_lookup().expect("lookup"), PlateLookup::NotFound);
}

#[test]
fn error_body_message() {
    let body: ErrorBody = serde_json::from_str(r#"{"error":"Fine not found"}"#).expect("parse");
    assert_eq!(body.into_message("fallback"), "Fine not found");
    assert_eq!(ErrorBody::default().into_message("Bad Gateway"), "Bad Gateway");
}
