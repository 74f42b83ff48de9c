//! HTTP-клиент против локального сервера с заготовленными ответами.

use finecrmlib::{
    backend::{http::HttpBackend, VehicleKey},
    config::{Config, DeletePolicy},
    error::FinecrmError,
    model::{DeletionAudit, FineStatus, ParkingZone, PlateLookup, VinLookup},
    traits::{FineStore, PassStore, VehicleLookup},
};
use rust_decimal::Decimal;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug)]
struct Recorded {
    method: String,
    target: String,
    body: String,
}

impl Recorded {
    fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is json")
    }
}

/// Отвечает по очереди заготовленными ответами, по одному на соединение,
/// и возвращает то, что пришло.
fn serve(responses: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<Recorded>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
    let base = format!("http://{}", listener.local_addr().expect("local addr"));
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

            let mut line = String::new();
            reader.read_line(&mut line).expect("request line");
            let mut parts = line.split_whitespace();
            let method = parts.next().unwrap_or_default().to_string();
            let target = parts.next().unwrap_or_default().to_string();

            let mut content_length = 0;
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).expect("header");
                let header = header.trim_end();
                if header.is_empty() {
                    break;
                }
                if let Some((name, value)) = header.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().expect("content length");
                    }
                }
            }
            let mut raw = vec![0; content_length];
            reader.read_exact(&mut raw).expect("body");
            seen.push(Recorded { method, target, body: String::from_utf8(raw).expect("utf8 body") });

            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .expect("write response");
        }
        seen
    });
    (base, handle)
}

fn backend(base: &str, policy: DeletePolicy) -> HttpBackend {
    let cfg = Config {
        fines_url: format!("{base}/fines"),
        extended_url: format!("{base}/extended"),
        vehicle_check_url: Some(format!("{base}/check")),
        gibdd_url: format!("{base}/gibdd"),
        timeout: Duration::from_secs(5),
        delete_policy: policy,
        ..Config::default()
    };
    let client = reqwest::blocking::Client::builder()
        .no_proxy()
        .timeout(cfg.timeout)
        .build()
        .expect("client");
    HttpBackend::with_client(&cfg, client).expect("backend")
}

const FINES: &str = r#"{"fines":[
    {"id":1,"violationNumber":"18810077240001","driverName":"Иванов Иван Иванович","licensePlate":"А123БВ777",
     "violationType":"Превышение скорости","violationDate":"2024-01-15","amount":500,"status":"Не оплачен"},
    {"id":2,"violationNumber":"18810077240002","driverName":"Петров","licensePlate":"В456ГД199",
     "violationType":"Парковка","violationDate":null,"amount":3000,"status":"Не оплачен"}
]}"#;

#[test]
fn list_fines_skips_bad_rows() {
    let (base, server) = serve(vec![(200, FINES)]);
    let fines = backend(&base, DeletePolicy::Hard).list_fines().expect("list fines");
    assert_eq!(fines.len(), 1);
    assert_eq!(fines[0].status, FineStatus::Unpaid);
    assert_eq!(fines[0].amount, Decimal::from(500));

    let seen = server.join().expect("server");
    assert_eq!(seen[0].method, "GET");
    assert_eq!(seen[0].target, "/fines");
}

#[test]
fn delete_verb_follows_policy() {
    let ok = r#"{"success":true}"#;
    let (base, server) = serve(vec![(200, ok), (200, ok)]);
    let audit = DeletionAudit { deleted_by: "operator".into(), reason: Some("дубликат".into()) };
    backend(&base, DeletePolicy::Hard).delete_fine(3, &audit).expect("hard delete");
    backend(&base, DeletePolicy::Soft).delete_fine(4, &audit).expect("soft delete");

    let seen = server.join().expect("server");
    assert_eq!((seen[0].method.as_str(), seen[0].target.as_str()), ("DELETE", "/fines?id=3"));
    assert!(seen[0].body.is_empty());

    assert_eq!((seen[1].method.as_str(), seen[1].target.as_str()), ("PUT", "/fines?id=4"));
    let body = seen[1].json();
    assert_eq!(body["status"], "Удален");
    assert_eq!(body["deletedBy"], "operator");
    assert_eq!(body["reason"], "дубликат");
}

#[test]
fn non_success_status_becomes_remote_error() {
    let (base, server) = serve(vec![
        (405, r#"{"error":"Метод не поддерживается"}"#),
        (500, "Internal failure"),
    ]);
    let api = backend(&base, DeletePolicy::Soft);
    match api.delete_fine(1, &DeletionAudit::default()).unwrap_err() {
        FinecrmError::Remote { status, message } => {
            assert_eq!(status, 405);
            assert_eq!(message, "Метод не поддерживается");
        }
        other => panic!("unexpected error: {other}"),
    }
    match api.list_fines().unwrap_err() {
        FinecrmError::Remote { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("unexpected error: {other}"),
    }
    server.join().expect("server");
}

#[test]
fn extended_actions() {
    let history = r#"{"history":[{"id":10,"fineId":3,"violationNumber":"18810077240003","driverName":"Сидоров",
        "licensePlate":"К001ММ777","violationType":"Парковка","violationDate":"2024-01-17","amount":1000,
        "status":"Удален","deletedBy":"admin","deletedAt":"2024-02-01T09:00:00"}]}"#;
    let passes = r#"{"passes":[{"id":1,"passNumber":"PP-2024-0001","licensePlate":"А123БВ777",
        "driverName":"Иванов","validUntil":"2024-12-31T23:59:00","parkingZones":null}]}"#;
    let vin = r#"{"found":true,"vinCode":"XTA21703050123456","licensePlate":"А123ВВ777","brand":"LADA","model":"Vesta"}"#;
    let (base, server) = serve(vec![(200, history), (200, passes), (200, vin), (200, r#"{"success":true}"#)]);
    let api = backend(&base, DeletePolicy::Hard);

    let h = api.deletion_history().expect("history");
    assert_eq!(h[0].fine_id, Some(3));
    let p = api.list_passes().expect("passes");
    assert_eq!(p[0].zone, ParkingZone::All);
    match api.lookup_vin(" xta21703050123456").expect("vin") {
        VinLookup::Found(v) => assert_eq!(v.brand, "LADA"),
        VinLookup::NotFound => panic!("expected a vehicle"),
    }
    api.remove_pass(7).expect("remove pass");

    let seen = server.join().expect("server");
    let calls: Vec<(&str, &str)> = seen.iter().map(|r| (r.method.as_str(), r.target.as_str())).collect();
    assert_eq!(
        calls,
        vec![
            ("GET", "/extended?action=history"),
            ("GET", "/extended?action=parking"),
            ("POST", "/extended?action=vin"),
            ("DELETE", "/extended?action=parking&id=7"),
        ]
    );
    assert_eq!(seen[2].json()["vinCode"], "XTA21703050123456");
}

#[test]
fn vehicle_check_by_vin_and_gibdd() {
    let plate = r#"{"found":true,"license_plate":"А123ВВ777","brand":"LADA","model":"Vesta",
        "vin":"XTA21703050123456","fines":{"count":2,"unpaid_amount":1500}}"#;
    let gibdd = r#"{"success":true,"licenseNumber":"77АА123456","stsNumber":"7700654321","foundFines":0,
        "totalAmount":0,"totalWithDiscount":0,"fines":[],"checkedAt":"2024-03-10T12:00:00",
        "source":"ГИБДД API (тестовый режим)"}"#;
    let (base, server) = serve(vec![(200, plate), (200, gibdd)]);
    let api = backend(&base, DeletePolicy::Hard);

    match api.lookup_registration(&VehicleKey::Vin("xta21703050123456".into())).expect("lookup") {
        PlateLookup::Found(v) => assert_eq!(v.fines.count, 2),
        PlateLookup::NotFound => panic!("expected a vehicle"),
    }
    let check = api.gibdd_check("77АА123456", "7700654321").expect("gibdd");
    assert_eq!(check.found_fines, 0);
    assert!(!check.has_discount());

    // пустой номер не доходит до сервера
    assert!(matches!(api.gibdd_check("77АА123456", ""), Err(FinecrmError::Validation(_))));

    let seen = server.join().expect("server");
    assert_eq!(seen.len(), 2);
    assert_eq!((seen[0].method.as_str(), seen[0].target.as_str()), ("GET", "/check?vin=XTA21703050123456"));
    assert_eq!((seen[1].method.as_str(), seen[1].target.as_str()), ("POST", "/gibdd"));
    assert_eq!(
        seen[1].json(),
        serde_json::json!({"licenseNumber": "77АА123456", "stsNumber": "7700654321"})
    );
}

#[test]
fn plate_lookup_needs_vehicle_check_url() {
    let cfg = Config { vehicle_check_url: None, ..Config::default() };
    let api = HttpBackend::new(&cfg).expect("backend");
    assert!(matches!(api.lookup_plate("А123ВВ777"), Err(FinecrmError::Validation(_))));
}

#[test]
fn default_config_deletes_with_delete_verb() {
    assert_eq!(Config::default().delete_policy, DeletePolicy::Hard);
    assert_eq!("SOFT".parse::<DeletePolicy>().expect("policy"), DeletePolicy::Soft);

    let (base, server) = serve(vec![(200, r#"{"success":true,"message":"Штраф удален"}"#)]);
    let api = backend(&base, Config::default().delete_policy);
    api.delete_fine(12, &DeletionAudit::default()).expect("delete");

    let seen = server.join().expect("server");
    assert_eq!((seen[0].method.as_str(), seen[0].target.as_str()), ("DELETE", "/fines?id=12"));
}
