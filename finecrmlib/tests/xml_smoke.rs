mod common;

use common::{at, sample};
use finecrmlib::{
    formats::xml::Xml,
    model::FineStatus,
    traits::{ReadFormat, WriteFormat},
};
use rust_decimal::Decimal;
use std::io::Cursor;

#[test]
fn xml_roundtrip() {
    let mut fines = sample();
    fines[1].payment_date = Some(at(2024, 1, 20, 8));
    fines[2].amount = Decimal::new(150050, 2);

    let mut out = Vec::new();
    Xml::write(&mut out, &fines).expect("write xml");
    let text = String::from_utf8(out.clone()).expect("utf8");
    assert!(text.starts_with("<fines>"));
    assert!(text.contains("<status>Не оплачен</status>"));

    let back = Xml::read(Cursor::new(out)).expect("read xml");
    assert_eq!(back.len(), 4);
    assert_eq!(back[0].driver_name, "Иванов Иван Иванович");
    assert_eq!(back[1].status, FineStatus::Paid);
    assert_eq!(back[1].payment_date, Some(at(2024, 1, 20, 8)));
    assert_eq!(back[2].amount, Decimal::new(150050, 2));
    assert_eq!(back[3].status, FineStatus::Deleted);
}

#[test]
fn xml_empty_list() {
    let mut out = Vec::new();
    Xml::write(&mut out, &[]).expect("write xml");
    let back = Xml::read(Cursor::new(out)).expect("read xml");
    assert!(back.is_empty());
}
