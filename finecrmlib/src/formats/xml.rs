//! XML-выгрузка списка штрафов: <fines><fine>...</fine></fines>

use crate::{error::{FinecrmError, Result}, model::{Fine, FineStatus}, wire};
use quick_xml::{de::from_reader, se::to_string};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};

use rust_decimal::Decimal;

#[derive(Serialize, Deserialize, Debug)]
struct XmlFine {
    id: i64,
    violation_number: String,
    driver_name: String,
    license_plate: String,
    violation_type: String,
    violation_date: String,
    #[serde(with = "rust_decimal::serde::str")]
    amount: Decimal,
    status: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_date: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename = "fines")]
struct XmlFines {
    #[serde(rename = "fine", default)]
    fines: Vec<XmlFine>,
}

pub struct Xml;

impl crate::traits::ReadFormat for Xml {
    fn read<R: BufRead>(r: R) -> Result<Vec<Fine>> {
        let x: XmlFines = from_reader(r).map_err(|e| FinecrmError::Xml(format!("{e}")))?;

        let mut fines = Vec::with_capacity(x.fines.len());
        for e in x.fines {
            let status: FineStatus = e.status.parse()?;
            let payment_date = e.payment_date.as_deref().map(wire::parse_timestamp).transpose()?;
            fines.push(Fine {
                id: e.id,
                violation_number: e.violation_number,
                driver_name: e.driver_name,
                driver_id: None,
                license_plate: e.license_plate,
                vehicle_id: None,
                violation_type: e.violation_type,
                violation_date: wire::parse_date(&e.violation_date)?,
                amount: e.amount,
                discount_amount: None,
                status,
                location: e.location,
                description: e.description,
                payment_deadline: None,
                discount_deadline: None,
                issuing_authority: None,
                article_code: None,
                payment_date,
                created_at: None,
            });
        }
        Ok(fines)
    }
}

impl crate::traits::WriteFormat for Xml {
    fn write<W: Write>(mut w: W, fines: &[Fine]) -> Result<()> {
        let x = XmlFines {
            fines: fines
                .iter()
                .map(|f| XmlFine {
                    id: f.id,
                    violation_number: f.violation_number.clone(),
                    driver_name: f.driver_name.clone(),
                    license_plate: f.license_plate.clone(),
                    violation_type: f.violation_type.clone(),
                    violation_date: f.violation_date.format(wire::DATE_FMT).to_string(),
                    amount: f.amount,
                    status: f.status.as_str().to_string(),
                    location: f.location.clone(),
                    description: f.description.clone(),
                    payment_date: f.payment_date.map(|t| t.format(wire::TIMESTAMP_FMT).to_string()),
                })
                .collect(),
        };

        let s = to_string(&x).map_err(|e| FinecrmError::Xml(format!("{e}")))?;
        w.write_all(s.as_bytes())?;
        Ok(())
    }
}
