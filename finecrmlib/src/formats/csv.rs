//! Таблица для выгрузки: русские заголовки, даты `dd.mm.yyyy`, суммы в рублях.
//! Номер постановления,Водитель,ТС,Нарушение,Дата,Сумма (₽),Статус,Место,Описание

use crate::{error::Result, locale, model::Fine};
use chrono::NaiveDate;
use csv::WriterBuilder;
use std::io::Write;

#[derive(serde::Serialize)]
struct CsvOutRow<'a> {
    #[serde(rename = "Номер постановления")]
    violation_number: &'a str,
    #[serde(rename = "Водитель")]
    driver_name: &'a str,
    #[serde(rename = "ТС")]
    license_plate: &'a str,
    #[serde(rename = "Нарушение")]
    violation_type: &'a str,
    #[serde(rename = "Дата")]
    violation_date: String,
    #[serde(rename = "Сумма (₽)")]
    amount: String,
    #[serde(rename = "Статус")]
    status: &'a str,
    #[serde(rename = "Место")]
    location: &'a str,
    #[serde(rename = "Описание")]
    description: &'a str,
}

pub struct Csv;

impl Csv {
    /// `Штрафы_ГИБДД_<дата>.csv`
    pub fn file_name(today: NaiveDate) -> String {
        format!("Штрафы_ГИБДД_{}.csv", locale::format_date(today))
    }
}

impl crate::traits::WriteFormat for Csv {
    fn write<W: Write>(mut w: W, fines: &[Fine]) -> Result<()> {
        let mut wrt = WriterBuilder::new().from_writer(&mut w);

        for f in fines {
            let out = CsvOutRow {
                violation_number: &f.violation_number,
                driver_name: &f.driver_name,
                license_plate: &f.license_plate,
                violation_type: &f.violation_type,
                violation_date: locale::format_date(f.violation_date),
                amount: locale::format_amount(f.amount),
                status: f.status.as_str(),
                location: &f.location,
                description: &f.description,
            };
            wrt.serialize(out)?;
        }
        wrt.flush()?;
        Ok(())
    }
}
