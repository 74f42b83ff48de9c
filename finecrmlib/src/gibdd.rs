//! Проверка штрафов в ГИБДД по номеру водительского удостоверения и СТС.

use crate::{
    error::{FinecrmError, Result},
    model::{Fine, FineStatus},
    payment, wire,
};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Запрос проверки; оба номера обязательны.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GibddQuery {
    pub license_number: String,
    pub sts_number: String,
}

impl GibddQuery {
    pub fn new(license_number: &str, sts_number: &str) -> Result<Self> {
        let license_number = license_number.trim();
        let sts_number = sts_number.trim();
        if license_number.is_empty() || sts_number.is_empty() {
            return Err(FinecrmError::Validation("заполните номер ВУ и СТС".into()));
        }
        Ok(GibddQuery {
            license_number: license_number.to_string(),
            sts_number: sts_number.to_string(),
        })
    }
}

/// Штраф в ответе ГИБДД. `discount_amount` равен нулю, когда скидки нет.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GibddFine {
    pub uin_number: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub violation_type: String,
    #[serde(with = "wire::date")]
    pub violation_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default)]
    pub discount: bool,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    pub status: FineStatus,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub location: String,
    #[serde(default)]
    pub can_pay: bool,
}

impl GibddFine {
    pub fn payable(&self) -> Decimal {
        if self.discount {
            self.discount_amount
        } else {
            self.amount
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GibddCheck {
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub license_number: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub sts_number: String,
    #[serde(default)]
    pub found_fines: u32,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub total_with_discount: Decimal,
    #[serde(default, deserialize_with = "wire::lenient_rows")]
    pub fines: Vec<GibddFine>,
    #[serde(with = "wire::timestamp")]
    pub checked_at: NaiveDateTime,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub source: String,
}

pub const LOCAL_SOURCE: &str = "Локальная база штрафов";

impl GibddCheck {
    pub fn has_discount(&self) -> bool {
        self.total_with_discount < self.total_amount
    }

    /// Ответ по локальным данным: неоплаченные и находящиеся в обработке
    /// штрафы, скидка по правилу 20 дней на дату `now`.
    pub fn from_fines<'a, I>(query: &GibddQuery, fines: I, now: NaiveDateTime) -> Self
    where
        I: IntoIterator<Item = &'a Fine>,
    {
        let today = now.date();
        let found: Vec<GibddFine> = fines
            .into_iter()
            .filter(|f| matches!(f.status, FineStatus::Unpaid | FineStatus::Processing))
            .map(|f| {
                let discount = payment::discount_applies(f, today);
                GibddFine {
                    uin_number: f.violation_number.clone(),
                    violation_type: f.violation_type.clone(),
                    violation_date: f.violation_date,
                    amount: f.amount,
                    discount,
                    discount_amount: if discount { payment::payment_amount(f, today) } else { Decimal::ZERO },
                    status: f.status,
                    location: f.location.clone(),
                    can_pay: true,
                }
            })
            .collect();

        GibddCheck {
            license_number: query.license_number.clone(),
            sts_number: query.sts_number.clone(),
            found_fines: found.len() as u32,
            total_amount: found.iter().map(|f| f.amount).sum(),
            total_with_discount: found.iter().map(GibddFine::payable).sum(),
            fines: found,
            checked_at: now,
            source: LOCAL_SOURCE.to_string(),
        }
    }
}
