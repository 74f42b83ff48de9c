//! Доменные модели: единый «нормализованный» слой между удалённым
//! хранилищем, локальным состоянием и форматами выгрузки.

use crate::{
    error::{FinecrmError, Result},
    wire,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Статус штрафа. Строки с сервера приводятся к варианту при разборе,
/// оба написания «неоплачен» дают [`FineStatus::Unpaid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FineStatus {
    Paid,
    Unpaid,
    Processing,
    Deleted,
}

impl FineStatus {
    pub const ALL: [FineStatus; 4] = [
        FineStatus::Paid,
        FineStatus::Unpaid,
        FineStatus::Processing,
        FineStatus::Deleted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FineStatus::Paid => "Оплачен",
            FineStatus::Unpaid => "Не оплачен",
            FineStatus::Processing => "В обработке",
            FineStatus::Deleted => "Удален",
        }
    }
}

impl fmt::Display for FineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FineStatus {
    type Err = FinecrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "оплачен" | "paid" => Ok(FineStatus::Paid),
            "не оплачен" | "неоплачен" | "unpaid" => Ok(FineStatus::Unpaid),
            "в обработке" | "processing" => Ok(FineStatus::Processing),
            "удален" | "удалён" | "deleted" => Ok(FineStatus::Deleted),
            other => Err(FinecrmError::Parse(format!("unknown fine status: {other}"))),
        }
    }
}

impl TryFrom<String> for FineStatus {
    type Error = FinecrmError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<FineStatus> for String {
    fn from(s: FineStatus) -> Self {
        s.as_str().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Fine {
    pub id: i64,
    pub violation_number: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub driver_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<i64>,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub license_plate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub violation_type: String,
    #[serde(with = "wire::date")]
    pub violation_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option", skip_serializing_if = "Option::is_none")]
    pub discount_amount: Option<Decimal>,
    pub status: FineStatus,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub location: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub description: String,
    #[serde(default, with = "wire::date_option", skip_serializing_if = "Option::is_none")]
    pub payment_deadline: Option<NaiveDate>,
    #[serde(default, with = "wire::date_option", skip_serializing_if = "Option::is_none")]
    pub discount_deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuing_authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_code: Option<String>,
    #[serde(default, with = "wire::timestamp_option", skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDateTime>,
    #[serde(default, with = "wire::timestamp_option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
}

impl Fine {
    pub fn is_deleted(&self) -> bool {
        self.status == FineStatus::Deleted
    }
}

/// Кто и почему удалил штраф.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionAudit {
    pub deleted_by: String,
    pub reason: Option<String>,
}

impl Default for DeletionAudit {
    fn default() -> Self {
        DeletionAudit {
            deleted_by: "admin".into(),
            reason: Some("Удалено через систему".into()),
        }
    }
}

/// Запись журнала удалений. После создания не меняется.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeletedFine {
    #[serde(flatten)]
    pub fine: Fine,
    #[serde(default)]
    pub fine_id: Option<i64>,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub deleted_by: String,
    #[serde(with = "wire::timestamp")]
    pub deleted_at: NaiveDateTime,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Частичное обновление штрафа (PUT).
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FineUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FineStatus>,
    #[serde(with = "wire::timestamp_option", skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FineUpdate {
    pub fn paid(at: NaiveDateTime) -> Self {
        FineUpdate {
            status: Some(FineStatus::Paid),
            payment_date: Some(at),
            ..FineUpdate::default()
        }
    }

    pub fn soft_delete(audit: &DeletionAudit) -> Self {
        FineUpdate {
            status: Some(FineStatus::Deleted),
            deleted_by: Some(audit.deleted_by.clone()),
            reason: audit.reason.clone(),
            ..FineUpdate::default()
        }
    }
}

pub const DEFAULT_AUTHORITY: &str = "ГИБДД";
pub const PAYMENT_DEADLINE_DAYS: i64 = 60;
pub const DISCOUNT_DEADLINE_DAYS: i64 = 20;

/// Данные формы добавления штрафа, ещё не проверенные.
#[derive(Debug, Clone, Default)]
pub struct NewFine {
    pub violation_number: String,
    pub driver_name: String,
    pub driver_id: Option<i64>,
    pub license_plate: String,
    pub vehicle_id: Option<i64>,
    pub violation_type: String,
    pub violation_date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub discount_amount: Option<Decimal>,
    pub location: String,
    pub description: String,
    pub payment_deadline: Option<NaiveDate>,
    pub discount_deadline: Option<NaiveDate>,
    pub issuing_authority: Option<String>,
    pub article_code: Option<String>,
}

/// Проверенный запрос на добавление (POST), все умолчания уже подставлены.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FineRequest {
    pub violation_number: String,
    pub driver_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<i64>,
    pub license_plate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<i64>,
    pub violation_type: String,
    #[serde(with = "wire::date")]
    pub violation_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_amount: Decimal,
    pub location: String,
    pub description: String,
    #[serde(with = "wire::date")]
    pub payment_deadline: NaiveDate,
    #[serde(with = "wire::date")]
    pub discount_deadline: NaiveDate,
    pub issuing_authority: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_code: Option<String>,
    pub status: FineStatus,
}

impl NewFine {
    pub fn into_request(self) -> Result<FineRequest> {
        let mut missing = Vec::new();
        if self.violation_number.trim().is_empty() {
            missing.push("номер постановления");
        }
        if self.driver_name.trim().is_empty() && self.driver_id.is_none() {
            missing.push("водитель");
        }
        if self.license_plate.trim().is_empty() && self.vehicle_id.is_none() {
            missing.push("ТС");
        }
        if self.amount.is_none() {
            missing.push("сумма");
        }
        if self.violation_date.is_none() {
            missing.push("дата");
        }
        let (amount, violation_date) = match (self.amount, self.violation_date) {
            (Some(a), Some(d)) if missing.is_empty() => (a, d),
            _ => {
                return Err(FinecrmError::Validation(format!(
                    "заполните обязательные поля: {}",
                    missing.join(", ")
                )))
            }
        };
        if amount.is_sign_negative() {
            return Err(FinecrmError::Validation(format!("сумма не может быть отрицательной: {amount}")));
        }
        let discount_amount = self.discount_amount.unwrap_or(amount / Decimal::TWO);
        if discount_amount > amount {
            return Err(FinecrmError::Validation(format!(
                "скидка {discount_amount} больше суммы штрафа {amount}"
            )));
        }

        Ok(FineRequest {
            violation_number: self.violation_number.trim().to_string(),
            driver_name: self.driver_name.trim().to_string(),
            driver_id: self.driver_id,
            license_plate: self.license_plate.trim().to_string(),
            vehicle_id: self.vehicle_id,
            violation_type: self.violation_type,
            violation_date,
            amount,
            discount_amount,
            location: self.location,
            description: self.description,
            payment_deadline: self
                .payment_deadline
                .unwrap_or(violation_date + Duration::days(PAYMENT_DEADLINE_DAYS)),
            discount_deadline: self
                .discount_deadline
                .unwrap_or(violation_date + Duration::days(DISCOUNT_DEADLINE_DAYS)),
            issuing_authority: self
                .issuing_authority
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_AUTHORITY.to_string()),
            article_code: self.article_code.filter(|s| !s.trim().is_empty()),
            status: FineStatus::Unpaid,
        })
    }
}

impl FineRequest {
    pub fn into_fine(self, id: i64, created_at: NaiveDateTime) -> Fine {
        Fine {
            id,
            violation_number: self.violation_number,
            driver_name: self.driver_name,
            driver_id: self.driver_id,
            license_plate: self.license_plate,
            vehicle_id: self.vehicle_id,
            violation_type: self.violation_type,
            violation_date: self.violation_date,
            amount: self.amount,
            discount_amount: Some(self.discount_amount),
            status: self.status,
            location: self.location,
            description: self.description,
            payment_deadline: Some(self.payment_deadline),
            discount_deadline: Some(self.discount_deadline),
            issuing_authority: Some(self.issuing_authority),
            article_code: self.article_code,
            payment_date: None,
            created_at: Some(created_at),
        }
    }
}

/// Зоны действия парковочного пропуска.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParkingZone {
    #[default]
    #[serde(rename = "Все зоны")]
    All,
    #[serde(rename = "Центр")]
    Center,
    #[serde(rename = "МКАД")]
    Mkad,
    #[serde(rename = "Парки")]
    Parks,
}

impl ParkingZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParkingZone::All => "Все зоны",
            ParkingZone::Center => "Центр",
            ParkingZone::Mkad => "МКАД",
            ParkingZone::Parks => "Парки",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ParkingZone::All => "Все зоны",
            ParkingZone::Center => "Только центр",
            ParkingZone::Mkad => "Только МКАД",
            ParkingZone::Parks => "Парки и скверы",
        }
    }
}

impl FromStr for ParkingZone {
    type Err = FinecrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "все зоны" | "all" => Ok(ParkingZone::All),
            "центр" | "center" => Ok(ParkingZone::Center),
            "мкад" | "mkad" => Ok(ParkingZone::Mkad),
            "парки" | "parks" => Ok(ParkingZone::Parks),
            other => Err(FinecrmError::Parse(format!("unknown parking zone: {other}"))),
        }
    }
}

/// Парковочный пропуск. Статус хранится не в записи, а выводится
/// из срока действия, см. [`crate::parking::PassStatus`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParkingPass {
    pub id: i64,
    pub pass_number: String,
    pub license_plate: String,
    pub driver_name: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub driver_phone: String,
    #[serde(default, with = "wire::timestamp_option", skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<NaiveDateTime>,
    #[serde(with = "wire::timestamp")]
    pub valid_until: NaiveDateTime,
    #[serde(rename = "parkingZones", default, deserialize_with = "wire::nullable_default")]
    pub zone: ParkingZone,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub issued_by: String,
    #[serde(default, with = "wire::timestamp_option", skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub notes: String,
}

/// Ответ на выдачу пропуска: номер назначает сервер.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedPass {
    pub id: Option<i64>,
    pub pass_number: String,
}

/// Сведения об автомобиле из проверки по VIN.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    pub vin_code: String,
    pub license_plate: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub brand: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub model: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub color: String,
    #[serde(default, deserialize_with = "wire::nullable_string")]
    pub owner_name: String,
    #[serde(default, with = "wire::date_option", skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<NaiveDate>,
    #[serde(default, with = "wire::date_option", skip_serializing_if = "Option::is_none")]
    pub last_inspection: Option<NaiveDate>,
    #[serde(default, with = "wire::date_option", skip_serializing_if = "Option::is_none")]
    pub insurance_valid_until: Option<NaiveDate>,
}

/// «Не найдено» это нормальный ответ, а не ошибка.
#[derive(Debug, Clone, PartialEq)]
pub enum VinLookup {
    Found(VehicleInfo),
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateOwner {
    pub id: Option<i64>,
    pub name: String,
    pub license_number: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FineSummary {
    pub count: u32,
    pub unpaid_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlateVehicle {
    pub id: Option<i64>,
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub year: Option<i32>,
    pub color: String,
    pub vin: Option<String>,
    pub owner: Option<PlateOwner>,
    pub fines: FineSummary,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlateLookup {
    Found(PlateVehicle),
    NotFound,
}
