//! Парковочные пропуска: статус по сроку действия и проверка заявки.

use crate::{
    error::{FinecrmError, Result},
    model::{ParkingPass, ParkingZone},
    wire,
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassStatus {
    Active,
    Expired,
}

impl PassStatus {
    /// Пропуск действует строго до `valid_until`: в сам этот момент он уже истёк.
    pub fn at(valid_until: NaiveDateTime, now: NaiveDateTime) -> Self {
        if now < valid_until {
            PassStatus::Active
        } else {
            PassStatus::Expired
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PassStatus::Active => "Активен",
            PassStatus::Expired => "Истек",
        }
    }
}

impl fmt::Display for PassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ParkingPass {
    pub fn status_at(&self, now: NaiveDateTime) -> PassStatus {
        PassStatus::at(self.valid_until, now)
    }
}

/// Заявка на выдачу пропуска.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewPass {
    pub license_plate: String,
    pub driver_name: String,
    pub driver_phone: String,
    #[serde(with = "wire::timestamp_option")]
    pub valid_until: Option<NaiveDateTime>,
    #[serde(rename = "parkingZones")]
    pub zone: ParkingZone,
    pub notes: String,
}

impl NewPass {
    pub fn validate(&self) -> Result<NaiveDateTime> {
        let mut missing = Vec::new();
        if self.license_plate.trim().is_empty() {
            missing.push("госномер");
        }
        if self.driver_name.trim().is_empty() {
            missing.push("водитель");
        }
        match self.valid_until {
            Some(until) if missing.is_empty() => Ok(until),
            until => {
                if until.is_none() {
                    missing.push("срок действия");
                }
                Err(FinecrmError::Validation(format!(
                    "заполните обязательные поля: {}",
                    missing.join(", ")
                )))
            }
        }
    }

    pub fn into_pass(self, id: i64, pass_number: String, issued_at: NaiveDateTime) -> Result<ParkingPass> {
        let valid_until = self.validate()?;
        Ok(ParkingPass {
            id,
            pass_number,
            license_plate: self.license_plate.trim().to_string(),
            driver_name: self.driver_name.trim().to_string(),
            driver_phone: self.driver_phone,
            valid_from: Some(issued_at),
            valid_until,
            zone: self.zone,
            issued_by: "admin".into(),
            issued_at: Some(issued_at),
            notes: self.notes,
        })
    }
}

/// Номер пропуска по умолчанию: `PP` и отметка времени выдачи.
pub fn default_pass_number(issued_at: NaiveDateTime) -> String {
    format!("PP{}", issued_at.format("%Y%m%d%H%M%S"))
}

pub fn active_passes(passes: &[ParkingPass], now: NaiveDateTime) -> Vec<&ParkingPass> {
    passes
        .iter()
        .filter(|p| p.status_at(now) == PassStatus::Active)
        .collect()
}
