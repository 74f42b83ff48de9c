//! Реализации хранилищ: удалённое по HTTP и в памяти (для автономной работы).

pub mod http;
pub mod memory;

use crate::error::{FinecrmError, Result};
use regex::Regex;
use std::sync::LazyLock;

// VIN: 17 символов, без I, O и Q.
static VIN_RE: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$"));

pub fn normalize_vin(raw: &str) -> Result<String> {
    let vin = raw.trim().to_uppercase();
    if vin.is_empty() {
        return Err(FinecrmError::Validation("введите VIN код".into()));
    }
    let re = VIN_RE.as_ref().map_err(|e| FinecrmError::Parse(e.to_string()))?;
    if !re.is_match(&vin) {
        return Err(FinecrmError::Validation(format!("некорректный VIN: {vin}")));
    }
    Ok(vin)
}

pub fn normalize_plate(raw: &str) -> Result<String> {
    let plate: String = raw.split_whitespace().collect::<String>().to_uppercase();
    if plate.is_empty() {
        return Err(FinecrmError::Validation("введите госномер".into()));
    }
    Ok(plate)
}

/// По чему искать ТС в сервисе проверки: госномер или VIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VehicleKey {
    Plate(String),
    Vin(String),
}

impl VehicleKey {
    /// Нормализованный ключ и имя параметра запроса.
    pub fn normalized(&self) -> Result<(&'static str, String)> {
        match self {
            VehicleKey::Plate(p) => Ok(("license_plate", normalize_plate(p)?)),
            VehicleKey::Vin(v) => Ok(("vin", normalize_vin(v)?)),
        }
    }
}
