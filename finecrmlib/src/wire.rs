//! Канонический контракт с удалённым хранилищем: camelCase JSON.
//!
//! Даты приходят то как `YYYY-MM-DD`, то как ISO-отметка времени
//! (`isoformat()` на стороне сервера), поэтому разбор здесь терпимый,
//! а запись всегда в одном виде.

use crate::{
    error::{FinecrmError, Result},
    model::{DeletedFine, Fine, ParkingPass, PlateLookup, PlateOwner, PlateVehicle, FineSummary, VehicleInfo, VinLookup},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use tracing::warn;

pub const DATE_FMT: &str = "%Y-%m-%d";
pub const TIMESTAMP_FMT: &str = "%Y-%m-%dT%H:%M:%S";

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, DATE_FMT) {
        return Ok(d);
    }
    parse_timestamp(s).map(|t| t.date())
}

pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Ok(t.naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(t);
        }
    }
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map(|d| d.and_time(NaiveTime::MIN))
        .map_err(|e| FinecrmError::Parse(format!("timestamp {s:?}: {e}")))
}

pub mod date {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &NaiveDate, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&d.format(super::DATE_FMT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(de::Error::custom)
    }
}

pub mod date_option {
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<NaiveDate>, s: S) -> std::result::Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_str(&d.format(super::DATE_FMT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_date(&raw).map(Some).map_err(de::Error::custom),
            _ => Ok(None),
        }
    }
}

pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&t.format(super::TIMESTAMP_FMT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_timestamp(&raw).map_err(de::Error::custom)
    }
}

pub mod timestamp_option {
    use chrono::NaiveDateTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(t: &Option<NaiveDateTime>, s: S) -> std::result::Result<S::Ok, S::Error> {
        match t {
            Some(t) => s.serialize_str(&t.format(super::TIMESTAMP_FMT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<NaiveDateTime>, D::Error> {
        match Option::<String>::deserialize(d)? {
            Some(raw) if !raw.trim().is_empty() => super::parse_timestamp(&raw).map(Some).map_err(de::Error::custom),
            _ => Ok(None),
        }
    }
}

/// `null` в текстовом поле превращается в пустую строку.
pub fn nullable_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// `null` вместо значения даёт значение по умолчанию.
pub fn nullable_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Список записей, где каждая разбирается отдельно: битая запись
/// пропускается с предупреждением, остальные загружаются.
pub fn lenient_rows<'de, D, T>(d: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let rows = Option::<Vec<serde_json::Value>>::deserialize(d)?.unwrap_or_default();
    Ok(rows
        .into_iter()
        .enumerate()
        .filter_map(|(row, value)| match serde_json::from_value::<T>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(row, error = %e, "skipping malformed record");
                None
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
pub struct FinesEnvelope {
    #[serde(deserialize_with = "lenient_rows")]
    pub fines: Vec<Fine>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryEnvelope {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub history: Vec<DeletedFine>,
}

#[derive(Debug, Deserialize)]
pub struct PassesEnvelope {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub passes: Vec<ParkingPass>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedPassBody {
    #[serde(default)]
    pub success: bool,
    pub id: Option<i64>,
    pub pass_number: Option<String>,
}

/// Тело ответа с ошибкой: `{"error": "..."}`.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self, fallback: &str) -> String {
        self.error.or(self.message).unwrap_or_else(|| fallback.to_string())
    }
}

pub fn vin_lookup_from_json(body: serde_json::Value) -> Result<VinLookup> {
    let found = body.get("found").and_then(|v| v.as_bool()).unwrap_or(false);
    if !found {
        return Ok(VinLookup::NotFound);
    }
    let info: VehicleInfo = serde_json::from_value(body)?;
    Ok(VinLookup::Found(info))
}

// Сервис проверки по госномеру отвечает в snake_case; здесь он приводится к модели.
#[derive(Debug, Deserialize)]
pub struct PlateBody {
    #[serde(default)]
    found: bool,
    id: Option<i64>,
    license_plate: Option<String>,
    brand: Option<String>,
    model: Option<String>,
    year: Option<i32>,
    color: Option<String>,
    vin: Option<String>,
    owner: Option<PlateOwnerBody>,
    fines: Option<PlateFinesBody>,
}

#[derive(Debug, Deserialize)]
struct PlateOwnerBody {
    id: Option<i64>,
    name: Option<String>,
    license_number: Option<String>,
    phone: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlateFinesBody {
    #[serde(default)]
    count: u32,
    #[serde(default)]
    unpaid_amount: Decimal,
}

impl PlateBody {
    pub fn into_lookup(self) -> Result<PlateLookup> {
        if !self.found {
            return Ok(PlateLookup::NotFound);
        }
        let license_plate = self
            .license_plate
            .ok_or_else(|| FinecrmError::Parse("plate lookup: missing license_plate".into()))?;
        let fines = self.fines.map_or(
            FineSummary { count: 0, unpaid_amount: Decimal::ZERO },
            |f| FineSummary { count: f.count, unpaid_amount: f.unpaid_amount },
        );
        Ok(PlateLookup::Found(PlateVehicle {
            id: self.id,
            license_plate,
            brand: self.brand.unwrap_or_default(),
            model: self.model.unwrap_or_default(),
            year: self.year,
            color: self.color.unwrap_or_default(),
            vin: self.vin,
            owner: self.owner.map(|o| PlateOwner {
                id: o.id,
                name: o.name.unwrap_or_default(),
                license_number: o.license_number,
                phone: o.phone,
            }),
            fines,
        }))
    }
}
