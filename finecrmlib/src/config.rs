//! Настройки консоли: адреса сервисов, каталог данных, политика удаления.

use crate::{
    error::{FinecrmError, Result},
    model::DeletionAudit,
};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_FINES_URL: &str = "https://functions.poehali.dev/e4da8fe6-8316-4b83-8d3e-1d73beb1a0bd";
pub const DEFAULT_EXTENDED_URL: &str = "https://functions.poehali.dev/869845df-0ee4-4954-8a12-9b892d8d91df";
pub const DEFAULT_GIBDD_URL: &str = "https://functions.poehali.dev/1b7c745a-4443-4ad7-89fa-14fdd174a2d5";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_DATA_DIR: &str = ".finecrm";

/// Как удалять штраф: удалением строки (`DELETE ?id=`) или пометкой статуса
/// через `PUT`. Сервис по умолчанию принимает только `DELETE`, поэтому
/// `Soft` имеет смысл лишь с сервисом, который понимает `PUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    Soft,
    #[default]
    Hard,
}

impl FromStr for DeletePolicy {
    type Err = FinecrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(DeletePolicy::Soft),
            "hard" => Ok(DeletePolicy::Hard),
            other => Err(FinecrmError::Parse(format!("unknown delete policy: {other}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub fines_url: String,
    pub extended_url: String,
    pub vehicle_check_url: Option<String>,
    pub gibdd_url: String,
    pub data_dir: PathBuf,
    pub timeout: Duration,
    pub delete_policy: DeletePolicy,
    pub operator: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            fines_url: DEFAULT_FINES_URL.into(),
            extended_url: DEFAULT_EXTENDED_URL.into(),
            vehicle_check_url: None,
            gibdd_url: DEFAULT_GIBDD_URL.into(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            timeout: DEFAULT_TIMEOUT,
            delete_policy: DeletePolicy::default(),
            operator: "admin".into(),
        }
    }
}

impl Config {
    pub fn audit(&self, reason: Option<String>) -> DeletionAudit {
        DeletionAudit {
            deleted_by: self.operator.clone(),
            reason: reason.or_else(|| DeletionAudit::default().reason),
        }
    }
}
