//! Единый тип ошибок публичного API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FinecrmError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// Не заполнены обязательные поля; запрос до сервера не доходит.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid transition for fine {id}: {from} -> {to}")]
    InvalidTransition { id: i64, from: String, to: String },

    #[error("remote error {status}: {message}")]
    Remote { status: u16, message: String },
}

impl FinecrmError {
    pub fn fine_not_found(id: i64) -> Self {
        FinecrmError::NotFound { entity: "fine", id: id.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, FinecrmError>;
