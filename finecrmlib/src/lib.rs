//! finecrmlib: учёт штрафов ГИБДД: модель представления, правила оплаты,
//! пропуска, справочники, обмен с сервером и выгрузки (CSV, XML, квитанция, постановление)

pub mod error;
pub mod model;
pub mod wire;
pub mod traits;
pub mod config;
pub mod locale;

pub mod filter;
pub mod stats;
pub mod payment;
pub mod parking;
pub mod view_model;
pub mod registry;
pub mod notifications;
pub mod analytics;
pub mod gibdd;
pub mod storage;
pub mod backend;

pub mod formats {
    pub mod csv;
    pub mod xml;
    pub mod receipt;
    pub mod decree;
}
