//! Локальное состояние консоли: один JSON-документ в каталоге данных.
//!
//! Отсутствующий или испорченный файл не ошибка: состояние начинается
//! с начальных данных, а причина пишется в лог.

use crate::{
    backend::memory::MemorySnapshot,
    error::Result,
    notifications::{InboxMarks, NotificationSettings},
    registry::{DriverRegistry, VehicleRegistry},
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SCHEMA_VERSION: u32 = 1;
pub const STATE_FILE: &str = "state.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub schema_version: u32,
    #[serde(default)]
    pub drivers: DriverRegistry,
    #[serde(default)]
    pub vehicles: VehicleRegistry,
    #[serde(default)]
    pub settings: NotificationSettings,
    #[serde(default)]
    pub inbox: InboxMarks,
    /// Данные автономного режима.
    #[serde(default)]
    pub offline: MemorySnapshot,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            schema_version: SCHEMA_VERSION,
            drivers: DriverRegistry::seeded(),
            vehicles: VehicleRegistry::seeded(),
            settings: NotificationSettings::default(),
            inbox: InboxMarks::default(),
            offline: MemorySnapshot::default(),
        }
    }
}

pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    /// Создаёт каталог данных, если его нет.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(LocalStore { path: dir.join(STATE_FILE) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> AppState {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no local state yet, starting from seed data");
                return AppState::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read local state, starting from seed data");
                return AppState::default();
            }
        };
        match serde_json::from_str::<AppState>(&raw) {
            Ok(state) if state.schema_version == SCHEMA_VERSION => {
                debug!(path = %self.path.display(), "local state loaded");
                state
            }
            Ok(state) => {
                warn!(found = state.schema_version, expected = SCHEMA_VERSION, "unsupported local state version, starting from seed data");
                AppState::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "malformed local state, starting from seed data");
                AppState::default()
            }
        }
    }

    /// Пишет во временный файл и переименовывает, чтобы не оставить полузаписанный документ.
    pub fn save(&self, state: &AppState) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(state)?;
        fs::write(&tmp, body)?;
        fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), "local state saved");
        Ok(())
    }
}
