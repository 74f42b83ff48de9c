//! Хранилище в памяти. Им пользуется автономный режим консоли (снимок
//! сохраняется в локальное состояние) и тесты.

use crate::{
    backend::{normalize_vin, VehicleKey},
    config::DeletePolicy,
    error::{FinecrmError, Result},
    gibdd::{GibddCheck, GibddQuery},
    model::{
        DeletedFine, DeletionAudit, Fine, FineRequest, FineStatus, FineSummary, FineUpdate, IssuedPass,
        ParkingPass, PlateLookup, PlateOwner, PlateVehicle, VehicleInfo, VinLookup,
    },
    parking::{default_pass_number, NewPass},
    traits::{FineStore, PassStore, VehicleLookup},
};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MemorySnapshot {
    #[serde(default)]
    pub fines: Vec<Fine>,
    #[serde(default)]
    pub history: Vec<DeletedFine>,
    #[serde(default)]
    pub passes: Vec<ParkingPass>,
    #[serde(default)]
    pub vehicles: Vec<VehicleInfo>,
}

impl Default for MemorySnapshot {
    fn default() -> Self {
        MemorySnapshot {
            fines: Vec::new(),
            history: Vec::new(),
            passes: Vec::new(),
            vehicles: seed_vehicles(),
        }
    }
}

fn seed_vehicles() -> Vec<VehicleInfo> {
    vec![
        VehicleInfo {
            vin_code: "XTA21703050123456".into(),
            license_plate: "А123ВВ777".into(),
            brand: "LADA".into(),
            model: "Vesta".into(),
            year: Some(2023),
            color: "Синий".into(),
            owner_name: "Петров Петр Петрович".into(),
            registration_date: NaiveDate::from_ymd_opt(2023, 3, 15),
            last_inspection: NaiveDate::from_ymd_opt(2024, 9, 20),
            insurance_valid_until: NaiveDate::from_ymd_opt(2025, 3, 15),
        },
        VehicleInfo {
            vin_code: "Z8T4DNFVC8S123789".into(),
            license_plate: "В456СС199".into(),
            brand: "Toyota".into(),
            model: "Camry".into(),
            year: Some(2022),
            color: "Черный".into(),
            owner_name: "Иванов Иван Иванович".into(),
            registration_date: NaiveDate::from_ymd_opt(2022, 5, 20),
            last_inspection: NaiveDate::from_ymd_opt(2024, 8, 15),
            insurance_valid_until: NaiveDate::from_ymd_opt(2025, 5, 20),
        },
    ]
}

pub struct MemoryStore {
    state: Mutex<MemorySnapshot>,
    policy: DeletePolicy,
}

impl MemoryStore {
    pub fn new(snapshot: MemorySnapshot, policy: DeletePolicy) -> Self {
        MemoryStore { state: Mutex::new(snapshot), policy }
    }

    pub fn with_fines(fines: Vec<Fine>) -> Self {
        Self::new(MemorySnapshot { fines, ..MemorySnapshot::default() }, DeletePolicy::Soft)
    }

    pub fn snapshot(&self) -> MemorySnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemorySnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }
}

fn record_history(st: &mut MemorySnapshot, fine: Fine, deleted_by: String, reason: Option<String>) {
    let id = st.history.iter().map(|h| h.fine.id).max().unwrap_or(0) + 1;
    let fine_id = fine.id;
    st.history.insert(
        0,
        DeletedFine {
            fine: Fine { id, ..fine },
            fine_id: Some(fine_id),
            deleted_by,
            deleted_at: MemoryStore::now(),
            reason,
        },
    );
}

impl FineStore for MemoryStore {
    fn list_fines(&self) -> Result<Vec<Fine>> {
        Ok(self.lock().fines.clone())
    }

    fn add_fine(&self, req: &FineRequest) -> Result<()> {
        let mut st = self.lock();
        let id = st.fines.iter().map(|f| f.id).max().unwrap_or(0) + 1;
        st.fines.push(req.clone().into_fine(id, Self::now()));
        debug!(fine_id = id, "fine stored in memory");
        Ok(())
    }

    fn update_fine(&self, id: i64, update: &FineUpdate) -> Result<()> {
        let mut st = self.lock();
        let fine = st
            .fines
            .iter_mut()
            .find(|f| f.id == id && !f.is_deleted())
            .ok_or_else(|| FinecrmError::fine_not_found(id))?;
        if let Some(status) = update.status {
            fine.status = status;
        }
        if update.payment_date.is_some() {
            fine.payment_date = update.payment_date;
        }
        if update.status == Some(FineStatus::Deleted) {
            let snapshot = fine.clone();
            record_history(
                &mut st,
                snapshot,
                update.deleted_by.clone().unwrap_or_else(|| "admin".into()),
                update.reason.clone(),
            );
        }
        Ok(())
    }

    fn delete_fine(&self, id: i64, audit: &DeletionAudit) -> Result<()> {
        match self.policy {
            DeletePolicy::Soft => self.update_fine(id, &FineUpdate::soft_delete(audit)),
            DeletePolicy::Hard => {
                let mut st = self.lock();
                let pos = st
                    .fines
                    .iter()
                    .position(|f| f.id == id)
                    .ok_or_else(|| FinecrmError::fine_not_found(id))?;
                let fine = st.fines.remove(pos);
                record_history(&mut st, fine, audit.deleted_by.clone(), audit.reason.clone());
                Ok(())
            }
        }
    }

    fn deletion_history(&self) -> Result<Vec<DeletedFine>> {
        Ok(self.lock().history.clone())
    }
}

impl PassStore for MemoryStore {
    fn list_passes(&self) -> Result<Vec<ParkingPass>> {
        Ok(self.lock().passes.clone())
    }

    fn issue_pass(&self, pass: &NewPass) -> Result<IssuedPass> {
        pass.validate()?;
        let mut st = self.lock();
        let now = Self::now();
        let id = st.passes.iter().map(|p| p.id).max().unwrap_or(0) + 1;
        let mut number = default_pass_number(now);
        if st.passes.iter().any(|p| p.pass_number == number) {
            number = format!("{number}-{id}");
        }
        let issued = pass.clone().into_pass(id, number.clone(), now)?;
        st.passes.insert(0, issued);
        Ok(IssuedPass { id: Some(id), pass_number: number })
    }

    fn remove_pass(&self, id: i64) -> Result<()> {
        let mut st = self.lock();
        let pos = st
            .passes
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| FinecrmError::NotFound { entity: "parking pass", id: id.to_string() })?;
        st.passes.remove(pos);
        Ok(())
    }
}

impl VehicleLookup for MemoryStore {
    fn lookup_vin(&self, vin: &str) -> Result<VinLookup> {
        let vin = normalize_vin(vin)?;
        let st = self.lock();
        Ok(st
            .vehicles
            .iter()
            .find(|v| v.vin_code == vin)
            .cloned()
            .map_or(VinLookup::NotFound, VinLookup::Found))
    }

    fn lookup_registration(&self, key: &VehicleKey) -> Result<PlateLookup> {
        let (_, value) = key.normalized()?;
        let st = self.lock();
        let found = st.vehicles.iter().find(|v| match key {
            VehicleKey::Plate(_) => v.license_plate.to_uppercase() == value,
            VehicleKey::Vin(_) => v.vin_code == value,
        });
        let Some(v) = found else {
            return Ok(PlateLookup::NotFound);
        };
        let plate = v.license_plate.to_uppercase();
        let related: Vec<&Fine> = st
            .fines
            .iter()
            .filter(|f| !f.is_deleted() && f.license_plate.to_uppercase() == plate)
            .collect();
        let unpaid_amount: Decimal = related
            .iter()
            .filter(|f| f.status == FineStatus::Unpaid)
            .map(|f| f.amount)
            .sum();
        Ok(PlateLookup::Found(PlateVehicle {
            id: None,
            license_plate: v.license_plate.clone(),
            brand: v.brand.clone(),
            model: v.model.clone(),
            year: v.year,
            color: v.color.clone(),
            vin: Some(v.vin_code.clone()),
            owner: Some(PlateOwner {
                id: None,
                name: v.owner_name.clone(),
                license_number: None,
                phone: None,
            }),
            fines: FineSummary { count: related.len() as u32, unpaid_amount },
        }))
    }

    // Связи между ВУ/СТС и штрафами здесь нет: отвечаем всеми
    // неоплаченными штрафами локальной базы.
    fn gibdd_check(&self, license_number: &str, sts_number: &str) -> Result<GibddCheck> {
        let query = GibddQuery::new(license_number, sts_number)?;
        let st = self.lock();
        Ok(GibddCheck::from_fines(&query, &st.fines, Self::now()))
    }
}
