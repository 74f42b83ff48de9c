//! Унифицированные трэйты: форматы выгрузки на основе std::io::{BufRead, Write}
//! и швы к внешним хранилищам.

use crate::{
    backend::VehicleKey,
    error::Result,
    gibdd::GibddCheck,
    model::{DeletedFine, DeletionAudit, Fine, FineRequest, FineUpdate, IssuedPass, ParkingPass, PlateLookup, VinLookup},
    parking::NewPass,
};
use chrono::NaiveDateTime;
use std::io::{BufRead, Write};

pub trait ReadFormat {
    fn read<R: BufRead>(r: R) -> Result<Vec<Fine>>;
}

pub trait WriteFormat {
    fn write<W: Write>(w: W, fines: &[Fine]) -> Result<()>;
}

/// Документ по одному штрафу (квитанция, постановление).
pub trait WriteDocument {
    fn write<W: Write>(w: W, fine: &Fine, printed_at: NaiveDateTime) -> Result<()>;
}

/// Хранилище штрафов. `Sync`, потому что пакетное удаление
/// обращается к нему из нескольких потоков сразу.
pub trait FineStore: Sync {
    fn list_fines(&self) -> Result<Vec<Fine>>;
    fn add_fine(&self, req: &FineRequest) -> Result<()>;
    fn update_fine(&self, id: i64, update: &FineUpdate) -> Result<()>;
    fn delete_fine(&self, id: i64, audit: &DeletionAudit) -> Result<()>;
    fn deletion_history(&self) -> Result<Vec<DeletedFine>>;
}

pub trait PassStore {
    fn list_passes(&self) -> Result<Vec<ParkingPass>>;
    fn issue_pass(&self, pass: &NewPass) -> Result<IssuedPass>;
    fn remove_pass(&self, id: i64) -> Result<()>;
}

pub trait VehicleLookup {
    fn lookup_vin(&self, vin: &str) -> Result<VinLookup>;
    fn lookup_registration(&self, key: &VehicleKey) -> Result<PlateLookup>;

    fn lookup_plate(&self, plate: &str) -> Result<PlateLookup> {
        self.lookup_registration(&VehicleKey::Plate(plate.to_string()))
    }

    /// Проверка штрафов по номеру ВУ и СТС. Пустой номер отклоняется до запроса.
    fn gibdd_check(&self, license_number: &str, sts_number: &str) -> Result<GibddCheck>;
}
