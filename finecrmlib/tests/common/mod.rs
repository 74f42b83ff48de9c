#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use finecrmlib::{
    backend::memory::MemoryStore,
    error::{FinecrmError, Result},
    model::{DeletedFine, DeletionAudit, Fine, FineRequest, FineStatus, FineUpdate},
    traits::FineStore,
};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
}

pub fn fine(id: i64, driver: &str, plate: &str, kind: &str, amount: i64, status: FineStatus) -> Fine {
    Fine {
        id,
        violation_number: format!("18810{id:05}"),
        driver_name: driver.into(),
        driver_id: None,
        license_plate: plate.into(),
        vehicle_id: None,
        violation_type: kind.into(),
        violation_date: date(2024, 1, 15),
        amount: Decimal::from(amount),
        discount_amount: None,
        status,
        location: "г. Москва, ул. Тверская".into(),
        description: String::new(),
        payment_deadline: None,
        discount_deadline: None,
        issuing_authority: None,
        article_code: None,
        payment_date: None,
        created_at: None,
    }
}

pub fn on(mut f: Fine, d: NaiveDate) -> Fine {
    f.violation_date = d;
    f
}

/// Небольшой набор: три живых штрафа и один удалённый.
pub fn sample() -> Vec<Fine> {
    vec![
        fine(1, "Иванов Иван Иванович", "А123БВ777", "Превышение скорости", 500, FineStatus::Unpaid),
        fine(2, "Петров Петр Петрович", "В456ГД199", "Парковка в неположенном месте", 3000, FineStatus::Paid),
        fine(3, "Иванова Мария Сергеевна", "Е789ЖЗ750", "Превышение скорости", 1500, FineStatus::Processing),
        fine(4, "Сидоров Сидор", "К001ММ777", "Проезд на красный", 1000, FineStatus::Deleted),
    ]
}

/// Хранилище в памяти, которое умеет отказывать: для выбранных id при
/// удалении и целиком при чтении списка.
pub struct FlakyStore {
    pub inner: MemoryStore,
    failing_ids: HashSet<i64>,
    fail_list: AtomicBool,
}

impl FlakyStore {
    pub fn new(fines: Vec<Fine>) -> Self {
        FlakyStore {
            inner: MemoryStore::with_fines(fines),
            failing_ids: HashSet::new(),
            fail_list: AtomicBool::new(false),
        }
    }

    pub fn failing_on(mut self, ids: &[i64]) -> Self {
        self.failing_ids.extend(ids);
        self
    }

    pub fn set_list_failing(&self, failing: bool) {
        self.fail_list.store(failing, Ordering::SeqCst);
    }

    fn remote_error() -> FinecrmError {
        FinecrmError::Remote { status: 500, message: "Internal Server Error".into() }
    }
}

impl FineStore for FlakyStore {
    fn list_fines(&self) -> Result<Vec<Fine>> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(Self::remote_error());
        }
        self.inner.list_fines()
    }

    fn add_fine(&self, req: &FineRequest) -> Result<()> {
        self.inner.add_fine(req)
    }

    fn update_fine(&self, id: i64, update: &FineUpdate) -> Result<()> {
        self.inner.update_fine(id, update)
    }

    fn delete_fine(&self, id: i64, audit: &DeletionAudit) -> Result<()> {
        if self.failing_ids.contains(&id) {
            return Err(Self::remote_error());
        }
        self.inner.delete_fine(id, audit)
    }

    fn deletion_history(&self) -> Result<Vec<DeletedFine>> {
        self.inner.deletion_history()
    }
}
