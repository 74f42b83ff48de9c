//! Модель представления штрафов: полный список с сервера, фильтры и всё,
//! что из них выводится.
//!
//! Список заменяется целиком при каждой загрузке. Любая мутация идёт через
//! [`FineStore`], после успеха список перечитывается. Если перечитать не
//! удалось, мутация всё равно считается выполненной, а модель помечается
//! устаревшей ([`FineViewModel::is_stale`]) до следующей удачной загрузки.

use crate::{
    error::{FinecrmError, Result},
    filter::{FilterPatch, Filters},
    model::{DeletedFine, DeletionAudit, Fine, FineStatus, FineUpdate, NewFine},
    payment,
    registry::FineIndex,
    stats::{ChartSeries, FineStats},
    traits::FineStore,
};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct FineViewModel {
    all_fines: Vec<Fine>,
    filters: Filters,
    history: Vec<DeletedFine>,
    index: FineIndex,
    stale: bool,
}

/// Итог оплаты: сколько к оплате с учётом скидки на момент оплаты.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub fine_id: i64,
    pub discount_percent: u32,
    pub payable: Decimal,
}

/// Результат пакетного удаления по каждому идентификатору.
#[derive(Debug, Default)]
pub struct BatchDeleteReport {
    pub deleted: Vec<i64>,
    pub failed: Vec<(i64, FinecrmError)>,
}

impl BatchDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<i64> {
        self.failed.iter().map(|(id, _)| *id).collect()
    }
}

impl FineViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fines(fines: Vec<Fine>) -> Self {
        let mut vm = Self::default();
        vm.replace(fines);
        vm
    }

    fn replace(&mut self, fines: Vec<Fine>) {
        self.index = FineIndex::build(&fines);
        self.all_fines = fines;
        self.stale = false;
    }

    /// Список может расходиться с хранилищем: последняя загрузка не удалась.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn all_fines(&self) -> &[Fine] {
        &self.all_fines
    }

    pub fn history(&self) -> &[DeletedFine] {
        &self.history
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn index(&self) -> &FineIndex {
        &self.index
    }

    pub fn get(&self, id: i64) -> Option<&Fine> {
        self.all_fines.iter().find(|f| f.id == id)
    }

    /// Загружает полный список. При ошибке прежний список остаётся.
    #[instrument(skip_all)]
    pub fn load<S: FineStore + ?Sized>(&mut self, store: &S) -> Result<()> {
        match store.list_fines() {
            Ok(fines) => {
                info!(count = fines.len(), "fines loaded");
                self.replace(fines);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to load fines, keeping previous list");
                self.stale = true;
                Err(e)
            }
        }
    }

    /// Журнал удалений; ошибка только логируется.
    #[instrument(skip_all)]
    pub fn load_history<S: FineStore + ?Sized>(&mut self, store: &S) {
        match store.deletion_history() {
            Ok(history) => {
                debug!(count = history.len(), "deletion history loaded");
                self.history = history;
            }
            Err(e) => warn!(error = %e, "failed to load deletion history"),
        }
    }

    pub fn set_filter(&mut self, patch: FilterPatch) {
        self.filters.apply_patch(patch);
    }

    pub fn filtered_view(&self) -> Vec<&Fine> {
        self.filters.apply(&self.all_fines)
    }

    pub fn stats(&self) -> FineStats {
        FineStats::compute(&self.all_fines)
    }

    pub fn chart_series(&self) -> ChartSeries {
        ChartSeries::compute(&self.all_fines)
    }

    /// Типы нарушений, встречающиеся в данных, в порядке появления.
    pub fn violation_types(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for f in self.all_fines.iter().filter(|f| !f.is_deleted()) {
            if !out.contains(&f.violation_type.as_str()) {
                out.push(&f.violation_type);
            }
        }
        out
    }

    fn check_payable(&self, id: i64) -> Result<&Fine> {
        let fine = self.get(id).ok_or_else(|| FinecrmError::fine_not_found(id))?;
        match fine.status {
            FineStatus::Unpaid | FineStatus::Processing => Ok(fine),
            from => Err(FinecrmError::InvalidTransition {
                id,
                from: from.to_string(),
                to: FineStatus::Paid.to_string(),
            }),
        }
    }

    pub fn payment_preview(&self, id: i64, now: NaiveDateTime) -> Result<PaymentOutcome> {
        let fine = self.check_payable(id)?;
        let today = now.date();
        Ok(PaymentOutcome {
            fine_id: id,
            discount_percent: payment::discount_percent(fine, today),
            payable: payment::payment_amount(fine, today),
        })
    }

    /// Локальная оплата: статус «Оплачен» и дата оплаты.
    pub fn record_payment(&mut self, id: i64, now: NaiveDateTime) -> Result<PaymentOutcome> {
        let outcome = self.payment_preview(id, now)?;
        if let Some(fine) = self.all_fines.iter_mut().find(|f| f.id == id) {
            fine.status = FineStatus::Paid;
            fine.payment_date = Some(now);
        }
        info!(fine_id = id, payable = %outcome.payable, "payment recorded");
        Ok(outcome)
    }

    /// Оплата через хранилище: сначала запрос, затем локальная отметка и перечитывание.
    #[instrument(skip(self, store))]
    pub fn settle_payment<S: FineStore + ?Sized>(
        &mut self,
        store: &S,
        id: i64,
        now: NaiveDateTime,
    ) -> Result<PaymentOutcome> {
        self.check_payable(id)?;
        store.update_fine(id, &FineUpdate::paid(now))?;
        let outcome = self.record_payment(id, now)?;
        self.refresh(store);
        Ok(outcome)
    }

    #[instrument(skip(self, store, fine), fields(number = %fine.violation_number))]
    pub fn add_fine<S: FineStore + ?Sized>(&mut self, store: &S, fine: NewFine) -> Result<()> {
        let req = fine.into_request()?;
        store.add_fine(&req)?;
        info!("fine added");
        self.refresh(store);
        Ok(())
    }

    #[instrument(skip(self, store, audit))]
    pub fn delete<S: FineStore + ?Sized>(&mut self, store: &S, id: i64, audit: &DeletionAudit) -> Result<()> {
        store.delete_fine(id, audit)?;
        info!(fine_id = id, "fine deleted");
        self.reload_after_delete(store);
        Ok(())
    }

    /// Один запрос на каждый id, все запускаются сразу. Отчёт перечисляет
    /// удалённые и неудавшиеся; при хотя бы одном успехе перечитываются
    /// список и журнал.
    #[instrument(skip(self, store, audit), fields(count = ids.len()))]
    pub fn delete_many<S: FineStore + ?Sized>(
        &mut self,
        store: &S,
        ids: &[i64],
        audit: &DeletionAudit,
    ) -> BatchDeleteReport {
        let outcomes: Vec<(i64, Result<()>)> = std::thread::scope(|scope| {
            let handles: Vec<_> = ids
                .iter()
                .map(|&id| (id, scope.spawn(move || store.delete_fine(id, audit))))
                .collect();
            handles
                .into_iter()
                .map(|(id, h)| match h.join() {
                    Ok(res) => (id, res),
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut report = BatchDeleteReport::default();
        for (id, res) in outcomes {
            match res {
                Ok(()) => report.deleted.push(id),
                Err(e) => {
                    warn!(fine_id = id, error = %e, "delete failed");
                    report.failed.push((id, e));
                }
            }
        }
        info!(deleted = report.deleted.len(), failed = report.failed.len(), "batch delete finished");

        if !report.deleted.is_empty() {
            self.reload_after_delete(store);
        }
        report
    }

    /// Перечитывание после удачной мутации. Ошибка уже записана в журнал
    /// и отражена в [`Self::is_stale`].
    fn refresh<S: FineStore + ?Sized>(&mut self, store: &S) {
        if self.load(store).is_err() {
            debug!("list is stale after mutation");
        }
    }

    fn reload_after_delete<S: FineStore + ?Sized>(&mut self, store: &S) {
        self.refresh(store);
        self.load_history(store);
    }

    pub fn driver_fines(&self, driver_name: &str) -> Vec<&Fine> {
        self.index.for_driver(&self.all_fines, driver_name)
    }

    pub fn plate_fines(&self, plate: &str) -> Vec<&Fine> {
        self.index.for_plate(&self.all_fines, plate)
    }
}
