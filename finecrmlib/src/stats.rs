//! Сводные показатели и ряды для графиков. Считаются по неудалённым
//! записям при каждом обращении, без кэша.

use crate::model::{Fine, FineStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FineStats {
    pub total: usize,
    pub unpaid: usize,
    pub paid: usize,
    pub total_amount: Decimal,
}

impl FineStats {
    pub fn compute(fines: &[Fine]) -> Self {
        fines.iter().filter(|f| !f.is_deleted()).fold(FineStats::default(), |mut acc, f| {
            acc.total += 1;
            match f.status {
                FineStatus::Unpaid => acc.unpaid += 1,
                FineStatus::Paid => acc.paid += 1,
                _ => {}
            }
            acc.total_amount += f.amount;
            acc
        })
    }

    /// Записи в прочих статусах («В обработке»).
    pub fn other(&self) -> usize {
        self.total - self.unpaid - self.paid
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub count: usize,
}

/// Категории идут в порядке первого появления в списке, без сортировки.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChartSeries {
    pub by_violation_type: Vec<Category>,
    pub by_status: Vec<Category>,
}

impl ChartSeries {
    pub fn compute(fines: &[Fine]) -> Self {
        let live: Vec<&Fine> = fines.iter().filter(|f| !f.is_deleted()).collect();
        ChartSeries {
            by_violation_type: group_counts(live.iter().map(|f| f.violation_type.as_str())),
            by_status: group_counts(live.iter().map(|f| f.status.as_str())),
        }
    }
}

fn group_counts<'a>(keys: impl Iterator<Item = &'a str>) -> Vec<Category> {
    let mut out: Vec<Category> = Vec::new();
    let mut pos: HashMap<&'a str, usize> = HashMap::new();
    for key in keys {
        match pos.get(key) {
            Some(&i) => out[i].count += 1,
            None => {
                pos.insert(key, out.len());
                out.push(Category { name: key.to_string(), count: 1 });
            }
        }
    }
    out
}
