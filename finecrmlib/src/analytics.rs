//! Аналитика за последние 30 дней.

use crate::model::{Fine, FineStatus};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub const WINDOW_DAYS: i64 = 30;
pub const TOP_VIOLATORS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyPoint<T> {
    pub date: NaiveDate,
    pub value: T,
}

impl<T> DailyPoint<T> {
    /// Подпись оси в виде `dd.MM`.
    pub fn label(&self) -> String {
        self.date.format("%d.%m").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violator {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analytics {
    pub total_fines: usize,
    pub total_amount: Decimal,
    pub paid_fines: usize,
    pub unpaid_amount: Decimal,
    pub daily_fines: Vec<DailyPoint<usize>>,
    pub daily_revenue: Vec<DailyPoint<Decimal>>,
    pub top_violators: Vec<Violator>,
}

impl Analytics {
    pub fn compute(fines: &[Fine], today: NaiveDate) -> Self {
        let live: Vec<&Fine> = fines.iter().filter(|f| !f.is_deleted()).collect();

        let days: Vec<NaiveDate> = (0..WINDOW_DAYS)
            .map(|i| today - Duration::days(WINDOW_DAYS - 1 - i))
            .collect();

        let daily_fines = days
            .iter()
            .map(|&date| DailyPoint {
                date,
                value: live.iter().filter(|f| f.violation_date == date).count(),
            })
            .collect();

        let daily_revenue = days
            .iter()
            .map(|&date| DailyPoint {
                date,
                value: live
                    .iter()
                    .filter(|f| f.violation_date == date && f.status == FineStatus::Paid)
                    .map(|f| f.amount)
                    .sum(),
            })
            .collect();

        Analytics {
            total_fines: live.len(),
            total_amount: live.iter().map(|f| f.amount).sum(),
            paid_fines: live.iter().filter(|f| f.status == FineStatus::Paid).count(),
            unpaid_amount: live
                .iter()
                .filter(|f| f.status == FineStatus::Unpaid)
                .map(|f| f.amount)
                .sum(),
            daily_fines,
            daily_revenue,
            top_violators: top_violators(&live),
        }
    }
}

// Сортировка устойчивая: при равенстве раньше тот, кто раньше встретился.
fn top_violators(fines: &[&Fine]) -> Vec<Violator> {
    let mut out: Vec<Violator> = Vec::new();
    let mut pos: HashMap<String, usize> = HashMap::new();
    for f in fines {
        let name = format!("{} ({})", f.driver_name, f.license_plate);
        match pos.get(&name) {
            Some(&i) => out[i].count += 1,
            None => {
                pos.insert(name.clone(), out.len());
                out.push(Violator { name, count: 1 });
            }
        }
    }
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out.truncate(TOP_VIOLATORS);
    out
}
