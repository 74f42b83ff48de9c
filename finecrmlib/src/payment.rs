//! Правило скидки: в первые 20 дней после нарушения штраф можно оплатить
//! за половину суммы. Оба числа фиксированы.

use crate::model::Fine;
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub const DISCOUNT_WINDOW_DAYS: i64 = 20;
pub const DISCOUNT_PERCENT: u32 = 50;

/// Целые дни от нарушения до `today`; для будущей даты отрицательно.
pub fn days_since(violation_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - violation_date).num_days()
}

pub fn discount_applies(fine: &Fine, today: NaiveDate) -> bool {
    days_since(fine.violation_date, today) <= DISCOUNT_WINDOW_DAYS
}

pub fn discount_percent(fine: &Fine, today: NaiveDate) -> u32 {
    if discount_applies(fine, today) {
        DISCOUNT_PERCENT
    } else {
        0
    }
}

/// Размер скидки в рублях (0, если окно закрыто).
pub fn discount_value(fine: &Fine, today: NaiveDate) -> Decimal {
    fine.amount * Decimal::from(discount_percent(fine, today)) / Decimal::ONE_HUNDRED
}

pub fn payment_amount(fine: &Fine, today: NaiveDate) -> Decimal {
    fine.amount - discount_value(fine, today)
}

/// Сколько дней ещё действует скидка; `None`, если уже не действует.
pub fn discount_days_left(fine: &Fine, today: NaiveDate) -> Option<i64> {
    discount_applies(fine, today).then(|| DISCOUNT_WINDOW_DAYS - days_since(fine.violation_date, today))
}
