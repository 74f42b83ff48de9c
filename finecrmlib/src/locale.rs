//! Форматирование чисел и дат по-русски (как `toLocaleString('ru-RU')`).

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// Разделитель разрядов: неразрывный пробел.
pub const GROUP_SEP: char = '\u{a0}';

/// `12500.5` → `12 500,5`; не больше двух знаков после запятой.
pub fn format_amount(amount: Decimal) -> String {
    let rounded = amount.round_dp(2).normalize();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(GROUP_SEP);
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(f) = frac_part {
        out.push(',');
        out.push_str(f);
    }
    out
}

pub fn format_rub(amount: Decimal) -> String {
    format!("{} ₽", format_amount(amount))
}

pub fn format_date(d: NaiveDate) -> String {
    d.format("%d.%m.%Y").to_string()
}

pub fn format_timestamp(t: NaiveDateTime) -> String {
    t.format("%d.%m.%Y, %H:%M:%S").to_string()
}
