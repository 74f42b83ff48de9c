//! Квитанция на оплату штрафа (простой текст). Строка скидки печатается
//! только пока действует скидка.

use crate::{error::Result, locale, model::Fine, payment};
use chrono::NaiveDateTime;
use std::io::Write;

pub const INN: &str = "7700000000";
pub const KPP: &str = "770001001";
pub const RECIPIENT: &str = "ГИБДД России";
pub const ACCOUNT: &str = "40101810000000010001";

pub struct Receipt;

impl Receipt {
    pub fn file_name(fine: &Fine) -> String {
        format!("Квитанция_{}.txt", fine.violation_number)
    }
}

impl crate::traits::WriteDocument for Receipt {
    fn write<W: Write>(mut w: W, fine: &Fine, printed_at: NaiveDateTime) -> Result<()> {
        let today = printed_at.date();

        writeln!(w, "КВИТАНЦИЯ НА ОПЛАТУ ШТРАФА")?;
        writeln!(w, "========================")?;
        writeln!(w)?;
        writeln!(w, "Постановление: {}", fine.violation_number)?;
        writeln!(w, "Водитель: {}", fine.driver_name)?;
        writeln!(w, "ТС: {}", fine.license_plate)?;
        writeln!(w)?;
        writeln!(w, "Нарушение: {}", fine.violation_type)?;
        writeln!(w, "Дата нарушения: {}", locale::format_date(fine.violation_date))?;
        writeln!(w, "Место: {}", fine.location)?;
        writeln!(w)?;
        writeln!(w, "Сумма штрафа: {}", locale::format_rub(fine.amount))?;
        if payment::discount_applies(fine, today) {
            writeln!(
                w,
                "Скидка {}%: -{}",
                payment::DISCOUNT_PERCENT,
                locale::format_rub(payment::discount_value(fine, today))
            )?;
        }
        writeln!(w, "К оплате: {}", locale::format_rub(payment::payment_amount(fine, today)))?;
        writeln!(w)?;
        writeln!(w, "Реквизиты для оплаты:")?;
        writeln!(w, "ИНН: {INN}")?;
        writeln!(w, "КПП: {KPP}")?;
        writeln!(w, "Получатель: {RECIPIENT}")?;
        writeln!(w, "Счет: {ACCOUNT}")?;
        writeln!(w)?;
        writeln!(w, "Дата формирования: {}", locale::format_timestamp(printed_at))?;
        Ok(())
    }
}
