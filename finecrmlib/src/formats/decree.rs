//! Постановление по делу об административном правонарушении.
//!
//! [`Decree::layout`] даёт фиксированную разметку страницы A4 (координаты
//! в миллиметрах, как у PDF-движка); `write` печатает её текстом.

use crate::{error::Result, locale, model::Fine};
use chrono::NaiveDateTime;
use std::io::Write;

pub const PAGE_CENTER_X: u16 = 105;
pub const LABEL_X: u16 = 20;
pub const VALUE_X: u16 = 80;
pub const FIRST_ROW_Y: u16 = 60;
pub const ROW_STEP: u16 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedText {
    pub x: u16,
    pub y: u16,
    pub font_size: u8,
    pub align: Align,
    pub text: String,
}

fn centered(y: u16, font_size: u8, text: impl Into<String>) -> PlacedText {
    PlacedText { x: PAGE_CENTER_X, y, font_size, align: Align::Center, text: text.into() }
}

fn left(x: u16, y: u16, font_size: u8, text: impl Into<String>) -> PlacedText {
    PlacedText { x, y, font_size, align: Align::Left, text: text.into() }
}

pub struct Decree;

impl Decree {
    pub fn file_name(fine: &Fine) -> String {
        format!("Постановление_{}.txt", fine.violation_number)
    }

    pub fn rows(fine: &Fine) -> Vec<(&'static str, String)> {
        let description = if fine.description.trim().is_empty() {
            "-".to_string()
        } else {
            fine.description.clone()
        };
        vec![
            ("Водитель:", fine.driver_name.clone()),
            ("Транспортное средство:", fine.license_plate.clone()),
            ("Нарушение:", fine.violation_type.clone()),
            ("Дата нарушения:", locale::format_date(fine.violation_date)),
            ("Место нарушения:", fine.location.clone()),
            ("Сумма штрафа:", locale::format_rub(fine.amount)),
            ("Статус:", fine.status.as_str().to_string()),
            ("Описание:", description),
        ]
    }

    pub fn layout(fine: &Fine, printed_at: NaiveDateTime) -> Vec<PlacedText> {
        let mut out = vec![
            centered(20, 18, "ПОСТАНОВЛЕНИЕ"),
            centered(28, 18, "по делу об административном правонарушении"),
            centered(40, 12, format!("№ {}", fine.violation_number)),
        ];
        let mut y = FIRST_ROW_Y;
        for (label, value) in Self::rows(fine) {
            out.push(left(LABEL_X, y, 10, label));
            out.push(left(VALUE_X, y, 10, value));
            y += ROW_STEP;
        }
        out.push(left(LABEL_X, 280, 8, format!("Дата печати: {}", locale::format_timestamp(printed_at))));
        out.push(left(LABEL_X, 285, 8, "ГИБДД России"));
        out
    }
}

const TEXT_WIDTH: usize = 64;

impl crate::traits::WriteDocument for Decree {
    fn write<W: Write>(mut w: W, fine: &Fine, printed_at: NaiveDateTime) -> Result<()> {
        let layout = Self::layout(fine, printed_at);
        let mut i = 0;
        let mut prev_y = 0;
        while i < layout.len() {
            let item = &layout[i];
            if prev_y > 0 && item.y - prev_y > ROW_STEP {
                writeln!(w)?;
            }
            prev_y = item.y;
            match item.align {
                Align::Center => {
                    let pad = TEXT_WIDTH.saturating_sub(item.text.chars().count()) / 2;
                    writeln!(w, "{}{}", " ".repeat(pad), item.text)?;
                    i += 1;
                }
                // подпись и значение на одной строке: значение с колонки VALUE_X
                Align::Left => match layout.get(i + 1) {
                    Some(next) if next.y == item.y && next.x > item.x => {
                        writeln!(w, "{:<24}{}", item.text, next.text)?;
                        i += 2;
                    }
                    _ => {
                        writeln!(w, "{}", item.text)?;
                        i += 1;
                    }
                },
            }
        }
        Ok(())
    }
}
