//! Вывод таблиц и сводок в терминал.

use chrono::NaiveDateTime;
use finecrmlib::{
    analytics::Analytics,
    gibdd::GibddCheck,
    locale::{format_date, format_rub, format_timestamp},
    model::{DeletedFine, Fine, ParkingPass, PlateLookup, VinLookup},
    notifications::{Inbox, NotificationKind},
    registry::{Driver, Vehicle},
    stats::{ChartSeries, FineStats},
    view_model::FineViewModel,
};

pub fn fines<'a>(fines: impl IntoIterator<Item = &'a Fine>) {
    println!(
        "{:>5}  {:<14} {:<28} {:<11} {:<30} {:<10} {:>12}  {}",
        "ID", "Номер", "Водитель", "ТС", "Нарушение", "Дата", "Сумма", "Статус"
    );
    let mut n = 0;
    for f in fines {
        println!(
            "{:>5}  {:<14} {:<28} {:<11} {:<30} {:<10} {:>12}  {}",
            f.id,
            f.violation_number,
            f.driver_name,
            f.license_plate,
            f.violation_type,
            format_date(f.violation_date),
            format_rub(f.amount),
            f.status
        );
        n += 1;
    }
    println!("Найдено: {n}");
}

pub fn stats(stats: &FineStats, charts: &ChartSeries) {
    println!("Всего штрафов: {}", stats.total);
    println!("Не оплачено:   {}", stats.unpaid);
    println!("Оплачено:      {}", stats.paid);
    println!("Общая сумма:   {}", format_rub(stats.total_amount));
    println!();
    println!("По типам нарушений:");
    for c in &charts.by_violation_type {
        println!("  {:<36} {}", c.name, c.count);
    }
    println!("По статусам:");
    for c in &charts.by_status {
        println!("  {:<36} {}", c.name, c.count);
    }
}

pub fn history(items: &[DeletedFine]) {
    if items.is_empty() {
        println!("История удалений пуста");
        return;
    }
    for h in items {
        println!(
            "{} | {} | {} | {} | удалил: {} | {} | {}",
            h.fine.violation_number,
            h.fine.driver_name,
            h.fine.license_plate,
            format_rub(h.fine.amount),
            h.deleted_by,
            format_timestamp(h.deleted_at),
            h.reason.as_deref().unwrap_or("-")
        );
    }
}

pub fn passes(passes: &[ParkingPass], now: NaiveDateTime) {
    for p in passes {
        println!(
            "{:>4}  {:<18} {:<11} {:<28} до {}  {:<15} {}",
            p.id,
            p.pass_number,
            p.license_plate,
            p.driver_name,
            format_timestamp(p.valid_until),
            p.zone.label(),
            p.status_at(now)
        );
    }
    println!("Пропусков: {}", passes.len());
}

pub fn vin(result: &VinLookup) {
    match result {
        VinLookup::Found(v) => {
            println!("Автомобиль найден: {} {} ({})", v.brand, v.model, v.year.map_or("-".into(), |y| y.to_string()));
            println!("Госномер:  {}", v.license_plate);
            println!("Цвет:      {}", v.color);
            println!("Владелец:  {}", v.owner_name);
            if let Some(d) = v.insurance_valid_until {
                println!("ОСАГО до:  {}", format_date(d));
            }
        }
        VinLookup::NotFound => println!("Не найдено: автомобиль не найден в базе"),
    }
}

pub fn plate(result: &PlateLookup) {
    match result {
        PlateLookup::Found(v) => {
            println!("{} {} {} ({})", v.license_plate, v.brand, v.model, v.year.map_or("-".into(), |y| y.to_string()));
            if let Some(vin) = &v.vin {
                println!("VIN:       {vin}");
            }
            if let Some(owner) = &v.owner {
                println!("Владелец:  {}", owner.name);
            }
            println!("Штрафов:   {}, не оплачено на {}", v.fines.count, format_rub(v.fines.unpaid_amount));
        }
        PlateLookup::NotFound => println!("Не найдено: ТС не найдено в базе"),
    }
}

pub fn gibdd(check: &GibddCheck) {
    println!("ВУ {}, СТС {}", check.license_number, check.sts_number);
    if check.found_fines == 0 {
        println!("Штрафы не найдены");
    } else {
        println!("Найдено штрафов: {}", check.found_fines);
        for f in &check.fines {
            println!(
                "  {:<14} {:<10} {:<40} {:>12}  {}",
                f.uin_number,
                format_date(f.violation_date),
                f.violation_type,
                format_rub(f.amount),
                f.status
            );
            if f.discount {
                println!("  {:<14} доступна скидка 50%: {}", "", format_rub(f.discount_amount));
            }
        }
        println!("Итого: {}", format_rub(check.total_amount));
        if check.has_discount() {
            println!("Со скидкой: {}", format_rub(check.total_with_discount));
        }
    }
    println!("Источник: {}, {}", check.source, format_timestamp(check.checked_at));
}

pub fn inbox(inbox: &Inbox) {
    println!("Непрочитанных: {}", inbox.unread_count());
    for n in inbox.items() {
        let mark = match n.kind {
            NotificationKind::Discount => "скидка",
            NotificationKind::Overdue => "просрочка",
        };
        let read = if n.read { " " } else { "*" };
        println!("{read} [{}] {:<10} {}: {}", n.id, mark, n.title, n.message);
    }
}

pub fn analytics(a: &Analytics) {
    println!("Всего штрафов:      {}", a.total_fines);
    println!("Общая сумма:        {}", format_rub(a.total_amount));
    println!("Оплачено:           {}", a.paid_fines);
    println!("Не оплачено на:     {}", format_rub(a.unpaid_amount));
    println!();
    println!("Штрафы и поступления за 30 дней:");
    for (count, revenue) in a.daily_fines.iter().zip(&a.daily_revenue) {
        if count.value > 0 || !revenue.value.is_zero() {
            println!("  {}  {:>3}  {}", count.label(), count.value, format_rub(revenue.value));
        }
    }
    println!("Топ нарушителей:");
    for v in &a.top_violators {
        println!("  {:<48} {}", v.name, v.count);
    }
}

pub fn drivers<'a>(drivers: impl IntoIterator<Item = &'a Driver>, vm: Option<&FineViewModel>) {
    for d in drivers {
        let violations = vm.map(|vm| vm.index().driver_count(&d.name));
        println!(
            "{:>4}  {:<32} {:<14} {:<20} нарушений: {}",
            d.id,
            d.name,
            d.license_number,
            d.phone,
            violations.map_or("-".into(), |n| n.to_string())
        );
    }
}

pub fn vehicles<'a>(vehicles: impl IntoIterator<Item = &'a Vehicle>, vm: Option<&FineViewModel>) {
    for v in vehicles {
        let violations = vm.map(|vm| vm.index().plate_count(&v.license_plate));
        println!(
            "{:>4}  {:<11} {:<10} {:<10} {:<6} {:<10} {:<32} нарушений: {}",
            v.id,
            v.license_plate,
            v.brand,
            v.model,
            v.year.map_or("-".into(), |y| y.to_string()),
            v.color,
            v.owner,
            violations.map_or("-".into(), |n| n.to_string())
        );
    }
}
