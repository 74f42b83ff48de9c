//! Уведомления по неоплаченным штрафам и настройки оповещений.

use crate::{
    error::{FinecrmError, Result},
    model::{Fine, FineStatus},
    payment,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// После стольких дней без оплаты штраф считается просроченным.
pub const OVERDUE_AFTER_DAYS: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Discount,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: NaiveDateTime,
    pub read: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub push_notifications: bool,
    pub discount_reminders: bool,
    pub payment_reminders: bool,
    pub new_fines_alert: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        NotificationSettings {
            email_notifications: true,
            sms_notifications: true,
            push_notifications: true,
            discount_reminders: true,
            payment_reminders: true,
            new_fines_alert: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    Email,
    Sms,
    Push,
    DiscountReminders,
    PaymentReminders,
    NewFinesAlert,
}

impl FromStr for SettingKey {
    type Err = FinecrmError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "email" => Ok(SettingKey::Email),
            "sms" => Ok(SettingKey::Sms),
            "push" => Ok(SettingKey::Push),
            "discount-reminders" => Ok(SettingKey::DiscountReminders),
            "payment-reminders" => Ok(SettingKey::PaymentReminders),
            "new-fines-alert" => Ok(SettingKey::NewFinesAlert),
            other => Err(FinecrmError::Parse(format!("unknown notification setting: {other}"))),
        }
    }
}

impl NotificationSettings {
    pub fn set(&mut self, key: SettingKey, value: bool) {
        let slot = match key {
            SettingKey::Email => &mut self.email_notifications,
            SettingKey::Sms => &mut self.sms_notifications,
            SettingKey::Push => &mut self.push_notifications,
            SettingKey::DiscountReminders => &mut self.discount_reminders,
            SettingKey::PaymentReminders => &mut self.payment_reminders,
            SettingKey::NewFinesAlert => &mut self.new_fines_alert,
        };
        *slot = value;
    }
}

/// Что пользователь уже прочитал или убрал; хранится между запусками.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboxMarks {
    #[serde(default)]
    pub read: BTreeSet<String>,
    #[serde(default)]
    pub dismissed: BTreeSet<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Inbox {
    items: Vec<Notification>,
}

impl Inbox {
    pub fn derive(fines: &[Fine], settings: &NotificationSettings, marks: &InboxMarks, now: NaiveDateTime) -> Self {
        let today = now.date();
        let mut items = Vec::new();
        for fine in fines.iter().filter(|f| f.status == FineStatus::Unpaid) {
            let days = payment::days_since(fine.violation_date, today);

            let discount_left = payment::discount_days_left(fine, today).filter(|_| settings.discount_reminders);
            if let Some(left) = discount_left {
                items.push(Notification {
                    id: format!("discount-{}", fine.id),
                    kind: NotificationKind::Discount,
                    title: "Доступна скидка 50%".into(),
                    message: format!(
                        "Штраф {} ({}) можно оплатить со скидкой. Осталось {} дней.",
                        fine.violation_number,
                        fine.violation_type,
                        left
                    ),
                    created_at: now,
                    read: false,
                });
            }

            if settings.payment_reminders && days > OVERDUE_AFTER_DAYS {
                items.push(Notification {
                    id: format!("overdue-{}", fine.id),
                    kind: NotificationKind::Overdue,
                    title: "Просроченный штраф".into(),
                    message: format!(
                        "Штраф {} ({}) не оплачен более {} дней. Возможны дополнительные санкции.",
                        fine.violation_number, fine.violation_type, OVERDUE_AFTER_DAYS
                    ),
                    created_at: now,
                    read: false,
                });
            }
        }

        items.retain(|n| !marks.dismissed.contains(&n.id));
        for n in &mut items {
            n.read = marks.read.contains(&n.id);
        }
        Inbox { items }
    }

    pub fn items(&self) -> &[Notification] {
        &self.items
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(&mut self, id: &str, marks: &mut InboxMarks) -> Result<()> {
        let n = self
            .items
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| FinecrmError::NotFound { entity: "notification", id: id.to_string() })?;
        n.read = true;
        marks.read.insert(n.id.clone());
        Ok(())
    }

    pub fn mark_all_read(&mut self, marks: &mut InboxMarks) {
        for n in &mut self.items {
            n.read = true;
            marks.read.insert(n.id.clone());
        }
    }

    pub fn dismiss(&mut self, id: &str, marks: &mut InboxMarks) -> Result<()> {
        let pos = self
            .items
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| FinecrmError::NotFound { entity: "notification", id: id.to_string() })?;
        let n = self.items.remove(pos);
        marks.dismissed.insert(n.id);
        Ok(())
    }
}
