//! Фильтры таблицы штрафов.

use crate::{
    error::Result,
    model::{Fine, FineStatus},
};

/// Значение фильтра: «все» либо конкретное значение.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(v) => v == value,
        }
    }
}

impl<T> Selection<T> {
    /// `"all"` или пустая строка: без ограничения, иначе разбор значения.
    pub fn parse_with<F>(s: &str, parse: F) -> Result<Self>
    where
        F: FnOnce(&str) -> Result<T>,
    {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            Ok(Selection::All)
        } else {
            parse(s).map(Selection::Only)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filters {
    pub search_term: String,
    pub status: Selection<FineStatus>,
    pub violation_type: Selection<String>,
}

/// Частичное изменение фильтров: `None` оставляет поле как есть.
#[derive(Debug, Clone, Default)]
pub struct FilterPatch {
    pub search_term: Option<String>,
    pub status: Option<Selection<FineStatus>>,
    pub violation_type: Option<Selection<String>>,
}

impl Filters {
    pub fn apply_patch(&mut self, patch: FilterPatch) {
        if let Some(term) = patch.search_term {
            self.search_term = term;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(kind) = patch.violation_type {
            self.violation_type = kind;
        }
    }

    /// Удалённые записи не проходят никогда.
    pub fn matches(&self, fine: &Fine) -> bool {
        self.admits(fine, &self.search_term.to_lowercase())
    }

    /// Порядок входа сохраняется.
    pub fn apply<'a>(&self, fines: &'a [Fine]) -> Vec<&'a Fine> {
        let needle = self.search_term.to_lowercase();
        fines.iter().filter(|f| self.admits(f, &needle)).collect()
    }

    fn admits(&self, fine: &Fine, needle: &str) -> bool {
        !fine.is_deleted()
            && matches_search(fine, needle)
            && self.status.admits(&fine.status)
            && self.violation_type.admits(&fine.violation_type)
    }
}

fn matches_search(fine: &Fine, needle: &str) -> bool {
    needle.is_empty()
        || fine.violation_number.to_lowercase().contains(needle)
        || fine.driver_name.to_lowercase().contains(needle)
        || fine.license_plate.to_lowercase().contains(needle)
}
