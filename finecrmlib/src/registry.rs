//! Локальные справочники водителей и ТС и индекс штрафов по ним.

use crate::{
    error::{FinecrmError, Result},
    model::Fine,
    wire,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Позиции штрафов по водителю и по госномеру. Строится один раз
/// на загрузку списка; удалённые штрафы не индексируются.
#[derive(Debug, Clone, Default)]
pub struct FineIndex {
    by_driver: HashMap<String, Vec<usize>>,
    by_plate: HashMap<String, Vec<usize>>,
}

fn key(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl FineIndex {
    pub fn build(fines: &[Fine]) -> Self {
        let mut idx = FineIndex::default();
        for (pos, f) in fines.iter().enumerate().filter(|(_, f)| !f.is_deleted()) {
            if !f.driver_name.trim().is_empty() {
                idx.by_driver.entry(key(&f.driver_name)).or_default().push(pos);
            }
            if !f.license_plate.trim().is_empty() {
                idx.by_plate.entry(key(&f.license_plate)).or_default().push(pos);
            }
        }
        idx
    }

    /// `fines`: тот же срез, по которому строился индекс.
    pub fn for_driver<'a>(&self, fines: &'a [Fine], name: &str) -> Vec<&'a Fine> {
        Self::collect(&self.by_driver, fines, name)
    }

    pub fn for_plate<'a>(&self, fines: &'a [Fine], plate: &str) -> Vec<&'a Fine> {
        Self::collect(&self.by_plate, fines, plate)
    }

    pub fn driver_count(&self, name: &str) -> usize {
        self.by_driver.get(&key(name)).map_or(0, Vec::len)
    }

    pub fn plate_count(&self, plate: &str) -> usize {
        self.by_plate.get(&key(plate)).map_or(0, Vec::len)
    }

    fn collect<'a>(map: &HashMap<String, Vec<usize>>, fines: &'a [Fine], k: &str) -> Vec<&'a Fine> {
        map.get(&key(k))
            .map(|positions| positions.iter().filter_map(|&p| fines.get(p)).collect())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: u64,
    pub name: String,
    pub license_number: String,
    #[serde(default, with = "wire::date_option", skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewDriver {
    pub name: String,
    pub license_number: String,
    pub birth_date: Option<NaiveDate>,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: u64,
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub owner: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewVehicle {
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub year: Option<u16>,
    pub color: String,
    pub owner: String,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct DriverRegistry {
    drivers: Vec<Driver>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::seeded()
    }
}

impl DriverRegistry {
    pub fn seeded() -> Self {
        DriverRegistry {
            drivers: vec![
                Driver {
                    id: 1,
                    name: "Иванов Иван Иванович".into(),
                    license_number: "77 АА 123456".into(),
                    birth_date: NaiveDate::from_ymd_opt(1985, 6, 15),
                    phone: "+7 (999) 123-45-67".into(),
                    address: "г. Москва, ул. Ленина, д. 10".into(),
                },
                Driver {
                    id: 2,
                    name: "Петров Петр Петрович".into(),
                    license_number: "99 ВВ 654321".into(),
                    birth_date: NaiveDate::from_ymd_opt(1990, 3, 20),
                    phone: "+7 (999) 765-43-21".into(),
                    address: "г. Санкт-Петербург, пр. Невский, д. 25".into(),
                },
            ],
        }
    }

    pub fn list(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn get(&self, id: u64) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.id == id)
    }

    pub fn search(&self, term: &str) -> Vec<&Driver> {
        let needle = term.trim().to_lowercase();
        self.drivers
            .iter()
            .filter(|d| contains_ci(&d.name, &needle) || contains_ci(&d.license_number, &needle))
            .collect()
    }

    pub fn add(&mut self, new: NewDriver) -> Result<&Driver> {
        if new.name.trim().is_empty() || new.license_number.trim().is_empty() {
            return Err(FinecrmError::Validation(
                "заполните обязательные поля: ФИО, номер удостоверения".into(),
            ));
        }
        let id = self.drivers.iter().map(|d| d.id).max().unwrap_or(0) + 1;
        self.drivers.push(Driver {
            id,
            name: new.name.trim().to_string(),
            license_number: new.license_number.trim().to_string(),
            birth_date: new.birth_date,
            phone: new.phone,
            address: new.address,
        });
        Ok(&self.drivers[self.drivers.len() - 1])
    }

    pub fn remove(&mut self, id: u64) -> Result<Driver> {
        let pos = self
            .drivers
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| FinecrmError::NotFound { entity: "driver", id: id.to_string() })?;
        Ok(self.drivers.remove(pos))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct VehicleRegistry {
    vehicles: Vec<Vehicle>,
}

impl Default for VehicleRegistry {
    fn default() -> Self {
        Self::seeded()
    }
}

impl VehicleRegistry {
    pub fn seeded() -> Self {
        VehicleRegistry {
            vehicles: vec![
                Vehicle {
                    id: 1,
                    license_plate: "А123БВ777".into(),
                    brand: "Toyota".into(),
                    model: "Camry".into(),
                    year: Some(2020),
                    color: "Черный".into(),
                    owner: "Иванов Иван Иванович".into(),
                },
                Vehicle {
                    id: 2,
                    license_plate: "В456ГД199".into(),
                    brand: "BMW".into(),
                    model: "X5".into(),
                    year: Some(2019),
                    color: "Белый".into(),
                    owner: "Петров Петр Петрович".into(),
                },
            ],
        }
    }

    pub fn list(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn get(&self, id: u64) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn search(&self, term: &str) -> Vec<&Vehicle> {
        let needle = term.trim().to_lowercase();
        self.vehicles
            .iter()
            .filter(|v| {
                contains_ci(&v.license_plate, &needle)
                    || contains_ci(&v.brand, &needle)
                    || contains_ci(&v.model, &needle)
                    || contains_ci(&v.owner, &needle)
            })
            .collect()
    }

    pub fn add(&mut self, new: NewVehicle) -> Result<&Vehicle> {
        if new.license_plate.trim().is_empty() || new.brand.trim().is_empty() || new.model.trim().is_empty() {
            return Err(FinecrmError::Validation(
                "заполните обязательные поля: госномер, марка, модель".into(),
            ));
        }
        let plate = new.license_plate.trim().to_uppercase();
        if self.vehicles.iter().any(|v| key(&v.license_plate) == key(&plate)) {
            return Err(FinecrmError::Validation(format!("ТС с номером {plate} уже есть в базе")));
        }
        let id = self.vehicles.iter().map(|v| v.id).max().unwrap_or(0) + 1;
        self.vehicles.push(Vehicle {
            id,
            license_plate: plate,
            brand: new.brand.trim().to_string(),
            model: new.model.trim().to_string(),
            year: new.year,
            color: new.color,
            owner: new.owner,
        });
        Ok(&self.vehicles[self.vehicles.len() - 1])
    }

    pub fn remove(&mut self, id: u64) -> Result<Vehicle> {
        let pos = self
            .vehicles
            .iter()
            .position(|v| v.id == id)
            .ok_or_else(|| FinecrmError::NotFound { entity: "vehicle", id: id.to_string() })?;
        Ok(self.vehicles.remove(pos))
    }
}
