//! The reference data set: who generates what, where, and in which color.
//!
//! Everything here is data-driven: taxonomy changes are edits to the
//! `json_data` files, never code changes.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{error::ReportError, units::TenThousandKilowatts};

/// A regional balancing area.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Area {
    pub area_id: u32,
    pub name: String,
}

/// The display grouping, roughly a plant or a plant cluster.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Group {
    pub group_id: u32,
    pub area_id: u32,
    pub name: String,
}

/// A single generation asset. Portal rows are matched against it by the
/// `(plant_name, unit_name)` pair.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Unit {
    pub group_id: u32,
    pub unit_type_id: u32,
    pub plant_name: String,
    pub unit_name: String,
    /// Legend name; may be empty for single-unit plants.
    pub name: String,
    pub power: TenThousandKilowatts,
    #[serde(default)]
    pub long_term_shutdown: bool,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct UnitType {
    pub unit_type_id: u32,
    pub fuel_type_id: u32,
    pub name: String,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FuelType {
    pub fuel_type_id: u32,
    pub colors_id: u32,
    pub name: String,
}

/// An ordered palette keeping same-fuel units apart within one chart.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Colors {
    pub colors_id: u32,
    pub name: String,
    pub color_codes: Vec<String>,
}

/// The immutable reference catalog.
///
/// Areas are sorted by ascending `area_id` at load time; that order drives
/// image and post order. Groups and units keep file order.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    pub areas: Vec<Area>,
    pub groups: Vec<Group>,
    pub units: Vec<Unit>,
    pub unit_types: Vec<UnitType>,
    pub fuel_types: Vec<FuelType>,
    pub colors: Vec<Colors>,
}

impl Catalog {
    pub fn load(dir: &Path) -> Result<Self, ReportError> {
        let mut catalog = Self {
            areas: load_file(dir, "areas.json")?,
            groups: load_file(dir, "groups.json")?,
            units: load_file(dir, "units.json")?,
            unit_types: load_file(dir, "unit_types.json")?,
            fuel_types: load_file(dir, "fuel_types.json")?,
            colors: load_file(dir, "colors.json")?,
        };
        catalog.areas.sort_by_key(|area| area.area_id);
        Ok(catalog)
    }

    /// Units still in service.
    pub fn active_units(&self) -> impl Iterator<Item = &Unit> {
        self.units.iter().filter(|unit| !unit.long_term_shutdown)
    }

    /// Groups with at least one active unit, in file order.
    #[must_use]
    pub fn active_groups(&self) -> Vec<&Group> {
        self.groups
            .iter()
            .filter(|group| self.active_units().any(|unit| unit.group_id == group.group_id))
            .collect()
    }
}

fn load_file<T: serde::de::DeserializeOwned>(
    dir: &Path,
    name: &str,
) -> Result<Vec<T>, ReportError> {
    let path = dir.join(name);
    let contents = fs::read_to_string(&path).map_err(|error| ReportError::CatalogLoad {
        path: path.clone(),
        reason: error.to_string(),
    })?;
    serde_json::from_str(&contents)
        .map_err(|error| ReportError::CatalogLoad { path, reason: error.to_string() })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn shipped_data_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("json_data")
    }

    #[test]
    fn test_load_shipped_catalog() -> Result<(), ReportError> {
        let catalog = Catalog::load(&shipped_data_dir())?;
        assert!(!catalog.areas.is_empty());
        assert!(catalog.areas.windows(2).all(|pair| pair[0].area_id < pair[1].area_id));
        assert!(!catalog.units.is_empty());
        Ok(())
    }

    #[test]
    fn test_load_missing_directory_fails() {
        let result = Catalog::load(Path::new("no/such/dir"));
        assert!(matches!(result, Err(ReportError::CatalogLoad { .. })));
    }

    #[test]
    fn test_active_filtering() {
        let catalog = Catalog {
            areas: vec![Area { area_id: 1, name: "エリア".to_owned() }],
            groups: vec![
                Group { group_id: 1, area_id: 1, name: "稼働".to_owned() },
                Group { group_id: 2, area_id: 1, name: "全停".to_owned() },
            ],
            units: vec![
                unit(1, "A", "1号機", false),
                unit(1, "A", "2号機", true),
                unit(2, "B", "1号機", true),
            ],
            ..Catalog::default()
        };
        assert_eq!(catalog.active_units().count(), 1);
        let groups = catalog.active_groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group_id, 1);
    }

    fn unit(group_id: u32, plant_name: &str, unit_name: &str, long_term_shutdown: bool) -> Unit {
        Unit {
            group_id,
            unit_type_id: 1,
            plant_name: plant_name.to_owned(),
            unit_name: unit_name.to_owned(),
            name: unit_name.to_owned(),
            power: TenThousandKilowatts(100.0),
            long_term_shutdown,
        }
    }
}
