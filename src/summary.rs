//! The join-and-aggregation core: every active unit resolved against the
//! full reference chain, then filled with one day of measurements and
//! outage annotations.

use std::collections::HashMap;

use crate::{
    api::{Measurement, OutageInformation},
    catalog::{Area, Catalog, Colors, FuelType, Group, Unit, UnitType},
    error::ReportError,
    prelude::*,
    units::Megawatts,
};

/// 30-minute slots per day.
pub const SLOTS_PER_DAY: usize = 48;

/// The one outage type name whose display width already matches; every
/// other type gets padded with a fullwidth space.
const UNPLANNED_OUTAGE: &str = "計画外停止";

/// One unit with its whole reference chain resolved, plus the day's
/// aggregates. Built atomically by [`summarize`]; the partitioner never
/// sees a partially resolved summary.
#[derive(Clone, Debug, bon::Builder)]
pub struct UnitSummary {
    pub area: Area,
    pub group: Group,
    pub unit: Unit,
    pub unit_type: UnitType,
    pub fuel_type: FuelType,
    pub colors: Colors,
    /// Generation per slot, ordered by slot index.
    #[builder(default)]
    pub generations: Vec<Megawatts>,
    #[builder(default)]
    pub outage_description: String,
}

/// Resolves every active unit into a [`UnitSummary`].
///
/// Any missing link in Unit→Group→Area or Unit→UnitType→FuelType→Colors
/// fails the whole run, and no partial list is returned.
pub fn summarize(catalog: &Catalog) -> Result<Vec<UnitSummary>, ReportError> {
    let groups: HashMap<u32, &Group> =
        catalog.groups.iter().map(|group| (group.group_id, group)).collect();
    let areas: HashMap<u32, &Area> = catalog.areas.iter().map(|area| (area.area_id, area)).collect();
    let unit_types: HashMap<u32, &UnitType> =
        catalog.unit_types.iter().map(|unit_type| (unit_type.unit_type_id, unit_type)).collect();
    let fuel_types: HashMap<u32, &FuelType> =
        catalog.fuel_types.iter().map(|fuel_type| (fuel_type.fuel_type_id, fuel_type)).collect();
    let colorss: HashMap<u32, &Colors> =
        catalog.colors.iter().map(|colors| (colors.colors_id, colors)).collect();

    catalog
        .active_units()
        .map(|unit| {
            let key = format!("{}/{}", unit.plant_name, unit.unit_name);
            let group = *groups
                .get(&unit.group_id)
                .ok_or_else(|| broken_link(&key, "group", unit.group_id))?;
            let area = *areas
                .get(&group.area_id)
                .ok_or_else(|| broken_link(&key, "area", group.area_id))?;
            let unit_type = *unit_types
                .get(&unit.unit_type_id)
                .ok_or_else(|| broken_link(&key, "unit type", unit.unit_type_id))?;
            let fuel_type = *fuel_types
                .get(&unit_type.fuel_type_id)
                .ok_or_else(|| broken_link(&key, "fuel type", unit_type.fuel_type_id))?;
            let colors = *colorss
                .get(&fuel_type.colors_id)
                .ok_or_else(|| broken_link(&key, "colors", fuel_type.colors_id))?;
            Ok(UnitSummary::builder()
                .area(area.clone())
                .group(group.clone())
                .unit(unit.clone())
                .unit_type(unit_type.clone())
                .fuel_type(fuel_type.clone())
                .colors(colors.clone())
                .build())
        })
        .collect()
}

fn broken_link(unit_key: &str, to_kind: &str, id: u32) -> ReportError {
    ReportError::ReferenceIntegrity(format!(
        "unit `{unit_key}` references a missing {to_kind} (id {id})"
    ))
}

/// Fills `generations` from the day's measurements.
///
/// Measurements are sorted by `measured_at` first, so the slot order holds
/// regardless of input order. A measurement matching no summary is dropped
/// when it reads zero and fails the run otherwise.
pub fn insert_generations(
    summaries: &mut [UnitSummary],
    mut measurements: Vec<Measurement>,
) -> Result<(), ReportError> {
    measurements.sort_by_key(|measurement| measurement.measured_at);
    let index: HashMap<(String, String), usize> = summaries
        .iter()
        .enumerate()
        .map(|(i, summary)| {
            ((summary.unit.plant_name.clone(), summary.unit.unit_name.clone()), i)
        })
        .collect();
    for measurement in measurements {
        let key = (measurement.plant_name, measurement.unit_name);
        if let Some(&i) = index.get(&key) {
            summaries[i].generations.push(measurement.measurements.to_megawatts());
        } else if measurement.measurements.0 == 0 {
            trace!(plant_name = %key.0, unit_name = %key.1, "Dropping a zero reading for an untracked unit");
        } else {
            return Err(ReportError::UnmatchedMeasurement {
                plant_name: key.0,
                unit_name: key.1,
            });
        }
    }
    Ok(())
}

/// Attaches outage notes, matching `(plant_name, unit_name)` tolerantly of
/// the portal's mixed hyphen glyphs. Records apply in `updated_at` order,
/// so the latest one wins.
pub fn insert_outage_descriptions(
    summaries: &mut [UnitSummary],
    mut outages: Vec<OutageInformation>,
) {
    outages.sort_by_key(|outage| outage.updated_at);
    for outage in &outages {
        for summary in summaries.iter_mut() {
            if hyphen_equal(&summary.unit.plant_name, &outage.plant_name)
                && hyphen_equal(&summary.unit.unit_name, &outage.unit_name)
            {
                summary.outage_description = compose_outage_description(outage);
            }
        }
    }
}

fn compose_outage_description(outage: &OutageInformation) -> String {
    let mut description = outage.shutdown_type_name.clone();
    if outage.shutdown_type_name != UNPLANNED_OUTAGE {
        description.push('　');
    }
    description.push_str(&format!(
        ":{} {}～{}",
        outage.shutdown_detail, outage.stopped_at, outage.will_restarted_at
    ));
    description
}

/// Hyphen glyphs the source data uses interchangeably for the same unit.
const HYPHENS: [char; 3] = ['-', 'ー', '－'];

/// Equality up to hyphen glyph choice.
#[must_use]
pub fn hyphen_equal(a: &str, b: &str) -> bool {
    fn fold(s: &str) -> String {
        s.chars().map(|c| if HYPHENS.contains(&c) { '-' } else { c }).collect()
    }
    a == b || fold(a) == fold(b)
}
