//! comfy-table builders for the `inspect` subcommands.

use comfy_table::{Cell, CellAlignment, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    api::{Measurement, OutageInformation},
    partition::PostingPlan,
    summary::UnitSummary,
};

#[must_use]
pub fn build_catalog_table(summaries: &[UnitSummary]) -> Table {
    let mut table = new_table(vec!["Area", "Group", "Plant", "Unit", "Type", "Fuel", "Authorized"]);
    for summary in summaries {
        table.add_row(vec![
            Cell::new(&summary.area.name),
            Cell::new(&summary.group.name),
            Cell::new(&summary.unit.plant_name),
            Cell::new(&summary.unit.unit_name),
            Cell::new(&summary.unit_type.name),
            Cell::new(&summary.fuel_type.name),
            Cell::new(summary.unit.power.to_megawatts()).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn build_measurement_totals_table(measurements: &[Measurement]) -> Table {
    let mut table = new_table(vec!["Plant", "Unit", "Slots", "Total"]);
    let by_unit =
        measurements.iter().into_group_map_by(|measurement| {
            (&measurement.plant_name, &measurement.unit_name)
        });
    for ((plant_name, unit_name), rows) in
        by_unit.into_iter().sorted_by(|lhs, rhs| lhs.0.cmp(&rhs.0))
    {
        let total_kwh: i64 = rows.iter().map(|measurement| measurement.measurements.0).sum();
        table.add_row(vec![
            Cell::new(plant_name),
            Cell::new(unit_name),
            Cell::new(rows.len()).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.1} MWh", total_kwh as f64 / 1000.0))
                .set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

#[must_use]
pub fn build_outage_table(outages: &[OutageInformation]) -> Table {
    let mut table =
        new_table(vec!["Plant", "Unit", "Type", "Detail", "Stopped", "Restart", "Updated"]);
    for outage in outages {
        table.add_row(vec![
            Cell::new(&outage.plant_name),
            Cell::new(&outage.unit_name),
            Cell::new(&outage.shutdown_type_name),
            Cell::new(&outage.shutdown_detail),
            Cell::new(&outage.stopped_at),
            Cell::new(&outage.will_restarted_at),
            Cell::new(outage.updated_at.format("%Y/%m/%d %H:%M")),
        ]);
    }
    table
}

#[must_use]
pub fn build_plan_table(plan: &PostingPlan) -> Table {
    let mut table = new_table(vec!["Post", "Caption", "Images"]);
    for (index, post) in plan.posts.iter().enumerate() {
        let images = post
            .images
            .iter()
            .map(|path| path.file_name().map_or_else(String::new, |name| name.to_string_lossy().into_owned()))
            .join(" ");
        table.add_row(vec![
            Cell::new(index).set_alignment(CellAlignment::Right),
            Cell::new(&post.caption),
            Cell::new(images),
        ]);
    }
    table
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(header);
    table
}
