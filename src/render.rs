//! Draws one PNG per [`ImagePlan`]. Only layout niceties live here; panel
//! order, stack order, and colors are all decided by the partitioner.

use plotters::{coord::Shift, prelude::*};

use crate::{
    partition::{GroupChart, GridSpec, ImagePlan},
    prelude::*,
    summary::SLOTS_PER_DAY,
};

/// 16:9, roomy enough for a 4×3 grid.
const IMAGE_SIZE: (u32, u32) = (2400, 1350);
const TITLE_HEIGHT: i32 = 70;
const CITATION: &str = "出典: 電力広域的運営推進機関 ユニット別発電実績公開システム";

type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

#[expect(clippy::cast_possible_wrap)]
pub fn render_image(plan: &ImagePlan, grid: GridSpec) -> Result {
    let root = BitMapBackend::new(&plan.path, IMAGE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    root.draw(&Text::new(plan.area_name.clone(), (40, 15), ("sans-serif", 40)))?;
    root.draw(&Text::new(
        CITATION,
        (40, IMAGE_SIZE.1 as i32 - 28),
        ("sans-serif", 20).into_font().color(&BLACK.mix(0.6)),
    ))?;

    let (_, grid_area) = root.split_vertically(TITLE_HEIGHT);
    let panels = grid_area.split_evenly((grid.rows, grid.cols));
    for chart in &plan.charts {
        let panel = panels
            .get(chart.panel)
            .with_context(|| format!("panel {} is out of the {}×{} grid", chart.panel, grid.rows, grid.cols))?;
        draw_group_chart(panel, chart)
            .with_context(|| format!("failed to draw `{}`", chart.title))?;
    }

    root.present().with_context(|| format!("failed to write `{}`", plan.path.display()))?;
    Ok(())
}

#[expect(clippy::cast_precision_loss)]
fn draw_group_chart(panel: &Panel<'_>, chart: &GroupChart) -> Result {
    let capacity = chart.authorized_capacity.0;
    let y_max = (capacity * 1.05).max(1.0);

    let mut context = ChartBuilder::on(panel)
        .caption(&chart.title, ("sans-serif", 22))
        .margin(8)
        .x_label_area_size(24)
        .y_label_area_size(52)
        .build_cartesian_2d(0..SLOTS_PER_DAY, 0f64..y_max)?;
    context
        .configure_mesh()
        .disable_mesh()
        .x_labels(5)
        .x_label_formatter(&|slot| format!("{:02}:{:02}", slot / 2, slot % 2 * 30))
        .y_desc("MW")
        .draw()?;

    // Running totals, bottom band first.
    let mut level = vec![0.0_f64; SLOTS_PER_DAY];
    let mut series = Vec::with_capacity(chart.stacks.len());
    for stack in &chart.stacks {
        for (slot, value) in stack.generations.iter().enumerate() {
            level[slot] += value.0;
        }
        series.push((stack.label.clone(), parse_color(&stack.color)?, level.clone()));
    }
    // Drawn from the top band down, so each later area covers the region
    // below it and the legend leads with the first-declared unit.
    for (label, color, values) in series.iter().rev() {
        let color = *color;
        context
            .draw_series(
                AreaSeries::new(values.iter().copied().enumerate(), 0.0, color.filled())
                    .border_style(BLACK.stroke_width(1)),
            )?
            .label(label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }

    context.draw_series(LineSeries::new(
        (0..SLOTS_PER_DAY).map(|slot| (slot, capacity)),
        RGBColor(128, 128, 128).stroke_width(2),
    ))?;

    for (i, note) in chart.outage_notes.iter().enumerate() {
        let y = y_max * (0.9 - 0.08 * i as f64);
        context.draw_series(std::iter::once(Text::new(
            note.clone(),
            (1, y),
            ("sans-serif", 16).into_font().color(&RED),
        )))?;
    }

    if !chart.stacks.is_empty() {
        context
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }
    Ok(())
}

#[expect(clippy::cast_possible_truncation)]
fn parse_color(code: &str) -> Result<RGBColor> {
    let hex = code.strip_prefix('#').context("color code misses the `#` prefix")?;
    ensure!(hex.len() == 6, "color code `{code}` is not `#rrggbb`");
    let value = u32::from_str_radix(hex, 16).with_context(|| format!("bad color code `{code}`"))?;
    Ok(RGBColor((value >> 16) as u8, (value >> 8) as u8, value as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() -> Result {
        assert_eq!(parse_color("#d7003a")?, RGBColor(0xd7, 0x00, 0x3a));
        assert_eq!(parse_color("#ffffff")?, RGBColor(255, 255, 255));
        Ok(())
    }

    #[test]
    fn test_parse_color_rejects_malformed_codes() {
        assert!(parse_color("d7003a").is_err());
        assert!(parse_color("#d7003").is_err());
        assert!(parse_color("#zzzzzz").is_err());
    }
}
