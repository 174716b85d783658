//! The chart partitioner: turns the joined summaries into a deterministic
//! image layout and a deterministic sequence of posts.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::{
    catalog::{Catalog, Group},
    error::ReportError,
    summary::{SLOTS_PER_DAY, UnitSummary},
    units::Megawatts,
};

/// Chart slots per image.
#[derive(Copy, Clone, Debug)]
pub struct GridSpec {
    pub rows: usize,
    pub cols: usize,
}

impl GridSpec {
    #[must_use]
    pub const fn capacity(self) -> usize {
        self.rows * self.cols
    }

    /// Panel index for the j-th group of an image.
    ///
    /// Panels are numbered row-major; groups fill column-major so the
    /// charts read vertically.
    #[must_use]
    pub const fn position(self, j: usize) -> usize {
        (j % self.rows) * self.cols + j / self.rows
    }
}

/// One unit's band within a stacked chart.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitStack {
    pub label: String,
    pub color: String,
    /// Exactly [`SLOTS_PER_DAY`] values, zero-padded.
    pub generations: Vec<Megawatts>,
}

/// One chart cell: a group's stacked units and its authorized capacity.
#[derive(Clone, Debug)]
pub struct GroupChart {
    pub title: String,
    /// Row-major panel index within the image.
    pub panel: usize,
    /// Bands in draw order, bottom to top. The sequence is the reverse of
    /// catalog order, so the first-declared unit draws on top and leads
    /// the legend.
    pub stacks: Vec<UnitStack>,
    pub authorized_capacity: Megawatts,
    pub outage_notes: Vec<String>,
}

/// One image to render.
#[derive(Clone, Debug)]
pub struct ImagePlan {
    pub index: usize,
    pub area_name: String,
    pub path: PathBuf,
    pub charts: Vec<GroupChart>,
}

/// One status in the thread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Post {
    pub caption: String,
    pub images: Vec<PathBuf>,
}

/// The deterministic image and post layout for one day.
#[derive(Clone, Debug)]
pub struct PostingPlan {
    pub images: Vec<ImagePlan>,
    pub posts: Vec<Post>,
}

/// Lays out one day: per-area images in ascending `area_id` order, groups
/// paginated into grids of `grid.capacity()`, images numbered globally,
/// then consecutive areas merged into posts up to `media_cap` images each.
pub fn build_plan(
    catalog: &Catalog,
    summaries: &[UnitSummary],
    date: NaiveDate,
    image_dir: &Path,
    grid: GridSpec,
    media_cap: usize,
) -> Result<PostingPlan, ReportError> {
    let active_groups = catalog.active_groups();
    let mut images = Vec::new();
    let mut batches = Vec::new();

    for area in &catalog.areas {
        let area_groups: Vec<&Group> =
            active_groups.iter().copied().filter(|group| group.area_id == area.area_id).collect();
        if area_groups.is_empty() {
            continue;
        }
        let mut area_image_paths = Vec::new();
        for chunk in area_groups.chunks(grid.capacity()) {
            let index = images.len();
            let path = image_dir.join(format!("{index:02}.png"));
            let charts = chunk
                .iter()
                .enumerate()
                .map(|(j, group)| build_group_chart(group, summaries, grid.position(j)))
                .collect::<Result<Vec<_>, _>>()?;
            images.push(ImagePlan { index, area_name: area.name.clone(), path: path.clone(), charts });
            area_image_paths.push(path);
        }
        batches.push((format!("{} {date}のユニット別発電実績", area.name), area_image_paths));
    }

    Ok(PostingPlan { images, posts: merge_batches(batches, media_cap) })
}

fn build_group_chart(
    group: &Group,
    summaries: &[UnitSummary],
    panel: usize,
) -> Result<GroupChart, ReportError> {
    let members: Vec<&UnitSummary> =
        summaries.iter().filter(|summary| summary.group.group_id == group.group_id).collect();

    let mut used_colors: Vec<&str> = Vec::new();
    let mut stacks = Vec::with_capacity(members.len());
    let mut outage_notes = Vec::new();
    for summary in &members {
        let color = summary
            .colors
            .color_codes
            .iter()
            .find(|code| !used_colors.contains(&code.as_str()))
            .ok_or_else(|| ReportError::PaletteExhausted {
                group: group.name.clone(),
                colors: summary.colors.name.clone(),
                unit: summary.unit.unit_name.clone(),
            })?;
        used_colors.push(color.as_str());

        let mut generations = summary.generations.clone();
        generations.resize(SLOTS_PER_DAY, Megawatts::ZERO);
        stacks.push(UnitStack { label: label_for(summary), color: color.clone(), generations });

        if !summary.outage_description.is_empty() {
            outage_notes.push(format!(
                "{}:{}",
                summary.unit.name.replace('\n', ""),
                summary.outage_description
            ));
        }
    }
    // The first-declared unit goes on top of the stack.
    stacks.reverse();

    let authorized_capacity =
        members.iter().map(|summary| summary.unit.power.to_megawatts()).sum();
    Ok(GroupChart { title: group.name.clone(), panel, stacks, authorized_capacity, outage_notes })
}

fn label_for(summary: &UnitSummary) -> String {
    if summary.unit.name.is_empty() {
        summary.unit_type.name.clone()
    } else {
        format!("{}:{}", summary.unit.name, summary.unit_type.name)
    }
}

/// Greedy forward-adjacent merge: an area joins the previous post only when
/// its images still fit under the cap; captions are newline-joined. This is
/// deliberately not optimal bin packing.
fn merge_batches(batches: Vec<(String, Vec<PathBuf>)>, media_cap: usize) -> Vec<Post> {
    let mut posts: Vec<Post> = Vec::new();
    for (caption, images) in batches {
        match posts.last_mut() {
            Some(last) if last.images.len() + images.len() <= media_cap => {
                last.caption.push('\n');
                last.caption.push_str(&caption);
                last.images.extend(images);
            }
            _ => posts.push(Post { caption, images }),
        }
    }
    posts
}
