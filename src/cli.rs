use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::{api, partition::GridSpec, prelude::*};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch the day, join it, chart it, and post the thread.
    Report(Box<ReportArgs>),

    /// Development tools.
    Inspect(Box<InspectArgs>),
}

#[derive(Parser)]
pub struct ReportArgs {
    /// Target date; defaults by the portal's publication time.
    #[clap(long, env = "TARGET_DATE")]
    pub date: Option<NaiveDate>,

    /// Do not post the thread (dry run).
    #[clap(long)]
    pub dry_run: bool,

    #[clap(flatten)]
    pub data: DataArgs,

    #[clap(flatten)]
    pub layout: LayoutArgs,

    #[clap(flatten)]
    pub poster: PosterArgs,
}

#[derive(Parser)]
pub struct DataArgs {
    /// Reference catalog directory.
    #[clap(long, default_value = "json_data", env = "CATALOG_DIR")]
    pub catalog_dir: PathBuf,

    /// Working directory for the rendered images, wiped every run.
    #[clap(long, default_value = "img", env = "IMAGE_DIR")]
    pub image_dir: PathBuf,
}

#[derive(Copy, Clone, Parser)]
pub struct LayoutArgs {
    /// Chart rows per image.
    #[clap(long, default_value = "4", env = "GRID_ROWS")]
    pub grid_rows: usize,

    /// Chart columns per image.
    #[clap(long, default_value = "3", env = "GRID_COLS")]
    pub grid_cols: usize,

    /// Maximum images per post.
    #[clap(long, default_value = "4", env = "MEDIA_PER_POST")]
    pub media_per_post: usize,
}

impl LayoutArgs {
    #[must_use]
    pub const fn grid(self) -> GridSpec {
        GridSpec { rows: self.grid_rows, cols: self.grid_cols }
    }
}

#[derive(Parser)]
pub struct PosterArgs {
    /// Mastodon instance base URL. For example: `https://mastodon.social`.
    #[clap(long = "mastodon-base-url", env = "MASTODON_BASE_URL")]
    pub base_url: Option<String>,

    /// Mastodon access token.
    #[clap(long = "mastodon-access-token", env = "MASTODON_ACCESS_TOKEN")]
    pub access_token: Option<String>,
}

impl PosterArgs {
    pub fn try_new_client(&self) -> Result<api::Mastodon> {
        let base_url = self.base_url.as_deref().context("`--mastodon-base-url` is not set")?;
        let access_token =
            self.access_token.as_deref().context("`--mastodon-access-token` is not set")?;
        api::Mastodon::try_new(base_url, access_token)
    }
}

#[derive(Parser)]
pub struct InspectArgs {
    #[clap(flatten)]
    pub data: DataArgs,

    #[command(subcommand)]
    pub command: InspectCommand,
}

#[derive(Subcommand)]
pub enum InspectCommand {
    /// Print the joined unit catalog.
    Catalog,

    /// Fetch one day of measurements and print per-unit totals.
    Measurements(InspectDateArgs),

    /// Fetch one day of outage disclosures.
    Outages(InspectDateArgs),

    /// Print the image and post layout without fetching or rendering.
    Plan(InspectPlanArgs),
}

#[derive(Parser)]
pub struct InspectDateArgs {
    /// Target date; defaults by the portal's publication time.
    #[clap(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Parser)]
pub struct InspectPlanArgs {
    #[clap(flatten)]
    pub layout: LayoutArgs,

    /// Target date; defaults by the portal's publication time.
    #[clap(long)]
    pub date: Option<NaiveDate>,
}
