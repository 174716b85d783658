mod api;
mod catalog;
mod cli;
mod error;
mod partition;
mod prelude;
mod render;
mod summary;
mod tables;
mod units;

use chrono::{NaiveDate, TimeDelta, Timelike, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    catalog::Catalog,
    cli::{Args, Command, InspectArgs, InspectCommand, ReportArgs},
    prelude::*,
    summary::{insert_generations, insert_outage_descriptions, summarize},
};

/// The portal publishes a day's records the following afternoon (JST).
const PUBLICATION_HOUR_JST: u32 = 14;

#[tokio::main]
async fn main() -> Result {
    dotenvy::dotenv().ok();
    init_tracing();

    match Args::parse().command {
        Command::Report(args) => report(*args).await,
        Command::Inspect(args) => inspect(*args).await,
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
}

async fn report(args: ReportArgs) -> Result {
    let date = args.date.unwrap_or_else(default_target_date);
    info!(%date, "Reporting…");

    let catalog = Catalog::load(&args.data.catalog_dir)?;
    let mut summaries = summarize(&catalog)?;
    info!(n_units = summaries.len(), "Joined the catalog");

    let measurements = api::Occto::try_new()?.fetch_measurements(date, date).await?;
    info!(n_measurements = measurements.len(), "Fetched the measurements");
    insert_generations(&mut summaries, measurements)?;

    let outages = api::Hjks::try_new()?.fetch_outages(date, date).await?;
    info!(n_outages = outages.len(), "Fetched the outage disclosures");
    insert_outage_descriptions(&mut summaries, outages);

    let plan = partition::build_plan(
        &catalog,
        &summaries,
        date,
        &args.data.image_dir,
        args.layout.grid(),
        args.layout.media_per_post,
    )?;

    recreate_image_dir(&args.data.image_dir)?;
    for image in &plan.images {
        render::render_image(image, args.layout.grid())?;
        info!(path = %image.path.display(), area = %image.area_name, "Rendered");
    }

    if args.dry_run {
        for post in &plan.posts {
            info!(caption = %post.caption, n_images = post.images.len(), "Would post");
        }
        return Ok(());
    }
    let poster = args.poster.try_new_client()?;
    api::publish_thread(&poster, &plan.posts, args.layout.media_per_post).await
}

async fn inspect(args: InspectArgs) -> Result {
    let catalog = Catalog::load(&args.data.catalog_dir)?;
    let summaries = summarize(&catalog)?;
    match args.command {
        InspectCommand::Catalog => {
            println!("{}", tables::build_catalog_table(&summaries));
        }
        InspectCommand::Measurements(date_args) => {
            let date = date_args.date.unwrap_or_else(default_target_date);
            let measurements = api::Occto::try_new()?.fetch_measurements(date, date).await?;
            println!("{}", tables::build_measurement_totals_table(&measurements));
        }
        InspectCommand::Outages(date_args) => {
            let date = date_args.date.unwrap_or_else(default_target_date);
            let outages = api::Hjks::try_new()?.fetch_outages(date, date).await?;
            println!("{}", tables::build_outage_table(&outages));
        }
        InspectCommand::Plan(plan_args) => {
            let date = plan_args.date.unwrap_or_else(default_target_date);
            let plan = partition::build_plan(
                &catalog,
                &summaries,
                date,
                &args.data.image_dir,
                plan_args.layout.grid(),
                plan_args.layout.media_per_post,
            )?;
            println!("{}", tables::build_plan_table(&plan));
        }
    }
    Ok(())
}

/// Yesterday once the portal has published it, two days ago before that.
fn default_target_date() -> NaiveDate {
    let now_jst = Utc::now().naive_utc() + TimeDelta::hours(9);
    let lag = if now_jst.hour() >= PUBLICATION_HOUR_JST { 1 } else { 2 };
    now_jst.date() - TimeDelta::days(lag)
}

fn recreate_image_dir(dir: &std::path::Path) -> Result {
    if dir.exists() {
        std::fs::remove_dir_all(dir)
            .with_context(|| format!("failed to clear `{}`", dir.display()))?;
    }
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create `{}`", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_target_date_is_in_the_past() {
        let date = default_target_date();
        let today_jst = (Utc::now().naive_utc() + TimeDelta::hours(9)).date();
        let lag_days = (today_jst - date).num_days();
        assert!((1..=2).contains(&lag_days));
    }
}
