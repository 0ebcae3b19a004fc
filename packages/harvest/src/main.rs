#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the review harvester.
//!
//! With `--google-url` and/or `--booking-url` the run is configured from
//! flags; without either, an interactive prompt asks for everything.

use std::path::PathBuf;

use clap::Parser;
use review_harvest::config::{DEFAULT_BOOKING_PAGES, DEFAULT_OUTPUT_PATH, MAX_BOOKING_PAGES};
use review_harvest::{RunConfig, RunSummary};
use review_harvest_browser::chrome::{ChromeLauncher, SessionConfig};
use review_harvest_cli_utils::IndicatifProgress;

#[derive(Parser)]
#[command(
    name = "review_harvest",
    about = "Scrape customer reviews from Google Maps and Booking.com"
)]
struct Cli {
    /// Google Maps place URL
    #[arg(long)]
    google_url: Option<String>,
    /// Booking.com property URL
    #[arg(long)]
    booking_url: Option<String>,
    /// Number of Booking.com result pages to scrape
    #[arg(
        long,
        default_value_t = DEFAULT_BOOKING_PAGES,
        value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_BOOKING_PAGES)),
    )]
    booking_pages: u32,
    /// Endpoint that receives the scraped reviews as a JSON POST
    #[arg(long)]
    webhook_url: Option<String>,
    /// Output JSON file
    #[arg(long, default_value = DEFAULT_OUTPUT_PATH)]
    output: PathBuf,
    /// Show the browser window instead of running headless
    #[arg(long)]
    headed: bool,
    /// Chrome/Chromium executable (auto-detected when omitted)
    #[arg(long)]
    chrome_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = review_harvest_cli_utils::init_logger();
    let cli = Cli::parse();

    let config = if cli.google_url.is_none() && cli.booking_url.is_none() {
        println!("Customer Review Scraper");
        println!();
        match review_harvest::interactive::prompt()? {
            Some(config) => config,
            None => return Ok(()),
        }
    } else {
        let mut config = RunConfig::new()
            .with_booking_max_pages(cli.booking_pages)
            .with_output_path(cli.output);
        if let Some(url) = cli.google_url {
            config = config.with_google_maps_url(url);
        }
        if let Some(url) = cli.booking_url {
            config = config.with_booking_url(url);
        }
        if let Some(url) = cli.webhook_url {
            config = config.with_webhook_url(url);
        }
        config
    };

    let mut session = SessionConfig::default();
    if cli.headed {
        session = session.with_head();
    }
    if let Some(path) = cli.chrome_path {
        session = session.with_executable(path);
    }
    let launcher = ChromeLauncher::new(session);

    let progress = move |source: review_harvest_review_models::ReviewSource| {
        IndicatifProgress::source_bar(&multi, source.as_ref())
    };

    let summary = review_harvest::run(&config, &launcher, &progress).await?;
    print_summary(&summary);

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!();
    for report in &summary.sources {
        match &report.error {
            None => println!("{:<12} {} reviews", report.source, report.reviews),
            Some(e) => println!("{:<12} failed: {e}", report.source),
        }
    }
    match &summary.output_path {
        Some(path) => println!("Saved {} reviews to {}", summary.reviews.len(), path.display()),
        None => println!("No reviews scraped. Please check the provided URLs."),
    }
    if let Some(webhook) = &summary.webhook {
        println!("Webhook: {webhook}");
    }
}
