#![allow(clippy::module_name_repetitions)]

//! Interactive prompts for the review harvester.
//!
//! Provides a menu-driven interface using `dialoguer` so a run can be
//! configured without memorizing CLI flags.

use dialoguer::{Confirm, Input, Select};
use review_harvest_source::registry;

use crate::RunConfig;
use crate::config::{DEFAULT_BOOKING_PAGES, DEFAULT_OUTPUT_PATH, MAX_BOOKING_PAGES};

/// Top-level actions available in the interactive menu.
enum HarvestAction {
    Harvest,
    ListSources,
}

impl HarvestAction {
    const ALL: &[Self] = &[Self::Harvest, Self::ListSources];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Harvest => "Scrape customer reviews",
            Self::ListSources => "List review sources",
        }
    }
}

/// Shows the menu and returns the configuration for a run, or `None` if
/// the user did not ask for one.
///
/// # Errors
///
/// Returns an error if the terminal prompts fail.
pub fn prompt() -> Result<Option<RunConfig>, Box<dyn std::error::Error>> {
    let labels: Vec<&str> = HarvestAction::ALL
        .iter()
        .map(HarvestAction::label)
        .collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match HarvestAction::ALL[idx] {
        HarvestAction::Harvest => prompt_run_config(),
        HarvestAction::ListSources => {
            list_sources();
            Ok(None)
        }
    }
}

fn list_sources() {
    println!("{:<15} {:<15} REVEAL", "ID", "NAME");
    println!("{}", "-".repeat(45));
    for source in registry::all_sources() {
        let reveal = if source.is_paginated() {
            "paginated"
        } else {
            "infinite scroll"
        };
        println!("{:<15} {:<15} {reveal}", source.id, source.name());
    }
}

/// Asks for the URLs, the page bound and the output file.
fn prompt_run_config() -> Result<Option<RunConfig>, Box<dyn std::error::Error>> {
    let google_url = prompt_text("Google Maps URL (empty to skip)")?;
    let booking_url = prompt_text("Booking.com URL (empty to skip)")?;
    let webhook_url = prompt_text("Webhook URL for sending scraped data (empty to skip)")?;

    let booking_pages: u32 = Input::new()
        .with_prompt(format!(
            "Number of pages to scrape from Booking.com (1-{MAX_BOOKING_PAGES})"
        ))
        .default(DEFAULT_BOOKING_PAGES)
        .validate_with(|pages: &u32| {
            if (1..=MAX_BOOKING_PAGES).contains(pages) {
                Ok(())
            } else {
                Err(format!("Enter a number between 1 and {MAX_BOOKING_PAGES}"))
            }
        })
        .interact_text()?;

    let output: String = Input::new()
        .with_prompt("Output file")
        .default(DEFAULT_OUTPUT_PATH.to_string())
        .interact_text()?;

    let config = RunConfig::new()
        .with_google_maps_url(google_url)
        .with_booking_url(booking_url)
        .with_webhook_url(webhook_url)
        .with_booking_max_pages(booking_pages)
        .with_output_path(output.trim());

    if config.targets().is_empty() {
        println!("No URLs entered, nothing to scrape.");
        return Ok(None);
    }

    let start = Confirm::new()
        .with_prompt("Start scraping?")
        .default(true)
        .interact()?;

    Ok(start.then_some(config))
}

fn prompt_text(prompt: &str) -> Result<String, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    Ok(input)
}
