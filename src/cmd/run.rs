//! The tagging pass — `storytag run`.

use anyhow::{Context, Result};
use std::path::Path;

use storytag::config::{CliOverrides, Config};
use storytag::tagging::{PassReport, Tagger};
use storytag::tracker::TrackerClient;

pub async fn cmd_run(cwd: &Path, overrides: &CliOverrides, dry_run: bool, json: bool) -> Result<()> {
    let mut config = Config::load(cwd, overrides)?;
    config.pass.dry_run = dry_run;

    if let Some(path) = &config.config_file {
        tracing::debug!(path = %path.display(), "Loaded config file");
    }

    let client = TrackerClient::new(&config.tracker).context("Failed to build Tracker client")?;
    let tagger = Tagger::new(&client, config.scheme.clone(), config.pass.clone())?;
    let report = tagger.run().await?;

    if json {
        let out = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", out);
    } else {
        print_report(&report);
    }

    if report.has_failures() {
        anyhow::bail!(
            "{} of {} stories could not be updated",
            report.failed.len(),
            report.failed.len() + report.tagged_count()
        );
    }
    Ok(())
}

fn print_report(report: &PassReport) {
    if report.dry_run && !report.tagged.is_empty() {
        println!();
        for story in &report.tagged {
            println!(
                "  {} {} {}",
                console::style(story.story_id).dim(),
                console::style("→").dim(),
                console::style(&story.new_title).green()
            );
        }
        println!();
    }

    for skipped in &report.skipped {
        println!(
            "{} {} ({})",
            console::style("Skipped").yellow(),
            skipped.title,
            skipped.reason
        );
    }

    for failed in &report.failed {
        println!(
            "{} {}: {}",
            console::style("Failed").red(),
            failed.new_title,
            failed.error
        );
    }

    println!("{}", report.summary_line());
}
