//! Configuration view and validation commands — `storytag config`.

use anyhow::Result;
use std::path::Path;

use storytag::config::{CliOverrides, Config, ENV_API_TOKEN};
use storytag::storytag_config::{CONFIG_FILE_NAME, StorytagToml, find_config_file};
use storytag::tagging::TaggingScheme;

use super::super::ConfigCommands;

pub fn cmd_config(cwd: &Path, overrides: &CliOverrides, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => show(cwd, overrides),
        Some(ConfigCommands::Validate) => validate(cwd, overrides),
        Some(ConfigCommands::Init { force }) => init(cwd, force),
    }
}

fn show(cwd: &Path, overrides: &CliOverrides) -> Result<()> {
    println!();
    println!("Storytag Configuration");
    println!("======================");
    println!();

    match find_config_file(overrides.config_path.as_deref(), cwd) {
        Some(path) => println!("Config file: {}", path.display()),
        None => println!("Config file: none (using environment and defaults)"),
    }
    println!();

    let config = Config::load(cwd, overrides)?;
    println!("[tracker]");
    println!("  api_url = \"{}\"", config.tracker.api_url);
    println!("  project_id = \"{}\"", config.tracker.project_id);
    println!("  api_token = <set via {}>", ENV_API_TOKEN);
    println!("  page_size = {}", config.pass.page_size);
    println!("  max_pages = {}", config.pass.max_pages);
    println!("  timeout_secs = {}", config.tracker.timeout.as_secs());
    println!();
    println!("[tagging]");
    match &config.scheme {
        TaggingScheme::Prefix(prefix) => {
            println!("  prefix = \"{}\"", prefix);
            println!("  format = \"{}<n> - <title>\"", prefix);
        }
        TaggingScheme::Categorized(categories) => {
            for def in categories {
                println!("  {} <- label \"{}\"", def.code, def.label);
            }
            println!("  format = \"<CODE>-<n>: <title>\"");
        }
    }
    println!();
    Ok(())
}

fn validate(cwd: &Path, overrides: &CliOverrides) -> Result<()> {
    let warnings = match find_config_file(overrides.config_path.as_deref(), cwd) {
        Some(path) => StorytagToml::load(&path)?.validate(),
        None => Vec::new(),
    };

    Config::load(cwd, overrides)?;

    for warning in &warnings {
        println!("{} {}", console::style("warning:").yellow(), warning);
    }
    println!("{}", console::style("Configuration is valid.").green());
    Ok(())
}

fn init(cwd: &Path, force: bool) -> Result<()> {
    let path = cwd.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    StorytagToml::template().save(&path)?;
    println!("Wrote {}", path.display());
    println!("Set {} in your environment or a .env file.", ENV_API_TOKEN);
    Ok(())
}
