//! Check-config command - validates a session settings file.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use console::{Style, style};
use confidant_session::{SessionMemorySettings, load_settings};

use super::Context;

/// Arguments for the check-config command.
#[derive(Args, Debug)]
pub struct CheckConfigArgs {
    /// Path to the TOML file (defaults to --config)
    pub path: Option<PathBuf>,
}

/// Run the check-config command.
pub async fn run(args: CheckConfigArgs, ctx: &Context) -> Result<()> {
    let path = args
        .path
        .or_else(|| ctx.config_path.clone())
        .context("no config file given; pass a path or --config")?;

    let config = load_settings(&path).with_context(|| format!("invalid config {}", path.display()))?;
    let settings = SessionMemorySettings::from(&config);

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let green = Style::new().green();

    println!();
    println!("{}", style("Session Memory Limits").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("File:"), path.display());
    println!("  {} {}", dim.apply_to("Max sessions:"), settings.max_sessions);
    println!(
        "  {} {}",
        dim.apply_to("Max messages/session:"),
        settings.max_messages_per_session
    );
    println!("  {} {}s", dim.apply_to("Max age:"), settings.max_age_secs);
    println!(
        "  {} {}s",
        dim.apply_to("Cleanup interval:"),
        settings.cleanup_interval_secs
    );
    println!();
    println!("  {}", green.apply_to("● valid"));
    println!();

    Ok(())
}
