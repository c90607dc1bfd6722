//! Config command handler.

use anyhow::Result;

use ytdlm_core::paths;

use crate::bootstrap::CliContext;
use crate::commands::ConfigCommand;

/// Execute the config command.
pub fn execute(ctx: &CliContext, command: &ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Path => {
            println!("{}", ctx.settings_path().display());
        }
        ConfigCommand::Show => show(ctx)?,
    }
    Ok(())
}

fn show(ctx: &CliContext) -> Result<()> {
    let exists = ctx.settings_path().exists();
    println!(
        "Settings file: {}{}",
        ctx.settings_path().display(),
        if exists { "" } else { " (not found, using defaults)" }
    );

    let config = ctx.manager_config()?;
    println!("yt-dlp:        {}", config.downloader_path.display());
    println!("ffmpeg dir:    {}", config.ffmpeg_location.display());
    println!("Downloads:     {}", config.default_output_dir.display());
    println!("Max parallel:  {}", config.max_concurrent);
    println!("Stop grace:    {}s", config.termination_grace.as_secs());
    if let Ok(tools) = paths::tools_dir() {
        println!("Tools dir:     {}", tools.display());
    }
    println!();
    println!("{}", serde_json::to_string_pretty(ctx.settings())?);
    Ok(())
}
