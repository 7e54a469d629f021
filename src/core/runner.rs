//! Application runner logic
//!
//! Resolves the Wine prefix and drives one patch run

use crate::core::cli::CliArgs;
use crate::patch::{patch_fonts, FontPaths, PatchSummary};
use anyhow::Result;
use tracing::info;

/// Run the patcher with the given CLI arguments.
pub fn run_app(cli_args: CliArgs) -> Result<PatchSummary> {
    let paths = FontPaths::new(cli_args.resolve_prefix());
    run_with_paths(&paths)
}

/// Patch the fonts under `paths` and print the completion line.
pub fn run_with_paths(paths: &FontPaths) -> Result<PatchSummary> {
    println!("WINEPREFIX: {}", paths.prefix.display());
    println!("Fonts dir:  {}", paths.fonts_dir.display());
    println!();

    let summary = patch_fonts(paths)?;
    info!(
        "{} glyphs copied, {} skipped",
        summary.transferred.len(),
        summary.skipped.len()
    );

    println!();
    println!("✓ Patch complete! Run FL Studio to verify.");
    Ok(summary)
}
