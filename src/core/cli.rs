//! Command line interface for the Segoe UI patcher
//!
//! One optional positional argument: the Wine prefix to patch. When it is
//! left out the conventional `~/.wine` is used.

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

/// Prefix used when none is given, relative to the home directory
pub const DEFAULT_PREFIX_DIR: &str = ".wine";

/// segoeui-patch CLI arguments
///
/// Examples:
///   segoeui-patch                       # Patch ~/.wine
///   segoeui-patch ~/.wine-flstudio      # Patch a specific prefix
#[derive(Parser, Debug, Clone, Default)]
#[clap(
    name = "segoeui-patch",
    version,
    about = "Copy the flat and natural music signs from Segoe UI Symbol into Segoe UI",
    long_about = "Copies U+266D (flat) and U+266E (natural) from seguisym.ttf into segoeui.ttf inside a Wine prefix, keeping a one-time backup of the original font. Every run patches from that backup, so running it again gives the same result."
)]
pub struct CliArgs {
    /// Wine prefix containing drive_c/windows/Fonts
    #[clap(
        value_name = "WINEPREFIX",
        help = "Wine prefix to patch",
        long_help = "Path to the Wine prefix to patch. Defaults to ~/.wine. The WINEPREFIX environment variable is not consulted; pass the prefix explicitly."
    )]
    pub wine_prefix: Option<PathBuf>,
}

impl CliArgs {
    /// The prefix given on the command line, or `~/.wine`.
    pub fn resolve_prefix(&self) -> PathBuf {
        resolve_prefix(self.wine_prefix.clone(), dirs::home_dir())
    }
}

/// Use `cli` if given, otherwise `<home>/.wine`.
pub fn resolve_prefix(cli: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    if let Some(prefix) = cli {
        debug!("Using prefix from CLI: {}", prefix.display());
        return prefix;
    }
    let prefix = home
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_PREFIX_DIR);
    debug!("Using default prefix: {}", prefix.display());
    prefix
}
