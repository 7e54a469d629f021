//! Process-level glue: argument parsing and fatal error reporting.

use crate::core::errors::PatchError;

/// Report a fatal error and exit with code 1.
///
/// A missing input font gets the short `ERROR:` line; anything else is
/// printed with its full cause chain.
pub fn handle_error(error: anyhow::Error) -> ! {
    if let Some(missing @ PatchError::MissingFile { .. }) = error.downcast_ref::<PatchError>() {
        eprintln!("ERROR: {missing}");
    } else {
        eprintln!();
        eprintln!("Error patching Segoe UI:");
        eprintln!("{error:#}");
        eprintln!();
        eprintln!("Run with RUST_LOG=debug for table-level details.");
    }
    std::process::exit(1);
}

/// Parse command line arguments.
pub fn get_cli_args() -> crate::core::cli::CliArgs {
    use clap::Parser;
    crate::core::cli::CliArgs::parse()
}
