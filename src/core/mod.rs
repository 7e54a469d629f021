//! Core application functionality
//!
//! This module contains the process-level pieces around the patch:
//! - CLI parsing and prefix resolution
//! - Error types
//! - The runner and fatal error handling

pub mod cli;
pub mod errors;
pub mod platform;
pub mod runner;

// Re-export commonly used items
pub use cli::CliArgs;
pub use errors::{PatchError, PatchResult};
pub use runner::run_app;
