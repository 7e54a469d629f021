//! Patch Segoe UI inside a Wine prefix with the flat and natural music signs
//! from Segoe UI Symbol.

use segoeui_patch::{core, logging};

fn main() {
    logging::init();
    let cli_args = core::platform::get_cli_args();
    if let Err(error) = core::run_app(cli_args) {
        core::platform::handle_error(error);
    }
}
