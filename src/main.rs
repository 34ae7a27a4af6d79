//! Assetpipe - command-line front-end asset builder

use std::process::ExitCode;

use assetpipe::cli;

fn main() -> ExitCode {
    cli::run()
}
