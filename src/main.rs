//! spritepack - command-line tool for verifying sprite pack definitions

use std::process::ExitCode;

use spritepack::cli;

fn main() -> ExitCode {
    cli::run()
}
