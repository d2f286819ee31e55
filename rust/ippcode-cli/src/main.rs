//! `ippcode`: runs an IPPcode19 program document.

fn main() {
    std::process::exit(ippcode_cli::run_cli(std::env::args_os()));
}
