//! `jobsheet-auditor` CLI binary.
//!
//! This is the minimal entrypoint; all logic lives in the library.

fn main() {
    if let Err(code) = jobsheet_auditor::cli::run() {
        std::process::exit(code.as_i32());
    }
}
