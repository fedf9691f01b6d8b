//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `kioku_core` linkage and that a
//!   fresh database migrates cleanly.
//! - Keep output deterministic for quick local sanity checks.

use kioku_core::db::{migrations::latest_version, open_db_in_memory};

fn main() {
    println!("kioku_core version={}", kioku_core::core_version());
    match open_db_in_memory() {
        Ok(_) => println!("kioku_core schema={} status=ok", latest_version()),
        Err(err) => {
            eprintln!("kioku_core schema={} status=error error={err}", latest_version());
            std::process::exit(1);
        }
    }
}
