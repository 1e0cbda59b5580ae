//! `fossilize-rehash in out [--application hash]` (spec §6 `rehash`):
//! replays every entity in `in` through a fresh, synchronized `Recorder`
//! so every hash is recomputed under the current canonical hashing rules
//! and `FORMAT_VERSION` (spec §3 invariant 2).

use clap::{App, Arg};
use fossilize_cli::{exit_on_error, rehash_database};
use fossilize_db::{open, DatabaseMode};
use std::path::Path;

fn main() {
    env_logger::init();
    let matches = App::new("fossilize-rehash")
        .about("Re-serializes every entity in an archive under the current FORMAT_VERSION (spec §6 rehash).")
        .arg(Arg::with_name("INPUT").required(true))
        .arg(Arg::with_name("OUTPUT").required(true))
        .arg(
            Arg::with_name("application")
                .long("application")
                .takes_value(true)
                .help("Keep only the one application-feature hash's blobs"),
        )
        .get_matches();

    let input_path = Path::new(matches.value_of("INPUT").unwrap());
    let output_path = Path::new(matches.value_of("OUTPUT").unwrap());
    let application_hash_filter = matches.value_of("application").map(|s| {
        fossilize_cli::parse_hash_arg(s).unwrap_or_else(|e| {
            eprintln!("{}", e);
            std::process::exit(1);
        })
    });

    let mut input = exit_on_error(open(input_path, DatabaseMode::ReadOnly));
    let output = exit_on_error(open(output_path, DatabaseMode::OverWrite));
    exit_on_error(rehash_database(input.as_mut(), output, application_hash_filter));
    log::info!("rehashed {} into {}", input_path.display(), output_path.display());
}
