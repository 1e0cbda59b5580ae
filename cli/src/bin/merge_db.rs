//! `fossilize-merge-db [--last-use] out in1 in2 ...` (spec §6 `merge-db`):
//! unions one or more source archives into a fresh output archive.
//! `write_entry`'s at-most-once semantics (spec §3 invariant 6) does the
//! actual de-duplication; this binary just drives `copy_all_entries` once
//! per input, in order.

use clap::{App, Arg};
use fossilize_cli::{copy_all_entries, exit_on_error};
use fossilize_db::{open, DatabaseMode, PayloadWriteFlags};
use fossilize_recorder::on_use::OnUseDatabase;
use std::path::{Path, PathBuf};

/// The on-use side database path a main database path implies, matching
/// the naming `OnUseDatabase`'s own tests and the recorder's side-database
/// conventions use (spec §4.7 "on-use database").
fn on_use_path(db_path: &Path) -> PathBuf {
    let mut name = db_path.as_os_str().to_owned();
    name.push(".onuse.json");
    PathBuf::from(name)
}

fn main() {
    env_logger::init();
    let matches = App::new("fossilize-merge-db")
        .about("Unions one or more source archives into a fresh output archive (spec §6 merge-db).")
        .arg(
            Arg::with_name("last-use")
                .long("last-use")
                .help("Also reconcile each input's on-use database, keeping the maximum timestamp per hash"),
        )
        .arg(Arg::with_name("OUTPUT").required(true).help("Destination archive"))
        .arg(Arg::with_name("INPUTS").required(true).multiple(true).help("One or more source archives"))
        .get_matches();

    let output_path = PathBuf::from(matches.value_of("OUTPUT").unwrap());
    let input_paths: Vec<PathBuf> = matches.values_of("INPUTS").unwrap().map(PathBuf::from).collect();

    let mut dst = exit_on_error(open(&output_path, DatabaseMode::OverWrite));
    let mut total = 0u64;
    for input_path in &input_paths {
        let mut src = exit_on_error(open(input_path, DatabaseMode::ReadOnly));
        total += exit_on_error(copy_all_entries(src.as_mut(), dst.as_mut(), PayloadWriteFlags::empty()));
    }
    log::info!("merged {} entries from {} archives into {}", total, input_paths.len(), output_path.display());

    if matches.is_present("last-use") {
        let mut merged_on_use = exit_on_error(OnUseDatabase::open(&on_use_path(&output_path)));
        for input_path in &input_paths {
            let side_path = on_use_path(input_path);
            if side_path.exists() {
                let input_on_use = exit_on_error(OnUseDatabase::open(&side_path));
                merged_on_use.merge_from(&input_on_use);
            }
        }
        exit_on_error(merged_on_use.flush());
    }
}
