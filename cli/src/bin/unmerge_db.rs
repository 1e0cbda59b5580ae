//! `fossilize-unmerge-db in [--output-name base]` (spec §6 `unmerge-db`):
//! partitions a single archive back into several per-bucket outputs.
//!
//! The on-disk format carries no record of which recording session (or
//! `bucketVariantDependencies` bucket, spec §4.8) an entry originally came
//! from, so there is no information left on disk to reconstruct the exact
//! partitioning `merge-db`'s union undid. The one partition key every
//! entry *does* carry is its own resource tag, so that's what this drives
//! `unmerge-db` by: one `<output-name>.<tag>.foz` per resource kind that
//! has at least one entry (documented as an explicit simplification in
//! `DESIGN.md`).

use clap::{App, Arg};
use fossilize_cli::exit_on_error;
use fossilize_db::{open, DatabaseMode, PayloadReadFlags, PayloadWriteFlags};
use fossilize_types::ResourceTag;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::init();
    let matches = App::new("fossilize-unmerge-db")
        .about("Partitions one archive into several per-resource-tag outputs (spec §6 unmerge-db).")
        .arg(Arg::with_name("INPUT").required(true).help("Archive to partition"))
        .arg(
            Arg::with_name("output-name")
                .long("output-name")
                .takes_value(true)
                .default_value("unmerged")
                .help("Stem for each output archive's filename"),
        )
        .get_matches();

    let input_path = Path::new(matches.value_of("INPUT").unwrap());
    let output_stem = matches.value_of("output-name").unwrap();

    let mut input = exit_on_error(open(input_path, DatabaseMode::ReadOnly));
    let mut total = 0u64;
    for tag in ResourceTag::ALL {
        let hashes = input.hash_list_for_tag(tag);
        if hashes.is_empty() {
            continue;
        }
        let output_path = PathBuf::from(format!("{}.{}.foz", output_stem, tag.json_key()));
        let mut output = exit_on_error(open(&output_path, DatabaseMode::OverWrite));
        for hash in &hashes {
            if let Some(payload) = exit_on_error(input.read_entry(tag, *hash, PayloadReadFlags::empty())) {
                exit_on_error(output.write_entry(tag, *hash, &payload, PayloadWriteFlags::empty()));
                total += 1;
            }
        }
        log::info!("wrote {} {} entries to {}", hashes.len(), tag.json_key(), output_path.display());
    }
    log::info!("unmerged {} entries from {}", total, input_path.display());
}
