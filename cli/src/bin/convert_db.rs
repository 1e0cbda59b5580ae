//! `fossilize-convert-db in out [--checksum] [--compress] [--best]` (spec
//! §6 `convert-db`): enumerates every hash in `in` and copies its payload
//! into `out`, recompressing/checksumming according to the flags given.

use clap::{App, Arg};
use fossilize_cli::{copy_all_entries, exit_on_error};
use fossilize_db::{open, DatabaseMode, PayloadWriteFlags};
use std::path::Path;

fn main() {
    env_logger::init();
    let matches = App::new("fossilize-convert-db")
        .about("Copies every entry from one archive to another (spec §6 convert-db).")
        .arg(Arg::with_name("INPUT").required(true).help("Source archive"))
        .arg(Arg::with_name("OUTPUT").required(true).help("Destination archive (created or truncated)"))
        .arg(Arg::with_name("checksum").long("checksum").help("Compute and store a CRC-32 checksum per entry"))
        .arg(Arg::with_name("compress").long("compress").help("Deflate-compress each entry"))
        .arg(Arg::with_name("best").long("best").help("Slowest, smallest deflate level (implies --compress)"))
        .get_matches();

    let input_path = Path::new(matches.value_of("INPUT").unwrap());
    let output_path = Path::new(matches.value_of("OUTPUT").unwrap());

    let mut flags = PayloadWriteFlags::empty();
    if matches.is_present("checksum") {
        flags |= PayloadWriteFlags::COMPUTE_CHECKSUM;
    }
    if matches.is_present("compress") || matches.is_present("best") {
        flags |= PayloadWriteFlags::COMPRESS;
    }
    if matches.is_present("best") {
        flags |= PayloadWriteFlags::BEST_COMPRESSION;
    }

    let mut src = exit_on_error(open(input_path, DatabaseMode::ReadOnly));
    let mut dst = exit_on_error(open(output_path, DatabaseMode::OverWrite));
    let copied = exit_on_error(copy_all_entries(src.as_mut(), dst.as_mut(), flags));
    log::info!("copied {} entries from {} to {}", copied, input_path.display(), output_path.display());
}
