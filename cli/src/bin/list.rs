//! `fossilize-list <db> [--tag N] [--size] [--connectivity]` (spec §6
//! `list`): prints every stored hash, optionally its payload size and its
//! resolved dependency edges.

use clap::{App, Arg};
use fossilize_cli::{build_document, dependencies_of, exit_on_error};
use fossilize_db::{open, DatabaseMode, PayloadReadFlags};
use fossilize_types::ResourceTag;
use std::path::Path;

fn main() {
    env_logger::init();
    let matches = App::new("fossilize-list")
        .about("Lists the hashes an archive holds (spec §6 list).")
        .arg(Arg::with_name("DB").required(true))
        .arg(
            Arg::with_name("tag")
                .long("tag")
                .takes_value(true)
                .help("Restrict to one resource tag's numeric value (spec §3 numbering, 0-9)"),
        )
        .arg(Arg::with_name("size").long("size").help("Print each entry's stored payload size in bytes"))
        .arg(Arg::with_name("connectivity").long("connectivity").help("Print each entry's resolved dependency edges"))
        .get_matches();

    let db_path = Path::new(matches.value_of("DB").unwrap());
    let show_size = matches.is_present("size");
    let show_connectivity = matches.is_present("connectivity");
    let tag_filter = matches.value_of("tag").map(|s| {
        let raw: u8 = s.parse().unwrap_or_else(|_| {
            eprintln!("invalid --tag {:?}", s);
            std::process::exit(1);
        });
        ResourceTag::from_raw(raw).unwrap_or_else(|| {
            eprintln!("unknown resource tag {}", raw);
            std::process::exit(1);
        })
    });

    let mut db = exit_on_error(open(db_path, DatabaseMode::ReadOnly));
    // Connectivity needs every entity decoded to a `Value` up front so
    // hash-string fields can be resolved against the rest of the archive;
    // `build_document` already assembles exactly that shape (spec §4.5).
    let doc = show_connectivity.then(|| exit_on_error(build_document(db.as_mut())));

    for tag in ResourceTag::ALL {
        if let Some(filter) = tag_filter {
            if filter != tag {
                continue;
            }
        }
        for hash in db.hash_list_for_tag(tag) {
            print!("{} {:016x}", tag.json_key(), hash);
            if show_size {
                if let Some(payload) = exit_on_error(db.read_entry(tag, hash, PayloadReadFlags::empty())) {
                    print!(" size={}", payload.len());
                }
            }
            if let Some(doc) = &doc {
                if let Some(value) = doc.get(tag.json_key()).and_then(|section| section.get(format!("{:016x}", hash))) {
                    for (dep_tag, dep_hash) in dependencies_of(tag, value) {
                        print!(" -> {}:{:016x}", dep_tag.json_key(), dep_hash);
                    }
                }
            }
            println!();
        }
    }
}
