//! osm-shape: shape an OpenStreetMap element stream into newline-delimited
//! JSON documents ready for document-store import.
//!
//! Usage:
//!   # Shape a map file; documents land in <FILE>.json
//!   osm-shape map.osm
//!
//!   # Human-readable records on stdout
//!   cat map.osm | osm-shape --pretty
//!
//!   # Audit street names without writing anything
//!   osm-shape --audit map.osm

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::Parser;
use osmwrangle::pipeline::{audit_stream, process_file, process_stream};
use std::fs::File;
use std::io::BufReader;

#[derive(Parser, Debug)]
#[command(name = "osm-shape")]
#[command(about = "Shape OSM elements into flat JSON documents", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted; stdin output goes to stdout)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Indent each output record (larger output, identical content)
    #[arg(long)]
    pretty: bool,

    /// Report suspicious street names and tags instead of shaping
    #[arg(long)]
    audit: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.audit {
        return run_audit(args.input);
    }

    let summary = match &args.input {
        Some(path) => process_file(path, args.pretty)?,
        None => {
            let stdin = std::io::stdin();
            process_stream(stdin.lock(), std::io::stdout().lock(), args.pretty)?
        }
    };

    eprintln!(
        "Shaped {} of {} elements ({} tags dropped)",
        summary.documents_written, summary.elements_seen, summary.tags_dropped
    );
    eprintln!(
        "Streets processed: {}, corrected: {} ({:.1}%)",
        summary.counters.streets_seen(),
        summary.counters.streets_corrected(),
        summary.counters.percent_corrected()
    );

    Ok(())
}

fn run_audit(input: Option<String>) -> Result<()> {
    let report = match input {
        Some(path) => audit_stream(BufReader::new(File::open(path)?))?,
        None => audit_stream(std::io::stdin().lock())?,
    };

    print_buckets("Unexpected street types", &report.unexpected_types);
    print_buckets("Abbreviated prefixes", &report.abbreviated_prefixes);
    print_buckets("Abbreviated suite markers", &report.suite_markers);

    println!("Elements with FIXME: {}", report.fixme_ids.len());
    for id in &report.fixme_ids {
        println!("  id {id}");
    }
    println!(
        "Places of worship without religion: {}",
        report.worship_without_religion.len()
    );
    for id in &report.worship_without_religion {
        println!("  id {id}");
    }

    Ok(())
}

fn print_buckets(
    title: &str,
    buckets: &std::collections::BTreeMap<String, std::collections::BTreeSet<String>>,
) {
    println!("{title}: {}", buckets.len());
    for (token, streets) in buckets {
        println!("  {token}:");
        for street in streets {
            println!("    {street}");
        }
    }
    println!();
}
