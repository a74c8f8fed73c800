//! osm-report: run the report battery over a shaped corpus.
//!
//! Usage:
//!   # Full report over a shaped corpus
//!   osm-report map.osm.json
//!
//!   # Repair known-bad city names first, then report
//!   osm-report map.osm.json --fix-cities corrections.json
//!
//! The corrections file maps incorrect city strings to their replacements:
//!   {"Centenn": "Centennial"}

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{Context, Result};
use clap::Parser;
use osmwrangle::report::{
    bicycle_tag_counts, bike_shop_count, bikeable_way_share, bounds_report, city_counts,
    fix_cities, highway_counts, measured_extent, overview, postcode_counts, MemoryStore,
};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;

#[derive(Parser, Debug)]
#[command(name = "osm-report")]
#[command(about = "Corpus statistics and city repair over shaped documents", long_about = None)]
struct Args {
    /// Shaped corpus, newline-delimited JSON
    #[arg(value_name = "CORPUS")]
    corpus: String,

    /// JSON file mapping incorrect city names to corrections
    #[arg(long)]
    fix_cities: Option<String>,

    /// Contributor whose edit count to report
    #[arg(long, default_value = "ecarl65")]
    contributor: String,

    /// Number of postcodes to list
    #[arg(long, default_value_t = 6)]
    postcode_limit: u64,

    /// Number of highway tags to list
    #[arg(long, default_value_t = 12)]
    highway_limit: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let file = File::open(&args.corpus)
        .with_context(|| format!("Failed to open corpus {}", args.corpus))?;
    let mut store = MemoryStore::from_ndjson(BufReader::new(file))?;

    if let Some(path) = &args.fix_cities {
        println!("City counts before repair");
        for entry in city_counts(&store)? {
            println!(
                "  {:20} {}",
                entry.key.as_deref().unwrap_or("(none)"),
                entry.count
            );
        }

        let corrections = load_corrections(path)?;
        let updated = fix_cities(&mut store, &corrections)?;
        println!("City records fixed: {updated}");
        println!();
    }

    let stats = overview(&store, &args.contributor)?;
    println!("Documents: {}", stats.total_documents);
    println!("Nodes: {}", stats.nodes);
    println!("Ways: {}", stats.ways);
    println!(
        "Edits by {}: {} ({:.1}%)",
        args.contributor,
        stats.edits_by_contributor,
        if stats.total_documents == 0 {
            0.0
        } else {
            100.0 * stats.edits_by_contributor as f64 / stats.total_documents as f64
        }
    );
    println!("Distinct contributors: {}", stats.distinct_contributors);
    println!("Documents with FIXME: {}", stats.fixme_documents);
    println!("Places of worship: {}", stats.places_of_worship);
    println!(
        "Places of worship without religion: {}",
        stats.places_of_worship_without_religion
    );
    println!();

    println!("Postcodes on nodes");
    for entry in postcode_counts(&store, args.postcode_limit)? {
        println!(
            "  {:10} {}",
            entry.key.as_deref().unwrap_or("(none)"),
            entry.count
        );
    }
    println!();

    let bounds = bounds_report(&store)?;
    println!(
        "Reported bounds: lat [{}, {}], lon [{}, {}]",
        bounds.minlat, bounds.maxlat, bounds.minlon, bounds.maxlon
    );
    println!(
        "Extent: {:.3} km east-west, {:.3} km north-south",
        bounds.extent.east_west_km, bounds.extent.north_south_km
    );
    println!("Approximate area: {:.3} km^2", bounds.extent.area_km2);
    if let Some((minlat, minlon, maxlat, maxlon)) = measured_extent(&store)? {
        println!(
            "Measured extent: lat [{minlat}, {maxlat}], lon [{minlon}, {maxlon}]"
        );
    }
    println!();

    println!("Highways on ways");
    for entry in highway_counts(&store, args.highway_limit)? {
        println!(
            "  {:20} {}",
            entry.key.as_deref().unwrap_or("(none)"),
            entry.count
        );
    }
    println!();

    println!("Bicycle tags on ways");
    for entry in bicycle_tag_counts(&store)? {
        println!(
            "  {:20} {}",
            entry.key.as_deref().unwrap_or("(untagged)"),
            entry.count
        );
    }
    println!();

    let share = bikeable_way_share(&store)?;
    println!(
        "Ways open to bicycles: {} of {} ({:.1}%)",
        share.bikeable_ways, share.total_ways, share.percent
    );

    let shops = bike_shop_count(&store)?;
    println!("Bike shops: {}", shops);
    if bounds.extent.area_km2 > 0.0 {
        println!(
            "Bike shops per km^2: {:.4}",
            shops as f64 / bounds.extent.area_km2
        );
    }

    Ok(())
}

fn load_corrections(path: &str) -> Result<BTreeMap<String, String>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open corrections file {path}"))?;
    serde_json::from_reader(BufReader::new(file)).context("Failed to parse corrections file")
}
