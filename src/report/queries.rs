//! The fixed battery of grouped and aggregate queries over the stored
//! corpus, plus the one read-modify-write repair (`fix_cities`).

use crate::report::geo::{self, BoundsArea};
use crate::report::store::DocumentStore;
use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// One grouped count. `key` is `None` for documents missing the grouped
/// field (the store buckets them under null).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    pub key: Option<String>,
    pub count: u64,
}

/// Corpus-level counts reported by [`overview`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusOverview {
    pub total_documents: u64,
    pub nodes: u64,
    pub ways: u64,
    pub edits_by_contributor: u64,
    pub distinct_contributors: u64,
    pub fixme_documents: u64,
    pub places_of_worship: u64,
    pub places_of_worship_without_religion: u64,
}

/// Share of ways eligible for bicycle travel.
#[derive(Debug, Clone, PartialEq)]
pub struct BikewayShare {
    pub bikeable_ways: u64,
    pub total_ways: u64,
    pub percent: f64,
}

/// The bounds document's envelope plus its approximate area.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundsReport {
    pub minlat: f64,
    pub minlon: f64,
    pub maxlat: f64,
    pub maxlon: f64,
    pub extent: BoundsArea,
}

/// Grouped city counts, most frequent first.
pub fn city_counts(store: &dyn DocumentStore) -> Result<Vec<GroupCount>> {
    let rows = store.aggregate(&[
        json!({"$match": {"address.city": {"$exists": true}}}),
        json!({"$group": {"_id": "$address.city", "count": {"$sum": 1}}}),
        json!({"$sort": {"count": -1}}),
    ])?;
    Ok(group_counts(rows))
}

/// Rewrite every known-incorrect city string to its correction and persist
/// the updates. Returns the number of documents rewritten.
///
/// Idempotent: once repaired, the incorrect value no longer exists, so a
/// second run matches nothing.
pub fn fix_cities(
    store: &mut dyn DocumentStore,
    corrections: &BTreeMap<String, String>,
) -> Result<u64> {
    let mut updated = 0u64;
    for (incorrect, corrected) in corrections {
        for mut doc in store.find(&json!({ "address.city": incorrect }))? {
            doc["address"]["city"] = json!(corrected);
            store.save(doc)?;
            updated += 1;
        }
    }
    Ok(updated)
}

/// Basic corpus statistics.
pub fn overview(store: &dyn DocumentStore, contributor: &str) -> Result<CorpusOverview> {
    Ok(CorpusOverview {
        total_documents: store.count(&json!({}))?,
        nodes: store.count(&json!({"type": "node"}))?,
        ways: store.count(&json!({"type": "way"}))?,
        edits_by_contributor: store.count(&json!({ "created.user": contributor }))?,
        distinct_contributors: store.distinct("created.user")?.len() as u64,
        fixme_documents: store.count(&json!({"FIXME": {"$exists": true}}))?,
        places_of_worship: store.count(&json!({"amenity": "place_of_worship"}))?,
        places_of_worship_without_religion: store.count(
            &json!({"amenity": "place_of_worship", "religion": {"$exists": false}}),
        )?,
    })
}

/// Postcode counts over nodes, first `limit` postcodes in ascending order.
pub fn postcode_counts(store: &dyn DocumentStore, limit: u64) -> Result<Vec<GroupCount>> {
    let rows = store.aggregate(&[
        json!({"$match": {"type": "node", "address.postcode": {"$exists": true}}}),
        json!({"$group": {"_id": "$address.postcode", "count": {"$sum": 1}}}),
        json!({"$sort": {"_id": 1}}),
        json!({ "$limit": limit }),
    ])?;
    Ok(group_counts(rows))
}

/// Top `limit` highway tags over ways, most frequent first.
pub fn highway_counts(store: &dyn DocumentStore, limit: u64) -> Result<Vec<GroupCount>> {
    let rows = store.aggregate(&[
        json!({"$match": {"type": "way", "highway": {"$exists": true}}}),
        json!({"$group": {"_id": "$highway", "count": {"$sum": 1}}}),
        json!({"$sort": {"count": -1}}),
        json!({ "$limit": limit }),
    ])?;
    Ok(group_counts(rows))
}

/// All ways grouped by their `bicycle` tag value; ways without the tag
/// appear under the `None` key.
pub fn bicycle_tag_counts(store: &dyn DocumentStore) -> Result<Vec<GroupCount>> {
    let rows = store.aggregate(&[
        json!({"$match": {"type": "way"}}),
        json!({"$group": {"_id": "$bicycle", "count": {"$sum": 1}}}),
        json!({"$sort": {"count": -1}}),
    ])?;
    Ok(group_counts(rows))
}

/// Values that mark a way as open to bicycles.
const BICYCLE_ALLOWED: [&str; 4] = ["yes", "designated", "permissive", "allowed"];

/// Percentage of ways eligible for bicycle travel: dedicated cycleways plus
/// ways whose `bicycle` tag is in the allow-list.
pub fn bikeable_way_share(store: &dyn DocumentStore) -> Result<BikewayShare> {
    let rows = store.aggregate(&[
        json!({"$match": {"type": "way", "$or": [
            {"highway": "cycleway"},
            {"bicycle": {"$in": BICYCLE_ALLOWED}}
        ]}}),
        json!({"$group": {"_id": null, "count": {"$sum": 1}}}),
    ])?;
    let bikeable_ways = rows
        .first()
        .and_then(|row| row.get("count"))
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let total_ways = store.count(&json!({"type": "way"}))?;
    let percent = if total_ways == 0 {
        0.0
    } else {
        100.0 * bikeable_ways as f64 / total_ways as f64
    };

    Ok(BikewayShare {
        bikeable_ways,
        total_ways,
        percent,
    })
}

/// Bicycle shops in the corpus (including ones stored under a merged
/// duplicate key).
pub fn bike_shop_count(store: &dyn DocumentStore) -> Result<u64> {
    store.count(&json!({"$or": [{"shop": "bicycle"}, {"shop_1": "bicycle"}]}))
}

/// The dataset envelope and its approximate area, from the corpus's single
/// bounds document. Missing bounds is an error: the run that produced the
/// corpus was invalid.
pub fn bounds_report(store: &dyn DocumentStore) -> Result<BoundsReport> {
    let bounds = store
        .find(&json!({"type": "bounds"}))?
        .into_iter()
        .next()
        .context("corpus has no bounds document")?;

    let coord = |name: &str| -> Result<f64> {
        bounds
            .get(name)
            .and_then(Value::as_f64)
            .with_context(|| format!("bounds document has no numeric {name}"))
    };
    let (minlat, minlon) = (coord("minlat")?, coord("minlon")?);
    let (maxlat, maxlon) = (coord("maxlat")?, coord("maxlon")?);

    Ok(BoundsReport {
        minlat,
        minlon,
        maxlat,
        maxlon,
        extent: geo::bounds_area(minlat, minlon, maxlat, maxlon)?,
    })
}

/// Extreme coordinates actually observed across documents with a `pos`
/// field, as (minlat, minlon, maxlat, maxlon). `None` when nothing has a
/// position.
pub fn measured_extent(store: &dyn DocumentStore) -> Result<Option<(f64, f64, f64, f64)>> {
    let extreme = |axis: usize, direction: i64| -> Result<Option<f64>> {
        let field = if axis == 0 { "lat" } else { "lon" };
        let rows = store.aggregate(&[
            json!({"$match": {"pos": {"$exists": 1}}}),
            json!({"$project": {"_id": 0, field: {"$arrayElemAt": ["$pos", axis]}}}),
            json!({ "$sort": { field: direction } }),
            json!({"$limit": 1}),
        ])?;
        Ok(rows
            .first()
            .and_then(|row| row.get(field))
            .and_then(Value::as_f64))
    };

    let minlat = extreme(0, 1)?;
    let maxlat = extreme(0, -1)?;
    let minlon = extreme(1, 1)?;
    let maxlon = extreme(1, -1)?;

    Ok(match (minlat, minlon, maxlat, maxlon) {
        (Some(a), Some(b), Some(c), Some(d)) => Some((a, b, c, d)),
        _ => None,
    })
}

fn group_counts(rows: Vec<Value>) -> Vec<GroupCount> {
    rows.into_iter()
        .map(|row| GroupCount {
            key: row
                .get("_id")
                .and_then(Value::as_str)
                .map(str::to_string),
            count: row.get("count").and_then(Value::as_u64).unwrap_or(0),
        })
        .collect()
}
