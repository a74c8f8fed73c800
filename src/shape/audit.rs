//! Read-only auditing of street values and tag hygiene.
//!
//! Nothing here modifies data; the audit buckets suspicious values so a
//! human can decide which normalization rules are missing before a real
//! run. The normalization rule tables in [`normalize`](crate::shape::normalize)
//! were derived from exactly this kind of report.

use crate::types::{ElementKind, RawElement};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};

/// Last whitespace-delimited token, with an optional trailing period.
static STREET_TYPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(\S+\.?)$").unwrap());

/// Single-letter directional prefix at the start of the string.
static STREET_PREFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^([SENW]\.?)\s+").unwrap());

/// Abbreviated suite marker, e.g. "Ste 200" at the end of the string.
static SUITE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(ste\.?)\s\d+$").unwrap());

/// Street-type suffixes that need no attention.
const EXPECTED_TYPES: [&str; 12] = [
    "Street", "Avenue", "Boulevard", "Drive", "Court", "Place", "Square", "Lane", "Road", "Trail",
    "Parkway", "Commons",
];

/// Findings of one audit pass. All maps key by the suspicious token and
/// collect the full street strings it appeared in.
#[derive(Debug, Default)]
pub struct AuditReport {
    pub unexpected_types: BTreeMap<String, BTreeSet<String>>,
    pub abbreviated_prefixes: BTreeMap<String, BTreeSet<String>>,
    pub suite_markers: BTreeMap<String, BTreeSet<String>>,

    /// Ids of elements carrying a FIXME tag (any casing).
    pub fixme_ids: Vec<String>,

    /// Ids of `amenity=place_of_worship` elements without a `religion` tag.
    pub worship_without_religion: Vec<String>,
}

impl AuditReport {
    pub fn new() -> Self {
        AuditReport::default()
    }

    pub fn observe_element(&mut self, element: &RawElement) {
        if !matches!(element.kind, ElementKind::Node | ElementKind::Way) {
            return;
        }

        let mut is_place_of_worship = false;
        let mut has_religion = false;
        let mut has_fixme = false;

        for (key, value) in &element.tags {
            if key == "addr:street" {
                self.observe_street(value);
            }
            if key.eq_ignore_ascii_case("fixme") {
                has_fixme = true;
            }
            if key == "amenity" && value == "place_of_worship" {
                is_place_of_worship = true;
            }
            if key == "religion" {
                has_religion = true;
            }
        }

        if let Some(id) = element.attr("id") {
            if has_fixme {
                self.fixme_ids.push(id.to_string());
            }
            if is_place_of_worship && !has_religion {
                self.worship_without_religion.push(id.to_string());
            }
        }
    }

    pub fn observe_street(&mut self, street: &str) {
        if let Some(caps) = STREET_TYPE_RE.captures(street) {
            let suffix = &caps[1];
            if !EXPECTED_TYPES.contains(&suffix) {
                self.unexpected_types
                    .entry(suffix.to_string())
                    .or_default()
                    .insert(street.to_string());
            }
        }
        if let Some(caps) = STREET_PREFIX_RE.captures(street) {
            self.abbreviated_prefixes
                .entry(caps[1].to_string())
                .or_default()
                .insert(street.to_string());
        }
        if let Some(caps) = SUITE_RE.captures(street) {
            self.suite_markers
                .entry(caps[1].to_string())
                .or_default()
                .insert(street.to_string());
        }
    }
}
