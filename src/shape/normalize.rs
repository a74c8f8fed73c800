//! Street-name normalization: rewrite abbreviated prefix and type tokens
//! into their canonical full-word forms.
//!
//! The rule tables are ordered and first-match-wins; the order is part of
//! the contract (misspellings must be caught alongside the generic
//! abbreviation they map to) and must not be changed.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Directional prefix abbreviations.
static PREFIX_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bS\b", "South"),
        (r"\bE\b", "East"),
        (r"\bN\b", "North"),
        (r"\bW\b", "West"),
    ]
    .iter()
    .map(|(pattern, full)| (rule(pattern), *full))
    .collect()
});

/// Street-type abbreviations, including common misspellings.
static TYPE_RULES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"\bCt\b", "Court"),
        (r"\b(?:Rd|Raod)\b", "Road"),
        (r"\b(?:Strret|Streer|St)\b", "Street"),
        (r"\bPl\b", "Place"),
        (r"\bPkwy\b", "Parkway"),
        (r"\bLn\b", "Lane"),
        (r"\bDr\b", "Drive"),
        (r"\bCir\b", "Circle"),
        (r"\bBlvd\b", "Boulevard"),
        (r"\bAve\b", "Avenue"),
    ]
    .iter()
    .map(|(pattern, full)| (rule(pattern), *full))
    .collect()
});

fn rule(pattern: &str) -> Regex {
    Regex::new(&format!("(?i){}", pattern)).unwrap()
}

/// Canonicalize a street string.
///
/// Strips all literal periods, then applies at most one prefix rule and at
/// most one type rule, each first-match-wins in declaration order. Pure and
/// deterministic; idempotent on its own output.
pub fn normalize_street(street: &str) -> String {
    let mut street = street.replace('.', "");

    for (re, full) in PREFIX_RULES.iter() {
        if re.is_match(&street) {
            street = re.replace_all(&street, *full).into_owned();
            break;
        }
    }

    for (re, full) in TYPE_RULES.iter() {
        if re.is_match(&street) {
            street = re.replace_all(&street, *full).into_owned();
            break;
        }
    }

    street
}

/// Bookkeeping for street corrections, keyed by the original string.
///
/// Owned by the shaper (or whoever drives it) rather than living as global
/// state; shards from a parallel run can be combined with [`merge`].
///
/// [`merge`]: CorrectionCounters::merge
#[derive(Debug, Default, Clone)]
pub struct CorrectionCounters {
    total: HashMap<String, u64>,
    corrected: HashMap<String, u64>,
}

impl CorrectionCounters {
    pub fn new() -> Self {
        CorrectionCounters::default()
    }

    /// Record one processed street value. Call once per street sub-tag.
    pub fn record(&mut self, original: &str, normalized: &str) {
        *self.total.entry(original.to_string()).or_insert(0) += 1;
        if original != normalized {
            *self.corrected.entry(original.to_string()).or_insert(0) += 1;
        }
    }

    /// Distinct street strings seen.
    pub fn streets_seen(&self) -> usize {
        self.total.len()
    }

    /// Distinct street strings that normalization changed.
    pub fn streets_corrected(&self) -> usize {
        self.corrected.len()
    }

    pub fn occurrences(&self, street: &str) -> u64 {
        self.total.get(street).copied().unwrap_or(0)
    }

    pub fn corrections(&self, street: &str) -> u64 {
        self.corrected.get(street).copied().unwrap_or(0)
    }

    pub fn percent_corrected(&self) -> f64 {
        if self.total.is_empty() {
            return 0.0;
        }
        100.0 * self.corrected.len() as f64 / self.total.len() as f64
    }

    /// Combine counters from another shard.
    pub fn merge(&mut self, other: CorrectionCounters) {
        for (street, n) in other.total {
            *self.total.entry(street).or_insert(0) += n;
        }
        for (street, n) in other.corrected {
            *self.corrected.entry(street).or_insert(0) += n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_prefix_and_type() {
        assert_eq!(normalize_street("N Lincoln Ave"), "North Lincoln Avenue");
        assert_eq!(normalize_street("W Lexington St."), "West Lexington Street");
    }

    #[test]
    fn strips_all_periods() {
        assert_eq!(normalize_street("E. 5th St."), "East 5th Street");
        assert!(!normalize_street("S. Main. St.").contains('.'));
    }

    #[test]
    fn misspellings_map_to_canonical_forms() {
        assert_eq!(normalize_street("Main Raod"), "Main Road");
        assert_eq!(normalize_street("Oak Strret"), "Oak Street");
        assert_eq!(normalize_street("Oak Streer"), "Oak Street");
    }

    #[test]
    fn at_most_one_rule_per_list_applies() {
        // The first matching type rule wins; the later Ave rule must not fire.
        assert_eq!(normalize_street("St Paul Ave"), "Street Paul Ave");
    }

    #[test]
    fn matches_are_case_insensitive_and_word_bounded() {
        assert_eq!(normalize_street("n main st"), "North main Street");
        // "Stanton" must not trip the St rule.
        assert_eq!(normalize_street("Stanton Road"), "Stanton Road");
    }

    #[test]
    fn normalize_is_idempotent() {
        for s in [
            "N Lincoln Ave",
            "W. 38th Pkwy",
            "South Broadway",
            "E Caley Pl",
            "Clarkson Cir",
            "Raod to Nowhere",
        ] {
            let once = normalize_street(s);
            assert_eq!(normalize_street(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn already_canonical_strings_pass_through() {
        assert_eq!(normalize_street("North Lincoln Avenue"), "North Lincoln Avenue");
    }

    #[test]
    fn counters_track_total_and_corrected_separately() {
        let mut counters = CorrectionCounters::new();
        counters.record("N Lincoln Ave", "North Lincoln Avenue");
        counters.record("N Lincoln Ave", "North Lincoln Avenue");
        counters.record("South Broadway", "South Broadway");

        assert_eq!(counters.streets_seen(), 2);
        assert_eq!(counters.streets_corrected(), 1);
        assert_eq!(counters.occurrences("N Lincoln Ave"), 2);
        assert_eq!(counters.corrections("N Lincoln Ave"), 2);
        assert_eq!(counters.corrections("South Broadway"), 0);
        assert_eq!(counters.percent_corrected(), 50.0);
    }

    #[test]
    fn merge_sums_shard_counts() {
        let mut a = CorrectionCounters::new();
        a.record("N Main St", "North Main Street");

        let mut b = CorrectionCounters::new();
        b.record("N Main St", "North Main Street");
        b.record("Elm Street", "Elm Street");

        a.merge(b);
        assert_eq!(a.occurrences("N Main St"), 2);
        assert_eq!(a.corrections("N Main St"), 2);
        assert_eq!(a.streets_seen(), 2);
    }
}
