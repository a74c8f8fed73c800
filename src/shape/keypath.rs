//! Key-path resolution: decide where a sub-tag key lands in the shaped
//! document, if anywhere.

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters that cannot be safely represented in a field name.
static PROBLEM_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[=\+/&<>;'"\?%#$@,\. \t\r\n]"#).unwrap());

/// Keys that are conventionally all-caps in the source vocabulary and must
/// keep that case.
const UPPERCASE_KEYS: [&str; 2] = ["FIXME", "NHS"];

/// Placement policy for one sub-tag key. Every key maps to exactly one
/// variant; a key is never written to more than one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// The key cannot be represented as a field name, or is a redundant
    /// decomposition of the street field; the tag is ignored.
    Dropped,

    /// Stored as a top-level scalar field.
    TopLevel(String),

    /// Stored under the nested `address` map.
    Address(String),

    /// Multi-segment key flattened into a single `_`-joined field name.
    ///
    /// A merged name can collide with a genuinely different key that already
    /// contains literal underscores (`addr_x:y` vs `addr_x_y`). The flattening
    /// is kept as-is; the collision risk is accepted.
    Merged(String),
}

/// Resolve a sub-tag key to its placement.
pub fn resolve_key(key: &str) -> Placement {
    if PROBLEM_CHARS.is_match(key) {
        return Placement::Dropped;
    }

    let segments: Vec<&str> = key.split(':').collect();
    match segments.as_slice() {
        [single] => {
            let upper = single.to_uppercase();
            if UPPERCASE_KEYS.contains(&upper.as_str()) {
                Placement::TopLevel(upper)
            } else {
                Placement::TopLevel(single.to_lowercase())
            }
        }
        ["addr", field] => Placement::Address((*field).to_string()),
        ["addr", "street", ..] => Placement::Dropped,
        _ => Placement::Merged(segments.join("_")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn problem_characters_drop_the_tag() {
        for key in [
            "addr street",
            "name?",
            "a.b",
            "x=y",
            "tab\there",
            "new\nline",
            "pct%",
        ] {
            assert_eq!(resolve_key(key), Placement::Dropped, "key {key:?}");
        }
    }

    #[test]
    fn single_segment_is_top_level_lowercased() {
        assert_eq!(
            resolve_key("Amenity"),
            Placement::TopLevel("amenity".to_string())
        );
        assert_eq!(
            resolve_key("highway"),
            Placement::TopLevel("highway".to_string())
        );
    }

    #[test]
    fn fixme_and_nhs_are_uppercased() {
        assert_eq!(resolve_key("FixMe"), Placement::TopLevel("FIXME".to_string()));
        assert_eq!(resolve_key("fixme"), Placement::TopLevel("FIXME".to_string()));
        assert_eq!(resolve_key("nhs"), Placement::TopLevel("NHS".to_string()));
    }

    #[test]
    fn addr_pairs_go_to_the_address_map() {
        assert_eq!(
            resolve_key("addr:street"),
            Placement::Address("street".to_string())
        );
        assert_eq!(
            resolve_key("addr:housenumber"),
            Placement::Address("housenumber".to_string())
        );
    }

    #[test]
    fn street_decompositions_are_dropped() {
        assert_eq!(resolve_key("addr:street:name"), Placement::Dropped);
        assert_eq!(resolve_key("addr:street:prefix"), Placement::Dropped);
        assert_eq!(resolve_key("addr:street:type"), Placement::Dropped);
    }

    #[test]
    fn other_multi_segment_keys_merge_with_underscores() {
        assert_eq!(
            resolve_key("tiger:county"),
            Placement::Merged("tiger_county".to_string())
        );
        assert_eq!(
            resolve_key("gnis:feature:id"),
            Placement::Merged("gnis_feature_id".to_string())
        );
        // Deep addr keys that are not street decompositions still merge.
        assert_eq!(
            resolve_key("addr:city:suffix"),
            Placement::Merged("addr_city_suffix".to_string())
        );
    }
}
