//! Per-element document construction: attribute extraction, key-path
//! resolution, and street normalization combined into one operation.

use crate::error::ShapeError;
use crate::shape::keypath::{resolve_key, Placement};
use crate::shape::normalize::{normalize_street, CorrectionCounters};
use crate::types::{
    BoundsDocument, DocType, ElementDocument, ElementKind, RawElement, ShapedDocument,
    CREATED_ATTRIBUTES,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Typed fields of [`ElementDocument`]. A bare sub-tag key that resolves to
/// one of these names would collide with the fixed schema on serialization,
/// so it is dropped instead.
const RESERVED_FIELDS: [&str; 7] = [
    "id",
    "type",
    "visible",
    "created",
    "pos",
    "address",
    "node_refs",
];

/// Turns raw elements into shaped documents.
///
/// The correction counters are the only cross-call mutable state; shaping is
/// otherwise a pure function of the element and the static rule tables.
#[derive(Debug, Default)]
pub struct DocumentShaper {
    counters: CorrectionCounters,
    tags_dropped: u64,
}

impl DocumentShaper {
    pub fn new() -> Self {
        DocumentShaper::default()
    }

    pub fn counters(&self) -> &CorrectionCounters {
        &self.counters
    }

    pub fn into_counters(self) -> CorrectionCounters {
        self.counters
    }

    /// Sub-tags dropped so far (problem characters, street decompositions,
    /// reserved-name collisions).
    pub fn tags_dropped(&self) -> u64 {
        self.tags_dropped
    }

    /// Shape one element. Returns `Ok(None)` for element kinds outside the
    /// node/way/bounds vocabulary.
    pub fn shape(&mut self, element: &RawElement) -> Result<Option<ShapedDocument>, ShapeError> {
        match element.kind {
            ElementKind::Bounds => Ok(Some(ShapedDocument::Bounds(shape_bounds(element)?))),
            ElementKind::Node => self
                .shape_element(element, DocType::Node)
                .map(|doc| Some(ShapedDocument::Element(doc))),
            ElementKind::Way => self
                .shape_element(element, DocType::Way)
                .map(|doc| Some(ShapedDocument::Element(doc))),
            ElementKind::Other => Ok(None),
        }
    }

    fn shape_element(
        &mut self,
        element: &RawElement,
        doc_type: DocType,
    ) -> Result<ElementDocument, ShapeError> {
        let id = element.attr("id").ok_or(ShapeError::MissingId)?;
        let mut doc = ElementDocument::new(id.to_string(), doc_type);

        doc.visible = element.attr("visible").map(str::to_string);

        let created: BTreeMap<String, String> = CREATED_ATTRIBUTES
            .iter()
            .filter_map(|key| element.attr(key).map(|v| (key.to_string(), v.to_string())))
            .collect();
        if !created.is_empty() {
            doc.created = Some(created);
        }

        doc.pos = parse_pos(element);

        for (key, value) in &element.tags {
            match resolve_key(key) {
                Placement::Dropped => self.tags_dropped += 1,
                Placement::TopLevel(name) | Placement::Merged(name) => {
                    if RESERVED_FIELDS.contains(&name.as_str()) {
                        self.tags_dropped += 1;
                    } else {
                        doc.extra.insert(name, Value::String(value.clone()));
                    }
                }
                Placement::Address(field) => {
                    let stored = if field == "street" {
                        let normalized = normalize_street(value);
                        self.counters.record(value, &normalized);
                        normalized
                    } else {
                        value.clone()
                    };
                    doc.address
                        .get_or_insert_with(BTreeMap::new)
                        .insert(field, stored);
                }
            }
        }

        if doc_type == DocType::Way && !element.node_refs.is_empty() {
            doc.node_refs = Some(element.node_refs.clone());
        }

        Ok(doc)
    }
}

fn shape_bounds(element: &RawElement) -> Result<BoundsDocument, ShapeError> {
    let coord = |name: &str| -> Result<f64, ShapeError> {
        let raw = element
            .attr(name)
            .ok_or_else(|| ShapeError::MalformedBounds(format!("missing attribute {name}")))?;
        raw.parse::<f64>().map_err(|_| {
            ShapeError::MalformedBounds(format!("attribute {name} is not numeric: {raw:?}"))
        })
    };

    Ok(BoundsDocument {
        doc_type: DocType::Bounds,
        minlat: coord("minlat")?,
        minlon: coord("minlon")?,
        maxlat: coord("maxlat")?,
        maxlon: coord("maxlon")?,
    })
}

/// `pos` is present iff both coordinates are present and parseable; a lone
/// or unparseable lat/lon yields no field at all.
fn parse_pos(element: &RawElement) -> Option<[f64; 2]> {
    let lat = element.attr("lat")?.parse::<f64>().ok()?;
    let lon = element.attr("lon")?.parse::<f64>().ok()?;
    Some([lat, lon])
}
