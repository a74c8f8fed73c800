use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Attributes that are folded into the `created` sub-document.
pub const CREATED_ATTRIBUTES: [&str; 5] = ["version", "changeset", "timestamp", "user", "uid"];

/// Element vocabulary, decided once at parse time.
///
/// Anything that is not a `node`, `way`, or `bounds` element (relations,
/// metadata blocks) is `Other` and produces no document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Node,
    Way,
    Bounds,
    Other,
}

impl ElementKind {
    pub fn from_tag_name(name: &str) -> Self {
        match name {
            "node" => ElementKind::Node,
            "way" => ElementKind::Way,
            "bounds" => ElementKind::Bounds,
            _ => ElementKind::Other,
        }
    }
}

/// One parsed markup element, built by the streaming parser and consumed
/// immediately by the shaper.
#[derive(Debug, Clone)]
pub struct RawElement {
    pub kind: ElementKind,

    /// Element attributes (`id`, `lat`, `lon`, `visible`, the created set).
    pub attributes: HashMap<String, String>,

    /// Child `(k, v)` sub-tags, in file order.
    pub tags: Vec<(String, String)>,

    /// Child `nd` reference ids, in file order. Populated for ways only.
    pub node_refs: Vec<String>,
}

impl RawElement {
    pub fn new(kind: ElementKind) -> Self {
        RawElement {
            kind,
            attributes: HashMap::new(),
            tags: Vec::new(),
            node_refs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Serialized `type` field of a shaped document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    Node,
    Way,
    Bounds,
}

/// The storage-ready output unit: either the dataset's coordinate envelope
/// or a flattened node/way document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShapedDocument {
    Bounds(BoundsDocument),
    Element(ElementDocument),
}

impl ShapedDocument {
    pub fn as_element(&self) -> Option<&ElementDocument> {
        match self {
            ShapedDocument::Element(doc) => Some(doc),
            ShapedDocument::Bounds(_) => None,
        }
    }

    pub fn as_bounds(&self) -> Option<&BoundsDocument> {
        match self {
            ShapedDocument::Bounds(doc) => Some(doc),
            ShapedDocument::Element(_) => None,
        }
    }

    /// Source element id; bounds documents carry none.
    pub fn id(&self) -> Option<&str> {
        self.as_element().map(|doc| doc.id.as_str())
    }
}

/// Minimal document for the dataset's coordinate envelope. Bounds elements
/// skip all sub-tag processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundsDocument {
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub minlat: f64,
    pub minlon: f64,
    pub maxlat: f64,
    pub maxlon: f64,
}

/// Flattened node/way document.
///
/// The well-known fields are typed; dynamically named fields produced by
/// key merging live in `extra` and are flattened into the document on
/// serialization. Absent optional fields are omitted from the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementDocument {
    pub id: String,

    #[serde(rename = "type")]
    pub doc_type: DocType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<BTreeMap<String, String>>,

    /// `[lat, lon]`, present iff both attributes were numerically parseable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<[f64; 2]>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<BTreeMap<String, String>>,

    /// Ordered way references; order and duplicates preserve the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_refs: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ElementDocument {
    pub fn new(id: String, doc_type: DocType) -> Self {
        ElementDocument {
            id,
            doc_type,
            visible: None,
            created: None,
            pos: None,
            address: None,
            node_refs: None,
            extra: Map::new(),
        }
    }
}
