//! # osmwrangle - OpenStreetMap Wrangling Toolkit
//!
//! A library for shaping raw OpenStreetMap elements (`node`, `way`,
//! `bounds`) into flat, storage-ready JSON documents, normalizing
//! abbreviated street names along the way, and running a battery of
//! grouped reports over the resulting corpus.
//!
//! ## Modules
//!
//! - **parser**: streaming markup reader producing one element at a time
//! - **shape**: key-path resolution, street normalization, and per-element
//!   document construction
//! - **pipeline**: the single-pass drive from input stream to NDJSON output
//! - **report**: grouped aggregate queries and the city-repair operation
//!
//! ## Quick Start
//!
//! ```rust
//! use osmwrangle::pipeline::process_stream;
//!
//! # fn main() -> anyhow::Result<()> {
//! let xml = r#"<osm>
//!   <node id="1" lat="41.97" lon="-87.68">
//!     <tag k="addr:street" v="N Lincoln Ave"/>
//!   </node>
//! </osm>"#;
//!
//! let mut out = Vec::new();
//! let summary = process_stream(xml.as_bytes(), &mut out, false)?;
//!
//! assert_eq!(summary.documents_written, 1);
//! assert!(String::from_utf8(out)?.contains("North Lincoln Avenue"));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod parser;
pub mod pipeline;
pub mod report;
pub mod shape;
pub mod types;

// Re-export commonly used types for convenience
pub use error::ShapeError;
pub use parser::ElementReader;
pub use pipeline::{audit_stream, process_file, process_stream, PipelineSummary};
pub use report::{DocumentStore, MemoryStore};
pub use shape::{
    normalize_street, resolve_key, AuditReport, CorrectionCounters, DocumentShaper,
    DocumentWriter, Placement,
};
pub use types::{
    BoundsDocument, DocType, ElementDocument, ElementKind, RawElement, ShapedDocument,
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{fix_cities, overview};
    use serde_json::{json, Value};
    use std::collections::BTreeMap;

    const SAMPLE: &str = r#"<osm>
  <bounds minlat="41.9" minlon="-87.7" maxlat="42.0" maxlon="-87.6"/>
  <node id="1" lat="41.97" lon="-87.68" user="bbmiller" uid="451048">
    <tag k="addr:street" v="N Lincoln Ave"/>
    <tag k="addr:city" v="Chicgo"/>
  </node>
  <way id="2" user="bbmiller" uid="451048">
    <nd ref="1"/>
    <tag k="highway" v="cycleway"/>
  </way>
</osm>
"#;

    #[test]
    fn shape_then_report_end_to_end() {
        let mut out = Vec::new();
        let summary = process_stream(SAMPLE.as_bytes(), &mut out, false).unwrap();
        assert_eq!(summary.documents_written, 3);

        let mut store = MemoryStore::from_ndjson(out.as_slice()).unwrap();

        let stats = overview(&store, "bbmiller").unwrap();
        assert_eq!(stats.total_documents, 3);
        assert_eq!(stats.nodes + stats.ways, 2);

        let corrections: BTreeMap<String, String> =
            [("Chicgo".to_string(), "Chicago".to_string())].into();
        assert_eq!(fix_cities(&mut store, &corrections).unwrap(), 1);
        assert_eq!(fix_cities(&mut store, &corrections).unwrap(), 0);
    }

    #[test]
    fn document_ids_match_source_elements() {
        let mut out = Vec::new();
        process_stream(SAMPLE.as_bytes(), &mut out, false).unwrap();

        let ids: Vec<Value> = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap())
            .map(|d| d.get("id").cloned().unwrap_or(Value::Null))
            .collect();
        assert_eq!(ids, vec![json!(null), json!("1"), json!("2")]);
    }
}
