//! Document shaping: the transform from raw markup elements to flat,
//! storage-ready documents.
//!
//! The pieces compose leaf to root: the normalization rule engine rewrites
//! abbreviated street tokens, the key-path resolver places each sub-tag,
//! and the shaper drives both per element.

pub mod audit;
pub mod keypath;
pub mod normalize;
pub mod shaper;
pub mod writer;

pub use audit::AuditReport;
pub use keypath::{resolve_key, Placement};
pub use normalize::{normalize_street, CorrectionCounters};
pub use shaper::DocumentShaper;
pub use writer::DocumentWriter;
