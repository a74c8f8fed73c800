use thiserror::Error;

/// Errors raised while shaping a single element.
///
/// Per-tag anomalies (problem characters, partial lat/lon) are handled by
/// skipping and never surface here; these variants cover the structural
/// failures that invalidate the run.
#[derive(Debug, Error)]
pub enum ShapeError {
    /// A node/way element without an `id` cannot be stored or queried.
    #[error("element is missing the required id attribute")]
    MissingId,

    /// Downstream area computation depends on exactly one valid bounds
    /// document, so a broken one aborts the run.
    #[error("malformed bounds element: {0}")]
    MalformedBounds(String),
}
