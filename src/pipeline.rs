//! Single-pass pipeline driver: element stream in, newline-delimited
//! documents out, input order preserved.

use crate::parser::ElementReader;
use crate::shape::audit::AuditReport;
use crate::shape::normalize::CorrectionCounters;
use crate::shape::shaper::DocumentShaper;
use crate::shape::writer::DocumentWriter;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// What one pipeline run did. Returned only on clean termination; an
/// aborted run invalidates any lines already written.
#[derive(Debug)]
pub struct PipelineSummary {
    pub elements_seen: u64,
    pub documents_written: u64,
    pub tags_dropped: u64,
    pub counters: CorrectionCounters,
}

/// Consume the element stream exactly once, shaping each element and
/// writing every resulting document in input order.
pub fn process_stream<R: BufRead, W: Write>(
    input: R,
    output: W,
    pretty: bool,
) -> Result<PipelineSummary> {
    let mut writer = DocumentWriter::new(output, pretty);
    let mut shaper = DocumentShaper::new();
    let mut elements_seen = 0u64;
    let mut documents_written = 0u64;

    for element in ElementReader::new(input) {
        let element = element.context("Failed to read element stream")?;
        elements_seen += 1;

        if let Some(doc) = shaper.shape(&element)? {
            writer.write_document(&doc)?;
            documents_written += 1;
        }
    }

    writer.flush()?;

    Ok(PipelineSummary {
        elements_seen,
        documents_written,
        tags_dropped: shaper.tags_dropped(),
        counters: shaper.into_counters(),
    })
}

/// Shape `<input>` into `<input>.json` beside it.
pub fn process_file<P: AsRef<Path>>(input: P, pretty: bool) -> Result<PipelineSummary> {
    let input = input.as_ref();
    let output_path = format!("{}.json", input.display());

    let reader = BufReader::new(
        File::open(input).with_context(|| format!("Failed to open {}", input.display()))?,
    );
    let writer = BufWriter::new(
        File::create(&output_path).with_context(|| format!("Failed to create {output_path}"))?,
    );

    process_stream(reader, writer, pretty)
}

/// Run the read-only audit pass over an element stream.
pub fn audit_stream<R: BufRead>(input: R) -> Result<AuditReport> {
    let mut report = AuditReport::new();
    for element in ElementReader::new(input) {
        let element = element.context("Failed to read element stream")?;
        report.observe_element(&element);
    }
    Ok(report)
}
