use crate::types::ShapedDocument;
use anyhow::{Context, Result};
use std::io::Write;

/// Writes shaped documents as newline-delimited JSON, one document per line.
///
/// The pretty flag switches each record to indented form; it changes the
/// representation only, never the field values.
pub struct DocumentWriter<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> DocumentWriter<W> {
    pub fn new(writer: W, pretty: bool) -> Self {
        DocumentWriter { writer, pretty }
    }

    pub fn write_document(&mut self, doc: &ShapedDocument) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(doc)
        } else {
            serde_json::to_string(doc)
        }
        .context("Failed to serialize document")?;

        writeln!(self.writer, "{}", json).context("Failed to write document")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocType, ElementDocument};
    use serde_json::{json, Value};

    fn sample() -> ShapedDocument {
        let mut doc = ElementDocument::new("1".to_string(), DocType::Node);
        doc.extra.insert("amenity".to_string(), json!("cafe"));
        ShapedDocument::Element(doc)
    }

    #[test]
    fn compact_writes_one_line_per_document() {
        let mut buffer = Vec::new();
        let mut writer = DocumentWriter::new(&mut buffer, false);
        writer.write_document(&sample()).unwrap();
        writer.write_document(&sample()).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(output.lines().all(|l| l.starts_with('{')));
    }

    #[test]
    fn pretty_mode_preserves_field_values() {
        let mut compact = Vec::new();
        DocumentWriter::new(&mut compact, false)
            .write_document(&sample())
            .unwrap();

        let mut pretty = Vec::new();
        DocumentWriter::new(&mut pretty, true)
            .write_document(&sample())
            .unwrap();

        let a: Value = serde_json::from_slice(&compact).unwrap();
        let b: Value = serde_json::from_str(&String::from_utf8(pretty).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
