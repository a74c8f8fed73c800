//! Streaming markup parser: pulls one element at a time from the input,
//! holding only the current element in memory.

use crate::types::{ElementKind, RawElement};
use anyhow::{bail, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

/// Single-pass reader producing [`RawElement`]s in file order.
///
/// Child `tag` and `nd` entries are collected in file order; other nested
/// content (relation members, text) is consumed and ignored. An XML syntax
/// error aborts the iteration.
pub struct ElementReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> ElementReader<R> {
    pub fn new(source: R) -> Self {
        ElementReader {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            done: false,
        }
    }

    fn read_element(&mut self) -> Result<Option<RawElement>> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Empty(start) => {
                    if element_name(&start)? == "osm" {
                        continue;
                    }
                    let element = begin_element(&start)?;
                    return Ok(Some(element));
                }
                Event::Start(start) => {
                    let name = element_name(&start)?;
                    // The document root wraps the element stream.
                    if name == "osm" {
                        continue;
                    }
                    let mut element = begin_element(&start)?;
                    self.collect_children(&mut element)?;
                    return Ok(Some(element));
                }
                Event::Eof => return Ok(None),
                _ => continue,
            }
        }
    }

    /// Consume events up to the current element's closing tag, recording
    /// `tag` and `nd` children along the way.
    fn collect_children(&mut self, element: &mut RawElement) -> Result<()> {
        let mut depth = 0usize;
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match self.reader.read_event_into(&mut buf)? {
                Event::Empty(child) => record_child(&child, element)?,
                Event::Start(child) => {
                    record_child(&child, element)?;
                    depth += 1;
                }
                Event::End(_) => {
                    if depth == 0 {
                        return Ok(());
                    }
                    depth -= 1;
                }
                Event::Eof => bail!("unexpected end of input inside an element"),
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for ElementReader<R> {
    type Item = Result<RawElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn element_name(start: &BytesStart) -> Result<String> {
    Ok(String::from_utf8_lossy(start.name().local_name().as_ref()).into_owned())
}

fn begin_element(start: &BytesStart) -> Result<RawElement> {
    let name = element_name(start)?;
    let mut element = RawElement::new(ElementKind::from_tag_name(&name));
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

fn record_child(child: &BytesStart, element: &mut RawElement) -> Result<()> {
    match child.name().local_name().as_ref() {
        b"tag" => {
            let mut k = None;
            let mut v = None;
            for attr in child.attributes() {
                let attr = attr?;
                match attr.key.local_name().as_ref() {
                    b"k" => k = Some(attr.unescape_value()?.into_owned()),
                    b"v" => v = Some(attr.unescape_value()?.into_owned()),
                    _ => {}
                }
            }
            if let (Some(k), Some(v)) = (k, v) {
                element.tags.push((k, v));
            }
        }
        b"nd" => {
            for attr in child.attributes() {
                let attr = attr?;
                if attr.key.local_name().as_ref() == b"ref" {
                    element.node_refs.push(attr.unescape_value()?.into_owned());
                }
            }
        }
        _ => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="test">
  <bounds minlat="41.9" minlon="-87.7" maxlat="42.0" maxlon="-87.6"/>
  <node id="261114295" visible="true" version="7" changeset="11129782"
        timestamp="2012-03-28T18:31:23Z" user="bbmiller" uid="451048"
        lat="41.9730791" lon="-87.6866303"/>
  <node id="261114296" lat="41.9" lon="-87.6">
    <tag k="amenity" v="restaurant"/>
    <tag k="addr:street" v="N Lincoln Ave"/>
  </node>
  <way id="2636086" visible="true" user="chicago-buildings" uid="674454">
    <nd ref="2199822281"/>
    <nd ref="2199822390"/>
    <nd ref="2199822281"/>
    <tag k="building" v="yes"/>
  </way>
  <relation id="1" visible="true">
    <member type="way" ref="2636086" role="outer"/>
    <tag k="type" v="multipolygon"/>
  </relation>
</osm>
"#;

    fn read_all(input: &str) -> Vec<RawElement> {
        ElementReader::new(input.as_bytes())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn yields_elements_in_file_order() {
        let elements = read_all(SAMPLE);
        let kinds: Vec<ElementKind> = elements.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ElementKind::Bounds,
                ElementKind::Node,
                ElementKind::Node,
                ElementKind::Way,
                ElementKind::Other,
            ]
        );
    }

    #[test]
    fn collects_attributes_and_tags() {
        let elements = read_all(SAMPLE);
        let node = &elements[2];
        assert_eq!(node.attr("id"), Some("261114296"));
        assert_eq!(
            node.tags,
            vec![
                ("amenity".to_string(), "restaurant".to_string()),
                ("addr:street".to_string(), "N Lincoln Ave".to_string()),
            ]
        );
    }

    #[test]
    fn collects_way_refs_in_order_with_duplicates() {
        let elements = read_all(SAMPLE);
        let way = &elements[3];
        assert_eq!(way.kind, ElementKind::Way);
        assert_eq!(
            way.node_refs,
            vec!["2199822281", "2199822390", "2199822281"]
        );
        assert_eq!(way.tags.len(), 1);
    }

    #[test]
    fn relation_members_do_not_leak_as_elements() {
        let elements = read_all(SAMPLE);
        assert_eq!(elements.len(), 5);
    }

    #[test]
    fn unescapes_attribute_entities() {
        let xml = r#"<osm><node id="1" lat="1" lon="2">
            <tag k="name" v="Bob&apos;s Caf&#233; &amp; Grill"/>
        </node></osm>"#;
        let elements = read_all(xml);
        assert_eq!(elements[0].tags[0].1, "Bob's Café & Grill");
    }

    #[test]
    fn truncated_input_is_an_error() {
        let xml = r#"<osm><way id="1"><nd ref="2"/>"#;
        let result: Result<Vec<_>> = ElementReader::new(xml.as_bytes()).collect();
        assert!(result.is_err());
    }
}
