//! Manifest transformer: strips XML namespace prefixes and filters
//! `Representation` elements down to `id="0"` within each
//! `Period/AdaptationSet`, producing the SSRS-filtered manifest variant.
//!
//! Implemented as a single streaming pass over `quick_xml`'s pull
//! reader/writer rather than a DOM round-trip, since the transform only
//! ever needs to drop a few sibling elements and rewrite tag names.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use thiserror::Error;

/// Error produced when a manifest payload cannot be parsed as XML.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("malformed manifest XML: {0}")]
    Xml(String),
}

/// Strips the namespace prefix (everything up to and including the first
/// `:`) from a qualified element name, e.g. `mpd:Period` → `Period`.
fn local_name(qname: &[u8]) -> &[u8] {
    match qname.iter().position(|&b| b == b':') {
        Some(idx) => &qname[idx + 1..],
        None => qname,
    }
}

fn rename_start(e: &BytesStart<'_>) -> BytesStart<'static> {
    let name = local_name(e.name().as_ref()).to_vec();
    let mut new_elem = BytesStart::new(String::from_utf8_lossy(&name).into_owned());
    for attr in e.attributes().flatten() {
        new_elem.push_attribute(attr);
    }
    new_elem
}

/// Parses `raw` as a DASH MPD, strips namespace prefixes from every
/// element, and removes every `Representation` whose `id` attribute is
/// not `"0"` from each `Period/AdaptationSet`. Preserves the XML
/// declaration and attribute order.
pub fn transform(raw: &[u8]) -> Result<Vec<u8>, ManifestError> {
    let mut reader = Reader::from_reader(raw);
    reader.config_mut().trim_text(false);

    let mut writer = Writer::new(Vec::with_capacity(raw.len()));
    // Stack of (local-name) for currently-open elements, used to decide
    // whether a `Representation` sits directly under an `AdaptationSet`.
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| ManifestError::Xml(e.to_string()))?;
        match event {
            Event::Decl(decl) => {
                writer
                    .write_event(Event::Decl(BytesDecl::from_start(decl)))
                    .map_err(|e| ManifestError::Xml(e.to_string()))?;
            }
            Event::Start(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                if local == b"Representation" && stack.last().map(Vec::as_slice) == Some(b"AdaptationSet" as &[u8]) && !representation_id_is_zero(&e)
                {
                    skip_subtree(&mut reader, &mut buf)
                        .map_err(|e| ManifestError::Xml(e.to_string()))?;
                    continue;
                }
                let renamed = rename_start(&e);
                writer
                    .write_event(Event::Start(renamed))
                    .map_err(|e| ManifestError::Xml(e.to_string()))?;
                stack.push(local);
            }
            Event::Empty(e) => {
                let local = local_name(e.name().as_ref()).to_vec();
                if local == b"Representation" && stack.last().map(Vec::as_slice) == Some(b"AdaptationSet" as &[u8]) && !representation_id_is_zero(&e)
                {
                    continue;
                }
                let renamed = rename_start(&e);
                writer
                    .write_event(Event::Empty(renamed))
                    .map_err(|e| ManifestError::Xml(e.to_string()))?;
            }
            Event::End(e) => {
                stack.pop();
                let local = local_name(e.name().as_ref()).to_vec();
                writer
                    .write_event(Event::End(BytesEnd::new(
                        String::from_utf8_lossy(&local).into_owned(),
                    )))
                    .map_err(|e| ManifestError::Xml(e.to_string()))?;
            }
            Event::Text(e) => {
                writer
                    .write_event(Event::Text(BytesText::from_escaped(
                        String::from_utf8_lossy(e.as_ref()).into_owned(),
                    )))
                    .map_err(|e| ManifestError::Xml(e.to_string()))?;
            }
            Event::Comment(e) => {
                writer
                    .write_event(Event::Comment(e.into_owned()))
                    .map_err(|e| ManifestError::Xml(e.to_string()))?;
            }
            Event::CData(e) => {
                writer
                    .write_event(Event::CData(e.into_owned()))
                    .map_err(|e| ManifestError::Xml(e.to_string()))?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(writer.into_inner())
}

fn representation_id_is_zero(e: &BytesStart<'_>) -> bool {
    e.attributes().flatten().any(|a| {
        a.key.as_ref() == b"id" && a.value.as_ref() == b"0"
    })
}

/// Skips a fully-nested element subtree (already past its opening
/// `Start` event) without writing anything to the output.
fn skip_subtree(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> quick_xml::Result<()> {
    let mut depth = 1u32;
    loop {
        buf.clear();
        match reader.read_event_into(buf)? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
    }
}
