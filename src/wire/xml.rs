//! XML codec for the document-family endpoints.
//!
//! Decoding maps a request body onto a [`WireDoc`]: top-level elements become
//! scalar fields (leading text only), `patient` becomes a nested section of
//! its direct children, and `studies` becomes the list of its `study` items.
//! Encoding is asymmetric: [`encode`] emits a flat `<response>`
//! document from name/value pairs, and [`encode_tree`] exists only for the
//! file-analysis replies that mirror structured model output.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{is_nested_field, list_item_tag, WireDoc, WireError, WireValue};

/// Root tag of every encoded reply document.
pub const RESPONSE_ROOT: &str = "response";

/// Tag used for array entries when encoding structured trees.
const LIST_ITEM: &str = "item";

/// Strict decode: any body that is not a well-formed XML document with a
/// single root element is a [`WireError::Malformed`].
pub fn decode(body: &[u8]) -> Result<WireDoc, WireError> {
    let text = std::str::from_utf8(body).map_err(WireError::malformed)?;
    decode_str(text)
}

/// Legacy decode: malformed input collapses to an empty document, so missing
/// fields surface downstream as ordinary missing-field errors.
pub fn decode_lossy(body: &[u8]) -> WireDoc {
    decode(body).unwrap_or_default()
}

pub fn decode_str(input: &str) -> Result<WireDoc, WireError> {
    let mut reader = Reader::from_str(input);
    reader.config_mut().trim_text(true);

    let mut doc = WireDoc::default();
    let mut in_root = false;
    let mut root_closed = false;

    loop {
        match reader.read_event().map_err(WireError::malformed)? {
            Event::Eof => {
                if !in_root {
                    return Err(WireError::Malformed(
                        "no document element found".to_string(),
                    ));
                }
                if !root_closed {
                    return Err(WireError::Malformed(
                        "unclosed document element".to_string(),
                    ));
                }
                return Ok(doc);
            }
            Event::Start(start) => {
                if root_closed {
                    return Err(WireError::Malformed(
                        "content after document element".to_string(),
                    ));
                }
                if !in_root {
                    in_root = true;
                    continue;
                }
                let name = element_name(&start);
                let value = if is_nested_field(&name) {
                    WireValue::Section(read_section(&mut reader, &name)?)
                } else if let Some(item_tag) = list_item_tag(&name) {
                    WireValue::List(read_list(&mut reader, &name, item_tag)?)
                } else {
                    WireValue::Text(read_scalar(&mut reader, &name)?)
                };
                doc.push(name, value);
            }
            Event::Empty(start) => {
                if root_closed {
                    return Err(WireError::Malformed(
                        "content after document element".to_string(),
                    ));
                }
                if !in_root {
                    in_root = true;
                    root_closed = true;
                    continue;
                }
                let name = element_name(&start);
                let value = if is_nested_field(&name) {
                    WireValue::Section(Vec::new())
                } else if list_item_tag(&name).is_some() {
                    WireValue::List(Vec::new())
                } else {
                    WireValue::Text(String::new())
                };
                doc.push(name, value);
            }
            Event::End(_) => {
                if root_closed {
                    return Err(WireError::Malformed(
                        "content after document element".to_string(),
                    ));
                }
                root_closed = true;
            }
            Event::Text(_) => {
                if !in_root || root_closed {
                    return Err(WireError::Malformed(
                        "text outside of document element".to_string(),
                    ));
                }
            }
            _ => {}
        }
    }
}

/// Reads a scalar field through its closing tag. Only the text before the
/// first child element counts, matching how the legacy peers read `.text`.
fn read_scalar(reader: &mut Reader<&[u8]>, field: &str) -> Result<String, WireError> {
    let mut leading: Option<String> = None;
    let mut seen_child = false;
    let mut depth = 0usize;

    loop {
        match reader.read_event().map_err(WireError::malformed)? {
            Event::Eof => {
                return Err(WireError::Malformed(format!("unclosed element `{field}`")));
            }
            Event::Start(_) => {
                seen_child = true;
                depth += 1;
            }
            Event::Empty(_) => {
                seen_child = true;
            }
            Event::End(_) => {
                if depth == 0 {
                    return Ok(leading.unwrap_or_default());
                }
                depth -= 1;
            }
            Event::Text(text) => {
                if depth == 0 && !seen_child && leading.is_none() {
                    leading = Some(
                        text.unescape()
                            .map_err(WireError::malformed)?
                            .into_owned(),
                    );
                }
            }
            Event::CData(data) => {
                if depth == 0 && !seen_child && leading.is_none() {
                    leading = Some(String::from_utf8_lossy(&data.into_inner()).into_owned());
                }
            }
            _ => {}
        }
    }
}

/// Reads a nested container: each direct child becomes a tag/text pair.
fn read_section(
    reader: &mut Reader<&[u8]>,
    field: &str,
) -> Result<Vec<(String, String)>, WireError> {
    let mut fields = Vec::new();
    loop {
        match reader.read_event().map_err(WireError::malformed)? {
            Event::Eof => {
                return Err(WireError::Malformed(format!("unclosed element `{field}`")));
            }
            Event::Start(start) => {
                let name = element_name(&start);
                let value = read_scalar(reader, &name)?;
                fields.push((name, value));
            }
            Event::Empty(start) => {
                fields.push((element_name(&start), String::new()));
            }
            Event::End(_) => return Ok(fields),
            _ => {}
        }
    }
}

/// Reads a repeated-item container: direct children with the item tag
/// contribute their text, anything else inside is skipped.
fn read_list(
    reader: &mut Reader<&[u8]>,
    field: &str,
    item_tag: &str,
) -> Result<Vec<String>, WireError> {
    let mut items = Vec::new();
    loop {
        match reader.read_event().map_err(WireError::malformed)? {
            Event::Eof => {
                return Err(WireError::Malformed(format!("unclosed element `{field}`")));
            }
            Event::Start(start) => {
                let name = element_name(&start);
                let value = read_scalar(reader, &name)?;
                if name == item_tag {
                    items.push(value);
                }
            }
            Event::Empty(start) => {
                if element_name(&start) == item_tag {
                    items.push(String::new());
                }
            }
            Event::End(_) => return Ok(items),
            _ => {}
        }
    }
}

fn element_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

/// Encodes a flat `<response>` document. Values are emitted as text content
/// in the order given; there is no way to nest, which keeps replies in the
/// one shape the legacy clients parse.
pub fn encode(fields: &[(&str, String)]) -> Result<String, WireError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Start(BytesStart::new(RESPONSE_ROOT)))
        .map_err(WireError::encode_failed)?;
    for (name, value) in fields {
        checked_name(name)?;
        write_text_element(&mut writer, name, value)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(RESPONSE_ROOT)))
        .map_err(WireError::encode_failed)?;
    finish(writer)
}

/// Encodes an arbitrary JSON value as a nested `<response>` tree. Objects
/// become child elements, arrays repeat an `item` element per entry, null
/// becomes an empty element. Used only for structured file-analysis replies.
pub fn encode_tree(payload: &serde_json::Value) -> Result<String, WireError> {
    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Start(BytesStart::new(RESPONSE_ROOT)))
        .map_err(WireError::encode_failed)?;
    write_value(&mut writer, payload)?;
    writer
        .write_event(Event::End(BytesEnd::new(RESPONSE_ROOT)))
        .map_err(WireError::encode_failed)?;
    finish(writer)
}

fn write_value(writer: &mut Writer<Vec<u8>>, value: &serde_json::Value) -> Result<(), WireError> {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                checked_name(key)?;
                writer
                    .write_event(Event::Start(BytesStart::new(key.as_str())))
                    .map_err(WireError::encode_failed)?;
                write_value(writer, child)?;
                writer
                    .write_event(Event::End(BytesEnd::new(key.as_str())))
                    .map_err(WireError::encode_failed)?;
            }
        }
        serde_json::Value::Array(items) => {
            for item in items {
                writer
                    .write_event(Event::Start(BytesStart::new(LIST_ITEM)))
                    .map_err(WireError::encode_failed)?;
                write_value(writer, item)?;
                writer
                    .write_event(Event::End(BytesEnd::new(LIST_ITEM)))
                    .map_err(WireError::encode_failed)?;
            }
        }
        serde_json::Value::Null => {}
        serde_json::Value::String(text) => {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(WireError::encode_failed)?;
        }
        other => {
            writer
                .write_event(Event::Text(BytesText::new(&other.to_string())))
                .map_err(WireError::encode_failed)?;
        }
    }
    Ok(())
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    value: &str,
) -> Result<(), WireError> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(WireError::encode_failed)?;
    writer
        .write_event(Event::Text(BytesText::new(value)))
        .map_err(WireError::encode_failed)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(WireError::encode_failed)?;
    Ok(())
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String, WireError> {
    String::from_utf8(writer.into_inner()).map_err(WireError::encode_failed)
}

fn checked_name(name: &str) -> Result<(), WireError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    let valid_rest =
        chars.all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(WireError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_ok(input: &str) -> WireDoc {
        match decode_str(input) {
            Ok(doc) => doc,
            Err(err) => panic!("expected decode to succeed, got {err}"),
        }
    }

    #[test]
    fn decodes_scalar_fields_in_order() {
        let doc = decode_ok(
            "<request><session_id>abc</session_id><message>Hola</message></request>",
        );
        assert_eq!(doc.text("session_id"), Some("abc"));
        assert_eq!(doc.text("message"), Some("Hola"));
        let names: Vec<&str> = doc.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["session_id", "message"]);
    }

    #[test]
    fn decodes_nested_patient_section() {
        let doc = decode_ok(
            "<request><patient><name>Ana</name><age>34</age></patient>\
             <symptoms>tos</symptoms></request>",
        );
        let patient = doc.section("patient").unwrap();
        assert_eq!(
            patient,
            &[
                ("name".to_string(), "Ana".to_string()),
                ("age".to_string(), "34".to_string()),
            ]
        );
        assert_eq!(doc.text("symptoms"), Some("tos"));
    }

    #[test]
    fn decodes_repeated_studies() {
        let doc = decode_ok(
            "<request><studies><study>rx torax</study><study>hemograma</study>\
             <other>skip</other></studies></request>",
        );
        assert_eq!(
            doc.list("studies").unwrap(),
            &["rx torax".to_string(), "hemograma".to_string()]
        );
    }

    #[test]
    fn empty_elements_decode_as_empty_values() {
        let doc = decode_ok("<request><message/><patient/><studies/></request>");
        assert_eq!(doc.text("message"), Some(""));
        assert!(doc.section("patient").unwrap().is_empty());
        assert!(doc.list("studies").unwrap().is_empty());
    }

    #[test]
    fn scalar_keeps_only_leading_text() {
        let doc = decode_ok("<request><message>hola<extra>x</extra>adios</message></request>");
        assert_eq!(doc.text("message"), Some("hola"));
    }

    #[test]
    fn unescapes_entities() {
        let doc = decode_ok("<request><message>a &amp; b &lt;c&gt;</message></request>");
        assert_eq!(doc.text("message"), Some("a & b <c>"));
    }

    #[test]
    fn empty_root_decodes_to_empty_doc() {
        assert!(decode_ok("<request/>").is_empty());
        assert!(decode_ok("<request></request>").is_empty());
    }

    #[test]
    fn rejects_empty_body() {
        assert!(matches!(decode(b""), Err(WireError::Malformed(_))));
    }

    #[test]
    fn rejects_plain_text_body() {
        assert!(matches!(decode(b"not xml"), Err(WireError::Malformed(_))));
    }

    #[test]
    fn rejects_unclosed_root() {
        assert!(matches!(
            decode(b"<request><message>hola</message>"),
            Err(WireError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_mismatched_tags() {
        assert!(matches!(
            decode(b"<request><message>hola</msg></request>"),
            Err(WireError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_trailing_second_root() {
        assert!(matches!(
            decode(b"<request/><request/>"),
            Err(WireError::Malformed(_))
        ));
    }

    #[test]
    fn lossy_decode_collapses_malformed_to_empty() {
        assert!(decode_lossy(b"<<<").is_empty());
        assert!(decode_lossy(b"").is_empty());
        let doc = decode_lossy(b"<request><text>hola</text></request>");
        assert_eq!(doc.text("text"), Some("hola"));
    }

    #[test]
    fn encodes_flat_response() {
        let xml = encode(&[
            ("recommendation", "reposo".to_string()),
            ("session_id", "abc".to_string()),
        ])
        .unwrap();
        assert_eq!(
            xml,
            "<response><recommendation>reposo</recommendation>\
             <session_id>abc</session_id></response>"
        );
    }

    #[test]
    fn encode_escapes_markup() {
        let xml = encode(&[("respuesta", "a < b & c".to_string())]).unwrap();
        assert!(xml.contains("a &lt; b &amp; c"));
        let doc = decode(xml.as_bytes()).unwrap();
        assert_eq!(doc.text("respuesta"), Some("a < b & c"));
    }

    #[test]
    fn encode_rejects_invalid_tag_name() {
        assert!(matches!(
            encode(&[("bad name", "x".to_string())]),
            Err(WireError::InvalidName(_))
        ));
        assert!(matches!(
            encode(&[("1st", "x".to_string())]),
            Err(WireError::InvalidName(_))
        ));
    }

    #[test]
    fn decoded_sections_cannot_round_trip_through_flat_encode() {
        let doc = decode_ok("<request><patient><name>Ana</name></patient></request>");
        assert!(doc.section("patient").is_some());
        // Flat encode only accepts name/value pairs; nested request fields
        // have no reply-side counterpart.
        let xml = encode(&[("status", "ok".to_string())]).unwrap();
        let reparsed = decode(xml.as_bytes()).unwrap();
        assert!(reparsed.section("patient").is_none());
    }

    #[test]
    fn encodes_structured_tree() {
        let xml = encode_tree(&json!({
            "filename": "radio.png",
            "findings": [{"zone": "torax"}, "limpio"],
            "empty": null,
            "urgent": false,
            "score": 3,
        }))
        .unwrap();
        assert_eq!(
            xml,
            "<response><empty></empty><filename>radio.png</filename>\
             <findings><item><zone>torax</zone></item><item>limpio</item></findings>\
             <score>3</score><urgent>false</urgent></response>"
        );
    }

    #[test]
    fn tree_encode_rejects_invalid_keys() {
        assert!(matches!(
            encode_tree(&json!({"two words": 1})),
            Err(WireError::InvalidName(_))
        ));
    }
}
