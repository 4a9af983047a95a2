use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::wire;

/// Returned by the strict tag-based endpoints when the body does not parse.
pub const MALFORMED_XML_MSG: &str = "XML mal formado o vacío";

/// Emitted when serializing a reply itself fails, so the caller still gets
/// a well-formed document.
const ENCODE_FALLBACK: &str = "<response><error>encoding failure</error></response>";

/// Wrap an already-serialized document with the XML content type.
pub fn xml_payload(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/xml")], body).into_response()
}

/// Serialize a flat mapping under the `response` root element.
pub fn xml_response(fields: &[(&str, String)]) -> Response {
    let body = wire::encode(fields).unwrap_or_else(|err| {
        tracing::error!("failed to encode reply document: {err}");
        ENCODE_FALLBACK.to_string()
    });
    xml_payload(body)
}

/// Error-tagged document. The tag-based family reports errors in-band with
/// a 200 status, mirroring the `error` key of the JSON family.
pub fn xml_error(message: impl Into<String>) -> Response {
    xml_response(&[("error", message.into())])
}

/// Raw synthesized speech.
pub fn audio_response(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response()
}

/// Placeholder answer used by the consultation endpoints, which keep
/// answering even when the generative backend is down.
pub fn degraded_generation(err: &anyhow::Error) -> String {
    format!("(demo) Error con Gemini: {err}")
}
