use super::{Format, FormatError};
use crate::payload::Payload;
use bytes::Bytes;
use serde_json::json;

#[test]
fn test_resolve_defaults_to_json() {
    assert_eq!(Format::resolve(Some("JSON")), Format::Json);
    assert_eq!(Format::resolve(Some("json")), Format::Json);
    assert_eq!(Format::resolve(None), Format::Json);
    assert_eq!(Format::resolve(Some("")), Format::Json);
    assert_eq!(Format::resolve(Some("   ")), Format::Json);
    assert_eq!(Format::resolve(Some("bogus")), Format::Json);
}

#[test]
fn test_resolve_known_formats_case_insensitive() {
    assert_eq!(Format::resolve(Some("XML")), Format::Xml);
    assert_eq!(Format::resolve(Some(" xml ")), Format::Xml);
    assert_eq!(Format::resolve(Some("Binary")), Format::Binary);
    assert_eq!(Format::resolve(Some("pdf")), Format::Pdf);
}

#[test]
fn test_content_types() {
    assert_eq!(Format::Json.content_type(), "application/json");
    assert_eq!(Format::Xml.content_type(), "application/xml;charset=UTF-8");
    assert_eq!(Format::Binary.content_type(), "application/octet-stream");
    assert_eq!(Format::Pdf.content_type(), "application/pdf");
}

#[test]
fn test_json_provider() {
    let body = Format::Json.encode(&Payload::Json(json!({"ok": true}))).unwrap();
    assert_eq!(&body[..], br#"{"ok":true}"#);
    assert!(Format::Json.encode(&Payload::Empty).unwrap().is_empty());
}

#[test]
fn test_xml_provider_wraps_in_root() {
    let body = Format::Xml
        .encode(&Payload::Json(json!({"name": "vortex"})))
        .unwrap();
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.starts_with("<?xml"));
    assert!(text.contains("<response>"));
    assert!(text.contains("<name>vortex</name>"));
    assert!(text.ends_with("</response>"));
}

#[test]
fn test_text_bytes_stay_valid_json() {
    let raw = Payload::Bytes(Bytes::from_static(b"<html>hi</html>"));
    let body = Format::Json.encode(&raw).unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed, json!("<html>hi</html>"));

    let invalid = Payload::Bytes(Bytes::from_static(&[0xff, 0xfe, 0x00]));
    assert_eq!(
        Format::Json.encode(&invalid).unwrap_err(),
        FormatError::NotText {
            format: Format::Json
        }
    );
}

#[test]
fn test_text_bytes_are_escaped_into_xml_root() {
    let raw = Payload::Bytes(Bytes::from_static(b"a < b & c"));
    let body = Format::Xml.encode(&raw).unwrap();
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.ends_with("<response>a &lt; b &amp; c</response>"), "{text}");

    let invalid = Payload::Bytes(Bytes::from_static(&[0xc3, 0x28]));
    assert!(matches!(
        Format::Xml.encode(&invalid),
        Err(FormatError::NotText { .. })
    ));
}

#[test]
fn test_binary_provider_passes_bytes_through() {
    let raw = Bytes::from_static(&[0, 159, 146, 150]);
    let body = Format::Binary.encode(&Payload::Bytes(raw.clone())).unwrap();
    assert_eq!(body, raw);
    let body = Format::Binary.encode(&Payload::Json(json!([1]))).unwrap();
    assert_eq!(&body[..], b"[1]");
}

#[test]
fn test_pdf_rejects_structured_payload() {
    let err = Format::Pdf.encode(&Payload::Json(json!({}))).unwrap_err();
    assert_eq!(
        err,
        FormatError::Unsupported {
            format: Format::Pdf
        }
    );
    let raw = Bytes::from_static(b"%PDF-1.7");
    assert_eq!(Format::Pdf.encode(&Payload::Bytes(raw.clone())).unwrap(), raw);
}
