use crate::payload::Payload;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Failure of a format provider to encode a payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("encoding failed: {0}")]
    Encode(String),
    #[error("{format} cannot carry a structured payload")]
    Unsupported { format: Format },
    #[error("{format} cannot carry non-UTF-8 bytes")]
    NotText { format: Format },
}

/// Raw downstream bytes as text, for formats that are text documents.
fn text_of(bytes: &Bytes, format: Format) -> Result<&str, FormatError> {
    std::str::from_utf8(bytes).map_err(|_| FormatError::NotText { format })
}

/// Serialization capability bound to a [`Format`].
pub trait FormatProvider: Send + Sync {
    fn encode(&self, payload: &Payload) -> Result<Bytes, FormatError>;
}

/// Response format negotiated from the `format` request parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Json,
    Xml,
    Binary,
    /// Unserialized pass-through of downstream bytes
    Pdf,
}

impl Format {
    /// Resolve a client supplied format token.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// Blank, absent or unrecognised tokens resolve to [`Format::Json`]; the
    /// gateway never refuses a request because of format negotiation.
    #[must_use]
    pub fn resolve(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return Self::Json;
        };
        match name.trim().to_ascii_lowercase().as_str() {
            "xml" => Self::Xml,
            "binary" => Self::Binary,
            "pdf" => Self::Pdf,
            _ => Self::Json,
        }
    }

    /// Wire content type for this format.
    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml;charset=UTF-8",
            Self::Binary => "application/octet-stream",
            Self::Pdf => "application/pdf",
        }
    }

    /// The one serialization provider bound to this format.
    #[must_use]
    pub fn provider(self) -> &'static dyn FormatProvider {
        match self {
            Self::Json => &JsonProvider,
            Self::Xml => &XmlProvider,
            Self::Binary => &BinaryProvider,
            Self::Pdf => &PdfProvider,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Binary => "binary",
            Self::Pdf => "pdf",
        }
    }

    pub fn encode(self, payload: &Payload) -> Result<Bytes, FormatError> {
        self.provider().encode(payload)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structured payloads are serialized; raw text becomes a JSON string.
pub struct JsonProvider;

impl FormatProvider for JsonProvider {
    fn encode(&self, payload: &Payload) -> Result<Bytes, FormatError> {
        match payload {
            Payload::Empty => Ok(Bytes::new()),
            Payload::Json(value) => serde_json::to_vec(value)
                .map(Bytes::from)
                .map_err(|e| FormatError::Encode(e.to_string())),
            Payload::Bytes(bytes) => {
                let text = text_of(bytes, Format::Json)?;
                serde_json::to_vec(text)
                    .map(Bytes::from)
                    .map_err(|e| FormatError::Encode(e.to_string()))
            }
        }
    }
}

/// Documents are rooted at `<response>`; raw text is escaped into it.
pub struct XmlProvider;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const XML_ROOT: &str = "response";

impl FormatProvider for XmlProvider {
    fn encode(&self, payload: &Payload) -> Result<Bytes, FormatError> {
        match payload {
            Payload::Empty => Ok(Bytes::from(format!("{XML_DECLARATION}<{XML_ROOT}/>"))),
            Payload::Json(value) => {
                let body = quick_xml::se::to_string_with_root(XML_ROOT, value)
                    .map_err(|e| FormatError::Encode(e.to_string()))?;
                Ok(Bytes::from(format!("{XML_DECLARATION}{body}")))
            }
            Payload::Bytes(bytes) => {
                let text = quick_xml::escape::escape(text_of(bytes, Format::Xml)?);
                Ok(Bytes::from(format!(
                    "{XML_DECLARATION}<{XML_ROOT}>{text}</{XML_ROOT}>"
                )))
            }
        }
    }
}

pub struct BinaryProvider;

impl FormatProvider for BinaryProvider {
    fn encode(&self, payload: &Payload) -> Result<Bytes, FormatError> {
        Ok(payload.to_bytes())
    }
}

pub struct PdfProvider;

impl FormatProvider for PdfProvider {
    fn encode(&self, payload: &Payload) -> Result<Bytes, FormatError> {
        match payload {
            Payload::Json(_) => Err(FormatError::Unsupported {
                format: Format::Pdf,
            }),
            other => Ok(other.to_bytes()),
        }
    }
}
