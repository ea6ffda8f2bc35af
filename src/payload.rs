use bytes::Bytes;
use serde_json::Value;

/// Protocol-neutral value carried between the dispatcher and executors.
///
/// Executors convert it into their own input type and return their output
/// converted back into a payload; the dispatcher never sees
/// protocol-specific types.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    /// No body
    #[default]
    Empty,
    /// Structured value, encoded by the negotiated format
    Json(Value),
    /// Opaque bytes, passed through untouched by byte-oriented formats
    Bytes(Bytes),
}

impl Payload {
    /// Interpret an inbound body according to its content type.
    ///
    /// JSON content types are parsed when possible; a body that fails to
    /// parse is kept as raw bytes so the executor can decide what to do.
    #[must_use]
    pub fn from_body(content_type: Option<&str>, body: Bytes) -> Self {
        if body.is_empty() {
            return Self::Empty;
        }
        if content_type.is_some_and(is_json_content_type) {
            if let Ok(value) = serde_json::from_slice::<Value>(&body) {
                return Self::Json(value);
            }
        }
        Self::Bytes(body)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Json(_) => false,
            Self::Bytes(b) => b.is_empty(),
        }
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Raw bytes of the payload; structured values are encoded as compact JSON.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Empty => Bytes::new(),
            Self::Json(v) => Bytes::from(v.to_string()),
            Self::Bytes(b) => b.clone(),
        }
    }

    /// Number of records carried, used for operation metrics.
    #[must_use]
    pub fn row_count(&self) -> u64 {
        match self {
            Self::Empty => 0,
            Self::Json(Value::Array(items)) => items.len() as u64,
            Self::Json(Value::Null) => 0,
            Self::Json(_) | Self::Bytes(_) => 1,
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Self::Empty
    }
}

pub(crate) fn is_json_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}
