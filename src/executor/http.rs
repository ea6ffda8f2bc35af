//! Shared `reqwest` plumbing for the HTTP-based executors.

use super::{DownstreamAsset, TargetAddress};
use crate::error::DownstreamError;
use crate::payload::{is_json_content_type, Payload};
use anyhow::Context;
use bytes::Bytes;
use http::header::CONTENT_TYPE;

/// Headers that describe a single hop and are never forwarded.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
];

pub(crate) fn is_forwardable(name: &str) -> bool {
    !HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
        && !name.eq_ignore_ascii_case("content-length")
}

pub(crate) fn build_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")
}

/// Successful HTTP reply from a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl HttpReply {
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type.as_deref().is_some_and(is_json_content_type)
    }
}

impl From<HttpReply> for Payload {
    fn from(reply: HttpReply) -> Self {
        Payload::from_body(reply.content_type.as_deref(), reply.body)
    }
}

pub(crate) fn map_send_error(
    target: &TargetAddress,
    timeout_ms: u64,
    err: &reqwest::Error,
) -> DownstreamError {
    if err.is_connect() {
        DownstreamError::connection(target.to_string(), err.to_string())
    } else if err.is_timeout() {
        DownstreamError::Timeout {
            target: target.to_string(),
            timeout_ms,
        }
    } else {
        DownstreamError::protocol(target.to_string(), err.to_string())
    }
}

/// Send a prepared request under the asset's timeout and read the whole reply.
///
/// Non-2xx statuses become [`DownstreamError::Protocol`] carrying the
/// status and the start of the body.
pub(crate) async fn send(
    asset: &DownstreamAsset,
    target: &TargetAddress,
    request: reqwest::RequestBuilder,
) -> Result<HttpReply, DownstreamError> {
    let timeout_ms = asset.timeout_ms();
    let response = request
        .timeout(asset.timeout())
        .send()
        .await
        .map_err(|e| map_send_error(target, timeout_ms, &e))?;
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response
        .bytes()
        .await
        .map_err(|e| map_send_error(target, timeout_ms, &e))?;
    if !(200..300).contains(&status) {
        let snippet = String::from_utf8_lossy(&body[..body.len().min(256)]).into_owned();
        return Err(DownstreamError::Protocol {
            target: target.to_string(),
            status: Some(status),
            message: format!("HTTP {status}: {snippet}"),
        });
    }
    Ok(HttpReply {
        status,
        content_type,
        body,
    })
}
