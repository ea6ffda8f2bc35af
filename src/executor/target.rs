use super::DownstreamAsset;
use crate::error::DownstreamError;
use std::fmt;

/// Resolved downstream address, rendered as `host[:port][/path]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetAddress {
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
}

impl TargetAddress {
    /// Compose the address from an asset and the routed path remainder.
    ///
    /// The asset path and the remainder are joined with exactly one slash
    /// between segments; the result starts with `/` or is empty.
    pub fn compose(asset: &DownstreamAsset, remainder: &str) -> Result<Self, DownstreamError> {
        let host = asset.host.trim();
        if host.is_empty() {
            return Err(DownstreamError::InvalidInput(
                "downstream asset has an empty host".to_string(),
            ));
        }
        let mut path = String::new();
        for part in [asset.path.as_deref().unwrap_or_default(), remainder] {
            let part = part.trim_matches('/');
            if !part.is_empty() {
                path.push('/');
                path.push_str(part);
            }
        }
        Ok(Self {
            scheme: asset.scheme.clone(),
            host: host.to_string(),
            port: asset.port,
            path,
        })
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full URL with scheme, e.g. `http://api.internal:8080/v1/users`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("{}://{self}", self.scheme)
    }

    /// Full URL with an optional raw query string appended.
    #[must_use]
    pub fn url_with_query(&self, query: Option<&str>) -> String {
        match query.filter(|q| !q.is_empty()) {
            Some(q) => format!("{}?{q}", self.url()),
            None => self.url(),
        }
    }
}

impl fmt::Display for TargetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        f.write_str(&self.path)
    }
}
