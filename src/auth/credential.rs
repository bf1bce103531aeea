use axum::http::{HeaderMap, header};

/// An `accessKey|secretKey` pair packed into one bearer value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitCredential {
    pub access_key: String,
    pub secret_key: String,
}

impl SplitCredential {
    /// Parse `<scheme> <accessKey>|<secretKey>`.
    ///
    /// Returns `None` for anything else (missing value, no `|`, more than
    /// two parts, or an empty half). Callers forward the original header
    /// unchanged in that case.
    pub fn parse(authorization: &str) -> Option<Self> {
        let value = authorization.split(' ').nth(1)?;
        let mut parts = value.split('|');
        let (access_key, secret_key) = (parts.next()?, parts.next()?);
        if parts.next().is_some() || access_key.is_empty() || secret_key.is_empty() {
            return None;
        }

        Some(Self {
            access_key: access_key.to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    /// Extract from the Authorization header, if present and well-formed
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(Self::parse)
    }
}
