//! API credentials and the HTTP Basic header they derive.

use base64::prelude::*;

/// Challonge credentials: account username and API key. Immutable once
/// constructed; the header value is derived on demand and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    api_key: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            api_key: api_key.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// HTTP Basic `Authorization` header value:
    /// `Basic <base64(username:api_key)>` over the UTF-8 bytes of the joined
    /// pair.
    pub fn to_auth_header(&self) -> String {
        let joined = format!("{}:{}", self.username, self.api_key);
        format!("Basic {}", BASE64_STANDARD.encode(joined))
    }
}
