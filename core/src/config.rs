//! Client-wide defaults as an explicit configuration value.
//!
//! Kept as a plain struct passed to [`crate::Client::with_config`] instead
//! of mutable globals, so individual tests can vary defaults without
//! affecting each other.

/// Default `User-Agent` header value.
pub const USER_AGENT: &str = "test-http-request";

/// Content type applied when a body is present and none was set explicitly.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Content type forced when form data is present.
pub const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded";

/// Process-wide client defaults.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Seeded into the default headers of every new client.
    pub user_agent: String,
    /// Applied at build time when a body is present and no `Content-Type`
    /// header was set.
    pub default_content_type: String,
    /// Redirect hops allowed during a single dispatch before the chain is
    /// treated as a loop.
    pub max_redirect_hops: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            user_agent: USER_AGENT.to_string(),
            default_content_type: CONTENT_TYPE_JSON.to_string(),
            max_redirect_hops: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_constants() {
        let config = ClientConfig::default();
        assert_eq!(config.user_agent, "test-http-request");
        assert_eq!(config.default_content_type, "application/json");
        assert_eq!(config.max_redirect_hops, 10);
    }
}
