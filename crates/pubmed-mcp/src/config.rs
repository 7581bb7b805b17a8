//! Configuration for the PubMed MCP server.

use std::time::Duration;

/// E-utilities configuration constants.
pub mod api {
    use std::time::Duration;

    /// Base URL for NCBI E-utilities.
    pub const EUTILS_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

    /// Public article page prefix.
    pub const PUBMED_WEB_URL: &str = "https://pubmed.ncbi.nlm.nih.gov";

    /// Entrez database queried by every request.
    pub const DATABASE: &str = "pubmed";

    /// Tool name reported to NCBI when none is configured.
    pub const DEFAULT_TOOL_NAME: &str = "pubmed-mcp";

    /// Request timeout.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Delay between requests without API key (NCBI allows 3 req/s).
    pub const RATE_LIMIT_DELAY: Duration = Duration::from_millis(334);

    /// Delay between requests with API key (NCBI allows 10 req/s).
    pub const RATE_LIMIT_DELAY_WITH_KEY: Duration = Duration::from_millis(100);

    /// Cache TTL (5 minutes).
    pub const CACHE_TTL: Duration = Duration::from_secs(300);

    /// Maximum cache size.
    pub const CACHE_MAX_SIZE: u64 = 1000;

    /// Maximum keepalive connections.
    pub const MAX_KEEPALIVE: usize = 10;

    /// Keepalive expiry.
    pub const KEEPALIVE_EXPIRY: Duration = Duration::from_secs(30);
}

/// Tool-level limits.
pub mod limits {
    /// Default number of search results.
    pub const DEFAULT_MAX_RESULTS: u32 = 10;

    /// Largest `retmax` a single search may request.
    pub const MAX_SEARCH_RESULTS: u32 = 200;

    /// Largest number of PMIDs fetched in one `efetch` GET.
    pub const MAX_FETCH_IDS: usize = 200;
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// NCBI API key (optional, raises the rate limit).
    pub api_key: Option<String>,

    /// Contact e-mail sent with each request (optional).
    pub email: Option<String>,

    /// Tool name sent with each request.
    pub tool_name: String,

    /// Base URL for E-utilities (for testing with mock servers).
    pub eutils_url: String,

    /// Request timeout.
    pub request_timeout: Duration,

    /// Connection timeout.
    pub connect_timeout: Duration,

    /// Rate limit delay between requests.
    pub rate_limit_delay: Duration,

    /// Cache TTL.
    pub cache_ttl: Duration,

    /// Maximum cache size.
    pub cache_max_size: u64,
}

impl Config {
    /// Create a new configuration with optional API key and contact e-mail.
    ///
    /// The request delay follows NCBI's published limits:
    /// - Without key: 3 req/s
    /// - With key: 10 req/s
    #[must_use]
    pub fn new(api_key: Option<String>, email: Option<String>) -> Self {
        let has_key = api_key.is_some();
        Self {
            api_key,
            email,
            tool_name: api::DEFAULT_TOOL_NAME.to_string(),
            eutils_url: api::EUTILS_URL.to_string(),
            request_timeout: api::REQUEST_TIMEOUT,
            connect_timeout: api::CONNECT_TIMEOUT,
            rate_limit_delay: if has_key {
                api::RATE_LIMIT_DELAY_WITH_KEY
            } else {
                api::RATE_LIMIT_DELAY
            },
            cache_ttl: api::CACHE_TTL,
            cache_max_size: api::CACHE_MAX_SIZE,
        }
    }

    /// Create a test configuration pointing at a mock server.
    #[must_use]
    pub fn for_testing(base_url: &str) -> Self {
        Self {
            api_key: None,
            email: None,
            tool_name: api::DEFAULT_TOOL_NAME.to_string(),
            eutils_url: format!("{}/entrez/eutils", base_url),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
            rate_limit_delay: Duration::from_millis(0), // No delay in tests
            cache_ttl: Duration::from_secs(0),          // No caching in tests
            cache_max_size: 0,
        }
    }

    /// Set the tool name reported to NCBI.
    #[must_use]
    pub fn with_tool_name(mut self, tool_name: impl Into<String>) -> Self {
        self.tool_name = tool_name.into();
        self
    }

    /// Override the E-utilities base URL.
    #[must_use]
    pub fn with_eutils_url(mut self, url: impl Into<String>) -> Self {
        self.eutils_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `NCBI_API_KEY`, `NCBI_EMAIL`, `NCBI_TOOL` and `NCBI_EUTILS_URL`.
    /// Empty values are treated as unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let mut config = Self::new(var("NCBI_API_KEY"), var("NCBI_EMAIL"));
        if let Some(tool) = var("NCBI_TOOL") {
            config = config.with_tool_name(tool);
        }
        if let Some(url) = var("NCBI_EUTILS_URL") {
            config = config.with_eutils_url(url);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would otherwise only fail at request time.
    ///
    /// # Errors
    ///
    /// Fails when `eutils_url` is not an http(s) URL or `tool_name` is blank.
    pub fn validate(&self) -> anyhow::Result<()> {
        let url = &self.eutils_url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("E-utilities URL must be an http(s) URL, got {url:?}");
        }
        if self.tool_name.trim().is_empty() {
            anyhow::bail!("tool name must not be empty");
        }
        Ok(())
    }

    /// Check if an API key is configured.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert!(!config.has_api_key());
        assert_eq!(config.eutils_url, api::EUTILS_URL);
        assert_eq!(config.rate_limit_delay, api::RATE_LIMIT_DELAY);
    }

    #[test]
    fn test_config_with_api_key_speeds_up_rate_limit() {
        let config = Config::new(Some("test-key".to_string()), None);
        assert!(config.has_api_key());
        assert_eq!(config.rate_limit_delay, api::RATE_LIMIT_DELAY_WITH_KEY);
    }

    #[test]
    fn test_for_testing_points_at_mock() {
        let config = Config::for_testing("http://127.0.0.1:9999");
        assert_eq!(config.eutils_url, "http://127.0.0.1:9999/entrez/eutils");
        assert_eq!(config.cache_max_size, 0);
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::for_testing("http://127.0.0.1:9").validate().is_ok());

        let err = Config::default().with_eutils_url("ftp://mirror.example/eutils").validate();
        assert!(err.unwrap_err().to_string().contains("http(s)"));

        assert!(Config::default().with_eutils_url("eutils.local").validate().is_err());
        assert!(Config::default().with_tool_name("  ").validate().is_err());
    }

    #[test]
    fn test_with_eutils_url_trims_trailing_slash() {
        let config = Config::default().with_eutils_url("http://localhost:8080/eutils/");
        assert_eq!(config.eutils_url, "http://localhost:8080/eutils");
    }
}
