//! NCBI E-utilities client.
//!
//! Provides async HTTP client with:
//! - Connection pooling via reqwest
//! - Retry middleware with exponential backoff
//! - Request pacing shared by all clones (3 req/s, or 10 req/s with an API key)
//! - Response caching with 5-minute TTL

use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use moka::future::Cache;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

use crate::config::{Config, api, limits};
use crate::error::{ClientError, ClientResult};
use crate::models::{ESearchResponse, ESearchResult, PaperRecord, SortOrder};
use crate::parser;

/// PubMed E-utilities client.
#[derive(Clone)]
pub struct PubMedClient {
    /// HTTP client with middleware.
    client: ClientWithMiddleware,

    /// Raw response cache, keyed by request hash.
    cache: Cache<String, String>,

    /// API key (optional).
    api_key: Option<String>,

    /// Contact e-mail (optional).
    email: Option<String>,

    /// Tool name reported to NCBI.
    tool_name: String,

    /// E-utilities base URL.
    eutils_url: String,

    /// One permit per `rate_limit_delay`; `None` disables pacing.
    limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl PubMedClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pubmed-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(api::MAX_KEEPALIVE)
            .pool_idle_timeout(api::KEEPALIVE_EXPIRY)
            .gzip(true)
            .build()?;

        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_secs(1), Duration::from_secs(30))
            .build_with_max_retries(3);

        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let cache = Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build();

        Ok(Self {
            client,
            cache,
            api_key: config.api_key,
            email: config.email,
            tool_name: config.tool_name,
            eutils_url: config.eutils_url,
            limiter: rate_limiter(config.rate_limit_delay),
        })
    }

    /// Check if an API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Run an E-search and return matching PMIDs in ranking order.
    ///
    /// A search with no matches returns an empty id list, not an error.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status, an
    /// E-utilities `ERROR` payload, or malformed JSON.
    pub async fn search(
        &self,
        term: &str,
        retmax: u32,
        retstart: u32,
        sort: SortOrder,
    ) -> ClientResult<ESearchResult> {
        let url = format!("{}/esearch.fcgi", self.eutils_url);

        let params = vec![
            ("db".to_string(), api::DATABASE.to_string()),
            ("term".to_string(), term.to_string()),
            ("retmax".to_string(), retmax.to_string()),
            ("retstart".to_string(), retstart.to_string()),
            ("sort".to_string(), sort.as_param().to_string()),
            ("retmode".to_string(), "json".to_string()),
        ];

        let body = self.get_text(&url, &params).await?;
        let response: ESearchResponse = serde_json::from_str(&body)?;

        if let Some(message) = response.error {
            return Err(ClientError::api(message));
        }

        let result = response
            .esearchresult
            .ok_or_else(|| ClientError::malformed("E-search response has no esearchresult"))?;

        if let Some(message) = result.error.as_deref().filter(|m| !m.trim().is_empty()) {
            return Err(ClientError::api(message));
        }

        tracing::debug!(
            count = result.count,
            returned = result.idlist.len(),
            translation = ?result.querytranslation,
            "E-search completed"
        );

        Ok(result)
    }

    /// Fetch and parse full records for the given PMIDs.
    ///
    /// Unknown ids are simply absent from the result. An empty id list makes
    /// no request.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, non-success status, more than
    /// [`limits::MAX_FETCH_IDS`] ids, or unparseable XML.
    pub async fn fetch_articles(&self, pmids: &[String]) -> ClientResult<Vec<PaperRecord>> {
        if pmids.is_empty() {
            return Ok(Vec::new());
        }

        if pmids.len() > limits::MAX_FETCH_IDS {
            return Err(ClientError::bad_request(format!(
                "at most {} ids per fetch, got {}",
                limits::MAX_FETCH_IDS,
                pmids.len()
            )));
        }

        let xml = self.fetch_xml(pmids).await?;
        parser::parse_articles(&xml)
    }

    /// Fetch the raw `PubmedArticleSet` XML for the given PMIDs.
    ///
    /// # Errors
    ///
    /// Returns error on transport failure or non-success status.
    pub async fn fetch_xml(&self, pmids: &[String]) -> ClientResult<String> {
        let url = format!("{}/efetch.fcgi", self.eutils_url);

        let params = vec![
            ("db".to_string(), api::DATABASE.to_string()),
            ("id".to_string(), pmids.join(",")),
            ("retmode".to_string(), "xml".to_string()),
        ];

        self.get_text(&url, &params).await
    }

    /// Make a GET request and return the body text.
    async fn get_text(&self, url: &str, params: &[(String, String)]) -> ClientResult<String> {
        let params = self.with_identity(params);

        // Check cache
        let cache_key = self.cache_key("GET", url, &params);
        if let Some(cached) = self.cache.get(&cache_key).await {
            tracing::debug!(url, "Cache hit");
            return Ok(cached);
        }

        // Rate limit
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        tracing::debug!(url, "GET");
        let response = self.client.get(url).query(&params).send().await?;

        let response = self.handle_response(response).await?;
        let body = response.text().await?;

        // Cache response
        self.cache.insert(cache_key, body.clone()).await;

        Ok(body)
    }

    /// Append the `tool`, `email` and `api_key` parameters NCBI asks for.
    fn with_identity(&self, params: &[(String, String)]) -> Vec<(String, String)> {
        let mut all = params.to_vec();
        all.push(("tool".to_string(), self.tool_name.clone()));

        if let Some(email) = &self.email {
            all.push(("email".to_string(), email.clone()));
        }

        if let Some(key) = &self.api_key {
            all.push(("api_key".to_string(), key.clone()));
        }

        all
    }

    /// Handle API response status codes.
    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> ClientResult<reqwest::Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1);

                Err(ClientError::rate_limited(retry_after))
            }
            404 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::not_found(text))
            }
            400 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::bad_request(text))
            }
            500..=599 => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::server(status.as_u16(), text))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(ClientError::UnexpectedStatus { status: status.as_u16(), message: text })
            }
        }
    }

    /// Generate cache key.
    fn cache_key(&self, method: &str, url: &str, params: &[(String, String)]) -> String {
        use md5::{Digest, Md5};

        let mut hasher = Md5::new();
        hasher.update(method.as_bytes());
        hasher.update(b"|");
        hasher.update(url.as_bytes());
        hasher.update(b"|");

        for (k, v) in params {
            hasher.update(k.as_bytes());
            hasher.update(b"=");
            hasher.update(v.as_bytes());
            hasher.update(b"&");
        }

        format!("{:x}", hasher.finalize())
    }
}

/// Build the limiter shared by every clone of a client.
///
/// The burst size is one, so requests are spaced at least `delay` apart.
fn rate_limiter(delay: Duration) -> Option<Arc<DefaultDirectRateLimiter>> {
    Quota::with_period(delay).map(|quota| Arc::new(RateLimiter::direct(quota)))
}

impl std::fmt::Debug for PubMedClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubMedClient")
            .field("eutils_url", &self.eutils_url)
            .field("has_api_key", &self.has_api_key())
            .field("rate_limited", &self.limiter.is_some())
            .finish()
    }
}
