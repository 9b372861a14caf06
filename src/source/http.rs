//! Blocking HTTP fetches for feed documents.

use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::FeedError;

/// Some feed hosts refuse the default reqwest agent, so we look like a
/// desktop browser.
pub const DESKTOP_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// Knobs for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
    /// Skip TLS verification.  Off unless explicitly configured.
    pub accept_invalid_certs: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: DESKTOP_USER_AGENT.to_string(),
            accept_invalid_certs: false,
        }
    }
}

/// A shared blocking client.  Cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(options: &FetchOptions) -> Result<Self, FeedError> {
        if options.accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled for feed fetches");
        }
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.clone())
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()?;
        Ok(Self { client })
    }

    /// GET `url` and return the body.  Non-2xx statuses are errors.
    pub fn get(&self, url: &str) -> Result<Vec<u8>, FeedError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.bytes()?.to_vec())
    }
}
