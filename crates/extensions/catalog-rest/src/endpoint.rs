//! Base URL and HTTP client shared by the REST adapters.

use std::time::Duration;

use reqwest::{Client, Url};

#[derive(Clone)]
pub(crate) struct Endpoint {
    base: Url,
    client: Client,
}

impl Endpoint {
    pub(crate) fn new(base_url: &str, timeout: Duration) -> Result<Self, String> {
        let base = Url::parse(base_url).map_err(|e| format!("invalid base URL '{}': {}", base_url, e))?;
        if base.cannot_be_a_base() {
            return Err(format!("'{}' cannot be used as a base URL", base_url));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to create HTTP client: {}", e))?;

        Ok(Self { base, client })
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn base(&self) -> &Url {
        &self.base
    }

    /// Append path segments to the base URL, percent-encoding each one.
    pub(crate) fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}
