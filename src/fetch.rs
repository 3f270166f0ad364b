use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::error::HarvestError;

/// Streams a remote resource to a local path. A failed transfer may leave a
/// partially written file behind; callers must not assume atomicity.
pub trait Fetcher: Send + Sync {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), HarvestError>;
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>) -> Result<Self, HarvestError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("subharvest/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| HarvestError::Http(err.to_string()))?,
        );
        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| HarvestError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<(), HarvestError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| HarvestError::Http(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "request failed".to_string());
            return Err(HarvestError::HttpStatus { status, message });
        }
        let mut file = File::create(destination).map_err(|err| {
            HarvestError::Filesystem(format!("create {}: {err}", destination.display()))
        })?;
        io::copy(&mut response, &mut file).map_err(|err| HarvestError::Http(err.to_string()))?;
        Ok(())
    }
}
