//! Asset download.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;

const USER_AGENT: &str = concat!("sitemirror/", env!("CARGO_PKG_VERSION"));

/// Streams the body behind a URL into a sink.
pub trait AssetFetcher {
    /// Write the full response body to `sink`, returning the byte count.
    ///
    /// Any error means the sink content is incomplete and must be dropped.
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64>;
}

/// Blocking HTTP(S) fetcher with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { client })
    }
}

impl AssetFetcher for HttpFetcher {
    fn fetch(&self, url: &str, sink: &mut dyn Write) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .send()
            .context("request failed")?
            .error_for_status()
            .context("unexpected response")?;

        io::copy(&mut response, sink).context("stream error")
    }
}
