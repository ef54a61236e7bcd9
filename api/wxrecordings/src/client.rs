use anyhow::{anyhow, Result};
use futures::future::join_all;
use log::*;
use reqwest::Client;
use std::collections::HashMap;

use crate::pass::{image_url, parse_pass_list, Enhancement, Pass};

/// Satellite recordings backend client
pub struct RecordingsClient {
    client: Client,
    base_url: String,
}

impl RecordingsClient {
    /// Create a client for the backend at the given base URL
    pub fn new(base_url: &str) -> Self {
        RecordingsClient {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The pass manifest endpoint
    pub fn list_url(&self) -> String {
        format!("{}/api/list", self.base_url)
    }

    /// Absolute URL of one enhancement image
    pub fn image_url(&self, pass: &Pass, enhancement: &Enhancement) -> String {
        image_url(&self.base_url, pass, enhancement)
    }

    /// Fetch and parse the pass manifest
    pub async fn fetch_pass_list(&self) -> Result<Vec<Pass>> {
        let url = self.list_url();
        debug!("Fetching pass manifest from {}", url);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to fetch pass list: HTTP {} - URL: {}",
                response.status(),
                url
            ));
        }

        let text = response.text().await?;
        let passes = parse_pass_list(&text);
        info!("Loaded {} passes from {}", passes.len(), url);

        Ok(passes)
    }

    /// Fetch one image, returning the raw webp bytes
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching image from {}", url);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "Failed to fetch image: HTTP {} - URL: {}",
                response.status(),
                url
            ));
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Best-effort concurrent fetch of several images. Failures are logged
    /// and skipped; whatever arrived comes back keyed by URL.
    pub async fn prefetch_images(&self, urls: &[String]) -> HashMap<String, Vec<u8>> {
        let fetches = urls
            .iter()
            .map(|url| async move { (url.clone(), self.fetch_image(url).await) });

        let mut images = HashMap::new();
        for (url, result) in join_all(fetches).await {
            match result {
                Ok(bytes) => {
                    debug!("Prefetched {} ({} bytes)", url, bytes.len());
                    images.insert(url, bytes);
                }
                Err(e) => {
                    warn!("Prefetch failed for {}: {}", url, e);
                }
            }
        }

        images
    }
}
