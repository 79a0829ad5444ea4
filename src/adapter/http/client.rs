//! Image HTTP Client
//!
//! HTTPクライアントの抽象化と reqwest による実装

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, ClientBuilder, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

#[cfg(test)]
use mockall::automock;

/// Trait for single image GET requests
/// This enables mocking in tests while using the real client in production
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ImageHttpClient: Send + Sync {
    /// GET the URL and return the body on HTTP 200.
    /// Any other status, network error or timeout yields `None`.
    async fn get_image(&self, url: &str) -> Option<Vec<u8>>;
}

/// reqwest-backed client with a bounded number of in-flight requests
pub struct ReqwestImageClient {
    client: Client,
    permits: Arc<Semaphore>,
}

impl ReqwestImageClient {
    /// Create a client sharing one connection pool limited to `concurrency_limit`
    pub fn new(concurrency_limit: usize, timeout: Duration, user_agent: &str) -> Result<Self> {
        let limit = concurrency_limit.max(1);
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .pool_max_idle_per_host(limit)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            permits: Arc::new(Semaphore::new(limit)),
        })
    }
}

#[async_trait]
impl ImageHttpClient for ReqwestImageClient {
    async fn get_image(&self, url: &str) -> Option<Vec<u8>> {
        // The semaphore is never closed, so acquire only fails after shutdown
        let _permit = self.permits.acquire().await.ok()?;

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("GET {} failed: {}", url, e);
                return None;
            }
        };

        if response.status() != StatusCode::OK {
            debug!("GET {} -> {}", url, response.status());
            return None;
        }

        match response.bytes().await {
            Ok(body) => Some(body.to_vec()),
            Err(e) => {
                debug!("GET {} body read failed: {}", url, e);
                None
            }
        }
    }
}
