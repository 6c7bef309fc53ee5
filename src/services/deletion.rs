// src/services/deletion.rs

//! Post liveness checks.

use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};

use crate::error::Result;
use crate::models::ScraperConfig;
use crate::services::DeletionProbe;
use crate::utils::http::{create_async_client, random_user_agent};

/// Fetches a post page and looks for removal signals.
pub struct HttpDeletionProbe {
    config: ScraperConfig,
    client: Client,
}

impl HttpDeletionProbe {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let client = create_async_client(&config)?;
        Ok(Self { config, client })
    }
}

/// Decide liveness from a response.
///
/// 404 and 410 mean deleted. A successful page is deleted only when it
/// contains one of `markers`. Anything else is inconclusive.
pub fn judge(status: StatusCode, body: &str, markers: &[String]) -> Option<bool> {
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return Some(true);
    }
    if !status.is_success() {
        return None;
    }
    Some(markers.iter().any(|m| !m.is_empty() && body.contains(m.as_str())))
}

#[async_trait]
impl DeletionProbe for HttpDeletionProbe {
    async fn is_post_deleted(&self, url: &str) -> Option<bool> {
        let response = match self
            .client
            .get(url)
            .header(USER_AGENT, random_user_agent(&self.config))
            .header(ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9")
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Deletion probe failed for {}: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            let verdict = judge(status, "", &self.config.deleted_markers);
            log::debug!("Deletion probe {} -> HTTP {} ({:?})", url, status, verdict);
            return verdict;
        }

        match response.text().await {
            Ok(body) => judge(status, &body, &self.config.deleted_markers),
            Err(e) => {
                log::warn!("Deletion probe body read failed for {}: {}", url, e);
                None
            }
        }
    }
}
