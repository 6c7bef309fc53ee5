// src/services/search.rs

//! Search result scraping over HTTP.

use std::collections::HashSet;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{Html, Selector};

use crate::error::{AppError, Result};
use crate::models::ScraperConfig;
use crate::services::SearchProvider;
use crate::utils::http::{create_async_client, random_user_agent};

/// Fetches the first result page for a keyword and extracts main result links.
pub struct NaverSearch {
    config: ScraperConfig,
    client: Client,
    selector: Selector,
}

impl NaverSearch {
    /// Create a new search client with the given scraper configuration.
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let client = create_async_client(&config)?;
        let selector = Self::parse_selector(&config.result_selector)?;
        Ok(Self {
            config,
            client,
            selector,
        })
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }

    /// Extract result links from a search page, deduplicated in order.
    pub fn extract_urls(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();

        document
            .select(&self.selector)
            .filter_map(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| href.starts_with("http://") || href.starts_with("https://"))
            .filter(|href| seen.insert(href.to_string()))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl SearchProvider for NaverSearch {
    async fn fetch_results(&self, keyword: &str) -> Result<Vec<String>> {
        log::debug!("Searching '{}'", keyword);

        let response = self
            .client
            .get(&self.config.search_url)
            .query(&[("query", keyword), ("start", "1")])
            .header(USER_AGENT, random_user_agent(&self.config))
            .header(ACCEPT, "text/html,application/xhtml+xml,application/xml")
            .header(ACCEPT_LANGUAGE, "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7")
            .send()
            .await
            .map_err(|e| AppError::fetch(keyword, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(keyword, format!("HTTP {status}")));
        }

        let body = response.text().await.map_err(|e| AppError::fetch(keyword, e))?;
        let urls = self.extract_urls(&body);
        log::debug!("'{}': {} result URLs", keyword, urls.len());
        Ok(urls)
    }
}
