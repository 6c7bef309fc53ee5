// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use rand::seq::IndexedRandom;

use crate::error::Result;
use crate::models::ScraperConfig;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &ScraperConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// Pick a User-Agent from the configured pool.
pub fn random_user_agent(config: &ScraperConfig) -> &str {
    config
        .user_agents
        .choose(&mut rand::rng())
        .map(String::as_str)
        .unwrap_or("Mozilla/5.0")
}

/// Sleep for a random duration within `[min_ms, max_ms]`.
pub async fn polite_delay(min_ms: u64, max_ms: u64) {
    let ms = if max_ms > min_ms {
        use rand::Rng;
        rand::rng().random_range(min_ms..=max_ms)
    } else {
        min_ms
    };
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_user_agent_from_pool() {
        let config = ScraperConfig {
            user_agents: vec!["ua-1".into(), "ua-2".into()],
            ..ScraperConfig::default()
        };
        let ua = random_user_agent(&config);
        assert!(ua == "ua-1" || ua == "ua-2");
    }

    #[test]
    fn test_random_user_agent_empty_pool() {
        let config = ScraperConfig {
            user_agents: Vec::new(),
            ..ScraperConfig::default()
        };
        assert_eq!(random_user_agent(&config), "Mozilla/5.0");
    }

    #[tokio::test]
    async fn test_zero_delay_returns() {
        polite_delay(0, 0).await;
    }
}
