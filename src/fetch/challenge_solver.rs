// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{BackendSettings, FetchClient};
use crate::errors::OrchestratorError;
use crate::headers::{self, HttpHeaders};
use crate::retry::{is_anti_bot_status, run_with_backoff, Outcome};

struct Fingerprint {
    user_agent: &'static str,
    mobile: bool,
    platform: &'static str,
}

const FINGERPRINTS: [Fingerprint; 3] = [
    Fingerprint {
        user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36",
        mobile: false,
        platform: "Windows",
    },
    Fingerprint {
        user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36",
        mobile: false,
        platform: "macOS",
    },
    Fingerprint {
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 Mobile/15E148 Safari/604.1",
        mobile: true,
        platform: "iOS",
    },
];

/// HTTP client fronting a JavaScript-challenge solver. Rotates its browser
/// fingerprint every 3 failed attempts and appends a randomized timestamp
/// query parameter to avoid fingerprint-correlated blocking.
pub struct ChallengeSolverClient {
    settings: BackendSettings,
    proxy_pool: Vec<String>,
    consecutive_failures: AtomicU32,
}

impl ChallengeSolverClient {
    pub fn new(settings: BackendSettings, proxy_pool: Vec<String>) -> Self {
        Self {
            settings,
            proxy_pool,
            consecutive_failures: AtomicU32::new(0),
        }
    }

    fn fingerprint_for(failures: u32) -> &'static Fingerprint {
        let index = (failures / 3) as usize % FINGERPRINTS.len();
        &FINGERPRINTS[index]
    }

    fn pick_proxy(&self) -> Option<&str> {
        if self.proxy_pool.is_empty() {
            return None;
        }
        let mut rng = rand::rng();
        let index = rng.random_range(0..self.proxy_pool.len());
        Some(self.proxy_pool[index].as_str())
    }

    fn timestamped_url(url: &str) -> String {
        let mut rng = rand::rng();
        let ts: u64 = rng.random_range(1_700_000_000..1_900_000_000);
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{url}{separator}_ts={ts}")
    }
}

#[async_trait]
impl FetchClient for ChallengeSolverClient {
    async fn fetch(&self, url: &str, upstream: Option<&HttpHeaders>) -> Result<String, OrchestratorError> {
        let enhanced = headers::enhance(Some(url), upstream);

        run_with_backoff(self.name(), url, self.settings.retries, |_attempt| {
            let enhanced = enhanced.clone();
            async move {
                let failures = self.consecutive_failures.load(Ordering::Relaxed);
                let fingerprint = Self::fingerprint_for(failures);

                let mut header_map = HeaderMap::new();
                for (k, v) in &enhanced {
                    if let (Ok(name), Ok(value)) = (
                        HeaderName::from_bytes(k.as_bytes()),
                        HeaderValue::from_str(v),
                    ) {
                        header_map.insert(name, value);
                    }
                }
                if let Ok(ua) = HeaderValue::from_str(fingerprint.user_agent) {
                    header_map.insert(reqwest::header::USER_AGENT, ua);
                }

                let mut builder = reqwest::Client::builder()
                    .cookie_store(true)
                    .danger_accept_invalid_certs(true);
                if let Some(proxy_url) = self.pick_proxy() {
                    match reqwest::Proxy::all(proxy_url) {
                        Ok(proxy) => builder = builder.proxy(proxy),
                        Err(e) => return Outcome::Retry(e.to_string()),
                    }
                }
                let client = match builder.build() {
                    Ok(c) => c,
                    Err(e) => return Outcome::Retry(e.to_string()),
                };

                let target = Self::timestamped_url(url);
                let response = match client
                    .get(&target)
                    .headers(header_map)
                    .timeout(self.settings.timeout)
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => {
                        self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                        return Outcome::Retry(e.to_string());
                    }
                };

                let status = response.status().as_u16();
                if is_anti_bot_status(status) {
                    self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                    return Outcome::Retry(format!("anti-bot status {status} (platform {})", fingerprint.platform));
                }
                if !response.status().is_success() {
                    self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
                    return Outcome::Retry(format!("http status {status}"));
                }

                self.consecutive_failures.store(0, Ordering::Relaxed);
                match response.text().await {
                    Ok(body) if !body.is_empty() => Outcome::Ok(body),
                    Ok(_) => Outcome::Retry("empty body".to_string()),
                    Err(e) => Outcome::Retry(e.to_string()),
                }
            }
        })
        .await
    }

    fn name(&self) -> &'static str {
        "challenge_solver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotates_fingerprint_every_three_failures() {
        let first = ChallengeSolverClient::fingerprint_for(0).platform;
        let still_first = ChallengeSolverClient::fingerprint_for(2).platform;
        let rotated = ChallengeSolverClient::fingerprint_for(3).platform;
        assert_eq!(first, still_first);
        assert_ne!(first, rotated);
    }

    #[test]
    fn appends_timestamp_query_param() {
        let url = ChallengeSolverClient::timestamped_url("https://example.com/path");
        assert!(url.contains("_ts="));
        assert!(url.starts_with("https://example.com/path?"));
    }

    #[test]
    fn appends_timestamp_with_ampersand_when_query_exists() {
        let url = ChallengeSolverClient::timestamped_url("https://example.com/path?q=1");
        assert!(url.contains("&_ts="));
    }
}
