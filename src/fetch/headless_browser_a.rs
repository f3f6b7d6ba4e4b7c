// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use rand::Rng;

use super::{BackendSettings, FetchClient};
use crate::errors::OrchestratorError;
use crate::headers::HttpHeaders;
use crate::retry::{is_anti_bot_status, run_with_backoff, Outcome};

/// Text fragments that indicate the page is an anti-bot challenge rather
/// than real content.
const CHALLENGE_MARKERS: [&str; 3] = ["验证码", "Access Denied", "Unusual Traffic"];

const VIEWPORTS: [(u32, u32); 3] = [(1920, 1080), (1366, 768), (1536, 864)];

const DESKTOP_UAS: [&str; 2] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 Chrome/120.0.0.0 Safari/537.36",
];

/// Full browser automation backend. Allocates a fresh browser/context per
/// fetch attempt and releases it on every exit path rather than keeping a
/// process-wide singleton browser around.
pub struct HeadlessBrowserAClient {
    settings: BackendSettings,
}

impl HeadlessBrowserAClient {
    pub fn new(settings: BackendSettings) -> Self {
        Self { settings }
    }

    fn fingerprint_for_attempt(attempt: u32) -> (&'static str, (u32, u32)) {
        let mut rng = rand::rng();
        let _ = attempt; // fingerprint rotates every retry regardless of which attempt
        let ua = DESKTOP_UAS[rng.random_range(0..DESKTOP_UAS.len())];
        let viewport = VIEWPORTS[rng.random_range(0..VIEWPORTS.len())];
        (ua, viewport)
    }
}

#[async_trait]
impl FetchClient for HeadlessBrowserAClient {
    async fn fetch(&self, url: &str, _headers: Option<&HttpHeaders>) -> Result<String, OrchestratorError> {
        run_with_backoff(self.name(), url, self.settings.retries, |attempt| {
            let (ua, (vw, vh)) = Self::fingerprint_for_attempt(attempt);
            async move {
                let config = match BrowserConfig::builder()
                    .no_sandbox()
                    .arg("--disable-gpu")
                    .arg("--disable-dev-shm-usage")
                    .user_agent(ua)
                    .window_size(vw, vh)
                    .build()
                {
                    Ok(c) => c,
                    Err(e) => return Outcome::Fatal(anyhow::anyhow!("{e}").into()),
                };

                let (mut browser, mut handler) = match Browser::launch(config).await {
                    Ok(pair) => pair,
                    Err(e) => return Outcome::Retry(e.to_string()),
                };
                // chromiumoxide requires its event stream to be polled for
                // the browser connection to make progress.
                let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

                let result = async {
                    let page = browser.new_page(url).await?;
                    page.wait_for_navigation().await?;
                    // A small scroll simulates human interaction and lets
                    // lazily-loaded content settle before reading the DOM.
                    let _ = page
                        .evaluate("window.scrollTo(0, document.body.scrollHeight / 2)")
                        .await;

                    let status: Option<i64> = page
                        .evaluate(
                            "performance.getEntriesByType('navigation')[0] && \
                             performance.getEntriesByType('navigation')[0].responseStatus",
                        )
                        .await
                        .ok()
                        .and_then(|v| v.into_value().ok());

                    let content = page.content().await?;
                    Ok::<_, chromiumoxide::error::CdpError>((status, content))
                }
                .await;

                // Guaranteed release on every exit path, success or error.
                let _ = browser.close().await;
                handler_task.abort();

                match result {
                    Ok((Some(status), _)) if is_anti_bot_status(status as u16) => {
                        Outcome::Retry(format!("anti-bot status {status}"))
                    }
                    Ok((_, content)) if CHALLENGE_MARKERS.iter().any(|m| content.contains(m)) => {
                        Outcome::Retry("challenge page detected".to_string())
                    }
                    Ok((_, content)) if content.is_empty() => {
                        Outcome::Retry("empty page content".to_string())
                    }
                    Ok((_, content)) => Outcome::Ok(content),
                    Err(e) => Outcome::Retry(e.to_string()),
                }
            }
        })
        .await
    }

    fn name(&self) -> &'static str {
        "headless_browser_a"
    }
}
