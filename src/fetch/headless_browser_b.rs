// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::SetExtraHttpHeadersParams;
use futures::StreamExt;

use super::{BackendSettings, FetchClient};
use crate::errors::OrchestratorError;
use crate::headers::{self, HttpHeaders};
use crate::retry::{is_anti_bot_status, run_with_backoff, Outcome};

/// Alternative headless-browser backend. Where `HeadlessBrowserAClient`
/// relies on text-pattern detection, this one injects headers directly via
/// CDP and reads the navigation status from the Navigation Timing API.
pub struct HeadlessBrowserBClient {
    settings: BackendSettings,
}

impl HeadlessBrowserBClient {
    pub fn new(settings: BackendSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl FetchClient for HeadlessBrowserBClient {
    async fn fetch(&self, url: &str, upstream: Option<&HttpHeaders>) -> Result<String, OrchestratorError> {
        let enhanced = headers::enhance(Some(url), upstream);

        run_with_backoff(self.name(), url, self.settings.retries, |_attempt| {
            let enhanced = enhanced.clone();
            async move {
                let config = match BrowserConfig::builder().no_sandbox().arg("--disable-gpu").build() {
                    Ok(c) => c,
                    Err(e) => return Outcome::Fatal(anyhow::anyhow!("{e}").into()),
                };

                let (mut browser, mut handler) = match Browser::launch(config).await {
                    Ok(pair) => pair,
                    Err(e) => return Outcome::Retry(e.to_string()),
                };
                let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });

                let result = async {
                    let page = browser.new_page("about:blank").await?;
                    let mut header_map = std::collections::HashMap::new();
                    for (k, v) in &enhanced {
                        header_map.insert(k.clone(), serde_json::Value::String(v.clone()));
                    }
                    page.execute(SetExtraHttpHeadersParams::new(
                        chromiumoxide::cdp::browser_protocol::network::Headers::new(
                            serde_json::Value::Object(header_map.into_iter().collect()),
                        ),
                    ))
                    .await?;

                    page.goto(url).await?;
                    page.wait_for_navigation().await?;

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

                let _ = browser.close().await;
                handler_task.abort();

                match result {
                    Ok((Some(status), content)) if is_anti_bot_status(status as u16) => {
                        Outcome::Retry(format!("anti-bot status {status}"))
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
        "headless_browser_b"
    }
}
