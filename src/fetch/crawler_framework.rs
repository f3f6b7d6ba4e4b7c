// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;

use super::{BackendSettings, FetchClient};
use crate::errors::OrchestratorError;
use crate::headers::{self, HttpHeaders};
use crate::retry::{is_anti_bot_status, run_with_backoff, Outcome};

const CHALLENGE_MARKERS: [&str; 3] = ["验证码", "Access Denied", "Unusual Traffic"];

#[derive(Debug, Deserialize)]
struct SpiderResult {
    status: u16,
    body: String,
}

/// Spawns a one-shot spider process per attempt and reads its single-line
/// JSON result (`{"status": ..., "body": ...}`) off an mpsc channel fed by
/// the child's stdout. The child is terminated on every exit path: success,
/// timeout, or error.
pub struct CrawlerFrameworkClient {
    settings: BackendSettings,
    spider_binary: String,
}

impl CrawlerFrameworkClient {
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            settings,
            spider_binary: "fetchrs-spider".to_string(),
        }
    }

    pub fn with_binary(settings: BackendSettings, spider_binary: impl Into<String>) -> Self {
        Self {
            settings,
            spider_binary: spider_binary.into(),
        }
    }
}

#[async_trait]
impl FetchClient for CrawlerFrameworkClient {
    async fn fetch(&self, url: &str, upstream: Option<&HttpHeaders>) -> Result<String, OrchestratorError> {
        let enhanced = headers::enhance(Some(url), upstream);
        let headers_json = serde_json::to_string(&enhanced).unwrap_or_default();

        run_with_backoff(self.name(), url, self.settings.retries, |_attempt| {
            let headers_json = headers_json.clone();
            async move {
                let mut child = match Command::new(&self.spider_binary)
                    .arg(url)
                    .arg(&headers_json)
                    .stdout(std::process::Stdio::piped())
                    .kill_on_drop(true)
                    .spawn()
                {
                    Ok(c) => c,
                    Err(e) => return Outcome::Retry(format!("failed to spawn spider: {e}")),
                };

                let stdout = match child.stdout.take() {
                    Some(s) => s,
                    None => {
                        let _ = child.kill().await;
                        return Outcome::Retry("spider produced no stdout handle".to_string());
                    }
                };

                let (tx, mut rx) = mpsc::channel::<String>(1);
                let reader_task = tokio::spawn(async move {
                    let mut lines = BufReader::new(stdout).lines();
                    if let Ok(Some(line)) = lines.next_line().await {
                        let _ = tx.send(line).await;
                    }
                });

                let recv_result = tokio::time::timeout(self.settings.timeout, rx.recv()).await;

                // Every exit path below terminates the child before returning.
                let _ = child.kill().await;
                let _ = child.wait().await;
                reader_task.abort();

                let line = match recv_result {
                    Ok(Some(line)) => line,
                    Ok(None) => return Outcome::Retry("spider closed without output".to_string()),
                    Err(_) => return Outcome::Retry("spider timed out".to_string()),
                };

                let parsed: SpiderResult = match serde_json::from_str(&line) {
                    Ok(p) => p,
                    Err(e) => return Outcome::Retry(format!("malformed spider output: {e}")),
                };

                if is_anti_bot_status(parsed.status)
                    || CHALLENGE_MARKERS.iter().any(|m| parsed.body.contains(m))
                {
                    return Outcome::Retry(format!("anti-bot status {}", parsed.status));
                }
                if !(200..300).contains(&parsed.status) {
                    return Outcome::Retry(format!("spider reported status {}", parsed.status));
                }
                if parsed.body.is_empty() {
                    return Outcome::Retry("empty spider body".to_string());
                }

                Outcome::Ok(parsed.body)
            }
        })
        .await
    }

    fn name(&self) -> &'static str {
        "crawler_framework"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spider_result_json() {
        let parsed: SpiderResult = serde_json::from_str(r#"{"status":200,"body":"hi"}"#).unwrap();
        assert_eq!(parsed.status, 200);
        assert_eq!(parsed.body, "hi");
    }
}
