// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;

use super::{BackendSettings, FetchClient};
use crate::errors::OrchestratorError;
use crate::headers::{self, HttpHeaders};
use crate::retry::{is_anti_bot_status, run_with_backoff, Outcome};

/// Invokes an external `curl` process per attempt, requesting the body with
/// the HTTP status code appended on its own line so it can be sliced off
/// without a second round trip.
pub struct CommandLineClient {
    settings: BackendSettings,
    binary: String,
}

impl CommandLineClient {
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            settings,
            binary: "curl".to_string(),
        }
    }

    pub fn with_binary(settings: BackendSettings, binary: impl Into<String>) -> Self {
        Self {
            settings,
            binary: binary.into(),
        }
    }

    /// Splits `body\n<status>` produced by `curl -w '\n%{http_code}'`.
    fn split_status(raw: &str) -> (String, Option<u16>) {
        match raw.rsplit_once('\n') {
            Some((body, code)) => match code.trim().parse::<u16>() {
                Ok(status) => (body.to_string(), Some(status)),
                Err(_) => (raw.to_string(), None),
            },
            None => (raw.to_string(), None),
        }
    }
}

#[async_trait]
impl FetchClient for CommandLineClient {
    async fn fetch(&self, url: &str, headers: Option<&HttpHeaders>) -> Result<String, OrchestratorError> {
        let enhanced = headers::enhance(Some(url), headers);

        run_with_backoff(self.name(), url, self.settings.retries, |_attempt| {
            let mut cmd = Command::new(&self.binary);
            cmd.arg("-s")
                .arg("-L")
                .arg("-w")
                .arg("\n%{http_code}")
                .arg("--max-time")
                .arg(self.settings.timeout.as_secs().to_string());
            for (k, v) in &enhanced {
                cmd.arg("-H").arg(format!("{k}: {v}"));
            }
            cmd.arg(url);
            cmd.kill_on_drop(true);

            async move {
                let output = match timeout(self.settings.timeout, cmd.output()).await {
                    Ok(Ok(output)) => output,
                    Ok(Err(e)) => return Outcome::Retry(e.to_string()),
                    Err(_) => return Outcome::Retry("subprocess timed out".to_string()),
                };

                if !output.status.success() {
                    return Outcome::Retry(format!(
                        "curl exited with {}: {}",
                        output.status,
                        String::from_utf8_lossy(&output.stderr)
                    ));
                }

                let raw = String::from_utf8_lossy(&output.stdout).into_owned();
                let (body, status) = Self::split_status(&raw);

                if let Some(status) = status {
                    if is_anti_bot_status(status) {
                        return Outcome::Retry(format!("anti-bot status {status}"));
                    }
                    if !(200..300).contains(&status) {
                        return Outcome::Retry(format!("http status {status}"));
                    }
                }

                if body.is_empty() {
                    Outcome::Retry("empty body".to_string())
                } else {
                    Outcome::Ok(body)
                }
            }
        })
        .await
    }

    fn name(&self) -> &'static str {
        "command_line"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_trailing_status_code() {
        let (body, status) = CommandLineClient::split_status("<html>ok</html>\n200");
        assert_eq!(body, "<html>ok</html>");
        assert_eq!(status, Some(200));
    }

    #[test]
    fn falls_back_when_no_status_present() {
        let (body, status) = CommandLineClient::split_status("just a body");
        assert_eq!(body, "just a body");
        assert_eq!(status, None);
    }
}
