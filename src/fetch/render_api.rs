// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use serde_json::Value;

use super::{BackendSettings, FetchClient};
use crate::errors::OrchestratorError;
use crate::headers::HttpHeaders;
use crate::retry::{is_anti_bot_status, run_with_backoff, Outcome};

const RENDER_API_ENDPOINT: &str = "https://api.firecrawl.dev/v1/scrape";

/// POSTs to an external Firecrawl-compatible rendering service and extracts
/// the HTML payload from its JSON response, which may come back as an
/// object, a list, or a bare string depending on the service's API version.
pub struct RenderApiClient {
    settings: BackendSettings,
    api_key: String,
}

impl RenderApiClient {
    pub fn new(settings: BackendSettings, api_key: String) -> Self {
        Self { settings, api_key }
    }

    /// Extracts HTML from a response body that may be a dict with `data.html`
    /// / `html` / `content`, a one-element list wrapping such a dict, or a
    /// bare JSON string.
    fn extract_html(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => items.first().and_then(Self::extract_html),
            Value::Object(_) => value
                .get("data")
                .and_then(Self::extract_html)
                .or_else(|| value.get("html").and_then(Value::as_str).map(str::to_string))
                .or_else(|| value.get("content").and_then(Value::as_str).map(str::to_string))
                .or_else(|| value.get("markdown").and_then(Value::as_str).map(str::to_string)),
            _ => None,
        }
    }
}

#[async_trait]
impl FetchClient for RenderApiClient {
    async fn fetch(&self, url: &str, _headers: Option<&HttpHeaders>) -> Result<String, OrchestratorError> {
        if self.api_key.trim().is_empty() {
            return Err(OrchestratorError::BackendUnavailable {
                backend: self.name().to_string(),
                reason: "FIRECRAWL_API_KEY is not configured".to_string(),
            });
        }

        let client = reqwest::Client::new();

        run_with_backoff(self.name(), url, self.settings.retries, |_attempt| {
            let client = client.clone();
            async move {
                let response = match client
                    .post(RENDER_API_ENDPOINT)
                    .bearer_auth(&self.api_key)
                    .json(&serde_json::json!({ "url": url, "formats": ["html"] }))
                    .timeout(self.settings.timeout)
                    .send()
                    .await
                {
                    Ok(r) => r,
                    Err(e) => return Outcome::Retry(e.to_string()),
                };

                let status = response.status().as_u16();
                if is_anti_bot_status(status) {
                    return Outcome::Retry(format!("anti-bot status {status}"));
                }
                if !response.status().is_success() {
                    return Outcome::Retry(format!("http status {status}"));
                }

                let payload: Value = match response.json().await {
                    Ok(v) => v,
                    Err(e) => return Outcome::Retry(e.to_string()),
                };

                match Self::extract_html(&payload) {
                    Some(html) if !html.is_empty() => Outcome::Ok(html),
                    _ => Outcome::Retry("empty render result".to_string()),
                }
            }
        })
        .await
    }

    fn name(&self) -> &'static str {
        "render_api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_html_from_nested_object() {
        let payload = serde_json::json!({ "data": { "html": "<p>hi</p>" } });
        assert_eq!(RenderApiClient::extract_html(&payload).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn extracts_html_from_list_wrapper() {
        let payload = serde_json::json!([{ "html": "<p>hi</p>" }]);
        assert_eq!(RenderApiClient::extract_html(&payload).unwrap(), "<p>hi</p>");
    }

    #[test]
    fn extracts_html_from_bare_string() {
        let payload = serde_json::json!("<p>hi</p>");
        assert_eq!(RenderApiClient::extract_html(&payload).unwrap(), "<p>hi</p>");
    }
}
