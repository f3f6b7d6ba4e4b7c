// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{BackendSettings, FetchClient};
use crate::errors::OrchestratorError;
use crate::headers::{self, HttpHeaders};
use crate::retry::{is_anti_bot_status, run_with_backoff, Outcome};

/// Issues a GET to `<agent_url>?url=<target>` instead of talking to the
/// target directly, for deployments that route outbound traffic through a
/// proxy agent. Otherwise identical to `DirectHttpClient`.
pub struct ProxyGatewayClient {
    settings: BackendSettings,
    agent_url: String,
}

impl ProxyGatewayClient {
    pub fn new(settings: BackendSettings, agent_url: String) -> Self {
        Self { settings, agent_url }
    }
}

#[async_trait]
impl FetchClient for ProxyGatewayClient {
    async fn fetch(&self, url: &str, headers: Option<&HttpHeaders>) -> Result<String, OrchestratorError> {
        if self.agent_url.trim().is_empty() {
            return Err(OrchestratorError::BackendUnavailable {
                backend: self.name().to_string(),
                reason: "AGENT_URL is not configured".to_string(),
            });
        }

        let gateway_url = format!(
            "{}?url={}",
            self.agent_url,
            urlencoding::encode(url)
        );

        let enhanced = headers::enhance(Some(url), headers);
        let mut header_map = HeaderMap::new();
        for (k, v) in &enhanced {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                header_map.insert(name, value);
            }
        }

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(anyhow::Error::from)?;

        run_with_backoff(self.name(), url, self.settings.retries, |_attempt| {
            let client = client.clone();
            let header_map = header_map.clone();
            let gateway_url = gateway_url.clone();
            async move {
                let response = match client
                    .get(&gateway_url)
                    .headers(header_map)
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
        "proxy_gateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn refuses_immediately_when_agent_url_empty() {
        let client = ProxyGatewayClient::new(
            BackendSettings {
                retries: 3,
                timeout: std::time::Duration::from_secs(5),
            },
            String::new(),
        );

        let result = client.fetch("https://example.com", None).await;
        assert!(matches!(
            result,
            Err(OrchestratorError::BackendUnavailable { .. })
        ));
    }
}
