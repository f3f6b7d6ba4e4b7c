// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{BackendSettings, FetchClient};
use crate::errors::OrchestratorError;
use crate::headers::{self, HttpHeaders};
use crate::retry::{is_anti_bot_status, run_with_backoff, Outcome};

/// Native HTTP client with connection pooling. Builds a fresh `reqwest`
/// client per call to isolate cookies between fetches, relying on
/// `reqwest`'s internal connector defaults for pooling.
pub struct DirectHttpClient {
    settings: BackendSettings,
}

impl DirectHttpClient {
    pub fn new(settings: BackendSettings) -> Self {
        Self { settings }
    }

    fn build_client() -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .pool_max_idle_per_host(50)
            .cookie_store(true)
            .danger_accept_invalid_certs(true)
            .build()
    }

    fn header_map(enhanced: &HttpHeaders) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in enhanced {
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                map.insert(name, value);
            }
        }
        map
    }
}

#[async_trait]
impl FetchClient for DirectHttpClient {
    async fn fetch(&self, url: &str, headers: Option<&HttpHeaders>) -> Result<String, OrchestratorError> {
        let client = Self::build_client().map_err(anyhow::Error::from)?;
        let enhanced = headers::enhance(Some(url), headers);
        let header_map = Self::header_map(&enhanced);

        run_with_backoff(self.name(), url, self.settings.retries, |_attempt| {
            let client = client.clone();
            let header_map = header_map.clone();
            async move {
                let response = match client
                    .get(url)
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
        "direct_http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_successful_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Hi</html>"))
            .mount(&server)
            .await;

        let client = DirectHttpClient::new(BackendSettings {
            retries: 1,
            timeout: std::time::Duration::from_secs(5),
        });
        let body = client
            .fetch(&format!("{}/ok", server.uri()), None)
            .await
            .unwrap();
        assert_eq!(body, "<html>Hi</html>");
    }

    #[tokio::test]
    async fn retries_on_anti_bot_status_then_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blocked"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let client = DirectHttpClient::new(BackendSettings {
            retries: 1,
            timeout: std::time::Duration::from_secs(5),
        });
        let result = client.fetch(&format!("{}/blocked", server.uri()), None).await;
        assert!(matches!(
            result,
            Err(OrchestratorError::UpstreamFetchFailed { .. })
        ));
    }
}
