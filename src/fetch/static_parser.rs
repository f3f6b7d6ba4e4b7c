// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;

use super::{BackendSettings, DirectHttpClient, FetchClient};
use crate::errors::OrchestratorError;
use crate::extract;
use crate::headers::HttpHeaders;

/// `DIRECT_HTTP` plus inline HTML-to-text extraction: callers get plain
/// text directly rather than having to run the extractor themselves.
pub struct StaticParserClient {
    inner: DirectHttpClient,
}

impl StaticParserClient {
    pub fn new(settings: BackendSettings) -> Self {
        Self {
            inner: DirectHttpClient::new(settings),
        }
    }
}

#[async_trait]
impl FetchClient for StaticParserClient {
    async fn fetch(&self, url: &str, headers: Option<&HttpHeaders>) -> Result<String, OrchestratorError> {
        let html = self.inner.fetch(url, headers).await?;
        Ok(extract::extract(&html))
    }

    fn name(&self) -> &'static str {
        "static_parser"
    }
}
