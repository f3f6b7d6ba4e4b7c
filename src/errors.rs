// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::envelope::ResponseEnvelope;

/// Library-wide error taxonomy.
///
/// `AntiBot` is internal-only: retry loops classify a response as anti-bot
/// and keep retrying, converting it into `UpstreamFetchFailed` only once the
/// retry budget is exhausted. It must never reach an operation boundary.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("fetch failed for {url} via {client_name}: {last_reason}")]
    UpstreamFetchFailed {
        client_name: String,
        url: String,
        last_reason: String,
    },

    #[error("anti-bot response detected (status {status})")]
    AntiBot { status: u16 },

    #[error("unregistered search engine: {name}")]
    UnknownEngine { name: String },

    #[error("backend {backend} unavailable: {reason}")]
    BackendUnavailable { backend: String, reason: String },

    #[error("SERP parse yielded no candidates for {engine}")]
    ParseError { engine: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl OrchestratorError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, OrchestratorError::AntiBot { .. })
    }

    /// Folds the error into a response envelope: 400 for caller errors,
    /// 502 for exhausted backends, 500 otherwise.
    pub fn into_envelope(self) -> ResponseEnvelope {
        match self {
            OrchestratorError::BadRequest(msg) => ResponseEnvelope::error(400, msg, None),
            OrchestratorError::UpstreamFetchFailed { .. } => {
                let message = self.to_string();
                ResponseEnvelope::error(502, message, None)
            }
            OrchestratorError::UnknownEngine { .. }
            | OrchestratorError::BackendUnavailable { .. }
            | OrchestratorError::ParseError { .. }
            | OrchestratorError::Other(_) => {
                let message = self.to_string();
                ResponseEnvelope::error(500, message, None)
            }
            OrchestratorError::AntiBot { .. } => {
                // Should never escape a retry loop; fall back to a generic 502.
                ResponseEnvelope::error(502, "anti-bot response exhausted retries", None)
            }
        }
    }
}
