// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use serde_json::Value;

/// The uniform `{code, message, data}` envelope returned by every public
/// operation. No operation ever surfaces a raw exception to its caller;
/// failures are folded into an envelope with a non-200 `code`.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseEnvelope {
    pub code: u16,
    pub message: String,
    pub data: Value,
}

impl ResponseEnvelope {
    pub fn success(message: impl Into<String>, data: Value) -> Self {
        Self {
            code: 200,
            message: message.into(),
            data,
        }
    }

    pub fn error(code: u16, message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            data: data.unwrap_or(Value::Null),
        }
    }
}
