// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON call envelope exchanged with the web layer.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use storyshare_core::error::{Result, StoryshareError};
use storyshare_core::human_errors::humanize_error;

/// A method invocation coming from the host UI.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PluginCall {
    pub method: String,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl PluginCall {
    pub fn new(method: impl Into<String>, data: Map<String, Value>) -> Self {
        Self {
            method: method.into(),
            data,
        }
    }

    /// Build a call from a method name and a JSON object of arguments.
    ///
    /// An empty or `null` argument string means "no arguments".
    pub fn from_json(method: &str, args_json: &str) -> Result<Self> {
        let data = match serde_json::from_str::<Value>(args_json.trim()) {
            Ok(Value::Object(map)) => map,
            Ok(Value::Null) => Map::new(),
            Ok(other) => {
                return Err(StoryshareError::Config(format!(
                    "call arguments must be a JSON object, got {other}"
                )));
            }
            Err(_) if args_json.trim().is_empty() => Map::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self::new(method, data))
    }

    /// A string argument. Non-string values count as absent.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// Outcome reported back to the caller: the promise is resolved or rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PluginResult {
    Resolved {
        #[serde(skip_serializing_if = "Option::is_none")]
        package: Option<String>,
    },
    Rejected {
        code: String,
        message: String,
        suggestion: String,
    },
}

impl PluginResult {
    pub fn resolved(package: Option<String>) -> Self {
        Self::Resolved { package }
    }

    pub fn rejected(err: &StoryshareError) -> Self {
        let human = humanize_error(err);
        Self::Rejected {
            code: human.code.into(),
            message: human.message,
            suggestion: human.suggestion,
        }
    }

    pub fn unimplemented(method: &str) -> Self {
        Self::Rejected {
            code: "UNIMPLEMENTED".into(),
            message: format!("Method {method} is not implemented"),
            suggestion: "Update the app.".into(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"rejected","code":"CONFIG_ERROR","message":"{e}","suggestion":""}}"#)
        })
    }
}
