//! # Execution Requests
//!
//! The message a driver (editor UI, CLI) sends to the engine: an intent and a
//! batch of serialized request documents plus optional target overrides.
//! Payloads are validated as a whole before any document is parsed.

use crate::document::{Intent, Mode};
use crate::error::RequestError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A validated execution request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRequest {
    pub intent: Intent,
    /// Raw JSON request documents, executed in order
    pub documents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_mode: Option<Mode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_frame_name: Option<String>,
}

impl ExecutionRequest {
    /// Build a request from already-trusted parts, applying the same validation
    pub fn new(intent: Intent, documents: Vec<String>) -> Result<Self, RequestError> {
        validate_documents(documents.iter().map(|d| Some(d.as_str())))?;

        Ok(Self {
            intent,
            documents,
            target_page: None,
            target_mode: None,
            target_frame_name: None,
        })
    }

    pub fn with_target_page(mut self, page: impl Into<String>) -> Self {
        self.target_page = normalize_optional(Some(page.into()));
        self
    }

    pub fn with_target_mode(mut self, mode: Mode) -> Self {
        self.target_mode = Some(mode);
        self
    }

    pub fn with_target_frame_name(mut self, frame_name: impl Into<String>) -> Self {
        self.target_frame_name = normalize_optional(Some(frame_name.into()));
        self
    }

    /// Parse and validate a JSON payload
    pub fn from_json(payload: &str) -> Result<Self, RequestError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| RequestError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    /// Validate an already-decoded payload
    pub fn from_value(value: Value) -> Result<Self, RequestError> {
        let object = match value {
            Value::Object(object) => object,
            _ => return Err(RequestError::NotAnObject),
        };

        let intent = match optional_string(&object, "intent")? {
            Some(raw) => raw
                .parse::<Intent>()
                .map_err(|_| RequestError::InvalidIntent(raw.to_string()))?,
            None => Intent::default(),
        };

        let documents = match object.get("documents") {
            Some(Value::Array(items)) => {
                validate_documents(items.iter().map(Value::as_str))?;
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            }
            Some(Value::Null) | None => return Err(RequestError::NoDocuments),
            Some(_) => return Err(RequestError::InvalidField { field: "documents" }),
        };

        let target_mode = match optional_string(&object, "targetMode")? {
            Some(raw) => Some(
                raw.parse::<Mode>()
                    .map_err(|_| RequestError::InvalidMode(raw.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            intent,
            documents,
            target_page: optional_string(&object, "targetPage")?.map(str::to_string),
            target_mode,
            target_frame_name: optional_string(&object, "targetFrameName")?.map(str::to_string),
        })
    }
}

fn validate_documents<'a>(
    documents: impl Iterator<Item = Option<&'a str>>,
) -> Result<(), RequestError> {
    let mut count = 0;
    for (index, document) in documents.enumerate() {
        count += 1;
        match document {
            None => return Err(RequestError::DocumentNotString { index }),
            Some(doc) if doc.trim().is_empty() => {
                return Err(RequestError::EmptyDocument { index })
            }
            Some(_) => {}
        }
    }

    if count == 0 {
        return Err(RequestError::NoDocuments);
    }
    Ok(())
}

/// Trimmed string field, omitted when absent, null or blank
fn optional_string<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<Option<&'a str>, RequestError> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then_some(trimmed))
        }
        Some(_) => Err(RequestError::InvalidField { field }),
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
