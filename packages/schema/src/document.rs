//! # Request Documents
//!
//! A request document is the unit of execution: where to land (`target`),
//! which surface/slot it belongs to (`meta`), and the node tree to build.

use crate::error::{ParseError, ParseResult};
use crate::node::NodeSpec;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

/// How a run treats nodes already present in the target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Keep existing children and key-match against them
    #[default]
    Append,
    /// Clear the target before rebuilding
    Replace,
    /// Same matching as append, for documents that only touch known keys
    Update,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Append => "append",
            Mode::Replace => "replace",
            Mode::Update => "update",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Mode::Append),
            "replace" => Ok(Mode::Replace),
            "update" => Ok(Mode::Update),
            other => Err(other.to_string()),
        }
    }
}

/// Preview vs committed execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum Intent {
    #[serde(rename = "dry-run")]
    DryRun,
    #[default]
    #[serde(rename = "apply")]
    Apply,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::DryRun => "dry-run",
            Intent::Apply => "apply",
        }
    }

    pub fn is_dry_run(&self) -> bool {
        matches!(self, Intent::DryRun)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dry-run" | "dryrun" | "preview" => Ok(Intent::DryRun),
            "apply" => Ok(Intent::Apply),
            other => Err(other.to_string()),
        }
    }
}

/// Wire values go through `FromStr`, so serde and CLI parsing agree on case
fn deserialize_from_str<'de, D, T>(
    deserializer: D,
    expected: &'static [&'static str],
) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse()
        .map_err(|_| serde::de::Error::unknown_variant(&raw, expected))
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_from_str(deserializer, &["append", "replace", "update"])
    }
}

impl<'de> Deserialize<'de> for Intent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserialize_from_str(deserializer, &["dry-run", "apply"])
    }
}

/// Descriptive metadata; `designSurface`, `slot` and `section` drive placement
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_surface: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Anything else authors put in `meta`
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Requested landing spot; resolved values are written back here
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDocument {
    #[serde(
        default = "default_schema_version",
        deserialize_with = "deserialize_version"
    )]
    pub schema_version: String,
    #[serde(default)]
    pub meta: DocumentMeta,
    #[serde(default)]
    pub target: TargetSpec,
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
}

fn default_schema_version() -> String {
    CURRENT_SCHEMA_VERSION.to_string()
}

/// Accept `"1.0"` as well as bare numbers like `1`
fn deserialize_version<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(default_schema_version()),
        other => Err(serde::de::Error::custom(format!(
            "schemaVersion must be a string or number, got {}",
            other
        ))),
    }
}

impl RequestDocument {
    pub fn new(nodes: Vec<NodeSpec>) -> Self {
        Self {
            schema_version: default_schema_version(),
            meta: DocumentMeta::default(),
            target: TargetSpec::default(),
            nodes,
        }
    }

    /// Total number of specs in the tree
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        for node in &self.nodes {
            node.walk(&mut |_, _| count += 1);
        }
        count
    }
}

/// Parse a raw JSON request document
pub fn parse_document(source: &str) -> ParseResult<RequestDocument> {
    let trimmed = source.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    // Every field is optional, so serde would also accept a sequence
    if !trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(source).map_err(ParseError::from_json)?;
        return Err(ParseError::NotAnObject(json_kind(&value)));
    }

    serde_json::from_str(source).map_err(ParseError::from_json)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_document() {
        let source = r#"{
            "schemaVersion": 1,
            "meta": {
                "title": "Glossary",
                "designSurface": "Docs",
                "slot": "body",
                "section": "glossary",
                "owner": "docs-team"
            },
            "target": { "page": "Layouts", "frameName": "GlossaryLayout", "mode": "replace" },
            "nodes": [ { "type": "frame", "name": "Terms", "children": [ { "type": "text", "content": "API" } ] } ]
        }"#;

        let doc = parse_document(source).unwrap();
        assert_eq!(doc.schema_version, "1");
        assert_eq!(doc.meta.design_surface.as_deref(), Some("Docs"));
        assert_eq!(doc.meta.extra.get("owner"), Some(&Value::from("docs-team")));
        assert_eq!(doc.target.mode, Some(Mode::Replace));
        assert_eq!(doc.target.frame_name.as_deref(), Some("GlossaryLayout"));
        assert_eq!(doc.node_count(), 2);
    }

    #[test]
    fn test_minimal_document_defaults() {
        let doc = parse_document(r#"{ "nodes": [] }"#).unwrap();
        assert_eq!(doc.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(doc.target, TargetSpec::default());
        assert!(doc.meta.design_surface.is_none());
    }

    #[test]
    fn test_syntax_errors_are_invalid_json() {
        let err = parse_document("{ \"nodes\": [ ").unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson { .. }));
    }

    #[test]
    fn test_shape_errors_are_invalid_document() {
        let err = parse_document(r#"{ "target": { "mode": "merge" } }"#).unwrap_err();
        assert!(matches!(err, ParseError::InvalidDocument { .. }));
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(parse_document("   \n").unwrap_err(), ParseError::Empty);
    }

    #[test]
    fn test_non_object_documents_are_rejected() {
        assert_eq!(parse_document("[]").unwrap_err(), ParseError::NotAnObject("an array"));
        assert_eq!(parse_document(" 1 ").unwrap_err(), ParseError::NotAnObject("a number"));
        assert_eq!(parse_document(r#""x""#).unwrap_err(), ParseError::NotAnObject("a string"));
        assert!(matches!(parse_document("[1,"), Err(ParseError::InvalidJson { .. })));
    }

    #[test]
    fn test_mode_wire_values_ignore_case() {
        let doc = parse_document(r#"{ "target": { "mode": "Replace" } }"#).unwrap();
        assert_eq!(doc.target.mode, Some(Mode::Replace));
        assert_eq!(serde_json::to_string(&Mode::Replace).unwrap(), r#""replace""#);

        let intent: Intent = serde_json::from_str(r#""DRY-RUN""#).unwrap();
        assert_eq!(intent, Intent::DryRun);
        assert_eq!(serde_json::to_string(&intent).unwrap(), r#""dry-run""#);
    }

    #[test]
    fn test_mode_and_intent_from_str() {
        assert_eq!("Replace".parse::<Mode>(), Ok(Mode::Replace));
        assert!("merge".parse::<Mode>().is_err());
        assert_eq!("dry-run".parse::<Intent>(), Ok(Intent::DryRun));
        assert_eq!(Intent::default(), Intent::Apply);
    }
}
