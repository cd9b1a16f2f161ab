//! Specification loading and the in-memory contract model.
//!
//! A [`Specs`] value is built once from a Swagger 2.0 JSON document and is
//! immutable afterwards: analyzers and transports share it through an `Arc`
//! and read it concurrently without synchronization. Only same-document
//! schema references (`#/definitions/<Name>`) are supported; they are kept
//! as references and resolved lazily at validation time, never flattened.

use std::collections::BTreeMap;
use std::path::Path;
use std::{fmt, fs};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::SpecError;

/// Structural meta-schema the document itself is checked against.
const META_SCHEMA: &str = include_str!("swagger_meta.json");

/// A loaded, immutable specification document.
#[derive(Debug)]
pub struct Specs {
    raw: Value,
    document: Document,
}

impl Specs {
    /// Load a specification from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::FileNotFound` if the file doesn't exist,
    /// `SpecError::ReadError` if it cannot be read, and the parse errors
    /// of [`Specs::from_slice`] otherwise.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SpecError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read(path).map_err(|source| SpecError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_slice(&content)
    }

    /// Load a specification from raw JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::InvalidJson` if the bytes aren't valid JSON,
    /// `SpecError::InvalidDocument` if they don't deserialize into the
    /// document model, and `SpecError::UnsupportedVersion` for anything
    /// other than a Swagger 2.0 document.
    pub fn from_slice(raw: &[u8]) -> Result<Self, SpecError> {
        let value: Value =
            serde_json::from_slice(raw).map_err(|source| SpecError::InvalidJson { source })?;
        Self::from_value(value)
    }

    /// Build a specification from an already-parsed JSON value.
    pub fn from_value(raw: Value) -> Result<Self, SpecError> {
        let document: Document = serde_json::from_value(raw.clone())
            .map_err(|source| SpecError::InvalidDocument { source })?;

        if document.swagger != "2.0" {
            return Err(SpecError::UnsupportedVersion {
                version: document.swagger,
            });
        }

        Ok(Self { raw, document })
    }

    /// Check the document against the structural meta-schema.
    ///
    /// This validates the specification itself, not traffic: misplaced
    /// keywords, array schemas without `items`, body parameters without a
    /// schema, and similar authoring mistakes.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::Invalid` with one finding per meta-violation.
    pub fn validate(&self) -> Result<(), SpecError> {
        let meta: Value = serde_json::from_str(META_SCHEMA)
            .map_err(|source| SpecError::InvalidJson { source })?;

        let validator = jsonschema::validator_for(&meta).map_err(|e| SpecError::Invalid {
            findings: vec![format!("cannot compile meta-schema: {}", e)],
        })?;

        let findings: Vec<String> = validator
            .iter_errors(&self.raw)
            .map(|e| format!("{}: {}", e.instance_path, e))
            .collect();

        if findings.is_empty() {
            Ok(())
        } else {
            Err(SpecError::Invalid { findings })
        }
    }

    /// The typed document model.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// All registered path templates, in document order.
    pub fn templates(&self) -> impl Iterator<Item = &str> {
        self.document.paths.keys().map(|s| s.as_str())
    }

    /// Look up the operation for a method and path template.
    pub fn operation(&self, method: &str, template: &str) -> Option<&Operation> {
        self.document.paths.get(template)?.operation(method)
    }

    /// Resolve a `#/definitions/<Name>` reference to its schema.
    pub fn resolve(&self, reference: &str) -> Option<&Schema> {
        let name = reference.strip_prefix("#/definitions/")?;
        self.document.definitions.get(name)
    }
}

/// Typed subset of a Swagger 2.0 document.
#[derive(Debug, Deserialize)]
pub struct Document {
    pub swagger: String,
    pub info: Info,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default)]
    pub definitions: BTreeMap<String, Schema>,
}

#[derive(Debug, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
}

/// Operations documented under one path template, keyed by method.
#[derive(Debug, Default, Deserialize)]
pub struct PathItem {
    pub get: Option<Operation>,
    pub put: Option<Operation>,
    pub post: Option<Operation>,
    pub delete: Option<Operation>,
    pub options: Option<Operation>,
    pub head: Option<Operation>,
    pub patch: Option<Operation>,
}

impl PathItem {
    /// The operation for an HTTP method name, if documented.
    pub fn operation(&self, method: &str) -> Option<&Operation> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => self.get.as_ref(),
            "PUT" => self.put.as_ref(),
            "POST" => self.post.as_ref(),
            "DELETE" => self.delete.as_ref(),
            "OPTIONS" => self.options.as_ref(),
            "HEAD" => self.head.as_ref(),
            "PATCH" => self.patch.as_ref(),
            _ => None,
        }
    }
}

/// One documented (method, path template) pair.
#[derive(Debug, Default, Deserialize)]
pub struct Operation {
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Expected responses keyed by decimal status code. An absent entry
    /// means the status is undocumented; a present entry without a schema
    /// means the body must be empty.
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseSpec>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseSpec {
    #[serde(default)]
    pub description: String,
    pub schema: Option<Schema>,
}

/// Where a parameter is carried in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Body,
    FormData,
}

/// One declared operation parameter.
///
/// Body parameters carry a full [`Schema`]; the other locations inline
/// their constraints (`type`, `format`, `enum`, `items`, ...) directly on
/// the parameter object, captured here by the flattened `constraints`.
#[derive(Debug, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParamLocation,
    #[serde(default)]
    pub required: bool,
    pub schema: Option<Schema>,
    #[serde(flatten)]
    pub constraints: Schema,
}

/// Declared primitive or structural type of a schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
    File,
}

impl SchemaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaType::String => "string",
            SchemaType::Integer => "integer",
            SchemaType::Number => "number",
            SchemaType::Boolean => "boolean",
            SchemaType::Array => "array",
            SchemaType::Object => "object",
            SchemaType::File => "file",
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declarative structural constraint over a JSON-like value.
///
/// Schemas form a directed graph that may be cyclic through named
/// definitions; cycles are harmless because validation recurses over the
/// checked value, not the schema graph. Property order is preserved so
/// error ordering follows declaration order.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schema {
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<SchemaType>,
    pub format: Option<String>,
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub properties: IndexMap<String, Schema>,
    pub items: Option<Box<Schema>>,
    #[serde(rename = "enum")]
    pub allowed: Option<Vec<Value>>,
    pub pattern: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    #[serde(rename = "minLength")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength")]
    pub max_length: Option<u64>,
}
