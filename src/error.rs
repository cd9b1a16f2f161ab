//! Error types for specification loading and traffic analysis.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Where in the HTTP exchange a checked value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Location {
    Path,
    Query,
    Header,
    Body,
    FormData,
    Response,
}

impl Location {
    /// Returns the location name as it appears in violation messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Header => "header",
            Location::Body => "body",
            Location::FormData => "formData",
            Location::Response => "response",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single contract violation, located within the checked value.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Violation {
    /// Dotted field path to the invalid value (`petId`, `status.0`,
    /// `.photoUrls`). Empty for response-level findings.
    pub path: String,
    pub location: Location,
    /// Human-readable description, e.g. `is required`.
    pub message: String,
}

impl Violation {
    pub(crate) fn new(
        path: impl Into<String>,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            location,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} in {} {}", self.path, self.location, self.message)
        }
    }
}

/// Errors while loading or self-checking a specification document.
#[derive(Debug, Error)]
pub enum SpecError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    #[error("not a valid specification document: {source}")]
    InvalidDocument {
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported specification version {version:?}")]
    UnsupportedVersion { version: String },

    // Self-check findings (exit code 1)
    #[error("validation failure list:\n{}", findings.join("\n"))]
    Invalid { findings: Vec<String> },
}

impl SpecError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SpecError::FileNotFound { .. } | SpecError::ReadError { .. } => 3,
            SpecError::Invalid { .. } => 1,
            _ => 2,
        }
    }
}

/// Errors from analyzing one request/response pair.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The request's method/path pair matches no documented operation.
    #[error("operation not defined inside the specs")]
    OperationNotFound,

    /// The request body is not decodable JSON. Reported verbatim so the
    /// caller can distinguish "not JSON" from "wrong shape".
    #[error(transparent)]
    InvalidJson(#[from] serde_json::Error),

    /// A schema node references a definition the document does not have.
    /// The specification is malformed, not merely violated.
    #[error("cannot resolve schema reference {reference:?}")]
    UnresolvedRef { reference: String },

    /// One or more schema violations, in deterministic order.
    #[error("validation failure list:\n{}", violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("\n"))]
    Invalid { violations: Vec<Violation> },
}

impl CheckError {
    pub(crate) fn invalid(violations: Vec<Violation>) -> Self {
        CheckError::Invalid { violations }
    }

    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            CheckError::UnresolvedRef { .. } => 2,
            _ => 1,
        }
    }
}

/// Errors from the validating HTTP transport.
#[cfg(feature = "client")]
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying transport failed; propagated untouched, the
    /// analyzer was never invoked.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The exchange violates the contract; the response was discarded.
    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("cannot build outgoing request: {reason}")]
    InvalidRequest { reason: String },
}
