//! OAS Checker
//!
//! Validates live HTTP traffic against a previously loaded OpenAPI
//! (Swagger 2.0) contract.
//!
//! Each observed request is matched to a documented operation via
//! templated path routing, every declared parameter (path, query, header,
//! body, formData) is checked against its schema, and the response body is
//! checked against the schema declared for its status code. Use it as a
//! standalone checker (see the `oas-checker` binary) or wrap a client with
//! [`Client`] so every call is audited without changing call sites.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use oas_checker::{Analyzer, Request, Specs};
//!
//! let specs = Specs::from_slice(br#"{
//!     "swagger": "2.0",
//!     "info": { "title": "petstore", "version": "1.0.0" },
//!     "paths": {
//!         "/pet/{petId}": {
//!             "get": {
//!                 "parameters": [
//!                     { "name": "petId", "in": "path", "required": true, "type": "integer" }
//!                 ],
//!                 "responses": { "200": { "description": "ok" } }
//!             }
//!         }
//!     }
//! }"#).unwrap();
//!
//! let analyzer = Analyzer::new(Arc::new(specs));
//!
//! let request = Request::from(
//!     http::Request::builder()
//!         .method("GET")
//!         .uri("/pet/not-a-number")
//!         .body(Bytes::new())
//!         .unwrap(),
//! );
//!
//! let err = analyzer.analyze(&request, None).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "validation failure list:\npetId in path must be of type integer: \"string\""
//! );
//! ```
//!
//! # Concurrency
//!
//! [`Specs`] is immutable after construction and shared by `Arc`; every
//! analyze call is independent and touches no shared mutable state, so any
//! number of checks may run in parallel.

mod analyzer;
mod error;
mod message;
mod params;
mod router;
mod spec;
#[cfg(feature = "client")]
mod transport;
mod validate;

pub use analyzer::Analyzer;
pub use error::{CheckError, Location, SpecError, Violation};
pub use message::{FormPart, Request, Response};
pub use router::{PathRouter, RouteMatch};
pub use spec::{
    Document, Info, Operation, ParamLocation, Parameter, PathItem, ResponseSpec, Schema,
    SchemaType, Specs,
};
pub use validate::validate;

#[cfg(feature = "client")]
pub use error::TransportError;
#[cfg(feature = "client")]
pub use transport::Client;
