//! Validating HTTP transport.
//!
//! A drop-in wrapper around `reqwest::blocking::Client`: every request is
//! buffered, forwarded, and the exchange analyzed before the response is
//! handed back. Callers cannot silently receive out-of-contract data — a
//! violation surfaces exactly like a network failure would.

use std::sync::Arc;

use crate::analyzer::Analyzer;
use crate::error::TransportError;
use crate::message::{Request, Response};
use crate::spec::Specs;

/// An HTTP client that refuses to hand back out-of-contract exchanges.
#[derive(Debug)]
pub struct Client {
    inner: reqwest::blocking::Client,
    analyzer: Analyzer,
}

impl Client {
    /// Build a validating client over a default `reqwest` client.
    pub fn new(specs: Arc<Specs>) -> Self {
        Self::with_client(reqwest::blocking::Client::new(), specs)
    }

    /// Build a validating client over an existing `reqwest` client.
    pub fn with_client(inner: reqwest::blocking::Client, specs: Arc<Specs>) -> Self {
        Self {
            inner,
            analyzer: Analyzer::new(specs),
        }
    }

    /// Send a buffered request through the underlying client, then check
    /// the exchange.
    ///
    /// # Errors
    ///
    /// `TransportError::Http` when the underlying transport fails — the
    /// failure propagates untouched and the analyzer never runs.
    /// `TransportError::Check` when the exchange violates the contract —
    /// the response is discarded. On success the buffered response is
    /// returned unmodified.
    pub fn execute(&self, request: Request) -> Result<Response, TransportError> {
        let outgoing = self.to_reqwest(&request)?;

        let incoming = self.inner.execute(outgoing)?;
        let response = buffer_response(incoming)?;

        self.analyzer.analyze(&request, Some(&response))?;

        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            status = response.status().as_u16(),
            "exchange conforms to the specs"
        );
        Ok(response)
    }

    fn to_reqwest(&self, request: &Request) -> Result<reqwest::blocking::Request, TransportError> {
        if request.uri().authority().is_none() {
            return Err(TransportError::InvalidRequest {
                reason: format!("uri {} has no host", request.uri()),
            });
        }

        let mut builder = self
            .inner
            .request(request.method().clone(), request.uri().to_string());
        builder = builder.headers(request.headers().clone());
        if !request.body().is_empty() {
            // The buffered bytes replay for free; the analyzer reads its
            // own copy of the same buffer.
            builder = builder.body(request.body().clone());
        }

        Ok(builder.build()?)
    }
}

/// Read the response fully once and rebuild it around the retained bytes.
fn buffer_response(incoming: reqwest::blocking::Response) -> Result<Response, TransportError> {
    let status = incoming.status();
    let headers = incoming.headers().clone();
    let body = incoming.bytes()?;

    let mut response = http::Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    Ok(Response::from(response))
}
