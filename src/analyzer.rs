//! Request/response analysis against the loaded contract.
//!
//! One pass per call: route the path, look up the operation by method,
//! check each declared parameter, then check the response. Routing misses
//! are terminal; parameter checks stop at the first parameter that has
//! violations, and every violation for that parameter is reported.

use std::sync::Arc;

use serde_json::Value;

use crate::error::{CheckError, Location, Violation};
use crate::message::{Request, Response};
use crate::params;
use crate::router::PathRouter;
use crate::spec::{Operation, Specs};
use crate::validate;

/// Analyzes request/response pairs against previously loaded [`Specs`].
///
/// Holds no per-call state: a single analyzer can serve any number of
/// concurrent checks.
#[derive(Debug)]
pub struct Analyzer {
    specs: Arc<Specs>,
    router: PathRouter,
}

impl Analyzer {
    /// Build an analyzer for the given specification.
    pub fn new(specs: Arc<Specs>) -> Self {
        let mut router = PathRouter::new();
        for template in specs.templates() {
            router.register(template);
        }
        Self { specs, router }
    }

    /// Analyze a request and, when supplied, its response.
    ///
    /// Method and path are checked together: a known path with an
    /// undocumented method reports the same routing error as an unknown
    /// path.
    ///
    /// # Errors
    ///
    /// `CheckError::OperationNotFound` when the request matches no
    /// documented operation, `CheckError::InvalidJson` for an undecodable
    /// request body, `CheckError::UnresolvedRef` for a malformed
    /// specification, and `CheckError::Invalid` with the violation list
    /// otherwise.
    pub fn analyze(
        &self,
        request: &Request,
        response: Option<&Response>,
    ) -> Result<(), CheckError> {
        let Some(route) = self.router.lookup(request.path()) else {
            tracing::debug!(path = request.path(), "no matching path template");
            return Err(CheckError::OperationNotFound);
        };

        let Some(operation) = self
            .specs
            .operation(request.method().as_str(), route.template)
        else {
            tracing::debug!(
                method = %request.method(),
                template = route.template,
                "method not documented for template"
            );
            return Err(CheckError::OperationNotFound);
        };

        for param in &operation.parameters {
            let violations = params::check_parameter(&self.specs, request, &route, param)?;
            if !violations.is_empty() {
                tracing::debug!(
                    parameter = %param.name,
                    count = violations.len(),
                    "parameter violates contract"
                );
                return Err(CheckError::invalid(violations));
            }
        }

        if let Some(response) = response {
            self.check_response(operation, response)?;
        }

        Ok(())
    }

    fn check_response(
        &self,
        operation: &Operation,
        response: &Response,
    ) -> Result<(), CheckError> {
        let status = response.status().as_u16();

        let Some(spec) = operation.responses.get(&status.to_string()) else {
            return Err(CheckError::invalid(vec![Violation::new(
                "",
                Location::Response,
                format!("response status {} not defined inside the specs", status),
            )]));
        };

        let Some(schema) = &spec.schema else {
            // Documented status without a schema: the body must be empty.
            if !response.body().is_empty() {
                return Err(CheckError::invalid(vec![Violation::new(
                    "",
                    Location::Response,
                    format!(
                        "no response body defined inside the specs but have {:?}",
                        String::from_utf8_lossy(response.body())
                    ),
                )]));
            }
            return Ok(());
        };

        let value: Value = match serde_json::from_slice(response.body()) {
            Ok(value) => value,
            Err(e) => {
                return Err(CheckError::invalid(vec![Violation::new(
                    "",
                    Location::Response,
                    format!("failed to parse response body: {}", e),
                )]));
            }
        };

        // Response bodies are checked like request bodies, so violations
        // read "<path> in body ...".
        let violations = validate::validate(&self.specs, schema, &value, "", Location::Body)?;
        if !violations.is_empty() {
            return Err(CheckError::invalid(violations));
        }

        Ok(())
    }
}
