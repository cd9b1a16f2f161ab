//! Per-location parameter extraction and checking.
//!
//! One strategy per parameter location, dispatched over the closed
//! [`ParamLocation`] set: pull the raw value out of the request, coerce it
//! by the declared type, and hand it to the schema validator with the
//! right location tag so messages read e.g.
//! `petId in path must be of type integer: "string"`.

use serde_json::Value;

use crate::error::{CheckError, Location, Violation};
use crate::message::Request;
use crate::router::RouteMatch;
use crate::spec::{ParamLocation, Parameter, SchemaType, Specs};
use crate::validate;

/// Check one declared parameter against the request.
///
/// Returns the violations for this parameter; an empty list means it
/// conforms.
///
/// # Errors
///
/// `CheckError::InvalidJson` when a body parameter's payload is not
/// decodable JSON (reported verbatim), `CheckError::UnresolvedRef` when
/// the specification references a missing definition.
pub(crate) fn check_parameter(
    specs: &Specs,
    request: &Request,
    route: &RouteMatch<'_>,
    param: &Parameter,
) -> Result<Vec<Violation>, CheckError> {
    match param.location {
        ParamLocation::Path => check_path(specs, route, param),
        ParamLocation::Query => check_query(specs, request, param),
        ParamLocation::Header => check_header(specs, request, param),
        ParamLocation::FormData => check_form_data(specs, request, param),
        ParamLocation::Body => check_body(specs, request, param),
    }
}

/// Parse a raw string by the declared type.
///
/// On parse failure the original string is kept, so the validator reports
/// a typed mismatch instead of an opaque parse error surfacing here.
fn coerce(raw: &str, kind: Option<SchemaType>) -> Value {
    match kind {
        Some(SchemaType::Integer) => raw
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(raw)),
        Some(SchemaType::Number) => raw
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Value::from)
            .unwrap_or_else(|| Value::from(raw)),
        Some(SchemaType::Boolean) => match raw {
            "true" => Value::from(true),
            "false" => Value::from(false),
            _ => Value::from(raw),
        },
        _ => Value::from(raw),
    }
}

fn required_violation(param: &Parameter, location: Location) -> Vec<Violation> {
    vec![Violation::new(&*param.name, location, "is required")]
}

fn check_path(
    specs: &Specs,
    route: &RouteMatch<'_>,
    param: &Parameter,
) -> Result<Vec<Violation>, CheckError> {
    // The router matched, so a declared placeholder is normally present;
    // a miss means the parameter is declared but absent from the template.
    let Some(raw) = route.params.get(&param.name) else {
        return Ok(required_violation(param, Location::Path));
    };

    let value = coerce(raw, param.constraints.kind);
    validate::validate(specs, &param.constraints, &value, &param.name, Location::Path)
}

fn check_query(
    specs: &Specs,
    request: &Request,
    param: &Parameter,
) -> Result<Vec<Violation>, CheckError> {
    let values = request.query_values(&param.name);
    if values.is_empty() {
        if param.required {
            return Ok(required_violation(param, Location::Query));
        }
        return Ok(Vec::new());
    }

    let value = if param.constraints.kind == Some(SchemaType::Array) {
        let item_kind = param.constraints.items.as_ref().and_then(|items| items.kind);
        Value::Array(values.iter().map(|raw| coerce(raw, item_kind)).collect())
    } else {
        coerce(&values[0], param.constraints.kind)
    };

    validate::validate(
        specs,
        &param.constraints,
        &value,
        &param.name,
        Location::Query,
    )
}

fn check_header(
    specs: &Specs,
    request: &Request,
    param: &Parameter,
) -> Result<Vec<Violation>, CheckError> {
    let raw = request.header(&param.name);
    if raw.is_empty() {
        if param.required {
            return Ok(required_violation(param, Location::Header));
        }
        return Ok(Vec::new());
    }

    let value = coerce(raw, param.constraints.kind);
    validate::validate(
        specs,
        &param.constraints,
        &value,
        &param.name,
        Location::Header,
    )
}

fn check_form_data(
    specs: &Specs,
    request: &Request,
    param: &Parameter,
) -> Result<Vec<Violation>, CheckError> {
    if param.constraints.kind == Some(SchemaType::File) {
        if request.form_file(&param.name).is_none() && param.required {
            return Ok(required_violation(param, Location::FormData));
        }
        return Ok(Vec::new());
    }

    match request.form_field(&param.name).filter(|raw| !raw.is_empty()) {
        None if param.required => Ok(required_violation(param, Location::FormData)),
        None => Ok(Vec::new()),
        Some(raw) => {
            let value = coerce(&raw, param.constraints.kind);
            validate::validate(
                specs,
                &param.constraints,
                &value,
                &param.name,
                Location::FormData,
            )
        }
    }
}

fn check_body(
    specs: &Specs,
    request: &Request,
    param: &Parameter,
) -> Result<Vec<Violation>, CheckError> {
    let value: Value = serde_json::from_slice(request.body())?;

    let Some(schema) = &param.schema else {
        return Ok(Vec::new());
    };

    validate::validate(specs, schema, &value, "", Location::Body)
}
