//! Structural validation of JSON values against contract schemas.
//!
//! The reusable engine underlying every parameter, body and response
//! check. Violations for one value are collected depth-first in
//! deterministic order: property declaration order for objects, index
//! order for arrays. Two runs over identical input produce identical
//! lists.
//!
//! Schema references are resolved lazily at the point of use, so cyclic
//! definition graphs (self-referential models) are fine: recursion is
//! bounded by the depth of the checked value, which is finite.

use serde_json::Value;

use crate::error::{CheckError, Location, Violation};
use crate::spec::{Schema, SchemaType, Specs};

/// Validate `value` against `schema`, rooted at `path`.
///
/// Returns every violation found, in deterministic order. An empty list
/// means the value conforms.
///
/// # Errors
///
/// Returns `CheckError::UnresolvedRef` if a schema node references a
/// definition the document doesn't have; the specification is malformed
/// and the whole call is abandoned.
pub fn validate(
    specs: &Specs,
    schema: &Schema,
    value: &Value,
    path: &str,
    location: Location,
) -> Result<Vec<Violation>, CheckError> {
    let mut violations = Vec::new();
    check_value(specs, schema, value, path, location, &mut violations)?;
    Ok(violations)
}

/// Returns the JSON type name used in mismatch messages.
fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_value(
    specs: &Specs,
    schema: &Schema,
    value: &Value,
    path: &str,
    location: Location,
    out: &mut Vec<Violation>,
) -> Result<(), CheckError> {
    let schema = deref(specs, schema)?;

    if let Some(kind) = schema.kind {
        if !type_matches(kind, value) {
            out.push(Violation::new(
                path,
                location,
                format!(
                    "must be of type {}: {:?}",
                    kind,
                    json_type_name(value)
                ),
            ));
            return Ok(());
        }
    }

    if let Some(allowed) = &schema.allowed {
        if !allowed.contains(value) {
            out.push(Violation::new(
                path,
                location,
                format!("should be one of [{}]", enum_literals(allowed)),
            ));
        }
    }

    check_refinements(schema, value, path, location, out);

    match value {
        Value::Object(fields) => {
            for (name, property) in &schema.properties {
                let child = join(path, name);
                match fields.get(name) {
                    Some(present) => {
                        check_value(specs, property, present, &child, location, out)?;
                    }
                    None if schema.required.iter().any(|r| r == name) => {
                        out.push(Violation::new(child, location, "is required"));
                    }
                    None => {}
                }
            }
            // Required names without a matching property declaration.
            for name in &schema.required {
                if !schema.properties.contains_key(name) && !fields.contains_key(name) {
                    out.push(Violation::new(join(path, name), location, "is required"));
                }
            }
        }
        Value::Array(elements) => {
            if let Some(items) = &schema.items {
                for (index, element) in elements.iter().enumerate() {
                    let child = join(path, index);
                    check_value(specs, items, element, &child, location, out)?;
                }
            }
        }
        _ => {}
    }

    Ok(())
}

/// Follow a `$ref` chain to the concrete schema node.
///
/// A chain of pure references that loops back on itself never reaches a
/// concrete node and is reported as unresolvable.
fn deref<'s>(specs: &'s Specs, schema: &'s Schema) -> Result<&'s Schema, CheckError> {
    let mut current = schema;
    let mut followed: Vec<&str> = Vec::new();

    while let Some(reference) = current.reference.as_deref() {
        if followed.contains(&reference) {
            return Err(CheckError::UnresolvedRef {
                reference: reference.to_string(),
            });
        }
        followed.push(reference);

        current = specs
            .resolve(reference)
            .ok_or_else(|| CheckError::UnresolvedRef {
                reference: reference.to_string(),
            })?;
    }

    Ok(current)
}

fn type_matches(kind: SchemaType, value: &Value) -> bool {
    match kind {
        SchemaType::String => value.is_string(),
        SchemaType::Integer => value.is_i64() || value.is_u64(),
        SchemaType::Number => value.is_number(),
        SchemaType::Boolean => value.is_boolean(),
        SchemaType::Array => value.is_array(),
        SchemaType::Object => value.is_object(),
        // File parameters carry no JSON shape; presence is checked at
        // extraction time.
        SchemaType::File => true,
    }
}

/// Format, pattern and bounds checks. Only reached once the declared type
/// matched, and each check applies only to values of the right shape.
fn check_refinements(
    schema: &Schema,
    value: &Value,
    path: &str,
    location: Location,
    out: &mut Vec<Violation>,
) {
    if let Some(s) = value.as_str() {
        match schema.format.as_deref() {
            Some("date-time") if chrono::DateTime::parse_from_rfc3339(s).is_err() => {
                out.push(Violation::new(
                    path,
                    location,
                    format!("must be of type date-time: {:?}", s),
                ));
            }
            Some("date") if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() => {
                out.push(Violation::new(
                    path,
                    location,
                    format!("must be of type date: {:?}", s),
                ));
            }
            _ => {}
        }

        if let Some(pattern) = &schema.pattern {
            match regex::Regex::new(pattern) {
                Ok(re) if !re.is_match(s) => {
                    out.push(Violation::new(
                        path,
                        location,
                        format!("should match '{}'", pattern),
                    ));
                }
                Ok(_) => {}
                Err(_) => {
                    tracing::warn!(%pattern, "unparsable pattern in specs, check skipped");
                }
            }
        }

        let length = s.chars().count() as u64;
        if let Some(min) = schema.min_length {
            if length < min {
                out.push(Violation::new(
                    path,
                    location,
                    format!("should be at least {} chars long", min),
                ));
            }
        }
        if let Some(max) = schema.max_length {
            if length > max {
                out.push(Violation::new(
                    path,
                    location,
                    format!("should be at most {} chars long", max),
                ));
            }
        }
    }

    if let Some(n) = value.as_f64() {
        let (format_min, format_max) = match schema.format.as_deref() {
            Some("int32") => (Some(f64::from(i32::MIN)), Some(f64::from(i32::MAX))),
            Some("int64") => (Some(i64::MIN as f64), Some(i64::MAX as f64)),
            _ => (None, None),
        };

        if let Some(min) = schema.minimum.or(format_min) {
            if n < min {
                out.push(Violation::new(
                    path,
                    location,
                    format!("should be greater than or equal to {}", min),
                ));
            }
        }
        if let Some(max) = schema.maximum.or(format_max) {
            if n > max {
                out.push(Violation::new(
                    path,
                    location,
                    format!("should be less than or equal to {}", max),
                ));
            }
        }
    }
}

/// Render enum members the way they appear in violation messages:
/// space-separated, strings unquoted, in declared order.
fn enum_literals(allowed: &[Value]) -> String {
    allowed
        .iter()
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn join(parent: &str, key: impl std::fmt::Display) -> String {
    format!("{}.{}", parent, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn specs_with_definitions(definitions: Value) -> Specs {
        Specs::from_value(json!({
            "swagger": "2.0",
            "info": { "title": "t", "version": "1" },
            "paths": {},
            "definitions": definitions
        }))
        .unwrap()
    }

    fn empty_specs() -> Specs {
        specs_with_definitions(json!({}))
    }

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    // === Type checks ===

    #[test]
    fn type_mismatch_names_the_actual_type() {
        let specs = empty_specs();
        let s = schema(json!({ "type": "integer" }));

        let violations =
            validate(&specs, &s, &json!("not-a-number"), "petId", Location::Path).unwrap();

        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].to_string(),
            "petId in path must be of type integer: \"string\""
        );
    }

    #[test]
    fn integer_accepts_whole_numbers_only() {
        let specs = empty_specs();
        let s = schema(json!({ "type": "integer" }));

        assert!(validate(&specs, &s, &json!(42), "n", Location::Query)
            .unwrap()
            .is_empty());
        let violations = validate(&specs, &s, &json!(4.5), "n", Location::Query).unwrap();
        assert_eq!(
            violations[0].to_string(),
            "n in query must be of type integer: \"number\""
        );
    }

    #[test]
    fn mismatch_suppresses_deeper_checks() {
        let specs = empty_specs();
        let s = schema(json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        }));

        let violations = validate(&specs, &s, &json!([1, 2]), "", Location::Body).unwrap();
        assert_eq!(violations.len(), 1);
        // Root-level violations carry an empty path and render bare.
        assert_eq!(
            violations[0].to_string(),
            "must be of type object: \"array\""
        );
    }

    // === Required properties ===

    #[test]
    fn missing_required_property_at_body_root() {
        let specs = empty_specs();
        let s = schema(json!({
            "type": "object",
            "required": ["name", "photoUrls"],
            "properties": {
                "name": { "type": "string" },
                "photoUrls": { "type": "array", "items": { "type": "string" } }
            }
        }));

        let violations =
            validate(&specs, &s, &json!({ "name": "foobar" }), "", Location::Body).unwrap();

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].to_string(), ".photoUrls in body is required");
    }

    #[test]
    fn sibling_violations_follow_declaration_order() {
        let specs = empty_specs();
        let s = schema(json!({
            "type": "object",
            "required": ["zeta", "alpha"],
            "properties": {
                "zeta": { "type": "string" },
                "alpha": { "type": "string" }
            }
        }));

        let violations = validate(&specs, &s, &json!({}), "", Location::Body).unwrap();

        let lines: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        assert_eq!(
            lines,
            [".zeta in body is required", ".alpha in body is required"]
        );
    }

    #[test]
    fn nested_required_uses_dotted_path() {
        let specs = empty_specs();
        let s = schema(json!({
            "type": "object",
            "properties": {
                "category": {
                    "type": "object",
                    "required": ["name"],
                    "properties": { "name": { "type": "string" } }
                }
            }
        }));

        let violations =
            validate(&specs, &s, &json!({ "category": {} }), "", Location::Body).unwrap();

        assert_eq!(
            violations[0].to_string(),
            ".category.name in body is required"
        );
    }

    // === Enums ===

    #[test]
    fn enum_violation_lists_values_in_declared_order() {
        let specs = empty_specs();
        let s = schema(json!({
            "type": "string",
            "enum": ["available", "pending", "sold"]
        }));

        let violations = validate(
            &specs,
            &s,
            &json!("invalid-enum-value"),
            "status.0",
            Location::Query,
        )
        .unwrap();

        assert_eq!(
            violations[0].to_string(),
            "status.0 in query should be one of [available pending sold]"
        );
    }

    #[test]
    fn enum_of_numbers_renders_literals() {
        let specs = empty_specs();
        let s = schema(json!({ "type": "integer", "enum": [1, 2, 3] }));

        let violations = validate(&specs, &s, &json!(9), "code", Location::Query).unwrap();
        assert_eq!(
            violations[0].to_string(),
            "code in query should be one of [1 2 3]"
        );
    }

    // === Arrays ===

    #[test]
    fn array_elements_are_indexed() {
        let specs = empty_specs();
        let s = schema(json!({
            "type": "array",
            "items": { "type": "string" }
        }));

        let violations =
            validate(&specs, &s, &json!(["ok", 3, "fine", 4]), "tags", Location::Query).unwrap();

        let lines: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        assert_eq!(
            lines,
            [
                "tags.1 in query must be of type string: \"number\"",
                "tags.3 in query must be of type string: \"number\""
            ]
        );
    }

    // === References ===

    #[test]
    fn reference_resolves_through_definitions() {
        let specs = specs_with_definitions(json!({
            "Pet": {
                "type": "object",
                "required": ["name"],
                "properties": { "name": { "type": "string" } }
            }
        }));
        let s = schema(json!({ "$ref": "#/definitions/Pet" }));

        let violations = validate(&specs, &s, &json!({}), "", Location::Body).unwrap();
        assert_eq!(violations[0].to_string(), ".name in body is required");
    }

    #[test]
    fn cyclic_definitions_are_bounded_by_value_depth() {
        // Node references itself through `next`; the value is finite, so
        // validation terminates and still finds the deep violation.
        let specs = specs_with_definitions(json!({
            "Node": {
                "type": "object",
                "required": ["label"],
                "properties": {
                    "label": { "type": "string" },
                    "next": { "$ref": "#/definitions/Node" }
                }
            }
        }));
        let s = schema(json!({ "$ref": "#/definitions/Node" }));

        let value = json!({
            "label": "a",
            "next": { "label": "b", "next": {} }
        });

        let violations = validate(&specs, &s, &value, "", Location::Body).unwrap();
        assert_eq!(
            violations[0].to_string(),
            ".next.next.label in body is required"
        );
    }

    #[test]
    fn dangling_reference_is_fatal() {
        let specs = empty_specs();
        let s = schema(json!({ "$ref": "#/definitions/Missing" }));

        let result = validate(&specs, &s, &json!({}), "", Location::Body);
        assert!(matches!(
            result,
            Err(CheckError::UnresolvedRef { reference }) if reference == "#/definitions/Missing"
        ));
    }

    #[test]
    fn pure_reference_cycle_is_fatal() {
        let specs = specs_with_definitions(json!({
            "A": { "$ref": "#/definitions/B" },
            "B": { "$ref": "#/definitions/A" }
        }));
        let s = schema(json!({ "$ref": "#/definitions/A" }));

        let result = validate(&specs, &s, &json!({}), "", Location::Body);
        assert!(matches!(result, Err(CheckError::UnresolvedRef { .. })));
    }

    // === Refinements ===

    #[test]
    fn refinements_only_apply_once_type_matches() {
        let specs = empty_specs();
        let s = schema(json!({ "type": "string", "format": "date-time" }));

        // Wrong type: one violation, the type mismatch.
        let violations = validate(&specs, &s, &json!(12), "ts", Location::Query).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(
            violations[0].to_string(),
            "ts in query must be of type string: \"number\""
        );

        // Right type, bad format.
        let violations =
            validate(&specs, &s, &json!("yesterday"), "ts", Location::Query).unwrap();
        assert_eq!(
            violations[0].to_string(),
            "ts in query must be of type date-time: \"yesterday\""
        );

        // Conforming.
        let violations =
            validate(&specs, &s, &json!("2024-02-29T08:00:00Z"), "ts", Location::Query).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn numeric_bounds() {
        let specs = empty_specs();
        let s = schema(json!({ "type": "integer", "minimum": 1, "maximum": 10 }));

        let violations = validate(&specs, &s, &json!(0), "limit", Location::Query).unwrap();
        assert_eq!(
            violations[0].to_string(),
            "limit in query should be greater than or equal to 1"
        );

        let violations = validate(&specs, &s, &json!(11), "limit", Location::Query).unwrap();
        assert_eq!(
            violations[0].to_string(),
            "limit in query should be less than or equal to 10"
        );
    }

    #[test]
    fn int32_format_bounds() {
        let specs = empty_specs();
        let s = schema(json!({ "type": "integer", "format": "int32" }));

        let violations =
            validate(&specs, &s, &json!(3_000_000_000_i64), "id", Location::Path).unwrap();
        assert_eq!(
            violations[0].to_string(),
            "id in path should be less than or equal to 2147483647"
        );
    }

    #[test]
    fn pattern_and_length() {
        let specs = empty_specs();
        let s = schema(json!({
            "type": "string",
            "pattern": "^[a-z]+$",
            "minLength": 3
        }));

        let violations = validate(&specs, &s, &json!("ab"), "tag", Location::Query).unwrap();
        let lines: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        assert_eq!(lines, ["tag in query should be at least 3 chars long"]);

        let violations = validate(&specs, &s, &json!("Tag"), "tag", Location::Query).unwrap();
        assert_eq!(
            violations[0].to_string(),
            "tag in query should match '^[a-z]+$'"
        );
    }

    // === Determinism ===

    #[test]
    fn identical_input_produces_identical_violations() {
        let specs = empty_specs();
        let s = schema(json!({
            "type": "object",
            "required": ["a", "b"],
            "properties": {
                "a": { "type": "string" },
                "b": { "type": "integer" },
                "c": { "type": "array", "items": { "type": "string" } }
            }
        }));
        let value = json!({ "b": "nope", "c": [1, "ok", 2] });

        let first = validate(&specs, &s, &value, "", Location::Body).unwrap();
        let second = validate(&specs, &s, &value, "", Location::Body).unwrap();

        let render = |vs: &[Violation]| {
            vs.iter().map(|v| v.to_string()).collect::<Vec<_>>()
        };
        assert_eq!(render(&first), render(&second));
        assert_eq!(
            render(&first),
            [
                ".a in body is required",
                ".b in body must be of type integer: \"string\"",
                ".c.0 in body must be of type string: \"number\"",
                ".c.2 in body must be of type string: \"number\""
            ]
        );
    }
}
