use chrono::NaiveDate;
use serde_json::{Map, Value};

use super::schema::{ExtractionRecord, FieldSpec, FieldType, Schema};
use super::ExtractError;

/// Validate a parsed payload against a schema.
///
/// All-or-nothing: any missing required field or type mismatch rejects the
/// whole record — callers never receive silently incomplete structured data.
/// Undeclared fields are dropped.
pub fn validate_payload(payload: &Value, schema: &Schema) -> Result<ExtractionRecord, ExtractError> {
    let object = payload
        .as_object()
        .ok_or_else(|| ExtractError::Validation("payload is not a JSON object".into()))?;

    let fields = validate_object(object, &schema.fields, schema.name)?;

    Ok(ExtractionRecord {
        schema: schema.name.to_string(),
        fields,
    })
}

fn validate_object(
    object: &Map<String, Value>,
    specs: &[FieldSpec],
    context: &str,
) -> Result<Map<String, Value>, ExtractError> {
    let mut validated = Map::new();

    for spec in specs {
        match object.get(spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    return Err(ExtractError::Validation(format!(
                        "{context}: required field `{}` is missing",
                        spec.name
                    )));
                }
            }
            Some(value) => {
                let checked = validate_field(value, spec, context)?;
                validated.insert(spec.name.to_string(), checked);
            }
        }
    }

    Ok(validated)
}

fn validate_field(value: &Value, spec: &FieldSpec, context: &str) -> Result<Value, ExtractError> {
    let mismatch = |expected: &str| {
        ExtractError::Validation(format!(
            "{context}: field `{}` expected {expected}, got {value}",
            spec.name
        ))
    };

    match &spec.ty {
        FieldType::String => {
            let s = value.as_str().ok_or_else(|| mismatch("a string"))?;
            if s.trim().is_empty() {
                return Err(ExtractError::Validation(format!(
                    "{context}: field `{}` is empty",
                    spec.name
                )));
            }
            Ok(value.clone())
        }
        FieldType::Number { min, max } => {
            let n = value.as_f64().ok_or_else(|| mismatch("a number"))?;
            if min.is_some_and(|lo| n < lo) || max.is_some_and(|hi| n > hi) {
                return Err(ExtractError::Validation(format!(
                    "{context}: field `{}` value {n} outside declared range",
                    spec.name
                )));
            }
            Ok(value.clone())
        }
        FieldType::Date => {
            let s = value.as_str().ok_or_else(|| mismatch("a YYYY-MM-DD date"))?;
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map_err(|_| mismatch("a YYYY-MM-DD date"))?;
            Ok(value.clone())
        }
        FieldType::StringArray => {
            let items = value.as_array().ok_or_else(|| mismatch("an array of strings"))?;
            if !items.iter().all(Value::is_string) {
                return Err(mismatch("an array of strings"));
            }
            Ok(value.clone())
        }
        FieldType::ObjectArray(nested_specs) => {
            let items = value.as_array().ok_or_else(|| mismatch("an array of objects"))?;

            let mut validated_items = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let object = item.as_object().ok_or_else(|| {
                    ExtractError::Validation(format!(
                        "{context}: `{}`[{idx}] is not an object",
                        spec.name
                    ))
                })?;
                let nested_context = format!("{context}.{}[{idx}]", spec.name);
                let validated = validate_object(object, nested_specs, &nested_context)?;
                validated_items.push(Value::Object(validated));
            }

            Ok(Value::Array(validated_items))
        }
    }
}
