use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Declared type of an extracted field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    String,
    /// Number constrained to an optional inclusive range.
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    /// ISO date, `YYYY-MM-DD`.
    Date,
    StringArray,
    /// Array of objects, each validated against the nested field set.
    ObjectArray(Vec<FieldSpec>),
}

impl FieldType {
    /// An unconstrained number.
    pub fn number() -> Self {
        Self::Number {
            min: None,
            max: None,
        }
    }

    /// A number with an inclusive lower bound.
    pub fn number_min(min: f64) -> Self {
        Self::Number {
            min: Some(min),
            max: None,
        }
    }
}

/// One declared field of a schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub ty: FieldType,
    pub required: bool,
}

impl FieldSpec {
    pub fn required(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: true,
        }
    }

    pub fn optional(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            required: false,
        }
    }
}

/// A declared field set that extraction output is validated against.
#[derive(Debug, Clone)]
pub struct Schema {
    pub name: &'static str,
    pub fields: Vec<FieldSpec>,
}

/// Name of the timeline schema's milestone array field.
pub const MILESTONES_FIELD: &str = "milestones";

impl Schema {
    /// Ordered dated milestones, each tied to a supporting passage.
    pub fn timeline() -> Self {
        Self {
            name: "timeline",
            fields: vec![FieldSpec::required(
                MILESTONES_FIELD,
                FieldType::ObjectArray(vec![
                    FieldSpec::required("date", FieldType::Date),
                    FieldSpec::required("milestone", FieldType::String),
                    FieldSpec::required("supporting_passage", FieldType::String),
                ]),
            )],
        }
    }

    /// Headline metadata of a submitted proposal.
    pub fn project_metadata() -> Self {
        Self {
            name: "project_metadata",
            fields: vec![
                FieldSpec::required("title", FieldType::String),
                FieldSpec::required("summary", FieldType::String),
                FieldSpec::optional("keywords", FieldType::StringArray),
                FieldSpec::optional("budget_usd", FieldType::number_min(0.0)),
            ],
        }
    }

    /// Resolve a caller-supplied schema name.
    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "timeline" => Some(Self::timeline()),
            "project_metadata" => Some(Self::project_metadata()),
            _ => None,
        }
    }

    /// Names accepted by `by_name`, for error messages.
    pub fn known_names() -> &'static [&'static str] {
        &["timeline", "project_metadata"]
    }
}

/// A validated extraction result. Only ever constructed by
/// `validate::validate_payload`, so holders can rely on every required
/// field being present and typed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionRecord {
    pub schema: String,
    pub fields: Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeline_schema_requires_all_milestone_fields() {
        let schema = Schema::timeline();
        assert_eq!(schema.fields.len(), 1);

        let milestone_fields = match &schema.fields[0].ty {
            FieldType::ObjectArray(fields) => fields,
            other => panic!("expected ObjectArray, got {other:?}"),
        };
        assert!(milestone_fields.iter().all(|f| f.required));
    }

    #[test]
    fn by_name_resolves_known_schemas() {
        for name in Schema::known_names() {
            assert!(Schema::by_name(name).is_some(), "{name} should resolve");
        }
        assert!(Schema::by_name("nonsense").is_none());
    }
}
