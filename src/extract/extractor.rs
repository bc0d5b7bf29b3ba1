use std::sync::Arc;

use super::parser::parse_json_block;
use super::schema::{ExtractionRecord, FieldSpec, FieldType, Schema};
use super::validate::validate_payload;
use super::ExtractError;
use crate::generation::LlmGenerate;

pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a structured data extractor. You read a document and emit ONLY the requested fields.

RULES:
1. Output exactly one fenced ```json block and nothing else.
2. Include every required field. Use null for optional fields you cannot find.
3. Dates are ISO format: YYYY-MM-DD.
4. Copy values from the document; never invent data that is not present."#;

/// Generation-backed structured extraction validated against a declared
/// schema. A partial or unparsable response fails; it never yields a
/// half-filled record.
pub struct StructuredExtractor {
    generator: Arc<dyn LlmGenerate>,
}

impl StructuredExtractor {
    pub fn new(generator: Arc<dyn LlmGenerate>) -> Self {
        Self { generator }
    }

    /// Extract `schema` from free text.
    pub async fn extract(
        &self,
        text: &str,
        schema: &Schema,
    ) -> Result<ExtractionRecord, ExtractError> {
        let prompt = build_extraction_prompt(text, schema);
        let response = self
            .generator
            .generate(EXTRACTION_SYSTEM_PROMPT, &prompt)
            .await?;

        let payload = parse_json_block(&response)?;
        let record = validate_payload(&payload, schema)?;

        tracing::debug!(schema = schema.name, fields = record.fields.len(), "extraction validated");
        Ok(record)
    }
}

/// Describe the schema and attach the document.
pub fn build_extraction_prompt(text: &str, schema: &Schema) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!("Extract the `{}` record.\n\nFIELDS:\n", schema.name));
    describe_fields(&mut prompt, &schema.fields, 0);

    prompt.push_str("\nDOCUMENT:\n");
    prompt.push_str(text);
    prompt.push_str("\n\nRespond with a single ```json block.");

    prompt
}

fn describe_fields(out: &mut String, fields: &[FieldSpec], depth: usize) {
    let indent = "  ".repeat(depth);
    for spec in fields {
        let requirement = if spec.required { "required" } else { "optional" };
        match &spec.ty {
            FieldType::ObjectArray(nested) => {
                out.push_str(&format!(
                    "{indent}- {} ({requirement}): array of objects with:\n",
                    spec.name
                ));
                describe_fields(out, nested, depth + 1);
            }
            other => {
                out.push_str(&format!(
                    "{indent}- {} ({requirement}): {}\n",
                    spec.name,
                    type_label(other)
                ));
            }
        }
    }
}

fn type_label(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::String => "string",
        FieldType::Number { .. } => "number",
        FieldType::Date => "date (YYYY-MM-DD)",
        FieldType::StringArray => "array of strings",
        FieldType::ObjectArray(_) => "array of objects",
    }
}
