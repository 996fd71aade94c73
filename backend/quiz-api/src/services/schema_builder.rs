//! JSON schema describing the exact output shape requested from the model.

use schemars::generate::SchemaSettings;
use serde_json::{Number, Value};

use crate::models::{GeneratedQuizEnvelope, GenerationLimits};

const QUESTIONS_POINTER: &str = "/properties/quiz/properties/questions/properties";

/// Optional item bounds per question category. `None` leaves the bound out
/// of the schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaArgs {
    pub min_multiple_choice: Option<u32>,
    pub max_multiple_choice: Option<u32>,
    pub min_free_text: Option<u32>,
    pub max_free_text: Option<u32>,
    pub min_numeric: Option<u32>,
    pub max_numeric: Option<u32>,
    pub min_exact_answer: Option<u32>,
    pub max_exact_answer: Option<u32>,
}

impl From<&GenerationLimits> for SchemaArgs {
    fn from(limits: &GenerationLimits) -> Self {
        Self {
            min_multiple_choice: Some(limits.min_multiple_choice_questions),
            max_multiple_choice: Some(limits.max_multiple_choice_questions),
            min_free_text: Some(limits.min_free_text_questions),
            max_free_text: Some(limits.max_free_text_questions),
            min_numeric: Some(limits.min_numeric_questions),
            max_numeric: Some(limits.max_numeric_questions),
            min_exact_answer: Some(limits.min_exact_questions),
            max_exact_answer: Some(limits.max_exact_questions),
        }
    }
}

/// Schema of [`GeneratedQuizEnvelope`] with every subschema inlined, so the
/// four category arrays sit at fixed paths.
pub fn base_schema() -> Value {
    let schema = SchemaSettings::draft2020_12()
        .with(|settings| settings.inline_subschemas = true)
        .into_generator()
        .into_root_schema_for::<GeneratedQuizEnvelope>();
    schema.to_value()
}

pub fn build_schema(args: &SchemaArgs) -> Value {
    let mut schema = base_schema();
    for (category, min, max) in [
        ("multiple_choice", args.min_multiple_choice, args.max_multiple_choice),
        ("free_text", args.min_free_text, args.max_free_text),
        ("numeric", args.min_numeric, args.max_numeric),
        ("exact_answer", args.min_exact_answer, args.max_exact_answer),
    ] {
        let pointer = format!("{}/{}", QUESTIONS_POINTER, category);
        match schema.pointer_mut(&pointer).and_then(Value::as_object_mut) {
            Some(node) => {
                if let Some(min) = min {
                    node.insert("minItems".to_string(), Value::Number(Number::from(min)));
                }
                if let Some(max) = max {
                    node.insert("maxItems".to_string(), Value::Number(Number::from(max)));
                }
            }
            None => tracing::warn!(category, "Category missing from generated schema"),
        }
    }
    schema
}
