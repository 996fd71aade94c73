use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

/// Bounds handed to the model when generating questions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationLimits {
    pub max_questions: u32,
    pub min_questions: u32,
    pub max_answers_per_question: u32,
    pub allow_multiple_correct_answers: bool,
    pub max_multiple_choice_questions: u32,
    pub max_free_text_questions: u32,
    pub max_exact_questions: u32,
    pub max_numeric_questions: u32,
    pub min_multiple_choice_questions: u32,
    pub min_free_text_questions: u32,
    pub min_exact_questions: u32,
    pub min_numeric_questions: u32,
}

impl Default for GenerationLimits {
    fn default() -> Self {
        Self {
            max_questions: 10,
            min_questions: 1,
            max_answers_per_question: 4,
            allow_multiple_correct_answers: false,
            max_multiple_choice_questions: 5,
            max_free_text_questions: 5,
            max_exact_questions: 5,
            max_numeric_questions: 5,
            min_multiple_choice_questions: 5,
            min_free_text_questions: 5,
            min_exact_questions: 5,
            min_numeric_questions: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    #[validate(length(max = 4000, message = "Description must be at most 4000 characters"))]
    #[serde(default)]
    pub description: String,
    #[validate(length(max = 50, message = "At most 50 source documents can be referenced"))]
    #[serde(default)]
    pub source_document_ids: Vec<String>,
    #[serde(default)]
    pub limits: GenerationLimits,
}

/// Immediate acknowledgement of a background generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationAccepted {
    pub quiz_id: Uuid,
    pub status: String,
}

/// Request body of the Ollama `/api/generate` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    #[serde(default)]
    pub response: Option<String>,
}

// Shape the model is asked to return. The structs double as the source of the
// JSON schema sent alongside the prompt.

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedQuizEnvelope {
    pub quiz: GeneratedQuiz,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedQuiz {
    pub title: String,
    pub questions: GeneratedQuestions,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedQuestions {
    pub multiple_choice: Vec<GeneratedMultipleChoice>,
    pub free_text: Vec<GeneratedFreeText>,
    pub numeric: Vec<GeneratedNumeric>,
    pub exact_answer: Vec<GeneratedExactAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedMultipleChoice {
    pub question: String,
    pub options: Vec<GeneratedOption>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedOption {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedFreeText {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedNumeric {
    pub question: String,
    pub answer: f64,
    pub max_difference: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GeneratedExactAnswer {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Loosely typed view of the model output: the envelope must be present, the
/// individual items are decoded one by one so a single bad item does not
/// discard the rest.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGeneratedEnvelope {
    pub quiz: RawGeneratedQuiz,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGeneratedQuiz {
    #[serde(default, deserialize_with = "lenient_title")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_questions")]
    pub questions: RawGeneratedQuestions,
}

/// Each category tolerates `null` or a non-array value, read as empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGeneratedQuestions {
    #[serde(default, deserialize_with = "lenient_items")]
    pub multiple_choice: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub free_text: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub numeric: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_items")]
    pub exact_answer: Vec<Value>,
}

fn lenient_title<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(title) => Some(title),
        _ => None,
    })
}

fn lenient_questions<'de, D>(deserializer: D) -> Result<RawGeneratedQuestions, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(RawGeneratedQuestions::default());
    }
    RawGeneratedQuestions::deserialize(value).map_err(serde::de::Error::custom)
}

fn lenient_items<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items,
        _ => Vec::new(),
    })
}
