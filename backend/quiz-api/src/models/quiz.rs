use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::question::{Question, QuestionInput, QuestionPayload};

/// Quiz aggregate. The question pool is always sorted by ascending number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: Uuid,
    pub course_id: Uuid,
    #[serde(default)]
    pub question_pool: Vec<Question>,
    #[serde(default)]
    pub required_correct_answers: u32,
    #[serde(default)]
    pub pooling_mode: PoolingMode,
    #[serde(default)]
    pub random_sample_size: Option<u32>,
}

impl Quiz {
    pub fn new(id: Uuid, course_id: Uuid) -> Self {
        Self {
            id,
            course_id,
            question_pool: Vec::new(),
            required_correct_answers: 0,
            pooling_mode: PoolingMode::Ordered,
            random_sample_size: None,
        }
    }

    pub fn question_by_number(&self, number: u32) -> Option<&Question> {
        self.question_pool.iter().find(|q| q.number == number)
    }

    pub fn question_by_id(&self, id: &Uuid) -> Option<&Question> {
        self.question_pool.iter().find(|q| &q.id == id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolingMode {
    #[default]
    Ordered,
    Random,
}

impl PoolingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolingMode::Ordered => "ordered",
            PoolingMode::Random => "random",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuizRequest {
    /// Identity of the assessment this quiz backs; generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub course_id: Uuid,
    #[serde(default)]
    pub required_correct_answers: u32,
    #[serde(default)]
    pub pooling_mode: PoolingMode,
    #[serde(default)]
    pub random_sample_size: Option<u32>,
    #[serde(default)]
    #[validate(length(max = 500, message = "A quiz can be created with at most 500 questions"))]
    pub questions: Vec<AddQuestionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AddQuestionRequest {
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(flatten)]
    pub question: QuestionInput,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    /// New number; `None` keeps the current one.
    #[serde(default)]
    pub number: Option<u32>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(flatten)]
    pub question: QuestionInput,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchQuestionsRequest {
    pub first_number: u32,
    pub second_number: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredCorrectAnswersRequest {
    pub required_correct_answers: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolingModeRequest {
    pub pooling_mode: PoolingMode,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomSampleSizeRequest {
    pub random_sample_size: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizLookupRequest {
    pub ids: Vec<Uuid>,
}

/// Question as shown to a caller. Cloze and association questions carry
/// freshly shuffled display lists.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: Uuid,
    pub number: u32,
    pub hint: Option<String>,
    pub ai_generated: bool,
    #[serde(flatten)]
    pub payload: QuestionPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_blanks: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_side: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_side: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizView {
    pub id: Uuid,
    pub course_id: Uuid,
    pub question_pool: Vec<QuestionView>,
    pub required_correct_answers: u32,
    pub pooling_mode: PoolingMode,
    pub random_sample_size: Option<u32>,
    pub selected_questions: Vec<QuestionView>,
}
