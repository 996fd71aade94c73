use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizCompletedInput {
    pub user_id: Uuid,
    pub completed_questions: Vec<QuestionCompletedInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCompletedInput {
    pub question_id: Uuid,
    pub correct: bool,
    #[serde(default)]
    pub used_hint: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizCompletionFeedback {
    pub success: bool,
    pub correctness: f64,
    pub hints_used: u32,
}
