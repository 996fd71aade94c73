use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One question in a quiz pool.
///
/// `number` is the 1-based addressing token clients use ("question 3"); it is
/// unique within the pool and the pool is kept sorted by it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Uuid,
    pub number: u32,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub ai_generated: bool,
    /// Append-only answer outcomes, used for aggregate reporting.
    #[serde(default)]
    pub statistics: Vec<AnswerOutcome>,
    #[serde(flatten)]
    pub payload: QuestionPayload,
}

impl Question {
    pub fn kind(&self) -> QuestionType {
        self.payload.kind()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    MultipleChoice,
    Cloze,
    Association,
    ExactAnswer,
    Numeric,
    SelfAssessment,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple_choice",
            QuestionType::Cloze => "cloze",
            QuestionType::Association => "association",
            QuestionType::ExactAnswer => "exact_answer",
            QuestionType::Numeric => "numeric",
            QuestionType::SelfAssessment => "self_assessment",
        }
    }
}

/// Kind-specific part of a stored question, discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionPayload {
    MultipleChoice(MultipleChoiceQuestion),
    Cloze(ClozeQuestion),
    Association(AssociationQuestion),
    ExactAnswer(ExactAnswerQuestion),
    Numeric(NumericQuestion),
    SelfAssessment(SelfAssessmentQuestion),
}

impl QuestionPayload {
    pub fn kind(&self) -> QuestionType {
        match self {
            QuestionPayload::MultipleChoice(_) => QuestionType::MultipleChoice,
            QuestionPayload::Cloze(_) => QuestionType::Cloze,
            QuestionPayload::Association(_) => QuestionType::Association,
            QuestionPayload::ExactAnswer(_) => QuestionType::ExactAnswer,
            QuestionPayload::Numeric(_) => QuestionType::Numeric,
            QuestionPayload::SelfAssessment(_) => QuestionType::SelfAssessment,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceQuestion {
    pub text: String,
    pub answers: Vec<MultipleChoiceAnswer>,
}

impl MultipleChoiceQuestion {
    pub fn correct_answer_count(&self) -> usize {
        self.answers.iter().filter(|answer| answer.correct).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceAnswer {
    pub answer_text: String,
    pub correct: bool,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClozeQuestion {
    pub cloze_elements: Vec<ClozeElement>,
    #[serde(default = "default_show_blanks_list")]
    pub show_blanks_list: bool,
    #[serde(default)]
    pub additional_wrong_answers: Vec<String>,
}

fn default_show_blanks_list() -> bool {
    true
}

impl ClozeQuestion {
    /// Correct answers of every blank, in element order.
    pub fn blank_answers(&self) -> impl Iterator<Item = &str> {
        self.cloze_elements.iter().filter_map(|element| match element {
            ClozeElement::Blank { correct_answer, .. } => Some(correct_answer.as_str()),
            ClozeElement::Text { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClozeElement {
    Text {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Blank {
        correct_answer: String,
        #[serde(default)]
        feedback: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClozeElementType {
    Text,
    Blank,
}

/// Cloze element as submitted by a caller. Field presence is checked against
/// the element type before it becomes a [`ClozeElement`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClozeElementInput {
    #[serde(rename = "type")]
    pub element_type: ClozeElementType,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssociationQuestion {
    pub text: String,
    pub correct_associations: Vec<Association>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub left: String,
    pub right: String,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExactAnswerQuestion {
    pub text: String,
    pub correct_answers: Vec<String>,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NumericQuestion {
    pub text: String,
    pub correct_answer: f64,
    #[serde(default)]
    pub tolerance: f64,
    #[serde(default)]
    pub feedback: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SelfAssessmentQuestion {
    pub text: String,
    pub solution_suggestion: String,
}

/// Question body submitted by a caller, tagged the same way as
/// [`QuestionPayload`]. Only cloze differs, because its elements arrive
/// loosely typed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionInput {
    MultipleChoice(MultipleChoiceQuestion),
    Cloze(ClozeQuestionInput),
    Association(AssociationQuestion),
    ExactAnswer(ExactAnswerQuestion),
    Numeric(NumericQuestion),
    SelfAssessment(SelfAssessmentQuestion),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClozeQuestionInput {
    pub cloze_elements: Vec<ClozeElementInput>,
    #[serde(default = "default_show_blanks_list")]
    pub show_blanks_list: bool,
    #[serde(default)]
    pub additional_wrong_answers: Vec<String>,
}

/// A question that has not been admitted to a pool yet.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionDraft {
    /// Requested number; `None` lets the pool assign the next free one.
    pub number: Option<u32>,
    pub hint: Option<String>,
    pub ai_generated: bool,
    pub payload: QuestionPayload,
}

impl QuestionDraft {
    pub fn new(payload: QuestionPayload) -> Self {
        Self {
            number: None,
            hint: None,
            ai_generated: false,
            payload,
        }
    }

    pub fn generated(payload: QuestionPayload) -> Self {
        Self {
            ai_generated: true,
            ..Self::new(payload)
        }
    }
}

/// Outcome of one user answering one question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub user_id: Uuid,
    pub answered_correctly: bool,
    pub recorded_at: DateTime<Utc>,
}
