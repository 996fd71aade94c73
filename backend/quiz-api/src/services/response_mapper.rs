//! Turns raw model output into question drafts.
//!
//! Model output is unreliable, so nothing here fails: unparseable output is
//! "no result" and malformed items are skipped.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::generation::{
    GeneratedExactAnswer, GeneratedFreeText, GeneratedMultipleChoice, GeneratedNumeric,
    RawGeneratedQuestions,
};
use crate::models::{
    ExactAnswerQuestion, MultipleChoiceAnswer, MultipleChoiceQuestion, NumericQuestion,
    QuestionDraft, QuestionPayload, RawGeneratedEnvelope,
};

/// Byte ranges of the top-level `{...}` objects in `text`, skipping braces
/// inside string literals.
fn root_objects(text: &str) -> Vec<(usize, usize)> {
    let mut roots = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escape = false;

    for (i, b) in text.bytes().enumerate() {
        if in_string {
            if escape {
                escape = false;
            } else if b == b'\\' {
                escape = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    roots.push((start, i + 1));
                }
            }
            _ => {}
        }
    }
    roots
}

/// First top-level JSON object in `text`, for output wrapped in prose or
/// code fences.
pub fn extract_json_object(text: &str) -> Option<&str> {
    root_objects(text)
        .into_iter()
        .map(|(start, end)| &text[start..end])
        .next()
}

/// Parses the quiz envelope, or returns `None` when the output does not
/// contain one.
pub fn parse_generated_quiz(raw: &str) -> Option<RawGeneratedEnvelope> {
    if let Ok(envelope) = serde_json::from_str::<RawGeneratedEnvelope>(raw.trim()) {
        return Some(envelope);
    }
    root_objects(raw)
        .into_iter()
        .find_map(|(start, end)| serde_json::from_str(&raw[start..end]).ok())
}

fn decode_items<T: DeserializeOwned>(category: &str, items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!(category, error = %e, "Skipping malformed generated item");
                None
            }
        })
        .collect()
}

fn numeric(item: GeneratedNumeric) -> QuestionPayload {
    QuestionPayload::Numeric(NumericQuestion {
        text: item.question,
        correct_answer: item.answer,
        tolerance: item.max_difference,
        feedback: None,
    })
}

fn free_text(item: GeneratedFreeText) -> QuestionPayload {
    QuestionPayload::ExactAnswer(ExactAnswerQuestion {
        text: item.question,
        correct_answers: vec![item.answer],
        case_sensitive: false,
        feedback: None,
    })
}

fn multiple_choice(item: GeneratedMultipleChoice) -> QuestionPayload {
    QuestionPayload::MultipleChoice(MultipleChoiceQuestion {
        text: item.question,
        answers: item
            .options
            .into_iter()
            .map(|option| MultipleChoiceAnswer {
                answer_text: option.text,
                correct: option.is_correct,
                feedback: None,
            })
            .collect(),
    })
}

fn exact_answer(item: GeneratedExactAnswer) -> QuestionPayload {
    QuestionPayload::ExactAnswer(ExactAnswerQuestion {
        text: item.question,
        correct_answers: vec![item.answer],
        case_sensitive: item.case_sensitive,
        feedback: None,
    })
}

/// Maps every well-formed item to a generated draft. Numeric questions come
/// first, then free text, multiple choice and exact answer.
pub fn map_questions(questions: RawGeneratedQuestions) -> Vec<QuestionDraft> {
    let mut payloads = Vec::new();
    payloads.extend(
        decode_items::<GeneratedNumeric>("numeric", questions.numeric)
            .into_iter()
            .map(numeric),
    );
    payloads.extend(
        decode_items::<GeneratedFreeText>("free_text", questions.free_text)
            .into_iter()
            .map(free_text),
    );
    payloads.extend(
        decode_items::<GeneratedMultipleChoice>("multiple_choice", questions.multiple_choice)
            .into_iter()
            .map(multiple_choice),
    );
    payloads.extend(
        decode_items::<GeneratedExactAnswer>("exact_answer", questions.exact_answer)
            .into_iter()
            .map(exact_answer),
    );
    payloads.into_iter().map(QuestionDraft::generated).collect()
}

/// Parse and map in one step; `None` when the output holds no quiz.
pub fn drafts_from_output(raw: &str) -> Option<Vec<QuestionDraft>> {
    parse_generated_quiz(raw).map(|envelope| map_questions(envelope.quiz.questions))
}
