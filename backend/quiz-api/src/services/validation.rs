//! Structural checks a question must pass before it is admitted to a pool.
//!
//! Everything here is pure. Number uniqueness needs pool context and is
//! checked by the pool operations instead.

use std::collections::HashSet;

use crate::error::{QuizError, QuizResult};
use crate::models::{
    Association, ClozeElement, ClozeElementInput, ClozeElementType, ClozeQuestion,
    MultipleChoiceAnswer, QuestionInput, QuestionPayload,
};

pub const MSG_NO_CORRECT_ANSWER: &str = "at least one answer must be correct";
pub const MSG_NO_BLANK: &str = "must contain at least one blank";
pub const MSG_BLANK_REQUIRES_ANSWER: &str = "correct answer is required for cloze blank elements";
pub const MSG_BLANK_FORBIDS_TEXT: &str = "text is not allowed for cloze blank elements";
pub const MSG_TEXT_FORBIDS_ANSWER: &str = "correct answer is not allowed for cloze text elements";
pub const MSG_TEXT_REQUIRES_TEXT: &str = "text is required for cloze text elements";
pub const MSG_TEXT_FORBIDS_FEEDBACK: &str = "cloze text elements cannot have feedback";
pub const MSG_ASSOCIATION_SIDES: &str = "each side must only contain unique values";

/// Checks a caller-supplied question and turns it into its stored form.
pub fn validate_input(input: QuestionInput) -> QuizResult<QuestionPayload> {
    let payload = match input {
        QuestionInput::MultipleChoice(question) => QuestionPayload::MultipleChoice(question),
        QuestionInput::Cloze(question) => QuestionPayload::Cloze(ClozeQuestion {
            cloze_elements: validate_cloze_elements(question.cloze_elements)?,
            show_blanks_list: question.show_blanks_list,
            additional_wrong_answers: question.additional_wrong_answers,
        }),
        QuestionInput::Association(question) => QuestionPayload::Association(question),
        QuestionInput::ExactAnswer(question) => QuestionPayload::ExactAnswer(question),
        QuestionInput::Numeric(question) => QuestionPayload::Numeric(question),
        QuestionInput::SelfAssessment(question) => QuestionPayload::SelfAssessment(question),
    };
    validate_payload(&payload)?;
    Ok(payload)
}

/// Checks the cross-field rules of an already typed question.
pub fn validate_payload(payload: &QuestionPayload) -> QuizResult<()> {
    match payload {
        QuestionPayload::MultipleChoice(question) => {
            validate_at_least_one_correct(&question.answers)
        }
        QuestionPayload::Cloze(question) => {
            if question.blank_answers().next().is_none() {
                return Err(QuizError::validation(MSG_NO_BLANK));
            }
            Ok(())
        }
        QuestionPayload::Association(question) => {
            validate_sides_unique(&question.correct_associations)
        }
        QuestionPayload::Numeric(question) => {
            if question.tolerance < 0.0 || question.tolerance.is_nan() {
                return Err(QuizError::validation("tolerance must not be negative"));
            }
            Ok(())
        }
        QuestionPayload::ExactAnswer(_) | QuestionPayload::SelfAssessment(_) => Ok(()),
    }
}

pub fn validate_at_least_one_correct(answers: &[MultipleChoiceAnswer]) -> QuizResult<()> {
    if answers.iter().any(|answer| answer.correct) {
        Ok(())
    } else {
        Err(QuizError::validation(MSG_NO_CORRECT_ANSWER))
    }
}

pub fn validate_cloze_elements(elements: Vec<ClozeElementInput>) -> QuizResult<Vec<ClozeElement>> {
    if !elements
        .iter()
        .any(|element| element.element_type == ClozeElementType::Blank)
    {
        return Err(QuizError::validation(MSG_NO_BLANK));
    }
    elements.into_iter().map(validate_cloze_element).collect()
}

fn validate_cloze_element(element: ClozeElementInput) -> QuizResult<ClozeElement> {
    match element.element_type {
        ClozeElementType::Blank => {
            if element.text.is_some() {
                return Err(QuizError::validation(MSG_BLANK_FORBIDS_TEXT));
            }
            let correct_answer = element
                .correct_answer
                .ok_or_else(|| QuizError::validation(MSG_BLANK_REQUIRES_ANSWER))?;
            Ok(ClozeElement::Blank {
                correct_answer,
                feedback: element.feedback,
            })
        }
        ClozeElementType::Text => {
            if element.correct_answer.is_some() {
                return Err(QuizError::validation(MSG_TEXT_FORBIDS_ANSWER));
            }
            if element.feedback.is_some() {
                return Err(QuizError::validation(MSG_TEXT_FORBIDS_FEEDBACK));
            }
            let text = element
                .text
                .ok_or_else(|| QuizError::validation(MSG_TEXT_REQUIRES_TEXT))?;
            Ok(ClozeElement::Text { text })
        }
    }
}

/// Left values must be pairwise distinct, and so must right values. A value
/// may still appear once on each side.
pub fn validate_sides_unique(associations: &[Association]) -> QuizResult<()> {
    let mut left = HashSet::with_capacity(associations.len());
    let mut right = HashSet::with_capacity(associations.len());
    for association in associations {
        if !left.insert(association.left.as_str()) || !right.insert(association.right.as_str()) {
            return Err(QuizError::validation(MSG_ASSOCIATION_SIDES));
        }
    }
    Ok(())
}
