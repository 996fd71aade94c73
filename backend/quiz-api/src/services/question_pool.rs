//! Structural edits of a quiz's question pool.
//!
//! Every function here works on an in-memory [`Quiz`] and either applies the
//! whole edit or returns an error without touching the pool. Loading and
//! saving the aggregate is the caller's business.

use uuid::Uuid;

use crate::error::{QuizError, QuizResult};
use crate::models::{PoolingMode, Question, QuestionDraft, QuestionPayload, Quiz};
use crate::services::validation::validate_payload;

fn question_not_found(quiz_id: Uuid, number: u32) -> QuizError {
    QuizError::NotFound(format!(
        "Question with number {} not found in quiz with id {}.",
        number, quiz_id
    ))
}

pub fn question_id_not_found(quiz_id: Uuid, question_id: Uuid) -> QuizError {
    QuizError::NotFound(format!(
        "Question with id {} not found in quiz with id {}.",
        question_id, quiz_id
    ))
}

fn duplicate_number(number: u32) -> QuizError {
    QuizError::validation(format!(
        "question number must be unique, but the number {} is already used",
        number
    ))
}

/// Number the next appended question receives.
pub fn next_number(pool: &[Question]) -> QuizResult<u32> {
    match pool.iter().map(|q| q.number).max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            QuizError::validation("no question number left after the highest one in use")
        }),
    }
}

fn ensure_number_free(pool: &[Question], number: u32) -> QuizResult<()> {
    if number == 0 {
        return Err(QuizError::validation("question number must be positive"));
    }
    if pool.iter().any(|q| q.number == number) {
        return Err(duplicate_number(number));
    }
    Ok(())
}

fn insert_sorted(pool: &mut Vec<Question>, question: Question) {
    let index = pool.partition_point(|q| q.number < question.number);
    pool.insert(index, question);
}

/// Validates a draft and inserts it, returning the id of the new question.
pub fn add_question(quiz: &mut Quiz, draft: QuestionDraft) -> QuizResult<Uuid> {
    validate_payload(&draft.payload)?;

    let number = match draft.number {
        Some(number) => {
            ensure_number_free(&quiz.question_pool, number)?;
            number
        }
        None => next_number(&quiz.question_pool)?,
    };

    let question = Question {
        id: Uuid::new_v4(),
        number,
        hint: draft.hint,
        ai_generated: draft.ai_generated,
        statistics: Vec::new(),
        payload: draft.payload,
    };
    let id = question.id;
    insert_sorted(&mut quiz.question_pool, question);
    Ok(id)
}

/// Adds a batch of generated drafts. Drafts failing validation are logged and
/// skipped; the ids of the admitted ones are returned.
pub fn add_generated_questions(quiz: &mut Quiz, drafts: Vec<QuestionDraft>) -> Vec<Uuid> {
    let mut added = Vec::with_capacity(drafts.len());
    for draft in drafts {
        let kind = draft.payload.kind();
        match add_question(quiz, draft) {
            Ok(id) => added.push(id),
            Err(e) => {
                tracing::warn!(
                    quiz_id = %quiz.id,
                    question_type = kind.as_str(),
                    error = %e,
                    "Dropping generated question that failed validation"
                );
            }
        }
    }
    added
}

/// Replaces the payload of an existing question.
///
/// Identity, statistics and the generated flag are kept. Without a new
/// number the question keeps its current one and no uniqueness check runs.
pub fn update_question(
    quiz: &mut Quiz,
    question_id: Uuid,
    number: Option<u32>,
    hint: Option<String>,
    payload: QuestionPayload,
) -> QuizResult<()> {
    let index = quiz
        .question_pool
        .iter()
        .position(|q| q.id == question_id)
        .ok_or_else(|| question_id_not_found(quiz.id, question_id))?;

    validate_payload(&payload)?;

    let current = quiz.question_pool[index].number;
    let renumber = match number {
        Some(requested) if requested != current => {
            ensure_number_free(&quiz.question_pool, requested)?;
            Some(requested)
        }
        _ => None,
    };

    let question = &mut quiz.question_pool[index];
    question.hint = hint;
    question.payload = payload;

    if let Some(requested) = renumber {
        let mut moved = quiz.question_pool.remove(index);
        moved.number = requested;
        insert_sorted(&mut quiz.question_pool, moved);
    }
    Ok(())
}

/// Removes the question with `number` and closes the gap it leaves.
pub fn remove_question(quiz: &mut Quiz, number: u32) -> QuizResult<Question> {
    let quiz_id = quiz.id;
    remove_and_renumber(&mut quiz.question_pool, number)
        .ok_or_else(|| question_not_found(quiz_id, number))
}

/// Removes the question numbered `number` from an ordered pool and
/// decrements every higher number by one. Returns `None` when no question
/// carries that number, leaving the pool as it was.
pub fn remove_and_renumber(pool: &mut Vec<Question>, number: u32) -> Option<Question> {
    let index = pool.iter().position(|q| q.number == number)?;
    let removed = pool.remove(index);
    for question in pool.iter_mut().filter(|q| q.number > number) {
        question.number -= 1;
    }
    Some(removed)
}

/// Swaps the numbers and pool positions of two questions.
pub fn switch_questions(quiz: &mut Quiz, first: u32, second: u32) -> QuizResult<()> {
    let first_index = quiz
        .question_pool
        .iter()
        .position(|q| q.number == first)
        .ok_or_else(|| question_not_found(quiz.id, first))?;
    let second_index = quiz
        .question_pool
        .iter()
        .position(|q| q.number == second)
        .ok_or_else(|| question_not_found(quiz.id, second))?;

    if first_index == second_index {
        return Ok(());
    }

    quiz.question_pool[first_index].number = second;
    quiz.question_pool[second_index].number = first;
    quiz.question_pool.swap(first_index, second_index);
    Ok(())
}

pub fn set_required_correct_answers(quiz: &mut Quiz, required: u32) {
    quiz.required_correct_answers = required;
}

pub fn set_pooling_mode(quiz: &mut Quiz, mode: PoolingMode) {
    quiz.pooling_mode = mode;
}

/// Stored as given; a size larger than the pool is clamped at selection.
pub fn set_random_sample_size(quiz: &mut Quiz, size: Option<u32>) {
    quiz.random_sample_size = size;
}
