//! Read-time selection of the questions a quiz session shows.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::models::{PoolingMode, Question, QuestionPayload, QuestionView, Quiz, QuizView};

/// Number of questions a session of this quiz receives.
pub fn selection_limit(quiz: &Quiz) -> usize {
    let pool_size = quiz.question_pool.len();
    match quiz.pooling_mode {
        PoolingMode::Ordered => pool_size,
        PoolingMode::Random => quiz
            .random_sample_size
            .map_or(pool_size, |size| pool_size.min(size as usize)),
    }
}

/// Picks the session questions. Ordered quizzes return the pool as stored;
/// random quizzes draw a fresh permutation on every call.
pub fn select_questions<'a, R>(quiz: &'a Quiz, rng: &mut R) -> Vec<&'a Question>
where
    R: Rng + ?Sized,
{
    let mut selected: Vec<&Question> = quiz.question_pool.iter().collect();
    if quiz.pooling_mode == PoolingMode::Random {
        selected.shuffle(rng);
        selected.truncate(selection_limit(quiz));
    }
    selected
}

/// Builds the caller-facing form of a question, shuffling the display lists
/// of cloze and association questions.
pub fn render_question<R>(question: &Question, rng: &mut R) -> QuestionView
where
    R: Rng + ?Sized,
{
    let mut view = QuestionView {
        id: question.id,
        number: question.number,
        hint: question.hint.clone(),
        ai_generated: question.ai_generated,
        payload: question.payload.clone(),
        all_blanks: None,
        left_side: None,
        right_side: None,
    };

    match &question.payload {
        QuestionPayload::Cloze(cloze) => {
            let mut blanks: Vec<String> = cloze.additional_wrong_answers.clone();
            blanks.extend(cloze.blank_answers().map(str::to_string));
            blanks.shuffle(rng);
            view.all_blanks = Some(blanks);
        }
        QuestionPayload::Association(association) => {
            let mut left: Vec<String> = association
                .correct_associations
                .iter()
                .map(|a| a.left.clone())
                .collect();
            let mut right: Vec<String> = association
                .correct_associations
                .iter()
                .map(|a| a.right.clone())
                .collect();
            left.shuffle(rng);
            right.shuffle(rng);
            view.left_side = Some(left);
            view.right_side = Some(right);
        }
        QuestionPayload::MultipleChoice(_)
        | QuestionPayload::ExactAnswer(_)
        | QuestionPayload::Numeric(_)
        | QuestionPayload::SelfAssessment(_) => {}
    }

    view
}

pub fn select_views<R>(quiz: &Quiz, rng: &mut R) -> Vec<QuestionView>
where
    R: Rng + ?Sized,
{
    let selected = select_questions(quiz, rng);
    selected
        .into_iter()
        .map(|question| render_question(question, rng))
        .collect()
}

/// Full view of a quiz with a freshly drawn session selection.
pub fn build_quiz_view_with<R>(quiz: &Quiz, rng: &mut R) -> QuizView
where
    R: Rng + ?Sized,
{
    let question_pool = quiz
        .question_pool
        .iter()
        .map(|question| render_question(question, rng))
        .collect();
    let selected_questions = select_views(quiz, rng);

    QuizView {
        id: quiz.id,
        course_id: quiz.course_id,
        question_pool,
        required_correct_answers: quiz.required_correct_answers,
        pooling_mode: quiz.pooling_mode,
        random_sample_size: quiz.random_sample_size,
        selected_questions,
    }
}

pub fn build_quiz_view(quiz: &Quiz) -> QuizView {
    build_quiz_view_with(quiz, &mut rand::rng())
}
