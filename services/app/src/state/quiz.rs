//! services/app/src/state/quiz.rs
//!
//! Quiz state machine: intro → loading → active → results.
//!
//! Answers accumulate client-side only, keyed by question index; advancing
//! past an unanswered question is blocked; passing the last question scores
//! the run by exact match against each question's declared correct index.

use std::collections::BTreeMap;

use doclens_core::domain::{quiz_score, score_percentage, QuizQuestion};
use doclens_core::ports::PortResult;

pub const QUIZ_EMPTY_MESSAGE: &str = "No questions could be generated. Please try again.";
pub const QUIZ_FAILURE_MESSAGE: &str = "Could not generate the quiz. Check your connection.";

#[derive(Debug)]
pub enum QuizPhase {
    Intro {
        /// Inline error from a failed or empty generation; not a toast.
        error: Option<String>,
    },
    Loading,
    Active {
        questions: Vec<QuizQuestion>,
        current: usize,
        answers: BTreeMap<usize, usize>,
    },
    Results {
        questions: Vec<QuizQuestion>,
        answers: BTreeMap<usize, usize>,
        score: usize,
    },
}

pub struct QuizState {
    phase: QuizPhase,
}

impl QuizState {
    pub fn new() -> Self {
        Self {
            phase: QuizPhase::Intro { error: None },
        }
    }

    pub fn phase(&self) -> &QuizPhase {
        &self.phase
    }

    /// Starts question generation from the intro screen.
    pub fn begin(&mut self) -> bool {
        if !matches!(self.phase, QuizPhase::Intro { .. }) {
            return false;
        }
        self.phase = QuizPhase::Loading;
        true
    }

    /// Applies the generation result. An empty or failed result returns to
    /// the intro with an inline error.
    pub fn finish(&mut self, result: PortResult<Vec<QuizQuestion>>) {
        if !matches!(self.phase, QuizPhase::Loading) {
            return;
        }
        self.phase = match result {
            Ok(questions) if !questions.is_empty() => QuizPhase::Active {
                questions,
                current: 0,
                answers: BTreeMap::new(),
            },
            Ok(_) => QuizPhase::Intro {
                error: Some(QUIZ_EMPTY_MESSAGE.to_string()),
            },
            Err(_) => QuizPhase::Intro {
                error: Some(QUIZ_FAILURE_MESSAGE.to_string()),
            },
        };
    }

    /// Records the selected option for the current question.
    pub fn select_answer(&mut self, option: usize) {
        if let QuizPhase::Active {
            questions,
            current,
            answers,
        } = &mut self.phase
        {
            if let Some(question) = questions.get(*current) {
                if option < question.options.len() {
                    answers.insert(*current, option);
                }
            }
        }
    }

    /// Moves to the next question, or to results after the last one.
    /// Blocked (returns false) until the current question has an answer.
    pub fn advance(&mut self) -> bool {
        let QuizPhase::Active {
            questions,
            current,
            answers,
        } = &mut self.phase
        else {
            return false;
        };
        if !answers.contains_key(current) {
            return false;
        }
        if *current + 1 < questions.len() {
            *current += 1;
            return true;
        }

        let questions = std::mem::take(questions);
        let answers = std::mem::take(answers);
        let score = quiz_score(&questions, &answers);
        self.phase = QuizPhase::Results {
            questions,
            answers,
            score,
        };
        true
    }

    /// Discards all quiz state; a fresh start generates new questions.
    pub fn reset(&mut self) {
        self.phase = QuizPhase::Intro { error: None };
    }

    pub fn percentage(&self) -> Option<u32> {
        match &self.phase {
            QuizPhase::Results {
                questions, score, ..
            } => Some(score_percentage(*score, questions.len())),
            _ => None,
        }
    }
}

impl Default for QuizState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doclens_core::ports::PortError;
    use rstest::rstest;

    fn questions(correct: &[usize]) -> Vec<QuizQuestion> {
        correct
            .iter()
            .map(|&answer| QuizQuestion {
                question: format!("q{answer}"),
                options: vec!["a".into(), "b".into(), "c".into()],
                correct_answer: answer,
                explanation: "because".into(),
            })
            .collect()
    }

    #[test]
    fn empty_generation_returns_to_intro_with_inline_error() {
        let mut quiz = QuizState::new();
        assert!(quiz.begin());
        quiz.finish(Ok(Vec::new()));
        assert!(
            matches!(quiz.phase(), QuizPhase::Intro { error: Some(e) } if e == QUIZ_EMPTY_MESSAGE)
        );
    }

    #[test]
    fn failed_generation_returns_to_intro_with_inline_error() {
        let mut quiz = QuizState::new();
        quiz.begin();
        quiz.finish(Err(PortError::Unexpected("boom".into())));
        assert!(matches!(quiz.phase(), QuizPhase::Intro { error: Some(_) }));
    }

    #[test]
    fn advancing_is_blocked_until_answered() {
        let mut quiz = QuizState::new();
        quiz.begin();
        quiz.finish(Ok(questions(&[0, 1])));

        assert!(!quiz.advance());
        quiz.select_answer(2);
        assert!(quiz.advance());
        assert!(matches!(
            quiz.phase(),
            QuizPhase::Active { current: 1, .. }
        ));
    }

    #[test]
    fn scoring_matches_the_declared_correct_indices() {
        let mut quiz = QuizState::new();
        quiz.begin();
        quiz.finish(Ok(questions(&[0, 1, 2])));

        // Answers: {0: 0, 1: 2, 2: 2} → questions 0 and 2 correct.
        quiz.select_answer(0);
        assert!(quiz.advance());
        quiz.select_answer(2);
        assert!(quiz.advance());
        quiz.select_answer(2);
        assert!(quiz.advance());

        match quiz.phase() {
            QuizPhase::Results { score, .. } => assert_eq!(*score, 2),
            other => panic!("expected results, got {other:?}"),
        }
        assert_eq!(quiz.percentage(), Some(67));
    }

    #[rstest]
    #[case(&[0], &[0], 100)]
    #[case(&[0, 1], &[1, 0], 0)]
    #[case(&[0, 1, 2, 0], &[0, 1, 2, 0], 100)]
    fn percentage_is_rounded(
        #[case] correct: &[usize],
        #[case] picks: &[usize],
        #[case] expected: u32,
    ) {
        let mut quiz = QuizState::new();
        quiz.begin();
        quiz.finish(Ok(questions(correct)));
        for &pick in picks {
            quiz.select_answer(pick);
            assert!(quiz.advance());
        }
        assert_eq!(quiz.percentage(), Some(expected));
    }

    #[test]
    fn reset_discards_everything() {
        let mut quiz = QuizState::new();
        quiz.begin();
        quiz.finish(Ok(questions(&[0])));
        quiz.select_answer(0);
        quiz.advance();

        quiz.reset();
        assert!(matches!(quiz.phase(), QuizPhase::Intro { error: None }));
        // A fresh generation is allowed again.
        assert!(quiz.begin());
    }

    #[test]
    fn out_of_range_answers_are_ignored() {
        let mut quiz = QuizState::new();
        quiz.begin();
        quiz.finish(Ok(questions(&[0])));
        quiz.select_answer(9);
        assert!(!quiz.advance());
    }
}
