//! The question-by-question flow shared by every instrument.
//!
//! `idle -> in_progress(0) -> .. -> in_progress(last) -> completed`. An answer
//! is stored under the current question's id and then either advances the
//! index or completes the session. There is no way back to a previous
//! question; `reset` is the only exit from `completed`.

use super::{score, Answer, AnswerSet, AssessmentError, AssessmentResult, Question, QuestionSet};
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    InProgress { question_index: usize },
    Completed { result: AssessmentResult },
}

#[derive(Debug, Clone)]
pub struct AssessmentSession {
    set: QuestionSet,
    phase: SessionPhase,
    answers: AnswerSet,
}

impl AssessmentSession {
    pub fn new(set: QuestionSet) -> Self {
        Self {
            set,
            phase: SessionPhase::Idle,
            answers: AnswerSet::new(),
        }
    }

    pub fn question_set(&self) -> &QuestionSet {
        &self.set
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    /// Moves from `idle` to the first question. Returns false (and changes
    /// nothing) when the question set is empty or the session already started.
    pub fn start(&mut self) -> bool {
        if self.set.is_empty() {
            warn!(instrument = %self.set.instrument, "no questions loaded; assessment not started");
            return false;
        }
        if self.phase != SessionPhase::Idle {
            return false;
        }
        self.phase = SessionPhase::InProgress { question_index: 0 };
        true
    }

    pub fn current_question(&self) -> Option<&'static Question> {
        match self.phase {
            SessionPhase::InProgress { question_index } => self.set.get(question_index),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&AssessmentResult> {
        match &self.phase {
            SessionPhase::Completed { result } => Some(result),
            _ => None,
        }
    }

    pub fn answer(&mut self, answer: Answer) -> Result<&SessionPhase, AssessmentError> {
        let SessionPhase::InProgress { question_index } = self.phase else {
            return Err(AssessmentError::NotInProgress);
        };
        if !self.set.scale.accepts(answer) {
            return Err(AssessmentError::InvalidAnswer {
                answer,
                scale: self.set.scale,
            });
        }
        let question = self
            .set
            .get(question_index)
            .ok_or(AssessmentError::NotInProgress)?;
        self.answers.insert(question.id, answer);

        if question_index + 1 < self.set.len() {
            self.phase = SessionPhase::InProgress {
                question_index: question_index + 1,
            };
        } else {
            let result = score(&self.set, &self.answers)?;
            self.phase = SessionPhase::Completed { result };
        }
        Ok(&self.phase)
    }

    pub fn reset(&mut self) {
        self.answers.clear();
        self.phase = SessionPhase::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{Instrument, RiskTier, Scale};

    static EMPTY: [Question; 0] = [];

    #[test]
    fn walks_through_every_question_then_completes() {
        let mut session = AssessmentSession::new(Instrument::SpeechLanguage.question_set());
        assert_eq!(session.phase(), &SessionPhase::Idle);
        assert!(session.current_question().is_none());
        assert!(session.start());

        let total = session.question_set().len();
        for i in 0..total {
            assert_eq!(session.phase(), &SessionPhase::InProgress { question_index: i });
            assert_eq!(session.current_question().map(|q| q.id), Some(i as u16 + 1));
            session.answer(Answer::Excellent).unwrap();
        }

        let result = session.result().expect("completed");
        assert_eq!(result.percentage, Some(100));
        assert_eq!(result.risk, RiskTier::Low);
        assert_eq!(session.answers().len(), total);
    }

    #[test]
    fn completed_is_terminal_until_reset() {
        let mut session = AssessmentSession::new(Instrument::Mchat.question_set());
        session.start();
        for _ in 0..session.question_set().len() {
            session.answer(Answer::Yes).unwrap();
        }
        assert!(session.result().is_some());
        assert_eq!(session.answer(Answer::No), Err(AssessmentError::NotInProgress));
        assert!(!session.start());

        session.reset();
        assert_eq!(session.phase(), &SessionPhase::Idle);
        assert!(session.answers().is_empty());
        assert!(session.start());
    }

    #[test]
    fn answers_before_start_or_off_scale_are_rejected() {
        let mut session = AssessmentSession::new(Instrument::SocialSkills.question_set());
        assert_eq!(session.answer(Answer::Always), Err(AssessmentError::NotInProgress));
        session.start();
        assert!(matches!(
            session.answer(Answer::Yes),
            Err(AssessmentError::InvalidAnswer {
                scale: Scale::Frequency,
                ..
            })
        ));
        assert_eq!(session.phase(), &SessionPhase::InProgress { question_index: 0 });
    }

    #[test]
    fn empty_question_set_never_starts() {
        let mut session = AssessmentSession::new(QuestionSet {
            instrument: Instrument::MotorSkills,
            scale: Scale::Quality,
            questions: &EMPTY,
        });
        assert!(!session.start());
        assert_eq!(session.phase(), &SessionPhase::Idle);
    }
}
