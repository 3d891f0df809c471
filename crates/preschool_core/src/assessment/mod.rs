//! Child-development screening instruments.
//!
//! Four instruments share one model: a fixed, ordered question set, an answer
//! vocabulary given by the instrument's [`Scale`], a scorer that maps a complete
//! answer map to a [`RiskTier`], and fixed guidance text per (instrument, tier).

mod guidance;
mod instruments;
mod scoring;
mod session;

pub use guidance::{guidance, Guidance};
pub use scoring::score;
pub use session::{AssessmentSession, SessionPhase};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instrument {
    /// Autism screening, yes/no answers.
    Mchat,
    MotorSkills,
    SpeechLanguage,
    SocialSkills,
}

impl Instrument {
    pub const ALL: [Instrument; 4] = [
        Instrument::Mchat,
        Instrument::MotorSkills,
        Instrument::SpeechLanguage,
        Instrument::SocialSkills,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Instrument::Mchat => "mchat",
            Instrument::MotorSkills => "motor_skills",
            Instrument::SpeechLanguage => "speech_language",
            Instrument::SocialSkills => "social_skills",
        }
    }

    pub fn scale(self) -> Scale {
        match self {
            Instrument::Mchat => Scale::YesNo,
            Instrument::MotorSkills | Instrument::SpeechLanguage => Scale::Quality,
            Instrument::SocialSkills => Scale::Frequency,
        }
    }

    pub fn question_set(self) -> QuestionSet {
        QuestionSet {
            instrument: self,
            scale: self.scale(),
            questions: instruments::questions(self),
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Instrument {
    type Err = AssessmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Instrument::ALL
            .into_iter()
            .find(|i| i.as_str() == s)
            .ok_or_else(|| AssessmentError::UnknownInstrument(s.to_string()))
    }
}

/// Answer vocabulary of an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scale {
    YesNo,
    /// excellent (4) .. poor (1)
    Quality,
    /// always (5) .. never (1)
    Frequency,
}

impl Scale {
    pub fn vocabulary(self) -> &'static [Answer] {
        match self {
            Scale::YesNo => &[Answer::Yes, Answer::No],
            Scale::Quality => &[Answer::Excellent, Answer::Good, Answer::Fair, Answer::Poor],
            Scale::Frequency => &[
                Answer::Always,
                Answer::Often,
                Answer::Sometimes,
                Answer::Rarely,
                Answer::Never,
            ],
        }
    }

    pub fn accepts(self, answer: Answer) -> bool {
        self.vocabulary().contains(&answer)
    }

    pub fn max_weight(self) -> u32 {
        match self {
            Scale::YesNo => 1,
            Scale::Quality => 4,
            Scale::Frequency => 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    Excellent,
    Good,
    Fair,
    Poor,
    Always,
    Often,
    Sometimes,
    Rarely,
    Never,
}

impl Answer {
    /// Weight on the graded scales; `None` for yes/no answers.
    pub fn weight(self) -> Option<u32> {
        match self {
            Answer::Yes | Answer::No => None,
            Answer::Excellent => Some(4),
            Answer::Good => Some(3),
            Answer::Fair => Some(2),
            Answer::Poor => Some(1),
            Answer::Always => Some(5),
            Answer::Often => Some(4),
            Answer::Sometimes => Some(3),
            Answer::Rarely => Some(2),
            Answer::Never => Some(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Question {
    pub id: u16,
    pub text: &'static str,
    /// Only meaningful on the yes/no instrument.
    pub critical: bool,
}

impl Question {
    pub const fn new(id: u16, text: &'static str) -> Self {
        Self {
            id,
            text,
            critical: false,
        }
    }

    pub const fn critical(id: u16, text: &'static str) -> Self {
        Self {
            id,
            text,
            critical: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuestionSet {
    pub instrument: Instrument,
    pub scale: Scale,
    pub questions: &'static [Question],
}

impl QuestionSet {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'static Question> {
        self.questions.get(index)
    }
}

/// Answers keyed by question id.
pub type AnswerSet = BTreeMap<u16, Answer>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssessmentResult {
    pub instrument: Instrument,
    /// Count of concerning answers (yes/no) or the weighted sum (graded scales).
    pub score: u32,
    pub max_score: u32,
    /// Graded scales only.
    pub percentage: Option<u32>,
    /// Yes/no instrument only: concerning answers on critical questions.
    pub critical_concerns: Option<u32>,
    pub risk: RiskTier,
    pub recommendations: &'static [&'static str],
    pub next_steps: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssessmentError {
    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),
    #[error("the question set for {0} is empty")]
    EmptyQuestionSet(Instrument),
    #[error("'{answer:?}' is not a valid answer on the {scale:?} scale")]
    InvalidAnswer { answer: Answer, scale: Scale },
    #[error("question {0} is not part of this instrument")]
    UnknownQuestion(u16),
    #[error("unanswered questions: {0:?}")]
    Incomplete(Vec<u16>),
    #[error("the assessment is not in progress")]
    NotInProgress,
}
