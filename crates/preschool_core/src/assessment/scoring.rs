use super::{
    guidance, Answer, AnswerSet, AssessmentError, AssessmentResult, QuestionSet, RiskTier, Scale,
};

/// Yes/no instrument: this many critical "no" answers mean high risk.
pub const CRITICAL_HIGH_RISK: u32 = 2;
/// Yes/no instrument: total "no" answers for high risk.
pub const TOTAL_HIGH_RISK: u32 = 8;
/// Yes/no instrument: total "no" answers for medium risk.
pub const TOTAL_MEDIUM_RISK: u32 = 3;
/// Graded instruments: percentage at or above which risk is low.
pub const PERCENT_LOW_RISK: u32 = 80;
/// Graded instruments: percentage at or above which risk is medium.
pub const PERCENT_MEDIUM_RISK: u32 = 60;

/// Scores a complete answer set. Every question must be answered, with an
/// answer from the instrument's vocabulary, and no foreign question ids.
pub fn score(set: &QuestionSet, answers: &AnswerSet) -> Result<AssessmentResult, AssessmentError> {
    if set.is_empty() {
        return Err(AssessmentError::EmptyQuestionSet(set.instrument));
    }
    if let Some(id) = answers
        .keys()
        .find(|id| !set.questions.iter().any(|q| q.id == **id))
    {
        return Err(AssessmentError::UnknownQuestion(*id));
    }
    let missing: Vec<u16> = set
        .questions
        .iter()
        .filter(|q| !answers.contains_key(&q.id))
        .map(|q| q.id)
        .collect();
    if !missing.is_empty() {
        return Err(AssessmentError::Incomplete(missing));
    }
    if let Some(answer) = answers.values().find(|a| !set.scale.accepts(**a)) {
        return Err(AssessmentError::InvalidAnswer {
            answer: *answer,
            scale: set.scale,
        });
    }

    let scored = match set.scale {
        Scale::YesNo => score_binary(set, answers),
        Scale::Quality | Scale::Frequency => score_graded(set, answers),
    };
    let text = guidance(set.instrument, scored.risk);
    Ok(AssessmentResult {
        instrument: set.instrument,
        score: scored.score,
        max_score: scored.max_score,
        percentage: scored.percentage,
        critical_concerns: scored.critical_concerns,
        risk: scored.risk,
        recommendations: text.recommendations,
        next_steps: text.next_steps,
    })
}

struct Scored {
    score: u32,
    max_score: u32,
    percentage: Option<u32>,
    critical_concerns: Option<u32>,
    risk: RiskTier,
}

fn score_binary(set: &QuestionSet, answers: &AnswerSet) -> Scored {
    let mut concerns = 0;
    let mut critical = 0;
    for q in set.questions {
        if answers.get(&q.id) == Some(&Answer::No) {
            concerns += 1;
            if q.critical {
                critical += 1;
            }
        }
    }
    Scored {
        score: concerns,
        max_score: set.len() as u32,
        percentage: None,
        critical_concerns: Some(critical),
        risk: binary_risk(concerns, critical),
    }
}

pub fn binary_risk(concerns: u32, critical_concerns: u32) -> RiskTier {
    if critical_concerns >= CRITICAL_HIGH_RISK || concerns >= TOTAL_HIGH_RISK {
        RiskTier::High
    } else if concerns >= TOTAL_MEDIUM_RISK {
        RiskTier::Medium
    } else {
        RiskTier::Low
    }
}

fn score_graded(set: &QuestionSet, answers: &AnswerSet) -> Scored {
    let sum: u32 = set
        .questions
        .iter()
        .filter_map(|q| answers.get(&q.id).and_then(|a| a.weight()))
        .sum();
    let max_score = set.len() as u32 * set.scale.max_weight();
    let percentage = (f64::from(sum) * 100.0 / f64::from(max_score)).round() as u32;
    Scored {
        score: sum,
        max_score,
        percentage: Some(percentage),
        critical_concerns: None,
        risk: graded_risk(percentage),
    }
}

pub fn graded_risk(percentage: u32) -> RiskTier {
    if percentage >= PERCENT_LOW_RISK {
        RiskTier::Low
    } else if percentage >= PERCENT_MEDIUM_RISK {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{Instrument, Question};

    static TEN_WITH_TWO_CRITICAL: [Question; 10] = [
        Question::critical(1, "q1"),
        Question::critical(2, "q2"),
        Question::new(3, "q3"),
        Question::new(4, "q4"),
        Question::new(5, "q5"),
        Question::new(6, "q6"),
        Question::new(7, "q7"),
        Question::new(8, "q8"),
        Question::new(9, "q9"),
        Question::new(10, "q10"),
    ];

    static FIVE: [Question; 5] = [
        Question::new(1, "q1"),
        Question::new(2, "q2"),
        Question::new(3, "q3"),
        Question::new(4, "q4"),
        Question::new(5, "q5"),
    ];

    fn binary_set() -> QuestionSet {
        QuestionSet {
            instrument: Instrument::Mchat,
            scale: Scale::YesNo,
            questions: &TEN_WITH_TWO_CRITICAL,
        }
    }

    fn answers_with_no(set: &QuestionSet, no: &[u16]) -> AnswerSet {
        set.questions
            .iter()
            .map(|q| (q.id, if no.contains(&q.id) { Answer::No } else { Answer::Yes }))
            .collect()
    }

    fn all(set: &QuestionSet, answer: Answer) -> AnswerSet {
        set.questions.iter().map(|q| (q.id, answer)).collect()
    }

    #[test]
    fn two_critical_concerns_dominate_a_medium_score() {
        let set = binary_set();
        let result = score(&set, &answers_with_no(&set, &[1, 2, 7])).unwrap();
        assert_eq!(result.score, 3);
        assert_eq!(result.critical_concerns, Some(2));
        assert_eq!(result.risk, RiskTier::High);
        assert_eq!(result.recommendations, guidance(Instrument::Mchat, RiskTier::High).recommendations);
    }

    #[test]
    fn binary_tiers_follow_total_counts() {
        let set = binary_set();
        assert_eq!(score(&set, &answers_with_no(&set, &[3, 4])).unwrap().risk, RiskTier::Low);
        assert_eq!(score(&set, &answers_with_no(&set, &[1, 3, 4])).unwrap().risk, RiskTier::Medium);
        assert_eq!(
            score(&set, &answers_with_no(&set, &[1, 3, 4, 5, 6, 7, 8, 9])).unwrap().risk,
            RiskTier::High
        );
    }

    #[test]
    fn rescoring_the_same_answers_is_stable() {
        let set = binary_set();
        let answers = answers_with_no(&set, &[2, 5, 9]);
        let first = score(&set, &answers).unwrap();
        let reordered: AnswerSet = answers.iter().rev().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(score(&set, &reordered).unwrap(), first);
        assert_eq!(score(&set, &answers).unwrap(), first);
    }

    #[test]
    fn all_always_on_a_five_point_scale_is_full_marks() {
        let set = QuestionSet {
            instrument: Instrument::SocialSkills,
            scale: Scale::Frequency,
            questions: &FIVE,
        };
        let result = score(&set, &all(&set, Answer::Always)).unwrap();
        assert_eq!(result.percentage, Some(100));
        assert_eq!(result.score, 25);
        assert_eq!(result.risk, RiskTier::Low);
    }

    #[test]
    fn graded_percentages_round_and_bucket() {
        let set = Instrument::MotorSkills.question_set();
        // 10 questions x 4 = 40; all "fair" = 20 -> 50%
        let result = score(&set, &all(&set, Answer::Fair)).unwrap();
        assert_eq!(result.percentage, Some(50));
        assert_eq!(result.risk, RiskTier::High);

        let mut answers = all(&set, Answer::Good);
        answers.insert(1, Answer::Excellent);
        // 31 / 40 = 77.5 -> 78
        let result = score(&set, &answers).unwrap();
        assert_eq!(result.percentage, Some(78));
        assert_eq!(result.risk, RiskTier::Medium);

        assert_eq!(graded_risk(80), RiskTier::Low);
        assert_eq!(graded_risk(60), RiskTier::Medium);
        assert_eq!(graded_risk(59), RiskTier::High);
    }

    #[test]
    fn incomplete_or_foreign_answers_are_rejected() {
        let set = binary_set();
        let mut answers = answers_with_no(&set, &[]);
        answers.remove(&4);
        assert_eq!(score(&set, &answers), Err(AssessmentError::Incomplete(vec![4])));

        let mut answers = answers_with_no(&set, &[]);
        answers.insert(99, Answer::Yes);
        assert_eq!(score(&set, &answers), Err(AssessmentError::UnknownQuestion(99)));

        let mut answers = answers_with_no(&set, &[]);
        answers.insert(1, Answer::Often);
        assert!(matches!(score(&set, &answers), Err(AssessmentError::InvalidAnswer { .. })));
    }
}
