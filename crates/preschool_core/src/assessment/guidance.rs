//! Fixed recommendation and next-step text per (instrument, tier).

use super::{Instrument, RiskTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Guidance {
    pub recommendations: &'static [&'static str],
    pub next_steps: &'static [&'static str],
}

struct Entry {
    instrument: Instrument,
    tier: RiskTier,
    guidance: Guidance,
}

const fn entry(
    instrument: Instrument,
    tier: RiskTier,
    recommendations: &'static [&'static str],
    next_steps: &'static [&'static str],
) -> Entry {
    Entry {
        instrument,
        tier,
        guidance: Guidance {
            recommendations,
            next_steps,
        },
    }
}

static TABLE: [Entry; 12] = [
    entry(
        Instrument::Mchat,
        RiskTier::Low,
        &[
            "Your child's responses do not indicate a current concern.",
            "Keep encouraging shared play, pointing games and conversation.",
        ],
        &[
            "Repeat the screening at the next routine check-up.",
            "Talk to your paediatrician if new concerns appear.",
        ],
    ),
    entry(
        Instrument::Mchat,
        RiskTier::Medium,
        &[
            "Some responses suggest your child may benefit from a closer look.",
            "Note examples of pointing, eye contact and response to name over the next weeks.",
        ],
        &[
            "Discuss the results with your paediatrician within a month.",
            "Ask about a structured follow-up interview for the flagged items.",
        ],
    ),
    entry(
        Instrument::Mchat,
        RiskTier::High,
        &[
            "Responses indicate an increased likelihood of a developmental concern.",
            "Early evaluation leads to the best support; do not wait and see.",
        ],
        &[
            "Book a developmental evaluation with a specialist as soon as possible.",
            "Share this screening result with your paediatrician and the class teacher.",
            "Ask about early intervention services available in your area.",
        ],
    ),
    entry(
        Instrument::MotorSkills,
        RiskTier::Low,
        &[
            "Motor skills are developing well for this age.",
            "Keep offering active outdoor play and hands-on crafts.",
        ],
        &["Re-check in six months to follow progress."],
    ),
    entry(
        Instrument::MotorSkills,
        RiskTier::Medium,
        &[
            "Some motor skills need extra practice.",
            "Add daily play with balls, climbing, drawing and threading beads.",
        ],
        &[
            "Share the weaker areas with the class teacher.",
            "Re-check in three months.",
        ],
    ),
    entry(
        Instrument::MotorSkills,
        RiskTier::High,
        &[
            "Several motor skills are below what is expected for this age.",
            "Structured support can make a significant difference at this stage.",
        ],
        &[
            "Consult a paediatrician about an occupational or physical therapy assessment.",
            "Agree a home practice plan with the class teacher.",
        ],
    ),
    entry(
        Instrument::SpeechLanguage,
        RiskTier::Low,
        &[
            "Speech and language are developing well.",
            "Keep reading together daily and talking about everyday activities.",
        ],
        &["Re-check in six months to follow progress."],
    ),
    entry(
        Instrument::SpeechLanguage,
        RiskTier::Medium,
        &[
            "Some speech and language skills need encouragement.",
            "Model short sentences, expand on what your child says and give time to answer.",
        ],
        &[
            "Mention the results at the next parent-teacher meeting.",
            "Re-check in three months.",
        ],
    ),
    entry(
        Instrument::SpeechLanguage,
        RiskTier::High,
        &[
            "Several speech and language skills are below what is expected for this age.",
            "A hearing check rules out one common cause early.",
        ],
        &[
            "Arrange an assessment with a speech and language therapist.",
            "Ask your paediatrician for a hearing test.",
        ],
    ),
    entry(
        Instrument::SocialSkills,
        RiskTier::Low,
        &[
            "Social skills are developing well.",
            "Keep arranging play dates and group activities.",
        ],
        &["Re-check in six months to follow progress."],
    ),
    entry(
        Instrument::SocialSkills,
        RiskTier::Medium,
        &[
            "Some social skills need practice.",
            "Practise turn-taking games and naming feelings together.",
        ],
        &[
            "Ask the class teacher about small-group activities.",
            "Re-check in three months.",
        ],
    ),
    entry(
        Instrument::SocialSkills,
        RiskTier::High,
        &[
            "Several social skills are below what is expected for this age.",
            "Consistent routines and guided play help children build confidence.",
        ],
        &[
            "Discuss the results with your paediatrician or a child psychologist.",
            "Plan classroom support together with the class teacher.",
        ],
    ),
];

static EMPTY: Guidance = Guidance {
    recommendations: &[],
    next_steps: &[],
};

pub fn guidance(instrument: Instrument, tier: RiskTier) -> &'static Guidance {
    TABLE
        .iter()
        .find(|e| e.instrument == instrument && e.tier == tier)
        .map(|e| &e.guidance)
        .unwrap_or(&EMPTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_instrument_and_tier_has_guidance() {
        for instrument in Instrument::ALL {
            for tier in [RiskTier::Low, RiskTier::Medium, RiskTier::High] {
                let g = guidance(instrument, tier);
                assert!(!g.recommendations.is_empty(), "{instrument} {tier:?}");
                assert!(!g.next_steps.is_empty(), "{instrument} {tier:?}");
            }
        }
    }
}
