//! Fixed question sets. Every yes/no question is phrased so that "no" is the
//! answer that signals a concern.

use super::{Instrument, Question};

pub(super) fn questions(instrument: Instrument) -> &'static [Question] {
    match instrument {
        Instrument::Mchat => MCHAT,
        Instrument::MotorSkills => MOTOR_SKILLS,
        Instrument::SpeechLanguage => SPEECH_LANGUAGE,
        Instrument::SocialSkills => SOCIAL_SKILLS,
    }
}

static MCHAT: &[Question] = &[
    Question::new(1, "If you point at something across the room, does your child look at it?"),
    Question::new(2, "Does your child respond to sounds around them, such as a door closing or a voice calling?"),
    Question::new(3, "Does your child play pretend or make-believe?"),
    Question::new(4, "Does your child like climbing on things?"),
    Question::new(5, "Does your child keep their hands and fingers away from their eyes when playing?"),
    Question::critical(6, "Does your child point with one finger to ask for something or to get help?"),
    Question::critical(7, "Does your child point with one finger to show you something interesting?"),
    Question::critical(8, "Is your child interested in other children?"),
    Question::critical(9, "Does your child show you things by bringing them to you or holding them up?"),
    Question::critical(10, "Does your child respond when you call their name?"),
    Question::new(11, "When you smile at your child, do they smile back at you?"),
    Question::new(12, "Is your child comfortable with everyday noises such as a vacuum cleaner?"),
    Question::new(13, "Does your child walk?"),
    Question::new(14, "Does your child look you in the eye when you are talking or playing together?"),
    Question::critical(15, "Does your child try to copy what you do?"),
    Question::new(16, "If you turn your head to look at something, does your child look around to see what you are looking at?"),
    Question::new(17, "Does your child try to get you to watch them?"),
    Question::new(18, "Does your child understand when you tell them to do something?"),
    Question::new(19, "If something new happens, does your child look at your face to see how you feel about it?"),
    Question::new(20, "Does your child like movement activities, such as being swung or bounced?"),
];

static MOTOR_SKILLS: &[Question] = &[
    Question::new(1, "Runs steadily without frequent falls"),
    Question::new(2, "Climbs stairs using alternating feet"),
    Question::new(3, "Jumps forward with both feet together"),
    Question::new(4, "Balances on one foot for a few seconds"),
    Question::new(5, "Throws and catches a large ball"),
    Question::new(6, "Holds a crayon or pencil with a finger grip"),
    Question::new(7, "Copies simple shapes such as a circle or cross"),
    Question::new(8, "Uses child-safe scissors to cut along a line"),
    Question::new(9, "Stacks blocks into a tower of six or more"),
    Question::new(10, "Manages buttons, zips and shoes with little help"),
];

static SPEECH_LANGUAGE: &[Question] = &[
    Question::new(1, "Speaks in sentences of three or more words"),
    Question::new(2, "Is understood by unfamiliar adults most of the time"),
    Question::new(3, "Follows two-step instructions"),
    Question::new(4, "Names common objects, animals and colours"),
    Question::new(5, "Asks and answers simple who, what and where questions"),
    Question::new(6, "Retells a short story or an event from the day"),
    Question::new(7, "Uses pronouns such as I, you and me correctly"),
    Question::new(8, "Pronounces most speech sounds clearly"),
    Question::new(9, "Enjoys rhymes, songs and being read to"),
    Question::new(10, "Takes turns in a simple conversation"),
];

static SOCIAL_SKILLS: &[Question] = &[
    Question::new(1, "Plays cooperatively with other children"),
    Question::new(2, "Shares toys and materials"),
    Question::new(3, "Waits for their turn"),
    Question::new(4, "Expresses feelings with words rather than actions"),
    Question::new(5, "Shows concern when another child is upset"),
    Question::new(6, "Separates from a parent without prolonged distress"),
    Question::new(7, "Follows classroom routines and rules"),
    Question::new(8, "Joins group activities willingly"),
    Question::new(9, "Resolves small conflicts with adult guidance"),
    Question::new(10, "Greets familiar adults and children"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn question_ids_are_unique_and_sequential() {
        for instrument in Instrument::ALL {
            let qs = questions(instrument);
            assert!(!qs.is_empty());
            let ids: HashSet<u16> = qs.iter().map(|q| q.id).collect();
            assert_eq!(ids.len(), qs.len());
            for (i, q) in qs.iter().enumerate() {
                assert_eq!(usize::from(q.id), i + 1);
            }
        }
    }

    #[test]
    fn only_the_yes_no_instrument_has_critical_questions() {
        assert_eq!(MCHAT.iter().filter(|q| q.critical).count(), 6);
        for instrument in [
            Instrument::MotorSkills,
            Instrument::SpeechLanguage,
            Instrument::SocialSkills,
        ] {
            assert!(questions(instrument).iter().all(|q| !q.critical));
        }
    }
}
