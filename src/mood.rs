//! Mood detection for the companion's replies.
//!
//! A [`Mood`] is the discrete emotional state that drives the mascot. Moods are
//! either set by the conversation lifecycle (a turn starts `thinking`, becomes
//! `talking` once the stream opens, and cools down to `idle`) or inferred from
//! the text of the reply.
//!
//! ## Inference
//!
//! Inference scores the reply against a fixed table of [`EmotionPattern`]s.
//! Every phrase of a pattern found in the text adds twice the pattern weight,
//! and every keyword found as a whole word adds the weight once. The highest
//! scoring pattern wins; ties go to the pattern listed first, so the order of
//! the table is itself a priority.
//!
//! While a reply is streaming, [`infer_mood`] holds the current mood until the
//! text is long enough to say anything, and never lets the passive `thinking`
//! signal replace a mood that is already showing.

mod inference;
mod patterns;

pub(crate) use inference::{detect_mood, infer_mood, score_moods, MIN_INFERENCE_CHARS};
pub(crate) use patterns::EMOTION_PATTERNS;

use serde::{Deserialize, Serialize};

/// The moods understood by the mascot.
#[derive(
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Mood {
    #[default]
    Idle,
    Thinking,
    Talking,
    Happy,
    Sleepy,
    Confused,
    Excited,
    Sad,
    Surprised,
    Embarrassed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_mood_names_round_trip() {
        for mood in Mood::iter() {
            assert_eq!(Mood::from_str(&mood.to_string()).unwrap(), mood);
        }

        assert_eq!(Mood::Embarrassed.to_string(), "embarrassed");
        assert!(Mood::from_str("grumpy").is_err());
    }
}
