use super::patterns::EMOTION_PATTERNS;
use super::Mood;

/// Replies shorter than this (in characters) never change the mood.
pub(crate) const MIN_INFERENCE_CHARS: usize = 50;

/// Scores of every pattern that matched `text`, in table order.
pub(crate) fn score_moods(text: &str) -> Vec<(Mood, u32)> {
    let text = text.to_lowercase();

    EMOTION_PATTERNS
        .iter()
        .map(|pattern| (pattern.mood, pattern.score(&text)))
        .filter(|(_, score)| *score > 0)
        .collect()
}

/// The best supported mood for `text` and its score, or `None` when no
/// pattern matched.
pub(crate) fn detect_mood(text: &str) -> Option<(Mood, u32)> {
    let mut best: Option<(Mood, u32)> = None;

    for (mood, score) in score_moods(text) {
        // Strictly greater: the earlier pattern keeps a tie
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((mood, score));
        }
    }

    best
}

/// The mood to show given the reply so far and the mood currently shown.
///
/// Short replies keep `current`. Once the reply is long enough, a detected
/// mood replaces `current` unless it is `thinking`, which is too weak a signal
/// to override anything.
pub(crate) fn infer_mood(text: &str, current: Mood) -> Mood {
    if text.chars().count() < MIN_INFERENCE_CHARS {
        return current;
    }

    match detect_mood(text) {
        Some((Mood::Thinking, _)) | None => current,
        Some((mood, _)) => mood,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    const FILLER: &str = "Here is a reply that goes on for quite a while. ";

    #[test]
    fn test_short_text_keeps_current_mood() {
        let texts = [
            "",
            "wow!",
            "that must be hard",
            "oops, my bad. sorry! amazing, let me think",
            "I'm so sorry to hear that, I'm here for you",
        ];

        for text in texts {
            assert!(text.chars().count() < MIN_INFERENCE_CHARS);

            for current in Mood::iter() {
                assert_eq!(infer_mood(text, current), current);
            }
        }
    }

    #[test]
    fn test_threshold_counts_characters() {
        // 49 characters, but more than 50 bytes
        let text = format!("{}wow", "é".repeat(46));

        assert_eq!(text.chars().count(), 49);
        assert_eq!(infer_mood(&text, Mood::Talking), Mood::Talking);

        let text = format!("{}wow", "é".repeat(47));

        assert_eq!(infer_mood(&text, Mood::Talking), Mood::Excited);
    }

    #[test]
    fn test_phrase_outweighs_keyword() {
        let text = "I hear you. Moving across the country alone, that must be hard.";

        assert_eq!(detect_mood(text), Some((Mood::Sad, 6)));
        assert_eq!(infer_mood(text, Mood::Talking), Mood::Sad);
    }

    #[test]
    fn test_case_insensitive() {
        let text = format!("{}WOW, that is AMAZING news", FILLER);

        assert_eq!(detect_mood(&text), Some((Mood::Excited, 6)));
    }

    #[test]
    fn test_tie_goes_to_table_order() {
        // excited (3) vs sad (3)
        assert_eq!(detect_mood("wow, i miss it"), Some((Mood::Excited, 3)));
        // confused (2) vs surprised (2)
        assert_eq!(detect_mood("hmm, unexpected"), Some((Mood::Surprised, 2)));
    }

    #[test]
    fn test_thinking_never_overrides() {
        let text = format!("{}Let me think about it, maybe we should consider it.", FILLER);

        assert_eq!(detect_mood(&text).map(|(m, _)| m), Some(Mood::Thinking));
        assert_eq!(infer_mood(&text, Mood::Talking), Mood::Talking);
        assert_eq!(infer_mood(&text, Mood::Happy), Mood::Happy);
    }

    #[test]
    fn test_no_match_keeps_current() {
        assert_eq!(detect_mood(FILLER), None);
        assert_eq!(infer_mood(FILLER, Mood::Talking), Mood::Talking);
    }

    #[test]
    fn test_higher_score_wins_over_order() {
        // happy: four keywords plus "happy to help" = 4 + 2, excited: wow = 3
        let text = "wow. glad you asked, wonderful question, love it, happy to help";

        assert_eq!(detect_mood(text), Some((Mood::Happy, 6)));
    }

    #[test]
    fn test_score_moods_lists_candidates_in_order() {
        let scores = score_moods("oops, i am so tired");

        assert_eq!(scores, vec![(Mood::Embarrassed, 2), (Mood::Sleepy, 1)]);
    }
}
