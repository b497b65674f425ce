use lazy_static::lazy_static;
use regex::Regex;

use super::Mood;

/// Keywords, phrases and weight associated with a single mood.
#[derive(Debug)]
pub(crate) struct EmotionPattern {
    pub mood: Mood,
    pub keywords: Vec<&'static str>,
    pub phrases: Vec<&'static str>,
    pub weight: u32,
    matchers: Vec<Regex>,
}

impl EmotionPattern {
    fn new(
        mood: Mood,
        keywords: &[&'static str],
        phrases: &[&'static str],
        weight: u32,
    ) -> EmotionPattern {
        let matchers = keywords.iter().map(|kw| keyword_matcher(kw)).collect();

        EmotionPattern {
            mood,
            keywords: keywords.to_vec(),
            phrases: phrases.to_vec(),
            weight,
            matchers,
        }
    }

    /// Score lower-cased `text` against this pattern. Zero means no match.
    pub(crate) fn score(&self, text: &str) -> u32 {
        let phrase_hits = self.phrases.iter().filter(|p| text.contains(*p)).count() as u32;

        let keyword_hits = self.matchers.iter().filter(|m| m.is_match(text)).count() as u32;

        phrase_hits * self.weight * 2 + keyword_hits * self.weight
    }

    /// The phrases and keywords of this pattern found in lower-cased `text`,
    /// phrases first.
    pub(crate) fn matches(&self, text: &str) -> Vec<&'static str> {
        let phrases = self.phrases.iter().filter(|p| text.contains(**p));

        let keywords = self
            .keywords
            .iter()
            .zip(self.matchers.iter())
            .filter(|(_, m)| m.is_match(text))
            .map(|(kw, _)| kw);

        phrases.chain(keywords).copied().collect()
    }
}

// Word boundaries are ASCII-only: a keyword next to a non-ASCII letter still
// counts as a whole word.
fn keyword_matcher(keyword: &str) -> Regex {
    let pattern = format!(r"(?-u:\b){}(?-u:\b)", regex::escape(keyword));

    Regex::new(&pattern).expect("escaped keyword is a valid pattern")
}

lazy_static! {
    // Listed from the most specific and strongest moods to the weakest. Ties
    // between equal scores are broken by this order.
    pub(crate) static ref EMOTION_PATTERNS: Vec<EmotionPattern> = vec![
        EmotionPattern::new(
            Mood::Excited,
            &["amazing", "awesome", "incredible", "fantastic", "wow", "yay", "exciting", "thrilled"],
            &["can't wait", "so excited", "this is huge", "let's go"],
            3,
        ),
        EmotionPattern::new(
            Mood::Sad,
            &["sad", "sorry", "unfortunately", "loss", "grief", "lonely", "heartbroken", "miss"],
            &["that must be hard", "sorry to hear", "that sounds painful", "i'm here for you"],
            3,
        ),
        EmotionPattern::new(
            Mood::Surprised,
            &["surprising", "unexpected", "whoa", "unbelievable", "shocking"],
            &["no way", "i didn't expect", "who knew", "did not see that coming"],
            2,
        ),
        EmotionPattern::new(
            Mood::Embarrassed,
            &["oops", "embarrassing", "blush", "apologies", "whoops"],
            &["my bad", "my mistake", "i stand corrected", "i was wrong"],
            2,
        ),
        EmotionPattern::new(
            Mood::Confused,
            &["confusing", "unclear", "unsure", "puzzling", "hmm"],
            &["not sure", "i don't understand", "what do you mean", "could you clarify"],
            2,
        ),
        EmotionPattern::new(
            Mood::Happy,
            &["happy", "glad", "great", "wonderful", "love", "nice", "enjoy", "pleased", "fun"],
            &["glad to help", "happy to help", "sounds good", "you're welcome"],
            1,
        ),
        EmotionPattern::new(
            Mood::Sleepy,
            &["tired", "sleepy", "sleep", "rest", "bedtime", "yawn", "exhausted", "nap"],
            &["good night", "time for bed", "get some rest"],
            1,
        ),
        EmotionPattern::new(
            Mood::Thinking,
            &["think", "consider", "perhaps", "maybe", "wondering", "ponder", "probably"],
            &["let me think", "on the other hand", "it depends", "let's see"],
            1,
        ),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(mood: Mood) -> &'static EmotionPattern {
        EMOTION_PATTERNS
            .iter()
            .find(|p| p.mood == mood)
            .expect("pattern should exist")
    }

    #[test]
    fn test_table_order() {
        let order: Vec<Mood> = EMOTION_PATTERNS.iter().map(|p| p.mood).collect();

        assert_eq!(
            order,
            vec![
                Mood::Excited,
                Mood::Sad,
                Mood::Surprised,
                Mood::Embarrassed,
                Mood::Confused,
                Mood::Happy,
                Mood::Sleepy,
                Mood::Thinking,
            ]
        );
    }

    #[test]
    fn test_table_is_lowercase() {
        for p in EMOTION_PATTERNS.iter() {
            for s in p.keywords.iter().chain(p.phrases.iter()) {
                assert_eq!(s.to_lowercase(), *s, "{} should be lowercase", s);
            }
        }
    }

    #[test]
    fn test_keyword_whole_word_only() {
        let sad = pattern(Mood::Sad);

        // "sad" inside "crusade" and "miss" inside "mission"
        assert_eq!(sad.score("the crusade was a mission"), 0);
        assert_eq!(sad.score("i feel sad."), 3);
        assert_eq!(sad.score("sad"), 3);
    }

    #[test]
    fn test_phrase_scores_double() {
        let sad = pattern(Mood::Sad);

        assert_eq!(sad.score("oh, that must be hard"), 6);
    }

    #[test]
    fn test_keywords_count_once_each() {
        let happy = pattern(Mood::Happy);

        // "glad" appears twice but is a single keyword hit
        assert_eq!(happy.score("glad, so glad"), 1);
        assert_eq!(happy.score("glad and happy"), 2);
    }

    #[test]
    fn test_matches_lists_phrases_then_keywords() {
        let sad = pattern(Mood::Sad);

        assert_eq!(
            sad.matches("so sorry to hear about your loss, sorry"),
            vec!["sorry to hear", "sorry", "loss"]
        );
        assert!(sad.matches("the crusade was a mission").is_empty());
    }

    #[test]
    fn test_ascii_word_boundary() {
        let happy = pattern(Mood::Happy);

        assert_eq!(happy.score("éfun"), 1);
        assert_eq!(happy.score("funé"), 1);
        assert_eq!(happy.score("funny"), 0);
    }
}
