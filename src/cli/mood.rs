use std::io::{self, IsTerminal, Read};

use crate::cli::list::{format_output, table::Table};
use crate::mascot;
use crate::mood::{detect_mood, infer_mood, score_moods, Mood, EMOTION_PATTERNS, MIN_INFERENCE_CHARS};
use crate::{die, warn, MoodArgs};

#[derive(serde::Serialize)]
struct Score {
    mood: Mood,
    weight: u32,
    score: u32,
    matches: Vec<&'static str>,
}

#[derive(serde::Serialize)]
struct MoodReport {
    scores: Vec<Score>,
    detected: Option<Mood>,
    inferred: Mood,
}

impl From<MoodReport> for Table {
    fn from(value: MoodReport) -> Self {
        let mut tab = Table::new();

        tab.set_header(vec!["MOOD", "WEIGHT", "SCORE", "MATCHES"]);
        tab.right_align(1);
        tab.right_align(2);

        for score in value.scores {
            tab.add_row(vec![
                score.mood.to_string(),
                score.weight.to_string(),
                score.score.to_string(),
                score.matches.join(", "),
            ]);
        }

        tab
    }
}

fn report(text: &str, current: Mood) -> MoodReport {
    let matched = score_moods(text);
    let lowered = text.to_lowercase();

    let scores = EMOTION_PATTERNS
        .iter()
        .map(|pattern| Score {
            mood: pattern.mood,
            weight: pattern.weight,
            score: matched
                .iter()
                .find(|(mood, _)| *mood == pattern.mood)
                .map_or(0, |(_, score)| *score),
            matches: pattern.matches(&lowered),
        })
        .collect();

    MoodReport {
        scores,
        detected: detect_mood(text).map(|(mood, _)| mood),
        inferred: infer_mood(text, current),
    }
}

fn read_text(args: &MoodArgs) -> String {
    if !args.text.is_empty() {
        return args.text.join(" ");
    }

    if io::stdin().is_terminal() {
        die!("no text was given, pass it as an argument or through standard input");
    }

    let mut buf = String::new();

    if let Err(err) = io::stdin().read_to_string(&mut buf) {
        die!("failed to read standard input: {}", err);
    }

    buf
}

pub(crate) fn mood_cmd(args: &MoodArgs) {
    let text = read_text(args);

    if text.chars().count() < MIN_INFERENCE_CHARS {
        warn!(
            "the text is shorter than {} characters, the mood stays \"{}\"",
            MIN_INFERENCE_CHARS, args.current
        );
    }

    let report = report(&text, args.current);
    let inferred = report.inferred;

    let json = matches!(args.format, crate::ListingFormat::Json);

    format_output(report, args.format);

    if !json {
        println!("\n{}", mascot::render(inferred));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_every_pattern() {
        let text = "Oh no, I'm so sorry to hear that. Losing a pet is a real loss.";

        let report = report(text, Mood::Talking);

        assert_eq!(report.scores.len(), EMOTION_PATTERNS.len());
        assert_eq!(report.detected, Some(Mood::Sad));
        assert_eq!(report.inferred, Mood::Sad);

        let sad = report.scores.iter().find(|s| s.mood == Mood::Sad).unwrap();

        // "sorry to hear" (phrase), "sorry" and "loss" (keywords)
        assert_eq!(sad.score, 3 * 2 + 3 + 3);
        assert_eq!(sad.matches, vec!["sorry to hear", "sorry", "loss"]);

        let sleepy = report.scores.iter().find(|s| s.mood == Mood::Sleepy).unwrap();
        assert_eq!(sleepy.score, 0);
        assert!(sleepy.matches.is_empty());
    }

    #[test]
    fn test_report_short_text() {
        let report = report("wow", Mood::Talking);

        assert_eq!(report.detected, Some(Mood::Excited));
        assert_eq!(report.inferred, Mood::Talking);
    }
}
