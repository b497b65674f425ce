use nu_ansi_term::AnsiGenericString;
use reedline::{self, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus, PromptViMode};
use std::borrow::Cow;
use tokio::sync::watch;

use crate::color::{self, MaybePaint};
use crate::mascot;
use crate::mood::Mood;

const USER_PROMPT: &str = "> ";
const USER_VI_INSERT_PROMPT: &str = USER_PROMPT;
const USER_VI_NORMAL_PROMPT: &str = ": ";
const COMPLETION_MARKER: &str = "/ ";
const USER_MULTLINE_PROMPT: &str = "::: ";

/// Printed before Buddy's reply, e.g. `(•o•) buddy: `.
pub(crate) fn buddy_prompt(mood: Mood) -> String {
    let prompt_text = format!("{} buddy: ", mascot::face(mood));

    color::MODEL_PROMPT.maybe_paint(prompt_text).to_string()
}

pub(crate) fn user_prompt() -> AnsiGenericString<'static, str> {
    color::USER_PROMPT.maybe_paint(USER_PROMPT)
}

fn user_vi_insert_prompt() -> AnsiGenericString<'static, str> {
    color::USER_PROMPT.maybe_paint(USER_VI_INSERT_PROMPT)
}

fn user_vi_normal_prompt() -> AnsiGenericString<'static, str> {
    color::USER_PROMPT.maybe_paint(USER_VI_NORMAL_PROMPT)
}

pub(crate) fn completion_marker() -> AnsiGenericString<'static, str> {
    color::USER_PROMPT.maybe_paint(COMPLETION_MARKER)
}

fn multiline_prompt() -> AnsiGenericString<'static, str> {
    color::USER_PROMPT.maybe_paint(USER_MULTLINE_PROMPT)
}

/// The input prompt. The left side shows the mascot in the latest published
/// mood, so a cool-down to idle shows up on the next repaint.
pub(crate) struct Prompt {
    moods: watch::Receiver<Mood>,
    user_prompt: String,
    user_vi_normal_prompt: String,
    user_vi_insert_prompt: String,
    user_multiline_prompt: String,
}

impl Prompt {
    pub(crate) fn new(moods: watch::Receiver<Mood>) -> Prompt {
        Prompt {
            moods,
            user_prompt: user_prompt().to_string(),
            user_vi_insert_prompt: user_vi_insert_prompt().to_string(),
            user_vi_normal_prompt: user_vi_normal_prompt().to_string(),
            user_multiline_prompt: multiline_prompt().to_string(),
        }
    }
}

impl reedline::Prompt for Prompt {
    fn render_prompt_left(&self) -> Cow<str> {
        let mood = *self.moods.borrow();

        Cow::Owned(format!("{} ", mascot::render(mood)))
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, prompt_mode: PromptEditMode) -> Cow<str> {
        match prompt_mode {
            PromptEditMode::Default | PromptEditMode::Emacs | PromptEditMode::Custom(_) => {
                Cow::Borrowed(&self.user_prompt)
            }
            PromptEditMode::Vi(vi_mode) => match vi_mode {
                PromptViMode::Normal => Cow::Borrowed(&self.user_vi_normal_prompt),
                PromptViMode::Insert => Cow::Borrowed(&self.user_vi_insert_prompt),
            },
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed(&self.user_multiline_prompt)
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };

        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ColorMode;
    use crate::conversation::tests::{conversation, turn, Script, ScriptedProvider, Step};
    use crate::conversation::COOLDOWN;
    use reedline::Prompt as _;
    use std::time::Duration;

    #[test]
    fn test_prompt_shows_mood() {
        color::configure_color(ColorMode::Off);

        let (_tx, rx) = watch::channel(Mood::Sad);
        let prompt = Prompt::new(rx);

        assert_eq!(prompt.render_prompt_left(), "(╥_╥) sad ");
        assert_eq!(buddy_prompt(Mood::Talking), "(•o•) buddy: ");
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_follows_cooldown() {
        color::configure_color(ColorMode::Off);

        let provider = ScriptedProvider::with(vec![Script::Reply(vec![Step::Delta("Hi!")])]);
        let mut conv = conversation(&provider);

        let prompt = Prompt::new(conv.mood().subscribe());

        assert_eq!(prompt.render_prompt_left(), "(•‿•) idle ");

        turn(&mut conv, "Hello").await;

        assert_eq!(prompt.render_prompt_left(), "(^‿^) happy ");

        tokio::time::sleep(COOLDOWN + Duration::from_millis(100)).await;

        assert_eq!(prompt.render_prompt_left(), "(•‿•) idle ");
    }
}
