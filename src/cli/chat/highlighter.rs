use crate::color;

use super::repl::COMMANDS;

/// Highlights REPL commands; anything else is shown as user text.
#[derive(Default)]
pub(crate) struct Highlighter;

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> reedline::StyledText {
        let style = if COMMANDS.contains(&line.trim_end()) {
            *color::USER_PROMPT
        } else {
            *color::USER_TEXT
        };

        reedline::StyledText {
            buffer: vec![(style, line.to_string())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reedline::Highlighter as _;

    #[test]
    fn test_commands_are_highlighted() {
        let highlighter = Highlighter;

        let command = highlighter.highlight("/mood", 5);
        let text = highlighter.highlight("/moody teenager", 0);

        assert_eq!(command.buffer, vec![(*color::USER_PROMPT, "/mood".to_string())]);
        assert_eq!(text.buffer[0].0, *color::USER_TEXT);
    }
}
