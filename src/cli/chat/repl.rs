use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultCompleter, EditCommand, EditMode, Emacs, KeyCode, KeyModifiers,
    MenuBuilder, Reedline, ReedlineEvent, ReedlineMenu, Signal, Vi,
};

use crate::config;
use crate::mood::Mood;
use crate::warn;
use nu_ansi_term::{Color, Style};
use tokio::sync::watch;

use super::highlighter::Highlighter;
use super::prompt::{completion_marker, Prompt};

pub(crate) const COMMANDS: [&str; 3] = ["/exit", "/clear", "/mood"];

/// A line read by the REPL.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Input {
    Message(String),
    /// Forget the conversation
    Clear,
    /// Show the current mood
    Mood,
    Exit,
}

fn parse_input(line: &str) -> Option<Input> {
    match line.trim() {
        "" => None,
        "/exit" => Some(Input::Exit),
        "/clear" => Some(Input::Clear),
        "/mood" => Some(Input::Mood),
        _ => Some(Input::Message(line.to_string())),
    }
}

fn completion_event() -> ReedlineEvent {
    ReedlineEvent::UntilFound(vec![
        ReedlineEvent::Menu("completion_menu".to_string()),
        ReedlineEvent::MenuNext,
    ])
}

fn edit_mode(keybindings: config::Keybindings) -> Box<dyn EditMode> {
    match keybindings {
        config::Keybindings::Vi => {
            let mut insert_bindings = default_vi_insert_keybindings();

            insert_bindings.add_binding(KeyModifiers::NONE, KeyCode::Tab, completion_event());

            Box::new(Vi::new(insert_bindings, default_vi_normal_keybindings()))
        }
        config::Keybindings::Emacs => {
            let mut keybindings = default_emacs_keybindings();

            keybindings.add_binding(KeyModifiers::NONE, KeyCode::Tab, completion_event());

            keybindings.add_binding(
                KeyModifiers::CONTROL,
                KeyCode::Char('j'),
                ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
            );

            Box::new(Emacs::new(keybindings))
        }
    }
}

pub(crate) struct Repl {
    line_editor: Reedline,
    prompt: Prompt,
}

impl Repl {
    /// The prompt shows the latest mood published on `moods`.
    pub(crate) fn new(keybindings: config::Keybindings, moods: watch::Receiver<Mood>) -> Repl {
        let mut completer = Box::new(DefaultCompleter::with_inclusions(&['/']));

        completer.insert(COMMANDS.iter().map(|&c| c.to_string()).collect());

        // Use the interactive menu to select options from the completer
        let completion_menu = Box::new(
            ColumnarMenu::default()
                .with_name("completion_menu")
                .with_marker(&completion_marker().to_string())
                .with_text_style(Style::new().fg(Color::Default))
                .with_selected_text_style(Style::new().fg(Color::Blue).on(Color::DarkGray))
                .with_selected_match_text_style(
                    Style::new().fg(Color::Blue).bold().on(Color::DarkGray),
                ),
        );

        let line_editor = Reedline::create()
            .with_completer(completer)
            .with_menu(ReedlineMenu::EngineCompleter(completion_menu))
            .with_edit_mode(edit_mode(keybindings))
            .with_highlighter(Box::new(Highlighter));

        Repl {
            line_editor,
            prompt: Prompt::new(moods),
        }
    }

    /// Reads the next non-empty line.
    pub(crate) fn read(&mut self) -> Input {
        loop {
            match self.line_editor.read_line(&self.prompt) {
                Ok(Signal::Success(line)) => match parse_input(&line) {
                    Some(input) => return input,
                    None => continue,
                },
                Ok(Signal::CtrlC) => continue,
                Ok(Signal::CtrlD) => return Input::Exit,
                Err(err) => {
                    warn!("failed to read input: {}", err);
                    return Input::Exit;
                }
            }
        }
    }
}
