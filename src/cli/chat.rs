mod highlighter;
mod prompt;
mod repl;

use std::io::{self, IsTerminal, Read, Write};

use tokio::signal;
use tokio_util::sync::CancellationToken;

use self::prompt::{buddy_prompt, user_prompt};
use self::repl::{Input, Repl};
use crate::chat::Role;
use crate::cli::provider_from_config;
use crate::config::{Config, API_KEY_ENV_VARS};
use crate::conversation::{Conversation, Entry, TurnObserver, TurnOutcome, DEFAULT_SYSTEM_PROMPT};
use crate::mood::Mood;
use crate::store::{default_store_path, JsonlStore, MemoryStore, MessageStore};
use crate::{die, error, mascot, warn, ChatArgs};

/// Prints the reply as it streams in, headed by the mascot's face and followed
/// by the mood the reply settled on.
struct Printer<W: Write> {
    out: W,
    incremental: bool,
    started: bool,
    mood: Mood,
}

impl<W: Write> Printer<W> {
    fn new(out: W, incremental: bool, mood: Mood) -> Printer<W> {
        Printer {
            out,
            incremental,
            started: false,
            mood,
        }
    }

    fn emit(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            die!("failed to write to the output stream: {}", err);
        }
    }

    /// Ends the streamed reply, if any was printed.
    fn finish(&mut self) {
        if !self.started {
            return;
        }

        let tail = match self.mood {
            Mood::Thinking | Mood::Talking => "\n".to_string(),
            mood => format!(" {}\n", mascot::render(mood)),
        };

        self.emit(&tail);
    }
}

impl<W: Write> TurnObserver for Printer<W> {
    fn fragment(&mut self, delta: &str, _content: &str) {
        if !self.incremental {
            return;
        }

        if !self.started {
            let header = buddy_prompt(self.mood);

            self.emit(&header);
            self.started = true;
        }

        self.emit(delta);
    }

    fn mood(&mut self, mood: Mood) {
        self.mood = mood;
    }
}

/// Why turns are skipped before any request is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unavailable {
    NoModel,
    NoApiKey,
}

impl Unavailable {
    fn reason(self) -> &'static str {
        match self {
            Unavailable::NoModel => "no model is configured, the message was not sent",
            Unavailable::NoApiKey => "no API key is configured, the message was not sent",
        }
    }
}

fn unavailable(model: Option<&str>, has_api_key: bool) -> Option<Unavailable> {
    match (model, has_api_key) {
        (None, _) => Some(Unavailable::NoModel),
        (Some(_), false) => Some(Unavailable::NoApiKey),
        (Some(_), true) => None,
    }
}

fn open_store(config: &Config, args: &ChatArgs) -> Box<dyn MessageStore> {
    if args.no_history || !config.chat.history {
        return Box::new(MemoryStore::default());
    }

    match default_store_path() {
        Some(path) => {
            let store = JsonlStore::new(path);

            log::debug!("conversation history: {}", store.path().display());

            Box::new(store)
        }
        None => {
            warn!("could not locate a data directory, the conversation will not be saved");
            Box::new(MemoryStore::default())
        }
    }
}

fn print_transcript(conversation: &Conversation) {
    for entry in conversation.entries() {
        match entry {
            Entry::Chat(message) => match message.role {
                Role::User => println!("{}{}", user_prompt(), message.content),
                Role::Assistant => println!("{}{}\n", buddy_prompt(Mood::Idle), message.content),
                Role::System => {}
            },
            Entry::Error(text) => error!("{}", text),
        }
    }
}

/// Runs one turn. Ctrl-C cancels it, keeping whatever part of the reply has
/// already arrived.
async fn turn(
    conversation: &mut Conversation,
    input: &str,
    incremental: bool,
    unavailable: Option<Unavailable>,
) -> TurnOutcome {
    let cancel = CancellationToken::new();

    let interrupt = {
        let cancel = cancel.clone();

        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let mut printer = Printer::new(io::stdout(), incremental, conversation.mood().get());

    let outcome = conversation.send(input, &cancel, &mut printer).await;

    interrupt.abort();

    printer.finish();

    match &outcome {
        TurnOutcome::Completed | TurnOutcome::Cancelled if !incremental => {
            if let Some(Entry::Chat(message)) = conversation.entries().last() {
                if message.role == Role::Assistant {
                    println!("{}", message.content);
                }
            }
        }
        TurnOutcome::Failed(description) => error!("{}", description),
        TurnOutcome::Skipped if !input.trim().is_empty() => {
            if let Some(unavailable) = unavailable {
                warn!("{}", unavailable.reason());
            }
        }
        _ => {}
    }

    outcome
}

pub(crate) async fn chat_cmd(config: &Config, args: &ChatArgs) {
    let in_terminal = io::stdin().is_terminal();
    let out_terminal = io::stdout().is_terminal();

    // Without an explicit prompt, chat interactively only when attached to a terminal
    let interactive = if args.prompt.is_some() {
        args.interactive
    } else {
        in_terminal && out_terminal
    };

    if args.prompt.is_some() && !in_terminal {
        die!("it appears that an initial prompt is being provided both through standard input and the prompt argument");
    }

    let initial_prompt = if let Some(prompt) = &args.prompt {
        Some(prompt.clone())
    } else if !in_terminal {
        let mut buf = String::new();

        if let Err(err) = io::stdin().read_to_string(&mut buf) {
            die!("failed to read the initial prompt from standard input: {}", err);
        }

        Some(buf)
    } else {
        None
    };

    let mut model = args.model.clone().or_else(|| config.model());

    let unavailable = unavailable(model.as_deref(), config.api_key().is_some());

    match unavailable {
        Some(Unavailable::NoModel) => {
            warn!("no model is configured, set provider.model in the config or pass --model");
        }
        Some(Unavailable::NoApiKey) => {
            warn!(
                "no API key is configured, set provider.api_key in the config or define {}",
                API_KEY_ENV_VARS.join(" or ")
            );

            // Without a model no request is made
            model = None;
        }
        None => {}
    }

    let system_prompt = config
        .chat
        .system_prompt
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    let mut conversation = Conversation::new(
        Box::new(provider_from_config(config)),
        model,
        system_prompt,
        open_store(config, args),
    );

    let resumed = conversation.resume();

    // If the output is a terminal (e.g., user-facing), incrementally print it.
    let incremental = out_terminal;

    if !interactive {
        if let Some(prompt) = initial_prompt {
            turn(&mut conversation, &prompt, incremental, unavailable).await;
        }

        return;
    }

    println!(
        "{} buddy version {}",
        mascot::render(Mood::Happy),
        env!("CARGO_PKG_VERSION")
    );

    if resumed > 0 {
        print_transcript(&conversation);
    }

    if let Some(prompt) = initial_prompt {
        println!("{}{}", user_prompt(), prompt.trim());
        turn(&mut conversation, &prompt, incremental, unavailable).await;
    }

    let mut repl = Repl::new(config.chat.keybindings, conversation.mood().subscribe());

    loop {
        match repl.read() {
            Input::Message(input) => {
                turn(&mut conversation, &input, incremental, unavailable).await;
            }
            Input::Clear => conversation.clear(),
            Input::Mood => println!("{}", mascot::render(conversation.mood().get())),
            Input::Exit => break,
        }
    }
}
