//! The conversation drives one request/response turn at a time.
//!
//! A turn sends the system prompt, the most recent chat messages and the new
//! user message to the provider, then drains the streamed reply. Every fragment
//! is appended to the growing reply, handed to the [`TurnObserver`], and the
//! mood is re-inferred from the reply so far.
//!
//! The mood follows the turn: `thinking` once the message is submitted,
//! `talking` once the stream opens, whatever the reply suggests while it
//! streams, and `happy` (or the inferred mood) when it ends. After a short
//! cool-down the mood returns to `idle`.
//!
//! Turns are never retried. A failed turn keeps whatever part of the reply
//! arrived, appends an error entry and leaves the mascot `confused`. A
//! cancelled turn keeps the partial reply and appends nothing.

mod mood_cell;

pub(crate) use mood_cell::MoodCell;

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::chat::Message;
use crate::mood::{infer_mood, Mood};
use crate::providers::{ChatProvider, Error};
use crate::store::{MessageStore, StoredMessage};
use crate::warn;

/// The number of prior chat messages sent with each turn.
pub(crate) const HISTORY_LIMIT: usize = 20;

/// How long the final mood of a turn is shown before returning to idle.
pub(crate) const COOLDOWN: Duration = Duration::from_secs(3);

pub(crate) const DEFAULT_SYSTEM_PROMPT: &str = "You are Buddy, a warm and \
playful companion. Keep replies short and conversational, show genuine interest \
in the user, and let your feelings show in how you write.";

/// An entry in the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Entry {
    /// A message exchanged with the model
    Chat(Message),
    /// An error shown to the user. It is never sent to the model.
    Error(String),
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TurnOutcome {
    /// The reply streamed to completion.
    Completed,
    /// The turn was cancelled. Any partial reply is kept.
    Cancelled,
    /// The turn failed with the given message. Any partial reply is kept.
    Failed(String),
    /// No turn was started: the input was empty or no model is configured.
    Skipped,
}

/// Receives updates while a turn is in progress.
pub(crate) trait TurnObserver {
    /// A fragment arrived; `content` is the reply so far, including `delta`.
    fn fragment(&mut self, delta: &str, content: &str);

    /// The mood changed.
    fn mood(&mut self, _mood: Mood) {}
}

enum StreamEnd {
    Completed,
    Cancelled,
}

pub(crate) struct Conversation {
    provider: Box<dyn ChatProvider>,
    model: Option<String>,
    system_prompt: String,
    entries: Vec<Entry>,
    mood: MoodCell,
    store: Box<dyn MessageStore>,
    cooldown: Duration,
}

impl Conversation {
    pub(crate) fn new(
        provider: Box<dyn ChatProvider>,
        model: Option<String>,
        system_prompt: String,
        store: Box<dyn MessageStore>,
    ) -> Conversation {
        Conversation {
            provider,
            model,
            system_prompt,
            entries: Vec::new(),
            mood: MoodCell::new(),
            store,
            cooldown: COOLDOWN,
        }
    }

    /// Loads the most recent messages from the store, returning how many
    /// were loaded.
    pub(crate) fn resume(&mut self) -> usize {
        match self.store.recent(HISTORY_LIMIT) {
            Ok(messages) => {
                let n = messages.len();

                self.entries
                    .extend(messages.into_iter().map(|m| Entry::Chat(m.into())));

                n
            }
            Err(err) => {
                warn!("failed to load the conversation history: {}", err);
                0
            }
        }
    }

    pub(crate) fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub(crate) fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub(crate) fn mood(&self) -> &MoodCell {
        &self.mood
    }

    /// Forgets the transcript, including the stored history.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();

        if let Err(err) = self.store.clear() {
            warn!("failed to clear the conversation history: {}", err);
        }
    }

    fn chat_messages(&self) -> impl DoubleEndedIterator<Item = &Message> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Chat(message) => Some(message),
            Entry::Error(_) => None,
        })
    }

    /// The messages sent to the model when `input` is submitted: the system
    /// prompt, up to [`HISTORY_LIMIT`] prior messages, then `input`.
    pub(crate) fn request_messages(&self, input: &str) -> Vec<Message> {
        let mut prior: Vec<Message> = self
            .chat_messages()
            .rev()
            .take(HISTORY_LIMIT)
            .cloned()
            .collect();

        prior.reverse();

        let mut messages = Vec::with_capacity(prior.len() + 2);

        messages.push(Message::system(self.system_prompt.clone()));
        messages.extend(prior);
        messages.push(Message::user(input.to_string()));

        messages
    }

    fn append(&mut self, message: Message) {
        if let Err(err) = self.store.save(&StoredMessage::new(&message)) {
            warn!("failed to save a {} message: {}", message.role, err);
        }

        self.entries.push(Entry::Chat(message));
    }

    fn set_mood(&self, mood: Mood, observer: &mut dyn TurnObserver) {
        if self.mood.set(mood) {
            observer.mood(mood);
        }
    }

    /// Runs one turn. Only one turn can be in flight at a time; `cancel`
    /// belongs to this turn alone.
    pub(crate) async fn send(
        &mut self,
        input: &str,
        cancel: &CancellationToken,
        observer: &mut dyn TurnObserver,
    ) -> TurnOutcome {
        let input = input.trim();

        if input.is_empty() {
            return TurnOutcome::Skipped;
        }

        let model = match &self.model {
            Some(model) => model.clone(),
            None => return TurnOutcome::Skipped,
        };

        let messages = self.request_messages(input);

        self.append(Message::user(input.to_string()));

        self.mood.begin_turn();
        self.set_mood(Mood::Thinking, observer);

        let mut content = String::new();

        let result = self
            .stream_reply(&model, &messages, cancel, observer, &mut content)
            .await;

        if !content.is_empty() {
            self.append(Message::assistant(content.clone()));
        }

        let outcome = match result {
            Ok(StreamEnd::Completed) => {
                self.set_mood(infer_mood(&content, Mood::Happy), observer);
                TurnOutcome::Completed
            }
            Ok(StreamEnd::Cancelled) => {
                log::debug!("turn cancelled after {} bytes", content.len());
                TurnOutcome::Cancelled
            }
            Err(err) => {
                let description = err.describe();

                log::debug!("turn failed ({:?}): {}", err.kind(), description);

                self.entries.push(Entry::Error(description.clone()));
                self.set_mood(Mood::Confused, observer);

                TurnOutcome::Failed(description)
            }
        };

        self.mood.schedule_idle(self.cooldown);

        outcome
    }

    async fn stream_reply(
        &self,
        model: &str,
        messages: &[Message],
        cancel: &CancellationToken,
        observer: &mut dyn TurnObserver,
        content: &mut String,
    ) -> Result<StreamEnd, Error> {
        let mut completion = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
            completion = self.provider.stream_completion(model, messages) => completion?,
        };

        self.set_mood(Mood::Talking, observer);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(StreamEnd::Cancelled),
                next = completion.next() => next,
            };

            let delta = match next {
                Some(delta) => delta?,
                None => return Ok(StreamEnd::Completed),
            };

            if delta.content.is_empty() {
                continue;
            }

            content.push_str(&delta.content);
            observer.fragment(&delta.content, content);

            self.set_mood(infer_mood(content, self.mood.get()), observer);
        }
    }
}
