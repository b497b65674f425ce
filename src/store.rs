//! Persistence for conversation history.
//!
//! Messages are saved as they are exchanged so that a conversation can be
//! resumed later. A [`MessageStore`] only needs to append messages and return
//! the most recent ones in order.

use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::chat::{Message, Role};
use crate::warn;

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    #[error("failed to access the message store: {0}")]
    Io(
        #[from]
        #[source]
        io::Error,
    ),

    #[error("failed to serialize a message: {0}")]
    Serialize(
        #[from]
        #[source]
        serde_json::Error,
    ),
}

/// The persisted form of a chat message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct StoredMessage {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: u64,
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

impl StoredMessage {
    pub(crate) fn new(message: &Message) -> StoredMessage {
        StoredMessage {
            id: Uuid::new_v4(),
            role: message.role,
            content: message.content.clone(),
            timestamp: now_millis(),
        }
    }
}

impl From<StoredMessage> for Message {
    fn from(value: StoredMessage) -> Self {
        Message::new(value.role, value.content)
    }
}

pub(crate) trait MessageStore: Send {
    /// Appends a message to the store.
    fn save(&mut self, message: &StoredMessage) -> Result<(), Error>;

    /// Returns up to `limit` of the most recent messages, oldest first.
    fn recent(&self, limit: usize) -> Result<Vec<StoredMessage>, Error>;

    /// Removes every message.
    fn clear(&mut self) -> Result<(), Error>;
}

fn most_recent(mut messages: Vec<StoredMessage>, limit: usize) -> Vec<StoredMessage> {
    // Stable: messages saved within the same millisecond keep their order
    messages.sort_by_key(|m| m.timestamp);

    let skip = messages.len().saturating_sub(limit);

    messages.split_off(skip)
}

/// Keeps messages in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub(crate) struct MemoryStore {
    messages: Vec<StoredMessage>,
}

impl MessageStore for MemoryStore {
    fn save(&mut self, message: &StoredMessage) -> Result<(), Error> {
        self.messages.push(message.clone());
        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredMessage>, Error> {
        Ok(most_recent(self.messages.clone(), limit))
    }

    fn clear(&mut self) -> Result<(), Error> {
        self.messages.clear();
        Ok(())
    }
}

/// Stores one JSON object per line in a file.
#[derive(Debug)]
pub(crate) struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub(crate) fn new<P: Into<PathBuf>>(path: P) -> JsonlStore {
        JsonlStore { path: path.into() }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl MessageStore for JsonlStore {
    fn save(&mut self, message: &StoredMessage) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_string(message)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.write_all(line.as_bytes())?;

        Ok(())
    }

    fn recent(&self, limit: usize) -> Result<Vec<StoredMessage>, Error> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut messages = Vec::new();

        for (lineno, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<StoredMessage>(&line) {
                Ok(message) => messages.push(message),
                Err(err) => warn!(
                    "skipping unreadable message on line {} of {}: {}",
                    lineno + 1,
                    self.path.display(),
                    err
                ),
            }
        }

        Ok(most_recent(messages, limit))
    }

    fn clear(&mut self) -> Result<(), Error> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// `$XDG_DATA_HOME/buddy/messages.jsonl`, falling back to
/// `~/.local/share/buddy/messages.jsonl`.
pub(crate) fn default_store_path() -> Option<PathBuf> {
    let data_home = match std::env::var_os("XDG_DATA_HOME") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(std::env::var_os("HOME")?).join(".local/share"),
    };

    Some(data_home.join("buddy").join("messages.jsonl"))
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    // The store lives in a directory it has to create; it is removed when the
    // returned `TempDir` is dropped
    fn temp_store() -> (TempDir, JsonlStore) {
        let dir = TempDir::new().expect("failed to create temp dir");
        let store = JsonlStore::new(dir.path().join("buddy").join("messages.jsonl"));

        (dir, store)
    }

    fn stored(role: Role, content: &str, timestamp: u64) -> StoredMessage {
        StoredMessage {
            id: Uuid::new_v4(),
            role,
            content: content.to_string(),
            timestamp,
        }
    }

    #[test]
    fn test_jsonl_store_round_trip() {
        let (_dir, mut store) = temp_store();

        assert!(store.recent(10).unwrap().is_empty());

        let first = stored(Role::User, "How are you?", 10);
        let second = stored(Role::Assistant, "Great, thanks!", 20);

        store.save(&first).unwrap();
        store.save(&second).unwrap();

        assert_eq!(store.recent(10).unwrap(), vec![first, second.clone()]);
        assert_eq!(store.recent(1).unwrap(), vec![second]);

        store.clear().unwrap();

        assert!(store.recent(10).unwrap().is_empty());
        assert!(!store.path().exists());

        // Clearing a store that was never written is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_jsonl_store_skips_bad_lines() {
        let (_dir, mut store) = temp_store();

        let message = stored(Role::User, "hello", 1);
        store.save(&message).unwrap();

        {
            let mut file = OpenOptions::new().append(true).open(store.path()).unwrap();
            file.write_all(b"{this is not json}\n\n").unwrap();
        }

        assert_eq!(store.recent(5).unwrap(), vec![message]);
    }

    #[test]
    fn test_recent_orders_by_timestamp() {
        let mut store = MemoryStore::default();

        store.save(&stored(Role::Assistant, "later", 30)).unwrap();
        store.save(&stored(Role::User, "earlier", 10)).unwrap();
        store.save(&stored(Role::User, "same time", 30)).unwrap();

        let contents: Vec<String> = store
            .recent(2)
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();

        assert_eq!(contents, vec!["later", "same time"]);
    }

    #[test]
    fn test_stored_message_format() {
        let message = StoredMessage::new(&Message::user("hi".to_string()));

        let value = serde_json::to_value(&message).unwrap();

        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "hi");
        assert!(value["timestamp"].as_u64().unwrap() > 0);
    }
}
