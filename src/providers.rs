//! Traits and type definitions for chat model completions and provider interactions.
//!
//! The interface for all conversations is provided by the [`ChatProvider`] trait,
//! which is a general interface for listing the models offered by a completions
//! API and streaming chat completions from one of them.
//!
//! ## Chat Providers
//!
//! A chat provider supports two operations:
//! - Models: list the text-generating models supported by the completion API.
//! - Completion: take a list of messages and stream back a new, model-generated
//!   message as a sequence of [`MessageDelta`]s.
//!
//! ## Error Handling
//!
//! APIs have their own bespoke error systems. The provider translates them into
//! an [`Error`], and the [`ErrorKind`] enum provides an indication of the category
//! of error that was raised. The underlying error, including any message reported
//! by the server, is kept as the error's source.

mod apireq;
mod openrouter;

use async_trait::async_trait;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;

use crate::chat::Message;

pub(crate) use openrouter::{OpenRouterProvider, DEFAULT_API_BASE};

/// This is a list specifying general categories of errors that
/// can be returned by a [`ChatProvider`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    /// Failed to connect to the underlying API service.
    /// This could be due to network issues like DNS
    /// resolution, connectivity issues, or routing problems.
    Connection,
    /// A request timed out.
    TimedOut,
    /// An API key was not provided, was rejected, or lacks
    /// the permissions needed for the request.
    Authentication,
    /// A rate limit was reached or credits were exhausted.
    ExcessUsage,
    /// The servers are overloaded. This is non-fatal
    /// and indicates that a retry may be needed later.
    ApiOverloaded,
    /// The requested resource was not found. This likely means that
    /// the model requested by the user was not found.
    NotFound,
    /// The request was malformed or is otherwise improper. This
    /// often corresponds to errors with HTTP status codes in
    /// the 400s.
    BadRequest,
    /// The server encountered an error. This often corresponds to
    /// errors with HTTP status codes in the 500s.
    InternalError,
    /// An API response was unable to be read, exceeded the client's
    /// limits, or otherwise violated the assumptions of the client.
    UnexpectedResponse,
    /// An error that does not fit into any of the other categories.
    UnspecifiedError,
}

#[derive(Debug)]
pub(crate) struct Error {
    kind: ErrorKind,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl Error {
    pub(crate) fn from_source(kind: ErrorKind, source: Box<dyn StdError + Send + Sync>) -> Error {
        Error {
            kind,
            source: Some(source),
        }
    }

    pub(crate) fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn message(&self) -> &'static str {
        match self.kind {
            ErrorKind::Connection => "failed to connect to the API service",
            ErrorKind::TimedOut => "request timed out",
            ErrorKind::Authentication => "authentication failed or not provided",
            ErrorKind::ExcessUsage => "rate limit exceeded or credits exhausted",
            ErrorKind::ApiOverloaded => "API server(s) are currently overloaded",
            ErrorKind::NotFound => "the requested resource was not found",
            ErrorKind::BadRequest => "the request was bad or malformed",
            ErrorKind::InternalError => "the server encountered an internal error",
            ErrorKind::UnexpectedResponse => "API response was unexpected or malformed",
            ErrorKind::UnspecifiedError => "an unspecified error occurred",
        }
    }

    /// The error message followed by each of its sources, e.g.
    /// `"authentication failed or not provided: No auth credentials found"`.
    pub(crate) fn describe(&self) -> String {
        let mut description = self.message().to_string();

        let mut source = self.source();

        while let Some(err) = source {
            description.push_str(": ");
            description.push_str(&err.to_string());
            source = err.source();
        }

        description
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| &**e as _)
    }
}

/// A message delta represents a "chunk" of a streamed message.
/// Usually, this consists of a handful of tokens. It is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MessageDelta {
    /// The content of the chunk.
    pub content: String,
}

/// A streamed response from a completion.
///
/// The stream is finite and cannot be restarted. Dropping it before it is
/// exhausted releases the underlying connection.
#[async_trait]
pub(crate) trait AsyncMessageIterator: Send {
    /// The next chunk of the message, or `None` once the model is done.
    async fn next(&mut self) -> Option<Result<MessageDelta, Error>>;
}

/// Per-token prices, as reported by the API (in dollars, as strings).
#[derive(Debug, Clone, Serialize)]
pub(crate) struct Pricing {
    pub prompt: String,
    pub completion: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct Model {
    /// The ID of the model. This must be an acceptable parameter to
    /// [`ChatProvider::stream_completion`].
    pub id: String,
    /// A human-readable name, if the API provides one.
    pub name: Option<String>,
    /// The context length of the model, if known.
    pub context_length: Option<u64>,
    /// Prices, if known.
    pub pricing: Option<Pricing>,
}

/// A trait implemented by all chat providers.
#[async_trait]
pub(crate) trait ChatProvider: Send + Sync {
    /// Returns the text-generating models the chat provider supports.
    async fn models(&self) -> Result<Vec<Model>, Error>;

    /// Takes a series of messages that are part of a chat conversation
    /// and produces a new message generated by the model in response.
    ///
    /// `model`: The id of the model.
    /// `messages`: A series of messages in the conversation.
    ///
    /// Request failures are reported here, before any delta is produced.
    async fn stream_completion(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<Box<dyn AsyncMessageIterator>, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Payload(&'static str);

    impl fmt::Display for Payload {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl StdError for Payload {}

    #[test]
    fn test_describe_includes_sources() {
        let err = Error::from_source(
            ErrorKind::Authentication,
            Box::new(Payload("No auth credentials found")),
        );

        assert_eq!(
            err.describe(),
            "authentication failed or not provided: No auth credentials found"
        );
    }
}
