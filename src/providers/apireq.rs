//! A utility module with helpers for making and parsing API requests.

mod error;
mod event_stream;
mod provider;
mod stream_ext;

pub(crate) use error::Error as ReqwestError;
pub(crate) use reqwest::Url;

pub(crate) use event_stream::Error as EventStreamError;
pub(crate) use event_stream::EventStreamParser;
pub(crate) use stream_ext::ReqwestResponseStreamExt;

#[cfg(test)]
pub(crate) use event_stream::tests::{chunked, split_at, MockStream};
