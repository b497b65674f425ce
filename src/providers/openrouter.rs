//! An umbrella module for the OpenRouter provider, or any other API which
//! speaks the same OpenAI-style `/chat/completions` and `/models` dialect.

mod api;
mod provider;

pub(crate) use self::api::DEFAULT_API_BASE;
pub(crate) use self::provider::OpenRouterProvider;
