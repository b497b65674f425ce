use bytes::Bytes;
use futures_core::Stream;
use reqwest::{Client, IntoUrl, StatusCode};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;

use crate::providers::apireq;
use crate::providers::apireq::{EventStreamParser, ReqwestResponseStreamExt, Url};

#[derive(thiserror::Error, Debug)]
pub(super) enum Error {
    /// The API Base is not a URL that can be used in a network request
    #[error("invalid api base")]
    InvalidApiBase(#[source] reqwest::Error),

    /// Endpoint URL is invalid
    #[error("invalid endpoint")]
    InvalidEndpoint(
        #[from]
        #[source]
        url::ParseError,
    ),

    /// The response stream failed after it was opened
    #[error("failed to read streamed response")]
    StreamParser(
        #[from]
        #[source]
        apireq::EventStreamError,
    ),

    /// Some issue with the request
    #[error("{}", .0)]
    RequestFailed(
        #[from]
        #[source]
        apireq::ReqwestError,
    ),

    /// The request was malformed or missing some required parameters.
    #[error("{}", .0.message)]
    BadRequest(ApiErrorPayload),

    /// The API key is missing, invalid, or was disabled.
    #[error("{}", .0.message)]
    Authentication(ApiErrorPayload),

    /// The account has run out of credits.
    #[error("{}", .0.message)]
    PaymentRequired(ApiErrorPayload),

    /// The input was flagged by moderation, or the key lacks access.
    #[error("{}", .0.message)]
    PermissionDenied(ApiErrorPayload),

    /// Requested resource (usually the model) does not exist.
    #[error("{}", .0.message)]
    NotFound(ApiErrorPayload),

    /// The request took too long to be served.
    #[error("{}", .0.message)]
    RequestTimeout(ApiErrorPayload),

    /// Unable to process the request despite the format being correct.
    #[error("{}", .0.message)]
    UnprocessableEntity(ApiErrorPayload),

    /// You have hit your assigned rate limit.
    #[error("{}", .0.message)]
    RateLimit(ApiErrorPayload),

    /// The API has an internal issue
    #[error("{}", .0.message)]
    InternalError(ApiErrorPayload),

    /// The upstream model is down or returned an invalid response.
    #[error("{}", .0.message)]
    BadGateway(ApiErrorPayload),

    /// No provider is currently able to serve the model.
    #[error("{}", .0.message)]
    ApiOverloaded(ApiErrorPayload),

    /// Some other status was returned by the API
    #[error("{}", .0.message)]
    UnknownStatus(ApiErrorPayload),
}

impl Error {
    fn from_status(status: StatusCode, payload: ApiErrorPayload) -> Error {
        match status.as_u16() {
            400 => Error::BadRequest(payload),
            401 => Error::Authentication(payload),
            402 => Error::PaymentRequired(payload),
            403 => Error::PermissionDenied(payload),
            404 => Error::NotFound(payload),
            408 => Error::RequestTimeout(payload),
            422 => Error::UnprocessableEntity(payload),
            429 => Error::RateLimit(payload),
            500 => Error::InternalError(payload),
            502 => Error::BadGateway(payload),
            503 => Error::ApiOverloaded(payload),
            _ => Error::UnknownStatus(payload),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub(super) enum Role {
    System,
    User,
    Assistant,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub(super) struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/* Structures to serialize /chat/completions */

#[derive(Serialize, Debug)]
struct ChatCompletionRequest<'o> {
    model: &'o str,
    messages: &'o [ChatMessage],
    stream: bool,
}

/* Structures to deserialize /chat/completions */

// Every field is optional: events such as the initial role announcement or
// the final usage report carry no content and are skipped.
#[derive(Deserialize, Debug, Default)]
pub(super) struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub(super) struct Choice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Deserialize, Debug, Default)]
pub(super) struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

impl ChatCompletionChunk {
    fn into_content(mut self) -> Option<String> {
        if self.choices.is_empty() {
            return None;
        }

        let choice = self.choices.swap_remove(0);

        choice.delta.content.filter(|c| !c.is_empty())
    }
}

/* Structures to deserialize /models */

#[derive(Deserialize, Debug, Clone)]
pub(super) struct Pricing {
    pub prompt: String,
    pub completion: String,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub(super) struct Architecture {
    #[serde(default)]
    pub output_modalities: Vec<String>,
}

#[derive(Deserialize, Debug, Clone)]
pub(super) struct ModelEntry {
    pub id: String,
    pub name: Option<String>,
    pub context_length: Option<u64>,
    pub pricing: Option<Pricing>,
    pub architecture: Option<Architecture>,
}

impl ModelEntry {
    /// Whether the model generates text. Entries which do not describe their
    /// architecture are assumed to.
    pub(super) fn produces_text(&self) -> bool {
        match &self.architecture {
            Some(arch) => arch.output_modalities.iter().any(|m| m == "text"),
            None => true,
        }
    }
}

#[derive(Deserialize, Debug)]
struct ModelsResponse {
    data: Vec<ModelEntry>,
}

/* API Errors */

#[derive(Deserialize, Debug)]
pub(super) struct ApiErrorPayload {
    pub message: String,
}

#[derive(Deserialize, Debug)]
struct ApiErrorResponse {
    error: ApiErrorPayload,
}

impl ApiErrorPayload {
    /// The server-reported message if the body carries one, otherwise a
    /// message naming the status code.
    fn from_body(status: StatusCode, body: &[u8]) -> ApiErrorPayload {
        match serde_json::from_slice::<ApiErrorResponse>(body) {
            Ok(response) if !response.error.message.is_empty() => response.error,
            _ => ApiErrorPayload {
                message: format!("request failed with status {}", status.as_u16()),
            },
        }
    }
}

async fn error_from_response(res: reqwest::Response) -> Error {
    let status = res.status();

    let body = match res.bytes().await {
        Ok(body) => body,
        Err(err) => {
            log::debug!("failed to read the error body: {}", err);
            Bytes::new()
        }
    };

    Error::from_status(status, ApiErrorPayload::from_body(status, &body))
}

pub(super) struct StreamingChatResponse<S> {
    stream: EventStreamParser<S>,
}

impl<S, E> StreamingChatResponse<S>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    E: StdError + Send + Sync + 'static,
{
    pub(super) fn new(stream: EventStreamParser<S>) -> StreamingChatResponse<S> {
        StreamingChatResponse { stream }
    }

    /// The next non-empty piece of content.
    pub(super) async fn next(&mut self) -> Option<Result<String, Error>> {
        loop {
            match self.stream.parse::<ChatCompletionChunk>().await? {
                Ok(chunk) => {
                    if let Some(content) = chunk.into_content() {
                        return Some(Ok(content));
                    }
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

pub(crate) const DEFAULT_API_BASE: &'static str = "https://openrouter.ai/api/v1/";

const APP_TITLE: &'static str = "Buddy";

pub(super) struct OpenRouterApi {
    api_base: Url,
    api_key: String,
    client: Client,
}

impl OpenRouterApi {
    pub(super) fn new<U: IntoUrl>(api_key: &str, api_base: U) -> Result<OpenRouterApi, Error> {
        let mut api_base = api_base.into_url().map_err(Error::InvalidApiBase)?;

        // Endpoints are joined relative to the base
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        Ok(OpenRouterApi {
            api_base,
            api_key: api_key.to_string(),
            client: Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.api_base.join(path)?)
    }

    pub(super) async fn streaming_chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<
        StreamingChatResponse<impl Stream<Item = reqwest::Result<Bytes>> + Unpin + Send>,
        Error,
    > {
        let url = self.endpoint("chat/completions")?;

        log::debug!("streaming {} messages to {} via {}", messages.len(), model, url);

        let res = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .header("X-Title", APP_TITLE)
            .json(&ChatCompletionRequest {
                model,
                messages,
                stream: true,
            })
            .send()
            .await
            .map_err(|e| Error::RequestFailed(e.into()))?;

        if res.status().is_success() {
            Ok(StreamingChatResponse::new(res.stream_events()))
        } else {
            Err(error_from_response(res).await)
        }
    }

    pub(super) async fn models(&self) -> Result<Vec<ModelEntry>, Error> {
        let url = self.endpoint("models")?;

        let res = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| Error::RequestFailed(e.into()))?;

        if !res.status().is_success() {
            return Err(error_from_response(res).await);
        }

        let models: ModelsResponse = res
            .json()
            .await
            .map_err(|e| Error::RequestFailed(e.into()))?;

        Ok(models.data)
    }
}
