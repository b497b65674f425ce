use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;
use reqwest::IntoUrl;

use crate::chat::{Message, Role};
use crate::providers::openrouter::api;
use crate::providers::{
    AsyncMessageIterator, ChatProvider, Error, ErrorKind, MessageDelta, Model, Pricing,
};

impl From<api::Error> for Error {
    fn from(value: api::Error) -> Self {
        let kind = match &value {
            api::Error::Authentication(_) | api::Error::PermissionDenied(_) => {
                Some(ErrorKind::Authentication)
            }
            api::Error::BadRequest(_)
            | api::Error::InvalidApiBase(_)
            | api::Error::InvalidEndpoint(_)
            | api::Error::UnprocessableEntity(_) => Some(ErrorKind::BadRequest),
            api::Error::PaymentRequired(_) | api::Error::RateLimit(_) => {
                Some(ErrorKind::ExcessUsage)
            }
            api::Error::InternalError(_) | api::Error::BadGateway(_) => {
                Some(ErrorKind::InternalError)
            }
            api::Error::NotFound(_) => Some(ErrorKind::NotFound),
            api::Error::RequestTimeout(_) => Some(ErrorKind::TimedOut),
            api::Error::ApiOverloaded(_) => Some(ErrorKind::ApiOverloaded),
            api::Error::UnknownStatus(_) => Some(ErrorKind::UnspecifiedError),

            api::Error::RequestFailed(_) => None,
            api::Error::StreamParser(_) => None,
        };

        match (value, kind) {
            (api::Error::RequestFailed(err), _) => err.into(),
            (api::Error::StreamParser(err), _) => err.into(),
            (value, Some(kind)) => Error::from_source(kind, Box::new(value)),
            (value, None) => Error::from_source(ErrorKind::UnspecifiedError, Box::new(value)),
        }
    }
}

impl From<Role> for api::Role {
    fn from(value: Role) -> Self {
        match value {
            Role::System => api::Role::System,
            Role::User => api::Role::User,
            Role::Assistant => api::Role::Assistant,
        }
    }
}

impl From<api::ModelEntry> for Model {
    fn from(value: api::ModelEntry) -> Self {
        Model {
            id: value.id,
            name: value.name,
            context_length: value.context_length,
            pricing: value.pricing.map(|p| Pricing {
                prompt: p.prompt,
                completion: p.completion,
            }),
        }
    }
}

pub(crate) struct OpenRouterProvider {
    api: api::OpenRouterApi,
}

impl OpenRouterProvider {
    pub(crate) fn new<U: IntoUrl>(api_key: &str, api_base: U) -> Result<OpenRouterProvider, Error> {
        Ok(OpenRouterProvider {
            api: api::OpenRouterApi::new(api_key, api_base)?,
        })
    }
}

pub(crate) struct OpenRouterCompletionResponse<S> {
    inner: api::StreamingChatResponse<S>,
}

#[async_trait]
impl<S> AsyncMessageIterator for OpenRouterCompletionResponse<S>
where
    S: Stream<Item = reqwest::Result<Bytes>> + Unpin + Send,
{
    async fn next(&mut self) -> Option<Result<MessageDelta, Error>> {
        match self.inner.next().await? {
            Ok(content) => Some(Ok(MessageDelta { content })),
            Err(err) => Some(Err(err.into())),
        }
    }
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    async fn models(&self) -> Result<Vec<Model>, Error> {
        let models = self.api.models().await?;

        Ok(models
            .into_iter()
            .filter(|m| m.produces_text())
            .map(Model::from)
            .collect())
    }

    async fn stream_completion(
        &self,
        model: &str,
        messages: &[Message],
    ) -> Result<Box<dyn AsyncMessageIterator>, Error> {
        let messages: Vec<api::ChatMessage> = messages
            .iter()
            .map(|m| api::ChatMessage {
                role: m.role.into(),
                content: m.content.clone(),
            })
            .collect();

        let inner = self.api.streaming_chat_completion(model, &messages).await?;

        Ok(Box::new(OpenRouterCompletionResponse { inner }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::openrouter::api::tests::{content_event, serve_once};

    #[tokio::test]
    async fn test_stream_completion() {
        let body = format!(
            "{}{}data: [DONE]\n\n",
            content_event("I'm doing"),
            content_event(" well!")
        );

        let (base, server) = serve_once("200 OK", body).await;

        let provider = OpenRouterProvider::new("sk-test", base.as_str()).unwrap();

        let messages = [
            Message::system("You are Buddy.".to_string()),
            Message::user("How are you?".to_string()),
        ];

        let mut completion = provider
            .stream_completion("test/model", &messages)
            .await
            .expect("request should succeed");

        let mut deltas = Vec::new();

        while let Some(delta) = completion.next().await {
            deltas.push(delta.unwrap().content);
        }

        assert_eq!(deltas, vec!["I'm doing", " well!"]);

        let request = server.await.unwrap();
        let sent: serde_json::Value = serde_json::from_slice(&request.body).unwrap();

        assert_eq!(sent["messages"][0]["role"], "system");
        assert_eq!(sent["messages"][1]["content"], "How are you?");
    }

    #[tokio::test]
    async fn test_authentication_error_kind() {
        let (base, server) = serve_once(
            "401 Unauthorized",
            r#"{"error":{"message":"No auth credentials found","code":401}}"#.to_string(),
        )
        .await;

        let provider = OpenRouterProvider::new("bad-key", base.as_str()).unwrap();

        let err = match provider.stream_completion("test/model", &[]).await {
            Err(err) => err,
            Ok(_) => panic!("request should fail"),
        };

        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(
            err.describe(),
            "authentication failed or not provided: No auth credentials found"
        );

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_models() {
        let body = r#"{"data":[
            {"id":"a/text","name":"Text","context_length":8192,
             "pricing":{"prompt":"0.000001","completion":"0.000002"},
             "architecture":{"output_modalities":["text"]}},
            {"id":"b/image","architecture":{"output_modalities":["image"]}}
        ]}"#;

        let (base, server) = serve_once("200 OK", body.to_string()).await;

        let provider = OpenRouterProvider::new("sk-test", base.as_str()).unwrap();

        let models = provider.models().await.expect("listing should succeed");

        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "a/text");
        assert_eq!(models[0].context_length, Some(8192));
        assert_eq!(models[0].pricing.as_ref().unwrap().completion, "0.000002");

        let request = server.await.unwrap();

        assert!(request.head.starts_with("GET /api/v1/models "));
    }
}
