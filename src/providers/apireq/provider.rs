//! Conversions between Reqwest API errors and provider error types

use crate::providers::apireq::{
    error::ErrorKind as ReqwestErrorKind, EventStreamError, ReqwestError,
};
use crate::providers::{Error, ErrorKind};

impl From<EventStreamError> for Error {
    fn from(value: EventStreamError) -> Self {
        match value {
            EventStreamError::ResponseExceededBuffer => {
                Error::from_source(ErrorKind::UnexpectedResponse, Box::new(value))
            }
            // Network failures keep their reqwest classification
            EventStreamError::StreamFailed(source) => match source.downcast::<reqwest::Error>() {
                Ok(err) => ReqwestError::new(*err).into(),
                Err(source) => Error::from_source(
                    ErrorKind::UnspecifiedError,
                    Box::new(EventStreamError::StreamFailed(source)),
                ),
            },
        }
    }
}

impl From<ReqwestError> for Error {
    fn from(value: ReqwestError) -> Self {
        let kind: ErrorKind = match &value.kind() {
            ReqwestErrorKind::ConnectFailed => ErrorKind::Connection,
            ReqwestErrorKind::BodyUnreadable
            | ReqwestErrorKind::DecodingFailed
            | ReqwestErrorKind::RedirectPolicyViolated => ErrorKind::UnexpectedResponse,
            ReqwestErrorKind::TimedOut => ErrorKind::TimedOut,
            ReqwestErrorKind::UnknownReqwestError => ErrorKind::UnspecifiedError,
        };

        Error::from_source(kind, Box::new(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_stream_failure_kinds() {
        let err: Error = EventStreamError::ResponseExceededBuffer.into();
        assert_eq!(err.kind(), ErrorKind::UnexpectedResponse);

        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        let err: Error = EventStreamError::StreamFailed(Box::new(reset)).into();

        assert_eq!(err.kind(), ErrorKind::UnspecifiedError);
        assert!(err.describe().contains("the source stream failed: reset"));
    }
}
