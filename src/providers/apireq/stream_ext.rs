use super::EventStreamParser;
use futures_util::Stream;
use std::marker::Unpin;

pub(crate) trait ReqwestResponseStreamExt {
    fn stream_events(
        self,
    ) -> EventStreamParser<impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin + Send>;
}

impl ReqwestResponseStreamExt for reqwest::Response {
    fn stream_events(
        self,
    ) -> EventStreamParser<impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin + Send>
    {
        EventStreamParser::new(self.bytes_stream())
    }
}
