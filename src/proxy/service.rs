//! Papel de intermediário por conexão.

use std::sync::Arc;

use async_trait::async_trait;

use super::intermediary::CachingIntermediary;
use super::origin::Origin;
use crate::protocol::Message;
use crate::server::RequestHandler;
use crate::CalcResult;

/// Handler de uma conexão cliente do intermediário.
///
/// O cache é compartilhado; o link com a origem é exclusivo da conexão.
pub struct IntermediaryService<O> {
    intermediary: Arc<CachingIntermediary>,
    origin: O,
}

impl<O: Origin> IntermediaryService<O> {
    pub fn new(intermediary: Arc<CachingIntermediary>, origin: O) -> Self {
        Self {
            intermediary,
            origin,
        }
    }
}

#[async_trait]
impl<O: Origin> RequestHandler for IntermediaryService<O> {
    async fn handle(&mut self, request: Message) -> CalcResult<Message> {
        let key = CachingIntermediary::key_for(&request).fingerprint();
        let exchange = self.intermediary.process(&request, &mut self.origin).await?;

        tracing::info!(
            key = %key,
            outcome = %exchange.outcome,
            age = exchange.freshness.age,
            server_remaining = %exchange.freshness.server_remaining,
            client_remaining = %exchange.freshness.client_remaining,
            stored = exchange.stored,
            status = %exchange.response.status,
            "Served request"
        );

        let stats = self.intermediary.cache().stats();
        tracing::debug!(
            entries = stats.entries,
            hits = stats.hits,
            misses = stats.misses,
            hit_rate = stats.hit_rate(),
            "Cache stats"
        );

        Ok(exchange.response)
    }

    async fn terminate(&mut self, request: Message) -> Message {
        match self.origin.close(&request).await {
            Ok(Some(ack)) => {
                tracing::info!("Origin acknowledged termination");
                ack
            }
            Ok(None) => Message::termination_ack(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to forward termination to origin");
                Message::termination_ack()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ResponseCache;
    use crate::protocol::{StatusCode, MAX_CACHE_CONTROL};
    use crate::{CalcError, CalcResult};

    #[derive(Default)]
    struct RecordingOrigin {
        linked: bool,
        closed: bool,
    }

    #[async_trait]
    impl Origin for RecordingOrigin {
        async fn round_trip(&mut self, _request: &Message) -> CalcResult<Message> {
            self.linked = true;
            Message::from_result(1.0, Vec::new(), true, MAX_CACHE_CONTROL)
        }

        async fn close(&mut self, _termination: &Message) -> CalcResult<Option<Message>> {
            if !self.linked {
                return Ok(None);
            }
            self.closed = true;
            let mut ack = Message::termination_ack();
            ack.cache_control = 7;
            Ok(Some(ack))
        }
    }

    struct DownOrigin;

    #[async_trait]
    impl Origin for DownOrigin {
        async fn round_trip(&mut self, _request: &Message) -> CalcResult<Message> {
            Err(CalcError::origin("connection refused"))
        }

        async fn close(&mut self, _termination: &Message) -> CalcResult<Option<Message>> {
            Err(CalcError::origin("connection refused"))
        }
    }

    fn intermediary() -> Arc<CachingIntermediary> {
        Arc::new(CachingIntermediary::new(Arc::new(ResponseCache::new())))
    }

    fn request() -> Message {
        Message::from_expression(&2.into(), false, true, MAX_CACHE_CONTROL).unwrap()
    }

    #[tokio::test]
    async fn test_termination_without_origin_link_is_acked_locally() {
        let mut service = IntermediaryService::new(intermediary(), RecordingOrigin::default());

        let ack = service.terminate(Message::termination()).await;
        assert_eq!(ack.data, b"EXIT");
        assert_eq!(ack.cache_control, 0);
        assert!(!service.origin.closed);
    }

    #[tokio::test]
    async fn test_termination_is_relayed_through_open_link() {
        let mut service = IntermediaryService::new(intermediary(), RecordingOrigin::default());
        service.handle(request()).await.unwrap();

        let ack = service.terminate(Message::termination()).await;
        assert_eq!(ack.cache_control, 7);
        assert!(service.origin.closed);
    }

    #[tokio::test]
    async fn test_origin_failure_surfaces_as_server_error() {
        let mut service = IntermediaryService::new(intermediary(), DownOrigin);

        let err = service.handle(request()).await.unwrap_err();
        let response = service.error_response(&err);
        assert_eq!(response.status, StatusCode::ServerError);
        assert!(response.error_text().contains("connection refused"));

        // Encerramento ainda é confirmado
        let ack = service.terminate(Message::termination()).await;
        assert_eq!(ack.data, b"EXIT");
    }
}
