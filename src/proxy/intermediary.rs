//! Decisão de cache do intermediário.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;

use super::origin::Origin;
use crate::cache::{CacheKey, Freshness, Lookup, ResponseCache};
use crate::protocol::Message;
use crate::{CalcError, CalcResult};

/// Relógio em segundos Unix.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Como uma requisição foi atendida.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Servida do cache, sem contato com a origem.
    Hit,
    /// Nada utilizável no cache (ou recarga forçada); buscada na origem.
    MissFetched,
    /// A entrada existia mas estava velha; buscada de novo.
    MissStaleRefetched,
}

impl fmt::Display for CacheOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CacheOutcome::Hit => "hit",
            CacheOutcome::MissFetched => "miss",
            CacheOutcome::MissStaleRefetched => "stale",
        };
        f.write_str(label)
    }
}

/// Resultado de uma troca pelo intermediário.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub response: Message,
    pub outcome: CacheOutcome,
    /// Frescor da resposta devolvida, no instante em que foi decidido.
    pub freshness: Freshness,
    /// A resposta foi gravada no cache nesta troca.
    pub stored: bool,
}

/// Cache compartilhado + política de frescor.
///
/// Uma instância é compartilhada entre todas as conexões do intermediário;
/// cada conexão traz sua própria [`Origin`].
pub struct CachingIntermediary {
    cache: Arc<ResponseCache>,
    clock: Clock,
}

impl CachingIntermediary {
    pub fn new(cache: Arc<ResponseCache>) -> Self {
        Self::with_clock(cache, Arc::new(|| Utc::now().timestamp()))
    }

    pub fn with_clock(cache: Arc<ResponseCache>, clock: Clock) -> Self {
        Self { cache, clock }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Atende `request` pelo cache ou pela origem.
    ///
    /// 1. `cache_control == 0` pula o cache.
    /// 2. Uma entrada fresca para os dois lados é devolvida sem tocar a origem.
    /// 3. Caso contrário a requisição vai para a origem; a resposta é gravada
    ///    se requisição e resposta aceitarem cache e ela ainda estiver fresca.
    ///
    /// Falha da origem não grava nada e é propagada.
    pub async fn process<O>(&self, request: &Message, origin: &mut O) -> CalcResult<Exchange>
    where
        O: Origin + ?Sized,
    {
        if !request.is_request {
            return Err(CalcError::ProtocolViolation(
                "expected a request, got a response".to_string(),
            ));
        }

        let stale = match self.cache.lookup(request, (self.clock)()) {
            Lookup::Fresh {
                response,
                freshness,
            } => {
                return Ok(Exchange {
                    response,
                    outcome: CacheOutcome::Hit,
                    freshness,
                    stored: false,
                });
            }
            Lookup::Stale(_) => true,
            Lookup::Absent | Lookup::Bypass => false,
        };

        let response = origin.round_trip(request).await?;
        if response.is_request {
            return Err(CalcError::origin(
                "malformed response: origin answered with a request",
            ));
        }

        let (stored, freshness) = self
            .cache
            .store_if_agreed(request, &response, (self.clock)());

        Ok(Exchange {
            response,
            outcome: if stale {
                CacheOutcome::MissStaleRefetched
            } else {
                CacheOutcome::MissFetched
            },
            freshness,
            stored,
        })
    }

    /// Chave usada para `request`, para logs.
    pub fn key_for(request: &Message) -> CacheKey {
        CacheKey::for_request(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Remaining;
    use crate::expr::BinaryOp;
    use crate::protocol::{StatusCode, MAX_CACHE_CONTROL};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicI64, Ordering};

    const T: i64 = 1_700_000_000;

    /// Origem falsa: devolve respostas fixas carimbadas com o relógio de teste.
    struct ScriptedOrigin {
        now: Arc<AtomicI64>,
        cache_result: bool,
        cache_control: u32,
        calls: usize,
        fail: bool,
        answer_with_request: bool,
    }

    impl ScriptedOrigin {
        fn new(now: &Arc<AtomicI64>, cache_result: bool, cache_control: u32) -> Self {
            Self {
                now: Arc::clone(now),
                cache_result,
                cache_control,
                calls: 0,
                fail: false,
                answer_with_request: false,
            }
        }
    }

    #[async_trait]
    impl Origin for ScriptedOrigin {
        async fn round_trip(&mut self, request: &Message) -> CalcResult<Message> {
            self.calls += 1;
            if self.fail {
                return Err(CalcError::origin("connection refused"));
            }
            if self.answer_with_request {
                return Ok(request.clone());
            }
            let response = Message::from_result(
                self.calls as f64,
                Vec::new(),
                self.cache_result,
                self.cache_control,
            )?;
            Ok(response.with_time_stamp(self.now.load(Ordering::SeqCst)))
        }

        async fn close(&mut self, _termination: &Message) -> CalcResult<Option<Message>> {
            Ok(None)
        }
    }

    fn setup() -> (CachingIntermediary, Arc<AtomicI64>) {
        let now = Arc::new(AtomicI64::new(T));
        let clock_now = Arc::clone(&now);
        let intermediary = CachingIntermediary::with_clock(
            Arc::new(ResponseCache::new()),
            Arc::new(move || clock_now.load(Ordering::SeqCst)),
        );
        (intermediary, now)
    }

    fn request(cache_result: bool, cache_control: u32) -> Message {
        Message::from_expression(&BinaryOp::Add.of(2, 3), true, cache_result, cache_control)
            .unwrap()
    }

    #[tokio::test]
    async fn test_hit_skips_origin() {
        let (intermediary, now) = setup();
        let mut origin = ScriptedOrigin::new(&now, true, 100);
        let req = request(true, MAX_CACHE_CONTROL);

        let first = intermediary.process(&req, &mut origin).await.unwrap();
        assert_eq!(first.outcome, CacheOutcome::MissFetched);
        assert!(first.stored);

        now.store(T + 99, Ordering::SeqCst);
        let second = intermediary.process(&req, &mut origin).await.unwrap();
        assert_eq!(second.outcome, CacheOutcome::Hit);
        assert_eq!(second.response, first.response);
        assert_eq!(second.freshness.server_remaining, Remaining::Seconds(1));
        assert_eq!(origin.calls, 1);
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched() {
        let (intermediary, now) = setup();
        let mut origin = ScriptedOrigin::new(&now, true, 100);
        let req = request(true, MAX_CACHE_CONTROL);

        intermediary.process(&req, &mut origin).await.unwrap();

        now.store(T + 101, Ordering::SeqCst);
        let refetched = intermediary.process(&req, &mut origin).await.unwrap();
        assert_eq!(refetched.outcome, CacheOutcome::MissStaleRefetched);
        assert!(refetched.stored);
        assert_eq!(refetched.response.to_result().unwrap().result, 2.0);
        assert_eq!(origin.calls, 2);
    }

    #[tokio::test]
    async fn test_client_tolerance_forces_refetch() {
        let (intermediary, now) = setup();
        let mut origin = ScriptedOrigin::new(&now, true, MAX_CACHE_CONTROL);

        intermediary
            .process(&request(true, MAX_CACHE_CONTROL), &mut origin)
            .await
            .unwrap();

        now.store(T + 30, Ordering::SeqCst);
        let strict = intermediary
            .process(&request(true, 10), &mut origin)
            .await
            .unwrap();
        assert_eq!(strict.outcome, CacheOutcome::MissStaleRefetched);
        assert_eq!(origin.calls, 2);
    }

    #[tokio::test]
    async fn test_zero_cache_control_always_fetches() {
        let (intermediary, now) = setup();
        let mut origin = ScriptedOrigin::new(&now, true, MAX_CACHE_CONTROL);

        intermediary
            .process(&request(true, MAX_CACHE_CONTROL), &mut origin)
            .await
            .unwrap();
        let reload = intermediary
            .process(&request(true, 0), &mut origin)
            .await
            .unwrap();

        assert_eq!(reload.outcome, CacheOutcome::MissFetched);
        assert!(!reload.stored);
        assert_eq!(origin.calls, 2);
    }

    #[tokio::test]
    async fn test_no_store_when_either_side_refuses() {
        let (intermediary, now) = setup();

        let mut refusing_origin = ScriptedOrigin::new(&now, false, MAX_CACHE_CONTROL);
        let exchange = intermediary
            .process(&request(true, MAX_CACHE_CONTROL), &mut refusing_origin)
            .await
            .unwrap();
        assert!(!exchange.stored);

        let mut origin = ScriptedOrigin::new(&now, true, MAX_CACHE_CONTROL);
        let exchange = intermediary
            .process(&request(false, MAX_CACHE_CONTROL), &mut origin)
            .await
            .unwrap();
        assert!(!exchange.stored);

        assert!(intermediary.cache().is_empty());
    }

    #[tokio::test]
    async fn test_show_steps_is_part_of_the_key() {
        let (intermediary, now) = setup();
        let mut origin = ScriptedOrigin::new(&now, true, MAX_CACHE_CONTROL);

        let with_steps = request(true, MAX_CACHE_CONTROL);
        let mut without_steps = with_steps.clone();
        without_steps.show_steps = false;

        intermediary.process(&with_steps, &mut origin).await.unwrap();
        let other = intermediary.process(&without_steps, &mut origin).await.unwrap();
        assert_eq!(other.outcome, CacheOutcome::MissFetched);
        assert_eq!(intermediary.cache().len(), 2);
    }

    #[tokio::test]
    async fn test_origin_failure_stores_nothing() {
        let (intermediary, now) = setup();
        let mut origin = ScriptedOrigin::new(&now, true, MAX_CACHE_CONTROL);
        origin.fail = true;

        let err = intermediary
            .process(&request(true, MAX_CACHE_CONTROL), &mut origin)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::ServerError);
        assert!(intermediary.cache().is_empty());
    }

    #[tokio::test]
    async fn test_request_shaped_origin_reply_is_rejected() {
        let (intermediary, now) = setup();
        let mut origin = ScriptedOrigin::new(&now, true, MAX_CACHE_CONTROL);
        origin.answer_with_request = true;

        let err = intermediary
            .process(&request(true, MAX_CACHE_CONTROL), &mut origin)
            .await
            .unwrap_err();
        assert!(matches!(err, CalcError::OriginUnreachable(_)));
        assert!(intermediary.cache().is_empty());
    }

    #[tokio::test]
    async fn test_response_is_not_processed() {
        let (intermediary, now) = setup();
        let mut origin = ScriptedOrigin::new(&now, true, MAX_CACHE_CONTROL);

        let err = intermediary
            .process(&Message::termination_ack(), &mut origin)
            .await
            .unwrap_err();
        assert!(matches!(err, CalcError::ProtocolViolation(_)));
        assert_eq!(origin.calls, 0);
    }
}
