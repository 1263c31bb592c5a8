//! Link do intermediário com o avaliador de origem.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::protocol::{FramedTransport, Message, WireCodec};
use crate::{CalcError, CalcResult};

/// Destino das requisições que o cache não consegue responder.
#[async_trait]
pub trait Origin: Send {
    /// Envia `request` e espera a resposta correspondente.
    async fn round_trip(&mut self, request: &Message) -> CalcResult<Message>;

    /// Repassa um pedido de encerramento se houver link aberto.
    ///
    /// Retorna a confirmação da origem, ou `None` se não havia link.
    async fn close(&mut self, termination: &Message) -> CalcResult<Option<Message>>;
}

/// Origem TCP com conexão preguiçosa.
///
/// A conexão é aberta na primeira requisição e reaproveitada nas seguintes.
/// Depois de qualquer falha o link é descartado e reaberto na próxima vez.
pub struct TcpOrigin {
    host: String,
    port: u16,
    codec: WireCodec,
    timeout: Duration,
    link: Option<FramedTransport<TcpStream>>,
}

impl TcpOrigin {
    pub fn new(host: impl Into<String>, port: u16, codec: WireCodec) -> Self {
        Self {
            host: host.into(),
            port,
            codec,
            timeout: Duration::from_secs(10),
            link: None,
        }
    }

    /// Define o prazo de conexão + ida e volta.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    async fn link(&mut self) -> CalcResult<&mut FramedTransport<TcpStream>> {
        if self.link.is_none() {
            let stream = TcpStream::connect((self.host.as_str(), self.port))
                .await
                .map_err(|e| {
                    CalcError::origin(format!("cannot connect to {}:{}: {e}", self.host, self.port))
                })?;
            stream.set_nodelay(true)?;
            tracing::info!(host = %self.host, port = self.port, "Connected to origin");
            self.link = Some(FramedTransport::new(stream, self.codec));
        }

        self.link
            .as_mut()
            .ok_or_else(|| CalcError::origin("origin link unavailable"))
    }

    async fn exchange(&mut self, request: &Message) -> CalcResult<Message> {
        let link = self.link().await?;

        link.send(request)
            .await
            .map_err(|e| CalcError::origin(format!("failed to send request: {e}")))?;

        match link.recv().await {
            Ok(Some(response)) if response.is_request => Err(CalcError::origin(
                "malformed response: origin answered with a request",
            )),
            Ok(Some(response)) => Ok(response),
            Ok(None) => Err(CalcError::origin("origin closed the connection")),
            Err(e) => Err(CalcError::origin(format!("malformed response: {e}"))),
        }
    }
}

#[async_trait]
impl Origin for TcpOrigin {
    async fn round_trip(&mut self, request: &Message) -> CalcResult<Message> {
        let timeout = self.timeout;
        let result = tokio::time::timeout(timeout, self.exchange(request)).await;

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                self.link = None;
                Err(e)
            }
            Err(_) => {
                self.link = None;
                Err(CalcError::origin(format!(
                    "no response within {}s",
                    timeout.as_secs_f64()
                )))
            }
        }
    }

    async fn close(&mut self, termination: &Message) -> CalcResult<Option<Message>> {
        if self.link.is_none() {
            return Ok(None);
        }

        let result = self.round_trip(termination).await;
        self.link = None;
        result.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::StatusCode;
    use tokio::net::TcpListener;

    /// Origem falsa que responde `OK` com o payload recebido.
    async fn spawn_echo_origin() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = FramedTransport::new(stream, WireCodec::default());
            while let Ok(Some(request)) = transport.recv().await {
                let mut response = Message::termination_ack();
                response.data = request.data.clone();
                transport.send(&response).await.unwrap();
            }
        });
        port
    }

    fn request(data: &[u8]) -> Message {
        Message {
            data: data.to_vec(),
            ..Message::termination()
        }
    }

    #[tokio::test]
    async fn test_lazy_connect_and_reuse() {
        let port = spawn_echo_origin().await;
        let mut origin = TcpOrigin::new("127.0.0.1", port, WireCodec::default());
        assert!(!origin.is_connected());

        for data in [&b"one"[..], b"two"] {
            let response = origin.round_trip(&request(data)).await.unwrap();
            assert_eq!(response.data, data);
            assert_eq!(response.status, StatusCode::Ok);
        }
        // A origem falsa só aceita uma conexão: a segunda ida reaproveitou o link
        assert!(origin.is_connected());
    }

    #[tokio::test]
    async fn test_close_without_link_returns_none() {
        let mut origin = TcpOrigin::new("127.0.0.1", 9, WireCodec::default());
        assert!(origin.close(&Message::termination()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unreachable_origin() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut origin = TcpOrigin::new("127.0.0.1", port, WireCodec::default());
        let err = origin.round_trip(&request(b"x")).await.unwrap_err();
        assert!(matches!(err, CalcError::OriginUnreachable(_)));
        assert!(!origin.is_connected());
    }

    #[tokio::test]
    async fn test_silent_origin_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut origin = TcpOrigin::new("127.0.0.1", port, WireCodec::default())
            .with_timeout(Duration::from_millis(100));
        let err = origin.round_trip(&request(b"x")).await.unwrap_err();
        assert!(err.to_string().contains("no response"));
    }
}
