//! Loop de uma conexão: lê requisições, delega ao handler e responde.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::protocol::{FramedTransport, Message, WireCodec};
use crate::CalcError;

/// Lógica de um papel (avaliador ou intermediário) para uma conexão.
///
/// Cada conexão recebe seu próprio handler, então estado por conexão
/// (como o link com a origem) fica no `&mut self`.
#[async_trait]
pub trait RequestHandler: Send {
    /// Produz a resposta para uma requisição comum.
    ///
    /// Um `Err` vira uma resposta de erro montada por [`error_response`].
    ///
    /// [`error_response`]: RequestHandler::error_response
    async fn handle(&mut self, request: Message) -> crate::CalcResult<Message>;

    /// Produz a confirmação de um pedido de encerramento.
    ///
    /// A conexão é fechada logo depois de enviá-la.
    async fn terminate(&mut self, request: Message) -> Message;

    /// Resposta enviada quando a troca falha.
    fn error_response(&self, err: &CalcError) -> Message {
        Message::from_error(err.status_code(), err, false, 0)
    }
}

/// Uma conexão aceita, com seu handler.
pub struct Connection<S, H> {
    transport: FramedTransport<S>,
    handler: H,
}

impl<S, H> Connection<S, H>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
    H: RequestHandler,
{
    pub fn new(stream: S, codec: WireCodec, handler: H) -> Self {
        Self {
            transport: FramedTransport::new(stream, codec),
            handler,
        }
    }

    /// Atende a conexão até o peer fechar, pedir encerramento ou a escrita falhar.
    ///
    /// Um frame que não decodifica recebe `CLIENT_ERROR` e a conexão segue;
    /// um frame acima do limite também recebe `CLIENT_ERROR`, mas encerra a
    /// conexão, já que o corpo não lido deixaria o stream fora de sincronia.
    pub async fn run(mut self) {
        loop {
            let frame = match self.transport.read_frame().await {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!("Connection closed by peer");
                    break;
                }
                Err(e @ CalcError::FrameTooLarge { .. }) => {
                    tracing::warn!(error = %e, "Rejecting oversized frame");
                    let _ = self.reply_error(&e).await;
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to read frame");
                    break;
                }
            };

            let request = match self.transport.codec().decode(&frame) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(error = %e, bytes = frame.len(), "Failed to decode frame");
                    if self.reply_error(&e).await.is_err() {
                        break;
                    }
                    continue;
                }
            };

            if request.is_termination() {
                tracing::info!("Peer requested termination");
                let ack = self.handler.terminate(request).await;
                if let Err(e) = self.transport.send(&ack).await {
                    tracing::warn!(error = %e, "Failed to acknowledge termination");
                }
                break;
            }

            if !request.is_request {
                let err = CalcError::ProtocolViolation(
                    "received a response where a request was expected".to_string(),
                );
                tracing::warn!(error = %err, "Ignoring response-shaped message");
                if self.reply_error(&err).await.is_err() {
                    break;
                }
                continue;
            }

            tracing::debug!(bytes = frame.len(), show_steps = request.show_steps, "Got request");

            let response = match self.handler.handle(request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "Request failed");
                    self.handler.error_response(&e)
                }
            };

            if let Err(e) = self.transport.send(&response).await {
                tracing::error!(error = %e, "Failed to send response");
                // A resposta pode ter falhado só na codificação (ex.: rastro grande demais)
                if self.reply_error(&e).await.is_err() {
                    break;
                }
            }
        }
    }

    async fn reply_error(&mut self, err: &CalcError) -> crate::CalcResult<()> {
        let response = self.handler.error_response(err);
        self.transport.send(&response).await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to send error response");
            e
        })
    }
}
