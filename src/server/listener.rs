//! Listener TCP: aceita conexões e atende cada uma em sua própria task.

use std::future::Future;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::Instrument;
use uuid::Uuid;

use super::connection::{Connection, RequestHandler};
use crate::protocol::WireCodec;
use crate::CalcResult;

/// Socket de escuta de um papel (avaliador ou intermediário).
pub struct Listener {
    listener: TcpListener,
    codec: WireCodec,
}

impl Listener {
    /// Faz o bind em `host:port`. Porta 0 escolhe uma porta livre.
    pub async fn bind(host: &str, port: u16, codec: WireCodec) -> CalcResult<Self> {
        let listener = TcpListener::bind((host, port)).await.map_err(|e| {
            tracing::error!(host, port, error = %e, "Failed to bind listener");
            e
        })?;
        Ok(Self { listener, codec })
    }

    pub fn local_addr(&self) -> CalcResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Aceita conexões até `shutdown` completar.
    ///
    /// `make_handler` cria o handler de cada conexão. Ao sair, espera as
    /// conexões ativas terminarem antes de retornar.
    pub async fn serve<F, H, S>(self, mut make_handler: F, shutdown: S) -> CalcResult<()>
    where
        F: FnMut(SocketAddr) -> H,
        H: RequestHandler + 'static,
        S: Future<Output = ()>,
    {
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        tracing::info!(addr = ?self.listener.local_addr().ok(), "Listening");

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!(active = connections.len(), "Shutting down listener");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
                        }
                        let span = tracing::info_span!("connection", %peer, id = %Uuid::new_v4());
                        let connection = Connection::new(stream, self.codec, make_handler(peer));
                        connections.spawn(
                            async move {
                                tracing::info!("Accepted connection");
                                connection.run().await;
                            }
                            .instrument(span),
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                    }
                },
            }

            // Recolhe conexões já encerradas
            while let Some(finished) = connections.try_join_next() {
                if let Err(e) = finished {
                    tracing::error!(error = %e, "Connection task failed");
                }
            }
        }

        while let Some(finished) = connections.join_next().await {
            if let Err(e) = finished {
                tracing::error!(error = %e, "Connection task failed");
            }
        }

        tracing::info!("Listener stopped");
        Ok(())
    }
}
