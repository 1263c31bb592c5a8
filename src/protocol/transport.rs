//! Transporte de frames sobre um stream de bytes.
//!
//! Cada frame começa com o prefixo de tamanho, então uma leitura nunca
//! atravessa a fronteira entre duas mensagens.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::codec::WireCodec;
use super::message::Message;
use super::LENGTH_PREFIX_SIZE;
use crate::{CalcError, CalcResult};

/// Lê e escreve frames completos em um stream.
pub struct FramedTransport<S> {
    stream: S,
    codec: WireCodec,
}

impl<S> FramedTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S, codec: WireCodec) -> Self {
        Self { stream, codec }
    }

    pub fn codec(&self) -> WireCodec {
        self.codec
    }

    /// Lê um frame completo.
    ///
    /// Retorna `Ok(None)` quando o outro lado fecha o stream entre frames.
    /// Um frame acima do limite é recusado apenas pelo prefixo, antes de
    /// qualquer byte do corpo ser lido.
    pub async fn read_frame(&mut self) -> CalcResult<Option<Vec<u8>>> {
        let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
        let mut filled = 0;
        while filled < LENGTH_PREFIX_SIZE {
            let n = self.stream.read(&mut prefix[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(CalcError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "stream closed inside a length prefix",
                )));
            }
            filled += n;
        }

        let size = LENGTH_PREFIX_SIZE + u32::from_be_bytes(prefix) as usize;
        if size > self.codec.max_frame_size() {
            return Err(CalcError::FrameTooLarge {
                size,
                max: self.codec.max_frame_size(),
            });
        }

        let mut frame = vec![0u8; size];
        frame[..LENGTH_PREFIX_SIZE].copy_from_slice(&prefix);
        self.stream.read_exact(&mut frame[LENGTH_PREFIX_SIZE..]).await?;

        tracing::trace!(bytes = size, "Read frame");
        Ok(Some(frame))
    }

    /// Escreve um frame já codificado.
    pub async fn write_frame(&mut self, frame: &[u8]) -> CalcResult<()> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;

        tracing::trace!(bytes = frame.len(), "Wrote frame");
        Ok(())
    }

    /// Codifica e envia uma mensagem.
    pub async fn send(&mut self, message: &Message) -> CalcResult<()> {
        let frame = self.codec.encode(message)?;
        self.write_frame(&frame).await
    }

    /// Recebe e decodifica uma mensagem; `Ok(None)` no fim do stream.
    pub async fn recv(&mut self) -> CalcResult<Option<Message>> {
        match self.read_frame().await? {
            Some(frame) => self.codec.decode(&frame).map(Some),
            None => Ok(None),
        }
    }

    /// Devolve o stream subjacente.
    pub fn into_inner(self) -> S {
        self.stream
    }
}
