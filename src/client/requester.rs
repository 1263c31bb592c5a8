//! Requisitante: envia expressões e interpreta as respostas.

use tokio::net::TcpStream;

use super::render::render_trace;
use crate::expr::Expression;
use crate::protocol::{FramedTransport, Message, StatusCode, WireCodec, MAX_CACHE_CONTROL};
use crate::types::config::ClientConfig;
use crate::{CalcError, CalcResult};

/// Opções anunciadas em cada requisição.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    pub show_steps: bool,
    pub cache_result: bool,
    pub cache_control: u32,
}

impl RequestOptions {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            show_steps: config.show_steps,
            cache_result: config.cache_result,
            cache_control: config.cache_control,
        }
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            show_steps: true,
            cache_result: true,
            cache_control: MAX_CACHE_CONTROL,
        }
    }
}

/// Resultado de uma avaliação remota.
#[derive(Debug, Clone, PartialEq)]
pub struct Computation {
    pub value: f64,
    /// Vazio se o rastro não foi pedido ou a expressão era uma folha.
    pub steps: Vec<String>,
}

impl Computation {
    /// Texto para exibição: resultado e, se houver, o rastro alinhado.
    pub fn render(&self) -> String {
        match render_trace(&self.steps) {
            Some(trace) => format!("Result: {}\nSteps:\n{trace}", self.value),
            None => format!("Result: {}", self.value),
        }
    }
}

/// Interpreta a resposta a uma requisição de avaliação.
pub fn process_response(response: Message) -> CalcResult<Computation> {
    if response.is_request {
        return Err(CalcError::ProtocolViolation(
            "expected a response, got a request".to_string(),
        ));
    }

    match response.status {
        StatusCode::Ok => {
            let payload = response.to_result()?;
            Ok(Computation {
                value: payload.result,
                steps: payload.steps,
            })
        }
        StatusCode::ClientError => Err(CalcError::ClientError(response.error_text())),
        StatusCode::ServerError => Err(CalcError::ServerError(response.error_text())),
    }
}

/// Conexão de um requisitante com um avaliador ou intermediário.
pub struct CalcClient {
    transport: FramedTransport<TcpStream>,
}

impl CalcClient {
    pub async fn connect(host: &str, port: u16, codec: WireCodec) -> CalcResult<Self> {
        let stream = TcpStream::connect((host, port)).await?;
        stream.set_nodelay(true)?;
        tracing::debug!(host, port, "Connected");
        Ok(Self {
            transport: FramedTransport::new(stream, codec),
        })
    }

    /// Envia `expr` e espera o resultado.
    ///
    /// Respostas `CLIENT_ERROR` e `SERVER_ERROR` viram [`CalcError::ClientError`]
    /// e [`CalcError::ServerError`]; a conexão continua utilizável.
    pub async fn submit(
        &mut self,
        expr: &Expression,
        options: RequestOptions,
    ) -> CalcResult<Computation> {
        let request = Message::from_expression(
            expr,
            options.show_steps,
            options.cache_result,
            options.cache_control,
        )?;
        let response = self.round_trip(&request).await?;

        tracing::debug!(
            status = %response.status,
            cache_control = response.cache_control,
            time_stamp = response.unix_time_stamp,
            "Got response"
        );

        process_response(response)
    }

    /// Envia uma mensagem arbitrária e espera uma resposta.
    pub async fn round_trip(&mut self, message: &Message) -> CalcResult<Message> {
        self.transport.send(message).await?;
        self.transport.recv().await?.ok_or_else(|| {
            CalcError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before a response arrived",
            ))
        })
    }

    /// Pede o encerramento e espera a confirmação.
    pub async fn terminate(mut self) -> CalcResult<()> {
        let ack = self.round_trip(&Message::termination()).await?;
        if ack.is_request || ack.status != StatusCode::Ok {
            tracing::warn!(status = %ack.status, "Unexpected termination acknowledgement");
        }
        tracing::debug!("Session terminated");
        Ok(())
    }
}
