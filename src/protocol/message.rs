//! Mensagem trocada entre requisitante, intermediário e avaliador.

use std::fmt;

use chrono::Utc;

use super::payload::{self, ResultPayload};
use super::{MAX_CACHE_CONTROL, TERMINATION_PAYLOAD};
use crate::expr::Expression;
use crate::{CalcError, CalcResult};

/// Status de uma resposta (ignorado em requisições).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Ok,
    ClientError,
    ServerError,
}

impl StatusCode {
    /// Valor no wire.
    pub const fn to_u16(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::ClientError => 400,
            Self::ServerError => 500,
        }
    }

    /// `None` para valores desconhecidos.
    pub const fn from_u16(v: u16) -> Option<Self> {
        match v {
            200 => Some(Self::Ok),
            400 => Some(Self::ClientError),
            500 => Some(Self::ServerError),
            _ => None,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Ok => "OK",
            Self::ClientError => "CLIENT_ERROR",
            Self::ServerError => "SERVER_ERROR",
        };
        f.write_str(label)
    }
}

/// Cabeçalho + payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Requisição ou resposta.
    pub is_request: bool,

    /// Só tem significado em respostas.
    pub status: StatusCode,

    /// Expressão codificada (requisição), resultado ou texto de erro (resposta).
    pub data: Vec<u8>,

    /// O requisitante quer o rastro de redução.
    pub show_steps: bool,

    /// O lado que enviou aceita que a troca seja cacheada.
    pub cache_result: bool,

    /// Segundos de frescor; [`MAX_CACHE_CONTROL`] significa indefinido.
    pub cache_control: u32,

    /// Momento em que a resposta foi produzida (segundos Unix).
    pub unix_time_stamp: i64,
}

impl Message {
    /// Monta uma requisição para avaliar `expr`.
    pub fn from_expression(
        expr: &Expression,
        show_steps: bool,
        cache_result: bool,
        cache_control: u32,
    ) -> CalcResult<Self> {
        check_cache_control(cache_control)?;
        Ok(Self {
            is_request: true,
            status: StatusCode::Ok,
            data: payload::encode_expression(expr)?,
            show_steps,
            cache_result,
            cache_control,
            unix_time_stamp: 0,
        })
    }

    /// Monta uma resposta `OK` carimbada com o instante atual.
    pub fn from_result(
        result: f64,
        steps: Vec<String>,
        cache_result: bool,
        cache_control: u32,
    ) -> CalcResult<Self> {
        check_cache_control(cache_control)?;
        let data = payload::encode_result(&ResultPayload { result, steps })?;
        Ok(Self::response(StatusCode::Ok, data, cache_result, cache_control))
    }

    /// Monta uma resposta de erro com o texto do erro como payload.
    pub fn from_error(
        status: StatusCode,
        error: &dyn fmt::Display,
        cache_result: bool,
        cache_control: u32,
    ) -> Self {
        Self::response(
            status,
            error.to_string().into_bytes(),
            cache_result,
            cache_control.min(MAX_CACHE_CONTROL),
        )
    }

    /// Sinal de encerramento enviado pelo requisitante.
    pub fn termination() -> Self {
        Self {
            is_request: true,
            status: StatusCode::Ok,
            data: TERMINATION_PAYLOAD.to_vec(),
            show_steps: false,
            cache_result: false,
            cache_control: 0,
            unix_time_stamp: 0,
        }
    }

    /// Confirmação do encerramento.
    pub fn termination_ack() -> Self {
        Self::response(StatusCode::Ok, TERMINATION_PAYLOAD.to_vec(), false, 0)
    }

    /// Requisição cujo payload é o sentinela de encerramento.
    pub fn is_termination(&self) -> bool {
        self.is_request && self.data == TERMINATION_PAYLOAD
    }

    /// Substitui o carimbo de tempo.
    #[must_use]
    pub fn with_time_stamp(mut self, unix_time_stamp: i64) -> Self {
        self.unix_time_stamp = unix_time_stamp;
        self
    }

    /// Decodifica o payload de uma requisição.
    pub fn to_expression(&self) -> CalcResult<Expression> {
        payload::decode_expression(&self.data)
    }

    /// Decodifica o payload de uma resposta `OK`.
    pub fn to_result(&self) -> CalcResult<ResultPayload> {
        payload::decode_result(&self.data)
    }

    /// Texto de uma resposta de erro.
    pub fn error_text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    fn response(status: StatusCode, data: Vec<u8>, cache_result: bool, cache_control: u32) -> Self {
        Self {
            is_request: false,
            status,
            data,
            show_steps: false,
            cache_result,
            cache_control,
            unix_time_stamp: Utc::now().timestamp(),
        }
    }
}

fn check_cache_control(cache_control: u32) -> CalcResult<()> {
    if cache_control > MAX_CACHE_CONTROL {
        return Err(CalcError::malformed(format!(
            "cache_control {cache_control} exceeds {MAX_CACHE_CONTROL}"
        )));
    }
    Ok(())
}
