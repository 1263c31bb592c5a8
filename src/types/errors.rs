//! Tipos de erro do calcwire.

use thiserror::Error;

use crate::protocol::StatusCode;

/// Tipo de resultado padrão do calcwire.
pub type CalcResult<T> = Result<T, CalcError>;

/// Erros possíveis no calcwire.
#[derive(Error, Debug)]
pub enum CalcError {
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Frame of {size} bytes exceeds the maximum of {max} bytes")]
    FrameTooLarge { size: usize, max: usize },

    #[error("Unknown expression kind: {0}")]
    UnknownExpressionKind(String),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    #[error("Origin unreachable: {0}")]
    OriginUnreachable(String),

    /// Resposta `CLIENT_ERROR` recebida do outro lado.
    #[error("Client error: {0}")]
    ClientError(String),

    /// Resposta `SERVER_ERROR` recebida do outro lado.
    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "cli")]
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

impl CalcError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de mensagem malformada.
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedMessage(msg.into())
    }

    /// Cria um erro de avaliação.
    pub fn evaluation<S: Into<String>>(msg: S) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Cria um erro de origem inacessível.
    pub fn origin<S: Into<String>>(msg: S) -> Self {
        Self::OriginUnreachable(msg.into())
    }

    /// Status devolvido ao requisitante quando este erro encerra uma troca.
    ///
    /// Falhas atribuíveis à entrada (bytes, expressão, forma da mensagem) são
    /// `CLIENT_ERROR`; o restante é `SERVER_ERROR`.
    pub fn status_code(&self) -> StatusCode {
        match self {
            CalcError::MalformedMessage(_)
            | CalcError::FrameTooLarge { .. }
            | CalcError::UnknownExpressionKind(_)
            | CalcError::Evaluation(_)
            | CalcError::ProtocolViolation(_)
            | CalcError::ClientError(_) => StatusCode::ClientError,
            _ => StatusCode::ServerError,
        }
    }
}
