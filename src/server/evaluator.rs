//! Papel de avaliador: decodifica a expressão, avalia e responde.

use async_trait::async_trait;

use super::connection::RequestHandler;
use crate::eval::evaluate;
use crate::protocol::{Message, StatusCode};
use crate::types::config::ServerConfig;
use crate::{CalcError, CalcResult};

/// Avaliador sem estado; a política de cache anunciada vem da configuração.
#[derive(Debug, Clone, Copy)]
pub struct EvaluatorService {
    cache_result: bool,
    cache_control: u32,
}

impl EvaluatorService {
    pub fn new(cache_result: bool, cache_control: u32) -> Self {
        Self {
            cache_result,
            cache_control,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.cache_result, config.cache_control)
    }

    /// Responde a uma requisição já decodificada.
    ///
    /// Falhas de decodificação ou de avaliação viram `CLIENT_ERROR` com o
    /// texto do erro; nunca retornam `Err`.
    pub fn process_request(&self, request: &Message) -> Message {
        match self.evaluate_request(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::info!(error = %e, "Rejecting request");
                self.error_response(&e)
            }
        }
    }

    fn evaluate_request(&self, request: &Message) -> CalcResult<Message> {
        let expr = request.to_expression()?;
        let evaluation = evaluate(&expr)?;

        tracing::info!(
            expression = %expr,
            result = evaluation.value,
            steps = evaluation.steps.len(),
            "Evaluated expression"
        );

        let steps = if request.show_steps {
            evaluation.rendered_steps()
        } else {
            Vec::new()
        };

        Message::from_result(evaluation.value, steps, self.cache_result, self.cache_control)
    }
}

#[async_trait]
impl RequestHandler for EvaluatorService {
    async fn handle(&mut self, request: Message) -> CalcResult<Message> {
        Ok(self.process_request(&request))
    }

    async fn terminate(&mut self, _request: Message) -> Message {
        Message::termination_ack()
    }

    fn error_response(&self, err: &CalcError) -> Message {
        let status = match err.status_code() {
            StatusCode::Ok => StatusCode::ServerError,
            status => status,
        };
        Message::from_error(status, err, self.cache_result, self.cache_control)
    }
}
