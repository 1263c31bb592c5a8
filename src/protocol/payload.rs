//! Payloads JSON: árvore de expressão (requisição) e resultado (resposta).

use serde::{Deserialize, Serialize};

use crate::expr::Expression;
use crate::{CalcError, CalcResult};

/// Payload de uma resposta `OK`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    /// Valor final.
    pub result: f64,

    /// Passos renderizados (vazio quando não pedidos).
    #[serde(default)]
    pub steps: Vec<String>,
}

pub fn encode_expression(expr: &Expression) -> CalcResult<Vec<u8>> {
    Ok(serde_json::to_vec(expr)?)
}

/// Decodifica uma árvore; símbolos desconhecidos são resolvidos contra o registro.
pub fn decode_expression(data: &[u8]) -> CalcResult<Expression> {
    serde_json::from_slice(data).map_err(payload_error)
}

pub fn encode_result(payload: &ResultPayload) -> CalcResult<Vec<u8>> {
    Ok(serde_json::to_vec(payload)?)
}

pub fn decode_result(data: &[u8]) -> CalcResult<ResultPayload> {
    serde_json::from_slice(data).map_err(payload_error)
}

fn payload_error(e: serde_json::Error) -> CalcError {
    let msg = e.to_string();
    // Tag `kind` fora dos cinco variantes
    if msg.starts_with("unknown variant") {
        CalcError::UnknownExpressionKind(msg)
    } else {
        CalcError::malformed(format!("invalid payload: {msg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, Function, NamedConstant, UnaryOp};

    #[test]
    fn test_expression_roundtrip() {
        let expr = BinaryOp::Mul.of(
            Function::Max.call([Expression::from(2), UnaryOp::Neg.of(NamedConstant::Tau)]),
            0.5,
        );
        let bytes = encode_expression(&expr).unwrap();
        assert_eq!(decode_expression(&bytes).unwrap(), expr);
    }

    #[test]
    fn test_unknown_kind() {
        let err = decode_expression(br#"{"kind":"matrix","rows":[]}"#).unwrap_err();
        assert!(matches!(err, CalcError::UnknownExpressionKind(_)));
    }

    #[test]
    fn test_unknown_operator_is_malformed() {
        let data = br#"{"kind":"binary","operator":"xor",
            "left":{"kind":"constant","value":1.0},
            "right":{"kind":"constant","value":2.0}}"#;
        let err = decode_expression(data).unwrap_err();
        assert!(matches!(err, CalcError::MalformedMessage(_)));
        assert!(err.to_string().contains("xor"));
    }

    #[test]
    fn test_unknown_function_is_malformed() {
        let data = br#"{"kind":"function_call","function":"rand","args":[]}"#;
        assert!(matches!(
            decode_expression(data),
            Err(CalcError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(matches!(
            decode_expression(b"not json"),
            Err(CalcError::MalformedMessage(_))
        ));
        assert!(matches!(
            decode_result(b"{\"steps\":[]}"),
            Err(CalcError::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_result_without_steps_field() {
        let payload = decode_result(br#"{"result":12.0}"#).unwrap();
        assert_eq!(payload.result, 12.0);
        assert!(payload.steps.is_empty());
    }
}
