//! Avaliador com rastreamento de passos.

use crate::expr::Expression;
use crate::CalcResult;

/// Resultado de uma avaliação: o valor final e os passos de redução.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Valor numérico final.
    pub value: f64,

    /// Árvores intermediárias, na ordem em que foram reduzidas.
    ///
    /// Termina no `Constant` do valor final quando a raiz é composta; é vazio
    /// quando a raiz é uma folha.
    pub steps: Vec<Expression>,
}

impl Evaluation {
    /// Renderiza os passos como são enviados ao requisitante.
    pub fn rendered_steps(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.stringify(true)).collect()
    }
}

/// Avalia uma expressão, produzindo o valor e o rastro de redução.
///
/// O rastro é reconstruído a cada chamada; nada é compartilhado entre
/// avaliações.
///
/// Ordem dos passos por variante:
/// - binária: reduções parciais da esquerda contra a direita original, depois
///   reduções da direita contra o valor da esquerda, depois `l op r`, depois
///   o valor;
/// - unária: reduções do operando envoltas no operador, depois `op v`, depois
///   o valor;
/// - chamada: argumentos da esquerda para a direita; cada redução parcial
///   aparece com os argumentos anteriores já resolvidos e os posteriores
///   intactos; depois a chamada com todos resolvidos, depois o valor.
pub fn evaluate(expr: &Expression) -> CalcResult<Evaluation> {
    match expr {
        Expression::Constant { value } => Ok(Evaluation {
            value: *value,
            steps: Vec::new(),
        }),
        Expression::NamedConstant { constant } => Ok(Evaluation {
            value: constant.value(),
            steps: Vec::new(),
        }),
        Expression::Binary {
            left,
            operator,
            right,
        } => {
            let mut steps = Vec::new();

            let left_eval = evaluate(left)?;
            for step in intermediate(&left_eval.steps) {
                steps.push(Expression::Binary {
                    left: Box::new(step.clone()),
                    operator: *operator,
                    right: right.clone(),
                });
            }

            let right_eval = evaluate(right)?;
            for step in intermediate(&right_eval.steps) {
                steps.push(Expression::binary(
                    left_eval.value,
                    *operator,
                    step.clone(),
                ));
            }

            steps.push(Expression::binary(
                left_eval.value,
                *operator,
                right_eval.value,
            ));
            let value = operator.apply(left_eval.value, right_eval.value)?;
            steps.push(Expression::constant(value));

            Ok(Evaluation { value, steps })
        }
        Expression::Unary { operator, operand } => {
            let mut steps = Vec::new();

            let operand_eval = evaluate(operand)?;
            for step in intermediate(&operand_eval.steps) {
                steps.push(Expression::unary(*operator, step.clone()));
            }

            steps.push(Expression::unary(*operator, operand_eval.value));
            let value = operator.apply(operand_eval.value)?;
            steps.push(Expression::constant(value));

            Ok(Evaluation { value, steps })
        }
        Expression::FunctionCall { function, args } => {
            let mut steps = Vec::new();
            let mut resolved: Vec<f64> = Vec::with_capacity(args.len());

            for (i, arg) in args.iter().enumerate() {
                let arg_eval = evaluate(arg)?;
                for step in intermediate(&arg_eval.steps) {
                    let partial = resolved
                        .iter()
                        .map(|v| Expression::constant(*v))
                        .chain(std::iter::once(step.clone()))
                        .chain(args[i + 1..].iter().cloned());
                    steps.push(Expression::call(*function, partial));
                }
                resolved.push(arg_eval.value);
            }

            steps.push(Expression::call(*function, resolved.iter().copied()));
            let value = function.apply(&resolved)?;
            steps.push(Expression::constant(value));

            Ok(Evaluation { value, steps })
        }
    }
}

/// Todos os passos de uma sub-avaliação, exceto o último (o valor).
fn intermediate(steps: &[Expression]) -> &[Expression] {
    steps.split_last().map(|(_, rest)| rest).unwrap_or(&[])
}
