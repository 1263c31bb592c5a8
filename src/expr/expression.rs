//! Árvore de expressão aritmética.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::registry::{BinaryOp, Function, NamedConstant, UnaryOp, UNARY_PRECEDENCE};

/// Expressão aritmética.
///
/// A construção é puramente estrutural: nada é avaliado nem validado aqui.
/// No wire, cada nó é um objeto JSON marcado pelo campo `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Expression {
    /// Número literal.
    Constant { value: f64 },

    /// Constante do registro (π, τ, e).
    NamedConstant { constant: NamedConstant },

    /// `left <operator> right`.
    Binary {
        left: Box<Expression>,
        operator: BinaryOp,
        right: Box<Expression>,
    },

    /// `<operator>operand`.
    Unary {
        operator: UnaryOp,
        operand: Box<Expression>,
    },

    /// `function(args...)`.
    FunctionCall {
        function: Function,
        args: Vec<Expression>,
    },
}

impl Expression {
    pub fn constant(value: f64) -> Self {
        Expression::Constant { value }
    }

    pub fn binary(
        left: impl Into<Expression>,
        operator: BinaryOp,
        right: impl Into<Expression>,
    ) -> Self {
        Expression::Binary {
            left: Box::new(left.into()),
            operator,
            right: Box::new(right.into()),
        }
    }

    pub fn unary(operator: UnaryOp, operand: impl Into<Expression>) -> Self {
        Expression::Unary {
            operator,
            operand: Box::new(operand.into()),
        }
    }

    pub fn call<I, E>(function: Function, args: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expression>,
    {
        Expression::FunctionCall {
            function,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Nome do variante, como aparece no campo `kind` do payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Constant { .. } => "constant",
            Expression::NamedConstant { .. } => "named_constant",
            Expression::Binary { .. } => "binary",
            Expression::Unary { .. } => "unary",
            Expression::FunctionCall { .. } => "function_call",
        }
    }

    /// Verdadeiro para constantes literais e nomeadas.
    pub fn is_leaf(&self) -> bool {
        matches!(
            self,
            Expression::Constant { .. } | Expression::NamedConstant { .. }
        )
    }

    /// Renderiza a expressão.
    ///
    /// Com `add_brackets`, todo operando composto de um operador binário ou
    /// unário é envolvido em parênteses. Sem ele, só os parênteses exigidos
    /// pela precedência são emitidos. Argumentos de função nunca são
    /// envolvidos, e a raiz também não.
    pub fn stringify(&self, add_brackets: bool) -> String {
        let mut out = String::new();
        self.render(&mut out, add_brackets);
        out
    }

    fn render(&self, out: &mut String, add_brackets: bool) {
        match self {
            Expression::Constant { value } => out.push_str(&value.to_string()),
            Expression::NamedConstant { constant } => out.push_str(constant.token()),
            Expression::Binary {
                left,
                operator,
                right,
            } => {
                let entry = operator.entry();
                let wrap_left = if add_brackets {
                    left.needs_brackets()
                } else {
                    let p = left.precedence();
                    p < entry.precedence || (p == entry.precedence && entry.right_assoc)
                };
                let wrap_right = if add_brackets {
                    right.needs_brackets()
                } else {
                    let p = right.precedence();
                    p < entry.precedence || (p == entry.precedence && !entry.right_assoc)
                };

                left.render_operand(out, add_brackets, wrap_left);
                out.push(' ');
                out.push_str(entry.token);
                out.push(' ');
                right.render_operand(out, add_brackets, wrap_right);
            }
            Expression::Unary { operator, operand } => {
                let wrap = if add_brackets {
                    operand.needs_brackets()
                } else {
                    operand.precedence() <= UNARY_PRECEDENCE
                };
                out.push_str(operator.token());
                operand.render_operand(out, add_brackets, wrap);
            }
            Expression::FunctionCall { function, args } => {
                out.push_str(function.token());
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    arg.render(out, add_brackets);
                }
                out.push(')');
            }
        }
    }

    fn render_operand(&self, out: &mut String, add_brackets: bool, wrap: bool) {
        if wrap {
            out.push('(');
            self.render(out, add_brackets);
            out.push(')');
        } else {
            self.render(out, add_brackets);
        }
    }

    /// Operandos que ganham parênteses no modo `add_brackets`.
    fn needs_brackets(&self) -> bool {
        match self {
            Expression::Constant { value } => value.is_sign_negative(),
            Expression::Binary { .. } | Expression::Unary { .. } => true,
            _ => false,
        }
    }

    /// Precedência efetiva do nó quando usado como operando.
    fn precedence(&self) -> u8 {
        match self {
            // Um literal negativo se comporta como negação unária.
            Expression::Constant { value } if value.is_sign_negative() => UNARY_PRECEDENCE,
            Expression::Binary { operator, .. } => operator.entry().precedence,
            Expression::Unary { .. } => UNARY_PRECEDENCE,
            _ => u8::MAX,
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.stringify(false))
    }
}

// Números literais usados no lugar de uma expressão viram `Constant`.

impl From<f64> for Expression {
    fn from(value: f64) -> Self {
        Expression::Constant { value }
    }
}

impl From<i32> for Expression {
    fn from(value: i32) -> Self {
        Expression::Constant {
            value: f64::from(value),
        }
    }
}

impl From<i64> for Expression {
    fn from(value: i64) -> Self {
        Expression::Constant {
            value: value as f64,
        }
    }
}

impl From<NamedConstant> for Expression {
    fn from(constant: NamedConstant) -> Self {
        Expression::NamedConstant { constant }
    }
}
