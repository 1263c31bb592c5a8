//! Expressões de demonstração usadas pelo `client` e pelo `eval`.

use crate::expr::{BinaryOp, Expression, Function, NamedConstant, UnaryOp};

/// Nomes das expressões, na ordem do menu.
pub const DEMO_NAMES: [&str; 6] = ["expr1", "expr2", "expr3", "expr4", "expr5", "expr6"];

/// Expressão de demonstração pelo nome.
pub fn demo_expression(name: &str) -> Option<Expression> {
    use BinaryOp::{Add, Div, Mul, Pow, Sub};

    let expr = match name {
        // sin(max(2, 3 * 4, 5, 6 * (7 * 8 / 9), 10 / 11)) / 12 * 13
        "expr1" => Mul.of(
            Div.of(
                Function::Sin.call([Function::Max.call([
                    Expression::from(2),
                    Mul.of(3, 4),
                    Expression::from(5),
                    Mul.of(6, Div.of(Mul.of(7, 8), 9)),
                    Div.of(10, 11),
                ])]),
                12,
            ),
            13,
        ),
        "expr2" => Add.of(Function::Max.call([2, 3]), 3),
        "expr3" => Add.of(3, Div.of(Mul.of(4, 2), Pow.of(Sub.of(1, 5), Pow.of(2, 3)))),
        "expr4" => Div.of(Pow.of(Add.of(1, 2), Mul.of(3, 4)), Mul.of(5, 6)),
        "expr5" => UnaryOp::Neg.of(UnaryOp::Neg.of(Pow.of(
            Add.of(1, Add.of(2, 3)),
            UnaryOp::Neg.of(Add.of(4, 5)),
        ))),
        "expr6" => Function::Max.call([
            Expression::from(2),
            Mul.of(3, 4),
            Function::Log.call([NamedConstant::E]),
            Mul.of(6, 7),
            Div.of(9, 8),
        ]),
        _ => return None,
    };
    Some(expr)
}
