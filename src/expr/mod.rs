//! Modelo de expressões aritméticas.
//!
//! - [`Expression`] - árvore fechada (constante, constante nomeada, binária,
//!   unária, chamada de função)
//! - [`registry`] - tabelas somente leitura de operadores, funções e constantes

mod expression;
pub mod registry;

pub use expression::Expression;
pub use registry::{Arity, BinaryOp, Function, NamedConstant, UnaryOp};
