//! Avaliador de expressões.
//!
//! Reduz uma [`Expression`](crate::expr::Expression) a um valor, registrando
//! cada árvore intermediária para que o requisitante possa ver o rastro.

mod evaluator;

pub use evaluator::{evaluate, Evaluation};
