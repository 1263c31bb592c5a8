//! Cache de respostas do intermediário.
//!
//! Respostas são indexadas pelo payload da requisição e pelo pedido de
//! rastro. Uma entrada só é servida enquanto estiver fresca para os dois
//! lados: a janela declarada pela resposta e a tolerância declarada pela
//! requisição atual.

mod freshness;
mod store;

pub use freshness::{Freshness, Remaining};
pub use store::{CacheKey, CacheStats, Lookup, ResponseCache};
