//! Intermediário com cache entre requisitantes e o avaliador.
//!
//! O intermediário fala o mesmo protocolo nos dois lados: para o
//! requisitante ele é um avaliador; para a origem, um requisitante.

mod intermediary;
mod origin;
mod service;

pub use intermediary::{CacheOutcome, CachingIntermediary, Clock, Exchange};
pub use origin::{Origin, TcpOrigin};
pub use service::IntermediaryService;
