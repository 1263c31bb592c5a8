//! Lado servidor: listener TCP, loop por conexão e o papel de avaliador.
//!
//! O mesmo listener atende o avaliador e o intermediário; cada papel só
//! fornece um [`RequestHandler`].

mod connection;
mod evaluator;
mod listener;

pub use connection::{Connection, RequestHandler};
pub use evaluator::EvaluatorService;
pub use listener::Listener;
