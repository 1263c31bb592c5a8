//! Requisitante.

mod render;
mod requester;

pub use render::render_trace;
pub use requester::{process_response, CalcClient, Computation, RequestOptions};
