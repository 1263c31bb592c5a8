//! Tipos compartilhados do calcwire.

pub mod config;
pub mod errors;
