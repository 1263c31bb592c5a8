//! # calcwire
//!
//! Calculadora remota com rastro de passos e intermediário com cache.
//!
//! Um requisitante envia uma árvore de expressão aritmética; o avaliador
//! reduz a árvore um passo por vez e devolve o resultado com o rastro. Entre
//! os dois pode ficar um intermediário que guarda respostas e decide o
//! frescor pelos dois lados, como um cache HTTP.
//!
//! ## Módulos
//!
//! - [`expr`] - Árvore de expressão e registro de operadores
//! - [`eval`] - Avaliação passo a passo
//! - [`protocol`] - Mensagem, codec binário e transporte em frames
//! - [`cache`] - Cache de respostas e aritmética de frescor
//! - [`server`] - Listener TCP e papel de avaliador
//! - [`proxy`] - Papel de intermediário com cache
//! - [`client`] - Requisitante
//! - [`cli`] - Interface de linha de comando
//! - [`types`] - Configuração e erros

pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod client;
pub mod eval;
pub mod expr;
pub mod protocol;
pub mod proxy;
pub mod server;
pub mod types;

pub use types::config::Config;
pub use types::errors::{CalcError, CalcResult};
