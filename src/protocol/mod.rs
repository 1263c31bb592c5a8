//! Protocolo de wire do calcwire.
//!
//! Uma [`Message`] é um cabeçalho binário de tamanho fixo seguido de um
//! payload JSON, enquadrada por um prefixo de tamanho.
//!
//! ## Exemplo
//!
//! ```
//! use calcwire::expr::BinaryOp;
//! use calcwire::protocol::{decode, encode, Message, MAX_CACHE_CONTROL};
//!
//! let expr = BinaryOp::Add.of(2, 3);
//! let request = Message::from_expression(&expr, true, true, MAX_CACHE_CONTROL).unwrap();
//! let bytes = encode(&request).unwrap();
//! assert_eq!(decode(&bytes).unwrap(), request);
//! ```

mod codec;
mod message;
mod payload;
mod transport;

pub use codec::{decode, encode, WireCodec};
pub use message::{Message, StatusCode};
pub use payload::ResultPayload;
pub use transport::FramedTransport;

/// Versão do formato de wire.
pub const PROTOCOL_VERSION: u8 = 1;

/// Valor sentinela de `cache_control`: fresco indefinidamente.
pub const MAX_CACHE_CONTROL: u32 = u16::MAX as u32;

/// Bytes do prefixo de tamanho.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Prefixo + version(1) + flags(1) + status(2) + cache_control(4) + unix_time_stamp(8).
pub const HEADER_SIZE: usize = LENGTH_PREFIX_SIZE + 16;

/// Tamanho máximo padrão de um frame (64 KiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024;

/// Payload de uma requisição de encerramento (e da sua confirmação).
pub const TERMINATION_PAYLOAD: &[u8] = b"EXIT";
