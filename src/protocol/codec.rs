//! Codificação binária do cabeçalho.
//!
//! Layout (big-endian):
//!
//! ```text
//! [len:u32][version:u8][flags:u8][status:u16][cache_control:u32][unix_time_stamp:i64][data...]
//! ```
//!
//! `len` conta todos os bytes depois dele mesmo. Flags: bit 0 `is_request`,
//! bit 1 `show_steps`, bit 2 `cache_result`; os demais bits devem ser zero.

use super::message::{Message, StatusCode};
use super::{
    DEFAULT_MAX_FRAME_SIZE, HEADER_SIZE, LENGTH_PREFIX_SIZE, MAX_CACHE_CONTROL, PROTOCOL_VERSION,
};
use crate::{CalcError, CalcResult};

const FLAG_REQUEST: u8 = 0b001;
const FLAG_SHOW_STEPS: u8 = 0b010;
const FLAG_CACHE_RESULT: u8 = 0b100;
const KNOWN_FLAGS: u8 = FLAG_REQUEST | FLAG_SHOW_STEPS | FLAG_CACHE_RESULT;

/// Codec de frames com tamanho máximo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireCodec {
    max_frame_size: usize,
}

impl WireCodec {
    /// Cria um codec que recusa frames maiores que `max_frame_size` bytes
    /// (prefixo de tamanho incluído).
    pub fn new(max_frame_size: usize) -> Self {
        Self {
            max_frame_size: max_frame_size.max(HEADER_SIZE),
        }
    }

    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }

    /// Serializa uma mensagem em um frame completo.
    pub fn encode(&self, message: &Message) -> CalcResult<Vec<u8>> {
        if message.cache_control > MAX_CACHE_CONTROL {
            return Err(CalcError::malformed(format!(
                "cache_control {} exceeds {MAX_CACHE_CONTROL}",
                message.cache_control
            )));
        }

        let size = HEADER_SIZE + message.data.len();
        self.check_size(size)?;
        let len =
            u32::try_from(size - LENGTH_PREFIX_SIZE).map_err(|_| CalcError::FrameTooLarge {
                size,
                max: self.max_frame_size,
            })?;

        let mut flags = 0;
        if message.is_request {
            flags |= FLAG_REQUEST;
        }
        if message.show_steps {
            flags |= FLAG_SHOW_STEPS;
        }
        if message.cache_result {
            flags |= FLAG_CACHE_RESULT;
        }

        let mut buf = Vec::with_capacity(size);
        buf.extend_from_slice(&len.to_be_bytes());
        buf.push(PROTOCOL_VERSION);
        buf.push(flags);
        buf.extend_from_slice(&message.status.to_u16().to_be_bytes());
        buf.extend_from_slice(&message.cache_control.to_be_bytes());
        buf.extend_from_slice(&message.unix_time_stamp.to_be_bytes());
        buf.extend_from_slice(&message.data);
        Ok(buf)
    }

    /// Decodifica exatamente um frame.
    ///
    /// Falha sem efeitos colaterais se o frame estiver truncado, tiver bytes
    /// sobrando, exceder o tamanho máximo ou trouxer campos fora do domínio.
    pub fn decode(&self, bytes: &[u8]) -> CalcResult<Message> {
        let mut cursor = Cursor::new(bytes);

        let len = u32::from_be_bytes(cursor.take("length prefix")?) as usize;
        let size = LENGTH_PREFIX_SIZE + len;
        self.check_size(size)?;
        if bytes.len() < size {
            return Err(CalcError::malformed(format!(
                "truncated frame: expected {size} bytes, got {}",
                bytes.len()
            )));
        }
        if bytes.len() > size {
            return Err(CalcError::malformed(format!(
                "{} trailing bytes after a {size}-byte frame",
                bytes.len() - size
            )));
        }

        let [version] = cursor.take::<1>("version")?;
        if version != PROTOCOL_VERSION {
            return Err(CalcError::malformed(format!(
                "unsupported protocol version {version}"
            )));
        }

        let [flags] = cursor.take::<1>("flags")?;
        if flags & !KNOWN_FLAGS != 0 {
            return Err(CalcError::malformed(format!("unknown flag bits {flags:#010b}")));
        }

        let raw_status = u16::from_be_bytes(cursor.take("status")?);
        let status = StatusCode::from_u16(raw_status)
            .ok_or_else(|| CalcError::malformed(format!("unknown status code {raw_status}")))?;

        let cache_control = u32::from_be_bytes(cursor.take("cache_control")?);
        if cache_control > MAX_CACHE_CONTROL {
            return Err(CalcError::malformed(format!(
                "cache_control {cache_control} exceeds {MAX_CACHE_CONTROL}"
            )));
        }

        let unix_time_stamp = i64::from_be_bytes(cursor.take("unix_time_stamp")?);

        Ok(Message {
            is_request: flags & FLAG_REQUEST != 0,
            status,
            data: cursor.rest().to_vec(),
            show_steps: flags & FLAG_SHOW_STEPS != 0,
            cache_result: flags & FLAG_CACHE_RESULT != 0,
            cache_control,
            unix_time_stamp,
        })
    }

    fn check_size(&self, size: usize) -> CalcResult<()> {
        if size > self.max_frame_size {
            return Err(CalcError::FrameTooLarge {
                size,
                max: self.max_frame_size,
            });
        }
        Ok(())
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FRAME_SIZE)
    }
}

/// Codifica com o tamanho máximo padrão.
pub fn encode(message: &Message) -> CalcResult<Vec<u8>> {
    WireCodec::default().encode(message)
}

/// Decodifica com o tamanho máximo padrão.
pub fn decode(bytes: &[u8]) -> CalcResult<Message> {
    WireCodec::default().decode(bytes)
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take<const N: usize>(&mut self, field: &str) -> CalcResult<[u8; N]> {
        let slice = self
            .buf
            .get(self.pos..self.pos + N)
            .ok_or_else(|| CalcError::malformed(format!("truncated frame while reading {field}")))?;
        self.pos += N;

        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn rest(self) -> &'a [u8] {
        &self.buf[self.pos..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{BinaryOp, Function, NamedConstant};

    fn sample_request() -> Message {
        let expr = BinaryOp::Add.of(Function::Max.call([2, 3]), NamedConstant::E);
        Message::from_expression(&expr, true, true, 120).unwrap()
    }

    #[test]
    fn test_roundtrip_request() {
        let message = sample_request();
        let bytes = encode(&message).unwrap();
        assert_eq!(bytes.len(), HEADER_SIZE + message.data.len());
        assert_eq!(decode(&bytes).unwrap(), message);
    }

    #[test]
    fn test_roundtrip_responses() {
        let steps = vec!["max(2, 3) + 3".into(), "3 + 3".into(), "6".into()];
        let ok = Message::from_result(6.0, steps, true, MAX_CACHE_CONTROL).unwrap();
        let err = Message::from_error(StatusCode::ServerError, &"origin down", false, 0)
            .with_time_stamp(-1);
        let empty = Message {
            data: Vec::new(),
            ..Message::termination()
        };

        for message in [ok, err, empty, Message::termination_ack()] {
            assert_eq!(decode(&encode(&message).unwrap()).unwrap(), message);
        }
    }

    #[test]
    fn test_header_layout() {
        let message =
            Message::from_error(StatusCode::ClientError, &"x", true, 7).with_time_stamp(1);
        let bytes = encode(&message).unwrap();

        assert_eq!(&bytes[0..4], &17u32.to_be_bytes());
        assert_eq!(bytes[4], PROTOCOL_VERSION);
        assert_eq!(bytes[5], FLAG_CACHE_RESULT);
        assert_eq!(&bytes[6..8], &400u16.to_be_bytes());
        assert_eq!(&bytes[8..12], &7u32.to_be_bytes());
        assert_eq!(&bytes[12..20], &1i64.to_be_bytes());
        assert_eq!(&bytes[20..], b"x");
    }

    #[test]
    fn test_truncated_frames() {
        let bytes = encode(&sample_request()).unwrap();

        for cut in [0, 3, 4, 10, HEADER_SIZE, bytes.len() - 1] {
            let err = decode(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, CalcError::MalformedMessage(_)),
                "cut at {cut}: {err}"
            );
        }
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&sample_request()).unwrap();
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(CalcError::MalformedMessage(_))));
    }

    #[test]
    fn test_out_of_range_fields() {
        let bytes = encode(&sample_request()).unwrap();

        let mut bad_status = bytes.clone();
        bad_status[6..8].copy_from_slice(&201u16.to_be_bytes());
        assert!(decode(&bad_status).unwrap_err().to_string().contains("status"));

        let mut bad_cc = bytes.clone();
        bad_cc[8..12].copy_from_slice(&(MAX_CACHE_CONTROL + 1).to_be_bytes());
        assert!(decode(&bad_cc).unwrap_err().to_string().contains("cache_control"));

        let mut bad_flags = bytes.clone();
        bad_flags[5] |= 0b1000_0000;
        assert!(decode(&bad_flags).unwrap_err().to_string().contains("flag"));

        let mut bad_version = bytes;
        bad_version[4] = 9;
        assert!(decode(&bad_version).unwrap_err().to_string().contains("version"));
    }

    #[test]
    fn test_encode_rejects_cache_control_above_sentinel() {
        let mut message = sample_request();
        message.cache_control = MAX_CACHE_CONTROL + 1;
        assert!(matches!(encode(&message), Err(CalcError::MalformedMessage(_))));
    }

    #[test]
    fn test_frame_size_limit() {
        let codec = WireCodec::new(64);
        let message = Message::from_error(StatusCode::ClientError, &"a".repeat(100), false, 0);

        assert!(matches!(
            codec.encode(&message),
            Err(CalcError::FrameTooLarge { max: 64, .. })
        ));

        // Um frame válido para o codec padrão é recusado pelo menor,
        // só pelo prefixo, sem ler o corpo
        let bytes = encode(&message).unwrap();
        assert!(matches!(
            codec.decode(&bytes[..LENGTH_PREFIX_SIZE]),
            Err(CalcError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn test_payload_is_opaque_to_codec() {
        let mut message = sample_request();
        message.data = b"{\"kind\":\"unknown\"}".to_vec();
        let decoded = decode(&encode(&message).unwrap()).unwrap();
        assert!(decoded.to_expression().is_err());
        assert_eq!(decoded.data, message.data);
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        fn status() -> impl Strategy<Value = StatusCode> {
            prop_oneof![
                Just(StatusCode::Ok),
                Just(StatusCode::ClientError),
                Just(StatusCode::ServerError),
            ]
        }

        // Qualquer mensagem que caiba em um frame de `max_frame_size` bytes
        fn message(max_frame_size: usize) -> impl Strategy<Value = Message> {
            (
                any::<bool>(),
                status(),
                proptest::collection::vec(any::<u8>(), 0..=max_frame_size - HEADER_SIZE),
                any::<bool>(),
                any::<bool>(),
                0..=MAX_CACHE_CONTROL,
                any::<i64>(),
            )
                .prop_map(
                    |(is_request, status, data, show_steps, cache_result, cache_control, unix_time_stamp)| {
                        Message {
                            is_request,
                            status,
                            data,
                            show_steps,
                            cache_result,
                            cache_control,
                            unix_time_stamp,
                        }
                    },
                )
        }

        proptest! {
            #[test]
            fn test_decode_inverts_encode(message in message(DEFAULT_MAX_FRAME_SIZE)) {
                let bytes = encode(&message).unwrap();
                prop_assert_eq!(bytes.len(), HEADER_SIZE + message.data.len());
                prop_assert_eq!(decode(&bytes).unwrap(), message);
            }

            #[test]
            fn test_every_strict_prefix_is_malformed(message in message(512)) {
                let codec = WireCodec::new(512);
                let bytes = codec.encode(&message).unwrap();
                for cut in 0..bytes.len() {
                    let result = codec.decode(&bytes[..cut]);
                    prop_assert!(
                        matches!(result, Err(CalcError::MalformedMessage(_))),
                        "cut at {}: {:?}",
                        cut,
                        result
                    );
                }
            }
        }
    }
}
