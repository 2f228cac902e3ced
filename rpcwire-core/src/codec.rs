//! Codec for JSON-RPC single messages and batches
//!
//! This module provides the encode/decode entry points layered on top of
//! the message model:
//!
//! - **WireMessage**: the trait shared by [`Request`], [`Response`] and
//!   [`Message`] that the batch codec is generic over
//! - **Batch codec**: non-empty arrays, decoded fail-fast with the failing
//!   element's index attached
//! - **Dispatcher**: picks single or batch framing from the first
//!   non-whitespace byte
//!
//! # Batch Messages
//!
//! A batch is decoded element by element, in order. The first element that
//! fails aborts the whole batch with [`Error::ElementError`] naming its
//! zero-based index; no partial batch is returned. Encoding validates every
//! element before writing any of them.
//!
//! # Examples
//!
//! ```rust
//! use rpcwire_core::{codec, Message, Packet};
//!
//! let wire = br#"[{"jsonrpc":"2.0","id":1,"method":"sum","params":[1,2]},
//!                 {"jsonrpc":"2.0","method":"notify"}]"#;
//!
//! match codec::decode(wire).unwrap() {
//!     Packet::Batch(items) => {
//!         assert_eq!(items.len(), 2);
//!         assert!(items[1].is_notification());
//!     }
//!     Packet::Single(_) => unreachable!(),
//! }
//! ```

use crate::envelope::first_token;
use crate::error::{Error, Result};
use crate::response::Response;
use crate::types::{Message, Request};
use serde::Serialize;
use serde_json::value::RawValue;
use std::io::Write;

/// A JSON-RPC object that can be decoded, validated and encoded
///
/// `to_vec` encodes through serde into a buffer; `write_to` streams the
/// same bytes into a sink without building the whole message first.
pub trait WireMessage: Serialize + Sized {
    /// Decode one JSON object
    fn decode(data: &[u8]) -> Result<Self>;

    /// Check the invariants that must hold before encoding
    fn validate(&self) -> Result<()>;

    /// Stream the encoded message into `writer`
    fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()>;

    /// Encode into a fresh buffer
    fn to_vec(&self) -> Result<Vec<u8>> {
        self.validate()?;
        Ok(serde_json::to_vec(self)?)
    }
}

/// A decoded payload: one message or a batch of them
#[derive(Debug, Clone, PartialEq)]
pub enum Packet<T> {
    /// A bare JSON object
    Single(T),
    /// A JSON array of objects, never empty
    Batch(Vec<T>),
}

impl<T> Packet<T> {
    pub fn is_batch(&self) -> bool {
        matches!(self, Packet::Batch(_))
    }

    /// Number of messages carried
    pub fn len(&self) -> usize {
        match self {
            Packet::Single(_) => 1,
            Packet::Batch(items) => items.len(),
        }
    }

    /// Always false for decoded packets
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            Packet::Single(item) => std::slice::from_ref(item).iter(),
            Packet::Batch(items) => items.iter(),
        }
    }

    pub fn into_vec(self) -> Vec<T> {
        match self {
            Packet::Single(item) => vec![item],
            Packet::Batch(items) => items,
        }
    }
}

impl<T: WireMessage> Packet<T> {
    /// Encode with the same framing the packet was decoded with
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        match self {
            Packet::Single(item) => item.to_vec(),
            Packet::Batch(items) => encode_batch(items),
        }
    }

    /// Stream with the same framing the packet was decoded with
    pub fn write_to<W: Write + ?Sized>(&self, writer: &mut W) -> Result<()> {
        match self {
            Packet::Single(item) => item.write_to(writer),
            Packet::Batch(items) => write_batch_to(items, writer),
        }
    }
}

/// Decode a batch array, failing on the first bad element
///
/// ```rust
/// use rpcwire_core::{codec, Error, Request};
///
/// let err = codec::decode_batch::<Request>(br#"[{"jsonrpc":"2.0","method":"ok"},{"jsonrpc":"2.0"}]"#)
///     .unwrap_err();
/// assert!(matches!(err, Error::ElementError { index: 1, .. }));
/// ```
pub fn decode_batch<T: WireMessage>(data: &[u8]) -> Result<Vec<T>> {
    decode_batch_bounded(data, None)
}

/// Like [`decode_batch`], rejecting batches longer than `limit` before any
/// element is decoded
pub fn decode_batch_bounded<T: WireMessage>(data: &[u8], limit: Option<usize>) -> Result<Vec<T>> {
    match first_token(data) {
        None => return Err(Error::EmptyInput),
        Some(b'[') => {}
        Some(_) => return Err(Error::NotAnArray),
    }

    let elements: Vec<&RawValue> = serde_json::from_slice(data).map_err(Error::malformed)?;
    if elements.is_empty() {
        return Err(Error::EmptyBatch);
    }
    if let Some(limit) = limit {
        if elements.len() > limit {
            return Err(Error::BatchSizeExceeded {
                limit,
                actual: elements.len(),
            });
        }
    }

    let decoded = elements
        .iter()
        .enumerate()
        .map(|(index, raw)| T::decode(raw.get().as_bytes()).map_err(|e| e.at_index(index)))
        .collect::<Result<Vec<T>>>()?;

    tracing::debug!(len = decoded.len(), "decoded batch");
    Ok(decoded)
}

/// Validate every element, then encode the batch as a JSON array
pub fn encode_batch<T: WireMessage>(items: &[T]) -> Result<Vec<u8>> {
    validate_batch(items)?;
    Ok(serde_json::to_vec(items)?)
}

/// Validate every element, then stream the batch into `writer`
///
/// Produces the same bytes as [`encode_batch`].
pub fn write_batch_to<T: WireMessage, W: Write + ?Sized>(items: &[T], writer: &mut W) -> Result<()> {
    validate_batch(items)?;
    writer.write_all(b"[")?;
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            writer.write_all(b",")?;
        }
        item.write_to(writer).map_err(|e| e.at_index(index))?;
    }
    writer.write_all(b"]")?;
    Ok(())
}

fn validate_batch<T: WireMessage>(items: &[T]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::EmptyBatch);
    }
    items
        .iter()
        .enumerate()
        .try_for_each(|(index, item)| item.validate().map_err(|e| e.at_index(index)))
}

/// Decode single or batch framing, chosen by the first non-whitespace byte
pub fn decode_packet<T: WireMessage>(data: &[u8]) -> Result<Packet<T>> {
    decode_packet_bounded(data, None)
}

/// Like [`decode_packet`] with a cap on batch length
pub fn decode_packet_bounded<T: WireMessage>(data: &[u8], batch_limit: Option<usize>) -> Result<Packet<T>> {
    match first_token(data) {
        None => Err(Error::EmptyInput),
        Some(b'[') => decode_batch_bounded(data, batch_limit).map(Packet::Batch),
        Some(_) => T::decode(data).map(Packet::Single),
    }
}

/// Decode any incoming payload into requests and/or responses
pub fn decode(data: &[u8]) -> Result<Packet<Message>> {
    decode_packet(data)
}

/// Encode any message to a JSON string
pub fn encode<T: WireMessage>(msg: &T) -> Result<String> {
    let bytes = msg.to_vec()?;
    String::from_utf8(bytes).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode a single request
pub fn decode_request(data: &[u8]) -> Result<Request> {
    Request::decode(data)
}

/// Decode a single response
pub fn decode_response(data: &[u8]) -> Result<Response> {
    Response::decode(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::JsonRpcErrorData;
    use crate::types::Id;
    use serde_json::json;

    #[test]
    fn test_concrete_mixed_batch() {
        let wire = br#"[{"jsonrpc":"2.0","id":1,"method":"sum","params":[1,2]},{"jsonrpc":"2.0","method":"notify"}]"#;
        let batch = decode_batch::<Request>(wire).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].id(), Some(&Id::Integer(1)));
        assert_eq!(batch[0].params(), Some(&json!([1, 2])));
        assert!(batch[1].is_notification());
    }

    #[test]
    fn test_empty_batch() {
        assert!(matches!(decode_batch::<Request>(b"[]"), Err(Error::EmptyBatch)));
        assert!(matches!(decode_batch::<Request>(b" [ ] "), Err(Error::EmptyBatch)));
        assert!(matches!(encode_batch::<Request>(&[]), Err(Error::EmptyBatch)));
        let mut sink = Vec::new();
        assert!(matches!(write_batch_to::<Response, _>(&[], &mut sink), Err(Error::EmptyBatch)));
    }

    #[test]
    fn test_invalid_batch_input() {
        assert!(matches!(decode_batch::<Request>(b"[invalid]"), Err(Error::MalformedJson(_))));
        assert!(matches!(decode_batch::<Request>(b"{}"), Err(Error::NotAnArray)));
        assert!(matches!(decode_batch::<Request>(b""), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_element_error_index() {
        let wire = br#"[{"jsonrpc":"2.0","id":1,"result":1},{"jsonrpc":"2.0","id":2},{"jsonrpc":"2.0","id":3,"result":3}]"#;
        match decode_batch::<Response>(wire) {
            Err(Error::ElementError { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, Error::MissingBody));
            }
            other => panic!("expected ElementError, got {other:?}"),
        }

        assert!(matches!(
            decode_batch::<Request>(b"[1]"),
            Err(Error::ElementError { index: 0, .. })
        ));
    }

    #[test]
    fn test_array_shaped_messages_rejected() {
        assert!(matches!(
            decode_packet::<Request>(br#"["2.0",1,"sum",[1,2]]"#),
            Err(Error::MalformedJson(_))
        ));

        let wire = br#"[{"jsonrpc":"2.0","method":"ok"},["2.0",null,null,null,5]]"#;
        match decode(wire) {
            Err(Error::ElementError { index, source }) => {
                assert_eq!(index, 1);
                assert!(matches!(*source, Error::MalformedJson(_)));
            }
            other => panic!("expected ElementError, got {other:?}"),
        }
    }

    #[test]
    fn test_encode_validates_before_writing() {
        let items = vec![
            Request::new("ok", None, Id::Integer(1)),
            Request::new("rpc.bad", None, Id::Integer(2)),
        ];
        let mut sink = Vec::new();
        let err = write_batch_to(&items, &mut sink).unwrap_err();
        assert!(matches!(err, Error::ElementError { index: 1, .. }));
        assert!(sink.is_empty());
        assert!(matches!(encode_batch(&items), Err(Error::ElementError { index: 1, .. })));
    }

    #[test]
    fn test_batch_limit() {
        let wire = br#"[{"jsonrpc":"2.0","method":"a"},{"jsonrpc":"2.0","method":"b"}]"#;
        assert!(matches!(
            decode_batch_bounded::<Request>(wire, Some(1)),
            Err(Error::BatchSizeExceeded { limit: 1, actual: 2 })
        ));
        assert_eq!(decode_batch_bounded::<Request>(wire, Some(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_encode_preserves_order() {
        let responses: Vec<Response> = (0..5)
            .map(|i| Response::success(json!({"value": i}), Id::Integer(i)).unwrap())
            .collect();
        let encoded = encode_batch(&responses).unwrap();
        let decoded = decode_batch::<Response>(&encoded).unwrap();
        for (i, resp) in decoded.iter().enumerate() {
            assert_eq!(resp.id(), &Id::Integer(i as i64));
        }
        assert_eq!(decoded, responses);
    }

    #[test]
    fn test_streamed_batch_matches_buffered() {
        let responses = vec![
            Response::success(json!([1, 2]), Id::String("a".into())).unwrap(),
            Response::failure(JsonRpcErrorData::new(-1, "x"), Id::Null),
        ];
        let mut streamed = Vec::new();
        write_batch_to(&responses, &mut streamed).unwrap();
        assert_eq!(streamed, encode_batch(&responses).unwrap());
    }

    #[test]
    fn test_dispatcher() {
        let single = decode(b"  {\"jsonrpc\":\"2.0\",\"method\":\"m\"}").unwrap();
        assert!(!single.is_batch());
        assert_eq!(single.len(), 1);

        let batch = decode(b"\n[{\"jsonrpc\":\"2.0\",\"id\":1,\"result\":1}]").unwrap();
        assert!(batch.is_batch());
        assert!(batch.iter().all(Message::is_response));

        assert!(matches!(decode(b"   "), Err(Error::EmptyInput)));
        assert!(matches!(decode(b"[]"), Err(Error::EmptyBatch)));
    }

    #[test]
    fn test_packet_round_trip_keeps_framing() {
        let wire = br#"[{"jsonrpc":"2.0","id":1,"method":"a"}]"#;
        let packet = decode_packet::<Request>(wire).unwrap();
        assert_eq!(packet.to_vec().unwrap(), wire.to_vec());

        let mut streamed = Vec::new();
        packet.write_to(&mut streamed).unwrap();
        assert_eq!(streamed, wire.to_vec());
    }

    #[test]
    fn test_encode_string_helpers() {
        let req = Request::new("ping", None, Id::Integer(1));
        let json = encode(&req).unwrap();
        assert_eq!(decode_request(json.as_bytes()).unwrap(), req);

        let resp = Response::success(json!(null), Id::Integer(1)).unwrap();
        let json = encode(&resp).unwrap();
        assert_eq!(json, r#"{"jsonrpc":"2.0","id":1,"result":null}"#);
        assert_eq!(decode_response(json.as_bytes()).unwrap(), resp);
    }
}
