//! Streaming encode tests
//!
//! `write_to` must produce exactly the bytes `to_vec` does.

use rpcwire_core::{codec, Error, Id, JsonRpcErrorData, Packet, Request, Response, WireMessage};
use serde_json::{json, Value};
use std::io::{self, Write};

fn generated_id(i: usize) -> Id {
    match i % 4 {
        0 => Id::Integer(i as i64 * 1_000_003),
        1 => Id::String(format!("req-{i}-\u{263a}")),
        2 => Id::Float(i as f64 + 0.5),
        _ => Id::Null,
    }
}

fn generated_result(i: usize) -> Value {
    if i % 5 == 0 {
        let rows: Vec<Value> = (0..500)
            .map(|n| json!({"row": n, "label": format!("entry {n}"), "ok": n % 2 == 0}))
            .collect();
        json!({"rows": rows, "total": 500})
    } else {
        json!([i, format!("small \"{i}\""), null])
    }
}

fn generated_responses() -> Vec<Response> {
    (0..50)
        .map(|i| {
            if i % 7 == 3 {
                Response::failure(
                    JsonRpcErrorData::with_data(-32000 - i as i64, format!("failure {i}"), json!({"i": i})),
                    generated_id(i),
                )
            } else {
                Response::success(generated_result(i), generated_id(i)).unwrap()
            }
        })
        .collect()
}

/// Sink that accepts a fixed number of bytes, then fails
struct LimitedSink {
    written: Vec<u8>,
    capacity: usize,
}

impl Write for LimitedSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.capacity.saturating_sub(self.written.len());
        if room == 0 {
            return Err(io::Error::new(io::ErrorKind::WriteZero, "sink full"));
        }
        let n = room.min(buf.len());
        self.written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_streaming_matches_buffered_for_generated_responses() {
    for (i, resp) in generated_responses().iter().enumerate() {
        let mut streamed = Vec::new();
        resp.write_to(&mut streamed).unwrap();
        assert_eq!(streamed, resp.to_vec().unwrap(), "response {i} differs");
    }
}

#[test]
fn test_streaming_matches_buffered_after_decode() {
    for resp in generated_responses() {
        let decoded = Response::decode(&resp.to_vec().unwrap()).unwrap();
        let mut streamed = Vec::new();
        decoded.write_to(&mut streamed).unwrap();
        assert_eq!(streamed, decoded.to_vec().unwrap());
        assert_eq!(decoded, resp);
    }
}

#[test]
fn test_streaming_requests_match_buffered() {
    let requests = [
        Request::new("a", None, Id::Integer(1)),
        Request::new("b", Some(json!({"k": [1, 2]})), Id::String("x".into())),
        Request::notification("c", Some(json!(["\u{1f600}", "tab\tchar"]))),
        Request::new("d", Some(json!([])), Id::Float(2.5)),
    ];
    for req in &requests {
        let mut streamed = Vec::new();
        req.write_to(&mut streamed).unwrap();
        assert_eq!(streamed, req.to_vec().unwrap());
    }
}

#[test]
fn test_batch_streaming_matches_buffered() {
    let responses = generated_responses();
    let mut streamed = Vec::new();
    codec::write_batch_to(&responses, &mut streamed).unwrap();
    assert_eq!(streamed, codec::encode_batch(&responses).unwrap());

    let packet = Packet::Batch(responses);
    let mut via_packet = Vec::new();
    packet.write_to(&mut via_packet).unwrap();
    assert_eq!(via_packet, streamed);
}

#[test]
fn test_sink_failure_surfaces_as_io_error() {
    let resp = Response::success(generated_result(0), Id::Integer(1)).unwrap();
    let mut sink = LimitedSink {
        written: Vec::new(),
        capacity: 64,
    };

    let err = resp.write_to(&mut sink).unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(sink.written.len(), 64);
}

#[test]
fn test_invalid_response_writes_nothing() {
    let mut resp = Response::decode(br#"{"jsonrpc":"2.0","id":1,"result":{"a":1}}"#).unwrap();
    resp.free();

    let mut sink = Vec::new();
    assert!(resp.write_to(&mut sink).is_err());
    assert!(sink.is_empty());
}

#[test]
fn test_invalid_batch_element_writes_nothing() {
    let mut bad = Response::success(json!(1), Id::Integer(2)).unwrap();
    bad.free();
    let batch = vec![Response::success(json!(0), Id::Integer(1)).unwrap(), bad];

    let mut sink = Vec::new();
    assert!(codec::write_batch_to(&batch, &mut sink).is_err());
    assert!(sink.is_empty());
}
