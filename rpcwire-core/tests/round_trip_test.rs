//! Round-trip integration tests
//!
//! Encode then decode across every id type, notifications, batches and
//! the mixed request/response channel.

use rpcwire_core::{codec, Error, Id, JsonRpcErrorData, Message, Packet, Request, Response, WireMessage};
use serde_json::json;

fn ids() -> Vec<Id> {
    vec![
        Id::Null,
        Id::String("req-1".into()),
        Id::String("with \"quotes\" and \u{e9}".into()),
        Id::Integer(0),
        Id::Integer(i64::MIN),
        Id::Float(1.0),
        Id::Float(-2.75),
    ]
}

#[test]
fn test_request_round_trip_all_id_types() {
    for id in ids() {
        let req = Request::new("method.name", Some(json!({"a": [1, 2, {"b": null}]})), id);
        let decoded = Request::decode(&req.to_vec().unwrap()).unwrap();
        assert_eq!(decoded, req);
    }

    let notif = Request::notification("event", Some(json!([true])));
    let decoded = Request::decode(&notif.to_vec().unwrap()).unwrap();
    assert_eq!(decoded, notif);
    assert!(decoded.is_notification());
}

#[test]
fn test_response_round_trip_all_id_types() {
    for id in ids() {
        let ok = Response::success(json!({"nested": {"list": [1, 2.5, "x"]}}), id.clone()).unwrap();
        assert_eq!(Response::decode(&ok.to_vec().unwrap()).unwrap(), ok);

        let failed = Response::failure(
            JsonRpcErrorData::with_data(-32000, "server busy", json!({"retry_ms": 50})),
            id,
        );
        let decoded = Response::decode(&failed.to_vec().unwrap()).unwrap();
        assert_eq!(decoded, failed);
        assert_eq!(decoded.error().unwrap().unwrap().data, Some(json!({"retry_ms": 50})));
    }
}

#[test]
fn test_batch_round_trip() {
    let requests = vec![
        Request::new("a", Some(json!([1])), Id::Integer(1)),
        Request::notification("b", None),
        Request::new("c", Some(json!({"k": "v"})), Id::String("c".into())),
    ];
    let wire = codec::encode_batch(&requests).unwrap();
    assert_eq!(codec::decode_batch::<Request>(&wire).unwrap(), requests);

    let responses = vec![
        Response::success(json!(1), Id::Integer(1)).unwrap(),
        Response::failure(JsonRpcErrorData::method_not_found("c"), Id::String("c".into())),
    ];
    let wire = codec::encode_batch(&responses).unwrap();
    assert_eq!(codec::decode_batch::<Response>(&wire).unwrap(), responses);
}

#[test]
fn test_mixed_message_batch() {
    let wire = br#"[
        {"jsonrpc":"2.0","method":"notify"},
        {"jsonrpc":"2.0","method":"request","id":1},
        {"jsonrpc":"2.0","result":42,"id":2}
    ]"#;

    let messages = match codec::decode(wire).unwrap() {
        Packet::Batch(items) => items,
        Packet::Single(_) => panic!("expected batch"),
    };
    assert_eq!(messages.len(), 3);
    assert!(messages[0].is_notification());
    assert!(messages[1].is_request());
    assert_eq!(messages[2].as_response().unwrap().unmarshal_result::<i32>().unwrap(), 42);

    let reencoded = codec::encode_batch(&messages).unwrap();
    assert_eq!(codec::decode_batch::<Message>(&reencoded).unwrap(), messages);
}

#[test]
fn test_whitespace_inside_result_is_forwarded_verbatim() {
    let wire = br#"{"jsonrpc":"2.0","id":9,"result":{ "spaced" : [ 1 , 2 ] }}"#;
    let resp = Response::decode(wire).unwrap();
    assert_eq!(
        resp.to_vec().unwrap(),
        br#"{"jsonrpc":"2.0","id":9,"result":{ "spaced" : [ 1 , 2 ] }}"#
    );
}

#[test]
fn test_unknown_fields_ignored() {
    let resp = Response::decode(br#"{"jsonrpc":"2.0","id":1,"result":1,"trace":"abc"}"#).unwrap();
    assert_eq!(resp.to_vec().unwrap(), br#"{"jsonrpc":"2.0","id":1,"result":1}"#);
}

#[test]
fn test_error_fallback_shapes_through_envelope() {
    let cases: Vec<(&[u8], i64, &str)> = vec![
        (br#"{"jsonrpc":"2.0","id":1,"error":{"code":-32000,"message":"m"}}"#, -32000, "m"),
        (br#"{"jsonrpc":"2.0","id":1,"error":{"error":"s"}}"#, -32603, "s"),
        (br#"{"jsonrpc":"2.0","id":1,"error":"plain text"}"#, -32603, "\"plain text\""),
        (br#"{"jsonrpc":"2.0","id":1,"error":{"code":0,"message":"zero"}}"#, 0, "zero"),
    ];
    for (wire, code, message) in cases {
        let resp = Response::decode(wire).unwrap();
        let error = resp.error().unwrap().unwrap();
        assert_eq!(error.code, code);
        assert_eq!(error.message, message);
    }
}

#[test]
fn test_decode_failures_are_typed() {
    assert!(matches!(codec::decode(b"not valid json"), Err(Error::MalformedJson(_))));
    assert!(matches!(codec::decode(b""), Err(Error::EmptyInput)));
    assert!(matches!(
        codec::decode(br#"{"jsonrpc":"2.0","id":1,"result":1,"error":{"code":1,"message":"x"}}"#),
        Err(Error::ConflictingBody)
    ));
    assert!(matches!(
        codec::decode(br#"[{"jsonrpc":"2.0","id":1,"result":1},{"jsonrpc":"1.0","id":2,"result":2}]"#),
        Err(Error::ElementError { index: 1, .. })
    ));
}
