#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use httpws_core::error::ErrorKind;
use httpws_core::protocol::envelope::{decode, encode, Envelope, Message, MessageType, Request, Response};

fn round_trip(env: Envelope) -> Envelope {
    let bytes = encode(env).unwrap();
    decode(&bytes).unwrap().into_envelope().unwrap()
}

#[test]
fn request_round_trip() {
    let req = Request::new(42, "post", "/items?page=2")
        .with_body(b"{\"name\":\"x\"}".to_vec())
        .with_headers(vec!["Content-Type: application/json".into()]);
    let env = Envelope::Request(req);
    assert_eq!(round_trip(env.clone()), env);
}

#[test]
fn response_round_trip_with_binary_body() {
    let rsp = Response {
        id: u64::MAX,
        status: 404,
        message: "Not Found".into(),
        headers: vec!["X-A: 1,2".into(), "X-B: b".into()],
        body: (0u8..=255).collect(),
    };
    let env = Envelope::Response(rsp);
    assert_eq!(round_trip(env.clone()), env);
}

#[test]
fn default_request_still_carries_its_payload() {
    // An all-default Request must not collapse into "neither set".
    let env = Envelope::Request(Request::default());
    let back = round_trip(env.clone());
    assert_eq!(back, env);
    assert_eq!(back.message_type(), MessageType::Request);
}

#[test]
fn mismatched_tag_is_an_application_error() {
    let msg = Message {
        kind: MessageType::Response as i32,
        request: Some(Request::new(1, "GET", "/")),
        response: None,
    };
    let err = msg.into_envelope().expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Application);
    assert!(!err.is_fatal());
}

#[test]
fn garbage_is_a_fatal_decode_error() {
    let err = decode(&[0x0a, 0xff]).expect_err("must fail");
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert!(err.is_fatal());
}
