//! Frame + envelope vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use httpws_core::protocol::envelope::{decode, encode, Envelope};
use httpws_core::protocol::frame::{encode_frame, FrameHeader, HEADER_LEN};
use httpws_core::Result;

mod support;
use support::FrameVector;

fn parse(raw: &[u8]) -> Result<Envelope> {
    let header = FrameHeader::parse(raw)?;
    let body = raw.get(HEADER_LEN..).unwrap_or_default();
    assert_eq!(body.len(), header.body_len(), "vector body length mismatch");
    decode(body)?.into_envelope()
}

#[test]
fn frame_vectors() {
    let files = [
        "request_ping.json",
        "response_pong.json",
        "bad_version.json",
        "oversize.json",
        "header_too_short.json",
        "malformed_body.json",
        "both_set.json",
        "neither_set.json",
        "unknown_type.json",
    ];

    for f in files {
        let v = FrameVector::load(f);
        let raw = v.wire_bytes();
        let res = parse(&raw);

        if let Some(err) = v.expect_error {
            let e = res.expect_err("expected error");
            assert_eq!(e.kind().as_str(), err.code, "vector={}", v.description);
            continue;
        }

        let env = res.expect("expected ok envelope");
        let ex = v.expect.expect("missing expect block");

        match &env {
            Envelope::Request(req) => {
                assert_eq!(ex["type"], "REQUEST", "vector={}", v.description);
                assert_eq!(req.id, ex["id"].as_u64().unwrap(), "vector={}", v.description);
                assert_eq!(req.verb, ex["verb"].as_str().unwrap(), "vector={}", v.description);
                assert_eq!(req.path, ex["path"].as_str().unwrap(), "vector={}", v.description);
                assert_eq!(req.body.len() as u64, ex["body_len"].as_u64().unwrap(), "vector={}", v.description);
            }
            Envelope::Response(rsp) => {
                assert_eq!(ex["type"], "RESPONSE", "vector={}", v.description);
                assert_eq!(rsp.id, ex["id"].as_u64().unwrap(), "vector={}", v.description);
                assert_eq!(rsp.status as u64, ex["status"].as_u64().unwrap(), "vector={}", v.description);
                assert_eq!(rsp.message, ex["message"].as_str().unwrap(), "vector={}", v.description);
                let headers: Vec<&str> = ex["headers"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|h| h.as_str().unwrap())
                    .collect();
                assert_eq!(rsp.headers, headers, "vector={}", v.description);
                assert_eq!(rsp.body.len() as u64, ex["body_len"].as_u64().unwrap(), "vector={}", v.description);
            }
        }

        // Our encoder must produce the exact bytes other peers emit.
        let reencoded = encode_frame(&encode(env).unwrap()).unwrap();
        assert_eq!(reencoded.as_ref(), raw.as_slice(), "vector={}", v.description);
    }
}

#[test]
fn oversize_is_rejected_before_version_check() {
    // length over the limit AND a bad protocol id: length wins.
    let raw = [0x08, 0x00, 0x00, 0x01, 0x00, 0x02];
    let err = FrameHeader::parse(&raw).expect_err("must fail");
    assert!(err.to_string().contains("exceeds limit"), "{err}");
}

#[test]
fn max_body_len_is_accepted() {
    let raw = [0x08, 0x00, 0x00, 0x00, 0x00, 0x01];
    let header = FrameHeader::parse(&raw).unwrap();
    assert_eq!(header.body_len(), 128 * 1024 * 1024);
}
