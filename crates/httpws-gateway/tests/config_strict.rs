#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use httpws_gateway::config;
use httpws_gateway::tunnel::SaturationPolicy;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8080"
tunnel:
  max_inflight_requets: 8 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.kind().as_str(), "CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.path, "/websocket");
    assert_eq!(cfg.tunnel.max_inflight_requests, 64);
    assert_eq!(cfg.tunnel.saturation, SaturationPolicy::Queue);
    assert_eq!(cfg.tunnel.request_timeout(), Duration::from_secs(30));
}

#[test]
fn ok_full_config() {
    let ok = r#"
version: 1
gateway:
  listen: "127.0.0.1:9000"
  path: "/ws"
tunnel:
  max_inflight_requests: 4
  saturation: reject
  request_timeout_ms: 1500
  max_body_bytes: 1024
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.gateway.listen_addr().unwrap().port(), 9000);
    let opts = cfg.tunnel.options();
    assert_eq!(opts.max_inflight_requests, 4);
    assert_eq!(opts.saturation, SaturationPolicy::Reject);
    assert_eq!(cfg.tunnel.request_timeout(), Duration::from_millis(1500));
}

#[test]
fn rejects_out_of_range_values() {
    for bad in [
        "version: 2\n",
        "version: 1\ngateway:\n  listen: \"not-an-addr\"\n",
        "version: 1\ngateway:\n  path: \"websocket\"\n",
        "version: 1\ngateway:\n  path: \"/ping\"\n",
        "version: 1\ngateway:\n  path: \"/tunnels\"\n",
        "version: 1\ntunnel:\n  max_inflight_requests: 0\n",
        "version: 1\ntunnel:\n  request_timeout_ms: 10\n",
        "version: 1\ntunnel:\n  max_body_bytes: 0\n",
        "version: 1\ntunnel:\n  saturation: drop\n",
    ] {
        let err = config::load_from_str(bad).expect_err(bad);
        assert_eq!(err.kind().as_str(), "CONFIG", "{bad}");
    }
}

#[test]
fn shipped_config_file_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../httpws.yaml");
    let cfg = config::load_from_file(path).expect("shipped config must load");
    assert_eq!(cfg.gateway.path, "/websocket");
    assert_eq!(cfg.tunnel.max_body_bytes, 16 * 1024 * 1024);
}

#[test]
fn missing_file_names_the_path() {
    let err = config::load_from_file("does/not/exist.yaml").expect_err("must fail");
    assert_eq!(err.kind().as_str(), "CONFIG");
    assert!(err.to_string().contains("does/not/exist.yaml"), "{err}");
}
