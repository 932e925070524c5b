//! Frame vectors under `tests/vectors`: a hex-encoded frame plus either the
//! envelope it must decode to or the error code it must fail with.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrameVector {
    pub description: String,
    frame: HexFrame,
    #[serde(default)]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub expect_error: Option<ExpectedError>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExpectedError {
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HexFrame {
    encoding: String,
    data: String,
}

impl FrameVector {
    pub fn load(name: &str) -> Self {
        let path: PathBuf = [env!("CARGO_MANIFEST_DIR"), "tests", "vectors", name]
            .iter()
            .collect();
        let text = std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("read {}: {e}", path.display()));
        serde_json::from_str(&text).unwrap_or_else(|e| panic!("parse {name}: {e}"))
    }

    /// The frame exactly as it appears on the wire.
    pub fn wire_bytes(&self) -> Vec<u8> {
        assert_eq!(self.frame.encoding, "hex", "vector {}", self.description);
        hex::decode(&self.frame.data).expect("invalid hex in frame vector")
    }
}
