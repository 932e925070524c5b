//! Request/Response envelope (protobuf wire encoding).
//!
//! `Message` is the raw decoded value and may violate the union invariant;
//! `Message::into_envelope` is the only way to obtain a dispatchable
//! `Envelope`.

use bytes::{Bytes, BytesMut};
use prost::Message as _;

use crate::error::{Result, TunnelError};
use crate::protocol::frame::MAX_BODY_LEN;

/// Envelope type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    Unspecified = 0,
    Request = 1,
    Response = 2,
}

/// Tunneled HTTP request.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct Request {
    /// Caller-assigned, non-zero.
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(string, tag = "2")]
    pub verb: String,
    /// Path plus optional query, e.g. `/items?page=2`.
    #[prost(string, tag = "3")]
    pub path: String,
    #[prost(bytes = "vec", tag = "4")]
    pub body: Vec<u8>,
    /// `"Name: value"` lines.
    #[prost(string, repeated, tag = "5")]
    pub headers: Vec<String>,
}

impl Request {
    pub fn new(id: u64, verb: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id,
            verb: verb.into(),
            path: path.into(),
            body: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers;
        self
    }
}

/// Tunneled HTTP response. `id` echoes the originating request.
#[derive(Clone, PartialEq, Eq, prost::Message)]
pub struct Response {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint32, tag = "2")]
    pub status: u32,
    /// Reason phrase, e.g. `OK`.
    #[prost(string, tag = "3")]
    pub message: String,
    /// `"Name: value"` lines; repeated values are comma-joined.
    #[prost(string, repeated, tag = "4")]
    pub headers: Vec<String>,
    #[prost(bytes = "vec", tag = "5")]
    pub body: Vec<u8>,
}

impl Response {
    /// Bodyless response carrying only a status line.
    pub fn status_only(id: u64, status: u32, message: impl Into<String>) -> Self {
        Self {
            id,
            status,
            message: message.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

/// Raw wire message as decoded from a frame body.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Message {
    #[prost(enumeration = "MessageType", tag = "1")]
    pub kind: i32,
    #[prost(message, optional, tag = "2")]
    pub request: Option<Request>,
    #[prost(message, optional, tag = "3")]
    pub response: Option<Response>,
}

impl Message {
    /// Enforce the union invariant: exactly one payload, matching the tag.
    pub fn into_envelope(self) -> Result<Envelope> {
        let kind = MessageType::try_from(self.kind);
        match (kind, self.request, self.response) {
            (_, Some(_), Some(_)) => Err(TunnelError::Application(
                "request and response both set".into(),
            )),
            (Ok(MessageType::Request), Some(req), None) => Ok(Envelope::Request(req)),
            (Ok(MessageType::Response), None, Some(rsp)) => Ok(Envelope::Response(rsp)),
            (Ok(MessageType::Request), _, _) => Err(TunnelError::Application(
                "type REQUEST without request".into(),
            )),
            (Ok(MessageType::Response), _, _) => Err(TunnelError::Application(
                "type RESPONSE without response".into(),
            )),
            _ => Err(TunnelError::Application(format!(
                "unknown message type {}",
                self.kind
            ))),
        }
    }
}

/// Validated envelope: exactly one of Request or Response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Request(Request),
    Response(Response),
}

impl Envelope {
    pub fn id(&self) -> u64 {
        match self {
            Envelope::Request(r) => r.id,
            Envelope::Response(r) => r.id,
        }
    }

    pub fn message_type(&self) -> MessageType {
        match self {
            Envelope::Request(_) => MessageType::Request,
            Envelope::Response(_) => MessageType::Response,
        }
    }
}

impl From<Envelope> for Message {
    fn from(env: Envelope) -> Self {
        let kind = env.message_type() as i32;
        match env {
            Envelope::Request(req) => Message {
                kind,
                request: Some(req),
                response: None,
            },
            Envelope::Response(rsp) => Message {
                kind,
                request: None,
                response: Some(rsp),
            },
        }
    }
}

/// Serialize an envelope into a frame body.
pub fn encode(env: Envelope) -> Result<Bytes> {
    let msg = Message::from(env);
    let len = msg.encoded_len();
    if len > MAX_BODY_LEN as usize {
        return Err(TunnelError::Encode(format!(
            "envelope of {len} bytes exceeds frame limit"
        )));
    }

    let mut buf = BytesMut::with_capacity(len);
    msg.encode(&mut buf)
        .map_err(|e| TunnelError::Encode(e.to_string()))?;
    Ok(buf.freeze())
}

/// Deserialize exactly one frame body. No validation of the union invariant.
pub fn decode(body: &[u8]) -> Result<Message> {
    Ok(Message::decode(body)?)
}
