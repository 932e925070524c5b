//! In-memory response sink.
//!
//! Captures what an HTTP handler produced (status, headers, body) so it can be
//! packaged into a `Response` envelope. No socket is involved.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use bytes::BytesMut;

use httpws_core::error::{Result, TunnelError};
use httpws_core::protocol::envelope::Response;

#[derive(Debug, Clone)]
pub struct ResponseRecorder {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl Default for ResponseRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    pub fn write_header(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn append_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    pub fn write(&mut self, chunk: &[u8]) -> usize {
        self.body.extend_from_slice(chunk);
        chunk.len()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Copy a handler's response into the recorder, buffering at most
    /// `limit` body bytes.
    pub async fn record(&mut self, response: axum::http::Response<Body>, limit: usize) -> Result<()> {
        let (parts, body) = response.into_parts();
        self.write_header(parts.status);
        for (name, value) in parts.headers.iter() {
            self.append_header(name.clone(), value.clone());
        }

        let bytes = axum::body::to_bytes(body, limit)
            .await
            .map_err(|e| TunnelError::Application(format!("buffer response body: {e}")))?;
        self.write(&bytes);
        Ok(())
    }

    pub fn header_lines(&self) -> Vec<String> {
        header_lines(&self.headers)
    }

    pub fn into_response(self, id: u64) -> Response {
        Response {
            id,
            status: u32::from(self.status.as_u16()),
            message: self.status.canonical_reason().unwrap_or_default().to_string(),
            headers: self.header_lines(),
            body: self.body.to_vec(),
        }
    }
}

/// `"Name: v1,v2"` per distinct header name, in first-seen order.
pub fn header_lines(headers: &HeaderMap) -> Vec<String> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(",");
            format!("{}: {}", canonical_name(name.as_str()), joined)
        })
        .collect()
}

/// `"Name: value"` -> typed pair; `None` if either half is not valid HTTP.
pub fn parse_header_line(line: &str) -> Option<(HeaderName, HeaderValue)> {
    let (name, value) = line.split_once(':')?;
    let name = HeaderName::from_bytes(name.trim().as_bytes()).ok()?;
    let value = HeaderValue::from_str(value.trim()).ok()?;
    Some((name, value))
}

/// `content-type` -> `Content-Type`.
fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn header_lines_join_repeated_values() {
        let mut rec = ResponseRecorder::new();
        rec.append_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("a"));
        rec.append_header(HeaderName::from_static("content-type"), HeaderValue::from_static("text/plain"));
        rec.append_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("b"));

        let lines = rec.header_lines();
        assert_eq!(lines, vec!["X-Trace: a,b", "Content-Type: text/plain"]);
    }

    #[test]
    fn into_response_carries_reason_phrase() {
        let mut rec = ResponseRecorder::new();
        rec.write_header(StatusCode::NOT_FOUND);
        rec.write(b"missing");

        let rsp = rec.into_response(9);
        assert_eq!(rsp.id, 9);
        assert_eq!(rsp.status, 404);
        assert_eq!(rsp.message, "Not Found");
        assert_eq!(rsp.body, b"missing");
    }

    #[test]
    fn parse_header_line_trims_and_rejects_garbage() {
        let (name, value) = parse_header_line("Accept:  text/html ").unwrap();
        assert_eq!(name, "accept");
        assert_eq!(value, "text/html");
        assert!(parse_header_line("no separator").is_none());
        assert!(parse_header_line("bad name: x").is_none());
    }
}
