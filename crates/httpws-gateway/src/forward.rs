//! Gateway-initiated HTTP over a peer's tunnel.
//!
//! `ANY /tunnels/{id}/{*path}` is re-issued to the peer connected as `id`; the
//! peer's Response envelope becomes the HTTP response.

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::StatusCode,
    response::Response,
};

use httpws_core::protocol::envelope;

use crate::app_state::AppState;
use crate::error::HttpError;
use crate::tunnel::recorder::{header_lines, parse_header_line};

pub async fn forward(
    State(app): State<AppState>,
    Path((id, rest)): Path<(String, String)>,
    req: Request,
) -> Result<Response, HttpError> {
    let channel = app
        .channels()
        .get(&id)
        .ok_or_else(|| HttpError::not_found(format!("no tunnel connected as {id}")))?;

    let (parts, body) = req.into_parts();
    let mut path = format!("/{}", rest.trim_start_matches('/'));
    if let Some(q) = parts.uri.query() {
        path.push('?');
        path.push_str(q);
    }

    let body = axum::body::to_bytes(body, app.cfg().tunnel.max_body_bytes)
        .await
        .map_err(|e| HttpError::bad_request(format!("read request body: {e}")))?;

    let rsp = channel
        .call(
            parts.method.as_str(),
            &path,
            header_lines(&parts.headers),
            body.to_vec(),
            app.request_timeout(),
        )
        .await?;

    Ok(into_http_response(rsp))
}

/// Rebuild an HTTP response from a tunneled one. Unparseable header lines are
/// dropped; an out-of-range status becomes 502.
pub fn into_http_response(rsp: envelope::Response) -> Response {
    let status = u16::try_from(rsp.status)
        .ok()
        .and_then(|s| StatusCode::from_u16(s).ok())
        .unwrap_or(StatusCode::BAD_GATEWAY);

    let mut out = Response::new(Body::from(rsp.body));
    *out.status_mut() = status;
    for line in &rsp.headers {
        match parse_header_line(line) {
            Some((name, value)) => {
                out.headers_mut().append(name, value);
            }
            None => tracing::debug!(line = %line, "dropping malformed tunneled header"),
        }
    }
    out
}
