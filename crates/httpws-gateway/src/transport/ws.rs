//! WebSocket upgrade and the axum-backed link halves.
//!
//! Each upgraded socket becomes one `TunnelChannel`, registered under the
//! `?id=` the peer supplied (or a generated one) until it closes.

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Deserialize;

use httpws_core::error::{Result, TunnelError};
use httpws_core::protocol::frame::{HEADER_LEN, MAX_BODY_LEN};

use crate::app_state::AppState;
use crate::transport::link::{LinkMessage, LinkRead, LinkWrite};
use crate::tunnel::TunnelChannel;

pub struct WsReader(SplitStream<WebSocket>);

pub struct WsWriter(SplitSink<WebSocket, Message>);

pub fn split(socket: WebSocket) -> (WsReader, WsWriter) {
    let (tx, rx) = socket.split();
    (WsReader(rx), WsWriter(tx))
}

#[async_trait]
impl LinkRead for WsReader {
    async fn read_message(&mut self) -> Result<LinkMessage> {
        match self.0.next().await {
            None => Err(TunnelError::Transport("websocket closed".into())),
            Some(Err(e)) => Err(TunnelError::Transport(format!("websocket read: {e}"))),
            Some(Ok(msg)) => Ok(match msg {
                Message::Binary(b) => LinkMessage::Binary(b),
                Message::Text(t) => LinkMessage::Text(t),
                Message::Ping(p) => LinkMessage::Ping(p),
                Message::Pong(p) => LinkMessage::Pong(p),
                Message::Close(_) => LinkMessage::Close,
            }),
        }
    }
}

#[async_trait]
impl LinkWrite for WsWriter {
    async fn write_binary(&mut self, data: Vec<u8>) -> Result<()> {
        self.0
            .send(Message::Binary(data))
            .await
            .map_err(|e| TunnelError::Transport(format!("websocket write: {e}")))
    }

    async fn close(&mut self) -> Result<()> {
        // the peer may already be gone; the sink is finished either way
        if let Err(e) = self.0.send(Message::Close(None)).await {
            tracing::debug!(error = %e, "websocket close frame not sent");
        }
        self.0
            .close()
            .await
            .map_err(|e| TunnelError::Transport(format!("websocket close: {e}")))
    }
}

#[derive(Debug, Deserialize)]
pub struct UpgradeQuery {
    pub id: Option<String>,
}

pub async fn ws_upgrade(
    State(app): State<AppState>,
    Query(q): Query<UpgradeQuery>,
    ws: std::result::Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::warn!(reason = %rejection, "websocket upgrade rejected");
            return rejection.into_response();
        }
    };

    let id = q
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| app.channels().generate_id());

    let limit = MAX_BODY_LEN as usize + HEADER_LEN;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| run_tunnel(app, id, socket))
}

/// Drive one upgraded socket until its channel closes.
pub async fn run_tunnel(app: AppState, id: String, socket: WebSocket) {
    let span = tracing::info_span!("tunnel", id = %id);
    let (reader, writer) = split(socket);
    let channel = TunnelChannel::spawn(
        reader,
        writer,
        app.handler(),
        app.tunnel_options(),
        span.clone(),
    );

    if let Some(old) = app.channels().insert(id.clone(), channel.clone()) {
        tracing::info!(parent: &span, "replacing existing tunnel with the same id");
        old.close();
    }
    tracing::info!(parent: &span, "tunnel connected");

    channel.wait_closed().await;
    app.channels().remove(&id, &channel);
    tracing::info!(parent: &span, "tunnel disconnected");
}
