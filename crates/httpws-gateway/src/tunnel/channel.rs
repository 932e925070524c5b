//! Tunnel channel: one per upgraded connection.
//!
//! Tasks per channel:
//! - read loop: link -> frames -> `Message` -> inbound queue
//! - dispatch loop: sole writer to the link; routes inbound envelopes
//! - one short-lived task per inbound REQUEST
//!
//! Both queues hold a single item, so producers wait for the dispatch loop.
//! The only way out of `Running` is the cancellation token; whoever trips it
//! first wins and the dispatch loop closes the link on its way out.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, StatusCode};
use tokio::sync::{mpsc, oneshot, watch, Semaphore};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span};

use httpws_core::error::{CorrelationFault, Result, TunnelError};
use httpws_core::protocol::envelope::{self, Envelope, Message, Request, Response};

use crate::transport::{read_frame, write_frame, BufferedReader, LinkRead, LinkWrite};
use crate::tunnel::correlation::{CorrelationTable, PendingGuard};
use crate::tunnel::handler::HttpHandler;
use crate::tunnel::options::{SaturationPolicy, TunnelOptions};
use crate::tunnel::recorder::{parse_header_line, ResponseRecorder};

/// Authority used for synthetic requests; routing is done by the handler.
const LOCAL_AUTHORITY: &str = "localhost";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Running,
    Closing,
    Closed,
}

#[derive(Clone)]
pub struct TunnelChannel {
    shared: Arc<Shared>,
}

struct Shared {
    outbound: mpsc::Sender<Envelope>,
    pending: CorrelationTable,
    cancel: CancellationToken,
    state: watch::Sender<ChannelState>,
    handler: Arc<dyn HttpHandler>,
    permits: Arc<Semaphore>,
    opts: TunnelOptions,
    span: Span,
}

impl TunnelChannel {
    /// Start the read and dispatch loops over the two link halves.
    ///
    /// Every event the channel logs is emitted inside `span`.
    pub fn spawn<R, W>(
        reader: R,
        writer: W,
        handler: Arc<dyn HttpHandler>,
        opts: TunnelOptions,
        span: Span,
    ) -> Self
    where
        R: LinkRead,
        W: LinkWrite,
    {
        let (inbound_tx, inbound_rx) = mpsc::channel(1);
        let (outbound_tx, outbound_rx) = mpsc::channel(1);
        let (state, _) = watch::channel(ChannelState::Running);

        let shared = Arc::new(Shared {
            outbound: outbound_tx,
            pending: CorrelationTable::new(),
            cancel: CancellationToken::new(),
            state,
            handler,
            permits: Arc::new(Semaphore::new(opts.max_inflight_requests.max(1))),
            opts,
            span: span.clone(),
        });

        let mut read_task = tokio::spawn(
            read_loop(Arc::clone(&shared), BufferedReader::new(reader), inbound_tx)
                .instrument(span.clone()),
        );
        let mut dispatch_task = tokio::spawn(
            dispatch_loop(Arc::clone(&shared), writer, inbound_rx, outbound_rx)
                .instrument(span.clone()),
        );

        let supervisor = Arc::clone(&shared);
        tokio::spawn(
            async move {
                let read_first = tokio::select! {
                    r = &mut read_task => { log_join("read loop", r); true }
                    r = &mut dispatch_task => { log_join("dispatch loop", r); false }
                };
                // either loop leaving ends the channel, even by panic
                supervisor.close();
                if read_first {
                    log_join("dispatch loop", dispatch_task.await);
                } else {
                    log_join("read loop", read_task.await);
                }
                supervisor.state.send_replace(ChannelState::Closed);
                tracing::debug!("channel closed");
            }
            .instrument(span),
        );

        Self { shared }
    }

    /// Send `req` to the peer and wait for the matching response.
    ///
    /// Exactly one of reply, cancellation, or timeout ends the call, and the
    /// correlation entry is gone by the time this returns.
    pub async fn request(&self, req: Request, timeout: Duration) -> Result<Response> {
        let id = req.id;
        if id == 0 {
            return Err(TunnelError::empty_id());
        }

        let slot = self.shared.pending.register(id)?;
        self.exchange(req, slot, timeout).await
    }

    /// Like `request`, with the id allocated by the channel.
    pub async fn call(
        &self,
        verb: &str,
        path: &str,
        headers: Vec<String>,
        body: Vec<u8>,
        timeout: Duration,
    ) -> Result<Response> {
        let (id, slot) = self.shared.pending.register_next();
        let req = Request::new(id, verb, path)
            .with_headers(headers)
            .with_body(body);
        self.exchange(req, slot, timeout).await
    }

    /// Send an already registered request and wait on its slot.
    async fn exchange(
        &self,
        req: Request,
        slot: oneshot::Receiver<Response>,
        timeout: Duration,
    ) -> Result<Response> {
        let id = req.id;
        let shared = &self.shared;
        let _guard = PendingGuard::new(&shared.pending, id);

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        tokio::select! {
            sent = shared.enqueue(Envelope::Request(req)) => sent?,
            _ = &mut deadline => {
                tracing::warn!(parent: &shared.span, id, "request timed out before it was sent");
                return Err(TunnelError::Timeout);
            }
        }

        tokio::select! {
            reply = slot => match reply {
                Ok(rsp) if rsp.id == id => Ok(rsp),
                Ok(rsp) => {
                    tracing::warn!(parent: &shared.span, id, rsp = rsp.id, "response id mismatch");
                    Err(CorrelationFault::IdMismatch { expected: id, got: rsp.id }.into())
                }
                Err(_) => Err(TunnelError::ChannelClosed),
            },
            _ = shared.cancel.cancelled() => {
                tracing::warn!(parent: &shared.span, id, "channel closed while request pending");
                Err(TunnelError::ChannelClosed)
            }
            _ = &mut deadline => {
                tracing::warn!(parent: &shared.span, id, "request timed out");
                Err(TunnelError::Timeout)
            }
        }
    }

    /// Begin teardown. Idempotent.
    pub fn close(&self) {
        self.shared.close();
    }

    /// Resolves once both loops have exited.
    pub async fn wait_closed(&self) {
        let mut rx = self.shared.state.subscribe();
        let _ = rx.wait_for(|s| *s == ChannelState::Closed).await;
    }

    pub fn state(&self) -> ChannelState {
        *self.shared.state.borrow()
    }

    pub fn pending_requests(&self) -> usize {
        self.shared.pending.len()
    }

    /// Whether both handles refer to the same channel.
    pub fn same_channel(&self, other: &TunnelChannel) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Shared {
    fn close(&self) {
        self.state.send_if_modified(|s| {
            if *s == ChannelState::Running {
                *s = ChannelState::Closing;
                true
            } else {
                false
            }
        });
        self.cancel.cancel();
    }

    async fn enqueue(&self, env: Envelope) -> Result<()> {
        tokio::select! {
            _ = self.cancel.cancelled() => Err(TunnelError::ChannelClosed),
            sent = self.outbound.send(env) => sent.map_err(|_| TunnelError::ChannelClosed),
        }
    }

    /// Validate and route one inbound envelope. Errors are non-fatal.
    fn handle_frame(self: &Arc<Self>, msg: Message) -> Result<()> {
        match msg.into_envelope()? {
            Envelope::Request(req) => {
                self.spawn_request(req);
                Ok(())
            }
            Envelope::Response(rsp) => {
                self.handle_response(rsp);
                Ok(())
            }
        }
    }

    fn handle_response(&self, rsp: Response) {
        let id = rsp.id;
        if !self.pending.resolve(id, rsp) {
            let fault = CorrelationFault::Unmatched(id);
            tracing::warn!(id, error = %fault, "response discarded");
        }
    }

    fn spawn_request(self: &Arc<Self>, req: Request) {
        let permit = match self.opts.saturation {
            SaturationPolicy::Queue => None,
            SaturationPolicy::Reject => match Arc::clone(&self.permits).try_acquire_owned() {
                Ok(p) => Some(p),
                Err(_) => {
                    let shared = Arc::clone(self);
                    tokio::spawn(
                        async move {
                            if let Err(e) = shared.reject_request(req).await {
                                tracing::warn!(error = %e, "reject http request failed");
                            }
                        }
                        .instrument(self.span.clone()),
                    );
                    return;
                }
            },
        };

        let shared = Arc::clone(self);
        tokio::spawn(
            async move {
                let _permit = match permit {
                    Some(p) => p,
                    None => {
                        let acquired = tokio::select! {
                            _ = shared.cancel.cancelled() => return,
                            p = Arc::clone(&shared.permits).acquire_owned() => p,
                        };
                        match acquired {
                            Ok(p) => p,
                            Err(_) => return,
                        }
                    }
                };

                if let Err(e) = shared.handle_request(req).await {
                    tracing::warn!(error = %e, kind = e.kind().as_str(), "handle http request failed");
                }
            }
            .instrument(self.span.clone()),
        );
    }

    /// Serve one inbound request through the handler and queue its response.
    async fn handle_request(&self, req: Request) -> Result<()> {
        if req.id == 0 {
            return Err(TunnelError::empty_id());
        }
        let id = req.id;
        let http_req = build_http_request(req)?;

        let mut recorder = ResponseRecorder::new();
        let served = tokio::select! {
            _ = self.cancel.cancelled() => return Err(TunnelError::ChannelClosed),
            r = self.handler.serve(http_req, &mut recorder) => r,
        };

        let rsp = match served {
            Ok(()) => recorder.into_response(id),
            Err(e) => {
                tracing::warn!(id, error = %e, "http handler failed");
                status_response(id, StatusCode::BAD_GATEWAY)
            }
        };
        self.enqueue(Envelope::Response(rsp)).await
    }

    async fn reject_request(&self, req: Request) -> Result<()> {
        if req.id == 0 {
            return Err(TunnelError::empty_id());
        }
        tracing::warn!(id = req.id, "inbound request rejected: handler capacity reached");
        self.enqueue(Envelope::Response(status_response(
            req.id,
            StatusCode::SERVICE_UNAVAILABLE,
        )))
        .await
    }
}

fn log_join(task: &'static str, joined: std::result::Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!(task, error = %e, "channel task failed");
    }
}

fn status_response(id: u64, status: StatusCode) -> Response {
    Response::status_only(
        id,
        u32::from(status.as_u16()),
        status.canonical_reason().unwrap_or_default(),
    )
}

/// Turn a tunneled request into an HTTP request aimed at the local handler.
fn build_http_request(req: Request) -> Result<axum::http::Request<Body>> {
    let method = Method::from_bytes(req.verb.to_ascii_uppercase().as_bytes())
        .map_err(|e| TunnelError::Request(format!("invalid verb {:?}: {e}", req.verb)))?;

    let path = if req.path.is_empty() { "/" } else { req.path.as_str() };
    if !path.starts_with('/') {
        return Err(TunnelError::Request(format!("path must start with '/': {path:?}")));
    }

    let mut builder = axum::http::Request::builder()
        .method(method)
        .uri(format!("http://{LOCAL_AUTHORITY}{path}"));

    if let Some(headers) = builder.headers_mut() {
        for line in &req.headers {
            match parse_header_line(line) {
                Some((name, value)) => {
                    headers.append(name, value);
                }
                None => tracing::debug!(line = %line, "skipping malformed header line"),
            }
        }
    }

    builder
        .body(Body::from(req.body))
        .map_err(|e| TunnelError::Request(format!("build http request failed: {e}")))
}

async fn read_loop<R: LinkRead>(
    shared: Arc<Shared>,
    mut reader: BufferedReader<R>,
    inbound: mpsc::Sender<Message>,
) {
    loop {
        let frame = tokio::select! {
            _ = shared.cancel.cancelled() => break,
            f = read_frame(&mut reader) => f,
        };

        // framing errors leave the stream at an unknown offset: no retry
        let msg = match frame.and_then(|f| envelope::decode(&f.body)) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(error = %e, kind = e.kind().as_str(), "read loop failed");
                shared.close();
                break;
            }
        };

        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            sent = inbound.send(msg) => {
                if sent.is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("read loop exited");
}

async fn dispatch_loop<W: LinkWrite>(
    shared: Arc<Shared>,
    mut writer: W,
    mut inbound: mpsc::Receiver<Message>,
    mut outbound: mpsc::Receiver<Envelope>,
) {
    loop {
        tokio::select! {
            _ = shared.cancel.cancelled() => break,
            Some(msg) = inbound.recv() => {
                if let Err(e) = shared.handle_frame(msg) {
                    tracing::warn!(error = %e, "inbound envelope dropped");
                }
            }
            Some(env) = outbound.recv() => {
                let id = env.id();
                let written = tokio::select! {
                    _ = shared.cancel.cancelled() => break,
                    w = write_envelope(&mut writer, env) => w,
                };
                match written {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => {
                        tracing::warn!(id, error = %e, "write failed, closing channel");
                        shared.close();
                        break;
                    }
                    Err(e) => tracing::warn!(id, error = %e, "outbound envelope dropped"),
                }
            }
            else => break,
        }
    }

    shared.close();
    if let Err(e) = writer.close().await {
        tracing::warn!(error = %e, "closing link failed");
    }
    tracing::debug!("dispatch loop exited");
}

async fn write_envelope<W: LinkWrite>(writer: &mut W, env: Envelope) -> Result<()> {
    let body = envelope::encode(env)?;
    write_frame(writer, &body).await
}
