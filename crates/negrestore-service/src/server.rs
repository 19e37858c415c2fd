//! WebSocket endpoint for the image store.
//!
//! Each connection gets its own task. Text frames carry one
//! [`ClientRequest`] each and are answered with one [`ServerResponse`], in
//! order.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

use crate::config::ServiceConfig;
use crate::ipc::{self, ClientRequest, ErrorKind, ServerResponse};
use crate::retention;
use crate::store::ImageStore;

/// Bind `config.addr`, start the periodic sweep, and serve forever.
pub async fn serve(config: &ServiceConfig, store: Arc<ImageStore>) -> std::io::Result<()> {
    let listener = TcpListener::bind(&config.addr).await?;
    tracing::info!("WebSocket server listening on ws://{}", listener.local_addr()?);
    retention::spawn_sweeper(Arc::clone(&store), config.sweep_interval);
    serve_listener(listener, store).await
}

/// Accept connections on an already bound listener.
pub async fn serve_listener(listener: TcpListener, store: Arc<ImageStore>) -> std::io::Result<()> {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!("accept failed: {e}");
                continue;
            }
        };
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            tracing::info!("client connected: {peer}");
            handle_connection(stream, store).await;
            tracing::info!("client disconnected: {peer}");
        });
    }
}

async fn handle_connection(stream: TcpStream, store: Arc<ImageStore>) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::error!("WebSocket handshake failed: {e}");
            return;
        }
    };
    let (mut ws_sink, mut ws_source) = ws_stream.split();

    while let Some(frame) = ws_source.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::warn!("WebSocket read failed: {e}");
                break;
            }
        };

        let response = match serde_json::from_str::<ClientRequest>(text.as_str()) {
            Ok(request) => handle_request(&store, request).await,
            Err(e) => {
                tracing::warn!("Failed to parse client message: {e}");
                ServerResponse::error(ErrorKind::InvalidInput, format!("malformed request: {e}"))
            }
        };

        let json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize ServerResponse: {e}");
                continue;
            }
        };
        if ws_sink.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}

/// Answer one request against `store`.
///
/// Upload and process requests also schedule a retention sweep in the
/// background.
pub async fn handle_request(store: &Arc<ImageStore>, request: ClientRequest) -> ServerResponse {
    let (op, result) = match request {
        ClientRequest::Ping => return ServerResponse::Pong,
        ClientRequest::Upload { content_type, data } => {
            let result = match ipc::decode_payload(&data) {
                Ok(bytes) => store.save_upload(&content_type, bytes).await,
                Err(e) => {
                    return ServerResponse::error(
                        ErrorKind::InvalidInput,
                        format!("payload is not valid base64: {e}"),
                    );
                }
            };
            schedule_sweep(store);
            ("upload", result.map(|name| ServerResponse::Uploaded { name }))
        }
        ClientRequest::Process { name } => {
            let result = store.process(&name).await;
            schedule_sweep(store);
            ("process", result.map(|name| ServerResponse::Processed { name }))
        }
        ClientRequest::Fetch { name } => {
            let result = store.fetch(&name).await;
            ("fetch", result.map(|bytes| ServerResponse::image(name, &bytes)))
        }
    };

    result.unwrap_or_else(|e| {
        let kind = e.kind();
        if kind == ErrorKind::Internal {
            tracing::error!(op, "request failed: {e}");
        } else {
            tracing::warn!(op, ?kind, "request rejected: {e}");
        }
        ServerResponse::error(kind, e.to_string())
    })
}

fn schedule_sweep(store: &Arc<ImageStore>) {
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || {
        let report = store.sweep_now();
        if !report.removed.is_empty() {
            tracing::info!(removed = report.removed.len(), "post-request sweep done");
        }
    });
}
