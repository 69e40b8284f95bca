//! HTTP and WebSocket transport.
//!
//! `/` doubles as the WebSocket endpoint (subprotocol `rover-control`) and
//! the client page. Each accepted socket runs its own task: frames read from
//! the socket become [`ServerEvent`]s for the shared driver, and messages the
//! driver queues for the participant are written back.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    http::Uri,
    response::Response,
    routing::get,
};
use rover_proto::PROTOCOL;
use tokio::sync::{Mutex, mpsc};

use crate::{
    assets::Assets,
    driver::{ServerDriver, ServerEvent},
    system_env::SystemEnv,
};

/// Driver shared by every socket task.
pub type SharedDriver = Arc<Mutex<ServerDriver<SystemEnv>>>;

/// State handed to the axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Arbitration state.
    pub driver: SharedDriver,
    /// Client files.
    pub assets: Arc<Assets>,
}

/// Build the router.
pub fn router(state: AppState) -> Router {
    Router::new().route("/", get(root)).fallback(asset).with_state(state)
}

async fn root(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    match upgrade {
        Ok(upgrade) => {
            let driver = Arc::clone(&state.driver);
            upgrade.protocols([PROTOCOL]).on_upgrade(move |socket| handle_socket(socket, driver))
        },
        Err(_) => state.assets.serve("/").await,
    }
}

async fn asset(State(state): State<AppState>, uri: Uri) -> Response {
    state.assets.serve(uri.path()).await
}

async fn handle_socket(mut socket: WebSocket, driver: SharedDriver) {
    if socket.protocol().is_none() {
        tracing::debug!("client did not negotiate {PROTOCOL}");
    }

    let (outbox, mut inbox) = mpsc::unbounded_channel();
    let participant = driver.lock().await.accept(outbox);

    let reason = loop {
        tokio::select! {
            incoming = socket.recv() => {
                let event = match incoming {
                    Some(Ok(Message::Text(text))) => {
                        ServerEvent::MessageReceived { participant, text: text.as_str().to_owned() }
                    },
                    Some(Ok(Message::Binary(data))) => {
                        ServerEvent::BinaryReceived { participant, len: data.len() }
                    },
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                    Some(Ok(Message::Close(_))) | None => break "closed by peer".to_owned(),
                    Some(Err(err)) => break format!("read error: {err}"),
                };
                driver.lock().await.process_event(event);
            },
            outgoing = inbox.recv() => {
                let Some(message) = outgoing else {
                    break "outbox closed".to_owned();
                };
                if let Err(err) = socket.send(Message::Text(message.token().to_owned().into())).await {
                    break format!("write error: {err}");
                }
            },
        }
    };

    driver.lock().await.process_event(ServerEvent::ConnectionClosed { participant, reason });
}
