//! Admin WebSocket endpoint — live order-change push
//!
//! GET /api/ws?token=<JWT>
//! Auth: the JWT rides in a query parameter because browser WebSocket
//! clients cannot set custom headers.

use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::auth::user_auth;
use crate::error::{AppError, ErrorCode};
use crate::live::AdminEvent;
use crate::state::AppState;

/// Maximum concurrent admin WS connections per process
const MAX_ADMIN_WS: usize = 10;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<AppState> {
    Router::new().route("/api/ws", get(handle_admin_ws))
}

#[derive(Deserialize)]
pub struct WsAuthQuery {
    token: String,
}

/// GET /api/ws?token=<JWT>
pub async fn handle_admin_ws(
    State(state): State<AppState>,
    Query(query): Query<WsAuthQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let claims = user_auth::verify_token(&query.token, &state.jwt_secret).map_err(|e| {
        tracing::debug!("Admin WS JWT validation failed: {e}");
        AppError::new(ErrorCode::TokenExpired)
    })?;

    if !claims.role.is_admin() {
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    if !state.admin_hub.try_connect(MAX_ADMIN_WS) {
        return Err(AppError::new(ErrorCode::ConnectionLimitReached));
    }

    let email = claims.email;
    Ok(ws.on_upgrade(move |socket| admin_ws_session(socket, state, email)))
}

async fn admin_ws_session(socket: WebSocket, state: AppState, email: String) {
    let (mut sink, mut stream) = socket.split();

    tracing::info!(
        admin = %email,
        connections = state.admin_hub.connection_count(),
        "Admin WS connected"
    );

    let mut hub_rx = state.admin_hub.subscribe();

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(vec![].into())).await.is_err() {
                    break;
                }
            }

            event = hub_rx.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        // A slow consumer misses events rather than dropping
                        // the connection; resubscribe from the current
                        // position.
                        tracing::warn!(admin = %email, lagged = n, "Admin subscriber lagged, resubscribing");
                        hub_rx = state.admin_hub.subscribe();
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {} // Text, Binary — the admin channel is push-only
                }
            }
        }
    }

    state.admin_hub.disconnect();
    tracing::info!(admin = %email, "Admin WS disconnected");
}

async fn send_event<S>(sink: &mut S, event: &AdminEvent) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(event).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
