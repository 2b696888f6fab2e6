use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use runtime::{events::DASHBOARD_CONNECTED, DashboardMessage, Subscription};
use tracing::{info, warn};

use crate::state::AppState;

pub async fn dashboard_socket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| stream_dashboard(socket, state))
}

async fn stream_dashboard(mut socket: WebSocket, state: AppState) {
    let mut subscription = state.broadcaster().subscribe();
    let id = subscription.id();
    info!(subscriber = id.0, "dashboard connected");

    let reason = pump_frames(&mut socket, &mut subscription, state.send_timeout()).await;

    state.broadcaster().unsubscribe(id);
    info!(subscriber = id.0, reason, "dashboard disconnected");
}

async fn pump_frames(
    socket: &mut WebSocket,
    subscription: &mut Subscription,
    send_timeout: Duration,
) -> &'static str {
    match DashboardMessage::system_log(DASHBOARD_CONNECTED).and_then(|welcome| welcome.to_json()) {
        Ok(welcome) => {
            if send_frame(socket, welcome, send_timeout).await.is_err() {
                return "welcome send failed";
            }
        }
        Err(err) => warn!(%err, "failed to build dashboard welcome"),
    }

    // Inbound traffic only signals liveness; its content is ignored.
    loop {
        tokio::select! {
            inbound = socket.recv() => {
                match inbound {
                    Some(Ok(Message::Close(_))) | None => return "client closed",
                    Some(Ok(_)) => {}
                    Some(Err(_)) => return "protocol error",
                }
            }
            frame = subscription.recv() => {
                match frame {
                    Some(frame) => {
                        if send_frame(socket, frame.to_string(), send_timeout).await.is_err() {
                            return "send failed";
                        }
                    }
                    None => return "dropped by broadcaster",
                }
            }
        }
    }
}

async fn send_frame(socket: &mut WebSocket, frame: String, send_timeout: Duration) -> Result<(), ()> {
    match tokio::time::timeout(send_timeout, socket.send(Message::Text(frame))).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(_)) | Err(_) => Err(()),
    }
}
