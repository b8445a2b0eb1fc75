//! WebSocket push channel.
//!
//! A client receives the live snapshot as soon as it connects and every
//! broadcast after that. It may also send transport commands on the same
//! socket.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::error::{PlayerError, Result};
use crate::http::state::AppState;
use crate::http::transport::volume_arg;
use crate::player::{PlaybackController, PlaybackState};

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    Play {
        #[serde(default)]
        position: Option<f64>,
    },
    Pause,
    Resume,
    Toggle,
    Stop,
    Seek {
        position: f64,
    },
    Volume {
        volume: f64,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    PlayerStateUpdate { state: PlaybackState },
    Error { message: String },
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| serve_socket(socket, state.controller))
}

async fn serve_socket(mut socket: WebSocket, controller: PlaybackController) {
    let mut observer = controller.subscribe();
    let initial = ServerEvent::PlayerStateUpdate {
        state: observer.current(),
    };
    if send(&mut socket, &initial).await.is_err() {
        return;
    }
    tracing::info!(
        "Client connected ({} observers)",
        controller.broadcaster().observer_count()
    );

    loop {
        tokio::select! {
            snapshot = observer.next() => {
                let Some(state) = snapshot else { break };
                if send(&mut socket, &ServerEvent::PlayerStateUpdate { state }).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = handle_client_event(&controller, text.as_str()).await {
                            let reply = ServerEvent::Error { message: e.to_string() };
                            if send(&mut socket, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("WebSocket receive error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("Client disconnected");
}

/// Decode one client message and apply it. The resulting state reaches the
/// client through the broadcast, not as a direct reply.
pub async fn handle_client_event(controller: &PlaybackController, text: &str) -> Result<()> {
    let event: ClientEvent = serde_json::from_str(text)
        .map_err(|e| PlayerError::InvalidRequest(e.to_string()))?;
    tracing::debug!("Client event: {:?}", event);

    match event {
        ClientEvent::Play { position } => {
            let position = match position {
                Some(p) => p,
                None => controller.state().await.position,
            };
            controller.play(position).await?;
        }
        ClientEvent::Pause => {
            controller.pause().await?;
        }
        ClientEvent::Resume => {
            controller.resume().await?;
        }
        ClientEvent::Toggle => {
            controller.toggle_pause().await?;
        }
        ClientEvent::Stop => {
            controller.stop().await?;
        }
        ClientEvent::Seek { position } => {
            controller.seek(position).await?;
        }
        ClientEvent::Volume { volume } => {
            controller.set_volume(volume_arg(volume)).await?;
        }
    }
    Ok(())
}

async fn send(socket: &mut WebSocket, event: &ServerEvent) -> std::result::Result<(), ()> {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!("Cannot encode event: {}", e);
            return Ok(());
        }
    };
    socket.send(Message::Text(text.into())).await.map_err(|e| {
        tracing::debug!("WebSocket send failed: {}", e);
    })
}
