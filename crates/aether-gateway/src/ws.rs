//! Live feed: pushes `LiveEvent`s to connected dashboard clients
//!
//! The feed is one-way. Client text frames are ignored. A client that falls
//! behind the broadcast buffer skips the missed events and keeps going.

use crate::server::DashboardState;
use aether_core::LiveEvent;
use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::{Sink, SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub async fn handle_connection(socket: WebSocket, state: Arc<DashboardState>) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut events = state.events.subscribe();

    // Current state first so the client can render before the next tick.
    let hello = LiveEvent::StateUpdated {
        state: state.store.agent_state().await,
    };
    if send_event(&mut ws_tx, &hello).await.is_err() {
        return;
    }
    debug!("dashboard client connected");

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => {
                let _ = ws_tx.send(WsMessage::Close(None)).await;
                return;
            }

            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(WsMessage::Close(_))) | None => {
                        debug!("dashboard client disconnected");
                        return;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        return;
                    }
                    Some(Ok(_)) => {}
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut ws_tx, &event).await.is_err() {
                            return;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("dashboard client lagged, dropped {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("live event channel closed");
                        return;
                    }
                }
            }
        }
    }
}

async fn send_event<S>(ws_tx: &mut S, event: &LiveEvent) -> Result<(), ()>
where
    S: Sink<WsMessage> + Unpin,
{
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(e) => {
            warn!("failed to encode live event: {}", e);
            return Ok(());
        }
    };
    ws_tx.send(WsMessage::Text(json)).await.map_err(|_| ())
}
