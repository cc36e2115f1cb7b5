//! WebSocket push of job transitions.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use candlefetch_jobs::{JobEvent, JobRecord};
use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, warn};

use crate::AppState;

pub(super) async fn job_updates(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Subscribe before the upgrade so no transition slips between the two.
    let events = state.bus().subscribe();
    ws.on_upgrade(move |socket| forward_events(socket, events))
}

async fn forward_events(mut socket: WebSocket, mut events: broadcast::Receiver<JobEvent>) {
    debug!("websocket subscriber connected");
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let frame = match event_frame(&event) {
                        Ok(frame) => frame,
                        Err(e) => {
                            warn!(job_id = %event.job.job_id, error = %e, "failed to encode job event");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket subscriber lagged, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Close(_)) | Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("websocket subscriber disconnected");
}

#[derive(Serialize)]
struct EventFrame<'a> {
    event: &'static str,
    data: &'a JobRecord,
}

/// Encodes an event as `{"event": "job_update", "data": <job>}`.
pub(super) fn event_frame(event: &JobEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&EventFrame {
        event: JobEvent::NAME,
        data: &event.job,
    })
}
