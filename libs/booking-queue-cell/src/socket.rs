//! WebSocket subscriber sessions.
//!
//! A client joins one or more appointment channels by sending
//! `{"event":"joinAppointment","appointmentId":"<id>"}` (or just the id) and
//! then receives that appointment's events plus every global broadcast.

use std::collections::HashSet;

use axum::extract::ws::{Message, WebSocket};
use serde_json::{json, Value};
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::services::notifications::{ChannelReceiver, NotificationHub};

pub const JOIN_EVENT: &str = "joinAppointment";
pub const JOINED_EVENT: &str = "joined";

/// Extract the appointment id from a join request.
pub fn parse_join(text: &str) -> Option<Uuid> {
    let text = text.trim();

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(fields)) => {
            if fields.get("event").and_then(Value::as_str) != Some(JOIN_EVENT) {
                return None;
            }
            fields
                .get("appointmentId")
                .and_then(Value::as_str)
                .and_then(|id| Uuid::parse_str(id.trim()).ok())
        }
        Ok(Value::String(id)) => Uuid::parse_str(id.trim()).ok(),
        Ok(_) => None,
        Err(_) => Uuid::parse_str(text).ok(),
    }
}

pub async fn serve_subscriber(mut socket: WebSocket, hub: NotificationHub) {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
    let mut global = hub.subscribe_global();
    let mut forwarders = JoinSet::new();
    let mut joined = HashSet::new();

    debug!("Subscriber connected");

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                let text = match incoming {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        debug!("Subscriber socket error: {}", e);
                        break;
                    }
                };

                let Some(appointment_id) = parse_join(text.as_str()) else {
                    debug!("Ignoring unrecognised subscriber message");
                    continue;
                };

                if joined.insert(appointment_id) {
                    let channel = appointment_id.to_string();
                    let receiver = hub.join_channel(&channel).await;
                    forwarders.spawn(forward(receiver, outbound_tx.clone()));
                    info!("Subscriber joined appointment {}", appointment_id);
                }

                let ack = json!({
                    "event": JOINED_EVENT,
                    "data": { "appointmentId": appointment_id },
                });
                if socket.send(Message::Text(ack.to_string().into())).await.is_err() {
                    break;
                }
            }
            Some(message) = outbound_rx.recv() => {
                if socket.send(Message::Text(message.into())).await.is_err() {
                    break;
                }
            }
            global_message = global.recv() => {
                match global_message {
                    Ok(message) => {
                        if socket.send(Message::Text(message.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Subscriber lagged behind global channel, skipped {}", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    forwarders.shutdown().await;
    hub.prune_idle_channels().await;
    debug!("Subscriber disconnected after joining {} appointments", joined.len());
}

async fn forward(mut receiver: ChannelReceiver, outbound: mpsc::UnboundedSender<String>) {
    loop {
        match receiver.recv().await {
            Ok(message) => {
                if outbound.send(message).is_err() {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!("Subscriber lagged behind appointment channel, skipped {}", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_join_event() {
        let id = Uuid::new_v4();
        let text = format!(r#"{{"event":"joinAppointment","appointmentId":"{}"}}"#, id);
        assert_eq!(parse_join(&text), Some(id));
    }

    #[test]
    fn accepts_bare_id_in_any_case() {
        let id = Uuid::new_v4();
        assert_eq!(parse_join(&id.to_string()), Some(id));
        assert_eq!(parse_join(&id.to_string().to_uppercase()), Some(id));
        assert_eq!(parse_join(&format!("\"{}\"", id)), Some(id));
    }

    #[test]
    fn rejects_other_messages() {
        let id = Uuid::new_v4();
        let text = format!(r#"{{"event":"leave","appointmentId":"{}"}}"#, id);
        assert_eq!(parse_join(&text), None);
        assert_eq!(parse_join("hello"), None);
        assert_eq!(parse_join("42"), None);
    }
}
