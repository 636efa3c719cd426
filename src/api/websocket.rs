//! WebSocket handler for the voice relay session
//!
//! Binary frames carry audio chunks for the current utterance; a JSON text
//! frame signals end-of-stream and triggers the pipeline. The reply audio
//! goes back as a single binary frame.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::ApiState;
use crate::session::{Session, TurnOutcome};

/// Incoming WebSocket control message from client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsIncoming {
    /// Client finished streaming the current utterance
    AudioStreamEnd {
        /// Optional client-declared target locale (e.g. "hi-IN")
        #[serde(default)]
        language: Option<String>,
    },
    /// Ping to keep connection alive
    Ping,
}

/// Outgoing WebSocket control message to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOutgoing {
    /// Connection established
    Connected { session_id: String },
    /// Acknowledgment for one received audio chunk
    ChunkReceived { status: &'static str },
    /// Terminal error for the current turn
    Error {
        stage: &'static str,
        message: String,
    },
    /// Pong response
    Pong,
}

/// Outbound frame: a JSON control event or binary reply audio
#[derive(Debug)]
pub enum Outbound {
    /// Serialized as a text frame
    Event(WsOutgoing),
    /// Sent as a binary frame
    Audio(Vec<u8>),
}

/// Build WebSocket router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/voice/{session_id}", get(ws_upgrade))
        .with_state(state)
}

/// Handle WebSocket upgrade request
async fn ws_upgrade(
    State(state): State<Arc<ApiState>>,
    Path(session_id): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<ApiState>, session_id: String) {
    let (mut sender, mut receiver) = socket.split();

    // Each connection gets its own session: buffer and in-flight state are
    // never shared across clients.
    let session = Arc::new(state.new_session(session_id.clone()));

    // Channel for sending frames back to the client
    let (tx, mut rx) = mpsc::channel::<Outbound>(32);

    if tx
        .send(Outbound::Event(WsOutgoing::Connected {
            session_id: session_id.clone(),
        }))
        .await
        .is_err()
    {
        return;
    }

    tracing::info!(session_id = %session_id, "WebSocket connected");

    // Forward outbound frames from the channel to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            let msg = match out {
                Outbound::Event(event) => match serde_json::to_string(&event) {
                    Ok(text) => Message::Text(text.into()),
                    Err(e) => {
                        tracing::error!(error = %e, "failed to serialize event");
                        continue;
                    }
                },
                Outbound::Audio(bytes) => Message::Binary(bytes.into()),
            };
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    // Handle incoming frames
    let session_recv = Arc::clone(&session);
    let tx_recv = tx.clone();
    let session_id_recv = session_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Binary(data) => {
                    session_recv.append_chunk(&data).await;
                    if tx_recv
                        .send(Outbound::Event(WsOutgoing::ChunkReceived {
                            status: "received",
                        }))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Message::Text(text) => {
                    handle_control(&text, &session_recv, &tx_recv).await;
                }
                Message::Ping(data) => {
                    // axum answers pongs automatically
                    tracing::trace!(len = data.len(), "received ping");
                }
                Message::Close(_) => {
                    tracing::info!(session_id = %session_id_recv, "WebSocket closed by client");
                    break;
                }
                Message::Pong(_) => {}
            }
        }
    });

    // Wait for either task to complete
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    tracing::info!(session_id = %session_id, "WebSocket disconnected");
}

/// Handle a single incoming control message
async fn handle_control(text: &str, session: &Arc<Session>, tx: &mpsc::Sender<Outbound>) {
    let incoming: WsIncoming = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            let _ = tx
                .send(Outbound::Event(WsOutgoing::Error {
                    stage: "transport",
                    message: format!("invalid message: {e}"),
                }))
                .await;
            return;
        }
    };

    match incoming {
        WsIncoming::Ping => {
            let _ = tx.send(Outbound::Event(WsOutgoing::Pong)).await;
        }
        WsIncoming::AudioStreamEnd { language } => {
            // Run the turn in its own task so chunk acknowledgments keep
            // flowing while the pipeline is in flight; an overlapping
            // stream-end then hits the session's busy rejection.
            let session = Arc::clone(session);
            let tx = tx.clone();
            tokio::spawn(async move {
                let outcome = session.finish_stream(language.as_deref()).await;
                let out = match outcome {
                    TurnOutcome::Completed(audio) => Outbound::Audio(audio),
                    TurnOutcome::Rejected => Outbound::Event(WsOutgoing::Error {
                        stage: "busy",
                        message: "a turn is already being processed, try again".to_string(),
                    }),
                    TurnOutcome::Failed { stage, message } => {
                        Outbound::Event(WsOutgoing::Error { stage, message })
                    }
                };
                let _ = tx.send(out).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_serializes() {
        let msg = WsOutgoing::Connected {
            session_id: "abc".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"session_id\":\"abc\""));
    }

    #[test]
    fn chunk_received_serializes() {
        let msg = WsOutgoing::ChunkReceived { status: "received" };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"chunk_received\""));
        assert!(json.contains("\"status\":\"received\""));
    }

    #[test]
    fn error_carries_stage_and_message() {
        let msg = WsOutgoing::Error {
            stage: "transcription",
            message: "could not transcribe audio".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"stage\":\"transcription\""));
        assert!(json.contains("could not transcribe audio"));
    }

    #[test]
    fn stream_end_deserializes_with_language() {
        let json = r#"{"type":"audio_stream_end","language":"te-IN"}"#;
        let msg: WsIncoming = serde_json::from_str(json).unwrap();
        assert!(matches!(
            msg,
            WsIncoming::AudioStreamEnd { language: Some(ref l) } if l == "te-IN"
        ));
    }

    #[test]
    fn stream_end_deserializes_without_language() {
        let json = r#"{"type":"audio_stream_end"}"#;
        let msg: WsIncoming = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, WsIncoming::AudioStreamEnd { language: None }));
    }
}
