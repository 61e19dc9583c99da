//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the session engine. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip_all)]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "mock_interview", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip_all)]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "mock_interview", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "mock_interview", kind = incoming.kind(), "WS received");
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error {
            code: "INVALID_REQUEST".into(),
            message: format!("Invalid JSON: {}", e),
            retryable: false,
          },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "code": "INTERNAL", "message": format!("Serialization error: {}", e), "retryable": false }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "mock_interview", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "mock_interview", "WebSocket disconnected");
}

async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  let engine = &state.engine;
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Analyze { resume_text, jd_text } => {
      ServerWsMessage::Analysis { analysis: engine.analyze(&resume_text, &jd_text) }
    }

    ClientWsMessage::StartSession { resume_text, jd_text, settings } => {
      match engine.start(&resume_text, &jd_text, settings).await {
        Ok(started) => ServerWsMessage::SessionStarted { started },
        Err(e) => e.into(),
      }
    }

    ClientWsMessage::SubmitAnswer { session_id, question_id, answer_text, time_taken_sec } => {
      match engine.submit_answer(&session_id, &question_id, &answer_text, time_taken_sec).await {
        Ok(submission) => ServerWsMessage::AnswerResult { submission },
        Err(e) => e.into(),
      }
    }

    ClientWsMessage::GetReport { session_id } => match engine.get_report(&session_id).await {
      Ok(report) => ServerWsMessage::Report { report },
      Err(e) => e.into(),
    },
  }
}
