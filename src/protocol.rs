//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Field names are snake_case to match the browser client.

use serde::{Deserialize, Serialize};

use crate::domain::SettingsIn;
use crate::engine::{Started, Submission};
use crate::error::EngineError;
use crate::profile::Analysis;
use crate::report::Report;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Analyze {
        resume_text: String,
        jd_text: String,
    },
    StartSession {
        resume_text: String,
        jd_text: String,
        settings: SettingsIn,
    },
    SubmitAnswer {
        session_id: String,
        question_id: String,
        answer_text: String,
        time_taken_sec: u32,
    },
    GetReport {
        session_id: String,
    },
}

impl ClientWsMessage {
    /// Message type for logs; payloads may carry résumé or answer text.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientWsMessage::Ping => "ping",
            ClientWsMessage::Analyze { .. } => "analyze",
            ClientWsMessage::StartSession { .. } => "start_session",
            ClientWsMessage::SubmitAnswer { .. } => "submit_answer",
            ClientWsMessage::GetReport { .. } => "get_report",
        }
    }
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Analysis {
        #[serde(flatten)]
        analysis: Analysis,
    },
    SessionStarted {
        #[serde(flatten)]
        started: Started,
    },
    AnswerResult {
        #[serde(flatten)]
        submission: Submission,
    },
    Report {
        #[serde(flatten)]
        report: Report,
    },
    Error {
        code: String,
        message: String,
        retryable: bool,
    },
}

impl From<EngineError> for ServerWsMessage {
    fn from(e: EngineError) -> Self {
        ServerWsMessage::Error {
            code: e.code().into(),
            message: e.to_string(),
            retryable: e.retryable(),
        }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct AnalyzeIn {
    pub resume_text: String,
    pub jd_text: String,
}

#[derive(Debug, Deserialize)]
pub struct StartIn {
    pub resume_text: String,
    pub jd_text: String,
    pub settings: SettingsIn,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub session_id: String,
    pub question_id: String,
    pub answer_text: String,
    pub time_taken_sec: u32,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthOut {
    pub ok: bool,
    pub sessions: usize,
    pub scorer: String,
}
