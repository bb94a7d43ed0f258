//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::controller::Screen;
use crate::domain::{DifferentiationIntent, IntentInfo, Mode, SpecPatch};

/// Commands a client sends to its interaction session (WS frame or HTTP body).
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Ping,
    GetState,
    SelectMode {
        mode: Mode,
    },
    Back,
    SetSourceText {
        text: String,
    },
    SelectIntent {
        intent: DifferentiationIntent,
    },
    SetCustomText {
        text: String,
    },
    UpdateSpec(SpecPatch),
    Submit,
    Reset,
    DismissNotice,
}

/// Messages the server sends back.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Pong,
    State {
        #[serde(rename = "sessionId")]
        session_id: String,
        loading: bool,
        state: Screen,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub backend: &'static str,
}

#[derive(Serialize)]
pub struct IntentsOut {
    pub intents: Vec<IntentInfo>,
}

#[derive(Serialize)]
pub struct UploadOut {
    pub content: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifferentiateIn {
    pub intent: DifferentiationIntent,
    pub source_text: String,
    #[serde(default)]
    pub custom_text: String,
}

#[derive(Serialize)]
pub struct PromptOut {
    pub prompt: String,
}

#[derive(Deserialize)]
pub struct SectionsIn {
    pub markdown: String,
}
