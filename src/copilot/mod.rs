//! The AI copilot request path: prompt assembly and strict reply parsing.
//!
//! Each request is a single linear pass (credit check, prompt assembly,
//! upstream dispatch, ledger debit) with no retries and no queued state.
//! The flow itself lives in [`crate::services::copilot_service`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod prompt;
pub mod reply;

pub use prompt::assemble_system_prompt;
pub use reply::{CopilotAction, CopilotReply, ReplyParseError, parse_reply};

/// Which system prompt template the proxy assembles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopilotMode {
    /// Editing a single titled HTML document (encyclopedia article).
    Article,
    /// Editing a set of named files (site code).
    Coder,
}

/// Contextual data the caller is currently editing. Which fields matter
/// depends on the mode; absent fields mean "create from scratch".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub html: Option<String>,

    /// Named file contents for coder mode. Ordered map so the assembled
    /// prompt is deterministic for identical inputs.
    #[serde(default)]
    pub files: Option<BTreeMap<String, String>>,
}

impl RequestContext {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.html.is_none()
            && self.files.as_ref().is_none_or(BTreeMap::is_empty)
    }
}

/// Inbound body of `POST /api/copilot/chat`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<crate::clients::completion::ChatMessage>,

    /// Overrides the configured default model when present.
    #[serde(default)]
    pub model: Option<String>,

    pub mode: CopilotMode,

    #[serde(default)]
    pub current_context: RequestContext,
}
