//! Typed schema for the model's reply, parsed strictly. A reply that is not
//! valid JSON matching this shape fails through a single error path; there is
//! no markdown-fence stripping or substring extraction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplyParseError {
    #[error("model reply was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("model reply is missing the payload for action {0}")]
    MissingPayload(&'static str),
}

/// Action vocabulary the model may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CopilotAction {
    /// Replace the whole current document.
    UpdateDocument,
    /// Replace or create one or more named files.
    UpdateFiles,
    /// Request an image generation with the given prompt.
    GenerateImage,
    /// Conversational answer only, no content change.
    None,
}

impl CopilotAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpdateDocument => "UPDATE_DOCUMENT",
            Self::UpdateFiles => "UPDATE_FILES",
            Self::GenerateImage => "GENERATE_IMAGE",
            Self::None => "NONE",
        }
    }
}

/// The parsed model reply, relayed to the client verbatim on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopilotReply {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    pub action: CopilotAction,

    /// Payload for `UPDATE_DOCUMENT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,

    /// Payload for `UPDATE_FILES`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<String, String>>,

    /// Payload for `GENERATE_IMAGE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
}

/// Parse and validate the raw completion content.
pub fn parse_reply(content: &str) -> Result<CopilotReply, ReplyParseError> {
    let reply: CopilotReply = serde_json::from_str(content)?;

    match reply.action {
        CopilotAction::UpdateDocument if reply.document.is_none() => {
            return Err(ReplyParseError::MissingPayload("UPDATE_DOCUMENT"));
        }
        CopilotAction::UpdateFiles
            if reply.files.as_ref().is_none_or(BTreeMap::is_empty) =>
        {
            return Err(ReplyParseError::MissingPayload("UPDATE_FILES"));
        }
        CopilotAction::GenerateImage if reply.image_prompt.is_none() => {
            return Err(ReplyParseError::MissingPayload("GENERATE_IMAGE"));
        }
        _ => {}
    }

    Ok(reply)
}
