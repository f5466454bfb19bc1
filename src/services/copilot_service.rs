//! Domain service for the copilot request path.
//!
//! A request is one linear pass: credit check, prompt assembly, upstream
//! dispatch, ledger debit. Every error is terminal; nothing is retried.

use thiserror::Error;

use crate::copilot::{ChatRequest, CopilotReply};

/// The three failure signals of the copilot path, plus internal storage
/// failures that occur before anything was dispatched.
#[derive(Debug, Error)]
pub enum CopilotError {
    /// No resolvable identity on the request. The ledger is never touched.
    #[error("Sign in to use the copilot")]
    AuthRequired,

    /// Balance is exhausted. Distinct from other errors so the caller can
    /// present a top-up action. No side effects.
    #[error("You are out of fuel. Top up to keep going")]
    OutOfFuel,

    /// The upstream call failed or returned something that is not a valid
    /// reply. Opaque beyond the message string; never debited.
    #[error("{0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for CopilotError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for copilot chat.
#[async_trait::async_trait]
pub trait CopilotService: Send + Sync {
    /// Runs one copilot request for the given account.
    ///
    /// `account_id` is `None` when the caller presented no identity; the
    /// implementation must reject that without reading the ledger.
    ///
    /// # Errors
    ///
    /// [`CopilotError::AuthRequired`], [`CopilotError::OutOfFuel`], or
    /// [`CopilotError::Upstream`] per the request path contract.
    async fn chat(
        &self,
        account_id: Option<i32>,
        request: ChatRequest,
    ) -> Result<CopilotReply, CopilotError>;
}
