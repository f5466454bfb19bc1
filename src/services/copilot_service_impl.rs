//! Ledger-gated implementation of the `CopilotService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

use crate::clients::completion::{ChatMessage, CompletionBackend};
use crate::copilot::{ChatRequest, CopilotReply, assemble_system_prompt, parse_reply};
use crate::db::Store;
use crate::services::copilot_service::{CopilotError, CopilotService};

pub struct LedgerCopilotService {
    store: Store,
    backend: Arc<dyn CompletionBackend>,
    default_model: String,
}

impl LedgerCopilotService {
    #[must_use]
    pub fn new(store: Store, backend: Arc<dyn CompletionBackend>, default_model: String) -> Self {
        Self {
            store,
            backend,
            default_model,
        }
    }
}

#[async_trait]
impl CopilotService for LedgerCopilotService {
    async fn chat(
        &self,
        account_id: Option<i32>,
        request: ChatRequest,
    ) -> Result<CopilotReply, CopilotError> {
        // 1. Credit check. Unauthenticated callers never reach the ledger.
        let Some(account_id) = account_id else {
            return Err(CopilotError::AuthRequired);
        };

        let balance = self
            .store
            .account_credits(account_id)
            .await
            .map_err(|e| CopilotError::Internal(e.to_string()))?
            .ok_or(CopilotError::AuthRequired)?;

        if balance <= 0 {
            return Err(CopilotError::OutOfFuel);
        }

        // 2. Prompt assembly (pure).
        let system_prompt = assemble_system_prompt(request.mode, &request.current_context);

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(request.messages);

        let model = request.model.as_deref().unwrap_or(&self.default_model);

        // 3. Upstream dispatch. Any failure is terminal and undebited.
        let content = self
            .backend
            .complete(model, &messages)
            .await
            .map_err(|e| CopilotError::Upstream(e.to_string()))?;

        let reply = parse_reply(&content).map_err(|e| CopilotError::Upstream(e.to_string()))?;

        // 4. Ledger debit, conditioned on the balance still being positive.
        //    Best effort: the reply is returned even if this write fails.
        match self.store.debit_account_credit(account_id).await {
            Ok(true) => {
                let _ = self
                    .store
                    .add_log(
                        "copilot",
                        "info",
                        &format!("account {account_id} used 1 credit"),
                        Some(format!("action: {}", reply.action.as_str())),
                    )
                    .await;
            }
            Ok(false) => {
                warn!(
                    account_id,
                    "copilot debit matched no rows; balance spent concurrently"
                );
            }
            Err(e) => {
                warn!(account_id, "copilot debit failed after response: {e}");
            }
        }

        Ok(reply)
    }
}
