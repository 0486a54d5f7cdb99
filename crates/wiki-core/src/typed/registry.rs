//! ActionRegistry - the closed `Action -> handler` map and its dispatch.
//!
//! Built once while the service is wired up (mutable), checked with
//! `ensure_complete`, then shared behind an `Arc` and only read.
//! No locks on the hot path.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use super::handler::{DynHandler, Handler, TypedHandler};
use super::request::ActionRequest;
use crate::domain::{Action, Envelope, ReplyFailure};

#[derive(Default)]
pub struct ActionRegistry {
    handlers: HashMap<Action, Arc<dyn DynHandler>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler for action '{0}' is already registered")]
    AlreadyRegistered(Action),

    #[error("No handler registered for actions: {0:?}")]
    MissingActions(Vec<Action>),
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<T: ActionRequest, H: Handler<T> + 'static>(
        &mut self,
        handler: H,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&T::ACTION) {
            return Err(RegistryError::AlreadyRegistered(T::ACTION));
        }
        self.handlers
            .insert(T::ACTION, Arc::new(TypedHandler::<T, H>::new(handler)));
        Ok(())
    }

    pub fn get(&self, action: Action) -> Option<Arc<dyn DynHandler>> {
        self.handlers.get(&action).cloned()
    }

    /// Registered actions in `Action::ALL` order.
    pub fn registered_actions(&self) -> Vec<Action> {
        Action::ALL
            .into_iter()
            .filter(|action| self.handlers.contains_key(action))
            .collect()
    }

    /// Every `Action` must have a handler before the registry serves traffic.
    pub fn ensure_complete(&self) -> Result<(), RegistryError> {
        let missing: Vec<Action> = Action::ALL
            .into_iter()
            .filter(|action| !self.handlers.contains_key(action))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::MissingActions(missing))
        }
    }

    /// Resolve the `action` header and run the matching handler.
    ///
    /// Protocol failures (`NoActionSpecified`, `BadAction`) are returned
    /// before any handler is touched. An empty header counts as missing.
    pub async fn dispatch(&self, envelope: Envelope) -> Result<serde_json::Value, ReplyFailure> {
        let handler = {
            let raw = match envelope.action() {
                Some(raw) if !raw.trim().is_empty() => raw,
                _ => {
                    warn!(message_id = %envelope.id, "message without action header");
                    return Err(ReplyFailure::no_action_specified());
                }
            };
            let handler = raw
                .parse::<Action>()
                .ok()
                .and_then(|action| self.get(action))
                .ok_or_else(|| {
                    warn!(message_id = %envelope.id, action = raw, "bad action");
                    ReplyFailure::bad_action(raw)
                })?;
            debug!(message_id = %envelope.id, action = raw, "dispatching");
            handler
        };

        handler.handle_dyn(envelope.body).await
    }
}
