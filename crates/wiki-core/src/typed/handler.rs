//! Handler trait - typed on the surface, type-erased in the registry.
//!
//! `Handler<T>` only ever sees a decoded `T`. `TypedHandler<T, H>` wraps it
//! into the object-safe `DynHandler`, which works on raw JSON so the registry
//! can keep every action in one map.

use std::marker::PhantomData;

use async_trait::async_trait;

use super::request::ActionRequest;
use crate::domain::{Action, ReplyFailure};

#[async_trait]
pub trait Handler<T: ActionRequest>: Send + Sync {
    async fn handle(&self, request: T) -> Result<T::Reply, ReplyFailure>;
}

#[async_trait]
pub trait DynHandler: Send + Sync {
    async fn handle_dyn(&self, body: serde_json::Value) -> Result<serde_json::Value, ReplyFailure>;
    fn action(&self) -> Action;
}

pub struct TypedHandler<T: ActionRequest, H: Handler<T>> {
    handler: H,
    _marker: PhantomData<fn(T)>,
}

impl<T: ActionRequest, H: Handler<T>> TypedHandler<T, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T: ActionRequest, H: Handler<T>> DynHandler for TypedHandler<T, H> {
    async fn handle_dyn(&self, body: serde_json::Value) -> Result<serde_json::Value, ReplyFailure> {
        let request: T = serde_json::from_value(body)
            .map_err(|e| ReplyFailure::bad_payload(format!("{}: {e}", T::ACTION)))?;
        let reply = self.handler.handle(request).await?;
        serde_json::to_value(reply)
            .map_err(|e| ReplyFailure::bad_payload(format!("{} reply: {e}", T::ACTION)))
    }

    fn action(&self) -> Action {
        T::ACTION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Done, ErrorCode, SavePage};
    use serde_json::json;

    struct Accept;

    #[async_trait]
    impl Handler<SavePage> for Accept {
        async fn handle(&self, _request: SavePage) -> Result<Done, ReplyFailure> {
            Ok(Done {})
        }
    }

    #[tokio::test]
    async fn typed_handler_decodes_and_encodes() {
        let handler = TypedHandler::<SavePage, _>::new(Accept);
        let reply = handler
            .handle_dyn(json!({ "id": 1, "markdown": "x" }))
            .await
            .unwrap();
        assert_eq!(reply, json!({}));
        assert_eq!(handler.action(), Action::SavePage);
    }

    #[tokio::test]
    async fn undecodable_body_is_bad_payload() {
        let handler = TypedHandler::<SavePage, _>::new(Accept);
        let err = handler.handle_dyn(json!({ "id": "one" })).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BadPayload);
        assert!(err.message.starts_with("save-page"));
    }
}
