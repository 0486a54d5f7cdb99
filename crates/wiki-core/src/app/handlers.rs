//! PageHandlers - binds each page action to the `PageStore`.
//!
//! One struct implements `Handler<T>` for all five request types; the service
//! registers a clone per action. Store failures are logged here and leave as
//! `DbError` replies, so driver errors never cross the bus.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use crate::domain::{
    AllPages, AllPagesReply, CreatePage, DeletePage, Done, GetPage, GetPageReply, ReplyFailure,
    SavePage,
};
use crate::ports::{PageStore, StoreError};
use crate::typed::Handler;

#[derive(Clone)]
pub struct PageHandlers {
    store: Arc<dyn PageStore>,
}

impl PageHandlers {
    pub fn new(store: Arc<dyn PageStore>) -> Self {
        Self { store }
    }
}

fn db_failure(err: StoreError) -> ReplyFailure {
    error!(error = %err, "database query error");
    ReplyFailure::db_error(err.to_string())
}

#[async_trait]
impl Handler<AllPages> for PageHandlers {
    async fn handle(&self, _request: AllPages) -> Result<AllPagesReply, ReplyFailure> {
        let pages = self.store.list_page_names().await.map_err(db_failure)?;
        Ok(AllPagesReply { pages })
    }
}

#[async_trait]
impl Handler<GetPage> for PageHandlers {
    async fn handle(&self, request: GetPage) -> Result<GetPageReply, ReplyFailure> {
        let page = self.store.get_page(&request.page).await.map_err(db_failure)?;
        Ok(match page {
            Some(page) => GetPageReply::found(page.id, page.content),
            None => GetPageReply::not_found(),
        })
    }
}

#[async_trait]
impl Handler<CreatePage> for PageHandlers {
    async fn handle(&self, request: CreatePage) -> Result<Done, ReplyFailure> {
        self.store
            .create_page(&request.title, &request.markdown)
            .await
            .map_err(db_failure)?;
        Ok(Done {})
    }
}

#[async_trait]
impl Handler<SavePage> for PageHandlers {
    async fn handle(&self, request: SavePage) -> Result<Done, ReplyFailure> {
        self.store
            .save_page(request.id, &request.markdown)
            .await
            .map_err(db_failure)?;
        Ok(Done {})
    }
}

#[async_trait]
impl Handler<DeletePage> for PageHandlers {
    async fn handle(&self, request: DeletePage) -> Result<Done, ReplyFailure> {
        self.store.delete_page(request.id).await.map_err(db_failure)?;
        Ok(Done {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorCode, Page};

    /// Store whose every call fails, as if the file vanished.
    struct BrokenStore;

    fn broken() -> StoreError {
        StoreError::Io(std::io::Error::other("disk gone"))
    }

    #[async_trait]
    impl PageStore for BrokenStore {
        async fn ensure_schema(&self) -> Result<(), StoreError> {
            Err(broken())
        }
        async fn list_page_names(&self) -> Result<Vec<String>, StoreError> {
            Err(broken())
        }
        async fn get_page(&self, _name: &str) -> Result<Option<Page>, StoreError> {
            Err(broken())
        }
        async fn create_page(&self, _name: &str, _content: &str) -> Result<(), StoreError> {
            Err(broken())
        }
        async fn save_page(&self, _id: i64, _content: &str) -> Result<(), StoreError> {
            Err(broken())
        }
        async fn delete_page(&self, _id: i64) -> Result<(), StoreError> {
            Err(broken())
        }
    }

    #[tokio::test]
    async fn store_failures_become_db_errors() {
        let handlers = PageHandlers::new(Arc::new(BrokenStore));

        let err = <PageHandlers as Handler<AllPages>>::handle(&handlers, AllPages {}).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DbError);
        assert!(err.message.contains("disk gone"));

        let err = <PageHandlers as Handler<DeletePage>>::handle(&handlers, DeletePage { id: 1 })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::DbError);
    }
}
