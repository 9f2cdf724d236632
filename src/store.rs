use crate::errors::AppResult;
use crate::models::{Operation, RecordMap, SubmitResponse};
use serde_json::Value;

/// Client for the remote document store. Implementations own the wire
/// protocol and report network or decoding failures as
/// `AppError::Transport`; a store-reported mutation error is returned inside
/// `SubmitResponse::error` rather than as `Err`.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load_page_chunk(&self, page_id: &str) -> AppResult<RecordMap>;

    async fn query_collection(
        &self,
        collection_id: &str,
        collection_view_id: &str,
        filters: &[Value],
    ) -> AppResult<RecordMap>;

    async fn submit_transaction(&self, operations: &[Operation]) -> AppResult<SubmitResponse>;
}
