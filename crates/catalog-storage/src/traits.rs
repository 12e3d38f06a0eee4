use catalog_core::{Document, ItemId, Pipeline, Predicate, StoreResult};

/// Read protocol of the document store backing the catalog.
///
/// Implementations must tolerate concurrent callers; the service shares a single
/// handle across every in-flight request.
#[async_trait::async_trait]
pub trait CatalogStore: Send + Sync + 'static {
    /// Every document matching `filter`, in store order.
    async fn find(&self, filter: &Predicate) -> StoreResult<Vec<Document>>;

    /// Runs the stages of `pipeline` in order and returns the surviving documents.
    async fn aggregate(&self, pipeline: &Pipeline) -> StoreResult<Vec<Document>>;

    async fn find_one(&self, id: &ItemId) -> StoreResult<Option<Document>>;

    // Diagnostics
    fn describe(&self) -> serde_json::Value {
        serde_json::json!({ "engine": "unknown" })
    }
}
