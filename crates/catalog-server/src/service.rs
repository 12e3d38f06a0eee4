use crate::metrics::{OPS_TOTAL, OP_DURATION, PLANNER_MICROS, QUERY_FAILURES_TOTAL};
use catalog_core::{
    build_pipeline, CatalogError, FilterCriteria, Item, ItemId, Pipeline, Predicate, Result,
    StoreError,
};
use catalog_storage::CatalogStore;
use std::sync::Arc;
use tracing::{debug, error};

/// Executes catalog reads against the injected store and adapts store failures
/// into [`CatalogError`] outcomes.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.store
    }

    pub async fn list_all(&self) -> Result<Vec<Item>> {
        let _timer = OP_DURATION.with_label_values(&["list_all"]).start_timer();
        let docs = self
            .store
            .find(&Predicate::All)
            .await
            .map_err(|e| unavailable("list_all", e))?;
        OPS_TOTAL.with_label_values(&["list_all"]).inc();
        Ok(docs.into_iter().map(Item::from).collect())
    }

    pub async fn search(&self, criteria: &FilterCriteria) -> Result<Vec<Item>> {
        let _timer = OP_DURATION.with_label_values(&["search"]).start_timer();
        let pipeline = self.explain(criteria);
        debug!(fingerprint = %pipeline.fingerprint(), stages = pipeline.stages().len(), "executing pipeline");
        let docs = self.store.aggregate(&pipeline).await.map_err(|e| {
            QUERY_FAILURES_TOTAL.with_label_values(&["search"]).inc();
            error!(fingerprint = %pipeline.fingerprint(), "search failed: {}", e);
            CatalogError::QueryFailed
        })?;
        OPS_TOTAL.with_label_values(&["search"]).inc();
        Ok(docs.into_iter().map(Item::from).collect())
    }

    /// Validates `id` before touching the store. `Ok(None)` means no such item.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Item>> {
        let id: ItemId = id.parse()?;
        let _timer = OP_DURATION.with_label_values(&["get_by_id"]).start_timer();
        let doc = self
            .store
            .find_one(&id)
            .await
            .map_err(|e| unavailable("get_by_id", e))?;
        OPS_TOTAL.with_label_values(&["get_by_id"]).inc();
        Ok(doc.map(Item::from))
    }

    /// The pipeline `search` would run for `criteria`.
    pub fn explain(&self, criteria: &FilterCriteria) -> Pipeline {
        let t0 = std::time::Instant::now();
        let pipeline = build_pipeline(criteria);
        PLANNER_MICROS.observe(t0.elapsed().as_micros() as f64);
        pipeline
    }
}

fn unavailable(op: &str, e: StoreError) -> CatalogError {
    QUERY_FAILURES_TOTAL.with_label_values(&[op]).inc();
    error!(op, "store failure: {}", e);
    CatalogError::StoreUnavailable
}
