use crate::eval::{apply_stage, compile};
use crate::traits::CatalogStore;
use catalog_core::{Document, ItemId, Pipeline, Predicate, Stage, StoreResult, ID_FIELD};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use prometheus::{register_histogram, Histogram};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

static AGGREGATE_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!("catalog_aggregate_seconds", "In-memory pipeline latency").unwrap()
});

/// Document store held in process memory. Iteration order is insertion order.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    docs: Vec<Document>,
    by_id: HashMap<ItemId, usize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents(docs: impl IntoIterator<Item = Document>) -> Self {
        let store = Self::new();
        for d in docs {
            store.insert(d);
        }
        store
    }

    /// Loads a document, assigning a fresh `_id` when it has none or the one it
    /// carries is not a ULID. A document with a known id replaces the old one.
    pub fn insert(&self, mut doc: Document) -> ItemId {
        let parsed = doc
            .get(ID_FIELD)
            .and_then(JsonValue::as_str)
            .and_then(|s| s.parse::<ItemId>().ok());
        let id = match parsed {
            Some(id) => id,
            None => {
                let id = ItemId::new();
                if let Some(old) = doc.get(ID_FIELD) {
                    debug!(old = %old, new = %id, "reassigning non-ulid id");
                }
                doc.insert(ID_FIELD.to_string(), JsonValue::String(id.to_string()));
                id
            }
        };
        let mut inner = self.inner.write();
        match inner.by_id.get(&id).copied() {
            Some(pos) => inner.docs[pos] = doc,
            None => {
                let pos = inner.docs.len();
                inner.docs.push(doc);
                inner.by_id.insert(id, pos);
            }
        }
        id
    }

    /// Every stored document, in insertion order.
    pub fn snapshot(&self) -> Vec<Document> {
        self.inner.read().docs.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryStore {
    async fn find(&self, filter: &Predicate) -> StoreResult<Vec<Document>> {
        let compiled = compile(filter)?;
        let inner = self.inner.read();
        let mut out = Vec::new();
        for doc in inner.docs.iter() {
            if compiled.matches(doc)? {
                out.push(doc.clone());
            }
        }
        Ok(out)
    }

    async fn aggregate(&self, pipeline: &Pipeline) -> StoreResult<Vec<Document>> {
        let _timer = AGGREGATE_SECONDS.start_timer();
        let mut stages = pipeline.stages().iter().peekable();
        // Filter before copying anything out of the lock.
        let mut rows = match stages.peek() {
            Some(Stage::Match { predicate }) => {
                let rows = self.find(predicate).await?;
                stages.next();
                rows
            }
            _ => self.snapshot(),
        };
        for stage in stages {
            rows = apply_stage(stage, rows)?;
        }
        Ok(rows)
    }

    async fn find_one(&self, id: &ItemId) -> StoreResult<Option<Document>> {
        let inner = self.inner.read();
        Ok(inner.by_id.get(id).map(|&pos| inner.docs[pos].clone()))
    }

    fn describe(&self) -> JsonValue {
        serde_json::json!({ "engine": "memory", "documents": self.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{build_pipeline, DateSort, FilterCriteria, PriceSort};
    use serde_json::json;

    fn doc(v: JsonValue) -> Document {
        match v {
            JsonValue::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    fn priced(name: &str, price: &str) -> Document {
        doc(json!({"name": name, "brandName": "Acme", "regularPrice": price}))
    }

    #[test]
    fn insert_assigns_ids_and_replaces_known_ones() {
        let store = InMemoryStore::new();
        let a = store.insert(doc(json!({"name": "a", "_id": {"$oid": "65f0"}})));
        let b = store.insert(doc(json!({"name": "b", "_id": a.to_string()})));
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        store.insert(doc(json!({"name": "c"})));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn find_one_distinguishes_missing() {
        let store = InMemoryStore::new();
        let id = store.insert(priced("a", "1"));
        let found = store.find_one(&id).await.unwrap().unwrap();
        assert_eq!(found["name"], json!("a"));
        assert!(store.find_one(&ItemId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_all_keeps_insertion_order() {
        let store =
            InMemoryStore::from_documents(vec![priced("x", "3"), priced("y", "1"), priced("z", "2")]);
        let names: Vec<_> = store
            .find(&Predicate::All)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("x"), json!("y"), json!("z")]);
    }

    #[tokio::test]
    async fn aggregate_sorts_by_numeric_price() {
        let store = InMemoryStore::from_documents(vec![
            priced("ten", "10"),
            priced("hundred", "100"),
            priced("nine", "9"),
        ]);
        let p = build_pipeline(&FilterCriteria {
            price_sort: Some(PriceSort::LowToHigh),
            ..Default::default()
        });
        let rows = store.aggregate(&p).await.unwrap();
        let names: Vec<_> = rows.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["nine", "ten", "hundred"]);
        assert_eq!(rows[0]["convertedPrice"], json!(9.0));
    }

    #[tokio::test]
    async fn price_breaks_ties_under_the_date_sort() {
        let dated = |name: &str, price: &str, added: &str| {
            doc(json!({"name": name, "regularPrice": price, "addedTime": added}))
        };
        let store = InMemoryStore::from_documents(vec![
            dated("late", "5", "2024-02-01T00:00:00Z"),
            dated("tied-dear", "30", "2024-01-01T00:00:00Z"),
            dated("tied-cheap", "10", "2024-01-01T00:00:00Z"),
        ]);
        let p = build_pipeline(&FilterCriteria {
            price_sort: Some(PriceSort::LowToHigh),
            date_sort: Some(DateSort::Older),
            ..Default::default()
        });
        let rows = store.aggregate(&p).await.unwrap();
        let names: Vec<_> = rows.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["late", "tied-cheap", "tied-dear"]);

        let p = build_pipeline(&FilterCriteria {
            price_sort: Some(PriceSort::HighToLow),
            date_sort: Some(DateSort::Newest),
            ..Default::default()
        });
        let rows = store.aggregate(&p).await.unwrap();
        let names: Vec<_> = rows.iter().map(|d| d["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["tied-dear", "tied-cheap", "late"]);
    }

    #[tokio::test]
    async fn aggregate_surfaces_unparseable_prices() {
        let store = InMemoryStore::from_documents(vec![priced("bad", "n/a")]);
        let err = store
            .aggregate(&build_pipeline(&FilterCriteria::default()))
            .await
            .unwrap_err();
        assert!(matches!(err, catalog_core::StoreError::Execution(_)));
    }

    #[tokio::test]
    async fn concurrent_readers_share_the_store() {
        let store = InMemoryStore::from_documents((0..50).map(|i| priced("p", &i.to_string())));
        let p = build_pipeline(&FilterCriteria {
            size: 5,
            ..Default::default()
        });
        let mut handles = Vec::new();
        for _ in 0..8 {
            let s = store.clone();
            let p = p.clone();
            handles.push(tokio::spawn(async move { s.aggregate(&p).await.unwrap().len() }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap(), 5);
        }
    }
}
