//! In-memory storage implementation.
//!
//! Documents are kept per database and collection in insertion order, behind an async-aware
//! read-write lock.

use async_trait::async_trait;
use bson::{Bson, Document};
use log::debug;
use mea::rwlock::RwLock;
use std::{collections::HashMap, iter::once, sync::Arc};

use docbind_core::{
    backend::{Connection, FindSpec, LeaseKind, StoreBackend, StoreBackendBuilder, WriteAck},
    error::DocumentStoreResult,
    schema::IDENTITY_KEY,
};

use crate::evaluator::{Comparable, DocumentEvaluator};

/// Database records are bound to unless the builder names another one.
pub const DEFAULT_DATABASE: &str = "test";

type CollectionMap = HashMap<String, Vec<Document>>;
type StoreMap = HashMap<String, CollectionMap>;

fn has_identity(document: &Document, id: &Bson) -> bool {
    document
        .get(IDENTITY_KEY)
        .is_some_and(|stored| Comparable::from(stored) == Comparable::from(id))
}

/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so clones share the
/// same data. Every connection leased from it, shared or dedicated, sees the same documents.
///
/// Queries scan all documents in a collection (no indexing).
///
/// # Example
///
/// ```ignore
/// use docbind_memory::InMemoryStore;
/// use docbind::backend::{LeaseKind, StoreBackend};
/// use bson::doc;
///
/// let store = InMemoryStore::new();
/// let connection = store.lease(LeaseKind::Shared).await?;
/// connection.upsert("test", "users", 1.into(), doc! { "_id": 1, "name": "Alice" }).await?;
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    /// database -> collection -> documents
    store: Arc<RwLock<StoreMap>>,
    database: String,
}

impl InMemoryStore {
    /// Creates a new empty store whose default database is [`DEFAULT_DATABASE`].
    pub fn new() -> Self {
        Self::with_database(DEFAULT_DATABASE)
    }

    pub fn with_database(database: impl Into<String>) -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            database: database.into(),
        }
    }

    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreBackend for InMemoryStore {
    fn default_database(&self) -> &str {
        &self.database
    }

    async fn lease(&self, kind: LeaseKind) -> DocumentStoreResult<Box<dyn Connection>> {
        Ok(Box::new(InMemoryConnection {
            store: self.store.clone(),
            kind,
        }))
    }
}

/// A connection to an [`InMemoryStore`].
#[derive(Debug)]
pub struct InMemoryConnection {
    store: Arc<RwLock<StoreMap>>,
    kind: LeaseKind,
}

#[async_trait]
impl Connection for InMemoryConnection {
    fn kind(&self) -> LeaseKind {
        self.kind
    }

    async fn upsert(
        &self,
        database: &str,
        collection: &str,
        id: Bson,
        document: Document,
    ) -> DocumentStoreResult<WriteAck> {
        // The stored identity always equals the one the document was upserted under.
        let document: Document = once((IDENTITY_KEY.to_string(), id.clone()))
            .chain(document.into_iter().filter(|(key, _)| key != IDENTITY_KEY))
            .collect();

        let mut store = self.store.write().await;
        let documents = store
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default();

        let ack = match documents.iter_mut().find(|stored| has_identity(stored, &id)) {
            Some(stored) => {
                *stored = document;
                WriteAck { matched: 1, inserted: 0 }
            }
            None => {
                documents.push(document);
                WriteAck { matched: 0, inserted: 1 }
            }
        };
        debug!("upserted {id} into {database}.{collection}: {ack:?}");

        Ok(ack)
    }

    async fn find(
        &self,
        database: &str,
        collection: &str,
        spec: &FindSpec,
    ) -> DocumentStoreResult<Vec<Document>> {
        let store = self.store.read().await;
        let Some(documents) = store
            .get(database)
            .and_then(|collections| collections.get(collection))
        else {
            return Ok(Vec::new());
        };

        let limit = match spec.limit {
            0 => usize::MAX,
            limit => limit,
        };

        let mut matched = Vec::new();
        for document in documents {
            if DocumentEvaluator::matches(document, spec.filter.as_ref())? {
                matched.push(document);
            }
        }

        Ok(matched
            .into_iter()
            .skip(spec.skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_id(
        &self,
        database: &str,
        collection: &str,
        id: &Bson,
    ) -> DocumentStoreResult<Option<Document>> {
        Ok(self
            .store
            .read()
            .await
            .get(database)
            .and_then(|collections| collections.get(collection))
            .and_then(|documents| documents.iter().find(|stored| has_identity(stored, id)))
            .cloned())
    }

    async fn drop_database(&self, database: &str) -> DocumentStoreResult<()> {
        self.store.write().await.remove(database);
        Ok(())
    }
}

/// Builder for constructing [`InMemoryStore`] instances.
///
/// # Example
///
/// ```ignore
/// use docbind_memory::InMemoryStore;
/// use docbind::backend::StoreBackendBuilder;
///
/// let store = InMemoryStore::builder().database("app").build().await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStoreBuilder {
    database: Option<String>,
}

impl InMemoryStoreBuilder {
    /// Sets the default database. Defaults to [`DEFAULT_DATABASE`].
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }
}

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Always succeeds with a freshly initialized, empty store.
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(match self.database {
            Some(database) => InMemoryStore::with_database(database),
            None => InMemoryStore::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use docbind_core::filter::Filter;

    use super::*;

    async fn connection() -> Box<dyn Connection> {
        InMemoryStore::new().lease(LeaseKind::Shared).await.unwrap()
    }

    #[tokio::test]
    async fn test_builder_sets_default_database() {
        let store = InMemoryStore::builder().database("app").build().await.unwrap();
        assert_eq!(store.default_database(), "app");

        let store = InMemoryStore::builder().build().await.unwrap();
        assert_eq!(store.default_database(), DEFAULT_DATABASE);
    }

    #[tokio::test]
    async fn test_upsert_inserts_then_replaces() {
        let connection = connection().await;

        let first = connection
            .upsert("db", "notes", Bson::Int32(1), doc! { "_id": 1, "data": "a" })
            .await
            .unwrap();
        let second = connection
            .upsert("db", "notes", Bson::Int32(1), doc! { "_id": 1, "data": "b" })
            .await
            .unwrap();

        assert_eq!(first, WriteAck { matched: 0, inserted: 1 });
        assert_eq!(second, WriteAck { matched: 1, inserted: 0 });

        let stored = connection.find("db", "notes", &FindSpec::default()).await.unwrap();
        assert_eq!(stored, vec![doc! { "_id": 1, "data": "b" }]);
    }

    #[tokio::test]
    async fn test_upsert_stores_identity_first() {
        let connection = connection().await;

        connection
            .upsert("db", "notes", Bson::String("k".into()), doc! { "data": "a" })
            .await
            .unwrap();

        let stored = connection
            .find_by_id("db", "notes", &Bson::String("k".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.keys().next().map(String::as_str), Some(IDENTITY_KEY));
    }

    #[tokio::test]
    async fn test_find_applies_filter_skip_and_limit_in_order() {
        let connection = connection().await;
        for n in 0..10 {
            let parity = if n % 2 == 0 { "even" } else { "odd" };
            connection
                .upsert("db", "numbers", Bson::Int32(n), doc! { "n": n, "parity": parity })
                .await
                .unwrap();
        }

        let spec = FindSpec {
            filter: Some(Filter::eq("parity", "even")),
            skip: 1,
            limit: 3,
        };
        let found = connection.find("db", "numbers", &spec).await.unwrap();

        let numbers: Vec<i32> = found.iter().map(|doc| doc.get_i32("n").unwrap()).collect();
        assert_eq!(numbers, vec![2, 4, 6]);
    }

    #[tokio::test]
    async fn test_missing_collection_yields_nothing() {
        let connection = connection().await;

        assert!(connection.find("db", "nothing", &FindSpec::default()).await.unwrap().is_empty());
        assert!(connection.find_by_id("db", "nothing", &Bson::Int32(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_connections_share_data_and_drop_database() {
        let store = InMemoryStore::new();
        let shared = store.lease(LeaseKind::Shared).await.unwrap();
        let dedicated = store.lease(LeaseKind::Dedicated).await.unwrap();
        assert_eq!(dedicated.kind(), LeaseKind::Dedicated);

        shared
            .upsert("db", "notes", Bson::Int32(1), doc! { "_id": 1 })
            .await
            .unwrap();
        assert!(dedicated.find_by_id("db", "notes", &Bson::Int32(1)).await.unwrap().is_some());

        dedicated.drop_database("db").await.unwrap();
        dedicated.drop_database("db").await.unwrap();
        assert!(shared.find("db", "notes", &FindSpec::default()).await.unwrap().is_empty());
    }
}
