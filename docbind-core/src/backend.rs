//! Storage backend abstraction for bound records.
//!
//! This module defines the traits a document store has to implement to serve records:
//! a [`StoreBackend`] hands out [`Connection`]s, and a connection performs the primitive
//! upsert and find operations against a named database and collection.
//!
//! # Traits
//!
//! - [`StoreBackend`]: knows its default database and leases connections
//! - [`Connection`]: the primitive document operations
//! - [`StoreBackendBuilder`]: factory trait for creating backend instances
//!
//! # Leases
//!
//! A [`LeaseKind::Shared`] connection reuses the backend's shared connection state and is
//! cheap to obtain. A [`LeaseKind::Dedicated`] connection is isolated from every other lease
//! and is the one to hand to a separate task. Connections are released when dropped.
//!
//! # Examples
//!
//! ```ignore
//! use docbind::backend::{Connection, FindSpec, LeaseKind, StoreBackend};
//! use bson::doc;
//!
//! let connection = backend.lease(LeaseKind::Shared).await?;
//! let ack = connection
//!     .upsert("app", "users", 1.into(), doc! { "_id": 1, "name": "Alice" })
//!     .await?;
//! assert_eq!(ack.inserted, 1);
//!
//! let users = connection.find("app", "users", &FindSpec::default()).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use async_trait::async_trait;
use bson::{Bson, Document};
use std::fmt::Debug;

use crate::{error::DocumentStoreResult, filter::Expr};

/// Kind of connection requested from a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LeaseKind {
    /// Reuse the backend's shared connection. Not meant to be driven from two tasks at once.
    #[default]
    Shared,
    /// Obtain an isolated connection.
    Dedicated,
}

/// Outcome of an upsert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteAck {
    /// Number of existing documents that matched the identity filter.
    pub matched: u64,
    /// Number of documents inserted because nothing matched.
    pub inserted: u64,
}

/// Parameters of a find operation.
///
/// `skip` is applied before `limit`. A `limit` of zero means unbounded.
#[derive(Debug, Clone, Default)]
pub struct FindSpec {
    pub filter: Option<Expr>,
    pub skip: usize,
    pub limit: usize,
}

/// A leased connection to a document store.
///
/// All documents exchanged through a connection carry their identity under
/// [`IDENTITY_KEY`](crate::schema::IDENTITY_KEY).
#[async_trait]
pub trait Connection: Send + Sync + Debug {
    /// The kind of lease this connection was obtained with.
    fn kind(&self) -> LeaseKind;

    /// Replaces the document whose identity equals `id` with `document`, inserting it if no
    /// such document exists.
    ///
    /// # Arguments
    ///
    /// * `database` - The database holding the collection
    /// * `collection` - The collection to write to. Created on first write.
    /// * `id` - The identity of the document
    /// * `document` - The full document, including its identity
    async fn upsert(
        &self,
        database: &str,
        collection: &str,
        id: Bson,
        document: Document,
    ) -> DocumentStoreResult<WriteAck>;

    /// Returns the documents matching `spec` in store order.
    ///
    /// A missing database or collection yields an empty result.
    async fn find(
        &self,
        database: &str,
        collection: &str,
        spec: &FindSpec,
    ) -> DocumentStoreResult<Vec<Document>>;

    /// Returns the document with the given identity, if any.
    ///
    /// Not used by saving or querying. It reads back raw stored documents for inspection and
    /// test fixtures.
    async fn find_by_id(
        &self,
        database: &str,
        collection: &str,
        id: &Bson,
    ) -> DocumentStoreResult<Option<Document>>;

    /// Drops a database with all its collections. Dropping a missing database is a no-op.
    ///
    /// Like [`find_by_id`](Connection::find_by_id), this serves test fixtures and maintenance,
    /// not the record operations.
    async fn drop_database(&self, database: &str) -> DocumentStoreResult<()>;
}

/// Abstract interface for document storage backends.
///
/// Implementations must be thread-safe. The trait is object safe, sessions hold backends as
/// `Arc<dyn StoreBackend>`.
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// The database records are bound to unless redirected.
    fn default_database(&self) -> &str;

    /// Leases a connection of the requested kind.
    async fn lease(&self, kind: LeaseKind) -> DocumentStoreResult<Box<dyn Connection>>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op, but backends with external connections should
    /// override this.
    async fn shutdown(&self) -> DocumentStoreResult<()> {
        Ok(())
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
