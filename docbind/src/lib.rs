//! Binds plain Rust structs to document store collections.
//!
//! This crate is the primary entry point for users of docbind. It re-exports the core types,
//! the `Record` derive macro and the storage backends.
//!
//! # Features
//!
//! - **Plain structs** - Records are serde structs with an embedded `Binding` field
//! - **Derived metadata** - Collection names and identities come from the struct declaration
//! - **Fluent queries** - Filter, skip and limit, with results bound like fresh records
//! - **Multiple backends** - In-memory storage and MongoDB (`mongodb` feature)
//!
//! # Quick Start
//!
//! ```ignore
//! use docbind::{prelude::*, memory::InMemoryStore};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize, Record)]
//! pub struct Note {
//!     #[serde(skip)]
//!     binding: Binding,
//!     pub data: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> DocumentStoreResult<()> {
//!     let session = Session::connect(InMemoryStore::builder().database("app")).await?;
//!
//!     // Stored in app.note under a generated identity
//!     let mut note = Note { data: "X".into(), ..Default::default() };
//!     note.bind(&session)?;
//!     note.save(&session, LeaseKind::Shared).await?;
//!
//!     let found = Query::<Vec<Note>>::new(&session)?
//!         .filter(Filter::eq("data", "X"))
//!         .limit(10)
//!         .fetch(LeaseKind::Shared)
//!         .await?;
//!     assert_eq!(found[0].id()?, note.id()?);
//!
//!     session.shutdown().await
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory storage for development and testing
//! - `mongodb` - MongoDB backend (requires the `mongodb` feature)

#[allow(unused_extern_crates)]
extern crate self as docbind;

pub mod prelude;

pub use docbind_core::{
    backend, error, filter, identity, naming, query, record, schema, session, uuid_field,
};
pub use docbind_macros::Record;

// Re-export BSON types for convenience
pub use bson;

/// In-memory storage backend implementations.
pub mod memory {
    pub use docbind_memory::{DEFAULT_DATABASE, InMemoryConnection, InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend implementations.
///
/// This module is only available when the `mongodb` feature is enabled.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use docbind_mongodb::{MongoConnection, MongoDbConfig, MongoDbStore, MongoDbStoreBuilder};
}
