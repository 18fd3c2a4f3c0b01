//! In-memory document storage backend for docbind.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It uses async-aware read-write locks for concurrent access and is meant for development
//! and testing.
//!
//! # Features
//!
//! - **Thread-safe access** - Concurrent reads and writes using async-aware RwLock
//! - **Insertion order** - Queries return documents in the order they were first stored
//! - **Filter evaluation** - Every `Filter` expression is evaluated natively
//!
//! # Quick Start
//!
//! ```ignore
//! use docbind::{prelude::*, memory::InMemoryStore};
//!
//! let session = Session::connect(InMemoryStore::builder().database("app")).await?;
//!
//! let mut note = Note { data: "X".into(), ..Default::default() };
//! note.bind(&session)?;
//! note.save(&session, LeaseKind::Shared).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbind_memory;

pub mod evaluator;
pub mod store;

pub use store::{DEFAULT_DATABASE, InMemoryConnection, InMemoryStore, InMemoryStoreBuilder};
