//! Binds plain Rust structs to collections of a document store.
//!
//! This crate is the core of the docbind project and provides:
//!
//! - **Records** ([`record`]) - The `Record` capability, the embedded `Binding` marker, save and field access
//! - **Schema introspection** ([`schema`]) - Collection, identity and field metadata derived from a record shape
//! - **Identity management** ([`identity`]) - Explicit identity fields and generated surrogates
//! - **Naming** ([`naming`]) - Collection names derived from type names
//! - **Queries** ([`query`]) - Fluent queries that rehydrate results into bound records
//! - **Filters** ([`filter`]) - Backend-neutral filter expressions
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Sessions** ([`session`]) - Connection leasing and the process-wide default session
//! - **Error handling** ([`error`]) - Error types and result types
//! - **UUID fields** ([`uuid_field`]) - UUID values stored as legacy BSON binary
//!
//! # Example
//!
//! ```ignore
//! use docbind::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize, Record)]
//! pub struct User {
//!     #[serde(skip)]
//!     #[record(collection = "users")]
//!     binding: Binding,
//!     #[serde(rename = "_id")]
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! let mut user = User { id: 1, name: "Alice".into(), ..Default::default() };
//! user.bind(&session)?;
//! user.save(&session, LeaseKind::Shared).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbind_core;

pub mod backend;
pub mod error;
pub mod filter;
pub mod identity;
pub mod naming;
pub mod query;
pub mod record;
pub mod schema;
pub mod session;
pub mod uuid_field;
