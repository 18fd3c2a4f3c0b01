//! MongoDB backend implementation for docbind.
//!
//! This crate provides a MongoDB-based implementation of the `StoreBackend` trait. Filters are
//! translated into MongoDB query documents and evaluated by the server.
//!
//! To use this backend, include the `mongodb` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! docbind = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! # Connection
//!
//! A store is built either from a connection string or from a [`MongoDbConfig`], which can be
//! deserialized from any serde source.
//!
//! ```ignore
//! use docbind::{prelude::*, mongodb::{MongoDbConfig, MongoDbStore, MongoDbStoreBuilder}};
//!
//! let session = Session::connect(MongoDbStore::builder("mongodb://localhost:27017", "app")).await?;
//!
//! let config = MongoDbConfig { database: "app".into(), ..Default::default() };
//! let session = Session::connect(MongoDbStoreBuilder::from_config(config)).await?;
//! ```
//!
//! # Leases
//!
//! `LeaseKind::Shared` connections share the client's connection pool. `LeaseKind::Dedicated`
//! connections start a client session of their own.

#[allow(unused_extern_crates)]
extern crate self as docbind_mongodb;

pub mod config;
pub mod query;
pub mod store;

pub use config::MongoDbConfig;
pub use store::{MongoConnection, MongoDbStore, MongoDbStoreBuilder};
