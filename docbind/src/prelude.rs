//! Convenient re-exports of commonly used types from docbind.
//!
//! ```ignore
//! use docbind::prelude::*;
//! ```

pub use docbind_core::{
    backend::{LeaseKind, StoreBackend, StoreBackendBuilder, WriteAck},
    error::{DocumentStoreError, DocumentStoreResult},
    filter::{Expr, FieldOp, Filter},
    query::{Arity, Query},
    record::{Binding, Record, RecordExt},
    schema::Schema,
    session::Session,
    uuid_field::UuidField,
};
pub use docbind_macros::Record;
