//! Error types and result types for record binding and store operations.
//!
//! Every fallible operation in this crate returns [`DocumentStoreResult<T>`]. Failures are
//! grouped by the layer that produces them: schema/field access ([`SchemaError`]), identity
//! management ([`IdentityError`]), session and connection handling ([`ConnectionError`]) and
//! query construction ([`InterfaceError`]). Nothing is retried on the caller's behalf.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Failures while resolving the declared fields of a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The name does not resolve to a declared field of the record type.
    #[error("field '{0}' not found")]
    FieldNotFound(String),
    /// The field exists but is not `pub`.
    #[error("can't access unexported field '{0}'")]
    UnexportedField(String),
    /// The operation needs a bound record. The argument is the record type name.
    #[error("record of type {0} is not bound to a collection")]
    Unbound(String),
}

/// Failures while resolving or assigning a record identity.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Implicit identities can't be assigned to a record that declares an identity field.
    /// The first argument is the record type name, the second the identity field.
    #[error("can't assign new implicit identity to {0}: identity is held by field '{1}'")]
    ExplicitIdentity(String, String),
    #[error("record of type {0} is not bound to a collection")]
    Unbound(String),
}

/// Failures while obtaining a connection from a session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The session has no backend behind it.
    #[error("session is not initialized")]
    NotInitialized,
    /// The backend refused to hand out a connection.
    #[error("failed to lease connection: {0}")]
    Lease(String),
}

/// Failures while constructing a query against a target type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    /// The target type declares no binding marker field, so its results can't be bound.
    #[error("type {0} does not declare a binding marker field")]
    MissingMarker(String),
}

/// Represents all possible errors that can occur when binding, saving or querying records.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Interface error: {0}")]
    Interface(#[from] InterfaceError),
    /// Serialization/deserialization error when converting between record and document formats.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// No document in the collection matched a single-record query.
    /// The argument is the collection name.
    #[error("No matching document in collection {0}")]
    DocumentNotFound(String),
    /// The document has an invalid structure for the requested operation.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// An error occurred in the underlying storage backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
