//! Records: plain structs bound to a collection.
//!
//! A record is a serde-serializable struct that embeds a [`Binding`] marker field and
//! implements [`Record`], usually through `#[derive(Record)]`. The [`RecordExt`] extension
//! trait, implemented for every record, provides binding, identity access, field access and
//! saving.
//!
//! The marker field must be skipped by serde so it never reaches the store:
//!
//! ```ignore
//! use docbind::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize, Record)]
//! pub struct Note {
//!     #[serde(skip)]
//!     #[record(collection = "notes")]
//!     binding: Binding,
//!     pub data: String,
//! }
//!
//! let mut note = Note { data: "X".into(), ..Default::default() };
//! note.bind(&session)?;
//! note.save(&session, LeaseKind::Shared).await?;
//! ```
//!
//! Fields annotated `#[record(skip)]` are left out of the stored document; pair them with
//! `#[serde(skip)]` or `#[serde(default)]` so records can be read back.

use async_trait::async_trait;
use bson::{Bson, Document, oid::ObjectId, de::deserialize_from_bson, ser::serialize_to_bson};
use log::{debug, warn};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use std::{fmt, iter::once};

use crate::{
    backend::{LeaseKind, WriteAck},
    error::{DocumentStoreError, DocumentStoreResult, SchemaError},
    identity,
    schema::{FieldDecl, IDENTITY_KEY, IdentityKind, RecordShape, Schema},
    session::Session,
};

/// Binding state embedded in every record.
///
/// Holds the schema computed at bind time and the implicit identity surrogate. A record whose
/// binding holds no schema is unbound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Binding {
    schema: Option<Schema>,
    implicit_id: Option<Bson>,
}

impl Binding {
    pub fn is_initialized(&self) -> bool {
        self.schema.is_some()
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// The implicit identity surrogate, if one was assigned or read back from the store.
    pub fn implicit_id(&self) -> Option<&Bson> {
        self.implicit_id.as_ref()
    }

    pub(crate) fn set_implicit_id(&mut self, id: Bson) {
        self.implicit_id = Some(id);
    }

    fn attach(&mut self, schema: Schema) {
        self.schema = Some(schema);
    }
}

/// Capability of a type to be stored as a document.
///
/// Implementations describe the type's declared fields through [`shape`](Record::shape) and
/// give access to the embedded [`Binding`]. They carry no storage decisions; those are made by
/// [`Schema::introspect`] from the shape.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Static description of the declared fields.
    fn shape() -> &'static RecordShape;

    fn binding(&self) -> &Binding;

    fn binding_mut(&mut self) -> &mut Binding;

    /// Serialized value of a declared non-marker field, `None` if no such field has that name.
    fn field_value(&self, name: &str) -> Option<DocumentStoreResult<Bson>>;
}

/// Serializes a single field value. Used by `#[derive(Record)]`.
pub fn field_to_bson<T: Serialize + ?Sized>(value: &T) -> DocumentStoreResult<Bson> {
    Ok(serialize_to_bson(value)?)
}

/// Diagnostic snapshot of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordInfo {
    pub database: String,
    pub collection: String,
    pub record: Value,
}

impl fmt::Display for RecordInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Database {}", self.database)?;
        writeln!(f, "Collection {}", self.collection)?;
        write!(f, "Record {}", self.record)
    }
}

/// Binding, identity and persistence operations available on every [`Record`].
#[async_trait]
pub trait RecordExt: Record {
    /// Binds the record: computes its schema, marks it initialized and places it in the
    /// session's default database.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotInitialized`](crate::error::ConnectionError) if the
    /// session has no backend. The record is bound anyway, with an empty database name.
    fn bind(&mut self, session: &Session) -> DocumentStoreResult<()>;

    fn is_initialized(&self) -> bool;

    /// Collection name, empty while unbound.
    fn collection_name(&self) -> &str;

    /// Database name, empty while unbound or when bound against an uninitialized session.
    fn database(&self) -> &str;

    /// Redirects a bound record to another database. Has no effect on an unbound record.
    fn set_database(&mut self, database: &str);

    /// The record identity: the explicit identity field's value or the implicit surrogate.
    ///
    /// `None` while unbound, or for an implicit identity that was never assigned.
    fn id(&self) -> DocumentStoreResult<Option<Bson>>;

    /// Replaces the implicit identity surrogate with a freshly generated one.
    ///
    /// # Errors
    ///
    /// Fails with [`IdentityError::ExplicitIdentity`](crate::error::IdentityError) when the
    /// record declares an identity field.
    fn new_implicit_id(&mut self) -> DocumentStoreResult<ObjectId>;

    /// Value of a declared field, looked up by its Rust name.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::FieldNotFound`] for names that are not declared fields
    /// - [`SchemaError::UnexportedField`] for fields that are not `pub`
    ///
    /// Excluded fields are declared fields too: their in-memory value is returned even though
    /// it is never persisted.
    fn get_field(&self, name: &str) -> DocumentStoreResult<Bson>;

    /// Diagnostic snapshot, also written to the debug log.
    fn info(&self) -> DocumentStoreResult<RecordInfo>;

    /// Upserts the full record under its identity, assigning an implicit identity first if the
    /// record has none yet.
    ///
    /// Saving the same identity twice overwrites the stored document.
    async fn save(&mut self, session: &Session, kind: LeaseKind) -> DocumentStoreResult<WriteAck>;
}

#[async_trait]
impl<R: Record> RecordExt for R {
    fn bind(&mut self, session: &Session) -> DocumentStoreResult<()> {
        let mut schema = Schema::introspect(Self::shape());
        let database = session.default_database();

        match &database {
            Ok(name) => schema.set_database(name.as_str()),
            Err(err) => warn!(
                "binding {} without a database: {}",
                Self::shape().type_name,
                err
            ),
        }

        debug!(
            "bound {} to {}.{} ({:?})",
            Self::shape().type_name,
            schema.database(),
            schema.collection(),
            schema.identity()
        );
        self.binding_mut().attach(schema);

        database.map(|_| ())
    }

    fn is_initialized(&self) -> bool {
        self.binding().is_initialized()
    }

    fn collection_name(&self) -> &str {
        self.binding()
            .schema()
            .map(Schema::collection)
            .unwrap_or_default()
    }

    fn database(&self) -> &str {
        self.binding()
            .schema()
            .map(Schema::database)
            .unwrap_or_default()
    }

    fn set_database(&mut self, database: &str) {
        if let Some(schema) = self.binding_mut().schema.as_mut() {
            schema.set_database(database);
        }
    }

    fn id(&self) -> DocumentStoreResult<Option<Bson>> {
        identity::identity_of(self)
    }

    fn new_implicit_id(&mut self) -> DocumentStoreResult<ObjectId> {
        identity::assign_new_implicit_identity(self)
    }

    fn get_field(&self, name: &str) -> DocumentStoreResult<Bson> {
        let decl = Self::shape()
            .field(name)
            .filter(|decl| !decl.annotation.marker)
            .ok_or_else(|| SchemaError::FieldNotFound(name.to_string()))?;

        if !decl.public {
            return Err(SchemaError::UnexportedField(name.to_string()).into());
        }

        self.field_value(name)
            .unwrap_or_else(|| Err(SchemaError::FieldNotFound(name.to_string()).into()))
    }

    fn info(&self) -> DocumentStoreResult<RecordInfo> {
        let info = RecordInfo {
            database: self.database().to_string(),
            collection: self.collection_name().to_string(),
            record: serde_json::to_value(self)?,
        };
        debug!("{info}");

        Ok(info)
    }

    async fn save(&mut self, session: &Session, kind: LeaseKind) -> DocumentStoreResult<WriteAck> {
        let schema = self
            .binding()
            .schema()
            .cloned()
            .ok_or_else(|| SchemaError::Unbound(Self::shape().type_name.to_string()))?;

        let lease = session.lease(kind).await?;
        let id = identity::resolve_for_save(self, &schema)?;
        let document = to_stored_document(self, &schema, id.clone())?;

        let ack = lease
            .upsert(schema.database(), schema.collection(), id, document)
            .await?;
        debug!(
            "saved {} into {}.{}: matched {}, inserted {}",
            Self::shape().type_name,
            schema.database(),
            schema.collection(),
            ack.matched,
            ack.inserted
        );

        Ok(ack)
    }
}

/// Persisted fields of a record as `(key, value)` pairs, without the identity.
pub(crate) fn stored_fields<R: Record>(record: &R) -> DocumentStoreResult<Document> {
    let mut document = match serialize_to_bson(record)? {
        Bson::Document(document) => document,
        other => {
            return Err(DocumentStoreError::InvalidDocument(format!(
                "{} serialized to {:?}, expected a document",
                R::shape().type_name,
                other.element_type()
            )));
        }
    };

    for decl in R::shape().fields {
        if decl.annotation.marker || decl.annotation.excluded {
            document.remove(decl.key());
        }
    }

    let schema = Schema::introspect(R::shape());
    document.remove(schema.identity_key().unwrap_or(IDENTITY_KEY));

    // A field serialized under `_id` that lost the identity to an earlier one keeps its value
    // under its own name.
    if let Some(decl) = demoted_identity(R::shape(), &schema) {
        if let Some(value) = document.remove(IDENTITY_KEY) {
            document.insert(decl.name, value);
        }
    }

    Ok(document)
}

/// The field persisted under [`IDENTITY_KEY`] when it is not the schema's identity.
fn demoted_identity(shape: &'static RecordShape, schema: &Schema) -> Option<&'static FieldDecl> {
    let IdentityKind::Explicit(identity) = schema.identity() else {
        return None;
    };

    shape.fields.iter().find(|decl| {
        !decl.annotation.marker
            && !decl.annotation.excluded
            && decl.key() == IDENTITY_KEY
            && decl.name != identity.as_str()
    })
}

/// The document stored for a record: its identity under [`IDENTITY_KEY`] followed by the
/// persisted fields.
fn to_stored_document<R: Record>(
    record: &R,
    schema: &Schema,
    id: Bson,
) -> DocumentStoreResult<Document> {
    let mut document = stored_fields(record)?;
    if let Some(key) = schema.identity_key() {
        document.remove(key);
    }

    Ok(once((IDENTITY_KEY.to_string(), id))
        .chain(document)
        .collect())
}

/// Materializes a stored document as a bound record.
///
/// The stored identity goes back into the explicit identity field, or becomes the implicit
/// surrogate of the binding.
pub(crate) fn rehydrate<R: Record>(
    mut document: Document,
    database: &str,
) -> DocumentStoreResult<R> {
    let schema = Schema::introspect(R::shape()).with_database(database);
    let stored_id = document.remove(IDENTITY_KEY);

    if let Some(decl) = demoted_identity(R::shape(), &schema) {
        if let Some(value) = document.remove(decl.name) {
            document.insert(IDENTITY_KEY, value);
        }
    }

    let implicit_id = match (schema.identity(), stored_id) {
        (IdentityKind::Explicit(_), Some(id)) => {
            let key = schema.identity_key().unwrap_or(IDENTITY_KEY);
            document.insert(key, id);
            None
        }
        (IdentityKind::Implicit, id) => id,
        (IdentityKind::Explicit(_), None) => None,
    };

    let mut record: R = deserialize_from_bson(Bson::Document(document))?;
    let binding = record.binding_mut();
    binding.attach(schema);
    if let Some(id) = implicit_id {
        binding.set_implicit_id(id);
    }

    Ok(record)
}
