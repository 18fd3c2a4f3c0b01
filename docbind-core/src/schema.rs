//! Record shapes and the schema introspector.
//!
//! A [`RecordShape`] is the static description of a record type: its name and its fields in
//! declaration order, each with the persistence [`Annotation`] it was declared with. Shapes are
//! normally emitted by `#[derive(Record)]` but can be written by hand.
//!
//! [`Schema::introspect`] turns a shape into the storage metadata used by the binder and the
//! query builder. It is pure and total: malformed annotations fall back to defaults instead of
//! failing, and nothing is cached, so every bind recomputes the schema from the shape.

use log::warn;

use crate::naming::derive_name;

/// Document key holding the identity of every stored record.
pub const IDENTITY_KEY: &str = "_id";

/// Persistence annotation attached to a declared field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Annotation {
    /// Persisted document key when it differs from the field name.
    pub key: Option<&'static str>,
    /// Identity sentinel: the field holds the record identity.
    pub identity: bool,
    /// Exclusion sentinel: the field is never persisted.
    pub excluded: bool,
    /// The field is the binding marker.
    pub marker: bool,
    /// Collection name override. Only meaningful on the marker field.
    pub collection: Option<&'static str>,
}

impl Annotation {
    pub const fn new() -> Self {
        Self {
            key: None,
            identity: false,
            excluded: false,
            marker: false,
            collection: None,
        }
    }

    pub const fn key(mut self, key: &'static str) -> Self {
        self.key = Some(key);
        self
    }

    pub const fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub const fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    pub const fn marker(mut self) -> Self {
        self.marker = true;
        self
    }

    pub const fn collection(mut self, name: &'static str) -> Self {
        self.collection = Some(name);
        self
    }
}

/// A field as declared on the record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: &'static str,
    /// Whether the field is `pub`.
    pub public: bool,
    pub annotation: Annotation,
}

impl FieldDecl {
    /// The document key this field is persisted under.
    pub fn key(&self) -> &'static str {
        self.annotation.key.unwrap_or(self.name)
    }

    /// Whether the field carries the identity sentinel, either directly or by being
    /// persisted under [`IDENTITY_KEY`].
    pub fn is_identity(&self) -> bool {
        self.annotation.identity || self.key() == IDENTITY_KEY
    }
}

/// Static description of a record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordShape {
    pub type_name: &'static str,
    pub fields: &'static [FieldDecl],
}

impl RecordShape {
    /// The first field declared as the binding marker.
    pub fn marker(&self) -> Option<&FieldDecl> {
        self.fields.iter().find(|field| field.annotation.marker)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// How a record's identity is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityKind {
    /// The identity is the value of the named field.
    Explicit(String),
    /// The identity is a generated surrogate held by the record's binding.
    Implicit,
}

/// Persistence metadata of a single declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub key: String,
    pub exported: bool,
    pub excluded: bool,
}

impl From<&FieldDecl> for FieldDescriptor {
    fn from(decl: &FieldDecl) -> Self {
        Self {
            name: decl.name.to_string(),
            key: decl.key().to_string(),
            exported: decl.public,
            excluded: decl.annotation.excluded,
        }
    }
}

/// Storage metadata derived from a [`RecordShape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    collection: String,
    database: String,
    identity: IdentityKind,
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Derives the schema of a record shape.
    ///
    /// The collection is the marker's non-empty override, or the derived name of the type.
    /// The first field carrying the identity sentinel becomes the explicit identity; later
    /// ones are ignored. Excluded fields and the marker itself are left out of
    /// [`fields`](Self::fields). A field that is both identity and excluded counts as excluded.
    ///
    /// The database is left empty; binding fills it in.
    pub fn introspect(shape: &RecordShape) -> Self {
        let collection = shape
            .marker()
            .and_then(|marker| marker.annotation.collection)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| derive_name(shape.type_name));

        let mut identity = IdentityKind::Implicit;
        let mut fields = Vec::with_capacity(shape.fields.len());

        for field in shape.fields {
            if field.annotation.marker || field.annotation.excluded {
                continue;
            }

            if field.is_identity() {
                match &identity {
                    IdentityKind::Implicit => {
                        identity = IdentityKind::Explicit(field.name.to_string());
                    }
                    IdentityKind::Explicit(first) => warn!(
                        "{}: ignoring identity annotation on '{}', identity is already held by '{}'",
                        shape.type_name, field.name, first
                    ),
                }
            }

            fields.push(FieldDescriptor::from(field));
        }

        Self {
            collection,
            database: String::new(),
            identity,
            fields,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub(crate) fn set_database(&mut self, database: impl Into<String>) {
        self.database = database.into();
    }

    pub(crate) fn with_database(mut self, database: impl Into<String>) -> Self {
        self.set_database(database);
        self
    }

    pub fn identity(&self) -> &IdentityKind {
        &self.identity
    }

    /// Persisted fields in declaration order.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Document key of the explicit identity field, if there is one.
    pub fn identity_key(&self) -> Option<&str> {
        match &self.identity {
            IdentityKind::Explicit(name) => self.field(name).map(|field| field.key.as_str()),
            IdentityKind::Implicit => None,
        }
    }
}
