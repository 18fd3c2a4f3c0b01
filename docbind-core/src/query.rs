//! Query construction and execution for bound records.
//!
//! A [`Query`] is built against a target type: `Vec<R>` collects every matching record,
//! `Option<R>` materializes the first match only. The element type `R` must declare a binding
//! marker field, so every result can be bound like a freshly constructed record.
//!
//! ```ignore
//! use docbind::prelude::*;
//!
//! let mut query = Query::<Vec<Note>>::new(&session)?;
//! query.filter(Filter::eq("data", "X")).skip(5).limit(10);
//!
//! let mut notes = Vec::new();
//! query.execute(LeaseKind::Shared, &mut notes).await?;
//! ```
//!
//! Builder methods overwrite the previous value of their axis, so a query can be adjusted and
//! executed again.

use log::{debug, warn};
use std::{fmt, marker::PhantomData};

use crate::{
    backend::{FindSpec, LeaseKind},
    error::{DocumentStoreError, DocumentStoreResult, InterfaceError},
    filter::Expr,
    record::{Record, rehydrate},
    schema::{IDENTITY_KEY, Schema},
    session::Session,
};

/// Number of records a query materializes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Only the first match.
    Single,
    /// Every match, in store order.
    Many,
}

/// A value a query can materialize its results into.
pub trait QueryTarget: Send {
    type Item: Record;

    const ARITY: Arity;

    /// Replaces the previous contents with `records`.
    fn fill(&mut self, records: Vec<Self::Item>);
}

impl<R: Record> QueryTarget for Vec<R> {
    type Item = R;

    const ARITY: Arity = Arity::Many;

    fn fill(&mut self, records: Vec<R>) {
        *self = records;
    }
}

impl<R: Record> QueryTarget for Option<R> {
    type Item = R;

    const ARITY: Arity = Arity::Single;

    fn fill(&mut self, records: Vec<R>) {
        *self = records.into_iter().next();
    }
}

/// A parametrized read against the collection of a record type.
pub struct Query<T: QueryTarget> {
    session: Session,
    schema: Schema,
    spec: FindSpec,
    _target: PhantomData<fn() -> T>,
}

impl<T: QueryTarget> Query<T> {
    /// Prepares a query against the collection `T::Item` is bound to.
    ///
    /// The query reads from the session's default database. Against an uninitialized session
    /// the database is left empty and executing fails.
    ///
    /// # Errors
    ///
    /// Returns [`InterfaceError::MissingMarker`] if the record type declares no binding marker.
    pub fn new(session: &Session) -> DocumentStoreResult<Self> {
        let shape = T::Item::shape();
        if shape.marker().is_none() {
            return Err(InterfaceError::MissingMarker(shape.type_name.to_string()).into());
        }

        let mut schema = Schema::introspect(shape);
        match session.default_database() {
            Ok(database) => schema.set_database(database),
            Err(err) => warn!("querying {} without a database: {}", shape.type_name, err),
        }

        Ok(Self {
            session: session.clone(),
            schema,
            spec: FindSpec::default(),
            _target: PhantomData,
        })
    }

    /// Replaces the filter. References to the explicit identity field match the stored `_id`.
    pub fn filter(&mut self, filter: Expr) -> &mut Self {
        let filter = match self.schema.identity_key() {
            Some(key) if key != IDENTITY_KEY => filter.rename_field(key, IDENTITY_KEY),
            _ => filter,
        };
        self.spec.filter = Some(filter);
        self
    }

    /// Bounds the number of results. Zero means unbounded.
    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.spec.limit = limit;
        self
    }

    /// Drops the first `skip` matches. Applied before the limit.
    pub fn skip(&mut self, skip: usize) -> &mut Self {
        self.spec.skip = skip;
        self
    }

    /// Reads from another database than the session's default.
    pub fn set_database(&mut self, database: &str) -> &mut Self {
        self.schema.set_database(database);
        self
    }

    pub fn collection(&self) -> &str {
        self.schema.collection()
    }

    pub fn database(&self) -> &str {
        self.schema.database()
    }

    pub fn arity(&self) -> Arity {
        T::ARITY
    }

    pub fn spec(&self) -> &FindSpec {
        &self.spec
    }

    /// Runs the query and materializes the results into `target`, replacing its contents.
    ///
    /// Every result is bound to the query's collection and database.
    ///
    /// # Errors
    ///
    /// A single-record query with no match resets `target` and returns
    /// [`DocumentStoreError::DocumentNotFound`].
    pub async fn execute(&self, kind: LeaseKind, target: &mut T) -> DocumentStoreResult<()> {
        let mut spec = self.spec.clone();
        if T::ARITY == Arity::Single {
            spec.limit = 1;
        }

        let documents = {
            let lease = self.session.lease(kind).await?;
            lease.find(self.database(), self.collection(), &spec).await?
        };
        debug!(
            "query on {}.{} returned {} document(s)",
            self.database(),
            self.collection(),
            documents.len()
        );

        let records = documents
            .into_iter()
            .map(|document| rehydrate::<T::Item>(document, self.database()))
            .collect::<DocumentStoreResult<Vec<_>>>()?;

        if T::ARITY == Arity::Single && records.is_empty() {
            target.fill(records);
            return Err(DocumentStoreError::DocumentNotFound(self.collection().to_string()));
        }

        target.fill(records);
        Ok(())
    }

    /// Runs the query into a fresh target.
    pub async fn fetch(&self, kind: LeaseKind) -> DocumentStoreResult<T>
    where
        T: Default,
    {
        let mut target = T::default();
        self.execute(kind, &mut target).await?;
        Ok(target)
    }
}

impl<T: QueryTarget> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("database", &self.database())
            .field("collection", &self.collection())
            .field("arity", &T::ARITY)
            .field("spec", &self.spec)
            .finish()
    }
}
