//! Identity resolution for bound records.
//!
//! A record is identified either by the value of its explicit identity field or by an
//! [`ObjectId`] surrogate kept in its [`Binding`](crate::record::Binding). Surrogates are
//! assigned on demand, or lazily by the first save.

use bson::{Bson, oid::ObjectId};
use log::debug;

use crate::{
    error::{DocumentStoreResult, IdentityError, SchemaError},
    record::Record,
    schema::{IdentityKind, Schema},
};

/// The current identity of a record.
///
/// Returns `None` for unbound records and for implicit identities that were never assigned.
pub fn identity_of<R: Record>(record: &R) -> DocumentStoreResult<Option<Bson>> {
    let Some(schema) = record.binding().schema() else {
        return Ok(None);
    };

    match schema.identity() {
        IdentityKind::Explicit(field) => record.field_value(field).transpose(),
        IdentityKind::Implicit => Ok(record.binding().implicit_id().cloned()),
    }
}

/// Generates a fresh surrogate and stores it on the record, replacing any previous one.
pub fn assign_new_implicit_identity<R: Record>(record: &mut R) -> DocumentStoreResult<ObjectId> {
    let type_name = R::shape().type_name;
    let schema = record
        .binding()
        .schema()
        .ok_or_else(|| IdentityError::Unbound(type_name.to_string()))?;

    if let IdentityKind::Explicit(field) = schema.identity() {
        return Err(IdentityError::ExplicitIdentity(type_name.to_string(), field.clone()).into());
    }

    let id = ObjectId::new();
    record.binding_mut().set_implicit_id(Bson::ObjectId(id));
    debug!("assigned implicit identity {id} to {type_name}");

    Ok(id)
}

/// Identity to save a record under, assigning a surrogate first when an implicit identity
/// is still missing.
pub(crate) fn resolve_for_save<R: Record>(
    record: &mut R,
    schema: &Schema,
) -> DocumentStoreResult<Bson> {
    match schema.identity() {
        IdentityKind::Explicit(field) => record
            .field_value(field)
            .unwrap_or_else(|| Err(SchemaError::FieldNotFound(field.clone()).into())),
        IdentityKind::Implicit => match record.binding().implicit_id().cloned() {
            Some(id) => Ok(id),
            None => assign_new_implicit_identity(record).map(Bson::ObjectId),
        },
    }
}
