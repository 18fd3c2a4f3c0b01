//! Filter evaluation against stored documents.
//!
//! Mirrors MongoDB's matching rules closely enough for the filters [`Filter`] builds: numbers
//! compare across integer and floating point types, negative operators match documents that
//! lack the field, and `any_of`/`none_of` accept either a single value or a list on both sides.
//!
//! [`Filter`]: docbind_core::filter::Filter

use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};
use std::{cmp::Ordering, collections::HashMap};

use docbind_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    filter::{Expr, FieldOp, QueryVisitor},
};

/// Comparable view of a BSON value. Every numeric type is widened to `f64`.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    ObjectId(ObjectId),
    String(&'a str),
    Bytes(u8, &'a [u8]),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(f64::from(*value)),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Binary(binary) => Comparable::Bytes(u8::from(binary.subtype), &binary.bytes),
            Bson::Array(items) => Comparable::Array(items.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(key, value)| (key.as_str(), Comparable::from(value)))
                    .collect(),
            ),
            _ => Comparable::Null,
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Bytes(a, x), Comparable::Bytes(b, y)) => a == b && x == y,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Whether `field` and `value` share at least one element. Either side may be a single value.
fn intersects(field: &Comparable<'_>, value: &Comparable<'_>) -> bool {
    match (field, value) {
        (Comparable::Array(items), Comparable::Array(values)) => {
            values.iter().any(|value| items.contains(value))
        }
        (Comparable::Array(items), single) | (single, Comparable::Array(items)) => {
            items.contains(single)
        }
        _ => false,
    }
}

fn contains(field: &Comparable<'_>, value: &Comparable<'_>) -> bool {
    match (field, value) {
        (Comparable::Array(items), value) => items.contains(value),
        (Comparable::String(left), Comparable::String(right)) => left.contains(right),
        _ => false,
    }
}

fn compare(field: &Comparable<'_>, op: &FieldOp, value: &Comparable<'_>) -> bool {
    match (field.partial_cmp(value), op) {
        (Some(ordering), FieldOp::Gt) => ordering.is_gt(),
        (Some(ordering), FieldOp::Gte) => ordering.is_ge(),
        (Some(ordering), FieldOp::Lt) => ordering.is_lt(),
        (Some(ordering), FieldOp::Lte) => ordering.is_le(),
        _ => false,
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Document,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    /// Whether `document` matches `filter`. A missing filter matches everything.
    pub fn matches(document: &'a Document, filter: Option<&Expr>) -> DocumentStoreResult<bool> {
        match filter {
            Some(expr) => DocumentEvaluator::new(document).evaluate(expr),
            None => Ok(true),
        }
    }
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(self.document.contains_key(field) == should_exist)
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let Some(field_value) = self.document.get(field) else {
            return Ok(matches!(op, FieldOp::Ne | FieldOp::NotContains | FieldOp::NoneOf));
        };

        let left = Comparable::from(field_value);
        let right = Comparable::from(value);

        Ok(match op {
            FieldOp::Eq => left == right || (matches!(left, Comparable::Array(_)) && contains(&left, &right)),
            FieldOp::Ne => left != right,
            FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => compare(&left, op, &right),
            FieldOp::Contains => contains(&left, &right),
            FieldOp::NotContains => !contains(&left, &right),
            FieldOp::StartsWith => matches!(
                (&left, &right),
                (Comparable::String(l), Comparable::String(r)) if l.starts_with(r)
            ),
            FieldOp::EndsWith => matches!(
                (&left, &right),
                (Comparable::String(l), Comparable::String(r)) if l.ends_with(r)
            ),
            FieldOp::AnyOf => left == right || intersects(&left, &right),
            FieldOp::NoneOf => left != right && !intersects(&left, &right),
        })
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;
    use docbind_core::filter::Filter;

    use super::*;

    fn eval(document: &Document, expr: Expr) -> bool {
        DocumentEvaluator::new(document).evaluate(&expr).unwrap()
    }

    #[test]
    fn test_numbers_compare_across_types() {
        let document = doc! { "age": 30_i64, "score": 4.5 };

        assert!(eval(&document, Filter::eq("age", 30)));
        assert!(eval(&document, Filter::gt("score", 4)));
        assert!(eval(&document, Filter::lte("age", 30.0)));
        assert!(!eval(&document, Filter::lt("age", 30)));
    }

    #[test]
    fn test_object_ids_are_comparable() {
        let id = ObjectId::new();
        let document = doc! { "_id": id };

        assert!(eval(&document, Filter::id(id)));
        assert!(!eval(&document, Filter::id(ObjectId::new())));
    }

    #[test]
    fn test_missing_fields_satisfy_negative_operators() {
        let document = doc! { "data": "X" };

        assert!(eval(&document, Filter::ne("missing", 1)));
        assert!(eval(&document, Filter::none_of("missing", vec![1, 2])));
        assert!(!eval(&document, Filter::eq("missing", 1)));
        assert!(!eval(&document, Filter::gt("missing", 1)));
    }

    #[test]
    fn test_string_operators() {
        let document = doc! { "data": "jc_test" };

        assert!(eval(&document, Filter::starts_with("data", "jc_")));
        assert!(eval(&document, Filter::ends_with("data", "test")));
        assert!(eval(&document, Filter::contains("data", "_t")));
        assert!(eval(&document, Filter::not_contains("data", "mongo")));
    }

    #[test]
    fn test_array_membership() {
        let document = doc! { "tags": ["a", "b"], "kind": "c" };

        assert!(eval(&document, Filter::eq("tags", "a")));
        assert!(eval(&document, Filter::any_of("tags", vec!["x", "b"])));
        assert!(eval(&document, Filter::any_of("kind", vec!["c", "d"])));
        assert!(eval(&document, Filter::none_of("kind", vec!["a", "b"])));
        assert!(!eval(&document, Filter::none_of("tags", "a")));
    }

    #[test]
    fn test_logical_operators() {
        let document = doc! { "data": "X", "n": 1 };

        assert!(eval(&document, Filter::and(Vec::new())));
        assert!(!eval(&document, Filter::or(Vec::new())));
        assert!(eval(&document, Filter::eq("data", "Y").or(Filter::eq("n", 1))));
        assert!(eval(&document, Filter::eq("data", "Y").not()));
        assert!(eval(&document, Filter::exists("n").and(Filter::not_exists("m"))));
    }
}
