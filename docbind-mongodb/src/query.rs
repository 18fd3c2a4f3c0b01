//! Translation of filter expressions into MongoDB query documents.

use bson::{Bson, Document, doc};

use docbind_core::{
    error::DocumentStoreError,
    filter::{Expr, FieldOp, QueryVisitor},
};

/// Escapes the characters PCRE treats specially so `value` matches literally.
fn escape_regex(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if "\\^$.|?*+()[]{}-/".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn regex(pattern: String) -> Document {
    doc! { "$regex": pattern }
}

fn as_list(value: &Bson) -> Bson {
    match value {
        Bson::Array(_) => value.clone(),
        single => Bson::Array(vec![single.clone()]),
    }
}

/// Translates filter expressions into MongoDB query documents.
///
/// Empty conjunctions match everything and empty disjunctions match nothing, which MongoDB's
/// `$and`/`$or` reject, so both are translated specially.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    pub fn translate(expr: Option<&Expr>) -> Result<Document, DocumentStoreError> {
        match expr {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(Document::new()),
        }
    }

    fn visit_all(&mut self, exprs: &[Expr]) -> Result<Vec<Document>, DocumentStoreError> {
        exprs.iter().map(|expr| self.visit_expr(expr)).collect()
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(Document::new());
        }

        Ok(doc! { "$and": self.visit_all(exprs)? })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        if exprs.is_empty() {
            return Ok(doc! { "$nor": [{}] });
        }

        Ok(doc! { "$or": self.visit_all(exprs)? })
    }

    /// `$not` only applies to operator expressions, `$nor` negates any query.
    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        let negated = self.visit_expr(expr)?;
        Ok(doc! { "$nor": [negated] })
    }

    fn visit_exists(&mut self, field: &str, should_exist: bool) -> Result<Self::Output, Self::Error> {
        Ok(doc! { field: { "$exists": should_exist } })
    }

    fn visit_field(&mut self, field: &str, op: &FieldOp, value: &Bson) -> Result<Self::Output, Self::Error> {
        let condition = match (op, value) {
            (FieldOp::Eq, _) => doc! { "$eq": value },
            (FieldOp::Ne, _) => doc! { "$ne": value },
            (FieldOp::Gt, _) => doc! { "$gt": value },
            (FieldOp::Gte, _) => doc! { "$gte": value },
            (FieldOp::Lt, _) => doc! { "$lt": value },
            (FieldOp::Lte, _) => doc! { "$lte": value },
            (FieldOp::Contains, Bson::String(s)) => regex(escape_regex(s)),
            (FieldOp::Contains, _) => doc! { "$eq": value },
            (FieldOp::NotContains, Bson::String(s)) => doc! { "$not": regex(escape_regex(s)) },
            (FieldOp::NotContains, _) => doc! { "$ne": value },
            (FieldOp::StartsWith, Bson::String(s)) => regex(format!("^{}", escape_regex(s))),
            (FieldOp::EndsWith, Bson::String(s)) => regex(format!("{}$", escape_regex(s))),
            (FieldOp::StartsWith | FieldOp::EndsWith, other) => {
                return Err(DocumentStoreError::InvalidDocument(format!(
                    "{op:?} on '{field}' requires a string value, got {:?}",
                    other.element_type()
                )));
            }
            (FieldOp::AnyOf, _) => doc! { "$in": as_list(value) },
            (FieldOp::NoneOf, _) => doc! { "$nin": as_list(value) },
        };

        Ok(doc! { field: condition })
    }
}
