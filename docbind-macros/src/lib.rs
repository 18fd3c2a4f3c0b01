//! Procedural macros for the docbind project.
//!
//! ### `Record`
//!
//! Derives `docbind::record::Record` for a struct with named fields. The derive only describes
//! the struct: it emits the declared fields with their visibility and persistence annotations,
//! plus accessors for the binding marker and the persisted field values. Collection names and
//! identity strategies are decided at runtime from that description.
//!
//! - **Supported for**: Structs with named fields that embed exactly one `Binding`
//! - **Field attributes**:
//!   - `#[record(id)]` marks the explicit identity field (as does `#[serde(rename = "_id")]`)
//!   - `#[record(skip)]` excludes a field from persistence (as does `#[serde(skip)]`)
//!   - `#[record(binding)]` marks the binding field when its type isn't spelled `Binding`
//!   - `#[record(collection = "...")]` on the binding field overrides the collection name
//!
//! ```rust,ignore
//! use docbind::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Default, Serialize, Deserialize, Record)]
//! pub struct Order {
//!     #[serde(skip)]
//!     #[record(collection = "orders")]
//!     binding: Binding,
//!     #[record(id)]
//!     pub number: i64,
//!     pub total: f64,
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as docbind_macros;

extern crate proc_macro;
mod record;

use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

use crate::record::generate_record_for_struct;

/// Derives the `Record` trait.
///
/// # Errors
///
/// Returns a compile error if:
/// - Applied to an enum, a union, a tuple struct or a unit struct
/// - The struct has no binding field, or more than one
/// - A `record` attribute is unknown, or `collection` is set on a field other than the binding
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_record_for_struct(&ast, data) {
            Ok(token_stream) => token_stream.into(),
            Err(e) => e.to_compile_error().into(),
        },
        _ => syn::Error::new_spanned(
            &ast,
            format!(
                "Cannot derive Record for '{}'. Only structs with named fields are supported.\n\
                 Example: #[derive(Record)] pub struct MyRecord {{ binding: Binding, field: Type }}",
                ast.ident
            ),
        )
        .to_compile_error()
        .into(),
    }
}
