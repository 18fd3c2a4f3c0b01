use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    DataStruct, DeriveInput, Field, Fields, Ident, LitStr, Result, Type, Visibility,
    meta::ParseNestedMeta, parenthesized, token,
};

/// What a field declares about its own persistence.
#[derive(Default)]
struct FieldAttrs {
    key: Option<String>,
    identity: bool,
    excluded: bool,
    marker: bool,
    collection: Option<LitStr>,
}

impl FieldAttrs {
    fn parse(field: &Field) -> Result<Self> {
        let mut attrs = FieldAttrs::default();

        for attr in &field.attrs {
            if attr.path().is_ident("record") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("id") {
                        attrs.identity = true;
                        Ok(())
                    } else if meta.path.is_ident("skip") {
                        attrs.excluded = true;
                        Ok(())
                    } else if meta.path.is_ident("binding") {
                        attrs.marker = true;
                        Ok(())
                    } else if meta.path.is_ident("collection") {
                        attrs.collection = Some(meta.value()?.parse()?);
                        Ok(())
                    } else {
                        Err(meta.error("Unknown record attribute, expected one of: id, skip, binding, collection"))
                    }
                })?;
            } else if attr.path().is_ident("serde") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                        let key: LitStr = meta.value()?.parse()?;
                        attrs.key = Some(key.value());
                        Ok(())
                    } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                        attrs.excluded = true;
                        Ok(())
                    } else {
                        skip_serde_meta(&meta)
                    }
                })?;
            }
        }

        if is_binding_type(&field.ty) {
            attrs.marker = true;
        }

        Ok(attrs)
    }
}

/// Consumes the arguments of a serde attribute this derive has no use for.
fn skip_serde_meta(meta: &ParseNestedMeta) -> Result<()> {
    if meta.input.peek(syn::Token![=]) {
        let _: syn::Expr = meta.value()?.parse()?;
    } else if meta.input.peek(token::Paren) {
        let content;
        parenthesized!(content in meta.input);
        let _: TokenStream = content.parse()?;
    }
    Ok(())
}

fn is_binding_type(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Binding"),
        _ => false,
    }
}

pub(crate) fn generate_record_for_struct(
    ast: &DeriveInput,
    data: &DataStruct,
) -> Result<TokenStream> {
    let name = &ast.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ast,
            format!("Cannot derive Record for '{name}'. Only structs with named fields are supported."),
        ));
    };

    let mut marker: Option<&Ident> = None;
    let mut decls = Vec::with_capacity(fields.named.len());
    let mut value_arms = Vec::new();

    for field in &fields.named {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = FieldAttrs::parse(field)?;
        let field_name = ident.to_string();
        let public = matches!(field.vis, Visibility::Public(_));

        if let Some(collection) = &attrs.collection {
            if !attrs.marker {
                return Err(syn::Error::new_spanned(
                    collection,
                    "`collection` is only allowed on the Binding field",
                ));
            }
        }

        if attrs.marker {
            if marker.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    format!("'{name}' declares more than one Binding field"),
                ));
            }
            marker = Some(ident);
        } else {
            value_arms.push(quote! {
                #field_name => Some(::docbind::record::field_to_bson(&self.#ident)),
            });
        }

        let mut annotation = quote! { ::docbind::schema::Annotation::new() };
        if let Some(key) = &attrs.key {
            annotation = quote! { #annotation.key(#key) };
        }
        if attrs.identity {
            annotation = quote! { #annotation.identity() };
        }
        if attrs.excluded {
            annotation = quote! { #annotation.excluded() };
        }
        if attrs.marker {
            annotation = quote! { #annotation.marker() };
        }
        if let Some(collection) = &attrs.collection {
            annotation = quote! { #annotation.collection(#collection) };
        }

        decls.push(quote! {
            ::docbind::schema::FieldDecl {
                name: #field_name,
                public: #public,
                annotation: #annotation,
            }
        });
    }

    let Some(marker) = marker else {
        return Err(syn::Error::new_spanned(
            ast,
            format!(
                "'{name}' has no Binding field.\n\
                 Add one, e.g. #[serde(skip)] binding: docbind::record::Binding"
            ),
        ));
    };

    Ok(quote! {
        impl #impl_generics ::docbind::record::Record for #name #ty_generics #where_clause {
            fn shape() -> &'static ::docbind::schema::RecordShape {
                static SHAPE: ::docbind::schema::RecordShape = ::docbind::schema::RecordShape {
                    type_name: #type_name,
                    fields: &[#(#decls),*],
                };
                &SHAPE
            }

            fn binding(&self) -> &::docbind::record::Binding {
                &self.#marker
            }

            fn binding_mut(&mut self) -> &mut ::docbind::record::Binding {
                &mut self.#marker
            }

            fn field_value(
                &self,
                name: &str,
            ) -> ::std::option::Option<::docbind::error::DocumentStoreResult<::docbind::bson::Bson>> {
                match name {
                    #(#value_arms)*
                    _ => None,
                }
            }
        }
    })
}
