use proc_macro::TokenStream;
use quote::quote;
use syn::{DataStruct, DeriveInput, LitStr, Result};

use crate::convertible::field_key;

pub(crate) fn generate_entity_for_struct(
    ast: &DeriveInput,
    data: &DataStruct,
) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let mut collection: Option<String> = None;
    let mut id_field: Option<String> = None;
    let mut default_hooks = false;

    for attr in &ast.attrs {
        if attr.path().is_ident("entity") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("collection") {
                    let s: LitStr = meta.value()?.parse()?;
                    if s.value().is_empty() {
                        return Err(meta.error("collection needs a non-empty name"));
                    }
                    collection = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("id") {
                    if id_field.is_some() {
                        return Err(meta.error("Multiple id attributes are not allowed"));
                    }
                    let s: LitStr = meta.value()?.parse()?;
                    id_field = Some(s.value());
                    Ok(())
                } else if meta.path.is_ident("default_hooks") {
                    default_hooks = true;
                    Ok(())
                } else {
                    Err(meta.error("Unknown entity attribute"))
                }
            })?;
        }
    }

    let syn::Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            ast,
            "Only structs with named fields are supported",
        ));
    };

    let collection_code = match collection {
        Some(collection) => quote! {
            fn collection_name(&self) -> Option<String> {
                Some(#collection.to_string())
            }
        },
        None => quote! {},
    };

    // the id field's document key is the selector key
    let (load_selector_code, primary_key_code) = match id_field {
        Some(id_field) => {
            let field = fields
                .named
                .iter()
                .find(|field| field.ident.as_ref().is_some_and(|ident| ident == &id_field))
                .ok_or_else(|| {
                    syn::Error::new_spanned(ast, format!("Field {} not found in struct", id_field))
                })?;
            let ident = &field.ident;
            let key = field_key(field)?;
            let type_name = name.to_string();

            let load_selector = quote! {
                fn load_selector(&self, scope: &tether::scope::Scope) -> Option<tether::common::Document> {
                    tether::repository::PrimaryKey::primary_key(self, scope).ok()
                }
            };
            let primary_key = quote! {
                impl #impl_generics tether::repository::PrimaryKey for #name #ty_generics #where_clause {
                    fn primary_key(
                        &self,
                        _scope: &tether::scope::Scope,
                    ) -> tether::errors::TetherResult<tether::common::Document> {
                        let value = tether::common::Convertible::to_value(&self.#ident)?;
                        let missing = match &value {
                            tether::common::Value::Null => true,
                            tether::common::Value::String(s) => s.is_empty(),
                            _ => false,
                        };
                        if missing {
                            return Err(tether::errors::TetherError::new(
                                &format!("{} has no value for its key field {}", #type_name, #key),
                                tether::errors::ErrorKind::ValidationError,
                            ));
                        }
                        let mut selector = tether::common::Document::new();
                        selector.put(#key, value)?;
                        Ok(selector)
                    }
                }
            };
            (load_selector, primary_key)
        }
        None => (quote! {}, quote! {}),
    };

    let hooks_code = if default_hooks {
        quote! {
            impl #impl_generics tether::repository::Hooks for #name #ty_generics #where_clause {}
        }
    } else {
        quote! {}
    };

    let gen = quote! {
        impl #impl_generics tether::repository::Entity for #name #ty_generics #where_clause {
            #collection_code
            #load_selector_code
        }

        #primary_key_code
        #hooks_code
    };

    Ok(TokenStream::from(gen))
}
