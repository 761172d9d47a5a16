use proc_macro::TokenStream;
use proc_macro2::{Ident, Span};
use quote::quote;
use syn::{DataEnum, DataStruct, DeriveInput, Field, LitStr, Result, Type};

/// Field names listed in `#[converter(ignored = "a, b")]` on the type.
fn ignored_fields(ast: &DeriveInput) -> Result<Vec<String>> {
    let mut ignored = vec![];
    for attr in &ast.attrs {
        if attr.path().is_ident("converter") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("ignored") {
                    let s: LitStr = meta.value()?.parse()?;
                    ignored.extend(
                        s.value()
                            .split(',')
                            .map(|field| field.trim().to_string())
                            .filter(|field| !field.is_empty()),
                    );
                    Ok(())
                } else {
                    Err(meta.error("Unknown converter attribute, expected `ignored`"))
                }
            })?;
        }
    }
    Ok(ignored)
}

/// Document key of a field: its `#[converter(rename = "...")]`, or its name.
pub(crate) fn field_key(field: &Field) -> Result<String> {
    let mut key = field.ident.as_ref().map(|ident| ident.to_string());
    for attr in &field.attrs {
        if attr.path().is_ident("converter") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let s: LitStr = meta.value()?.parse()?;
                    if s.value().is_empty() {
                        return Err(meta.error("rename needs a non-empty key"));
                    }
                    key = Some(s.value());
                    Ok(())
                } else {
                    Err(meta.error("Unknown converter attribute, expected `rename`"))
                }
            })?;
        }
    }
    key.ok_or_else(|| syn::Error::new_spanned(field, "Only named fields are supported"))
}

pub(crate) fn generate_convertible_for_struct(
    ast: &DeriveInput,
    data: &DataStruct,
) -> Result<TokenStream> {
    let ignored = ignored_fields(ast)?;

    let fields: Vec<&Field> = match &data.fields {
        syn::Fields::Named(fields) => fields.named.iter().collect(),
        syn::Fields::Unit => vec![],
        syn::Fields::Unnamed(_) => {
            return Err(syn::Error::new_spanned(
                ast,
                "Only structs with named fields are supported",
            ))
        }
    };

    let mut encoders = Vec::with_capacity(fields.len());
    let mut initializers = Vec::with_capacity(fields.len());
    for field in &fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty: &Type = &field.ty;

        if ignored.contains(&ident.to_string()) {
            initializers.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }

        let key = field_key(field)?;
        encoders.push(quote! {
            let value = tether::common::Convertible::to_value(&self.#ident)?;
            if !value.is_null() {
                doc.put(#key, value)?;
            }
        });
        initializers.push(quote! {
            #ident: match doc.get(#key) {
                Some(value) if !value.is_null() => tether::common::from_value::<#ty>(value)?,
                _ => ::core::default::Default::default(),
            }
        });
    }

    let name = &ast.ident;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let gen = quote! {
        impl #impl_generics tether::common::Convertible for #name #ty_generics #where_clause {
            fn to_value(&self) -> tether::errors::TetherResult<tether::common::Value> {
                #[allow(unused_mut)]
                let mut doc = tether::common::Document::new();
                #(#encoders)*
                Ok(tether::common::Value::Document(doc))
            }

            #[allow(unused_variables)]
            fn from_value(value: &tether::common::Value) -> tether::errors::TetherResult<Self> {
                match value {
                    tether::common::Value::Document(doc) => Ok(#name {
                        #(#initializers,)*
                    }),
                    _ => Err(tether::errors::TetherError::new(
                        &format!("Cannot decode {} from a {}", #type_name, value.type_name()),
                        tether::errors::ErrorKind::ObjectMappingError,
                    )),
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}

/// Enums are stored as `{variant: "<Name>", value: <payload>}`; named
/// variants carry a document, tuple variants an array and unit variants null.
pub(crate) fn generate_convertible_for_enum(
    ast: &DeriveInput,
    data: &DataEnum,
) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let ignored = ignored_fields(ast)?;

    let mut to_value_variants = Vec::with_capacity(data.variants.len());
    let mut from_value_variants = Vec::with_capacity(data.variants.len());

    for variant in &data.variants {
        let variant_ident = &variant.ident;
        let variant_name = variant_ident.to_string();

        match &variant.fields {
            syn::Fields::Named(fields) => {
                let all_idents: Vec<&Ident> = fields
                    .named
                    .iter()
                    .filter_map(|f| f.ident.as_ref())
                    .collect();

                let mut encoders = vec![];
                let mut initializers = vec![];
                for field in &fields.named {
                    let Some(ident) = field.ident.as_ref() else {
                        continue;
                    };
                    let ty = &field.ty;
                    if ignored.contains(&ident.to_string()) {
                        initializers.push(quote! { #ident: ::core::default::Default::default() });
                        continue;
                    }
                    let key = field_key(field)?;
                    encoders.push(quote! {
                        payload.put(#key, tether::common::Convertible::to_value(#ident)?)?;
                    });
                    initializers.push(quote! {
                        #ident: match payload.get(#key) {
                            Some(value) if !value.is_null() => tether::common::from_value::<#ty>(value)?,
                            _ => ::core::default::Default::default(),
                        }
                    });
                }

                to_value_variants.push(quote! {
                    #[allow(unused_variables)]
                    #name::#variant_ident { #(#all_idents),* } => {
                        let mut payload = tether::common::Document::new();
                        #(#encoders)*
                        (#variant_name, tether::common::Value::Document(payload))
                    }
                });
                from_value_variants.push(quote! {
                    Some(#variant_name) => match doc.get("value") {
                        Some(tether::common::Value::Document(payload)) => Ok(#name::#variant_ident {
                            #(#initializers,)*
                        }),
                        _ => Err(malformed()),
                    }
                });
            }
            syn::Fields::Unnamed(fields) => {
                let field_count = fields.unnamed.len();
                let field_idents: Vec<Ident> = (0..field_count)
                    .map(|i| Ident::new(&format!("field_{}", i), Span::call_site()))
                    .collect();
                let field_indices: Vec<usize> = (0..field_count).collect();
                let field_types: Vec<&Type> = fields.unnamed.iter().map(|f| &f.ty).collect();

                to_value_variants.push(quote! {
                    #name::#variant_ident(#(#field_idents),*) => {
                        let mut items = Vec::with_capacity(#field_count);
                        #(items.push(tether::common::Convertible::to_value(#field_idents)?);)*
                        (#variant_name, tether::common::Value::Array(items))
                    }
                });
                from_value_variants.push(quote! {
                    Some(#variant_name) => match doc.get("value") {
                        Some(tether::common::Value::Array(items)) if items.len() == #field_count => {
                            Ok(#name::#variant_ident(
                                #(tether::common::from_value::<#field_types>(&items[#field_indices])?,)*
                            ))
                        }
                        _ => Err(malformed()),
                    }
                });
            }
            syn::Fields::Unit => {
                to_value_variants.push(quote! {
                    #name::#variant_ident => (#variant_name, tether::common::Value::Null)
                });
                from_value_variants.push(quote! {
                    Some(#variant_name) => Ok(#name::#variant_ident)
                });
            }
        }
    }

    let type_name = name.to_string();
    let gen = quote! {
        impl #impl_generics tether::common::Convertible for #name #ty_generics #where_clause {
            fn to_value(&self) -> tether::errors::TetherResult<tether::common::Value> {
                let (variant, payload) = match self {
                    #(#to_value_variants),*
                };
                let mut doc = tether::common::Document::new();
                doc.put("variant", variant)?;
                doc.put("value", payload)?;
                Ok(tether::common::Value::Document(doc))
            }

            fn from_value(value: &tether::common::Value) -> tether::errors::TetherResult<Self> {
                let malformed = || {
                    tether::errors::TetherError::new(
                        &format!("Value is not a valid {} variant", #type_name),
                        tether::errors::ErrorKind::ObjectMappingError,
                    )
                };
                let tether::common::Value::Document(doc) = value else {
                    return Err(malformed());
                };
                match doc.get("variant").and_then(|v| v.as_str()) {
                    #(#from_value_variants,)*
                    _ => Err(malformed()),
                }
            }
        }
    };

    Ok(TokenStream::from(gen))
}
