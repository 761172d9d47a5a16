#![recursion_limit = "128"]
//! # Tether Derive Macros
//!
//! Procedural macros deriving the tether traits for plain Rust types.
//!
//! ## Macros
//!
//! ### `Convertible`
//!
//! Derives `tether::common::Convertible` for structs with named fields and
//! for enums, converting values to and from tether documents.
//!
//! - **Type attribute**: `#[converter(ignored = "a, b")]` leaves fields out of the document
//! - **Field attribute**: `#[converter(rename = "_id")]` stores a field under another key
//!
//! Fields whose value encodes to null are left out of the document, and
//! fields missing from a stored document decode to their `Default`.
//!
//! ```rust,ignore
//! use tether_derive::Convertible;
//!
//! #[derive(Default, Convertible)]
//! pub struct User {
//!     #[converter(rename = "_id")]
//!     pub email: String,
//!     pub age: u32,
//! }
//! ```
//!
//! ### `Entity`
//!
//! Derives `tether::repository::Entity` for structs with named fields.
//!
//! - `collection = "..."` names the collection of the type
//! - `id = "field"` names the field identifying a document; it also derives
//!   `tether::repository::PrimaryKey` and a load selector built from it
//! - `default_hooks` adds an empty `tether::repository::Hooks` implementation
//!   for types that do not need lifecycle callbacks
//!
//! ```rust,ignore
//! use tether_derive::{Convertible, Entity};
//!
//! #[derive(Default, Convertible, Entity)]
//! #[entity(collection = "products", id = "sku", default_hooks)]
//! pub struct Product {
//!     #[converter(rename = "_id")]
//!     pub sku: String,
//!     pub price: f64,
//! }
//! ```
//!
//! Types without `default_hooks` implement `Hooks` themselves, overriding
//! only the callbacks they need.

extern crate proc_macro;
mod convertible;
mod entity;

use crate::convertible::{generate_convertible_for_enum, generate_convertible_for_struct};
use crate::entity::generate_entity_for_struct;
use proc_macro::TokenStream;
use syn::{Data, DeriveInput};

/// Derives the `Convertible` trait.
///
/// # Attributes
///
/// - `#[converter(ignored = "field, ...")]` on the type
/// - `#[converter(rename = "key")]` on a field
///
/// # Errors
///
/// Returns a compile error for unions, tuple structs and unknown
/// `converter` attributes.
#[proc_macro_derive(Convertible, attributes(converter))]
pub fn derive_convert(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_convertible_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new(
                    e.span(),
                    format!(
                        "Failed to derive Convertible for struct '{}': {}.\n\
                         Make sure all fields implement Convertible and Default.",
                        ast.ident, e
                    ),
                );
                error.to_compile_error().into()
            }
        },
        Data::Enum(ref data) => match generate_convertible_for_enum(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new(
                    e.span(),
                    format!(
                        "Failed to derive Convertible for enum '{}': {}.\n\
                         Ensure all enum variants have supported types.",
                        ast.ident, e
                    ),
                );
                error.to_compile_error().into()
            }
        },
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Convertible for unions. Unions are not supported by the Convertible derive macro.",
            );
            error.to_compile_error().into()
        }
    }
}

/// Derives the `Entity` trait, and `PrimaryKey` when an id field is named.
///
/// # Attributes
///
/// - `#[entity(collection = "name")]`
/// - `#[entity(id = "field")]`
/// - `#[entity(default_hooks)]`
///
/// # Errors
///
/// Returns a compile error if applied to an enum or union, if the id field
/// does not exist, or if an attribute is unknown.
#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as DeriveInput);

    match ast.data {
        Data::Struct(ref data) => match generate_entity_for_struct(&ast, data) {
            Ok(token_stream) => token_stream,
            Err(e) => {
                let error = syn::Error::new(
                    e.span(),
                    format!(
                        "Failed to derive Entity for struct '{}': {}.\n\
                         Example: #[entity(collection = \"users\", id = \"email\")]",
                        ast.ident, e
                    ),
                );
                error.to_compile_error().into()
            }
        },
        Data::Enum(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Entity for enums. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
        Data::Union(_) => {
            let error = syn::Error::new_spanned(
                &ast,
                "Cannot derive Entity for unions. Only structs are supported.",
            );
            error.to_compile_error().into()
        }
    }
}
