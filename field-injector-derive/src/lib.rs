//! Derive macro for field-injector
//!
//! `#[derive(Inject)]` exposes the `#[di(...)]` annotated fields of a struct
//! to a `field_injector::Container`:
//!
//! ```rust,ignore
//! use field_injector::{Container, Inject};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!     fn greet(&self) -> String;
//! }
//!
//! #[derive(Clone, Default)]
//! struct Person {
//!     name: String,
//! }
//!
//! #[derive(Default, Inject)]
//! struct Home {
//!     #[di("api")]
//!     host: Option<Arc<dyn Greeter>>,
//!     #[di("val")]
//!     guest: Option<Box<Person>>,
//!     #[di = "key:street"]
//!     street: String,
//!     // not exposed
//!     visits: u32,
//! }
//! ```
//!
//! The tag text is passed through verbatim; the container parses it at init,
//! so an unknown mode is skipped at runtime rather than rejected here.

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, Fields, GenericArgument, Lit, LitStr, Meta,
    PathArguments, Type, parse_macro_input,
};

/// Derive `field_injector::Inject`.
///
/// # Attributes
///
/// - `#[di("api")]`, `#[di("val")]`, `#[di("key:token")]` (or `#[di = "..."]`)
///
/// # Field shapes
///
/// The slot used for a field follows from how its type is written:
///
/// - `Option<Arc<dyn Trait>>` → `SharedSlot`
/// - `Option<Arc<T>>` → `ArcSlot`
/// - `Option<Box<T>>` → `BoxedSlot`
/// - `Box<T>` → `ValueSlot` over the boxed value
/// - anything else → `ValueSlot`
///
/// Type aliases hide the shape; spell the wrapper out in the field type.
#[proc_macro_derive(Inject, attributes(di))]
pub fn derive_inject(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Inject can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Inject can only be derived for structs",
            ));
        }
    };

    let mut entries = Vec::new();
    for field in fields {
        let Some(tag) = find_di_attr(&field.attrs)? else {
            continue;
        };
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };

        let field_name = ident.to_string();
        let slot = slot_for(&field.ty, quote!(self.#ident));
        entries.push(quote! {
            ::field_injector::Field::new(#field_name, #tag, #slot)
        });
    }

    Ok(quote! {
        impl #impl_generics ::field_injector::Inject for #name #ty_generics #where_clause {
            fn fields(&mut self) -> ::std::vec::Vec<::field_injector::Field<'_>> {
                ::std::vec![#(#entries),*]
            }
        }
    })
}

/// Read the tag text of a `#[di(...)]` attribute, if the field has one.
fn find_di_attr(attrs: &[Attribute]) -> syn::Result<Option<LitStr>> {
    let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("di")) else {
        return Ok(None);
    };

    match &attr.meta {
        Meta::List(_) => attr.parse_args::<LitStr>().map(Some),
        Meta::NameValue(nv) => match &nv.value {
            Expr::Lit(ExprLit {
                lit: Lit::Str(tag), ..
            }) => Ok(Some(tag.clone())),
            other => Err(syn::Error::new_spanned(
                other,
                "expected a string literal, e.g. #[di = \"val\"]",
            )),
        },
        Meta::Path(path) => Err(syn::Error::new_spanned(
            path,
            "missing directive, e.g. #[di(\"api\")], #[di(\"val\")] or #[di(\"key:name\")]",
        )),
    }
}

/// Slot constructor for a field, chosen from the shape of its type.
fn slot_for(ty: &Type, place: proc_macro2::TokenStream) -> proc_macro2::TokenStream {
    if let Some(inner) = generic_inner(ty, "Option") {
        if let Some(pointee) = generic_inner(inner, "Arc") {
            return if matches!(pointee, Type::TraitObject(_)) {
                quote!(::field_injector::SharedSlot::new(&mut #place))
            } else {
                quote!(::field_injector::ArcSlot::new(&mut #place))
            };
        }
        if generic_inner(inner, "Box").is_some() {
            return quote!(::field_injector::BoxedSlot::new(&mut #place));
        }
    }

    if generic_inner(ty, "Box").is_some() {
        return quote!(::field_injector::ValueSlot::new(&mut *#place));
    }

    quote!(::field_injector::ValueSlot::new(&mut #place))
}

/// Extract `T` from `Wrapper<T>`, matching on the last path segment.
fn generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }

    let segment = type_path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }

    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first()? {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}
