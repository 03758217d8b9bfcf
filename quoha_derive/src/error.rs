//! Derive macro for VM error enums.
//!
//! ```ignore
//! use quoha_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum VmError {
//!     #[error("program counter {index} out of range for a core of {capacity} cells")]
//!     OutOfRange { index: usize, capacity: usize },
//!
//!     #[error("cell {0} is not writable")]
//!     ReadOnly(usize),
//!
//!     #[error("timer expired")]
//!     WatchdogExpired,
//! }
//! ```
//!
//! Placeholders are checked at expansion time: `{0}` must name an existing tuple
//! field and `{name}` an existing struct field, otherwise the derive fails with a
//! span on the offending attribute.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Lit, LitStr, Meta, Variant, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Error derive only supports enums",
        ));
    };

    let arms = data_enum
        .variants
        .iter()
        .map(display_arm)
        .collect::<syn::Result<Vec<_>>>()?;

    // An uninhabited enum still needs a well-formed match.
    let body = if arms.is_empty() {
        quote! { match *self {} }
    } else {
        quote! { match self { #(#arms)* } }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

fn display_arm(variant: &Variant) -> syn::Result<proc_macro2::TokenStream> {
    let variant_name = &variant.ident;
    let (message, lit) = error_message(&variant.attrs, variant)?;
    let placeholders = placeholders(&message);

    let arm = match &variant.fields {
        Fields::Unit => {
            if let Some(first) = placeholders.first() {
                return Err(syn::Error::new_spanned(
                    &lit,
                    format!("unit variant `{variant_name}` has no field `{first}`"),
                ));
            }
            quote! {
                Self::#variant_name => write!(f, #message),
            }
        }
        Fields::Unnamed(fields) => {
            let count = fields.unnamed.len();
            for placeholder in &placeholders {
                let in_range = placeholder.parse::<usize>().is_ok_and(|i| i < count);
                if !in_range {
                    return Err(syn::Error::new_spanned(
                        &lit,
                        format!("variant `{variant_name}` has no positional field `{placeholder}`"),
                    ));
                }
            }
            let patterns = (0..count).map(|i| {
                if placeholders.contains(&i.to_string()) {
                    let binding = format_ident!("f{}", i);
                    quote! { #binding }
                } else {
                    quote! { _ }
                }
            });
            let used: Vec<_> = (0..count)
                .filter(|i| placeholders.contains(&i.to_string()))
                .map(|i| format_ident!("f{}", i))
                .collect();
            let format_str = positional_to_named(&message, count);
            quote! {
                Self::#variant_name(#(#patterns),*) => write!(f, #format_str #(, #used = #used)*),
            }
        }
        Fields::Named(fields) => {
            let field_idents: Vec<&syn::Ident> = fields
                .named
                .iter()
                .filter_map(|field| field.ident.as_ref())
                .collect();
            for placeholder in &placeholders {
                if !field_idents.iter().any(|ident| ident.to_string() == *placeholder) {
                    return Err(syn::Error::new_spanned(
                        &lit,
                        format!("variant `{variant_name}` has no field `{placeholder}`"),
                    ));
                }
            }
            let used: Vec<&syn::Ident> = field_idents
                .iter()
                .copied()
                .filter(|ident| placeholders.contains(&ident.to_string()))
                .collect();
            quote! {
                Self::#variant_name { #(#used,)* .. } => write!(f, #message #(, #used = #used)*),
            }
        }
    };

    Ok(arm)
}

/// Returns the `#[error("...")]` message and its literal for span reporting.
fn error_message(attrs: &[Attribute], variant: &Variant) -> syn::Result<(String, LitStr)> {
    for attr in attrs {
        if !attr.path().is_ident("error") {
            continue;
        }
        let Meta::List(meta_list) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                &attr.meta,
                "use #[error(\"message\")] to describe the error",
            ));
        };
        return match syn::parse2::<Lit>(meta_list.tokens.clone()) {
            Ok(Lit::Str(lit)) => Ok((lit.value(), lit)),
            _ => Err(syn::Error::new_spanned(
                &attr.meta,
                "#[error] expects a string literal, e.g. #[error(\"stack overflow at {0}\")]",
            )),
        };
    }

    Err(syn::Error::new_spanned(
        &variant.ident,
        format!(
            "missing #[error(\"...\")] attribute on variant `{}`",
            variant.ident
        ),
    ))
}

/// Collects the argument names of `{name}` / `{name:spec}` placeholders, skipping `{{` escapes.
fn placeholders(message: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut chars = message.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
            }
            '{' => {
                let mut arg = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    arg.push(c);
                }
                let name = arg.split(':').next().unwrap_or_default().trim();
                if !name.is_empty() && !found.iter().any(|f| f == name) {
                    found.push(name.to_string());
                }
            }
            _ => {}
        }
    }
    found
}

/// Rewrites `{0}`, `{1}` into `{f0}`, `{f1}` to match the tuple bindings.
fn positional_to_named(message: &str, field_count: usize) -> String {
    let mut result = message.to_string();
    for i in (0..field_count).rev() {
        result = result
            .replace(&format!("{{{i}}}"), &format!("{{f{i}}}"))
            .replace(&format!("{{{i}:"), &format!("{{f{i}:"));
    }
    result
}
