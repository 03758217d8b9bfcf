//! Derive macros for the quoha virtual machine.
//!
//! Provides `#[derive(Error)]`, which generates `Display` and `std::error::Error`
//! for the VM's error and panic-kind enums.

mod error;

use proc_macro::TokenStream;

/// Implements `Display` and `Error` from per-variant `#[error("...")]` messages.
#[proc_macro_derive(Error, attributes(error))]
pub fn derive_error(input: TokenStream) -> TokenStream {
    error::derive_error(input)
}
