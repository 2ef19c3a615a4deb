//! Procedural macros for Conduit message types.
//!
//! - `#[derive(Event)]` - implements `Event`
//! - `#[derive(Request)]` - implements `Request` with the response type given
//!   in `#[request(response = Type)]`
//!
//! Generated impls name the traits through the `conduit` facade
//! (`::conduit::core::Event`). Crates that depend on `conduit-core` directly
//! pass `crate = "::conduit_core"`.
//!
//! ```rust,ignore
//! use conduit::prelude::*;
//!
//! #[derive(Debug, Clone, Event)]
//! pub struct Ping;
//!
//! #[derive(Debug, Request)]
//! #[request(response = Identity)]
//! pub struct Whoami;
//! ```

mod message;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `Event` for a struct or enum.
///
/// The type must be `Send + Sync + 'static`. Accepts
/// `#[event(crate = "path")]` like [`macro@Request`].
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match message::derive_event(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derives `Request` for a struct or enum.
///
/// # Attributes
///
/// - `#[request(response = Type)]` - the response type (required)
/// - `#[request(crate = "path")]` - path to the core crate, when it is not
///   reachable as `::conduit::core`
#[proc_macro_derive(Request, attributes(request))]
pub fn derive_request(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match message::derive_request(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
