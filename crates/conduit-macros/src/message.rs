//! `Event` and `Request` derive implementations.
//!
//! # `#[derive(Event)]`
//!
//! Emits `impl Event for T {}`. Accepts an optional `#[event(...)]`:
//!
//! | Key | Example | Description |
//! |-----|---------|-------------|
//! | `crate` | `"::conduit_core"` | Path to the core crate (default `::conduit::core`) |
//!
//! # `#[derive(Request)]`
//!
//! Emits `impl Request for T { type Response = …; }`. Requires
//! `#[request(response = Type)]`:
//!
//! | Key | Example | Required | Description |
//! |-----|---------|----------|-------------|
//! | `response` | `Identity` | **Yes** | The handler's response type |
//! | `crate` | `"::conduit_core"` | No | Path to the core crate (default `::conduit::core`) |

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{Attribute, Data, DeriveInput, LitStr, Path, Type, spanned::Spanned};

// ============================================================================
// Attribute parsing
// ============================================================================

#[derive(Default)]
struct MessageAttrs {
    response: Option<Type>,
    krate: Option<Path>,
}

fn parse_attrs(attrs: &[Attribute], ident: &str) -> syn::Result<MessageAttrs> {
    let mut result = MessageAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident(ident) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("response") && ident == "request" {
                result.response = Some(meta.value()?.parse::<Type>()?);
            } else if meta.path.is_ident("crate") {
                let lit = meta.value()?.parse::<LitStr>()?;
                result.krate = Some(lit.parse::<Path>()?);
            } else {
                return Err(meta.error(format!("unknown #[{ident}] key")));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

fn core_path(krate: Option<Path>) -> TokenStream {
    match krate {
        Some(path) => quote!(#path),
        None => quote!(::conduit::core),
    }
}

fn reject_unions(input: &DeriveInput, derive: &str) -> syn::Result<()> {
    if let Data::Union(_) = input.data {
        return Err(syn::Error::new(
            input.span(),
            format!("{derive} cannot be derived for unions"),
        ));
    }
    Ok(())
}

// ============================================================================
// Code generation
// ============================================================================

pub fn derive_event(input: &DeriveInput) -> syn::Result<TokenStream> {
    reject_unions(input, "Event")?;
    let attrs = parse_attrs(&input.attrs, "event")?;
    let core = core_path(attrs.krate);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #core::Event for #name #ty_generics #where_clause {}
    })
}

pub fn derive_request(input: &DeriveInput) -> syn::Result<TokenStream> {
    reject_unions(input, "Request")?;
    let attrs = parse_attrs(&input.attrs, "request")?;
    let response = attrs.response.ok_or_else(|| {
        syn::Error::new(
            Span::call_site(),
            "Request requires #[request(response = Type)]",
        )
    })?;
    let core = core_path(attrs.krate);

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics #core::Request for #name #ty_generics #where_clause {
            type Response = #response;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_event_impl() {
        let input: DeriveInput = parse_quote! {
            struct Ping;
        };
        let tokens = derive_event(&input).unwrap().to_string();
        assert!(tokens.contains(":: conduit :: core :: Event for Ping"));
    }

    #[test]
    fn test_event_with_custom_crate_path() {
        let input: DeriveInput = parse_quote! {
            #[event(crate = "::conduit_core")]
            struct Ping;
        };
        let tokens = derive_event(&input).unwrap().to_string();
        assert!(tokens.contains(":: conduit_core :: Event for Ping"));
    }

    #[test]
    fn test_request_impl() {
        let input: DeriveInput = parse_quote! {
            #[request(response = Identity)]
            struct Whoami;
        };
        let tokens = derive_request(&input).unwrap().to_string();
        assert!(tokens.contains(":: conduit :: core :: Request for Whoami"));
        assert!(tokens.contains("type Response = Identity"));
    }

    #[test]
    fn test_request_keeps_generics() {
        let input: DeriveInput = parse_quote! {
            #[request(response = Option<T>)]
            struct Lookup<T: Send + 'static> {
                key: String,
                _marker: std::marker::PhantomData<T>,
            }
        };
        let tokens = derive_request(&input).unwrap().to_string();
        assert!(tokens.contains("Request for Lookup < T >"));
        assert!(tokens.contains("type Response = Option < T >"));
    }

    #[test]
    fn test_request_requires_response() {
        let input: DeriveInput = parse_quote! {
            struct Whoami;
        };
        let err = derive_request(&input).unwrap_err();
        assert!(err.to_string().contains("response = Type"));
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let input: DeriveInput = parse_quote! {
            #[request(response = u8, reply = u8)]
            struct Whoami;
        };
        assert!(derive_request(&input).is_err());
    }

    #[test]
    fn test_unions_are_rejected() {
        let input: DeriveInput = parse_quote! {
            union Bits { a: u32, b: f32 }
        };
        assert!(derive_event(&input).is_err());
    }
}
