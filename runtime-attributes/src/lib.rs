#![deny(missing_docs)]

//! Macro attributes for the Azure Functions custom handler runtime.
//!
//! An asynchronous function annotated with the `#[function]` attribute must
//! accept an argument of type `A` which implements [`serde::Deserialize`], an
//! [`azfn_runtime::Context`] and return a `Result<B, E>`, where `B` implements
//! [`serde::Serialize`]. `E` is any type that implements
//! `Into<Box<dyn std::error::Error + Send + Sync + 'static>>`.
//!
//! ```ignore
//! use azfn_runtime::{function, Context, Error};
//! use serde_json::Value;
//!
//! #[function]
//! #[tokio::main]
//! async fn main(event: Value, ctx: Context) -> Result<(), Error> {
//!     ctx.log(format!("got {}", event));
//!     Ok(())
//! }
//! ```

extern crate proc_macro;

use proc_macro::TokenStream;
use quote::quote_spanned;
use syn::{spanned::Spanned, AttributeArgs, FnArg, ItemFn};

#[proc_macro_attribute]
/// Wrap an async function into the runtime constructs
pub fn function(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemFn);
    let args = syn::parse_macro_input!(attr as AttributeArgs);
    let ret = &input.sig.output;
    let name = &input.sig.ident;
    let body = &input.block;
    let attrs = &input.attrs;
    let asyncness = &input.sig.asyncness;
    let inputs = &input.sig.inputs;

    if let Some(arg) = args.first() {
        let tokens = quote_spanned! { arg.span() =>
            compile_error!("#[function] does not take arguments");
        };
        return TokenStream::from(tokens);
    }

    if name != "main" {
        let tokens = quote_spanned! { name.span() =>
            compile_error!("only the main function can be tagged with #[function]");
        };
        return TokenStream::from(tokens);
    }

    if asyncness.is_none() {
        let tokens = quote_spanned! { input.span() =>
          compile_error!("the async keyword is missing from the function declaration");
        };
        return TokenStream::from(tokens);
    }

    if inputs.len() != 2 {
        let tokens = quote_spanned! { inputs.span() =>
            compile_error!("The #[function] macro expects two arguments: a trigger payload and the invocation context.");
        };
        return TokenStream::from(tokens);
    }

    let mut typed = inputs.iter().filter_map(|arg| match arg {
        FnArg::Typed(arg) => Some(arg),
        FnArg::Receiver(_) => None,
    });
    let (event, context) = match (typed.next(), typed.next()) {
        (Some(event), Some(context)) => (event, context),
        _ => {
            let tokens = quote_spanned! { inputs.span() =>
                compile_error!("fn main's arguments must be fully formed");
            };
            return TokenStream::from(tokens);
        }
    };
    let event_name = &event.pat;
    let event_type = &event.ty;
    let context_name = &context.pat;
    let context_type = &context.ty;

    let result = quote_spanned! { input.span() =>

        #(#attrs)*
        #asyncness fn main() -> ::std::result::Result<(), ::azfn_runtime::Error> {
            async fn actual(#event_name: #event_type, #context_name: #context_type) #ret #body

            ::azfn_runtime::logging::init();
            let f = ::azfn_runtime::handler_fn(actual);
            ::azfn_runtime::run(f).await
        }
    };

    result.into()
}
