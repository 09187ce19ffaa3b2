#![deny(missing_docs)]

//! A runtime for Azure Functions custom handlers.
//!
//! The Functions host starts this process, then forwards every invocation to it
//! as an HTTP request. A handler receives the deserialized trigger payload and a
//! [`Context`] through which it logs and assigns output bindings. The runtime
//! reports logs and outputs back to the host once the handler completes.
//!
//! ```no_run
//! use azfn_runtime::{handler_fn, run, Context, Error};
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     run(handler_fn(func)).await
//! }
//!
//! async fn func(event: Value, ctx: Context) -> Result<(), Error> {
//!     ctx.log(format!("received {}", event));
//!     ctx.set_output("out", event);
//!     Ok(())
//! }
//! ```

use std::{fmt, future::Future};

pub use crate::config::{Config, ConfigError, OutputMode};
pub use crate::context::{Context, OutputBinding};
pub use crate::invocation::{InvocationError, InvocationRequest, InvocationResponse};
#[cfg(feature = "derive")]
pub use azfn_attributes::function;

pub mod config;
mod context;
pub mod invocation;
pub mod logging;
pub mod server;

/// Error type that handlers may result in.
pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A trait describing an asynchronous function `A` to `B`.
pub trait Handler<A, B> {
    /// Errors returned by this handler.
    type Error;
    /// Response of this handler.
    type Fut: Future<Output = Result<B, Self::Error>>;
    /// Handle the incoming event.
    fn call(&mut self, event: A, context: Context) -> Self::Fut;
}

/// Returns a new [`HandlerFn`] with the given closure.
pub fn handler_fn<F>(f: F) -> HandlerFn<F> {
    HandlerFn { f }
}

/// A [`Handler`] implemented by a closure.
#[derive(Clone, Debug)]
pub struct HandlerFn<F> {
    f: F,
}

impl<F, A, B, Error, Fut> Handler<A, B> for HandlerFn<F>
where
    F: Fn(A, Context) -> Fut,
    Fut: Future<Output = Result<B, Error>> + Send,
    Error: Into<Box<dyn std::error::Error + Send + Sync + 'static>> + fmt::Display,
{
    type Error = Error;
    type Fut = Fut;
    fn call(&mut self, req: A, ctx: Context) -> Self::Fut {
        (self.f)(req, ctx)
    }
}

/// Starts the runtime and begins serving invocations from the Functions host.
///
/// Configuration is read from the environment (see [`Config::from_env`]). The
/// future resolves once the process receives Ctrl-C.
///
/// # Example
/// ```no_run
/// use azfn_runtime::{handler_fn, Context, Error};
/// use serde_json::Value;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let func = handler_fn(func);
///     azfn_runtime::run(func).await?;
///     Ok(())
/// }
///
/// async fn func(event: Value, _: Context) -> Result<Value, Error> {
///     Ok(event)
/// }
/// ```
pub async fn run<A, B, F>(handler: F) -> Result<(), Error>
where
    F: Handler<A, B> + Send + 'static,
    F::Fut: Send + 'static,
    F::Error: fmt::Display + Send,
    A: for<'de> serde::Deserialize<'de> + Send + 'static,
    B: serde::Serialize + Send + 'static,
{
    let config = Config::from_env()?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("unable to listen for shutdown signal: {}", e);
            futures_util::future::pending::<()>().await;
        }
    };
    let server = server::Server::bind(&config, handler)?;
    tracing::info!(addr = %server.local_addr(), "listening for invocations");
    server.serve(shutdown).await
}
