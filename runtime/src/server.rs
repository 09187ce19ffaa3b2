//! The HTTP server the Functions host forwards invocations to.

use crate::{
    config::{Config, OutputMode},
    context::Context,
    invocation::{InvocationError, InvocationRequest, InvocationResponse, INVOCATION_ID_HEADER, UNKNOWN_INVOCATION_ID},
    Error, Handler,
};
use futures_util::future::BoxFuture;
use http::{
    header::{HeaderValue, CONTENT_TYPE},
    Method, Request, Response, StatusCode,
};
use hyper::{
    server::conn::{AddrIncoming, AddrStream},
    service::make_service_fn,
    Body,
};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    convert::Infallible,
    fmt,
    future::Future,
    marker::PhantomData,
    net::SocketAddr,
    sync::Arc,
    task::{Context as TaskContext, Poll},
};
use tokio::sync::Mutex;
use tower_service::Service;
use tracing_futures::Instrument;

/// A bound invocation server, ready to serve.
pub struct Server<H, A, B> {
    incoming: AddrIncoming,
    service: InvocationService<H, A, B>,
}

impl<H, A, B> Server<H, A, B>
where
    H: Handler<A, B> + Send + 'static,
    H::Fut: Send + 'static,
    H::Error: fmt::Display + Send,
    A: DeserializeOwned + Send + 'static,
    B: Serialize + Send + 'static,
{
    /// Binds the address from `config`. Port `0` picks a free port.
    pub fn bind(config: &Config, handler: H) -> Result<Self, Error> {
        let incoming = AddrIncoming::bind(&config.addr)?;
        Ok(Server {
            incoming,
            service: InvocationService::new(handler, config.output_mode),
        })
    }

    /// The address the server listens on.
    pub fn local_addr(&self) -> SocketAddr {
        self.incoming.local_addr()
    }

    /// Serves invocations until `shutdown` resolves, then drains in-flight ones.
    pub async fn serve<S>(self, shutdown: S) -> Result<(), Error>
    where
        S: Future<Output = ()>,
    {
        let service = self.service;
        let make_service = make_service_fn(move |_: &AddrStream| {
            let service = service.clone();
            async move { Ok::<_, Infallible>(service) }
        });

        hyper::Server::builder(self.incoming)
            .serve(make_service)
            .with_graceful_shutdown(shutdown)
            .await?;
        tracing::info!("invocation server stopped");
        Ok(())
    }
}

/// Turns host requests into handler invocations.
pub struct InvocationService<H, A, B> {
    handler: Arc<Mutex<H>>,
    output_mode: OutputMode,
    _types: PhantomData<fn(A) -> B>,
}

impl<H, A, B> Clone for InvocationService<H, A, B> {
    fn clone(&self) -> Self {
        InvocationService {
            handler: Arc::clone(&self.handler),
            output_mode: self.output_mode,
            _types: PhantomData,
        }
    }
}

impl<H, A, B> InvocationService<H, A, B>
where
    H: Handler<A, B> + Send + 'static,
    H::Fut: Send + 'static,
    H::Error: fmt::Display + Send,
    A: DeserializeOwned + Send + 'static,
    B: Serialize + Send + 'static,
{
    /// Wraps `handler`.
    pub fn new(handler: H, output_mode: OutputMode) -> Self {
        InvocationService {
            handler: Arc::new(Mutex::new(handler)),
            output_mode,
            _types: PhantomData,
        }
    }

    async fn invoke(&self, req: Request<Body>) -> Response<Body> {
        let (parts, body) = req.into_parts();
        let function_name = parts.uri.path().trim_matches('/').to_owned();
        let invocation_id = parts
            .headers
            .get(INVOCATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(UNKNOWN_INVOCATION_ID)
            .to_owned();
        let span = tracing::info_span!("invocation", function = %function_name, invocation_id = %invocation_id);

        async move {
            if parts.method != Method::POST {
                return failure(None, InvocationError::MethodNotAllowed(parts.method));
            }
            let request = match hyper::body::to_bytes(body).await {
                Ok(bytes) => InvocationRequest::from_slice(&bytes),
                Err(e) => Err(InvocationError::from(e)),
            };
            let (event, metadata) = match request.and_then(InvocationRequest::into_event::<A>) {
                Ok(decoded) => decoded,
                Err(e) => return failure(None, e),
            };

            let context = Context::new(invocation_id, function_name).with_metadata(metadata);
            let fut = {
                let mut handler = self.handler.lock().await;
                handler.call(event, context.clone())
            };

            match fut.await {
                Ok(value) => match serde_json::to_value(&value) {
                    Ok(value) => {
                        tracing::debug!("invocation completed");
                        let response = InvocationResponse::completed(&context, self.output_mode, value);
                        reply(StatusCode::OK, &response)
                    }
                    Err(e) => failure(Some(&context), InvocationError::ReturnValue(e)),
                },
                Err(e) => failure(Some(&context), InvocationError::Handler(e.to_string())),
            }
        }
        .instrument(span)
        .await
    }
}

impl<H, A, B> Service<Request<Body>> for InvocationService<H, A, B>
where
    H: Handler<A, B> + Send + 'static,
    H::Fut: Send + 'static,
    H::Error: fmt::Display + Send,
    A: DeserializeOwned + Send + 'static,
    B: Serialize + Send + 'static,
{
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, _: &mut TaskContext<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let service = self.clone();
        Box::pin(async move { Ok(service.invoke(req).await) })
    }
}

fn failure(context: Option<&Context>, error: InvocationError) -> Response<Body> {
    tracing::error!("invocation failed: {}", error);
    reply(error.status(), &InvocationResponse::failed(context, &error))
}

fn reply(status: StatusCode, response: &InvocationResponse) -> Response<Body> {
    let (status, body) = match serde_json::to_vec(response) {
        Ok(body) => (status, body),
        Err(e) => {
            tracing::error!("unable to encode invocation response: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, b"{}".to_vec())
        }
    };
    let mut res = Response::new(Body::from(body));
    *res.status_mut() = status;
    res.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    res
}
