use std::fmt;
use std::sync::Arc;

use reqwest::{Request, Response};
use tokio::time::timeout;

use crate::{ClientOptions, Error, Result, Transport};

/// Hook run by [`Client`] immediately before a request is dispatched.
///
/// Returning an error stops the pipeline: the request is never sent and the
/// error is handed back to the caller as-is.
pub trait Plugin: Send + Sync {
    fn before_dial(&self, ctx: &mut Context) -> Result<()>;
}

/// State of one call as it moves through the pipeline.
///
/// The context carries its own copy of the transport binding. Plugins may
/// replace it; the client that created the context never sees the change.
pub struct Context {
    request: Request,
    transport: Arc<dyn Transport>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("method", self.request.method())
            .field("url", &self.request.url().as_str())
            .finish_non_exhaustive()
    }
}

impl Context {
    pub fn new(request: Request, transport: Arc<dyn Transport>) -> Self {
        Self { request, transport }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    /// Transport this call will be dispatched through.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Binds a new transport for this call and returns the previous one.
    pub fn replace_transport(&mut self, transport: Arc<dyn Transport>) -> Arc<dyn Transport> {
        std::mem::replace(&mut self.transport, transport)
    }

    pub fn into_parts(self) -> (Request, Arc<dyn Transport>) {
        (self.request, self.transport)
    }
}

/// Minimal request pipeline with a single pre-dispatch extension point.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    plugins: Vec<Arc<dyn Plugin>>,
    options: ClientOptions,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("plugins", &self.plugins.len())
            .field("options", &self.options)
            .finish()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a client sending through a default `reqwest::Client`.
    pub fn new() -> Self {
        Self::with_transport(reqwest::Client::new())
    }

    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Creates a client around an already shared transport.
    pub fn from_shared(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            plugins: Vec::new(),
            options: ClientOptions::default(),
        }
    }

    /// Registers a plugin. Plugins run in registration order.
    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// The transport new calls start from.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Runs the plugins, then dispatches the request through whatever
    /// transport the call ended up bound to.
    ///
    /// With [`ClientOptions::timeout_ms`] set, the whole dispatch (every
    /// attempt and every wait between them) is abandoned once the deadline
    /// passes and [`Error::Timeout`] is returned.
    pub async fn send(&self, request: Request) -> Result<Response> {
        let mut ctx = Context::new(request, Arc::clone(&self.transport));
        for plugin in &self.plugins {
            plugin.before_dial(&mut ctx)?;
        }

        let (request, transport) = ctx.into_parts();
        let dispatch = transport.send(request);
        match self.options.timeout() {
            Some(deadline) => timeout(deadline, dispatch)
                .await
                .map_err(|_| Error::Timeout(deadline))?,
            None => dispatch.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use reqwest::{Method, Request, StatusCode};

    use super::{Client, Context, Plugin};
    use crate::testing::{Reply, ScriptedTransport};
    use crate::{Error, Result, Transport};

    fn get() -> Request {
        Request::new(Method::GET, "http://retry.test/".parse().unwrap())
    }

    struct Reject(Arc<AtomicUsize>);

    impl Plugin for Reject {
        fn before_dial(&self, _ctx: &mut Context) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(Error::TransportUnsupported)
        }
    }

    struct Redirect(Arc<dyn Transport>);

    impl Plugin for Redirect {
        fn before_dial(&self, ctx: &mut Context) -> Result<()> {
            ctx.replace_transport(Arc::clone(&self.0));
            Ok(())
        }
    }

    #[tokio::test]
    async fn plugin_error_stops_the_pipeline() {
        let transport = ScriptedTransport::repeating(Reply::Status(200));
        let runs = Arc::new(AtomicUsize::new(0));
        let client = Client::from_shared(transport.clone())
            .with_plugin(Reject(runs.clone()))
            .with_plugin(Reject(runs.clone()));

        let err = client.send(get()).await.expect_err("must be rejected");

        assert!(matches!(err, Error::TransportUnsupported));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn rebinding_is_scoped_to_one_call() {
        let original = ScriptedTransport::repeating(Reply::Status(200));
        let replacement = ScriptedTransport::repeating(Reply::Status(202));
        let client =
            Client::from_shared(original.clone()).with_plugin(Redirect(replacement.clone()));

        let response = client.send(get()).await.unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(replacement.calls(), 1);
        assert_eq!(original.calls(), 0);

        let bound: Arc<dyn Transport> = original.clone();
        assert!(Arc::ptr_eq(client.transport(), &bound));
    }

    #[tokio::test]
    async fn without_plugins_the_client_transport_is_used() {
        let transport = ScriptedTransport::repeating(Reply::Status(204));
        let client = Client::from_shared(transport.clone());

        let response = client.send(get()).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(transport.calls(), 1);
    }
}
