use std::fmt;
use std::sync::Arc;

use crate::{
    Backoff, Context, DefaultEvaluator, Error, Evaluator, Plugin, Result, Retrier, RetryOptions,
    RetryTransport,
};

/// How a [`RetryPlugin`] treats the transport it finds bound to a call.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Compatibility {
    /// Wrap whatever transport is bound.
    #[default]
    Lenient,
    /// Refuse transports whose [`supports_retry`](crate::Transport::supports_retry)
    /// is `false`, failing the call with [`Error::TransportUnsupported`].
    Strict,
}

/// Pipeline hook that makes a call retry through a [`RetryTransport`].
///
/// On every call the plugin wraps the context's transport in a fresh
/// decorator. The client's own transport is never touched, so nothing has to
/// be restored afterwards and concurrent calls do not interfere.
///
/// ```no_run
/// use std::time::Duration;
/// use retry_transport::{Backoff, Client, RetryPlugin};
///
/// let client = Client::new()
///     .with_plugin(RetryPlugin::with_retrier(Backoff::exponential(4, Duration::from_millis(50))));
/// # let _ = client;
/// ```
pub struct RetryPlugin<R = Backoff, E = DefaultEvaluator> {
    retrier: Arc<R>,
    evaluator: Arc<E>,
    compatibility: Compatibility,
}

impl<R, E> fmt::Debug for RetryPlugin<R, E>
where
    R: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPlugin")
            .field("retrier", &self.retrier)
            .field("compatibility", &self.compatibility)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPlugin {
    /// Constant backoff: [`RETRY_TIMES`](crate::RETRY_TIMES) retries,
    /// [`RETRY_WAIT`](crate::RETRY_WAIT) apart.
    pub fn new() -> Self {
        Self::with_retrier(Backoff::default())
    }

    pub fn from_options(options: RetryOptions) -> Self {
        Self::with_retrier(Backoff::from(options))
    }
}

impl<R> RetryPlugin<R>
where
    R: Retrier,
{
    pub fn with_retrier(retrier: R) -> Self {
        Self {
            retrier: Arc::new(retrier),
            evaluator: Arc::new(DefaultEvaluator),
            compatibility: Compatibility::default(),
        }
    }
}

impl<R, E> RetryPlugin<R, E>
where
    R: Retrier + 'static,
    E: Evaluator + 'static,
{
    /// Replaces the evaluator deciding which outcomes are retried.
    pub fn with_evaluator<E2: Evaluator>(self, evaluator: E2) -> RetryPlugin<R, E2> {
        RetryPlugin {
            retrier: self.retrier,
            evaluator: Arc::new(evaluator),
            compatibility: self.compatibility,
        }
    }

    /// Refuses to wrap transports that do not support retries.
    pub fn strict(mut self) -> Self {
        self.compatibility = Compatibility::Strict;
        self
    }

    pub fn compatibility(&self) -> Compatibility {
        self.compatibility
    }

    /// Binds a retrying decorator around the context's current transport.
    pub fn install(&self, ctx: &mut Context) -> Result<()> {
        if self.compatibility == Compatibility::Strict && !ctx.transport().supports_retry() {
            return Err(Error::TransportUnsupported);
        }

        let inner = Arc::clone(ctx.transport());
        ctx.replace_transport(Arc::new(RetryTransport::from_parts(
            inner,
            Arc::clone(&self.retrier),
            Arc::clone(&self.evaluator),
        )));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "retry transport installed for {} {}",
            ctx.request().method(),
            ctx.request().url()
        );

        Ok(())
    }
}

impl<R, E> Plugin for RetryPlugin<R, E>
where
    R: Retrier + 'static,
    E: Evaluator + 'static,
{
    fn before_dial(&self, ctx: &mut Context) -> Result<()> {
        self.install(ctx)
    }
}
