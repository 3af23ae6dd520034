use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::{
    Backoff, CapturedBody, DefaultEvaluator, Error, Evaluator, Result, Retrier, Transport,
};

/// Transport decorator that re-sends failed requests.
///
/// The request body is captured once, then the retrier repeatedly runs a
/// single send-and-classify attempt against the inner transport. Whatever the
/// last attempt produced (a response, even a `503`, or an error) is returned
/// unchanged; the retrier's own exhaustion signal is never surfaced.
pub struct RetryTransport<R = Backoff, E = DefaultEvaluator> {
    inner: Arc<dyn Transport>,
    retrier: Arc<R>,
    evaluator: Arc<E>,
}

impl<R, E> fmt::Debug for RetryTransport<R, E>
where
    R: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryTransport")
            .field("retrier", &self.retrier)
            .finish_non_exhaustive()
    }
}

impl<R> RetryTransport<R>
where
    R: Retrier,
{
    /// Wraps `inner`, classifying outcomes with [`DefaultEvaluator`].
    pub fn new(inner: Arc<dyn Transport>, retrier: R) -> Self {
        Self {
            inner,
            retrier: Arc::new(retrier),
            evaluator: Arc::new(DefaultEvaluator),
        }
    }
}

impl<R, E> RetryTransport<R, E>
where
    R: Retrier,
    E: Evaluator,
{
    pub(crate) fn from_parts(
        inner: Arc<dyn Transport>,
        retrier: Arc<R>,
        evaluator: Arc<E>,
    ) -> Self {
        Self {
            inner,
            retrier,
            evaluator,
        }
    }

    /// Replaces the evaluator deciding which outcomes are retried.
    pub fn with_evaluator<E2: Evaluator>(self, evaluator: E2) -> RetryTransport<R, E2> {
        RetryTransport {
            inner: self.inner,
            retrier: self.retrier,
            evaluator: Arc::new(evaluator),
        }
    }

    /// The transport every attempt is sent through.
    pub fn inner(&self) -> &Arc<dyn Transport> {
        &self.inner
    }
}

#[async_trait]
impl<R, E> Transport for RetryTransport<R, E>
where
    R: Retrier + 'static,
    E: Evaluator + 'static,
{
    async fn send(&self, mut request: Request) -> Result<Response> {
        let body = CapturedBody::capture(&mut request).await?;
        let last: Mutex<Option<Result<Response>>> = Mutex::new(None);

        let verdict = {
            let (request, body, last) = (&request, &body, &last);
            let (inner, evaluator) = (&self.inner, &*self.evaluator);

            self.retrier
                .run(move || {
                    let attempt = body.replay(request);
                    async move {
                        let outcome = inner.send(attempt).await;
                        let verdict = evaluator.evaluate(outcome.as_ref(), request);
                        *last.lock().unwrap_or_else(PoisonError::into_inner) = Some(outcome);
                        verdict
                    }
                })
                .await
        };

        #[cfg(feature = "tracing")]
        {
            if let Err(reason) = &verdict {
                tracing::debug!(
                    "giving up on {} {}: {reason}",
                    request.method(),
                    request.url()
                );
            }
        }
        #[cfg(not(feature = "tracing"))]
        let _ = verdict;

        last.into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .unwrap_or(Err(Error::NoAttempt))
    }

    fn supports_retry(&self) -> bool {
        false
    }
}
