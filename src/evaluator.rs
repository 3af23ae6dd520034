use reqwest::{Request, Response, StatusCode};

use crate::Error;

/// Outcome of a single attempt, borrowed for classification.
pub type Outcome<'a> = Result<&'a Response, &'a Error>;

/// Reason an attempt should be retried.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Retryable {
    /// The transport failed before a response arrived.
    #[error("retry: transport failure")]
    Transport,
    /// The server answered with an overload or failure status.
    #[error("retry: server response error")]
    Server,
    /// Reason supplied by a custom evaluator.
    #[error("retry: {0}")]
    Custom(String),
}

/// Decides whether an attempt outcome warrants another attempt.
///
/// `Ok(())` is terminal. `Err(_)` hands the reason to the retrier, which
/// attempts again while its budget lasts.
pub trait Evaluator: Send + Sync {
    fn evaluate(&self, outcome: Outcome<'_>, request: &Request) -> Result<(), Retryable>;
}

/// Retries transport failures, `429 Too Many Requests`, and every `5xx`.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultEvaluator;

impl Evaluator for DefaultEvaluator {
    fn evaluate(&self, outcome: Outcome<'_>, request: &Request) -> Result<(), Retryable> {
        default_evaluate(outcome, request)
    }
}

/// The rule behind [`DefaultEvaluator`], usable from custom evaluators.
pub fn default_evaluate(outcome: Outcome<'_>, _request: &Request) -> Result<(), Retryable> {
    match outcome {
        Err(_) => Err(Retryable::Transport),
        Ok(response) if is_retryable_status(response.status()) => Err(Retryable::Server),
        Ok(_) => Ok(()),
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Evaluator backed by a closure. Built with [`evaluator_fn`].
#[derive(Clone)]
pub struct EvaluatorFn<F> {
    f: F,
}

impl<F> std::fmt::Debug for EvaluatorFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorFn").finish_non_exhaustive()
    }
}

/// Adapts a closure into an [`Evaluator`].
///
/// ```
/// use reqwest::StatusCode;
/// use retry_transport::{default_evaluate, evaluator_fn, Retryable};
///
/// // Also retry 404s, which some eventually-consistent stores return briefly.
/// let evaluator = evaluator_fn(|outcome, request| match outcome {
///     Ok(response) if response.status() == StatusCode::NOT_FOUND => {
///         Err(Retryable::Custom("not found yet".to_owned()))
///     }
///     _ => default_evaluate(outcome, request),
/// });
/// # let _ = evaluator;
/// ```
pub fn evaluator_fn<F>(f: F) -> EvaluatorFn<F>
where
    F: Fn(Outcome<'_>, &Request) -> Result<(), Retryable> + Send + Sync,
{
    EvaluatorFn { f }
}

impl<F> Evaluator for EvaluatorFn<F>
where
    F: Fn(Outcome<'_>, &Request) -> Result<(), Retryable> + Send + Sync,
{
    fn evaluate(&self, outcome: Outcome<'_>, request: &Request) -> Result<(), Retryable> {
        (self.f)(outcome, request)
    }
}

#[cfg(test)]
mod tests {
    use reqwest::{Method, Request, Response};

    use super::{default_evaluate, evaluator_fn, DefaultEvaluator, Evaluator, Retryable};
    use crate::Error;

    fn request() -> Request {
        Request::new(Method::GET, "http://retry.test/".parse().unwrap())
    }

    fn response(status: u16) -> Response {
        Response::from(
            http::Response::builder()
                .status(status)
                .body("")
                .unwrap(),
        )
    }

    #[test]
    fn server_errors_and_rate_limits_are_retryable() {
        let req = request();
        for status in (500..=599).chain([429]) {
            let res = response(status);
            assert_eq!(
                DefaultEvaluator.evaluate(Ok(&res), &req),
                Err(Retryable::Server),
                "status {status}"
            );
        }
    }

    #[test]
    fn other_statuses_are_terminal() {
        let req = request();
        for status in (200..=499).filter(|status| *status != 429) {
            let res = response(status);
            assert_eq!(
                DefaultEvaluator.evaluate(Ok(&res), &req),
                Ok(()),
                "status {status}"
            );
        }
    }

    #[test]
    fn transport_errors_are_retryable() {
        let err = Error::other("connection reset");
        assert_eq!(
            default_evaluate(Err(&err), &request()),
            Err(Retryable::Transport)
        );
    }

    #[test]
    fn server_marker_keeps_its_message() {
        assert_eq!(Retryable::Server.to_string(), "retry: server response error");
    }

    #[test]
    fn closure_evaluator_can_override_the_default() {
        let evaluator = evaluator_fn(|outcome, request| match outcome {
            Ok(response) if response.status().as_u16() == 404 => {
                Err(Retryable::Custom("missing".to_owned()))
            }
            Ok(response) if response.status().as_u16() == 501 => Ok(()),
            _ => default_evaluate(outcome, request),
        });
        let req = request();

        assert_eq!(
            evaluator.evaluate(Ok(&response(404)), &req),
            Err(Retryable::Custom("missing".to_owned()))
        );
        assert_eq!(evaluator.evaluate(Ok(&response(501)), &req), Ok(()));
        assert_eq!(
            evaluator.evaluate(Ok(&response(502)), &req),
            Err(Retryable::Server)
        );
    }
}
