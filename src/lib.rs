//! `retry-transport` re-sends failed HTTP requests transparently.
//!
//! A [`RetryTransport`] sits in front of any [`Transport`] (a
//! `reqwest::Client` out of the box). It buffers the request body once, then
//! lets a [`Retrier`] run send-and-classify attempts until an [`Evaluator`]
//! calls the outcome terminal or the backoff budget runs out:
//! - [`Backoff`] provides constant and exponential schedules
//! - [`DefaultEvaluator`] retries transport failures, `429` and `5xx`
//! - [`RetryPlugin`] installs the decorator into a [`Client`] pipeline
//!
//! ```no_run
//! use reqwest::{Method, Request};
//! use retry_transport::{Client, RetryPlugin};
//!
//! # async fn run() -> retry_transport::Result<()> {
//! let client = Client::new().with_plugin(RetryPlugin::new());
//! let request = Request::new(Method::GET, "https://example.com".parse().unwrap());
//! let response = client.send(request).await?;
//! println!("{}", response.status());
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

mod backoff;
mod body;
mod client;
mod error;
mod evaluator;
mod options;
mod plugin;
mod retry;
mod transport;

#[cfg(test)]
mod testing;

pub use backoff::{Backoff, Retrier};
pub use body::CapturedBody;
pub use client::{Client, Context, Plugin};
pub use error::Error;
pub use evaluator::{
    default_evaluate, evaluator_fn, DefaultEvaluator, Evaluator, EvaluatorFn, Outcome, Retryable,
};
pub use options::{BackoffStrategy, ClientOptions, RetryOptions};
pub use plugin::{Compatibility, RetryPlugin};
pub use retry::RetryTransport;
pub use transport::Transport;

pub type Result<T> = std::result::Result<T, Error>;

/// Default number of retries after the initial attempt.
pub const RETRY_TIMES: usize = 3;

/// Default wait before each retry.
pub const RETRY_WAIT: Duration = Duration::from_millis(100);
