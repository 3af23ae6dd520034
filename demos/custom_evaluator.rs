use std::time::Duration;

use reqwest::{Method, Request, StatusCode};
use retry_transport::{default_evaluate, evaluator_fn, Backoff, Client, RetryPlugin, Retryable};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("RETRY_DEMO_URL")?;

    // 404 is retried while 501 is given up on straight away.
    let evaluator = evaluator_fn(|outcome, request| match outcome {
        Ok(response) if response.status() == StatusCode::NOT_FOUND => {
            Err(Retryable::Custom("resource not visible yet".to_owned()))
        }
        Ok(response) if response.status() == StatusCode::NOT_IMPLEMENTED => Ok(()),
        _ => default_evaluate(outcome, request),
    });

    let retrier =
        Backoff::exponential(5, Duration::from_millis(50)).with_max_wait(Duration::from_secs(1));
    let client = Client::new().with_plugin(
        RetryPlugin::with_retrier(retrier)
            .with_evaluator(evaluator)
            .strict(),
    );

    let response = client.send(Request::new(Method::GET, url.parse()?)).await?;
    println!("{}", response.status());

    Ok(())
}
