use reqwest::{Body, Method, Request};
use retry_transport::{Client, ClientOptions, RetryOptions, RetryPlugin};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("RETRY_DEMO_URL")?;
    let options = RetryOptions::from_env().map_err(anyhow::Error::msg)?;

    let client = Client::new()
        .with_plugin(RetryPlugin::from_options(options))
        .with_options(ClientOptions {
            timeout_ms: Some(10_000),
        });

    let mut request = Request::new(Method::POST, url.parse()?);
    *request.body_mut() = Some(Body::from("Hello, world"));

    let response = client.send(request).await?;
    println!("{}", response.status());
    println!("{}", response.text().await?);

    Ok(())
}
