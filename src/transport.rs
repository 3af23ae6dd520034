use async_trait::async_trait;
use reqwest::{Request, Response};

use crate::{Error, Result};

/// Something that can send one request and hand back its response.
///
/// Implementations must accept being called repeatedly with structurally
/// equal but distinct request values: a retrying decorator sends a fresh
/// clone on every attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs a single send/receive cycle.
    async fn send(&self, request: Request) -> Result<Response>;

    /// Whether a retrying decorator may wrap this transport.
    ///
    /// Strict [`RetryPlugin`](crate::RetryPlugin)s refuse to install over a
    /// transport that returns `false`.
    fn supports_retry(&self) -> bool {
        true
    }
}

#[async_trait]
impl Transport for reqwest::Client {
    async fn send(&self, request: Request) -> Result<Response> {
        self.execute(request).await.map_err(Error::Transport)
    }
}
