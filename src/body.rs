use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::{Body, Request};

use crate::{Error, Result};

/// Request payload buffered once so it can be replayed on every attempt.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapturedBody {
    bytes: Option<Bytes>,
}

impl CapturedBody {
    /// Returns the captured bytes, or `None` if the request had no body.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }

    pub fn len(&self) -> usize {
        self.bytes.as_ref().map_or(0, Bytes::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drains the body of `request` to completion and puts a buffered copy
    /// of the same bytes back.
    ///
    /// Buffered bodies are copied as-is; streaming bodies are collected. A
    /// stream failure is reported as [`Error::BodyRead`] and leaves the
    /// request without a body. Afterwards `request` still carries its full
    /// payload, so evaluators see the request exactly as the caller built it.
    pub async fn capture(request: &mut Request) -> Result<Self> {
        let Some(body) = request.body_mut().take() else {
            return Ok(Self::default());
        };

        let bytes = match body.as_bytes() {
            Some(bytes) => Bytes::copy_from_slice(bytes),
            None => body.collect().await.map_err(Error::BodyRead)?.to_bytes(),
        };
        *request.body_mut() = Some(Body::from(bytes.clone()));

        Ok(Self { bytes: Some(bytes) })
    }

    /// Builds an attempt request from `template` carrying a fresh body over
    /// the captured bytes.
    ///
    /// The bytes are reference counted, so every attempt reads the same
    /// storage from its own starting position.
    pub fn replay(&self, template: &Request) -> Request {
        let mut request = Request::new(template.method().clone(), template.url().clone());
        *request.headers_mut() = template.headers().clone();
        *request.version_mut() = template.version();
        *request.timeout_mut() = template.timeout().copied();
        *request.body_mut() = self.bytes.clone().map(Body::from);
        request
    }
}
