//! Scripted in-memory transport shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{Body, Request, Response};

use crate::{Error, Result, Transport};

#[derive(Clone, Copy, Debug)]
pub(crate) enum Reply {
    Status(u16),
    Body(u16, &'static str),
    Fail(&'static str),
}

impl Reply {
    fn into_result(self) -> Result<Response> {
        let (status, body) = match self {
            Self::Status(status) => (status, ""),
            Self::Body(status, body) => (status, body),
            Self::Fail(message) => return Err(Error::other(message)),
        };
        let response = http::Response::builder()
            .status(status)
            .body(Body::from(body))
            .map_err(Error::other)?;
        Ok(Response::from(response))
    }
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Reply>,
    fallback: Option<Reply>,
    bodies: Vec<Option<Vec<u8>>>,
}

/// Replays queued replies in order, then the fallback reply, and records the
/// body of every request it receives.
#[derive(Debug)]
pub(crate) struct ScriptedTransport {
    script: Mutex<Script>,
}

impl ScriptedTransport {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script {
                replies: replies.into_iter().collect(),
                fallback: Some(Reply::Status(500)),
                bodies: Vec::new(),
            }),
        })
    }

    pub(crate) fn repeating(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script {
                fallback: Some(reply),
                ..Script::default()
            }),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.script.lock().unwrap().bodies.len()
    }

    pub(crate) fn bodies(&self) -> Vec<Option<Vec<u8>>> {
        self.script.lock().unwrap().bodies.clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let reply = {
            let mut script = self.script.lock().unwrap();
            let body = request.body().and_then(Body::as_bytes).map(<[u8]>::to_vec);
            script.bodies.push(body);
            let fallback = script.fallback;
            script.replies.pop_front().or(fallback)
        };
        reply
            .unwrap_or(Reply::Fail("script exhausted"))
            .into_result()
    }
}
