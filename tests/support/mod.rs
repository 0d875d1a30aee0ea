#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use vimond::core::errors::VimondError;
use vimond::core::kernel::{CallContext, RawResponse, RequestDescriptor, RestClient};
use vimond::VimondConnector;

#[derive(Default)]
struct State {
    responses: VecDeque<(StatusCode, Vec<u8>)>,
    requests: Vec<RequestDescriptor>,
}

/// Transport that records requests and replays canned responses in order
#[derive(Clone, Default)]
pub struct FakeRest {
    state: Arc<Mutex<State>>,
}

impl FakeRest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next unanswered request
    pub fn respond(self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.state
            .lock()
            .unwrap()
            .responses
            .push_back((status, body.into()));
        self
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn requests(&self) -> Vec<RequestDescriptor> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn connector(&self) -> VimondConnector<Self> {
        VimondConnector::new(self.clone())
    }
}

#[async_trait]
impl RestClient for FakeRest {
    async fn execute(
        &self,
        _ctx: &CallContext,
        request: RequestDescriptor,
    ) -> Result<RawResponse, VimondError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request);
        let (status, body) = state
            .responses
            .pop_front()
            .expect("no canned response left for request");
        Ok(RawResponse::from_bytes(status, body))
    }
}

/// Body of a recorded request, parsed as JSON
pub fn json_body(request: &RequestDescriptor) -> serde_json::Value {
    serde_json::from_slice(request.body.as_deref().expect("request has no body")).unwrap()
}
