//! Shared helpers for unit tests

use crate::error::TransportError;
use crate::http::Transport;
use crate::models::RawResponse;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// A request as seen by [`ScriptedTransport`]: URL plus headers or form pairs
pub type RecordedRequest = (String, Vec<(String, String)>);

/// Replays canned responses in order and records what was sent
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn with(replies: Vec<Result<RawResponse, TransportError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::default(),
        }
    }

    fn record(&self, url: &str, pairs: &[(&str, &str)]) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push((
            url.to_string(),
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reply left")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// URLs requested so far, in order
    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|(url, _)| url).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<RawResponse, TransportError> {
        self.record(url, headers)
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<RawResponse, TransportError> {
        self.record(url, form)
    }
}
