use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use super::data::TransportError;
use crate::ArcStr;

/// A request observed by the mock, kept for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    pub url: ArcStr,
    pub headers: BTreeMap<ArcStr, ArcStr>,
}

#[derive(Debug, Default)]
struct State {
    responses: HashMap<ArcStr, Result<ArcStr, TransportError>>,
    requests: Vec<MockRequest>,
}

/// Mock implementation of the Net actor.
///
/// Responses are keyed by URL; a URL without a response fails with a
/// `network_error`, as if the server were unreachable.
#[derive(Debug, Clone, Default)]
pub struct Mock {
    state: Arc<Mutex<State>>,
}

impl Mock {
    pub fn new(responses: HashMap<ArcStr, Result<ArcStr, TransportError>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                responses,
                requests: Vec::new(),
            })),
        }
    }

    pub fn set_response(&self, url: ArcStr, response: Result<ArcStr, TransportError>) {
        if let Ok(mut state) = self.state.lock() {
            state.responses.insert(url, response);
        }
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.state
            .lock()
            .map(|state| state.requests.clone())
            .unwrap_or_default()
    }

    pub async fn get(
        &self,
        url: ArcStr,
        headers: BTreeMap<ArcStr, ArcStr>,
    ) -> Result<ArcStr, TransportError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| TransportError::network("Mock state poisoned"))?;
        state.requests.push(MockRequest {
            url: url.clone(),
            headers,
        });
        state.responses.get(&url).cloned().unwrap_or_else(|| {
            Err(TransportError::network(format!(
                "GET request not found in mock responses: {}",
                url
            )))
        })
    }
}
