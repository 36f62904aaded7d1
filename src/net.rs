use std::collections::{BTreeMap, HashMap};

use anyhow::Context;
use tokio::sync::mpsc::Sender;

use crate::{
    ArcStr,
    config::{Config, USizeOpt},
    log::Log,
};

mod core;
mod data;
pub mod message;
mod mock;

pub use data::TransportError;
use message::Message;
pub use mock::MockRequest;

/// The networking actor.
///
/// Either a real actor performing HTTP requests through `reqwest` or a mock
/// answering from a table of canned responses. Cloning is cheap.
///
/// # Examples
/// ```ignore
/// let net = Net::spawn(config, log).await?;
/// let body = net.get(url, BTreeMap::new()).await?;
/// ```
#[derive(Debug, Clone)]
pub enum Net {
    /// A real networking actor that performs HTTP requests
    Actual(Sender<Message>),
    /// A mock implementation for testing
    Mock(mock::Mock),
}

impl Net {
    /// Spawns the networking actor, using the configured request timeout.
    pub async fn spawn(config: Config, log: Log) -> anyhow::Result<Self> {
        let timeout = config.seconds(USizeOpt::Timeout).await;
        let (net, _) = core::Core::new(log, timeout)
            .context("Building the HTTP client")?
            .spawn();
        Ok(net)
    }

    /// Creates a mock answering `GET url` with the mapped response.
    pub fn mock(responses: HashMap<ArcStr, Result<ArcStr, TransportError>>) -> Self {
        Self::Mock(mock::Mock::new(responses))
    }

    /// Creates a mock without responses; every request fails.
    pub fn mock_empty() -> Self {
        Self::Mock(mock::Mock::default())
    }

    /// Sets the response of a mock for `url`. No-op for the real actor.
    pub fn set_mock_response(&self, url: impl Into<ArcStr>, response: Result<ArcStr, TransportError>) {
        if let Net::Mock(mock) = self {
            mock.set_response(url.into(), response);
        }
    }

    /// Requests seen by a mock, in order; empty for the real actor.
    pub fn mock_requests(&self) -> Vec<MockRequest> {
        match self {
            Net::Actual(_) => Vec::new(),
            Net::Mock(mock) => mock.requests(),
        }
    }

    /// Performs an HTTP GET request.
    ///
    /// # Returns
    /// The response body of a 2xx response, or a [`TransportError`] for network
    /// failures, timeouts and non-2xx responses.
    pub async fn get(
        &self,
        url: ArcStr,
        headers: BTreeMap<ArcStr, ArcStr>,
    ) -> Result<ArcStr, TransportError> {
        match self {
            Net::Actual(sender) => {
                let (tx, rx) = tokio::sync::oneshot::channel();
                sender
                    .send(Message::Get { url, headers, tx })
                    .await
                    .context("Sending message to Net actor")
                    .expect("Net actor died");
                rx.await
                    .context("Awaiting response from Net actor")
                    .expect("Net actor died")
            }
            Net::Mock(mock) => mock.get(url, headers).await,
        }
    }
}
