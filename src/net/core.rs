use std::{collections::BTreeMap, time::Duration};

use reqwest::Client;
use tokio::task::JoinHandle;

use super::{Net, data::TransportError, message::Message};
use crate::{ArcStr, log::Log};

const BUFFER_SIZE: usize = 100;
const SCOPE: &str = "net";

/// The networking actor: owns the `reqwest` client and performs requests on
/// behalf of [`Net`] handles.
///
/// Each request runs in its own task so one slow endpoint does not hold up
/// the others; the client shares its connection pool between them.
///
/// # Thread Safety
/// The loop that receives messages is the only owner of the core. Request
/// tasks get a clone of the client, which is safe to share across tasks.
#[derive(Debug)]
pub struct Core {
    log: Log,
    client: Client,
}

impl Core {
    /// Builds the HTTP client with a per-request `timeout`.
    ///
    /// # Arguments
    /// * `log` - The logging actor for request failures
    /// * `timeout` - Upper bound on each request, connection included
    ///
    /// # Returns
    /// A new `Core` with a fresh HTTP client.
    ///
    /// # Errors
    /// Fails if the TLS backend cannot be initialized.
    pub fn new(log: Log, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { log, client })
    }

    /// Transforms the networking core into an actor.
    ///
    /// # Returns
    /// A tuple containing:
    /// - The `Net` interface
    /// - A join handle for the spawned task
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(self) -> (Net, JoinHandle<()>) {
        let (tx, mut rx) = tokio::sync::mpsc::channel(BUFFER_SIZE);

        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Message::Get { url, headers, tx } => {
                        let client = self.client.clone();
                        let log = self.log.clone();
                        tokio::spawn(async move {
                            let response = handle_get_request(&client, &url, headers).await;
                            if let Err(e) = &response {
                                log.warn(SCOPE, format!("GET {} failed: {}", url, e));
                            }
                            let _ = tx.send(response);
                        });
                    }
                }
            }
        });

        (Net::Actual(tx), handle)
    }
}

async fn handle_get_request(
    client: &Client,
    url: &str,
    headers: BTreeMap<ArcStr, ArcStr>,
) -> Result<ArcStr, TransportError> {
    let mut request = client.get(url);
    for (key, value) in &headers {
        request = request.header(&**key, &**value);
    }

    let response = request.send().await?;
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(TransportError::from_response(status.as_u16(), &text));
    }
    Ok(ArcStr::from(text))
}
