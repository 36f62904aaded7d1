use serde_json::Value;
use tokio::task::JoinHandle;

use super::{
    CrmApi,
    data::{decode_records, endpoint_url, request_headers},
    message::Message,
};
use crate::{ArcStr, channel::FetchOptions, log::Log, net::Net, net::TransportError};

const BUFFER_SIZE: usize = 100;
const SCOPE: &str = "api";

/// The core of the CRM API actor: knows the backend's base URL and token
/// and turns endpoint requests into [`Net`] calls.
#[derive(Debug, Clone)]
pub struct Core {
    net: Net,
    log: Log,
    base: ArcStr,
    token: Option<ArcStr>,
}

impl Core {
    /// # Arguments
    /// * `net` - The networking actor requests go through
    /// * `log` - The logging actor
    /// * `base` - Backend root, e.g. `http://localhost:8000`
    /// * `token` - Bearer token sent with every request, if any
    pub fn new(net: Net, log: Log, base: ArcStr, token: Option<ArcStr>) -> Self {
        Self {
            net,
            log,
            base,
            token,
        }
    }

    /// Transforms the core into an actor. Requests are served concurrently,
    /// each in its own task.
    pub fn spawn(self) -> (CrmApi, JoinHandle<()>) {
        let (tx, mut rx) = tokio::sync::mpsc::channel(BUFFER_SIZE);

        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Message::GetRecords {
                        endpoint,
                        options,
                        tx,
                    } => {
                        let core = self.clone();
                        tokio::spawn(async move {
                            let response = core.handle_get_records(&endpoint, &options).await;
                            let _ = tx.send(response);
                        });
                    }
                }
            }
        });

        (CrmApi { sender: tx }, handle)
    }

    async fn handle_get_records(
        &self,
        endpoint: &str,
        options: &FetchOptions,
    ) -> Result<Vec<Value>, TransportError> {
        let url = endpoint_url(&self.base, endpoint);
        let headers = request_headers(self.token.as_deref(), options);

        let body = self.net.get(url.clone(), headers).await?;
        let records = self
            .log
            .warn_on_error(SCOPE, decode_records(&body))?;
        self.log
            .info(SCOPE, format!("GET {}: {} records", url, records.len()));
        Ok(records)
    }
}
