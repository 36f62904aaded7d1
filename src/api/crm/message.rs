use serde_json::Value;
use tokio::sync::oneshot::Sender;

use crate::{ArcStr, channel::FetchOptions, net::TransportError};

/// Messages that can be sent to a [`CrmApi`](super::CrmApi) actor.
#[derive(Debug)]
pub enum Message {
    /// Fetches the `data` array of an endpoint
    GetRecords {
        /// Endpoint path such as `notifications` or `/api/clients`
        endpoint: ArcStr,
        /// Extra request headers
        options: FetchOptions,
        /// Response channel for the undecoded records
        tx: Sender<Result<Vec<Value>, TransportError>>,
    },
}
