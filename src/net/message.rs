use std::collections::BTreeMap;

use tokio::sync::oneshot::Sender;

use super::data::TransportError;
use crate::ArcStr;

/// Messages that can be sent to the networking [`Core`](super::core::Core).
#[derive(Debug)]
pub enum Message {
    /// Performs an HTTP GET request to the specified URL
    Get {
        url: ArcStr,
        headers: BTreeMap<ArcStr, ArcStr>,
        tx: Sender<Result<ArcStr, TransportError>>,
    },
}
