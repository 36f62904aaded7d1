use tokio::sync::oneshot;

use super::data::LogMessage;

/// Messages that can be sent to the log [`Core`](super::core::Core) actor.
#[derive(Debug)]
pub enum Message {
    /// Append a message to the log files
    Log(LogMessage),
    /// Print the buffered messages to stderr and stop the actor
    Flush(oneshot::Sender<()>),
    /// Delete log files older than the configured maximum age
    CollectGarbage,
}
