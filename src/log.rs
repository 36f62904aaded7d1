use std::fmt::Display;

use tokio::sync::mpsc::{Sender, error::TrySendError};

use crate::ArcPath;

mod core;
mod data;
pub mod message;
mod mock;

pub use data::{LogLevel, LogMessage};
use message::Message;

/// The logging actor.
///
/// Either a real actor writing to log files or an in-memory mock. Cloning is
/// cheap: it copies the channel sender or the mock's shared buffer.
///
/// # Examples
/// ```ignore
/// let log = Log::spawn(LogLevel::Warning, 7, log_dir).await?;
/// log.info("cache", "hit for notifications-{}");
/// ```
#[derive(Debug, Clone)]
pub enum Log {
    /// A real logging actor that writes to files and stderr
    Actual(Sender<Message>),
    /// A mock logger that keeps messages in memory
    Mock(mock::Mock),
}

impl Log {
    /// Builds the log files inside `log_dir` and spawns the actor.
    ///
    /// # Arguments
    /// * `level` - Minimum level echoed to stderr on flush
    /// * `max_age` - Maximum age of log files in days, 0 disables garbage collection
    /// * `log_dir` - Directory where log files are stored
    pub async fn spawn(level: LogLevel, max_age: usize, log_dir: ArcPath) -> anyhow::Result<Self> {
        let (log, _) = core::Core::build(level, max_age, log_dir).await?.spawn();
        Ok(log)
    }

    /// Creates a logger that records messages in memory.
    pub fn mock() -> Self {
        Self::Mock(mock::Mock::new())
    }

    fn log(&self, scope: &'static str, message: String, level: LogLevel) {
        let sender = match self {
            Log::Mock(mock) => return mock.log(scope, message, level),
            Log::Actual(sender) => sender,
        };

        let message = Message::Log(LogMessage {
            level,
            scope,
            message,
        });
        // Logging never blocks the caller; a full queue hands the message to a task
        if let Err(TrySendError::Full(message)) = sender.try_send(message) {
            let sender = sender.clone();
            tokio::spawn(async move {
                let _ = sender.send(message).await;
            });
        }
    }

    /// Log a message with the `INFO` level
    pub fn info<M: Display>(&self, scope: &'static str, message: M) {
        self.log(scope, message.to_string(), LogLevel::Info);
    }

    /// Log a message with the `WARNING` level
    pub fn warn<M: Display>(&self, scope: &'static str, message: M) {
        self.log(scope, message.to_string(), LogLevel::Warning);
    }

    /// Log a message with the `ERROR` level
    pub fn error<M: Display>(&self, scope: &'static str, message: M) {
        self.log(scope, message.to_string(), LogLevel::Error);
    }

    /// Log a warning if the result is an error and return the result as is
    pub fn warn_on_error<T, E: Display>(
        &self,
        scope: &'static str,
        result: Result<T, E>,
    ) -> Result<T, E> {
        if let Err(err) = &result {
            self.log(scope, err.to_string(), LogLevel::Warning);
        }
        result
    }

    /// Log an error if the result is an error and return the result as is
    pub fn error_on_error<T, E: Display>(
        &self,
        scope: &'static str,
        result: Result<T, E>,
    ) -> Result<T, E> {
        if let Err(err) = &result {
            self.log(scope, err.to_string(), LogLevel::Error);
        }
        result
    }

    /// Prints the buffered messages to stderr and stops the actor. Resolves
    /// once the summary has been printed. Messages logged after a flush are
    /// dropped.
    pub async fn flush(self) {
        if let Self::Actual(sender) = self {
            let (tx, rx) = tokio::sync::oneshot::channel();
            if sender.send(Message::Flush(tx)).await.is_ok() {
                let _ = rx.await;
            }
        }
    }

    /// Deletes log files older than the `max_age` given at spawn time.
    pub async fn collect_garbage(&self) {
        if let Self::Actual(sender) = self {
            let _ = sender.send(Message::CollectGarbage).await;
        }
    }

    /// Messages recorded by a mock logger; `None` for the real actor.
    pub fn messages(&self) -> Option<Vec<LogMessage>> {
        match self {
            Self::Actual(_) => None,
            Self::Mock(mock) => Some(mock.messages()),
        }
    }
}
