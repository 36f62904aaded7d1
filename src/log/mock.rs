use std::sync::{Arc, Mutex};

use super::data::{LogLevel, LogMessage};

/// In-memory logger used by tests.
///
/// Messages are recorded synchronously so a test can assert on them right
/// after the operation that logged.
#[derive(Debug, Clone, Default)]
pub struct Mock {
    messages: Arc<Mutex<Vec<LogMessage>>>,
}

impl Mock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, scope: &'static str, message: String, level: LogLevel) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push(LogMessage {
                level,
                scope,
                message,
            });
        }
    }

    /// Returns a copy of every message logged so far.
    pub fn messages(&self) -> Vec<LogMessage> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}
