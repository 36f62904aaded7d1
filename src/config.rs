use std::time::Duration;

use anyhow::Context;
use tokio::sync::{mpsc::Sender, oneshot};

use crate::{ArcPath, ArcStr, log::LogLevel};

mod core;
mod data;
pub mod message;
mod mock;

pub use data::{Data, PathOpt, StrOpt, USizeOpt};
use message::Message;

/// The configuration actor.
///
/// Either a real actor backed by a TOML file or an in-memory mock. Cloning is
/// cheap as it only copies the channel sender.
///
/// # Examples
/// ```ignore
/// let config = Config::spawn(config_path);
/// if config.load().await.is_err() {
///     config.save().await?;
/// }
/// let ttl = config.seconds(USizeOpt::CacheTtl).await;
/// ```
#[derive(Debug, Clone)]
pub enum Config {
    /// A real configuration actor that reads from and writes to a file
    Actual(Sender<Message>),
    /// A mock implementation for testing that stores data in memory
    Mock(mock::Mock),
}

impl Config {
    /// Spawns a configuration actor for the file at `path`. Values start at
    /// their defaults until [`Config::load`] succeeds.
    pub fn spawn(path: ArcPath) -> Self {
        let (config, _) = core::Core::new(path).spawn();
        config
    }

    /// Creates a mock configuration holding `data`.
    pub fn mock(data: Data) -> Self {
        Self::Mock(mock::Mock::new(data))
    }

    async fn request<T>(sender: &Sender<Message>, message: impl FnOnce(oneshot::Sender<T>) -> Message) -> T {
        let (tx, rx) = oneshot::channel();
        sender
            .send(message(tx))
            .await
            .context("Sending message to Config actor")
            .expect("Config actor died");
        rx.await
            .context("Awaiting response from Config actor")
            .expect("Config actor died")
    }

    async fn tell(sender: &Sender<Message>, message: Message) {
        sender
            .send(message)
            .await
            .context("Sending message to Config actor")
            .expect("Config actor died");
    }

    /// Loads the configuration from the file. Always succeeds for the mock.
    pub async fn load(&self) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Load { tx }).await,
            Self::Mock(_) => Ok(()),
        }
    }

    /// Saves the configuration to the file, creating parent directories.
    pub async fn save(&self) -> anyhow::Result<()> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::Save { tx }).await,
            Self::Mock(_) => Ok(()),
        }
    }

    pub async fn path(&self, opt: PathOpt) -> ArcPath {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::GetPath { opt, tx }).await,
            Self::Mock(mock) => mock.path(opt).await,
        }
    }

    pub async fn set_path(&self, opt: PathOpt, path: ArcPath) {
        match self {
            Self::Actual(sender) => Self::tell(sender, Message::SetPath { opt, path }).await,
            Self::Mock(mock) => mock.set_path(opt, path).await,
        }
    }

    pub async fn log_level(&self) -> LogLevel {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::GetLogLevel { tx }).await,
            Self::Mock(mock) => mock.log_level().await,
        }
    }

    pub async fn set_log_level(&self, level: LogLevel) {
        match self {
            Self::Actual(sender) => Self::tell(sender, Message::SetLogLevel { level }).await,
            Self::Mock(mock) => mock.set_log_level(level).await,
        }
    }

    pub async fn usize(&self, opt: USizeOpt) -> usize {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::GetUSize { opt, tx }).await,
            Self::Mock(mock) => mock.usize(opt).await,
        }
    }

    pub async fn set_usize(&self, opt: USizeOpt, value: usize) {
        match self {
            Self::Actual(sender) => {
                Self::tell(sender, Message::SetUSize { opt, size: value }).await
            }
            Self::Mock(mock) => mock.set_usize(opt, value).await,
        }
    }

    /// A numeric option interpreted as a number of seconds.
    pub async fn seconds(&self, opt: USizeOpt) -> Duration {
        Duration::from_secs(self.usize(opt).await as u64)
    }

    pub async fn str(&self, opt: StrOpt) -> ArcStr {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::GetStr { opt, tx }).await,
            Self::Mock(mock) => mock.str(opt).await,
        }
    }

    pub async fn set_str(&self, opt: StrOpt, value: ArcStr) {
        match self {
            Self::Actual(sender) => Self::tell(sender, Message::SetStr { opt, value }).await,
            Self::Mock(mock) => mock.set_str(opt, value).await,
        }
    }

    /// The bearer token attached to backend requests, if any.
    pub async fn token(&self) -> Option<ArcStr> {
        match self {
            Self::Actual(sender) => Self::request(sender, |tx| Message::GetToken { tx }).await,
            Self::Mock(mock) => mock.token().await,
        }
    }

    pub async fn set_token(&self, token: Option<ArcStr>) {
        match self {
            Self::Actual(sender) => Self::tell(sender, Message::SetToken { token }).await,
            Self::Mock(mock) => mock.set_token(token).await,
        }
    }
}
