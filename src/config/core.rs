use anyhow::Context;
use tokio::task::JoinHandle;

use crate::ArcPath;

use super::{data::Data, message::Message};

const BUFFER_SIZE: usize = 32;

/// The configuration actor: owns the in-memory [`Data`] and the TOML file it
/// is loaded from and saved to.
///
/// # Thread Safety
/// Only the actor task touches `data`; reads and writes from any number of
/// handles are applied in the order they arrive.
pub struct Core {
    path: ArcPath,
    data: Data,
}

impl Core {
    /// Creates a configuration holding the defaults.
    ///
    /// # Arguments
    /// * `path` - The TOML file used by `load` and `save`. It is not read here.
    ///
    /// # Returns
    /// A new `Core` with default values.
    pub fn new(path: ArcPath) -> Self {
        Self {
            path,
            data: Data::default(),
        }
    }

    /// Spawns the configuration actor and returns a handle to it.
    ///
    /// # Returns
    /// A tuple containing:
    /// - The `Config` interface
    /// - A join handle for the spawned task
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(mut self) -> (super::Config, JoinHandle<()>) {
        let (tx, mut rx) = tokio::sync::mpsc::channel(BUFFER_SIZE);
        let handle = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                match msg {
                    Message::Load { tx } => {
                        let res = self.load().await;
                        let _ = tx.send(res);
                    }
                    Message::Save { tx } => {
                        let res = self.save().await;
                        let _ = tx.send(res);
                    }
                    Message::GetPath { opt, tx } => {
                        let _ = tx.send(self.data.path(opt));
                    }
                    Message::SetPath { opt, path } => self.data.set_path(opt, path),
                    Message::GetLogLevel { tx } => {
                        let _ = tx.send(self.data.log_level());
                    }
                    Message::SetLogLevel { level } => self.data.set_log_level(level),
                    Message::GetUSize { opt, tx } => {
                        let _ = tx.send(self.data.usize(opt));
                    }
                    Message::SetUSize { opt, size } => self.data.set_usize(opt, size),
                    Message::GetStr { opt, tx } => {
                        let _ = tx.send(self.data.str(opt));
                    }
                    Message::SetStr { opt, value } => self.data.set_str(opt, value),
                    Message::GetToken { tx } => {
                        let _ = tx.send(self.data.token());
                    }
                    Message::SetToken { token } => self.data.set_token(token),
                }
            }
        });
        (super::Config::Actual(tx), handle)
    }

    async fn load(&mut self) -> anyhow::Result<()> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Reading config file {}", self.path.display()))?;
        self.data = toml::from_str(&contents)
            .with_context(|| format!("Parsing config file {}", self.path.display()))?;
        Ok(())
    }

    async fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Creating config directory {}", parent.display()))?;
        }
        let contents = toml::to_string_pretty(&self.data).context("Serializing config")?;
        tokio::fs::write(&self.path, contents)
            .await
            .with_context(|| format!("Writing config file {}", self.path.display()))?;
        Ok(())
    }
}
