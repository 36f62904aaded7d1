use anyhow::Context;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
    task::JoinHandle,
};

use super::data::{LogLevel, LogMessage};
use super::message::Message;
use crate::ArcPath;

const BUFFER_SIZE: usize = 100;
const FILE_PREFIX: &str = "notify-hub_";

/// The core of the logging actor.
///
/// Every message is appended to a timestamped log file and to `latest.log`.
/// Messages at or above `print_level` are also kept in memory and written to
/// stderr when the logger is flushed, so a CLI run ends with a short summary
/// of what went wrong.
///
/// # Thread Safety
/// Owned by a single task; handles reach it only through the message
/// channel, so writes to the log files never interleave.
#[derive(Debug)]
pub struct Core {
    /// Directory where log files are stored
    log_dir: ArcPath,
    /// Path to the timestamped log file of this run
    log_path: ArcPath,
    log_file: File,
    latest_log_file: File,
    /// Messages to be printed to stderr on flush
    logs_to_print: Vec<LogMessage>,
    print_level: LogLevel,
    /// Maximum age of log files in days, 0 keeps them forever
    max_age: usize,
}

impl Core {
    /// Creates the log directory and opens both log files.
    ///
    /// # Arguments
    /// * `level` - Minimum level of messages echoed to stderr on flush
    /// * `max_age` - Age in days after which log files are deleted, 0 keeps them
    /// * `log_dir` - Directory holding the log files, created if missing
    ///
    /// # Returns
    /// A core ready to be spawned, with both files open for appending.
    ///
    /// # Errors
    /// Fails if the directory or either file cannot be created.
    pub async fn build(level: LogLevel, max_age: usize, log_dir: ArcPath) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&log_dir)
            .await
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let log_path = ArcPath::from(log_dir.join(format!(
            "{}{}.log",
            FILE_PREFIX,
            chrono::Utc::now().format("%Y-%m-%d-%H-%M-%S")
        )));
        let latest_log_path = log_dir.join("latest.log");

        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .await
            .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;
        let latest_log_file = File::create(&latest_log_path).await.with_context(|| {
            format!(
                "Failed to create latest log file: {}",
                latest_log_path.display()
            )
        })?;

        Ok(Self {
            log_dir,
            log_path,
            log_file,
            latest_log_file,
            logs_to_print: Vec::new(),
            print_level: level,
            max_age,
        })
    }

    /// Transforms the logging core into an actor.
    ///
    /// Messages are handled one at a time in the order they are sent.
    ///
    /// # Returns
    /// A tuple containing:
    /// - The `Log` interface
    /// - A join handle for the spawned task
    ///
    /// # Panics
    /// Panics if called outside a Tokio runtime.
    pub fn spawn(mut self) -> (super::Log, JoinHandle<()>) {
        let (tx, mut rx) = tokio::sync::mpsc::channel(BUFFER_SIZE);
        let handle = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match message {
                    Message::Log(msg) => self.log(msg).await,
                    Message::Flush(tx) => {
                        rx.close();
                        // Drain whatever was queued before the flush request
                        while let Ok(Message::Log(msg)) = rx.try_recv() {
                            self.log(msg).await;
                        }
                        self.flush();
                        let _ = tx.send(());
                        break;
                    }
                    Message::CollectGarbage => self.collect_garbage().await,
                }
            }
        });
        (super::Log::Actual(tx), handle)
    }

    async fn log(&mut self, message: LogMessage) {
        let line = format!("{}\n", &message);

        for file in [&mut self.log_file, &mut self.latest_log_file] {
            if let Err(e) = write_line(file, &line).await {
                eprintln!("Failed to write log line: {e}");
            }
        }

        if message.level >= self.print_level {
            self.logs_to_print.push(message);
        }
    }

    fn flush(self) {
        for message in &self.logs_to_print {
            eprintln!("{}", message);
        }
        if !self.logs_to_print.is_empty() {
            eprintln!("Check the full log file: {}", self.log_path.display());
        }
    }

    /// Deletes `notify-hub_*.log` files older than `max_age` days.
    async fn collect_garbage(&mut self) {
        if self.max_age == 0 {
            return;
        }

        let now = std::time::SystemTime::now();
        let Ok(mut entries) = tokio::fs::read_dir(&self.log_dir).await else {
            self.log(LogMessage {
                level: LogLevel::Error,
                scope: "log",
                message: "Failed to read the logs directory during garbage collection".into(),
            })
            .await;
            return;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.as_path() == &*self.log_path {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(FILE_PREFIX) || !name.ends_with(".log") {
                continue;
            }
            let Ok(Ok(modified)) = entry.metadata().await.map(|meta| meta.modified()) else {
                continue;
            };
            let Ok(age) = now.duration_since(modified) else {
                continue;
            };
            let days = age.as_secs() / 60 / 60 / 24;

            if days as usize > self.max_age && tokio::fs::remove_file(&path).await.is_err() {
                self.log(LogMessage {
                    level: LogLevel::Warning,
                    scope: "log",
                    message: format!("Failed to remove the log file: {}", path.display()),
                })
                .await;
            }
        }
    }
}

async fn write_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.write_all(line.as_bytes()).await?;
    file.flush().await
}
