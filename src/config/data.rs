use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{ArcPath, ArcStr, log::LogLevel};

/// Path-valued options.
#[derive(Debug, Clone, Copy)]
pub enum PathOpt {
    /// Directory where log files are stored
    LogDir,
}

/// Numeric options.
#[derive(Debug, Clone, Copy)]
pub enum USizeOpt {
    /// Maximum age of log files in days before they are deleted, 0 keeps them
    MaxAge,
    /// Timeout for network requests in seconds
    Timeout,
    /// Lifetime of a cached response in seconds
    CacheTtl,
    /// Period of the background refresh in seconds
    RefreshInterval,
}

/// String-valued options.
#[derive(Debug, Clone, Copy)]
pub enum StrOpt {
    /// Base URL of the backend, without the `/api` prefix
    ApiBase,
}

/// Every configurable value, as stored in `config.toml`.
///
/// Missing keys fall back to their defaults, so a config file written by an
/// older version still loads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Data {
    api_base: ArcStr,
    /// Bearer token attached to backend requests
    token: Option<ArcStr>,
    log_dir: ArcPath,
    log_level: LogLevel,
    max_age: usize,
    timeout: usize,
    cache_ttl: usize,
    refresh_interval: usize,
}

impl Default for Data {
    fn default() -> Self {
        Self {
            api_base: ArcStr::from("http://localhost:8000"),
            token: None,
            log_dir: ArcPath::from(Path::new("/tmp/notify-hub/logs")),
            log_level: LogLevel::Warning,
            max_age: 0,
            timeout: 10,
            cache_ttl: 300,
            refresh_interval: 60,
        }
    }
}

impl Data {
    pub fn path(&self, opt: PathOpt) -> ArcPath {
        match opt {
            PathOpt::LogDir => self.log_dir.clone(),
        }
    }

    pub fn set_path(&mut self, opt: PathOpt, path: ArcPath) {
        match opt {
            PathOpt::LogDir => self.log_dir = path,
        }
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn set_log_level(&mut self, level: LogLevel) {
        self.log_level = level;
    }

    pub fn usize(&self, opt: USizeOpt) -> usize {
        match opt {
            USizeOpt::MaxAge => self.max_age,
            USizeOpt::Timeout => self.timeout,
            USizeOpt::CacheTtl => self.cache_ttl,
            USizeOpt::RefreshInterval => self.refresh_interval,
        }
    }

    pub fn set_usize(&mut self, opt: USizeOpt, value: usize) {
        match opt {
            USizeOpt::MaxAge => self.max_age = value,
            USizeOpt::Timeout => self.timeout = value,
            USizeOpt::CacheTtl => self.cache_ttl = value,
            USizeOpt::RefreshInterval => self.refresh_interval = value,
        }
    }

    pub fn str(&self, opt: StrOpt) -> ArcStr {
        match opt {
            StrOpt::ApiBase => self.api_base.clone(),
        }
    }

    pub fn set_str(&mut self, opt: StrOpt, value: ArcStr) {
        match opt {
            StrOpt::ApiBase => self.api_base = value,
        }
    }

    pub fn token(&self) -> Option<ArcStr> {
        self.token.clone()
    }

    pub fn set_token(&mut self, token: Option<ArcStr>) {
        self.token = token;
    }

    /// A numeric option interpreted as a number of seconds.
    pub fn seconds(&self, opt: USizeOpt) -> Duration {
        Duration::from_secs(self.usize(opt) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_default_values() {
        let data = Data::default();
        assert_eq!(data.log_level(), LogLevel::Warning);
        assert_eq!(&*data.str(StrOpt::ApiBase), "http://localhost:8000");
        assert_eq!(data.token(), None);
        assert_eq!(data.usize(USizeOpt::Timeout), 10);
        assert_eq!(data.seconds(USizeOpt::CacheTtl), Duration::from_secs(300));
        assert_eq!(
            data.seconds(USizeOpt::RefreshInterval),
            Duration::from_secs(60)
        );
        assert_eq!(
            data.path(PathOpt::LogDir).to_str().unwrap(),
            "/tmp/notify-hub/logs"
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let data: Data = toml::from_str(
            r#"
            api_base = "https://crm.example.com"
            token = "abc"
            cache_ttl = 30
            "#,
        )
        .unwrap();

        assert_eq!(&*data.str(StrOpt::ApiBase), "https://crm.example.com");
        assert_eq!(data.token().as_deref(), Some("abc"));
        assert_eq!(data.usize(USizeOpt::CacheTtl), 30);
        assert_eq!(data.usize(USizeOpt::RefreshInterval), 60);
        assert_eq!(data.log_level(), LogLevel::Warning);
    }

    #[test]
    fn test_data_serialization() {
        let mut data = Data::default();
        data.set_log_level(LogLevel::Error);
        data.set_path(PathOpt::LogDir, ArcPath::from(Path::new("/custom/log")));
        data.set_usize(USizeOpt::RefreshInterval, 15);
        data.set_token(Some(ArcStr::from("secret")));

        let toml = toml::to_string_pretty(&data).unwrap();
        let deserialized: Data = toml::from_str(&toml).unwrap();
        assert_eq!(data, deserialized);
    }
}
