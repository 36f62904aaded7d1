use std::{convert::Infallible, fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::ArcStr;

/// A notification as served by the backend.
///
/// Only `id`, `type` and `read` are known to the core; every other field is
/// kept in `extra` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationItem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: ArcStr,
    #[serde(rename = "type")]
    pub kind: ArcStr,
    pub read: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ArcStr, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => ArcStr::from(text),
        Id::Number(number) => ArcStr::from(number.to_string()),
    })
}

impl NotificationItem {
    pub fn new(id: impl Into<ArcStr>, kind: impl Into<ArcStr>, read: bool) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            read,
            extra: Map::new(),
        }
    }

    /// Sets a backend field such as `title` or `created_at`.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.text("title")
    }

    pub fn message(&self) -> Option<&str> {
        self.text("message")
    }

    /// Label of the follow-up action offered with the notification.
    pub fn action(&self) -> Option<&str> {
        self.text("action").filter(|action| !action.is_empty())
    }

    /// Creation time. RFC 3339 timestamps and offset-less ISO 8601 ones (read
    /// as UTC) are understood.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.text("created_at")?;
        if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
            return Some(time.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
            .ok()
            .map(|time| time.and_utc())
    }
}

/// Whose dashboard the notifications are shown on. Picks the style table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    Employee,
    Manager,
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            _ => anyhow::bail!("Unknown role: {}", s),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Employee => write!(f, "employee"),
            Self::Manager => write!(f, "manager"),
        }
    }
}

/// Icon name and accent colour of a notification type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub icon: &'static str,
    pub color: &'static str,
}

impl Style {
    pub const FALLBACK: Style = Style {
        icon: "bell",
        color: "#3b82f6",
    };
}

impl Role {
    pub fn style(self, kind: &str) -> Style {
        let (icon, color) = match (self, kind) {
            (_, "reminder") => ("bell", "#f59e0b"),
            (_, "alert") => ("exclamation-triangle", "#ef4444"),
            (Self::Employee, "info") => ("info-circle", "#3b82f6"),
            (Self::Manager, "info") => ("info-circle", "#6366f1"),
            (Self::Manager, "report") => ("file-alt", "#10b981"),
            _ => return Style::FALLBACK,
        };
        Style { icon, color }
    }
}

/// Which notifications are displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    All,
    /// Only notifications whose `type` equals the tag
    Type(ArcStr),
}

impl Filter {
    pub fn matches(&self, item: &NotificationItem) -> bool {
        match self {
            Self::All => true,
            Self::Type(kind) => *kind == item.kind,
        }
    }
}

impl FromStr for Filter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "all" => Self::All,
            kind => Self::Type(ArcStr::from(kind)),
        })
    }
}

impl Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Type(kind) => write!(f, "{}", kind),
        }
    }
}

/// One displayed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: ArcStr,
    pub kind: ArcStr,
    pub style: Style,
    pub title: String,
    pub message: String,
    /// Relative age such as `5m ago`, empty when unknown
    pub age: String,
    pub read: bool,
    pub action: Option<String>,
}

impl Display for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = if self.read { ' ' } else { '*' };
        write!(f, "{} [{}] {}", marker, self.kind, self.title)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if !self.age.is_empty() {
            write!(f, " ({})", self.age)?;
        }
        if let Some(action) = &self.action {
            write!(f, " -> {}", action)?;
        }
        Ok(())
    }
}

/// Rows to display plus the unread badge count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub rows: Vec<Row>,
    /// Unread items across every type, regardless of the filter
    pub unread: usize,
}
