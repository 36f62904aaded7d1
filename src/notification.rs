//! Projection of notifications into displayable rows.
//!
//! Everything here is pure and recomputed on each render: the badge count is
//! never maintained incrementally.

use chrono::{DateTime, Utc};

use crate::channel::Records;

mod data;
#[cfg(test)]
mod tests;

pub use data::{Filter, NotificationItem, Projection, Role, Row, Style};

/// Projects `items` through `filter` for an employee dashboard, with ages
/// relative to now.
pub fn project(items: &[NotificationItem], filter: &Filter) -> Projection {
    project_with(items, filter, Role::default(), Utc::now())
}

/// Projects `items` through `filter`.
///
/// Rows keep the input order and contain exactly the items the filter
/// matches. The unread count covers all of `items`, so the badge does not
/// change with the selected tab.
pub fn project_with(
    items: &[NotificationItem],
    filter: &Filter,
    role: Role,
    now: DateTime<Utc>,
) -> Projection {
    let rows = items
        .iter()
        .filter(|item| filter.matches(item))
        .map(|item| row(item, role, now))
        .collect();
    let unread = items.iter().filter(|item| !item.read).count();
    Projection { rows, unread }
}

fn row(item: &NotificationItem, role: Role, now: DateTime<Utc>) -> Row {
    Row {
        id: item.id.clone(),
        kind: item.kind.clone(),
        style: role.style(&item.kind),
        title: item.title().unwrap_or_default().to_string(),
        message: item.message().unwrap_or_default().to_string(),
        age: format_age(item.created_at(), now),
        read: item.read,
        action: item.action().map(str::to_string),
    }
}

/// Renders how long ago `time` was: minutes below an hour, hours below a day,
/// days otherwise. Unknown times render empty; future ones as `0m ago`.
pub fn format_age(time: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(time) = time else {
        return String::new();
    };
    let minutes = (now - time).num_minutes().max(0);
    match minutes {
        0..60 => format!("{}m ago", minutes),
        60..1440 => format!("{}h ago", minutes / 60),
        _ => format!("{}d ago", minutes / 1440),
    }
}

/// The notification panel: last rendered items, selected filter and the
/// rows and badge derived from them.
#[derive(Debug, Clone, Default)]
pub struct NotificationView {
    role: Role,
    filter: Filter,
    items: Records<NotificationItem>,
    projection: Projection,
}

impl NotificationView {
    pub fn new(role: Role) -> Self {
        Self {
            role,
            filter: Filter::All,
            items: Records::from(Vec::new()),
            projection: Projection::default(),
        }
    }

    /// Replaces the items and recomputes rows and unread count.
    pub fn render(&mut self, items: Records<NotificationItem>) -> &[Row] {
        self.items = items;
        self.projection = project_with(&self.items, &self.filter, self.role, Utc::now());
        &self.projection.rows
    }

    /// Selects another filter and re-renders the current items.
    pub fn set_filter(&mut self, filter: Filter) -> &[Row] {
        self.filter = filter;
        self.render(self.items.clone())
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn rows(&self) -> &[Row] {
        &self.projection.rows
    }

    /// The badge count of the last render.
    pub fn unread(&self) -> usize {
        self.projection.unread
    }
}
