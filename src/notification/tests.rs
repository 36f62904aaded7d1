use chrono::{Duration, TimeZone};

use super::*;
use crate::ArcStr;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn items() -> Vec<NotificationItem> {
    vec![
        NotificationItem::new("1", "alert", false)
            .with("title", "Client overdue")
            .with("message", "ACME has not been contacted in 30 days")
            .with("created_at", "2025-03-01T11:55:00Z")
            .with("action", "Call now"),
        NotificationItem::new("2", "info", true)
            .with("title", "Report ready")
            .with("created_at", "2025-03-01T09:00:00Z"),
        NotificationItem::new("3", "reminder", false).with("created_at", "2025-02-26T12:00:00Z"),
    ]
}

#[test]
fn test_unread_count_ignores_filter() {
    let items = vec![
        NotificationItem::new("1", "alert", false),
        NotificationItem::new("2", "info", true),
    ];
    let projection = project(&items, &Filter::Type(ArcStr::from("info")));

    assert_eq!(projection.rows.len(), 1);
    assert_eq!(&*projection.rows[0].id, "2");
    assert_eq!(projection.unread, 1);
}

#[test]
fn test_all_filter_keeps_input_order() {
    let projection = project_with(&items(), &Filter::All, Role::Employee, now());
    let ids: Vec<&str> = projection.rows.iter().map(|row| &*row.id).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);
    assert_eq!(projection.unread, 2);
}

#[test]
fn test_unknown_type_filter_yields_no_rows() {
    let projection = project_with(&items(), &Filter::Type(ArcStr::from("report")), Role::Manager, now());
    assert!(projection.rows.is_empty());
    assert_eq!(projection.unread, 2);
}

#[test]
fn test_row_contents() {
    let projection = project_with(&items(), &Filter::All, Role::Manager, now());
    let alert = &projection.rows[0];
    assert_eq!(alert.title, "Client overdue");
    assert_eq!(alert.style, Role::Manager.style("alert"));
    assert_eq!(alert.age, "5m ago");
    assert_eq!(alert.action.as_deref(), Some("Call now"));
    assert!(!alert.read);

    let info = &projection.rows[1];
    assert_eq!(info.style.color, "#6366f1");
    assert_eq!(info.message, "");
    assert_eq!(info.age, "3h ago");
    assert_eq!(info.action, None);

    assert_eq!(projection.rows[2].age, "3d ago");
    assert_eq!(
        alert.to_string(),
        "* [alert] Client overdue: ACME has not been contacted in 30 days (5m ago) -> Call now"
    );
}

#[test]
fn test_format_age() {
    let now = now();
    assert_eq!(format_age(None, now), "");
    assert_eq!(format_age(Some(now), now), "0m ago");
    assert_eq!(format_age(Some(now - Duration::seconds(59)), now), "0m ago");
    assert_eq!(format_age(Some(now - Duration::minutes(59)), now), "59m ago");
    assert_eq!(format_age(Some(now - Duration::minutes(60)), now), "1h ago");
    assert_eq!(format_age(Some(now - Duration::minutes(1439)), now), "23h ago");
    assert_eq!(format_age(Some(now - Duration::days(1)), now), "1d ago");
    assert_eq!(format_age(Some(now + Duration::minutes(5)), now), "0m ago");
}

#[test]
fn test_view_recomputes_on_render_and_filter() {
    let mut view = NotificationView::new(Role::Employee);
    assert_eq!(view.unread(), 0);
    assert!(view.rows().is_empty());

    assert_eq!(view.render(Records::from(items())).len(), 3);
    assert_eq!(view.unread(), 2);

    let rows = view.set_filter(Filter::Type(ArcStr::from("reminder")));
    assert_eq!(rows.len(), 1);
    assert_eq!(&*rows[0].id, "3");
    assert_eq!(view.unread(), 2);
    assert_eq!(view.filter(), &Filter::Type(ArcStr::from("reminder")));

    // New data keeps the selected filter
    view.render(Records::from(vec![
        NotificationItem::new("9", "reminder", true),
        NotificationItem::new("10", "alert", true),
    ]));
    assert_eq!(view.rows().len(), 1);
    assert_eq!(view.unread(), 0);

    view.set_filter(Filter::All);
    assert_eq!(view.rows().len(), 2);
}
