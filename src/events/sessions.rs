//! Grouping events into visitor sessions

use crate::events::EventRecord;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// One visitor session as shown to the admin
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    /// Oldest first
    pub events: Vec<EventRecord>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub event_count: usize,
    pub prefix: Option<String>,
}

/// Admin listing of sessions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsReport {
    pub sessions: Vec<SessionView>,
    pub total_sessions: usize,
    pub total_events: usize,
    /// Prefix the events were read from, or `all`
    pub prefix: String,
}

impl SessionsReport {
    /// Group `events` and count them
    ///
    /// `total_events` counts every event passed in, including those dropped
    /// for lacking a session ID.
    pub fn build(events: Vec<EventRecord>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let total_events = events.len();
        let default_prefix = (prefix != "all").then(|| prefix.clone());
        let sessions = group_sessions(events, default_prefix.as_deref());
        Self {
            total_sessions: sessions.len(),
            sessions,
            total_events,
            prefix,
        }
    }
}

/// Group events by session
///
/// Events with an empty session ID are dropped. Each session's events are
/// ordered oldest first (ties keep their input order). Sessions are ordered
/// by last activity, newest first, then by session ID, so the same input
/// always yields the same output. A session's prefix is its oldest event's
/// prefix, falling back to `default_prefix`.
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use folio::events::{group_sessions, EventRecord};
///
/// let at = |m| Utc.with_ymd_and_hms(2024, 5, 1, 10, m, 0).unwrap();
/// let events = vec![
///     EventRecord::page_view("a", None, None).at(at(1)),
///     EventRecord::page_view("b", None, None).at(at(2)),
///     EventRecord::page_view("a", None, None).at(at(3)),
/// ];
/// let sessions = group_sessions(events, None);
/// assert_eq!(sessions[0].session_id, "a");
/// assert_eq!(sessions[0].event_count, 2);
/// assert_eq!(sessions[1].session_id, "b");
/// ```
pub fn group_sessions(events: Vec<EventRecord>, default_prefix: Option<&str>) -> Vec<SessionView> {
    let mut groups: BTreeMap<String, Vec<EventRecord>> = BTreeMap::new();
    for event in events {
        if event.session_id.is_empty() {
            continue;
        }
        groups.entry(event.session_id.clone()).or_default().push(event);
    }

    let mut sessions: Vec<SessionView> = groups
        .into_iter()
        .filter_map(|(session_id, mut events)| {
            events.sort_by_key(|e| e.timestamp);
            let first_seen = events.first()?.timestamp;
            let last_seen = events.last()?.timestamp;
            let prefix = events
                .first()
                .and_then(|e| e.prefix.clone())
                .or_else(|| default_prefix.map(str::to_string));
            Some(SessionView {
                session_id,
                event_count: events.len(),
                events,
                first_seen,
                last_seen,
                prefix,
            })
        })
        .collect();

    sessions.sort_by(|a, b| {
        b.last_seen
            .cmp(&a.last_seen)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    sessions
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(sid: &str, minute: u32) -> EventRecord {
        EventRecord::page_view(sid, Some(format!("/{}", minute)), None)
            .at(Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap())
    }

    #[test]
    fn test_events_within_session_are_oldest_first() {
        let sessions = group_sessions(vec![at("a", 5), at("a", 1), at("a", 3)], None);
        let paths: Vec<_> = sessions[0]
            .events
            .iter()
            .filter_map(|e| e.path.as_deref())
            .collect();
        assert_eq!(paths, vec!["/1", "/3", "/5"]);
        assert_eq!(sessions[0].first_seen.format("%M").to_string(), "01");
        assert_eq!(sessions[0].last_seen.format("%M").to_string(), "05");
    }

    #[test]
    fn test_sessions_ordered_by_last_activity() {
        let sessions = group_sessions(
            vec![at("old", 1), at("new", 2), at("mid", 3), at("old", 4)],
            None,
        );
        let ids: Vec<_> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["old", "mid", "new"]);
    }

    #[test]
    fn test_ties_break_on_session_id() {
        let sessions = group_sessions(vec![at("b", 1), at("a", 1)], None);
        let ids: Vec<_> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_grouping_is_stable() {
        let events = vec![at("x", 2), at("y", 2), at("x", 1), at("z", 9)];
        assert_eq!(
            group_sessions(events.clone(), None),
            group_sessions(events, None)
        );
    }

    #[test]
    fn test_empty_session_ids_are_dropped() {
        let sessions = group_sessions(vec![at("", 1), at("a", 2)], None);
        assert_eq!(sessions.len(), 1);
    }

    #[test]
    fn test_prefix_falls_back_to_default() {
        let mut tagged = at("a", 1);
        tagged.prefix = Some("blog".to_string());
        let sessions = group_sessions(vec![tagged, at("b", 2)], Some("site"));
        let by_id = |id: &str| sessions.iter().find(|s| s.session_id == id).unwrap();
        assert_eq!(by_id("a").prefix.as_deref(), Some("blog"));
        assert_eq!(by_id("b").prefix.as_deref(), Some("site"));
    }

    #[test]
    fn test_report_counts() {
        let report = SessionsReport::build(vec![at("a", 1), at("", 2), at("b", 3)], "all");
        assert_eq!(report.total_sessions, 2);
        assert_eq!(report.total_events, 3);
        assert_eq!(report.prefix, "all");

        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("totalSessions").is_some());
        assert!(value["sessions"][0].get("lastSeen").is_some());
    }
}
