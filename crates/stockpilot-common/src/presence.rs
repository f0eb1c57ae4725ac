//! Presence payloads and the online-users projection.
//!
//! Each client session tracks one payload under its presence key (the user
//! id). A user with several tabs or devices shows up several times in a
//! snapshot, possibly under different keys; [`online_users`] collapses those
//! entries to one per user id, keeping the one with the latest `online_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// What one session broadcasts about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub online_at: DateTime<Utc>,
    pub current_page: Option<String>,
}

/// Channel membership snapshot: presence key → tracked payloads.
pub type PresenceState = BTreeMap<String, Vec<PresencePayload>>;

/// De-duplicate a snapshot into one entry per user, most recent first.
///
/// Clock skew between clients is not corrected: whichever payload carries
/// the greatest `online_at` wins. On an exact tie the first payload seen (in
/// key order, then track order) is kept.
pub fn online_users(state: &PresenceState) -> Vec<PresencePayload> {
    let mut latest: HashMap<Uuid, &PresencePayload> = HashMap::new();
    let mut order: Vec<Uuid> = Vec::new();

    for payload in state.values().flatten() {
        match latest.get(&payload.id) {
            Some(existing) if existing.online_at >= payload.online_at => {}
            Some(_) => {
                latest.insert(payload.id, payload);
            }
            None => {
                order.push(payload.id);
                latest.insert(payload.id, payload);
            }
        }
    }

    let mut users: Vec<PresencePayload> = order
        .into_iter()
        .filter_map(|id| latest.remove(&id).cloned())
        .collect();
    // Stable sort keeps first-seen order among equal timestamps.
    users.sort_by(|a, b| b.online_at.cmp(&a.online_at));
    users
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_760_000_000 + secs, 0).unwrap()
    }

    fn payload(id: Uuid, name: &str, secs: i64, page: &str) -> PresencePayload {
        PresencePayload {
            id,
            full_name: Some(name.into()),
            avatar_url: None,
            online_at: at(secs),
            current_page: Some(page.into()),
        }
    }

    #[test]
    fn keeps_latest_entry_per_user() {
        let alice = Uuid::new_v4();
        let mut state = PresenceState::new();
        state.insert(
            alice.to_string(),
            vec![
                payload(alice, "Alice", 10, "/dashboard"),
                payload(alice, "Alice", 30, "/tools/metadata"),
            ],
        );
        // Same user tracked under a second key (stale tab).
        state.insert("stale-key".into(), vec![payload(alice, "Alice", 20, "/pricing")]);

        let users = online_users(&state);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].current_page.as_deref(), Some("/tools/metadata"));
        assert_eq!(users[0].online_at, at(30));
    }

    #[test]
    fn orders_most_recent_first() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let mut state = PresenceState::new();
        state.insert(a.to_string(), vec![payload(a, "A", 5, "/")]);
        state.insert(b.to_string(), vec![payload(b, "B", 50, "/")]);
        state.insert(c.to_string(), vec![payload(c, "C", 25, "/")]);

        let ids: Vec<Uuid> = online_users(&state).into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b, c, a]);
    }

    #[test]
    fn tie_keeps_first_seen() {
        let a = Uuid::new_v4();
        let mut state = PresenceState::new();
        state.insert(
            "a-key".into(),
            vec![payload(a, "First", 7, "/one"), payload(a, "Second", 7, "/two")],
        );

        let users = online_users(&state);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].full_name.as_deref(), Some("First"));
    }

    #[test]
    fn empty_snapshot_has_no_users() {
        assert!(online_users(&PresenceState::new()).is_empty());
    }
}
