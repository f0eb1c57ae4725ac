//! Presence sessions: which connection tracks what.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use stockpilot_common::presence::{PresencePayload, PresenceState, online_users};
use tokio::sync::RwLock;
use uuid::Uuid;

struct Session {
    user_id: Uuid,
    /// `None` until the client sends `Track`.
    tracked: Option<Tracked>,
    last_heartbeat: DateTime<Utc>,
}

struct Tracked {
    payload: PresencePayload,
    /// Order of tracking, so snapshots list payloads deterministically.
    seq: u64,
}

/// Profile fields a client tracks about itself.
#[derive(Debug, Clone, Default)]
pub struct TrackInfo {
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub current_page: Option<String>,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<String, Session>,
    next_seq: u64,
}

/// All identified presence sessions of this process.
#[derive(Default)]
pub struct PresenceRegistry {
    inner: RwLock<Inner>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an authenticated session. Nothing is tracked yet.
    ///
    /// Returns whether this replaced a session that was tracking a payload.
    pub async fn identify(&self, session_id: &str, user_id: Uuid) -> bool {
        self.inner
            .write()
            .await
            .sessions
            .insert(
                session_id.to_string(),
                Session {
                    user_id,
                    tracked: None,
                    last_heartbeat: Utc::now(),
                },
            )
            .is_some_and(|previous| previous.tracked.is_some())
    }

    /// Re-register an identified session that was swept while its connection
    /// stayed open. Returns `true` when the session had to be re-created.
    pub async fn resume(&self, session_id: &str, user_id: Uuid) -> bool {
        let mut inner = self.inner.write().await;
        if inner.sessions.contains_key(session_id) {
            return false;
        }
        inner.sessions.insert(
            session_id.to_string(),
            Session {
                user_id,
                tracked: None,
                last_heartbeat: Utc::now(),
            },
        );
        true
    }

    /// Track (or re-track) a session's payload, stamped `online_at = now`.
    /// Returns `false` for unknown sessions.
    pub async fn track(&self, session_id: &str, info: TrackInfo, now: DateTime<Utc>) -> bool {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        let Some(session) = inner.sessions.get_mut(session_id) else {
            return false;
        };

        session.tracked = Some(Tracked {
            payload: PresencePayload {
                id: session.user_id,
                full_name: info.full_name,
                avatar_url: info.avatar_url,
                online_at: now,
                current_page: info.current_page,
            },
            seq,
        });
        inner.next_seq += 1;
        true
    }

    /// Stop tracking without disconnecting. Returns whether anything changed.
    pub async fn untrack(&self, session_id: &str) -> bool {
        self.inner
            .write()
            .await
            .sessions
            .get_mut(session_id)
            .and_then(|s| s.tracked.take())
            .is_some()
    }

    pub async fn heartbeat(&self, session_id: &str) {
        if let Some(session) = self.inner.write().await.sessions.get_mut(session_id) {
            session.last_heartbeat = Utc::now();
        }
    }

    /// Drop a session. Returns whether it was tracking a payload.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.inner
            .write()
            .await
            .sessions
            .remove(session_id)
            .is_some_and(|s| s.tracked.is_some())
    }

    /// Current membership: user id → payloads of that user's tracked sessions.
    pub async fn snapshot(&self) -> PresenceState {
        let inner = self.inner.read().await;
        let mut tracked: Vec<&Tracked> = inner
            .sessions
            .values()
            .filter_map(|s| s.tracked.as_ref())
            .collect();
        tracked.sort_by_key(|t| t.seq);

        let mut state = PresenceState::new();
        for t in tracked {
            state
                .entry(t.payload.id.to_string())
                .or_default()
                .push(t.payload.clone());
        }
        state
    }

    /// One entry per online user, most recently active first.
    pub async fn online(&self) -> Vec<PresencePayload> {
        online_users(&self.snapshot().await)
    }

    pub async fn active_count(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Sessions whose last heartbeat is older than `cutoff`.
    pub async fn stale_sessions(&self, cutoff: DateTime<Utc>) -> Vec<String> {
        self.inner
            .read()
            .await
            .sessions
            .iter()
            .filter(|(_, s)| s.last_heartbeat < cutoff)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn info(page: &str) -> TrackInfo {
        TrackInfo {
            full_name: Some("Ada".into()),
            avatar_url: None,
            current_page: Some(page.into()),
        }
    }

    #[tokio::test]
    async fn identified_sessions_appear_once_tracked() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        registry.identify("s1", user).await;
        assert!(registry.snapshot().await.is_empty());

        let now = Utc::now();
        assert!(registry.track("s1", info("/dashboard"), now).await);

        let state = registry.snapshot().await;
        let entries = &state[&user.to_string()];
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, user);
        assert_eq!(entries[0].online_at, now);
        assert_eq!(entries[0].current_page.as_deref(), Some("/dashboard"));
    }

    #[tokio::test]
    async fn unknown_sessions_cannot_track() {
        let registry = PresenceRegistry::new();
        assert!(!registry.track("ghost", info("/"), Utc::now()).await);
    }

    #[tokio::test]
    async fn multiple_tabs_collapse_to_latest() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        let t0 = Utc::now();
        registry.identify("tab-1", user).await;
        registry.identify("tab-2", user).await;
        registry.track("tab-1", info("/pricing"), t0).await;
        registry
            .track("tab-2", info("/tools"), t0 + Duration::seconds(5))
            .await;

        assert_eq!(registry.snapshot().await[&user.to_string()].len(), 2);
        let online = registry.online().await;
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].current_page.as_deref(), Some("/tools"));
    }

    #[tokio::test]
    async fn untrack_and_remove_report_changes() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        registry.identify("s1", user).await;
        registry.identify("s2", user).await;
        registry.track("s1", info("/"), Utc::now()).await;

        assert!(registry.untrack("s1").await);
        assert!(!registry.untrack("s1").await);
        assert!(!registry.remove("s2").await);
        assert!(registry.snapshot().await.is_empty());
        assert_eq!(registry.active_count().await, 1);
    }

    #[tokio::test]
    async fn re_identify_reports_dropped_payload() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        assert!(!registry.identify("s1", user).await);
        registry.track("s1", info("/"), Utc::now()).await;

        assert!(registry.identify("s1", user).await);
        assert!(registry.snapshot().await.is_empty());
        assert!(!registry.identify("s1", user).await);
    }

    #[tokio::test]
    async fn swept_session_can_resume() {
        let registry = PresenceRegistry::new();
        let user = Uuid::new_v4();
        registry.identify("s1", user).await;
        registry.track("s1", info("/"), Utc::now()).await;
        assert!(registry.remove("s1").await);

        assert!(!registry.track("s1", info("/tools"), Utc::now()).await);
        assert!(registry.resume("s1", user).await);
        assert!(!registry.resume("s1", user).await);
        assert!(registry.track("s1", info("/tools"), Utc::now()).await);

        let online = registry.online().await;
        assert_eq!(online.len(), 1);
        assert_eq!(online[0].current_page.as_deref(), Some("/tools"));
    }

    #[tokio::test]
    async fn stale_sessions_are_reported() {
        let registry = PresenceRegistry::new();
        registry.identify("s1", Uuid::new_v4()).await;
        let future = Utc::now() + Duration::seconds(60);
        assert_eq!(registry.stale_sessions(future).await, vec!["s1".to_string()]);
        assert!(registry.stale_sessions(Utc::now() - Duration::seconds(60)).await.is_empty());
    }
}
