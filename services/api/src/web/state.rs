//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the in-memory registry of
//! guided assessment sessions.

use crate::config::Config;
use chrono::{DateTime, Duration, Utc};
use preschool_core::assessment::AssessmentSession;
use preschool_core::ports::DatabaseService;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub assessments: AssessmentRegistry,
}

impl AppState {
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>) -> Self {
        let ttl = Duration::minutes(config.assessment_session_ttl_minutes);
        Self {
            db,
            config,
            assessments: AssessmentRegistry::new(ttl),
        }
    }
}

//=========================================================================================
// Assessment Sessions (never persisted)
//=========================================================================================

struct LiveAssessment {
    session: AssessmentSession,
    last_touched: DateTime<Utc>,
}

/// Guided assessments in progress, keyed by a generated id. Entries idle for
/// longer than the TTL are dropped on the next access.
pub struct AssessmentRegistry {
    ttl: Duration,
    sessions: Mutex<HashMap<Uuid, LiveAssessment>>,
}

impl AssessmentRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn purge_expired(&self, sessions: &mut HashMap<Uuid, LiveAssessment>, now: DateTime<Utc>) {
        let before = sessions.len();
        sessions.retain(|_, live| now - live.last_touched <= self.ttl);
        let dropped = before - sessions.len();
        if dropped > 0 {
            debug!(dropped, "expired assessment sessions removed");
        }
    }

    pub async fn insert(&self, session: AssessmentSession) -> Uuid {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        self.purge_expired(&mut sessions, now);
        let id = Uuid::new_v4();
        sessions.insert(
            id,
            LiveAssessment {
                session,
                last_touched: now,
            },
        );
        id
    }

    /// Runs `f` against a live session, refreshing its idle timer.
    /// Returns `None` when the id is unknown or has expired.
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut AssessmentSession) -> R,
    ) -> Option<R> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        self.purge_expired(&mut sessions, now);
        let live = sessions.get_mut(&id)?;
        live.last_touched = now;
        Some(f(&mut live.session))
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preschool_core::assessment::Instrument;

    #[tokio::test]
    async fn idle_sessions_expire() {
        let registry = AssessmentRegistry::new(Duration::zero());
        let id = registry
            .insert(AssessmentSession::new(Instrument::Mchat.question_set()))
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        assert!(registry.with_session(id, |_| ()).await.is_none());
    }

    #[tokio::test]
    async fn live_sessions_are_reachable_until_removed() {
        let registry = AssessmentRegistry::new(Duration::minutes(5));
        let id = registry
            .insert(AssessmentSession::new(Instrument::MotorSkills.question_set()))
            .await;
        assert_eq!(registry.with_session(id, |s| s.start()).await, Some(true));
        assert!(registry.remove(id).await);
        assert!(registry.with_session(id, |_| ()).await.is_none());
    }
}
