//! In-memory session store using DashMap.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;

use crate::elevation::ElevationResolver;
use crate::pipeline::{spawn_pipeline, PipelineConfig, PipelineHandle};

struct Session {
    handle: PipelineHandle,
    last_seen: Instant,
}

/// Application state - one derivation pipeline per open form session.
pub struct AppState {
    sessions: DashMap<Uuid, Session>,
    resolver: Arc<ElevationResolver>,
    pipeline_config: PipelineConfig,
}

impl AppState {
    pub fn new(resolver: Arc<ElevationResolver>, pipeline_config: PipelineConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            resolver,
            pipeline_config,
        }
    }

    /// Open a session and start its pipeline.
    pub fn create_session(&self) -> Uuid {
        let id = Uuid::new_v4();
        let handle = spawn_pipeline(self.pipeline_config.clone(), Arc::clone(&self.resolver));
        self.sessions.insert(
            id,
            Session {
                handle,
                last_seen: Instant::now(),
            },
        );
        id
    }

    /// Look up a session and mark it as in use.
    pub fn get_session(&self, id: &Uuid) -> Option<PipelineHandle> {
        self.sessions.get_mut(id).map(|mut entry| {
            entry.last_seen = Instant::now();
            entry.handle.clone()
        })
    }

    /// Close a session. Its pipeline stops once in-flight requests drop
    /// their handles.
    pub fn remove_session(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Close every session untouched for longer than `max_idle`. Returns how
    /// many were closed.
    pub fn expire_idle_sessions(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.last_seen.elapsed() <= max_idle);
        before.saturating_sub(self.sessions.len())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevation::{ElevationError, ElevationFallback, ElevationLookup};
    use futures::future::BoxFuture;

    struct NoTerrain;

    impl ElevationLookup for NoTerrain {
        fn lookup(&self, _lat: f64, _lng: f64) -> BoxFuture<'_, Result<f64, ElevationError>> {
            Box::pin(async { Err(ElevationError::MissingSample) })
        }
    }

    fn test_state() -> AppState {
        let resolver = ElevationResolver::new(Arc::new(NoTerrain), ElevationFallback::Fixed(25.0));
        AppState::new(Arc::new(resolver), PipelineConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_expire_and_touched_ones_survive() {
        let state = test_state();
        let idle = state.create_session();
        let active = state.create_session();

        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(state.get_session(&active).is_some());
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(state.expire_idle_sessions(Duration::from_secs(30)), 1);
        assert!(state.get_session(&idle).is_none());
        assert!(state.get_session(&active).is_some());
        assert_eq!(state.session_count(), 1);
    }
}
