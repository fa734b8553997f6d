//! In-memory session store. Sessions never outlive the process.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::wizard::session::WizardSession;

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, WizardSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> WizardSession {
        let session = WizardSession::new();
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        info!("Created wizard session {}", session.id);
        session
    }

    /// Returns a snapshot; later writes to the store do not affect it.
    pub async fn get(&self, id: Uuid) -> Result<WizardSession, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Applies `f` to a copy of the session and commits it only if `f` succeeds,
    /// so a failed step never leaves a half-updated session behind.
    pub async fn update<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut WizardSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.write().await;
        let current = sessions.get(&id).ok_or_else(|| not_found(id))?;

        let mut draft = current.clone();
        let value = f(&mut draft)?;
        sessions.insert(id, draft);
        Ok(value)
    }

    /// Like `update`, but fails with a conflict if the session changed since
    /// `snapshot` was taken (e.g. new documents uploaded during a model call).
    pub async fn update_from<T>(
        &self,
        snapshot: &WizardSession,
        f: impl FnOnce(&mut WizardSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let expected = snapshot.revision;
        self.update(snapshot.id, |session| {
            if session.revision != expected {
                return Err(AppError::Conflict(format!(
                    "Session {} changed while the request was running; retry the step",
                    session.id
                )));
            }
            f(session)
        })
        .await
    }

    pub async fn remove(&self, id: Uuid) -> Result<(), AppError> {
        self.sessions
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    /// Drops sessions idle for longer than `max_idle`. Returns how many were removed.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let cutoff = Utc::now() - max_idle;
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.updated_at >= cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            info!("Pruned {removed} idle wizard sessions");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Session {id} not found"))
}
