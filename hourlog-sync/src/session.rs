//! Session reconciliation: decides, on every auth-state transition,
//! whether the remote store or the local cache is authoritative, and
//! owns the in-memory view (current user, logs, stats) the UI renders.
//!
//! State only moves through the reducer-style actions below
//! (`session_established`, `session_cleared`, `data_refreshed`) and
//! the optimistic mutation helpers; nothing else writes the snapshot.

use std::sync::Arc;

use time::{Date, OffsetDateTime};
use tokio::sync::RwLock;
use tracing::instrument;

use hourlog_core::domain::{DailyLog, DailyLogPatch, DocumentId, User, UserId, UserPatch};
use hourlog_core::stats::{compute_hour_stats, HourStats};

use crate::cache::LocalCache;
use crate::config::Settings;
use crate::migration::LegacyMigrator;
use crate::ports::{resolve_owner, AuthSession};
use crate::repositories::{
    DailyLogRepository, DailyLogRepositoryImpl, RepositoryError, UserRepository,
    UserRepositoryImpl,
};
use crate::store::DocumentStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(UserId),
}

/// The in-memory view served to the UI.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub user: Option<User>,
    pub logs: Vec<DailyLog>,
    pub stats: HourStats,
}

impl SessionSnapshot {
    fn empty() -> Self {
        Self {
            state: SessionState::Unauthenticated,
            user: None,
            logs: Vec::new(),
            stats: HourStats::default(),
        }
    }
}

/// How a session establishment resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Remote store is authoritative.
    Ready,
    /// Remote unreachable; serving the local cache.
    Degraded,
    /// No remote profile and no cached one; caller routes to re-signup.
    NoProfile,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no authenticated session")]
    NotAuthenticated,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Undo state for one optimistic mutation.
pub struct RollbackToken {
    user: Option<User>,
    logs: Vec<DailyLog>,
}

pub struct SessionController {
    cache: Arc<LocalCache>,
    auth: Arc<dyn AuthSession>,
    users: Arc<dyn UserRepository>,
    logs: Arc<dyn DailyLogRepository>,
    migrator: LegacyMigrator,
    rollback_on_failure: bool,
    snapshot: RwLock<SessionSnapshot>,
}

impl SessionController {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<LocalCache>,
        auth: Arc<dyn AuthSession>,
        settings: &Settings,
    ) -> Self {
        Self {
            users: Arc::new(UserRepositoryImpl::new(store.clone())),
            logs: Arc::new(DailyLogRepositoryImpl::new(store.clone())),
            migrator: LegacyMigrator::new(store, settings.store.migration_batch_cap()),
            rollback_on_failure: settings.store.rollback_on_failure,
            cache,
            auth,
            snapshot: RwLock::new(SessionSnapshot::empty()),
        }
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().await.clone()
    }

    /// A new authenticated identity arrived. Loads the remote profile,
    /// pushing the cached one up first if the remote copy is missing,
    /// and falls back to the cache when the store is unreachable.
    #[instrument(skip(self), fields(user = %auth_id))]
    pub async fn session_established(&self, auth_id: &UserId) -> SessionOutcome {
        let auth_id = resolve_owner(&*self.auth, auth_id);

        match self.users.get_user(&auth_id).await {
            Ok(Some(user)) => self.finish_load(user).await,
            Ok(None) => match self.cache.user(&auth_id) {
                Some(local) => self.push_cached_profile(&auth_id, local).await,
                None => {
                    self.write_snapshot(auth_id, None, Vec::new()).await;
                    SessionOutcome::NoProfile
                }
            },
            Err(e) => {
                tracing::error!("remote profile load failed for {auth_id}: {e}");
                self.fallback_to_cache(&auth_id).await
            }
        }
    }

    /// Explicit logout: drop in-memory state and the cache's
    /// current-user marker. Historical cached data stays for legacy
    /// fallback.
    pub async fn session_cleared(&self) {
        *self.snapshot.write().await = SessionSnapshot::empty();
        self.cache.clear_current_user();
    }

    /// Re-pulls logs from the remote store and recomputes stats.
    pub async fn data_refreshed(&self) -> Result<(), SessionError> {
        let user = self
            .snapshot
            .read()
            .await
            .user
            .clone()
            .ok_or(SessionError::NotAuthenticated)?;

        let logs = self.logs.get_logs(&user.id).await?;
        self.cache.put_logs(&user.id, &logs);
        self.write_snapshot(user.id.clone(), Some(user), logs).await;
        Ok(())
    }

    /// Adds a log: applied to the local view immediately, then
    /// persisted. The persisted version (with repository timestamps)
    /// replaces the optimistic one on success.
    pub async fn add_log(&self, log: DailyLog) -> Result<DailyLog, SessionError> {
        let mut log = log;
        log.user_id = resolve_owner(&*self.auth, &log.user_id);
        if log.id.is_empty() {
            log.id = crate::repositories::fresh_document_id();
        }
        let now = OffsetDateTime::now_utc();
        log.created_at = now;
        log.updated_at = now;

        // Invalid logs never reach the optimistic view.
        log.validate().map_err(RepositoryError::from)?;

        let token = self.begin_mutation().await?;
        {
            let mut snapshot = self.snapshot.write().await;
            snapshot.logs.push(log.clone());
            snapshot.logs.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
        }
        self.reindex().await;

        match self.logs.create_log(&log).await {
            Ok(persisted) => {
                self.replace_log(&log.id, persisted.clone()).await;
                Ok(persisted)
            }
            Err(e) => self.handle_persist_failure(token, e).await.map(|_| log),
        }
    }

    /// Edits a log optimistically, then merges the patch remotely.
    pub async fn update_log(
        &self,
        id: &DocumentId,
        patch: &DailyLogPatch,
    ) -> Result<DailyLog, SessionError> {
        let owner = self.current_owner().await?;
        let token = self.begin_mutation().await?;

        let optimistic = {
            let mut snapshot = self.snapshot.write().await;
            let log = snapshot
                .logs
                .iter_mut()
                .find(|l| l.id == *id)
                .ok_or_else(|| {
                    SessionError::Repository(RepositoryError::NotFound(format!("log {id}")))
                })?;
            patch.apply(log);
            log.updated_at = OffsetDateTime::now_utc();
            let updated = log.clone();
            snapshot.logs.sort_by(|a, b| b.entry_date.cmp(&a.entry_date));
            updated
        };
        self.reindex().await;

        match self.logs.update_log(&owner, id, patch).await {
            Ok(persisted) => {
                self.replace_log(id, persisted.clone()).await;
                Ok(persisted)
            }
            Err(e) => self.handle_persist_failure(token, e).await.map(|_| optimistic),
        }
    }

    /// Removes a log optimistically, then deletes it remotely.
    pub async fn delete_log(&self, id: &DocumentId) -> Result<(), SessionError> {
        let owner = self.current_owner().await?;
        let token = self.begin_mutation().await?;
        {
            let mut snapshot = self.snapshot.write().await;
            snapshot.logs.retain(|l| l.id != *id);
        }
        self.reindex().await;

        match self.logs.delete_log(&owner, id).await {
            Ok(()) => Ok(()),
            Err(e) => self.handle_persist_failure(token, e).await,
        }
    }

    /// Applies profile settings optimistically, then merges remotely.
    pub async fn update_user(&self, patch: &UserPatch) -> Result<User, SessionError> {
        let owner = self.current_owner().await?;
        let token = self.begin_mutation().await?;

        let optimistic = {
            let mut snapshot = self.snapshot.write().await;
            let user = snapshot
                .user
                .as_mut()
                .ok_or(SessionError::NotAuthenticated)?;
            patch.apply(user);
            user.clone()
        };
        self.reindex().await;

        match self.users.update_user(&owner, patch).await {
            Ok(persisted) => {
                self.snapshot.write().await.user = Some(persisted.clone());
                self.cache.put_user(&persisted);
                Ok(persisted)
            }
            Err(e) => self.handle_persist_failure(token, e).await.map(|_| optimistic),
        }
    }

    async fn push_cached_profile(&self, auth_id: &UserId, local: User) -> SessionOutcome {
        if let Err(e) = self.users.upsert_user(&local).await {
            tracing::error!("failed to push cached profile for {auth_id}: {e}");
            return self.fallback_to_cache(auth_id).await;
        }

        // Re-read to confirm persistence before treating remote as
        // authoritative.
        match self.users.get_user(auth_id).await {
            Ok(Some(user)) => self.finish_load(user).await,
            Ok(None) => {
                tracing::error!("pushed profile for {auth_id} did not read back");
                self.fallback_to_cache(auth_id).await
            }
            Err(e) => {
                tracing::error!("re-read after profile push failed for {auth_id}: {e}");
                self.fallback_to_cache(auth_id).await
            }
        }
    }

    async fn finish_load(&self, user: User) -> SessionOutcome {
        self.cache.set_current_user(&user);

        // Best-effort: a failed migration never blocks login.
        if let Err(e) = self.migrator.migrate_user(&user.id).await {
            tracing::error!("legacy layout migration failed for {}: {e}", user.id);
        }

        match self.logs.get_logs(&user.id).await {
            Ok(logs) => {
                self.cache.put_logs(&user.id, &logs);
                self.write_snapshot(user.id.clone(), Some(user), logs).await;
                SessionOutcome::Ready
            }
            Err(e) => {
                tracing::error!("log load failed for {}: {e}", user.id);
                let logs = self.cache.logs(&user.id).unwrap_or_default();
                self.write_snapshot(user.id.clone(), Some(user), logs).await;
                SessionOutcome::Degraded
            }
        }
    }

    async fn fallback_to_cache(&self, auth_id: &UserId) -> SessionOutcome {
        match self.cache.user(auth_id) {
            Some(user) => {
                let logs = self.cache.logs(auth_id).unwrap_or_default();
                self.write_snapshot(auth_id.clone(), Some(user), logs).await;
                SessionOutcome::Degraded
            }
            None => {
                self.write_snapshot(auth_id.clone(), None, Vec::new()).await;
                SessionOutcome::NoProfile
            }
        }
    }

    async fn write_snapshot(&self, id: UserId, user: Option<User>, logs: Vec<DailyLog>) {
        let required = user.as_ref().map(|u| u.total_required_hours).unwrap_or(0.0);
        let stats = compute_hour_stats(&logs, required, today());
        *self.snapshot.write().await = SessionSnapshot {
            state: SessionState::Authenticated(id),
            user,
            logs,
            stats,
        };
    }

    async fn current_owner(&self) -> Result<UserId, SessionError> {
        let snapshot = self.snapshot.read().await;
        match &snapshot.state {
            SessionState::Authenticated(id) => Ok(resolve_owner(&*self.auth, id)),
            SessionState::Unauthenticated => Err(SessionError::NotAuthenticated),
        }
    }

    /// Captures the pre-mutation view as the rollback token.
    async fn begin_mutation(&self) -> Result<RollbackToken, SessionError> {
        let snapshot = self.snapshot.read().await;
        if snapshot.state == SessionState::Unauthenticated {
            return Err(SessionError::NotAuthenticated);
        }
        Ok(RollbackToken {
            user: snapshot.user.clone(),
            logs: snapshot.logs.clone(),
        })
    }

    /// Recomputes stats from the current logs and re-caches them.
    async fn reindex(&self) {
        let mut snapshot = self.snapshot.write().await;
        let required = snapshot
            .user
            .as_ref()
            .map(|u| u.total_required_hours)
            .unwrap_or(0.0);
        snapshot.stats = compute_hour_stats(&snapshot.logs, required, today());
        if let Some(user) = &snapshot.user {
            self.cache.put_logs(&user.id, &snapshot.logs);
            self.cache.put_user(user);
        }
    }

    async fn replace_log(&self, id: &DocumentId, persisted: DailyLog) {
        let mut snapshot = self.snapshot.write().await;
        if let Some(log) = snapshot.logs.iter_mut().find(|l| l.id == *id) {
            *log = persisted;
        }
    }

    /// The remote half of apply-then-sync failed. Transient store
    /// outages keep the optimistic state by default (only a log line
    /// records the divergence); anything else, and any failure with
    /// rollback enabled, restores the pre-mutation view from the token
    /// and propagates the error.
    async fn handle_persist_failure(
        &self,
        token: RollbackToken,
        error: RepositoryError,
    ) -> Result<(), SessionError> {
        if self.rollback_on_failure || !error.is_transient() {
            {
                let mut snapshot = self.snapshot.write().await;
                snapshot.user = token.user;
                snapshot.logs = token.logs;
            }
            self.reindex().await;
            return Err(error.into());
        }

        tracing::error!("remote persist failed, keeping optimistic local state: {error}");
        Ok(())
    }
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
