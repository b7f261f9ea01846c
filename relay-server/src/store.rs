//! Challenge store
//!
//! Authoritative in-memory record of outstanding challenges. The store is the
//! only shared mutable state in the relay; every status change goes through
//! `transition`, a compare-and-set that only moves a live pending record to a
//! terminal state. Expiry is lazy: readers see an over-TTL pending record as
//! expired whether or not the sweeper has caught up.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use relay_common::types::{ChallengeRecord, ChallengeStatus};
use relay_common::{RelayError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use verusid_login::ChallengeId;

/// Why a compare-and-set transition did not apply. Conflicts are data, not
/// failures; callers decide how each one maps to their outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionConflict {
    /// No record under this id
    NotFound,

    /// The record's TTL elapsed before the transition
    Expired,

    /// The record already reached a terminal state
    AlreadyResolved,
}

#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// Insert a new pending record. `DuplicateId` if the id is already
    /// present (unreachable with a working generator, checked anyway).
    async fn put(&self, record: ChallengeRecord) -> Result<()>;

    /// Fetch a record by id. An over-TTL pending record comes back with its
    /// status coerced to `Expired`; storage is not necessarily updated.
    async fn get(&self, id: &ChallengeId) -> Option<ChallengeRecord>;

    /// Compare-and-set from live `Pending` to a terminal status. Exactly one
    /// of two racing callers wins; the loser observes `AlreadyResolved`.
    async fn transition(
        &self,
        id: &ChallengeId,
        status: ChallengeStatus,
        signing_id: Option<String>,
    ) -> std::result::Result<ChallengeRecord, TransitionConflict>;

    /// Set the reported flag. Returns true only for the call that flipped it,
    /// so at most one caller ever treats itself as the reporter.
    async fn mark_reported(&self, id: &ChallengeId) -> bool;

    /// Drop records whose TTL plus grace period has passed. Returns the
    /// number removed.
    async fn sweep(&self, grace: Duration) -> usize;
}

/// HashMap-backed store guarded by a single RwLock. Callers never hold the
/// lock across an await point; every method copies out before returning.
#[derive(Clone, Default)]
pub struct MemoryChallengeStore {
    inner: Arc<RwLock<HashMap<ChallengeId, ChallengeRecord>>>,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    async fn put(&self, record: ChallengeRecord) -> Result<()> {
        let mut map = self.inner.write().await;
        if map.contains_key(&record.id) {
            return Err(RelayError::DuplicateId(record.id.to_string()));
        }
        map.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get(&self, id: &ChallengeId) -> Option<ChallengeRecord> {
        let map = self.inner.read().await;
        let mut record = map.get(id)?.clone();
        if record.status == ChallengeStatus::Pending && record.is_expired_at(Utc::now()) {
            record.status = ChallengeStatus::Expired;
        }
        Some(record)
    }

    async fn transition(
        &self,
        id: &ChallengeId,
        status: ChallengeStatus,
        signing_id: Option<String>,
    ) -> std::result::Result<ChallengeRecord, TransitionConflict> {
        let mut map = self.inner.write().await;
        let record = map.get_mut(id).ok_or(TransitionConflict::NotFound)?;

        match record.status {
            ChallengeStatus::Pending => {}
            ChallengeStatus::Expired => return Err(TransitionConflict::Expired),
            _ => return Err(TransitionConflict::AlreadyResolved),
        }

        if record.is_expired_at(Utc::now()) {
            // Persist the lazy expiry while we hold the write lock
            record.status = ChallengeStatus::Expired;
            return Err(TransitionConflict::Expired);
        }

        record.status = status;
        if status == ChallengeStatus::Verified {
            record.signing_id = signing_id;
        }
        Ok(record.clone())
    }

    async fn mark_reported(&self, id: &ChallengeId) -> bool {
        let mut map = self.inner.write().await;
        match map.get_mut(id) {
            Some(record) if !record.reported => {
                record.reported = true;
                true
            }
            _ => false,
        }
    }

    async fn sweep(&self, grace: Duration) -> usize {
        let cutoff = Utc::now() - grace;
        let mut map = self.inner.write().await;
        let before = map.len();
        map.retain(|_, record| record.expires_at > cutoff);
        before - map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending_record(ttl_secs: i64) -> ChallengeRecord {
        let now = Utc::now();
        ChallengeRecord::pending(
            ChallengeId::generate(),
            now,
            now + Duration::seconds(ttl_secs),
        )
    }

    fn expired_record() -> ChallengeRecord {
        let created = Utc::now() - Duration::seconds(600);
        ChallengeRecord::pending(
            ChallengeId::generate(),
            created,
            created + Duration::seconds(300),
        )
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let store = MemoryChallengeStore::new();
        let record = pending_record(300);
        let id = record.id.clone();

        store.put(record).await.unwrap();
        let fetched = store.get(&id).await.unwrap();
        assert_eq!(fetched.status, ChallengeStatus::Pending);
        assert!(!fetched.reported);
    }

    #[tokio::test]
    async fn test_put_rejects_duplicate_id() {
        let store = MemoryChallengeStore::new();
        let record = pending_record(300);
        store.put(record.clone()).await.unwrap();

        let err = store.put(record).await.unwrap_err();
        assert!(matches!(err, RelayError::DuplicateId(_)));
    }

    #[tokio::test]
    async fn test_get_unknown_is_none() {
        let store = MemoryChallengeStore::new();
        assert!(store.get(&ChallengeId::generate()).await.is_none());
    }

    #[tokio::test]
    async fn test_get_coerces_expired_pending() {
        let store = MemoryChallengeStore::new();
        let record = expired_record();
        let id = record.id.clone();
        store.put(record).await.unwrap();

        let fetched = store.get(&id).await.unwrap();
        assert_eq!(fetched.status, ChallengeStatus::Expired);
    }

    #[tokio::test]
    async fn test_transition_to_verified_sets_signing_id() {
        let store = MemoryChallengeStore::new();
        let record = pending_record(300);
        let id = record.id.clone();
        store.put(record).await.unwrap();

        let updated = store
            .transition(&id, ChallengeStatus::Verified, Some("alice@".to_string()))
            .await
            .unwrap();
        assert_eq!(updated.status, ChallengeStatus::Verified);
        assert_eq!(updated.signing_id.as_deref(), Some("alice@"));
    }

    #[tokio::test]
    async fn test_second_transition_sees_already_resolved() {
        let store = MemoryChallengeStore::new();
        let record = pending_record(300);
        let id = record.id.clone();
        store.put(record).await.unwrap();

        store
            .transition(&id, ChallengeStatus::Verified, Some("alice@".to_string()))
            .await
            .unwrap();

        let conflict = store
            .transition(&id, ChallengeStatus::Verified, Some("mallory@".to_string()))
            .await
            .unwrap_err();
        assert_eq!(conflict, TransitionConflict::AlreadyResolved);

        // The losing transition must not overwrite the signing identity
        let fetched = store.get(&id).await.unwrap();
        assert_eq!(fetched.signing_id.as_deref(), Some("alice@"));
    }

    #[tokio::test]
    async fn test_transition_on_expired_record_conflicts() {
        let store = MemoryChallengeStore::new();
        let record = expired_record();
        let id = record.id.clone();
        store.put(record).await.unwrap();

        let conflict = store
            .transition(&id, ChallengeStatus::Verified, Some("alice@".to_string()))
            .await
            .unwrap_err();
        assert_eq!(conflict, TransitionConflict::Expired);
    }

    #[tokio::test]
    async fn test_transition_unknown_id_conflicts() {
        let store = MemoryChallengeStore::new();
        let conflict = store
            .transition(
                &ChallengeId::generate(),
                ChallengeStatus::Verified,
                Some("alice@".to_string()),
            )
            .await
            .unwrap_err();
        assert_eq!(conflict, TransitionConflict::NotFound);
    }

    #[tokio::test]
    async fn test_concurrent_transitions_have_one_winner() {
        let store = MemoryChallengeStore::new();
        let record = pending_record(300);
        let id = record.id.clone();
        store.put(record).await.unwrap();

        let mut handles = Vec::new();
        for n in 0..8 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                store
                    .transition(&id, ChallengeStatus::Verified, Some(format!("wallet{n}@")))
                    .await
                    .is_ok()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_mark_reported_flips_exactly_once() {
        let store = MemoryChallengeStore::new();
        let record = pending_record(300);
        let id = record.id.clone();
        store.put(record).await.unwrap();

        assert!(store.mark_reported(&id).await);
        assert!(!store.mark_reported(&id).await);
        assert!(!store.mark_reported(&ChallengeId::generate()).await);
    }

    #[tokio::test]
    async fn test_sweep_removes_only_past_grace() {
        let store = MemoryChallengeStore::new();
        let live = pending_record(300);
        let live_id = live.id.clone();
        let dead = expired_record();
        let dead_id = dead.id.clone();
        store.put(live).await.unwrap();
        store.put(dead).await.unwrap();

        let removed = store.sweep(Duration::seconds(60)).await;
        assert_eq!(removed, 1);
        assert!(store.get(&live_id).await.is_some());
        assert!(store.get(&dead_id).await.is_none());
    }

    #[tokio::test]
    async fn test_sweep_grace_keeps_recently_expired() {
        let store = MemoryChallengeStore::new();
        let record = expired_record();
        let id = record.id.clone();
        store.put(record).await.unwrap();

        // expired_record is 300s past expiry; a generous grace keeps it
        let removed = store.sweep(Duration::seconds(3600)).await;
        assert_eq!(removed, 0);
        assert_eq!(
            store.get(&id).await.unwrap().status,
            ChallengeStatus::Expired
        );
    }
}
