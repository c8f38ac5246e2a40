use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chirp_store::CredentialStore;
use chirp_types::{LikeEvent, LikeId, LikeState, Liker, PostId, UserId};
use chrono::Utc;
use tracing::debug;

use crate::error::{LedgerError, LedgerResult};
use crate::traits::{LikeReader, LikeWriter};

/// In-memory like ledger for tests, local demos, and embedding.
///
/// Rows live in a `Vec` indexed by id; a row's position never changes. Each
/// mutation holds the write guard for its whole read-modify-write, which is
/// what makes toggle atomic here. Usernames for [`LikeReader::list_likers`]
/// come from the credential store.
pub struct InMemoryLikeLedger {
    users: Arc<dyn CredentialStore>,
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    events: Vec<LikeEvent>,
}

impl LedgerState {
    fn position(&self, user_id: UserId, post_id: PostId, state: LikeState) -> Option<usize> {
        self.events
            .iter()
            .position(|e| e.is_for(user_id, post_id) && e.state == state)
    }
}

impl InMemoryLikeLedger {
    pub fn new(users: Arc<dyn CredentialStore>) -> Self {
        Self {
            users,
            inner: RwLock::new(LedgerState::default()),
        }
    }

    /// Total rows ever written.
    pub fn event_count(&self) -> usize {
        self.inner.read().expect("lock poisoned").events.len()
    }

    fn read(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, LedgerState>> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Internal("ledger read lock poisoned".into()))
    }

    fn write(&self) -> LedgerResult<std::sync::RwLockWriteGuard<'_, LedgerState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Internal("ledger write lock poisoned".into()))
    }

    fn collect<F>(&self, filter: F) -> LedgerResult<Vec<LikeEvent>>
    where
        F: Fn(&LikeEvent) -> bool,
    {
        Ok(self
            .read()?
            .events
            .iter()
            .filter(|e| filter(e))
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for InMemoryLikeLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLikeLedger")
            .field("event_count", &self.event_count())
            .finish()
    }
}

#[async_trait]
impl LikeWriter for InMemoryLikeLedger {
    async fn toggle(&self, user_id: UserId, post_id: PostId) -> LedgerResult<LikeEvent> {
        let event = {
            let mut state = self.write()?;
            let found = state
                .position(user_id, post_id, LikeState::Active)
                .or_else(|| state.position(user_id, post_id, LikeState::Inactive));
            if let Some(index) = found {
                let row = &mut state.events[index];
                row.state = row.state.flipped();
                row.clone()
            } else {
                let id = LikeId::new(state.events.len() as i64 + 1);
                let event = LikeEvent::new_active(id, user_id, post_id, Utc::now());
                state.events.push(event.clone());
                event
            }
        };
        debug!(
            like_id = %event.id,
            user_id = %user_id,
            post_id = %post_id,
            state = %event.state,
            "like toggled"
        );
        Ok(event)
    }

    async fn deactivate(&self, user_id: UserId, post_id: PostId) -> LedgerResult<bool> {
        let mut state = self.write()?;
        match state.position(user_id, post_id, LikeState::Active) {
            Some(index) => {
                state.events[index].state = LikeState::Inactive;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LikeReader for InMemoryLikeLedger {
    async fn list_likers(&self, post_id: PostId) -> LedgerResult<Vec<Liker>> {
        let active = self.collect(|e| e.post_id == post_id && e.is_active())?;
        let mut likers = Vec::with_capacity(active.len());
        for event in active {
            // Inner-join semantics: likes by unknown users are not listed.
            if let Some(user) = self.users.find_by_id(event.user_id).await? {
                likers.push(Liker {
                    username: user.username,
                    user_id: user.id,
                    like_id: event.id,
                });
            }
        }
        Ok(likers)
    }

    async fn like_count(&self, post_id: PostId) -> LedgerResult<u64> {
        Ok(self
            .read()?
            .events
            .iter()
            .filter(|e| e.post_id == post_id && e.is_active())
            .count() as u64)
    }

    async fn is_liking(&self, user_id: UserId, post_id: PostId) -> LedgerResult<bool> {
        Ok(self
            .read()?
            .position(user_id, post_id, LikeState::Active)
            .is_some())
    }

    async fn history(&self, user_id: UserId, post_id: PostId) -> LedgerResult<Vec<LikeEvent>> {
        self.collect(|e| e.is_for(user_id, post_id))
    }

    async fn events_for_post(&self, post_id: PostId) -> LedgerResult<Vec<LikeEvent>> {
        self.collect(|e| e.post_id == post_id)
    }

    async fn liked_posts(&self) -> LedgerResult<Vec<PostId>> {
        let mut posts: Vec<PostId> = self.read()?.events.iter().map(|e| e.post_id).collect();
        posts.sort();
        posts.dedup();
        Ok(posts)
    }
}

#[cfg(test)]
mod tests {
    use chirp_store::InMemoryStore;
    use proptest::prelude::*;

    use super::*;

    const ALICE: UserId = UserId::new(1);
    const POST: PostId = PostId::new(10);

    fn ledger() -> InMemoryLikeLedger {
        InMemoryLikeLedger::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn like_unlike_like_scenario() {
        let ledger = ledger();

        let liked = ledger.toggle(ALICE, POST).await.unwrap();
        assert_eq!(liked.user_id, ALICE);
        assert_eq!(liked.post_id, POST);
        assert!(liked.is_active());

        assert!(ledger.deactivate(ALICE, POST).await.unwrap());
        let unliked = ledger.history(ALICE, POST).await.unwrap();
        assert_eq!(unliked.len(), 1);
        assert_eq!(unliked[0].id, liked.id);
        assert!(!unliked[0].is_active());

        let relike = ledger.toggle(ALICE, POST).await.unwrap();
        assert_eq!(relike.id, liked.id);
        assert_eq!(relike.created_at, liked.created_at);
        assert!(relike.is_active());
        assert_eq!(ledger.event_count(), 1);
    }

    #[tokio::test]
    async fn toggle_never_creates_a_second_active_row() {
        let ledger = ledger();
        let first = ledger.toggle(ALICE, POST).await.unwrap();
        let second = ledger.toggle(ALICE, POST).await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(!second.is_active());
        assert_eq!(ledger.event_count(), 1);
    }

    #[tokio::test]
    async fn deactivate_on_empty_pair_is_noop() {
        let ledger = ledger();
        assert!(!ledger.deactivate(ALICE, POST).await.unwrap());
        assert_eq!(ledger.event_count(), 0);
    }

    #[tokio::test]
    async fn toggle_does_not_check_existence() {
        let ledger = ledger();
        let like = ledger.toggle(UserId::new(77), PostId::new(88)).await.unwrap();
        assert!(like.is_active());
        // No such user, so nobody is listed even though the row is active.
        assert!(ledger.list_likers(PostId::new(88)).await.unwrap().is_empty());
        assert_eq!(ledger.like_count(PostId::new(88)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn likers_joined_with_usernames() {
        let users = Arc::new(InMemoryStore::new());
        let alice = users.create_user("alice", "h").await.unwrap();
        let bob = users.create_user("bob", "h").await.unwrap();
        let ledger = InMemoryLikeLedger::new(users);

        let a = ledger.toggle(alice.id, POST).await.unwrap();
        ledger.toggle(bob.id, POST).await.unwrap();
        ledger.toggle(bob.id, POST).await.unwrap();

        let likers = ledger.list_likers(POST).await.unwrap();
        assert_eq!(likers.len(), 1);
        assert_eq!(likers[0].username, "alice");
        assert_eq!(likers[0].like_id, a.id);
        assert!(ledger.is_liking(alice.id, POST).await.unwrap());
        assert!(!ledger.is_liking(bob.id, POST).await.unwrap());
        assert_eq!(ledger.liked_posts().await.unwrap(), vec![POST]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_toggles_serialize() {
        let ledger = Arc::new(ledger());
        let mut handles = Vec::new();
        for _ in 0..64 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move { ledger.toggle(ALICE, POST).await }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let history = ledger.history(ALICE, POST).await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history[0].is_active());
    }

    #[derive(Clone, Debug)]
    enum Op {
        Toggle(i64, i64),
        Deactivate(i64, i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (1..4i64, 1..4i64).prop_map(|(u, p)| Op::Toggle(u, p)),
            (1..4i64, 1..4i64).prop_map(|(u, p)| Op::Deactivate(u, p)),
        ]
    }

    proptest! {
        #[test]
        fn matches_boolean_model(ops in proptest::collection::vec(op(), 0..64)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let ledger = ledger();
                let mut model = std::collections::HashMap::new();
                for op in &ops {
                    match *op {
                        Op::Toggle(u, p) => {
                            let event = ledger.toggle(UserId::new(u), PostId::new(p)).await.unwrap();
                            let liked = model.entry((u, p)).or_insert(false);
                            *liked = !*liked;
                            prop_assert_eq!(event.is_active(), *liked);
                        }
                        Op::Deactivate(u, p) => {
                            ledger.deactivate(UserId::new(u), PostId::new(p)).await.unwrap();
                            model.insert((u, p), false);
                        }
                    }
                }
                for u in 1..4 {
                    for p in 1..4 {
                        let history = ledger.history(UserId::new(u), PostId::new(p)).await.unwrap();
                        prop_assert!(history.len() <= 1);
                        let active = history.iter().filter(|e| e.is_active()).count();
                        let expected = model.get(&(u, p)).copied().unwrap_or(false);
                        prop_assert_eq!(active == 1, expected);
                    }
                }
                Ok(())
            })?;
        }
    }
}
