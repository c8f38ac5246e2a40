use std::collections::{HashMap, HashSet};

use chirp_types::{LikeEvent, LikeId, PostId, UserId};

use crate::error::LedgerResult;
use crate::traits::LikeReader;

/// Result of auditing the like rows of one post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LikeAuditReport {
    pub post_id: PostId,
    pub event_count: usize,
    pub active_count: usize,
    pub violations: Vec<Violation>,
}

impl LikeAuditReport {
    /// Returns `true` if all checks passed.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// A specific integrity violation found during an audit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub like_id: LikeId,
    pub user_id: UserId,
    pub kind: ViolationKind,
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViolationKind {
    /// More than one active row for a (user, post) pair.
    MultipleActive,
    /// Two rows share an id.
    DuplicateId,
    /// A row filed under the wrong post.
    ForeignPost,
}

/// Checks the at-most-one-active invariant.
pub struct LikeValidator;

impl LikeValidator {
    /// Audit rows already loaded for `post_id`.
    pub fn check_events(post_id: PostId, events: &[LikeEvent]) -> LikeAuditReport {
        let mut violations = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut active_by_user: HashMap<UserId, LikeId> = HashMap::new();
        let mut active_count = 0;

        for event in events {
            if !seen_ids.insert(event.id) {
                violations.push(Violation {
                    like_id: event.id,
                    user_id: event.user_id,
                    kind: ViolationKind::DuplicateId,
                    description: format!("like id {} appears more than once", event.id),
                });
            }

            if event.post_id != post_id {
                violations.push(Violation {
                    like_id: event.id,
                    user_id: event.user_id,
                    kind: ViolationKind::ForeignPost,
                    description: format!("row belongs to post {}", event.post_id),
                });
                continue;
            }

            if !event.is_active() {
                continue;
            }
            active_count += 1;
            if let Some(first) = active_by_user.insert(event.user_id, event.id) {
                violations.push(Violation {
                    like_id: event.id,
                    user_id: event.user_id,
                    kind: ViolationKind::MultipleActive,
                    description: format!("already active as like {first}"),
                });
            }
        }

        LikeAuditReport {
            post_id,
            event_count: events.len(),
            active_count,
            violations,
        }
    }

    /// Load and audit every row of one post.
    pub async fn audit_post<R: LikeReader + ?Sized>(
        reader: &R,
        post_id: PostId,
    ) -> LedgerResult<LikeAuditReport> {
        let events = reader.events_for_post(post_id).await?;
        Ok(Self::check_events(post_id, &events))
    }

    /// Audit every post that has like rows.
    pub async fn audit_all<R: LikeReader + ?Sized>(reader: &R) -> LedgerResult<Vec<LikeAuditReport>> {
        let mut reports = Vec::new();
        for post_id in reader.liked_posts().await? {
            reports.push(Self::audit_post(reader, post_id).await?);
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chirp_store::InMemoryStore;
    use chirp_types::LikeState;
    use chrono::Utc;

    use super::*;
    use crate::memory::InMemoryLikeLedger;
    use crate::traits::LikeWriter;

    fn event(id: i64, user: i64, post: i64, state: LikeState) -> LikeEvent {
        LikeEvent {
            id: LikeId::new(id),
            user_id: UserId::new(user),
            post_id: PostId::new(post),
            created_at: Utc::now(),
            state,
        }
    }

    #[test]
    fn clean_rows_pass() {
        let events = vec![
            event(1, 1, 10, LikeState::Active),
            event(2, 2, 10, LikeState::Inactive),
            event(3, 3, 10, LikeState::Active),
        ];
        let report = LikeValidator::check_events(PostId::new(10), &events);
        assert!(report.is_valid());
        assert_eq!(report.event_count, 3);
        assert_eq!(report.active_count, 2);
    }

    #[test]
    fn two_active_rows_for_one_user_flagged() {
        let events = vec![
            event(1, 1, 10, LikeState::Active),
            event(2, 1, 10, LikeState::Active),
        ];
        let report = LikeValidator::check_events(PostId::new(10), &events);
        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::MultipleActive);
        assert_eq!(report.violations[0].like_id, LikeId::new(2));
    }

    #[test]
    fn inactive_history_is_fine() {
        let events = vec![
            event(1, 1, 10, LikeState::Inactive),
            event(2, 1, 10, LikeState::Inactive),
            event(3, 1, 10, LikeState::Active),
        ];
        assert!(LikeValidator::check_events(PostId::new(10), &events).is_valid());
    }

    #[test]
    fn duplicate_ids_and_foreign_rows_flagged() {
        let events = vec![
            event(1, 1, 10, LikeState::Inactive),
            event(1, 2, 10, LikeState::Inactive),
            event(2, 3, 11, LikeState::Active),
        ];
        let kinds: Vec<ViolationKind> = LikeValidator::check_events(PostId::new(10), &events)
            .violations
            .into_iter()
            .map(|v| v.kind)
            .collect();
        assert_eq!(kinds, vec![ViolationKind::DuplicateId, ViolationKind::ForeignPost]);
    }

    #[tokio::test]
    async fn audit_all_over_ledger() {
        let ledger = InMemoryLikeLedger::new(Arc::new(InMemoryStore::new()));
        for user in 1..=3 {
            ledger.toggle(UserId::new(user), PostId::new(10)).await.unwrap();
        }
        ledger.toggle(UserId::new(1), PostId::new(20)).await.unwrap();
        ledger.toggle(UserId::new(1), PostId::new(20)).await.unwrap();

        let reports = LikeValidator::audit_all(&ledger).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports.iter().all(LikeAuditReport::is_valid));
        assert_eq!(reports[0].active_count, 3);
        assert_eq!(reports[1].active_count, 0);
        assert_eq!(reports[1].event_count, 1);
    }
}
