use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{LikeId, PostId, UserId};

/// Whether a like row is currently in effect.
///
/// Serialized as the boolean `active` flag clients expect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum LikeState {
    Active,
    Inactive,
}

impl LikeState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// The opposite state.
    pub fn flipped(self) -> Self {
        match self {
            Self::Active => Self::Inactive,
            Self::Inactive => Self::Active,
        }
    }
}

impl From<bool> for LikeState {
    fn from(active: bool) -> Self {
        if active {
            Self::Active
        } else {
            Self::Inactive
        }
    }
}

impl From<LikeState> for bool {
    fn from(state: LikeState) -> Self {
        state.is_active()
    }
}

impl fmt::Display for LikeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

/// One historical record of a user's like of a post.
///
/// Rows are flipped between [`LikeState::Active`] and
/// [`LikeState::Inactive`], never deleted. The `id` and `created_at` of a row
/// survive every flip, so re-liking restores the first-ever like time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeEvent {
    pub id: LikeId,
    pub user_id: UserId,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
    #[serde(rename = "active")]
    pub state: LikeState,
}

impl LikeEvent {
    /// A fresh, active like.
    pub fn new_active(id: LikeId, user_id: UserId, post_id: PostId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            post_id,
            created_at: now,
            state: LikeState::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Whether this row belongs to the given (user, post) pair.
    pub fn is_for(&self, user_id: UserId, post_id: PostId) -> bool {
        self.user_id == user_id && self.post_id == post_id
    }
}

/// A user currently liking a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Liker {
    pub username: String,
    pub user_id: UserId,
    #[serde(rename = "likes_id")]
    pub like_id: LikeId,
}
