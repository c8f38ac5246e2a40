use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{PostId, UserId};

pub const MAX_TITLE_LEN: usize = 120;
pub const MAX_CONTENT_LEN: usize = 280;

/// A short authored message. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub content: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a post.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: UserId,
}

impl NewPost {
    pub fn new(user_id: UserId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            user_id,
        }
    }

    /// Check field lengths. A post needs at least a title or some content.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.title.trim().is_empty() && self.content.trim().is_empty() {
            return Err(TypeError::EmptyPost);
        }
        if self.title.chars().count() > MAX_TITLE_LEN {
            return Err(TypeError::FieldTooLong {
                field: "title",
                max: MAX_TITLE_LEN,
            });
        }
        if self.content.chars().count() > MAX_CONTENT_LEN {
            return Err(TypeError::FieldTooLong {
                field: "content",
                max: MAX_CONTENT_LEN,
            });
        }
        Ok(())
    }

    /// Materialize into a stored post.
    pub fn into_post(self, id: PostId, created_at: DateTime<Utc>) -> Post {
        Post {
            id,
            title: self.title,
            content: self.content,
            user_id: self.user_id,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_only_post_is_valid() {
        let post = NewPost::new(UserId::new(1), "", "hello");
        assert!(post.validate().is_ok());
    }

    #[test]
    fn blank_post_rejected() {
        let post = NewPost::new(UserId::new(1), " ", "\n");
        assert_eq!(post.validate(), Err(TypeError::EmptyPost));
    }

    #[test]
    fn long_content_rejected() {
        let post = NewPost::new(UserId::new(1), "t", "x".repeat(MAX_CONTENT_LEN + 1));
        assert_eq!(
            post.validate(),
            Err(TypeError::FieldTooLong {
                field: "content",
                max: MAX_CONTENT_LEN
            })
        );
    }

    #[test]
    fn into_post_keeps_fields() {
        let now = Utc::now();
        let post = NewPost::new(UserId::new(2), "hi", "there").into_post(PostId::new(5), now);
        assert_eq!(post.id, PostId::new(5));
        assert_eq!(post.user_id, UserId::new(2));
        assert_eq!(post.created_at, now);
    }
}
