//! Foundation types for chirp.
//!
//! Every other chirp crate depends on `chirp-types`. Nothing in here touches
//! storage or the network.
//!
//! # Key Types
//!
//! - [`UserId`], [`PostId`], [`LikeId`]: integer row identifiers
//! - [`User`]: registered account (hash never serialized)
//! - [`Post`] / [`NewPost`]: short authored message
//! - [`LikeEvent`]: one flip-toggled like record with a [`LikeState`]
//! - [`Liker`]: read view joining an active like with its username

pub mod error;
pub mod ids;
pub mod like;
pub mod post;
pub mod user;

pub use error::TypeError;
pub use ids::{LikeId, PostId, UserId};
pub use like::{LikeEvent, LikeState, Liker};
pub use post::{NewPost, Post, MAX_CONTENT_LEN, MAX_TITLE_LEN};
pub use user::{validate_password, validate_username, User, MAX_USERNAME_LEN};
