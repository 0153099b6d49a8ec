/// Data models for blog-service
///
/// This module defines structures for:
/// - Post: Blog posts with tags, likes and a view counter
/// - Comment: Comments on posts, optionally replying to another comment
/// - User: Accounts; only `UserProfile` ever leaves the service
///
/// All records serialize with camelCase keys, the layout of the JSON
/// collection files.
pub mod comment;
pub mod post;
pub mod user;

pub use comment::Comment;
pub use post::{Post, TagsInput};
pub use user::{User, UserProfile, ROLE_ADMIN, ROLE_USER};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A record persisted in a keyed collection.
pub trait Record {
    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
}
