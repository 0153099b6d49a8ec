/// Business logic layer for blog-service
///
/// - `listing`, `threads`, `enrichment`: pure read-side algorithms
/// - `posts`, `comments`, `users`: operations over the record store
pub mod comments;
pub mod enrichment;
pub mod listing;
pub mod posts;
pub mod threads;
pub mod users;

// Re-export commonly used services
pub use comments::{CommentService, CommentThread};
pub use posts::{LikeToggle, NewPost, PostDeletion, PostPatch, PostService};
pub use users::{AuthSession, ProfilePatch, UserService};

/// `None` for absent, empty or whitespace-only input
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
