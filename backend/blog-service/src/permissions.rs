/// Ownership checks for posts and comments
///
/// A user may modify a record they own; admins may modify anything.
use crate::error::{AppError, Result};
use crate::models::{Comment, Post, User};

pub fn check_post_ownership(actor: &User, post: &Post) -> Result<()> {
    if actor.can_modify(post.author_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this post".to_string(),
        ))
    }
}

pub fn check_comment_ownership(actor: &User, comment: &Comment) -> Result<()> {
    if actor.can_modify(comment.user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You don't have permission to modify this comment".to_string(),
        ))
    }
}
