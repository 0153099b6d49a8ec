/// Comment service - threaded comments on posts
use crate::db::{Collection, RecordStore};
use crate::error::{AppError, Result};
use crate::models::{Comment, Post, User};
use crate::permissions::check_comment_ownership;
use crate::services::enrichment::{attach, enrich, Enriched, ProfileFields, UserDirectory};
use crate::services::listing::{paginate, Page, PageRequest};
use crate::services::non_blank;
use crate::services::posts::LikeToggle;
use crate::services::threads::{build_forest, descendants_of, ThreadNode};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub type CommentThread = ThreadNode<Enriched<Comment>>;

pub struct CommentService {
    store: Arc<RecordStore>,
}

impl CommentService {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Reply forest for a post, paginated by root thread.
    ///
    /// Every root on the page carries its complete subtree.
    pub async fn list_comments(
        &self,
        post_id: Uuid,
        request: PageRequest,
    ) -> Result<Page<CommentThread>> {
        let comments: Vec<Comment> = self.store.load(Collection::Comments).await?;
        let users: Vec<User> = self.store.load(Collection::Users).await?;

        let on_post: Vec<Comment> = comments.into_iter().filter(|c| c.post_id == post_id).collect();
        let forest = build_forest(enrich(on_post, &users, ProfileFields::Basic))?;
        paginate(forest, request)
    }

    /// Get a comment by ID
    pub async fn get_comment(&self, comment_id: Uuid) -> Result<Enriched<Comment>> {
        let comments: Vec<Comment> = self.store.load(Collection::Comments).await?;
        let comment = comments
            .into_iter()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| comment_not_found(comment_id))?;
        self.with_user(comment).await
    }

    /// Create a comment, or a reply when `parent_id` is set.
    ///
    /// The post is checked under the posts lock, so a concurrent
    /// `delete_post` either sees this comment or rejects it. The parent must
    /// exist and belong to the same post.
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        user_id: Uuid,
        content: String,
        parent_id: Option<Uuid>,
    ) -> Result<Enriched<Comment>> {
        let content = non_blank(Some(content))
            .ok_or_else(|| AppError::ValidationError("Content is required".to_string()))?;

        let comment = Comment::new(post_id, user_id, content, parent_id);
        let created = comment.clone();
        self.store
            .mutate_pair(
                Collection::Posts,
                Collection::Comments,
                move |posts: &mut Vec<Post>, comments: &mut Vec<Comment>| {
                    if !posts.iter().any(|p| p.id == post_id) {
                        return Err(AppError::NotFound(format!("Post {}", post_id)));
                    }
                    if let Some(parent_id) = parent_id {
                        let parent = comments
                            .iter()
                            .find(|c| c.id == parent_id)
                            .ok_or_else(|| AppError::NotFound(format!("Parent comment {}", parent_id)))?;
                        if parent.post_id != post_id {
                            return Err(AppError::ValidationError(
                                "Parent comment belongs to a different post".to_string(),
                            ));
                        }
                    }
                    comments.push(comment);
                    Ok(())
                },
            )
            .await?;

        tracing::info!(
            comment_id = %created.id,
            post_id = %post_id,
            parent_id = ?parent_id,
            "Comment created"
        );
        self.with_user(created).await
    }

    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        actor: &User,
        content: String,
    ) -> Result<Enriched<Comment>> {
        let content = non_blank(Some(content))
            .ok_or_else(|| AppError::ValidationError("Content is required".to_string()))?;

        let comment = self
            .store
            .mutate(Collection::Comments, |comments: &mut Vec<Comment>| {
                let comment = find_comment_mut(comments, comment_id)?;
                check_comment_ownership(actor, comment)?;
                comment.content = content;
                comment.updated_at = Utc::now();
                Ok(comment.clone())
            })
            .await?;

        self.with_user(comment).await
    }

    /// Delete a comment and every reply beneath it in one save.
    ///
    /// Returns how many comments were removed.
    pub async fn delete_comment(&self, comment_id: Uuid, actor: &User) -> Result<usize> {
        let removed = self
            .store
            .mutate(Collection::Comments, |comments: &mut Vec<Comment>| {
                let target = comments
                    .iter()
                    .find(|c| c.id == comment_id)
                    .ok_or_else(|| comment_not_found(comment_id))?;
                check_comment_ownership(actor, target)?;

                let doomed = descendants_of(comment_id, comments.as_slice())?;
                let before = comments.len();
                comments.retain(|c| !doomed.contains(&c.id));
                Ok(before - comments.len())
            })
            .await?;

        tracing::info!(comment_id = %comment_id, actor = %actor.id, removed, "Comment deleted");
        Ok(removed)
    }

    /// Add or remove the actor's like
    pub async fn toggle_like(&self, comment_id: Uuid, user_id: Uuid) -> Result<LikeToggle> {
        self.store
            .mutate(Collection::Comments, |comments: &mut Vec<Comment>| {
                let comment = find_comment_mut(comments, comment_id)?;
                let liked = if comment.likes.remove(&user_id) {
                    false
                } else {
                    comment.likes.insert(user_id)
                };
                comment.updated_at = Utc::now();
                Ok(LikeToggle {
                    liked,
                    likes: comment.likes.len(),
                })
            })
            .await
    }

    async fn with_user(&self, comment: Comment) -> Result<Enriched<Comment>> {
        let users: Vec<User> = self.store.load(Collection::Users).await?;
        let directory = UserDirectory::new(&users);
        Ok(attach(comment, &directory, ProfileFields::Basic))
    }
}

fn comment_not_found(comment_id: Uuid) -> AppError {
    AppError::NotFound(format!("Comment {}", comment_id))
}

fn find_comment_mut(comments: &mut [Comment], comment_id: Uuid) -> Result<&mut Comment> {
    comments
        .iter_mut()
        .find(|c| c.id == comment_id)
        .ok_or_else(|| comment_not_found(comment_id))
}
