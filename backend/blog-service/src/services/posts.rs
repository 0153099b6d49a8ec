/// Post service - handles post creation, retrieval, and management
use crate::db::{Collection, RecordStore};
use crate::error::{AppError, Result};
use crate::models::{Comment, Post, User};
use crate::permissions::check_post_ownership;
use crate::services::enrichment::{attach, Enriched, ProfileFields, UserDirectory};
use crate::services::listing::{query, ListCriteria, Page, PageRequest};
use crate::services::non_blank;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Fields of a new post. Blank title or content is rejected.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub image: Option<String>,
}

/// Partial update. Omitted or empty fields keep their stored value.
#[derive(Debug, Clone, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LikeToggle {
    /// Whether the actor likes the record after the toggle
    pub liked: bool,
    pub likes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDeletion {
    pub post_id: Uuid,
    pub comments_removed: usize,
}

pub struct PostService {
    store: Arc<RecordStore>,
}

impl PostService {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }

    /// Filtered, newest-first page of posts with their authors
    pub async fn list_posts(
        &self,
        criteria: &ListCriteria,
        request: PageRequest,
    ) -> Result<Page<Enriched<Post>>> {
        let posts: Vec<Post> = self.store.load(Collection::Posts).await?;
        let page = query(posts, criteria, request)?;

        let users: Vec<User> = self.store.load(Collection::Users).await?;
        let directory = UserDirectory::new(&users);
        Ok(page.map(|post| attach(post, &directory, ProfileFields::Basic)))
    }

    /// Get a post by ID, counting the view
    pub async fn get_post(&self, post_id: Uuid) -> Result<Enriched<Post>> {
        let post = self
            .store
            .mutate(Collection::Posts, |posts: &mut Vec<Post>| {
                let post = find_post_mut(posts, post_id)?;
                post.views += 1;
                Ok(post.clone())
            })
            .await?;

        self.with_author(post, ProfileFields::WithBio).await
    }

    /// Create a new post
    pub async fn create_post(&self, author_id: Uuid, new_post: NewPost) -> Result<Enriched<Post>> {
        let title = non_blank(Some(new_post.title))
            .ok_or_else(|| AppError::ValidationError("Title is required".to_string()))?;
        let content = non_blank(Some(new_post.content))
            .ok_or_else(|| AppError::ValidationError("Content is required".to_string()))?;

        let users: Vec<User> = self.store.load(Collection::Users).await?;
        if !users.iter().any(|u| u.id == author_id) {
            return Err(AppError::NotFound(format!("User {}", author_id)));
        }

        let post = Post::new(
            author_id,
            title,
            content,
            new_post.category,
            new_post.tags,
            new_post.image,
        );
        let created = post.clone();
        self.store
            .mutate(Collection::Posts, move |posts: &mut Vec<Post>| {
                posts.push(post);
                Ok(())
            })
            .await?;

        tracing::info!(post_id = %created.id, author_id = %author_id, "Post created");

        let directory = UserDirectory::new(&users);
        Ok(attach(created, &directory, ProfileFields::Basic))
    }

    /// Update a post the actor owns (or any post, for admins)
    pub async fn update_post(
        &self,
        post_id: Uuid,
        actor: &User,
        patch: PostPatch,
    ) -> Result<Enriched<Post>> {
        let post = self
            .store
            .mutate(Collection::Posts, |posts: &mut Vec<Post>| {
                let post = find_post_mut(posts, post_id)?;
                check_post_ownership(actor, post)?;

                if let Some(title) = non_blank(patch.title) {
                    post.title = title;
                }
                if let Some(content) = non_blank(patch.content) {
                    post.content = content;
                }
                if let Some(category) = non_blank(patch.category) {
                    post.category = category;
                }
                if let Some(tags) = patch.tags.filter(|t| !t.is_empty()) {
                    post.tags = tags;
                }
                if let Some(image) = non_blank(patch.image) {
                    post.image = Some(image);
                }
                post.updated_at = Utc::now();
                Ok(post.clone())
            })
            .await?;

        tracing::debug!(post_id = %post_id, actor = %actor.id, "Post updated");
        self.with_author(post, ProfileFields::Basic).await
    }

    /// Delete a post together with every comment on it.
    ///
    /// Both collections change under one pair of locks; a failed save leaves
    /// the post and its comments in place.
    pub async fn delete_post(&self, post_id: Uuid, actor: &User) -> Result<PostDeletion> {
        let comments_removed = self
            .store
            .mutate_pair(
                Collection::Posts,
                Collection::Comments,
                |posts: &mut Vec<Post>, comments: &mut Vec<Comment>| {
                    let post = posts
                        .iter()
                        .find(|p| p.id == post_id)
                        .ok_or_else(|| post_not_found(post_id))?;
                    check_post_ownership(actor, post)?;

                    posts.retain(|p| p.id != post_id);
                    let before = comments.len();
                    comments.retain(|c| c.post_id != post_id);
                    Ok(before - comments.len())
                },
            )
            .await?;

        tracing::info!(
            post_id = %post_id,
            actor = %actor.id,
            comments_removed,
            "Post deleted"
        );

        Ok(PostDeletion {
            post_id,
            comments_removed,
        })
    }

    /// Add or remove the actor's like
    pub async fn toggle_like(&self, post_id: Uuid, user_id: Uuid) -> Result<LikeToggle> {
        self.store
            .mutate(Collection::Posts, |posts: &mut Vec<Post>| {
                let post = find_post_mut(posts, post_id)?;
                let liked = if post.likes.remove(&user_id) {
                    false
                } else {
                    post.likes.insert(user_id)
                };
                post.updated_at = Utc::now();
                Ok(LikeToggle {
                    liked,
                    likes: post.likes.len(),
                })
            })
            .await
    }

    async fn with_author(&self, post: Post, fields: ProfileFields) -> Result<Enriched<Post>> {
        let users: Vec<User> = self.store.load(Collection::Users).await?;
        let directory = UserDirectory::new(&users);
        Ok(attach(post, &directory, fields))
    }
}

fn post_not_found(post_id: Uuid) -> AppError {
    AppError::NotFound(format!("Post {}", post_id))
}

fn find_post_mut(posts: &mut [Post], post_id: Uuid) -> Result<&mut Post> {
    posts
        .iter_mut()
        .find(|p| p.id == post_id)
        .ok_or_else(|| post_not_found(post_id))
}
