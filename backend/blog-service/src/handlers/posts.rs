/// Post handlers - HTTP endpoints for post operations
use super::{param_or, AppState};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::TagsInput;
use crate::services::listing::{ListCriteria, PageRequest, DEFAULT_PAGE, DEFAULT_POST_LIMIT};
use crate::services::{NewPost, PostPatch, PostService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub author_id: Option<String>,
}

impl PostListQuery {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(
            param_or(self.page.as_deref(), DEFAULT_PAGE),
            param_or(self.limit.as_deref(), DEFAULT_POST_LIMIT),
        )
    }

    fn criteria(&self) -> ListCriteria {
        ListCriteria {
            category: self.category.clone().filter(|c| !c.is_empty()),
            search: self.search.clone().filter(|s| !s.is_empty()),
            author_id: self
                .author_id
                .as_deref()
                .and_then(|id| Uuid::parse_str(id).ok()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub category: Option<String>,
    pub tags: Option<TagsInput>,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<TagsInput>,
    pub image: Option<String>,
}

/// List posts with pagination, category, search and author filters
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PostListQuery>,
) -> Result<HttpResponse> {
    let service = PostService::new(state.store.clone());
    let page = service
        .list_posts(&query.criteria(), query.page_request())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "posts": page.items,
        "pagination": page.pagination,
    })))
}

/// List posts in one category
pub async fn list_by_category(
    state: web::Data<AppState>,
    category: web::Path<String>,
    query: web::Query<PostListQuery>,
) -> Result<HttpResponse> {
    let category = category.into_inner();
    let criteria = ListCriteria {
        category: Some(category.clone()),
        ..query.criteria()
    };

    let service = PostService::new(state.store.clone());
    let page = service.list_posts(&criteria, query.page_request()).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "posts": page.items,
        "pagination": page.pagination,
        "category": category,
    })))
}

/// Get a post by ID
pub async fn get_post(state: web::Data<AppState>, post_id: web::Path<Uuid>) -> Result<HttpResponse> {
    let service = PostService::new(state.store.clone());
    let post = service.get_post(post_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "post": post })))
}

/// Create a new post
pub async fn create_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let new_post = NewPost {
        title: req.title,
        content: req.content,
        category: req.category,
        tags: req.tags.map(TagsInput::into_tags).unwrap_or_default(),
        image: req.image,
    };

    let service = PostService::new(state.store.clone());
    let post = service.create_post(user.0.id, new_post).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Post created successfully",
        "post": post,
    })))
}

/// Update a post (owner or admin)
pub async fn update_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let patch = PostPatch {
        title: req.title,
        content: req.content,
        category: req.category,
        tags: req.tags.map(TagsInput::into_tags),
        image: req.image,
    };

    let service = PostService::new(state.store.clone());
    let post = service
        .update_post(post_id.into_inner(), &user.0, patch)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post updated successfully",
        "post": post,
    })))
}

/// Delete a post and its comments (owner or admin)
pub async fn delete_post(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new(state.store.clone());
    let deletion = service.delete_post(post_id.into_inner(), &user.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Post deleted successfully",
        "commentsRemoved": deletion.comments_removed,
    })))
}

/// Like or unlike a post
pub async fn toggle_like(
    state: web::Data<AppState>,
    user: CurrentUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = PostService::new(state.store.clone());
    let toggle = service.toggle_like(post_id.into_inner(), user.0.id).await?;

    let message = if toggle.liked { "Post liked" } else { "Post unliked" };
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": message,
        "liked": toggle.liked,
        "likes": toggle.likes,
    })))
}
