/// Comment handlers - threaded comments on posts
use super::{param_or, AppState};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::services::listing::{PageRequest, DEFAULT_COMMENT_LIMIT, DEFAULT_PAGE};
use crate::services::CommentService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct CommentListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub post_id: Uuid,
    #[serde(default)]
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    #[serde(default)]
    pub content: String,
}

/// Root threads of a post, newest first, each with all of its replies
pub async fn list_comments(
    state: web::Data<AppState>,
    post_id: web::Path<Uuid>,
    query: web::Query<CommentListQuery>,
) -> Result<HttpResponse> {
    let request = PageRequest::new(
        param_or(query.page.as_deref(), DEFAULT_PAGE),
        param_or(query.limit.as_deref(), DEFAULT_COMMENT_LIMIT),
    );

    let service = CommentService::new(state.store.clone());
    let page = service.list_comments(post_id.into_inner(), request).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "comments": page.items,
        "pagination": page.pagination,
    })))
}

pub async fn get_comment(
    state: web::Data<AppState>,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = CommentService::new(state.store.clone());
    let comment = service.get_comment(comment_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "comment": comment })))
}

pub async fn create_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    let service = CommentService::new(state.store.clone());
    let comment = service
        .create_comment(req.post_id, user.0.id, req.content, req.parent_id)
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Comment created successfully",
        "comment": comment,
    })))
}

pub async fn update_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    comment_id: web::Path<Uuid>,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    let service = CommentService::new(state.store.clone());
    let comment = service
        .update_comment(comment_id.into_inner(), &user.0, req.into_inner().content)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Comment updated successfully",
        "comment": comment,
    })))
}

/// Delete a comment together with all of its replies
pub async fn delete_comment(
    state: web::Data<AppState>,
    user: CurrentUser,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = CommentService::new(state.store.clone());
    let removed = service.delete_comment(comment_id.into_inner(), &user.0).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Comment deleted successfully",
        "removed": removed,
    })))
}

pub async fn toggle_like(
    state: web::Data<AppState>,
    user: CurrentUser,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = CommentService::new(state.store.clone());
    let toggle = service.toggle_like(comment_id.into_inner(), user.0.id).await?;

    let message = if toggle.liked { "Comment liked" } else { "Comment unliked" };
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": message,
        "liked": toggle.liked,
        "likes": toggle.likes,
    })))
}
