/// Auth handlers - registration, login and the caller's own profile
use super::AppState;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::UserProfile;
use crate::services::{ProfilePatch, UserService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50, message = "Username is required"))]
    pub username: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(max = 50))]
    pub username: Option<String>,
    #[validate(length(max = 500))]
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

fn users(state: &AppState) -> UserService {
    UserService::new(state.store.clone(), state.auth.clone())
}

pub async fn register(
    state: web::Data<AppState>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    req.validate()?;

    let session = users(&state)
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "User registered successfully",
        "token": session.token,
        "user": session.user,
    })))
}

pub async fn login(state: web::Data<AppState>, req: web::Json<LoginRequest>) -> Result<HttpResponse> {
    req.validate()?;

    let session = users(&state).login(&req.email, &req.password).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Login successful",
        "token": session.token,
        "user": session.user,
    })))
}

pub async fn get_profile(user: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "user": UserProfile::from(&user.0),
    })))
}

pub async fn update_profile(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let req = req.into_inner();

    let profile = users(&state)
        .update_profile(
            user.0.id,
            ProfilePatch {
                username: req.username,
                bio: req.bio,
                avatar: req.avatar,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Profile updated successfully",
        "user": profile,
    })))
}
