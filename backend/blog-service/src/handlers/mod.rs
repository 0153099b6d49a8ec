/// HTTP handlers for blog-service
///
/// - Auth: register, login, own profile
/// - Posts: browse/search, CRUD, likes
/// - Comments: threaded listing, CRUD, likes
/// - Health: liveness and data directory check
pub mod auth;
pub mod comments;
pub mod health;
pub mod posts;

use crate::db::RecordStore;
use crate::security::AuthProvider;
use actix_web::web;
use std::str::FromStr;
use std::sync::Arc;

/// Shared per-process state handed to every handler
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(store: Arc<RecordStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }
}

/// Lenient query parameter: absent or unparsable falls back to `default`.
pub(crate) fn param_or<T: FromStr>(raw: Option<&str>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Mounts the `/api` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_summary))
            .route("/health/live", web::get().to(health::liveness_check))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/profile", web::get().to(auth::get_profile))
                    .route("/profile", web::put().to(auth::update_profile)),
            )
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/category/{category}", web::get().to(posts::list_by_category))
                    .route("/{post_id}", web::get().to(posts::get_post))
                    .route("/{post_id}", web::put().to(posts::update_post))
                    .route("/{post_id}", web::delete().to(posts::delete_post))
                    .route("/{post_id}/like", web::post().to(posts::toggle_like)),
            )
            .service(
                web::scope("/comments")
                    .route("", web::post().to(comments::create_comment))
                    .route("/post/{post_id}", web::get().to(comments::list_comments))
                    .route("/{comment_id}", web::get().to(comments::get_comment))
                    .route("/{comment_id}", web::put().to(comments::update_comment))
                    .route("/{comment_id}", web::delete().to(comments::delete_comment))
                    .route("/{comment_id}/like", web::post().to(comments::toggle_like)),
            ),
    );
}
