/// User service - registration, login and profiles
use crate::db::{Collection, RecordStore};
use crate::error::{AppError, Result};
use crate::models::{User, UserProfile};
use crate::security::AuthProvider;
use crate::services::non_blank;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// A signed-in user: public profile plus bearer token
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

pub struct UserService {
    store: Arc<RecordStore>,
    auth: Arc<dyn AuthProvider>,
}

impl UserService {
    pub fn new(store: Arc<RecordStore>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { store, auth }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthSession> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AppError::ValidationError(
                "Username, email and password are required".to_string(),
            ));
        }

        let auth = self.auth.clone();
        let password = password.to_string();
        let password_hash = blocking(move || auth.hash_password(&password)).await?;
        let user = User::new(username.trim().to_string(), email.trim().to_string(), password_hash);
        let created = user.clone();

        self.store
            .mutate(Collection::Users, move |users: &mut Vec<User>| {
                if users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
                    return Err(AppError::Conflict("Email already registered".to_string()));
                }
                if users.iter().any(|u| u.username == user.username) {
                    return Err(AppError::Conflict("Username already taken".to_string()));
                }
                users.push(user);
                Ok(())
            })
            .await?;

        tracing::info!(user_id = %created.id, username = %created.username, "User registered");
        self.session_for(&created)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let users: Vec<User> = self.store.load(Collection::Users).await?;
        let invalid = || AppError::Unauthorized("Invalid credentials".to_string());

        let user = users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .ok_or_else(invalid)?;

        let auth = self.auth.clone();
        let password = password.to_string();
        let hash = user.password.clone();
        if !blocking(move || auth.verify_password(&password, &hash)).await? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(invalid());
        }

        self.session_for(&user)
    }

    /// Look up a user by id; `None` when absent
    pub async fn find(&self, user_id: Uuid) -> Result<Option<User>> {
        let users: Vec<User> = self.store.load(Collection::Users).await?;
        Ok(users.into_iter().find(|u| u.id == user_id))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile> {
        self.find(user_id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
    }

    /// Update username, bio or avatar. Omitted fields are kept; a blank
    /// username is ignored.
    pub async fn update_profile(&self, user_id: Uuid, patch: ProfilePatch) -> Result<UserProfile> {
        self.store
            .mutate(Collection::Users, |users: &mut Vec<User>| {
                if let Some(username) = non_blank(patch.username.clone()) {
                    let taken = users
                        .iter()
                        .any(|u| u.id != user_id && u.username == username.trim());
                    if taken {
                        return Err(AppError::Conflict("Username already taken".to_string()));
                    }
                }

                let user = users
                    .iter_mut()
                    .find(|u| u.id == user_id)
                    .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))?;

                if let Some(username) = non_blank(patch.username) {
                    user.username = username.trim().to_string();
                }
                if let Some(bio) = patch.bio {
                    user.bio = bio;
                }
                if let Some(avatar) = patch.avatar {
                    user.avatar = Some(avatar).filter(|a| !a.is_empty());
                }
                user.updated_at = Utc::now();
                Ok(UserProfile::from(&*user))
            })
            .await
    }

    fn session_for(&self, user: &User) -> Result<AuthSession> {
        Ok(AuthSession {
            token: self.auth.issue_token(user.id)?,
            user: UserProfile::from(user),
        })
    }
}

/// Argon2 is CPU-bound; keep it off the async worker threads.
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("password task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryBackend;
    use crate::security::JwtAuthProvider;
    use chrono::Duration;

    fn service() -> (UserService, Arc<dyn AuthProvider>) {
        let store = Arc::new(RecordStore::new(Arc::new(MemoryBackend::new())));
        let auth: Arc<dyn AuthProvider> =
            Arc::new(JwtAuthProvider::new("test-secret", Duration::hours(1)));
        (UserService::new(store, auth.clone()), auth)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (service, auth) = service();
        let session = service.register("ada", "ada@example.com", "pw").await.unwrap();
        assert_eq!(auth.validate_token(&session.token).unwrap(), session.user.id);

        let login = service.login("ADA@example.com", "pw").await.unwrap();
        assert_eq!(login.user.id, session.user.id);

        let stored = service.find(session.user.id).await.unwrap().unwrap();
        assert_ne!(stored.password, "pw");
    }

    #[tokio::test]
    async fn test_duplicates_conflict() {
        let (service, _) = service();
        service.register("ada", "ada@example.com", "pw").await.unwrap();

        let result = service.register("other", "ada@example.com", "pw").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
        let result = service.register("ada", "new@example.com", "pw").await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_bad_credentials_are_unauthorized() {
        let (service, _) = service();
        service.register("ada", "ada@example.com", "pw").await.unwrap();

        let result = service.login("ada@example.com", "wrong").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
        let result = service.login("nobody@example.com", "pw").await;
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_concurrent_registrations_on_single_worker() {
        let (service, _) = service();
        let service = Arc::new(service);

        let mut handles = Vec::new();
        for i in 0..4 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let name = format!("user{}", i);
                let email = format!("{}@example.com", name);
                service.register(&name, &email, "pw").await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let session = service.login("user3@example.com", "pw").await.unwrap();
        assert_eq!(session.user.username, "user3");
    }

    #[tokio::test]
    async fn test_update_profile() {
        let (service, _) = service();
        let ada = service.register("ada", "ada@example.com", "pw").await.unwrap();
        service.register("bob", "bob@example.com", "pw").await.unwrap();

        let patch = ProfilePatch {
            username: Some("bob".into()),
            ..Default::default()
        };
        let result = service.update_profile(ada.user.id, patch).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));

        let patch = ProfilePatch {
            bio: Some("writes compilers".into()),
            ..Default::default()
        };
        let profile = service.update_profile(ada.user.id, patch).await.unwrap();
        assert_eq!(profile.username, "ada");
        assert_eq!(profile.bio, "writes compilers");

        let result = service.profile(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
