/// Author/user enrichment: attach a public profile snapshot to records
///
/// Lookups that miss attach `null`; the record is kept either way.
use crate::models::{Comment, Post, Record, User};
use chrono::{DateTime, Utc};
use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use uuid::Uuid;

/// Which public fields the snapshot carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFields {
    /// id, username, avatar
    Basic,
    /// Basic plus bio
    WithBio,
}

/// Denormalized, read-only view of a user. Never carries the password.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorSnapshot {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

impl AuthorSnapshot {
    pub fn of(user: &User, fields: ProfileFields) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            bio: match fields {
                ProfileFields::Basic => None,
                ProfileFields::WithBio => Some(user.bio.clone()),
            },
        }
    }
}

/// Records that reference a user
pub trait Authored {
    /// Key the snapshot is serialized under
    const PROFILE_KEY: &'static str;

    fn owner_id(&self) -> Uuid;
}

impl Authored for Post {
    const PROFILE_KEY: &'static str = "author";

    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for Comment {
    const PROFILE_KEY: &'static str = "user";

    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

/// Users indexed by id, built once per request.
pub struct UserDirectory<'a> {
    by_id: HashMap<Uuid, &'a User>,
}

impl<'a> UserDirectory<'a> {
    pub fn new(users: &'a [User]) -> Self {
        Self {
            by_id: users.iter().map(|u| (u.id, u)).collect(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&'a User> {
        self.by_id.get(&id).copied()
    }

    pub fn snapshot(&self, id: Uuid, fields: ProfileFields) -> Option<AuthorSnapshot> {
        self.get(id).map(|user| AuthorSnapshot::of(user, fields))
    }
}

/// A record plus its owner's snapshot (or `None` for a dangling reference).
///
/// Serializes as the record's own fields with the snapshot added under
/// `T::PROFILE_KEY`.
#[derive(Debug, Clone, PartialEq)]
pub struct Enriched<T> {
    pub record: T,
    pub profile: Option<AuthorSnapshot>,
}

impl<T: Record> Record for Enriched<T> {
    fn id(&self) -> Uuid {
        self.record.id()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.record.created_at()
    }
}

impl<T: Authored + Serialize> Serialize for Enriched<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.record).map_err(S::Error::custom)?;
        let profile = serde_json::to_value(&self.profile).map_err(S::Error::custom)?;
        match value.as_object_mut() {
            Some(map) => {
                map.insert(T::PROFILE_KEY.to_string(), profile);
            }
            None => return Err(S::Error::custom("enriched record must serialize to an object")),
        }
        value.serialize(serializer)
    }
}

pub fn attach<T: Authored>(record: T, users: &UserDirectory<'_>, fields: ProfileFields) -> Enriched<T> {
    let profile = users.snapshot(record.owner_id(), fields);
    Enriched { record, profile }
}

pub fn enrich<T: Authored>(records: Vec<T>, users: &[User], fields: ProfileFields) -> Vec<Enriched<T>> {
    let directory = UserDirectory::new(users);
    records
        .into_iter()
        .map(|record| attach(record, &directory, fields))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> User {
        let mut user = User::new(
            name.to_string(),
            format!("{}@example.com", name),
            "$argon2id$secret-hash".to_string(),
        );
        user.bio = format!("{} writes things", name);
        user.avatar = Some(format!("/avatars/{}.png", name));
        user
    }

    fn post_by(author_id: Uuid) -> Post {
        Post::new(author_id, "t".into(), "c".into(), None, vec![], None)
    }

    #[test]
    fn test_missing_author_attaches_null() {
        let users = vec![user("ada")];
        let enriched = enrich(vec![post_by(Uuid::new_v4())], &users, ProfileFields::Basic);

        assert_eq!(enriched.len(), 1);
        assert!(enriched[0].profile.is_none());
        let json = serde_json::to_value(&enriched[0]).unwrap();
        assert!(json["author"].is_null());
        assert_eq!(json["title"], "t");
    }

    #[test]
    fn test_basic_snapshot_omits_bio_and_password() {
        let ada = user("ada");
        let users = vec![ada.clone()];
        let enriched = enrich(vec![post_by(ada.id)], &users, ProfileFields::Basic);

        let json = serde_json::to_value(&enriched[0]).unwrap();
        assert_eq!(json["author"]["username"], "ada");
        assert_eq!(json["author"]["avatar"], "/avatars/ada.png");
        assert!(json["author"].get("bio").is_none());
        assert!(json["author"].get("password").is_none());
        assert!(!json.to_string().contains("secret-hash"));
    }

    #[test]
    fn test_with_bio_snapshot() {
        let ada = user("ada");
        let directory_users = vec![ada.clone()];
        let directory = UserDirectory::new(&directory_users);
        let enriched = attach(post_by(ada.id), &directory, ProfileFields::WithBio);
        assert_eq!(
            enriched.profile.and_then(|p| p.bio).as_deref(),
            Some("ada writes things")
        );
    }

    #[test]
    fn test_comment_snapshot_key_is_user() {
        let ada = user("ada");
        let comment = Comment::new(Uuid::new_v4(), ada.id, "hi".into(), None);
        let users = vec![ada];
        let enriched = enrich(vec![comment], &users, ProfileFields::Basic);

        let json = serde_json::to_value(&enriched[0]).unwrap();
        assert_eq!(json["user"]["username"], "ada");
        assert!(json.get("author").is_none());
        assert_eq!(json["content"], "hi");
    }
}
