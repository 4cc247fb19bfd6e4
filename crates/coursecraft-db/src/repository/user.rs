//! SurrealDB implementation of [`UserRepository`].

use chrono::{DateTime, Utc};
use coursecraft_core::error::CoreResult;
use coursecraft_core::models::user::{CreateUser, SocialProvider, User, UserRole};
use coursecraft_core::repository::UserRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{DbError, is_unique_violation};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct UserRow {
    email: String,
    username: String,
    password_hash: Option<String>,
    avatar_url: Option<String>,
    role: String,
    social: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    email: String,
    username: String,
    password_hash: Option<String>,
    avatar_url: Option<String>,
    role: String,
    social: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_role(s: &str) -> Result<UserRole, DbError> {
    match s {
        "Student" => Ok(UserRole::Student),
        "Instructor" => Ok(UserRole::Instructor),
        "Admin" => Ok(UserRole::Admin),
        other => Err(DbError::Migration(format!("unknown user role: {other}"))),
    }
}

fn role_to_string(role: &UserRole) -> &'static str {
    match role {
        UserRole::Student => "Student",
        UserRole::Instructor => "Instructor",
        UserRole::Admin => "Admin",
    }
}

fn parse_social(s: Option<&str>) -> Result<Option<SocialProvider>, DbError> {
    match s {
        None => Ok(None),
        Some(tag) => SocialProvider::parse(tag)
            .map(Some)
            .ok_or_else(|| DbError::Migration(format!("unknown social provider: {tag}"))),
    }
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            avatar_url: self.avatar_url,
            role: parse_role(&self.role)?,
            social: parse_social(self.social.as_deref())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(User {
            id,
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            avatar_url: self.avatar_url,
            role: parse_role(&self.role)?,
            social: parse_social(self.social.as_deref())?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, input: CreateUser) -> CoreResult<User> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 email = $email, \
                 username = $username, \
                 password_hash = $password_hash, \
                 avatar_url = $avatar_url, \
                 role = $role, \
                 social = $social",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", input.email))
            .bind(("username", input.username))
            .bind(("password_hash", input.password_hash))
            .bind(("avatar_url", input.avatar_url))
            .bind(("role", role_to_string(&input.role).to_string()))
            .bind(("social", input.social.map(|s| s.as_str().to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| {
            if is_unique_violation(&e) {
                DbError::AlreadyExists {
                    entity: "user".into(),
                }
            } else {
                DbError::Migration(e.to_string())
            }
        })?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> CoreResult<User> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('user', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, email: &str) -> CoreResult<User> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM user \
                 WHERE email = $email",
            )
            .bind(("email", email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> CoreResult<()> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('user', $id) SET \
                 password_hash = $password_hash, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("password_hash", password_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "user".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> CoreResult<()> {
        // Hard delete, cascading to the dependent rows.
        let id_str = id.to_string();

        self.db
            .query("DELETE type::record('user', $id)")
            .query("DELETE user_settings WHERE user_id = $user_id")
            .query("DELETE instructor_balance WHERE user_id = $user_id")
            .query("DELETE token WHERE user_id = $user_id")
            .bind(("id", id_str.clone()))
            .bind(("user_id", id_str))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
