use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User},
    error::AppResult,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, role, is_email_verified, \
     avatar_url, avatar_public_id, phone, address, deleted_at, created_at, updated_at";

/// Persistence for user records.
///
/// Lookups by id or email skip soft-deleted users. `email_exists` does not,
/// since a soft-deleted user still holds its address under the unique index.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn email_exists(&self, email: &str) -> AppResult<bool>;

    /// Inserts a user. A taken email yields `AppError::Duplicate`.
    async fn create(&self, new_user: NewUser) -> AppResult<User>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Flips the verification flag. Returns `false` when the user is missing,
    /// deleted or already verified.
    async fn mark_email_verified(&self, id: Uuid) -> AppResult<bool>;

    /// Stamps `deleted_at`. Returns `false` when there was nothing to delete.
    async fn soft_delete(&self, id: Uuid) -> AppResult<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(r#"SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)"#)
            .bind(email)
            .fetch_one(&self.db)
            .await?;
        Ok(exists)
    }

    async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.name)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .fetch_one(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn mark_email_verified(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
            SET is_email_verified = TRUE, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL AND is_email_verified = FALSE
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<bool> {
        let res = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;
        Ok(res.rows_affected() == 1)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use time::OffsetDateTime;
    use tokio::sync::RwLock;
    use uuid::Uuid;

    use super::UserStore;
    use crate::{
        auth::repo_types::{NewUser, Role, User},
        error::{AppError, AppResult},
    };

    /// In-process store with the same uniqueness rules as the `users` table.
    #[derive(Default)]
    pub struct MemoryUserStore {
        users: RwLock<HashMap<Uuid, User>>,
        stale_existence_check: bool,
    }

    impl MemoryUserStore {
        /// `email_exists` always answers `false`, so only `create` sees a
        /// taken email, as when two registrations interleave.
        pub fn with_stale_existence_check() -> Self {
            Self { stale_existence_check: true, ..Self::default() }
        }

        pub async fn count(&self) -> usize {
            self.users.read().await.len()
        }

        pub async fn get_raw(&self, id: Uuid) -> Option<User> {
            self.users.read().await.get(&id).cloned()
        }
    }

    #[async_trait]
    impl UserStore for MemoryUserStore {
        async fn email_exists(&self, email: &str) -> AppResult<bool> {
            if self.stale_existence_check {
                return Ok(false);
            }
            Ok(self.users.read().await.values().any(|u| u.email == email))
        }

        async fn create(&self, new_user: NewUser) -> AppResult<User> {
            let mut users = self.users.write().await;
            if users.values().any(|u| u.email == new_user.email) {
                return Err(AppError::Duplicate { fields: vec!["email".into()] });
            }
            let now = OffsetDateTime::now_utc();
            let user = User {
                id: Uuid::new_v4(),
                name: new_user.name,
                email: new_user.email,
                password_hash: new_user.password_hash,
                role: Role::User,
                is_email_verified: false,
                avatar_url: None,
                avatar_public_id: None,
                phone: None,
                address: None,
                deleted_at: None,
                created_at: now,
                updated_at: now,
            };
            users.insert(user.id, user.clone());
            Ok(user)
        }

        async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
            Ok(self
                .users
                .read()
                .await
                .get(&id)
                .filter(|u| u.deleted_at.is_none())
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
            Ok(self
                .users
                .read()
                .await
                .values()
                .find(|u| u.email == email && u.deleted_at.is_none())
                .cloned())
        }

        async fn mark_email_verified(&self, id: Uuid) -> AppResult<bool> {
            let mut users = self.users.write().await;
            match users.get_mut(&id) {
                Some(u) if u.deleted_at.is_none() && !u.is_email_verified => {
                    u.is_email_verified = true;
                    u.updated_at = OffsetDateTime::now_utc();
                    Ok(true)
                }
                _ => Ok(false),
            }
        }

        async fn soft_delete(&self, id: Uuid) -> AppResult<bool> {
            let mut users = self.users.write().await;
            match users.get_mut(&id) {
                Some(u) if u.deleted_at.is_none() => {
                    let now = OffsetDateTime::now_utc();
                    u.deleted_at = Some(now);
                    u.updated_at = now;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
    }

    mod tests {
        use super::*;

        fn new_user(email: &str) -> NewUser {
            NewUser {
                name: "Ada".into(),
                email: email.into(),
                password_hash: "$argon2id$fake".into(),
            }
        }

        #[tokio::test]
        async fn create_rejects_duplicate_email() {
            let store = MemoryUserStore::default();
            store.create(new_user("a@x.com")).await.unwrap();
            let err = store.create(new_user("a@x.com")).await.unwrap_err();
            assert!(matches!(err, AppError::Duplicate { .. }));
            assert_eq!(store.count().await, 1);
        }

        #[tokio::test]
        async fn verification_flips_once() {
            let store = MemoryUserStore::default();
            let user = store.create(new_user("a@x.com")).await.unwrap();
            assert!(!user.is_email_verified);
            assert!(store.mark_email_verified(user.id).await.unwrap());
            assert!(!store.mark_email_verified(user.id).await.unwrap());
            assert!(store.find_by_id(user.id).await.unwrap().unwrap().is_email_verified);
        }

        #[tokio::test]
        async fn soft_deleted_users_are_hidden_but_keep_their_email() {
            let store = MemoryUserStore::default();
            let user = store.create(new_user("a@x.com")).await.unwrap();
            assert!(store.soft_delete(user.id).await.unwrap());
            assert!(!store.soft_delete(user.id).await.unwrap());

            assert!(store.find_by_id(user.id).await.unwrap().is_none());
            assert!(store.find_by_email("a@x.com").await.unwrap().is_none());
            assert!(store.email_exists("a@x.com").await.unwrap());
            assert!(!store.mark_email_verified(user.id).await.unwrap());
            assert!(store.get_raw(user.id).await.unwrap().deleted_at.is_some());
        }
    }
}
