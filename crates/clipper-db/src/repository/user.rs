//! # User Repository
//!
//! Users and their roles. Authentication lives outside this crate; the
//! engine only needs to resolve an id to a role.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use clipper_core::{Role, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user.
    pub async fn insert(&self, user: &User) -> DbResult<()> {
        debug!(id = %user.id, role = ?user.role, "Inserting user");

        sqlx::query("INSERT INTO users (id, name, role, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&user.id)
            .bind(&user.name)
            .bind(user.role)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT id, name, role FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Lists users with the given role, by name.
    pub async fn list_by_role(&self, role: Role) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, name, role FROM users WHERE role = ?1 ORDER BY name",
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = fixtures::db().await;
        let barber = fixtures::user(&db, "Sam", Role::Worker).await;

        let found = db.users().get_by_id(&barber.id).await.unwrap().unwrap();
        assert_eq!(found.name, "Sam");
        assert_eq!(found.role, Role::Worker);

        assert!(db.users().get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_by_role() {
        let db = fixtures::db().await;
        fixtures::user(&db, "Zed", Role::Worker).await;
        fixtures::user(&db, "Ana", Role::Worker).await;
        fixtures::user(&db, "Cli", Role::Client).await;

        let barbers = db.users().list_by_role(Role::Worker).await.unwrap();
        let names: Vec<_> = barbers.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["Ana", "Zed"]);
    }
}
