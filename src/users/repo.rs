use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::{auth::claims::Role, error::ApiError};

/// Account record. The password hash never crosses the serialization
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub department: String,
    pub tech_stack: Vec<String>,
    pub role: Role,
    pub reporting_manager_id: Option<i64>,
    pub created_at: OffsetDateTime,
}

/// Fields required to insert an account.
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub department: &'a str,
    pub tech_stack: &'a [String],
    pub role: Role,
}

/// Reporting view row: account joined with its manager's display name.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EmployeeRow {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department: String,
    pub tech_stack: Vec<String>,
    pub reporting_manager_id: Option<i64>,
    pub reporting_manager: Option<String>,
    pub created_at: OffsetDateTime,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, password_hash, department, tech_stack, role,
                   reporting_manager_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, user_id: i64) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, password_hash, department, tech_stack, role,
                   reporting_manager_id, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new account. A concurrent registration with the same email
    /// loses on the unique constraint and surfaces as `DuplicateEmail`.
    pub async fn create(db: &PgPool, new: NewUser<'_>) -> Result<User, ApiError> {
        let res = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash, department, tech_stack, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING user_id, name, email, password_hash, department, tech_stack, role,
                      reporting_manager_id, created_at
            "#,
        )
        .bind(new.name)
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.department)
        .bind(new.tech_stack)
        .bind(new.role)
        .fetch_one(db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(ApiError::DuplicateEmail)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn set_manager(
        db: &PgPool,
        user_id: i64,
        manager_id: Option<i64>,
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET reporting_manager_id = $2
            WHERE user_id = $1
            RETURNING user_id, name, email, password_hash, department, tech_stack, role,
                      reporting_manager_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(manager_id)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("User"))
    }

    pub async fn set_tech_stack(
        db: &PgPool,
        user_id: i64,
        tech_stack: &[String],
    ) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET tech_stack = $2
            WHERE user_id = $1
            RETURNING user_id, name, email, password_hash, department, tech_stack, role,
                      reporting_manager_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(tech_stack)
        .fetch_optional(db)
        .await?
        .ok_or(ApiError::NotFound("User"))
    }

    /// Delete an account and, in the same transaction, point every direct
    /// report at nobody. The FK's ON DELETE SET NULL backs the same policy.
    pub async fn delete(db: &PgPool, user_id: i64) -> Result<(), ApiError> {
        let mut tx = db.begin().await?;

        sqlx::query("UPDATE users SET reporting_manager_id = NULL WHERE reporting_manager_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        if deleted.rows_affected() == 0 {
            return Err(ApiError::NotFound("User"));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Reporting view: every account with its manager's display name,
    /// oldest first.
    pub async fn list_with_manager(db: &PgPool) -> Result<Vec<EmployeeRow>, ApiError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            r#"
            SELECT u.user_id, u.name, u.email, u.role, u.department, u.tech_stack,
                   u.reporting_manager_id, m.name AS reporting_manager, u.created_at
            FROM users u
            LEFT JOIN users m ON m.user_id = u.reporting_manager_id
            ORDER BY u.created_at ASC, u.user_id ASC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Parent adjacency: the manager an account reports to, if any.
    pub async fn manager_of(db: &PgPool, user_id: i64) -> Result<Option<i64>, ApiError> {
        let parent: Option<Option<i64>> =
            sqlx::query_scalar("SELECT reporting_manager_id FROM users WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(db)
                .await?;
        Ok(parent.flatten())
    }

    /// Child adjacency: accounts reporting directly to the given account.
    pub async fn direct_reports(db: &PgPool, user_id: i64) -> Result<Vec<User>, ApiError> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, password_hash, department, tech_stack, role,
                   reporting_manager_id, created_at
            FROM users
            WHERE reporting_manager_id = $1
            ORDER BY user_id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Walk the manager chain upward from `manager_id`; assigning it under
    /// `user_id` creates a cycle iff the walk reaches `user_id`. The chain is
    /// acyclic before the assignment, so the walk terminates.
    pub async fn would_create_cycle(
        db: &PgPool,
        user_id: i64,
        manager_id: i64,
    ) -> Result<bool, ApiError> {
        if user_id == manager_id {
            return Ok(true);
        }
        let mut cursor = Self::manager_of(db, manager_id).await?;
        while let Some(ancestor) = cursor {
            if ancestor == user_id {
                return Ok(true);
            }
            cursor = Self::manager_of(db, ancestor).await?;
        }
        Ok(false)
    }
}
