//! User CRUD operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::User;

const USER_COLUMNS: &str = "id, name, email, password_hash, google_id, created_at, updated_at";

/// Insert a new user and return the stored row.
///
/// Fails with [`DatabaseError::AlreadyExists`] when the email or Google id
/// is already taken.
pub async fn create_user(pool: &SqlitePool, user: &User) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, google_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.google_id)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::unique(e, "User", &user.email))?;

    get_user(pool, &user.id).await
}

/// Get a user by ID.
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound {
            entity: "User",
            key: id.to_string(),
        })
}

/// Look up a user by email (case-insensitive).
pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Look up a user by their Google subject id.
pub async fn find_user_by_google_id(pool: &SqlitePool, google_id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE google_id = ?"
    ))
    .bind(google_id)
    .fetch_optional(pool)
    .await?;

    Ok(user)
}

/// Overwrite the mutable fields of an existing user and return the new row.
pub async fn update_user(pool: &SqlitePool, user: &User) -> Result<User> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET name = ?, email = ?, password_hash = ?, google_id = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.google_id)
    .bind(&user.id)
    .execute(pool)
    .await
    .map_err(|e| DatabaseError::unique(e, "User", &user.email))?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "User",
            key: user.id.clone(),
        });
    }

    get_user(pool, &user.id).await
}

/// Attach a Google subject id to an existing user.
///
/// Linking the same id again is a no-op. A row already linked to a
/// different Google account is never relinked, and a Google id already
/// owned by another row is a [`DatabaseError::Conflict`].
pub async fn link_google_id(pool: &SqlitePool, id: &str, google_id: &str) -> Result<User> {
    let current = get_user(pool, id).await?;
    match current.google_id.as_deref() {
        Some(existing) if existing == google_id => return Ok(current),
        Some(_) => {
            return Err(DatabaseError::Conflict(format!(
                "user {} is already linked to another Google account",
                id
            )))
        }
        None => {}
    }

    let result = sqlx::query(
        r#"
        UPDATE users
        SET google_id = ?, updated_at = datetime('now')
        WHERE id = ? AND google_id IS NULL
        "#,
    )
    .bind(google_id)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| match DatabaseError::unique(e, "User", google_id) {
        DatabaseError::AlreadyExists { .. } => DatabaseError::Conflict(format!(
            "Google account {} is linked to another user",
            google_id
        )),
        other => other,
    })?;

    // Linked or deleted between the read and the update.
    if result.rows_affected() == 0 {
        return Err(DatabaseError::Conflict(format!(
            "user {} changed while linking",
            id
        )));
    }

    get_user(pool, id).await
}

/// Delete a user by ID, returning the removed row.
pub async fn delete_user(pool: &SqlitePool, id: &str) -> Result<User> {
    sqlx::query_as::<_, User>(&format!(
        "DELETE FROM users WHERE id = ? RETURNING {USER_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "User",
        key: id.to_string(),
    })
}

/// Count total users.
pub async fn count_users(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
