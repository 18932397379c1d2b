use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{NewUser, Role, User, UserId};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    let user: User = sqlx::query_as("INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING *")
        .bind(user.name)
        .bind(user.email)
        .bind(user.role)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ User {} ({}) created with role {}", user.id, user.email, user.role);
    Ok(user)
}

pub async fn fetch_user(user_id: UserId, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(user)
}

/// Returns the user with the given role that has the lowest id.
pub async fn fetch_first_user_with_role(role: Role, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE role = $1 ORDER BY id LIMIT 1")
        .bind(role)
        .fetch_optional(conn)
        .await?;
    Ok(user)
}
