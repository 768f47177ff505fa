// src/services/user_service.rs
use crate::{
    error::{AppError, AppResult},
    models::{
        outcome::{settle, OpResult},
        user::{Identity, NewUserForm, Role, User, UserSummary},
    },
    services::{auth_service, guard},
};
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_user_by_id(db_pool: &SqlitePool, user_id: i64) -> AppResult<Option<User>> {
    tracing::debug!("Fetching user by id: {}", user_id);
    let user = sqlx::query_as::<_, User>(
        "SELECT user_id, username, password_hash, role FROM users WHERE user_id = ?1",
    )
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

pub async fn find_user_by_username(
    db_pool: &SqlitePool,
    username: &str,
) -> AppResult<Option<User>> {
    tracing::debug!("Fetching user by username: {}", username);
    let user = sqlx::query_as::<_, User>(
        "SELECT user_id, username, password_hash, role FROM users WHERE username = ?1",
    )
    .bind(username)
    .fetch_optional(db_pool)
    .await?;
    Ok(user)
}

/// Admin view: every account except admins, by username.
pub async fn list_manageable_users(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
) -> AppResult<OpResult<Vec<UserSummary>>> {
    guard::require_role(identity, Role::Admin)?;

    let users = sqlx::query_as::<_, UserSummary>(
        r#"
        SELECT user_id, username, role
        FROM users
        WHERE role != 'Admin'
        ORDER BY username ASC
        "#,
    )
    .fetch_all(db_pool)
    .await?;
    tracing::debug!("Found {} manageable users.", users.len());
    Ok(OpResult::success(format!("{} users.", users.len()), users))
}

/// Inserts a user row inside the caller's transaction and returns its id.
pub(crate) async fn insert_user_row(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
    role: Role,
    taken_message: impl FnOnce() -> String,
) -> AppResult<i64> {
    let taken: Option<i64> = sqlx::query_scalar("SELECT user_id FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(&mut *conn)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(taken_message()));
    }

    // The unique index still settles a concurrent insert of the same name
    let user_id = sqlx::query(
        "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
    )
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .execute(&mut *conn)
    .await
    .map_err(|e| AppError::on_unique_violation(e, taken_message))?
    .last_insert_rowid();

    Ok(user_id)
}

pub async fn create_user(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    form: &NewUserForm,
    bcrypt_cost: u32,
) -> AppResult<OpResult<UserSummary>> {
    guard::require_role(identity, Role::Admin)?;
    tracing::info!("Creating user '{}' with role {}", form.username, form.role);

    settle(
        insert_new_user(db_pool, form, bcrypt_cost).await,
        "An unexpected error occurred",
    )
}

async fn insert_new_user(
    db_pool: &SqlitePool,
    form: &NewUserForm,
    bcrypt_cost: u32,
) -> AppResult<OpResult<UserSummary>> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return Err(AppError::Invalid("Username and password are required.".into()));
    }

    let password_hash = auth_service::hash_password(&form.password, bcrypt_cost).await?;

    let mut tx = db_pool.begin().await?;
    let user_id = insert_user_row(&mut *tx, username, &password_hash, form.role, || {
        format!("Username '{}' already exists.", username)
    })
    .await?;
    tx.commit().await?;

    tracing::info!("✅ User '{}' created (id {}).", username, user_id);
    Ok(OpResult::success(
        format!("Success! User '{}' created with role: {}.", username, form.role),
        UserSummary {
            user_id,
            username: username.to_string(),
            role: form.role,
        },
    ))
}

/// Removes a non-admin account and every row that references it.
pub async fn delete_user(
    db_pool: &SqlitePool,
    identity: Option<&Identity>,
    user_id: i64,
) -> AppResult<OpResult<()>> {
    guard::require_role(identity, Role::Admin)?;

    let user = find_user_by_id(db_pool, user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    if user.role == Role::Admin {
        tracing::warn!("Refusing to delete admin account '{}'", user.username);
        return Ok(OpResult::failure("Cannot delete the main admin account."));
    }

    settle(
        cascade_delete_user(db_pool, &user).await,
        &format!("Error deleting user {}", user.username),
    )
}

async fn cascade_delete_user(db_pool: &SqlitePool, user: &User) -> AppResult<OpResult<()>> {
    let user_id = user.user_id;
    let mut tx = db_pool.begin().await?;

    let enrollments = sqlx::query("DELETE FROM enrollments WHERE student_id = ?1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let registrations = sqlx::query("DELETE FROM event_registrations WHERE student_id = ?1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    let notifications = sqlx::query("DELETE FROM notifications WHERE user_id = ?1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    sqlx::query("DELETE FROM coordinators WHERE coord_id = ?1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE user_id = ?1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::info!(
        "✅ User '{}' deleted ({} enrollments, {} registrations, {} notifications).",
        user.username,
        enrollments,
        registrations,
        notifications
    );
    Ok(OpResult::success(
        format!(
            "Success! User '{}' and all associated records have been deleted.",
            user.username
        ),
        (),
    ))
}
