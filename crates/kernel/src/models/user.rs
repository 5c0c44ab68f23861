//! User accounts and CRUD operations.

use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::content::{FieldError, Language, is_valid_email};

/// Shortest accepted password.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest accepted username.
pub const MAX_NAME_LENGTH: usize = 60;

/// Status value of an active account; 0 means blocked.
pub const STATUS_ACTIVE: i16 = 1;

/// User record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    #[serde(skip_serializing)]
    pub pass: String,
    pub mail: String,
    pub is_admin: bool,
    pub status: i16,
    /// Preferred admin language.
    pub language: Option<String>,
    pub created: DateTime<Utc>,
    pub login: Option<DateTime<Utc>>,
}

/// Input for creating a new user.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub password: String,
    pub mail: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Input for updating a user. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub mail: Option<String>,
    pub is_admin: Option<bool>,
    pub status: Option<i16>,
    pub language: Option<String>,
    /// New password; empty keeps the current one.
    pub password: Option<String>,
}

impl CreateUser {
    /// Field errors for this input, empty when valid.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_name(&self.name, &mut errors);
        check_mail(&self.mail, &mut errors);
        check_password(&self.password, &mut errors);
        errors
    }
}

impl UpdateUser {
    /// Field errors for the fields present in this input.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Some(name) = &self.name {
            check_name(name, &mut errors);
        }
        if let Some(mail) = &self.mail {
            check_mail(mail, &mut errors);
        }
        if let Some(password) = self.password.as_deref().filter(|p| !p.is_empty()) {
            check_password(password, &mut errors);
        }
        if let Some(status) = self.status
            && !(0..=1).contains(&status)
        {
            errors.push(FieldError::new("status", "Status must be 0 or 1."));
        }
        if let Some(language) = &self.language
            && Language::parse(language).is_none()
        {
            errors.push(FieldError::new("language", "Unsupported language."));
        }
        errors
    }
}

fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    let name = name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "Username is required."));
    } else if name.chars().count() > MAX_NAME_LENGTH {
        errors.push(FieldError::new(
            "name",
            format!("Username must be at most {MAX_NAME_LENGTH} characters."),
        ));
    }
}

fn check_mail(mail: &str, errors: &mut Vec<FieldError>) {
    if !is_valid_email(mail.trim()) {
        errors.push(FieldError::new("mail", "Enter a valid email address."));
    }
}

fn check_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(FieldError::new(
            "password",
            format!("Password must be at least {MIN_PASSWORD_LENGTH} characters."),
        ));
    }
}

impl User {
    /// Check if this user is active.
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by id")?;

        Ok(user)
    }

    /// Find a user by username.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE name = $1")
            .bind(name)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by name")?;

        Ok(user)
    }

    /// Find a user by email.
    pub async fn find_by_mail(pool: &PgPool, mail: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(mail) = lower($1)")
            .bind(mail)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by mail")?;

        Ok(user)
    }

    /// Create a new user.
    pub async fn create(pool: &PgPool, input: CreateUser) -> Result<Self> {
        let id = Uuid::now_v7();
        let pass = hash_password(&input.password)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, pass, mail, is_admin)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(&pass)
        .bind(input.mail.trim())
        .bind(input.is_admin)
        .fetch_one(pool)
        .await
        .context("failed to create user")?;

        Ok(user)
    }

    /// Update a user's profile fields, and the password when one is given.
    ///
    /// Both changes commit together.
    pub async fn update(pool: &PgPool, id: Uuid, input: &UpdateUser) -> Result<Option<Self>> {
        let pass = match input.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let mut tx = pool.begin().await.context("failed to start transaction")?;

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                name = COALESCE($1, name),
                mail = COALESCE($2, mail),
                is_admin = COALESCE($3, is_admin),
                status = COALESCE($4, status),
                language = COALESCE($5, language)
            WHERE id = $6
            RETURNING *
            "#,
        )
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.mail.as_deref().map(str::trim))
        .bind(input.is_admin)
        .bind(input.status)
        .bind(input.language.as_deref())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to update user")?;

        let Some(mut user) = user else {
            return Ok(None);
        };

        if let Some(pass) = pass {
            store_password(&mut tx, id, &pass).await?;
            user.pass = pass;
        }

        tx.commit().await.context("failed to commit transaction")?;
        Ok(Some(user))
    }

    /// Update the user's password.
    pub async fn update_password(pool: &PgPool, id: Uuid, new_password: &str) -> Result<bool> {
        let pass = hash_password(new_password)?;
        let mut conn = pool.acquire().await.context("failed to acquire connection")?;
        store_password(&mut conn, id, &pass).await
    }

    /// Update the user's last login time.
    pub async fn touch_login(pool: &PgPool, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET login = NOW() WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to update login time")?;

        Ok(())
    }

    /// List users with pagination.
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY name LIMIT $1 OFFSET $2")
                .bind(limit)
                .bind(offset)
                .fetch_all(pool)
                .await
                .context("failed to list users")?;

        Ok(users)
    }

    /// Count all users.
    pub async fn count(pool: &PgPool) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .context("failed to count users")?;

        Ok(count)
    }

    /// Delete a user.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await
            .context("failed to delete user")?;

        Ok(result.rows_affected() > 0)
    }

    /// Verify a password against this user's hash.
    pub fn verify_password(&self, password: &str) -> bool {
        if self.pass.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(&self.pass) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

/// Hash a password using Argon2id.
async fn store_password(conn: &mut PgConnection, id: Uuid, pass: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE users SET pass = $1 WHERE id = $2")
        .bind(pass)
        .bind(id)
        .execute(conn)
        .await
        .context("failed to update password")?;

    Ok(result.rows_affected() > 0)
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn user_with_password(password: &str) -> User {
        User {
            id: Uuid::now_v7(),
            name: "editor".into(),
            pass: hash_password(password).unwrap(),
            mail: "editor@example.vn".into(),
            is_admin: false,
            status: STATUS_ACTIVE,
            language: None,
            created: Utc::now(),
            login: None,
        }
    }

    #[test]
    fn test_password_hashing() {
        let user = user_with_password("test_password_123");

        // Hash should start with Argon2 identifier
        assert!(user.pass.starts_with("$argon2"));
        assert!(user.verify_password("test_password_123"));
        assert!(!user.verify_password("wrong_password"));
    }

    #[test]
    fn empty_hash_never_verifies() {
        let mut user = user_with_password("whatever1");
        user.pass.clear();
        assert!(!user.verify_password(""));
    }

    #[test]
    fn hash_is_not_serialized() {
        let user = user_with_password("secret-pass");
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("pass").is_none());
        assert_eq!(json["name"], "editor");
    }

    #[test]
    fn create_input_validation() {
        let input = CreateUser {
            name: " ".into(),
            password: "short".into(),
            mail: "not-an-email".into(),
            is_admin: false,
        };
        let fields: Vec<_> = input.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(fields, ["name", "mail", "password"]);

        let input = CreateUser {
            name: "lan".into(),
            password: "long enough".into(),
            mail: "lan@example.vn".into(),
            is_admin: true,
        };
        assert!(input.validate().is_empty());
    }

    #[test]
    fn update_validation_checks_present_fields_only() {
        assert!(UpdateUser::default().validate().is_empty());

        let input = UpdateUser {
            password: Some(String::new()),
            ..Default::default()
        };
        assert!(input.validate().is_empty());

        let input = UpdateUser {
            status: Some(7),
            language: Some("fr".into()),
            ..Default::default()
        };
        assert_eq!(input.validate().len(), 2);
    }
}
