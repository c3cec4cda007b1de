//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use bazaar_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::User;

const USER_COLUMNS: &str =
    "id, name, email, phone, address, role, created_at, updated_at";

/// Fields required to insert a user. Hashes are computed by the caller.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a Email,
    pub phone: &'a str,
    pub address: &'a str,
    pub password_hash: &'a str,
    pub answer_hash: &'a str,
}

/// Profile fields to overwrite. `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ProfileChanges<'a> {
    pub name: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub password_hash: Option<&'a str>,
}

/// Stored hashes for a user, used by login and password reset.
#[derive(Debug)]
pub struct UserSecrets {
    pub password_hash: String,
    pub answer_hash: String,
}

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    address: String,
    role: UserRole,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            phone: row.phone,
            address: row.address,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithSecretsRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
    answer_hash: String,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new consumer account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, new_user: &NewUser<'_>) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO shop.users (name, email, phone, address, password_hash, answer_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(new_user.name)
        .bind(new_user.email.as_str())
        .bind(new_user.phone)
        .bind(new_user.address)
        .bind(new_user.password_hash)
        .bind(new_user.answer_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email already exists"))?;

        row.try_into()
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the email in the database is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their stored hashes.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_with_secrets(
        &self,
        email: &Email,
    ) -> Result<Option<(User, UserSecrets)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithSecretsRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash, answer_hash FROM shop.users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| {
            let secrets = UserSecrets {
                password_hash: r.password_hash,
                answer_hash: r.answer_hash,
            };
            User::try_from(r.user).map(|user| (user, secrets))
        })
        .transpose()
    }

    /// Look up the role of a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_role(&self, id: UserId) -> Result<Option<UserRole>, RepositoryError> {
        let role = sqlx::query_scalar::<_, UserRole>("SELECT role FROM shop.users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(role)
    }

    /// Overwrite a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.users SET password_hash = $2, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Apply profile changes, keeping stored values for absent fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges<'_>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE shop.users
            SET name = COALESCE($2, name),
                phone = COALESCE($3, phone),
                address = COALESCE($4, address),
                password_hash = COALESCE($5, password_hash),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.phone)
        .bind(changes.address)
        .bind(changes.password_hash)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Set the role of the user with the given email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has that email.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_role(&self, email: &Email, role: UserRole) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE shop.users
            SET role = $2, updated_at = now()
            WHERE email = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(email.as_str())
        .bind(role)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }
}
