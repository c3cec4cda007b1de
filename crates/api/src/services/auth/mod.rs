//! Authentication service.
//!
//! Provides registration, password login with session tokens, security-answer
//! password reset, and profile updates.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use token::{TokenError, TokenKeys};

use serde::Deserialize;
use sqlx::PgPool;
use tracing::instrument;

use bazaar_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, ProfileChanges, UserRepository};
use crate::models::User;
use password::{hash_secret, verify_secret};

use super::non_blank;

/// Minimum length of a password set through a profile update.
pub const MIN_PROFILE_PASSWORD_LENGTH: usize = 6;

/// Registration request body.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub answer: Option<String>,
}

/// Login request body.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Password reset request body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordForm {
    pub email: Option<String>,
    pub answer: Option<String>,
    pub new_password: Option<String>,
}

/// Profile update request body. Email is not updatable.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    pub name: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenKeys,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenKeys) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Register a new consumer account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field is missing.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    #[instrument(skip_all)]
    pub async fn register(&self, form: &RegisterForm) -> Result<User, AuthError> {
        let name = required(form.name.as_deref(), "Name")?;
        let email = required(form.email.as_deref(), "Email")?;
        let password = required_secret(form.password.as_deref(), "Password")?;
        let phone = required(form.phone.as_deref(), "Phone")?;
        let address = required(form.address.as_deref(), "Address")?;
        let answer = required(form.answer.as_deref(), "Answer")?;

        let email = Email::parse(email)?;
        let password_hash = hash_secret(password)?;
        let answer_hash = hash_secret(answer)?;

        let user = self
            .users
            .create(&NewUser {
                name,
                email: &email,
                phone,
                address,
                password_hash: &password_hash,
                answer_hash: &answer_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password, returning the user and a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if either field is missing.
    /// Returns `AuthError::UserNotFound` if the email is malformed or not registered.
    /// Returns `AuthError::InvalidCredentials` if the password is wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, form: &LoginForm) -> Result<(User, String), AuthError> {
        let (Some(email), Some(password)) = (
            non_blank(form.email.as_deref()),
            form.password.as_deref().filter(|p| !p.trim().is_empty()),
        ) else {
            return Err(AuthError::Validation(
                "Both email and password are required".to_owned(),
            ));
        };

        let email = Email::parse(email).map_err(|_| AuthError::UserNotFound)?;
        let (user, secrets) = self
            .users
            .get_with_secrets(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_secret(password, &secrets.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    /// Reset a password after checking the security answer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a field is missing.
    /// Returns `AuthError::WrongEmailOrAnswer` if no account matches the pair.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, form: &ForgotPasswordForm) -> Result<(), AuthError> {
        let email = required(form.email.as_deref(), "Email")?;
        let answer = required(form.answer.as_deref(), "Answer")?;
        let new_password = required_secret(form.new_password.as_deref(), "New password")?;

        let Ok(email) = Email::parse(email) else {
            return Err(AuthError::WrongEmailOrAnswer);
        };

        let (user, secrets) = self
            .users
            .get_with_secrets(&email)
            .await?
            .ok_or(AuthError::WrongEmailOrAnswer)?;

        if !verify_secret(answer, &secrets.answer_hash) {
            return Err(AuthError::WrongEmailOrAnswer);
        }

        let password_hash = hash_secret(new_password)?;
        self.users.update_password(user.id, &password_hash).await?;

        tracing::info!(user_id = %user.id, "Password reset");
        Ok(())
    }

    /// Update the caller's profile. Absent or blank fields keep stored values.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` if a new password is too short.
    /// Returns `AuthError::Repository` with `NotFound` if the user was removed.
    #[instrument(skip(self, form))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        form: &ProfileForm,
    ) -> Result<User, AuthError> {
        let password = form.password.as_deref().filter(|p| !p.trim().is_empty());
        let password_hash = match password {
            Some(p) if p.chars().count() < MIN_PROFILE_PASSWORD_LENGTH => {
                return Err(AuthError::Validation(format!(
                    "Password must be at least {MIN_PROFILE_PASSWORD_LENGTH} characters long"
                )));
            }
            Some(p) => Some(hash_secret(p)?),
            None => None,
        };

        let user = self
            .users
            .update_profile(
                user_id,
                &ProfileChanges {
                    name: non_blank(form.name.as_deref()),
                    phone: non_blank(form.phone.as_deref()),
                    address: non_blank(form.address.as_deref()),
                    password_hash: password_hash.as_deref(),
                },
            )
            .await?;

        Ok(user)
    }
}

fn required<'v>(value: Option<&'v str>, field: &str) -> Result<&'v str, AuthError> {
    non_blank(value).ok_or_else(|| AuthError::Validation(format!("{field} is required")))
}

/// Like [`required`], but passwords are hashed exactly as typed.
fn required_secret<'v>(value: Option<&'v str>, field: &str) -> Result<&'v str, AuthError> {
    required(value, field)?;
    Ok(value.unwrap_or_default())
}
