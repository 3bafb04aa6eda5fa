use anyhow::Context;

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use secrecy::{ExposeSecret, Secret};

use sqlx::PgExecutor;

use crate::auth::Credentials;
use crate::domain::EmailAddress;
use crate::error::{RestError, RestResult};
use crate::model::User;
use crate::repo::UsersRepo;
use crate::telemetry::spawn_blocking_with_tracing;

/// Check login credentials and return the matching user
#[tracing::instrument("Validate credentials", skip(credentials, executor))]
pub async fn validate_credentials<'con>(
    executor: impl PgExecutor<'con>,
    credentials: Credentials,
) -> RestResult<User> {
    let email: EmailAddress = credentials
        .email
        .parse()
        .map_err(|e: String| RestError::Unauthorized(anyhow::anyhow!(e)))?;

    let stored = UsersRepo::fetch_credentials_by_email(executor, &email)
        .await?
        .context("No user stored for email")
        .map_err(RestError::Unauthorized)?;

    let password = credentials.password;
    let password_hash = stored.password_hash;
    spawn_blocking_with_tracing(move || verify_password_hash(password, password_hash))
        .await
        .context("Failed to spawn blocking task")??;

    Ok(stored.user)
}

/// Hash a new password with a random salt on the blocking pool
#[tracing::instrument("Hash password", skip(password))]
pub async fn hash_password(password: Secret<String>) -> anyhow::Result<String> {
    spawn_blocking_with_tracing(move || {
        let salt = SaltString::generate(&mut rand::thread_rng());
        Argon2::default()
            .hash_password(password.expose_secret().as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
    })
    .await
    .context("Failed to spawn blocking task")?
}

#[tracing::instrument("Verify password hash", skip(password, password_hash))]
fn verify_password_hash(password: Secret<String>, password_hash: Secret<String>) -> RestResult<()> {
    let password_hash = PasswordHash::new(password_hash.expose_secret())
        .map_err(|e| anyhow::anyhow!("Failed to parse stored password hash: {}", e))?;

    Argon2::default()
        .verify_password(password.expose_secret().as_bytes(), &password_hash)
        .map_err(|e| RestError::Unauthorized(anyhow::anyhow!("Invalid password: {}", e)))
}
