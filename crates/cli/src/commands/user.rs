//! User management commands.
//!
//! ```bash
//! sr-cli user create -e owner@example.com -n "Shop Owner" -p 'correct horse' --plan pro
//! ```

use stockroom_admin::db::RepositoryError;
use stockroom_admin::services::auth::{AuthError, AuthService};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur while managing users.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    /// The plan code does not exist.
    #[error("Unknown plan: {0}. Run `sr-cli plans list` to see the available plans")]
    UnknownPlan(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a user with a password, bypassing the sign-up page.
///
/// Applies the same email, name and password rules as registration.
///
/// # Errors
///
/// Returns an error if validation fails, the email is taken or the plan does
/// not exist.
pub async fn create(email: &str, name: &str, password: &str, plan: &str) -> Result<i32, UserError> {
    let pool = connect().await?;

    tracing::info!("Creating user: {email} (plan {plan})");

    let user = AuthService::new(&pool)
        .register_on_plan(email, name, password, plan)
        .await
        .map_err(|e| match e {
            AuthError::Repository(RepositoryError::NotFound) => {
                UserError::UnknownPlan(plan.to_owned())
            }
            other => UserError::Auth(other),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id.as_i32())
}
