/// Registration and login
///
/// [`AuthFlow`] ties the credential store, the password hasher and the
/// session manager together. It holds no per-user state: every call works
/// only from its input and the stores.
///
/// Login never reveals which check failed. An unknown email, a wrong password
/// and an empty form all produce [`AuthError::InvalidCredentials`].

use std::sync::Arc;
use validator::Validate;

use super::password::{self, PasswordError};
use super::session::{SessionManager, SessionToken};
use crate::error::StoreError;
use crate::models::session::Identity;
use crate::models::user::{normalize_email, normalize_role, CreateUser, User, UserStore};

/// Message shown for every failed login
pub const INVALID_CREDENTIALS_MESSAGE: &str = "login or password is incorrect";

/// Error type for the auth flow
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Input is missing or malformed
    #[error("{0}")]
    Validation(String),

    /// The normalized email is already registered
    #[error("user exists")]
    DuplicateEmail,

    /// Unknown email or wrong password
    #[error("login or password is incorrect")]
    InvalidCredentials,

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateEmail,
            other => AuthError::Store(other),
        }
    }
}

/// Raw registration input
#[derive(Debug, Clone, Default)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub role: Option<String>,
}

/// Raw login input
#[derive(Debug, Clone, Default)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Registration input after normalization
#[derive(Debug, Validate)]
struct NewAccount {
    #[validate(email(message = "a valid email is required"))]
    email: String,

    #[validate(length(min = 1, message = "password is required"))]
    password: String,

    role: String,
}

impl NewAccount {
    fn from_input(input: RegisterInput) -> Result<Self, AuthError> {
        let account = Self {
            email: normalize_email(&input.email),
            password: input.password.trim().to_string(),
            role: normalize_role(input.role.as_deref()),
        };

        account.validate().map_err(|e| {
            let fields = e.field_errors();
            let message = ["email", "password"]
                .iter()
                .filter_map(|field| fields.get(*field))
                .flat_map(|errors| errors.iter())
                .filter_map(|error| error.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| "invalid registration".to_string());
            AuthError::Validation(message)
        })?;

        Ok(account)
    }
}

/// Orchestrates registration and login
#[derive(Clone)]
pub struct AuthFlow {
    users: Arc<dyn UserStore>,
    sessions: SessionManager,
}

impl AuthFlow {
    pub fn new(users: Arc<dyn UserStore>, sessions: SessionManager) -> Self {
        Self { users, sessions }
    }

    /// Registers a new account
    ///
    /// # Errors
    ///
    /// - `AuthError::Validation` for a missing/invalid email or empty password
    /// - `AuthError::DuplicateEmail` if the normalized email is taken, whether
    ///   caught by the lookup or by the store's unique constraint
    pub async fn register(&self, input: RegisterInput) -> Result<User, AuthError> {
        let account = NewAccount::from_input(input)?;

        // Fast path only; the store's unique constraint is authoritative
        if self.users.find_by_email(&account.email).await?.is_some() {
            tracing::info!(email = %account.email, "Registration rejected: email taken");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = password::hash_password_async(account.password).await?;

        let user = self
            .users
            .insert(CreateUser {
                email: account.email,
                password_hash,
                role: account.role,
            })
            .await
            .map_err(|e| {
                if e.is_duplicate_email() {
                    tracing::info!("Registration lost insert race on email");
                }
                AuthError::from(e)
            })?;

        tracing::info!(email = %user.email, role = %user.role, "User registered");
        Ok(user)
    }

    /// Checks credentials and opens a session
    ///
    /// # Errors
    ///
    /// `AuthError::InvalidCredentials` for any credential problem. Store and
    /// hashing failures propagate as their own variants.
    pub async fn login(&self, input: LoginInput) -> Result<(Identity, SessionToken), AuthError> {
        let email = normalize_email(&input.email);
        let password = input.password.trim().to_string();

        if email.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(user) = self.users.find_by_email(&email).await? else {
            // Same Argon2 cost as a wrong password
            password::verify_dummy_async(password).await?;
            tracing::info!("Login failed");
            return Err(AuthError::InvalidCredentials);
        };

        if !password::verify_password_async(password, user.password_hash).await? {
            tracing::info!("Login failed");
            return Err(AuthError::InvalidCredentials);
        }

        let identity = Identity {
            email: user.email,
            role: user.role,
        };
        let token = self.sessions.create(identity.clone()).await?;

        Ok((identity, token))
    }
}
