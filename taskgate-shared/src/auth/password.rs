/// Password hashing with Argon2id
///
/// Digests are PHC strings, so the algorithm, parameters and the per-call
/// random salt travel with the hash and `verify_password` needs nothing else.
///
/// # Parameters
///
/// - **Algorithm**: Argon2id, version 0x13
/// - **Memory**: 19 MiB (19456 KiB)
/// - **Iterations**: 2
/// - **Parallelism**: 1 lane
/// - **Salt**: 16 random bytes from the OS RNG
///
/// # Example
///
/// ```
/// use taskgate_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let digest = hash_password("p1")?;
/// assert!(verify_password("p1", &digest)?);
/// assert!(!verify_password("p2", &digest)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, ParamsBuilder, Version,
};
use std::sync::OnceLock;

const MEMORY_COST_KIB: u32 = 19_456;
const TIME_COST: u32 = 2;
const PARALLELISM: u32 = 1;

/// Digest checked when no account matches, so a miss costs one verification
static DUMMY_DIGEST: OnceLock<String> = OnceLock::new();

#[cfg(test)]
static DUMMY_VERIFICATIONS: std::sync::atomic::AtomicUsize =
    std::sync::atomic::AtomicUsize::new(0);

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Verification failed for a reason other than a wrong password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored digest is not a valid PHC string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(MEMORY_COST_KIB)
        .t_cost(TIME_COST)
        .p_cost(PARALLELISM)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with a fresh random salt
///
/// Hashing the same plaintext twice yields two different digests.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if the parameters are rejected or
/// hashing fails.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let digest = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(digest.to_string())
}

/// Verifies a password against a stored digest
///
/// The comparison is constant-time. A wrong password is `Ok(false)`; only a
/// digest that cannot be parsed or evaluated is an error.
///
/// # Errors
///
/// - `PasswordError::InvalidHash` if `digest` is not an Argon2id PHC string
///   carrying a salt and a hash output
/// - `PasswordError::VerifyError` for any other verification failure
pub fn verify_password(password: &str, digest: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    if parsed.algorithm != Algorithm::Argon2id.ident() {
        return Err(PasswordError::InvalidHash(format!(
            "Unsupported algorithm: {}",
            parsed.algorithm
        )));
    }
    if parsed.salt.is_none() || parsed.hash.is_none() {
        return Err(PasswordError::InvalidHash(
            "Missing salt or hash output".to_string(),
        ));
    }

    // Parameters come from the digest itself
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

fn dummy_digest() -> Result<&'static str, PasswordError> {
    if let Some(digest) = DUMMY_DIGEST.get() {
        return Ok(digest);
    }

    let digest = hash_password("taskgate-no-such-account")?;
    Ok(DUMMY_DIGEST.get_or_init(|| digest))
}

/// Verifies `password` against a fixed digest and discards the result
///
/// Used when no stored digest exists, so that path does the same Argon2 work
/// as a real check.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if the fixed digest cannot be created.
pub fn verify_dummy(password: &str) -> Result<(), PasswordError> {
    #[cfg(test)]
    DUMMY_VERIFICATIONS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

    verify_password(password, dummy_digest()?)?;
    Ok(())
}

/// Runs [`hash_password`] on the blocking thread pool
pub async fn hash_password_async(password: String) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::HashError(format!("Hashing task failed: {}", e)))?
}

/// Runs [`verify_password`] on the blocking thread pool
pub async fn verify_password_async(password: String, digest: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &digest))
        .await
        .map_err(|e| PasswordError::VerifyError(format!("Verification task failed: {}", e)))?
}

/// Runs [`verify_dummy`] on the blocking thread pool
pub async fn verify_dummy_async(password: String) -> Result<(), PasswordError> {
    tokio::task::spawn_blocking(move || verify_dummy(&password))
        .await
        .map_err(|e| PasswordError::VerifyError(format!("Verification task failed: {}", e)))?
}

/// Number of [`verify_dummy`] calls made so far in this test binary
#[cfg(test)]
pub(crate) fn dummy_verifications() -> usize {
    DUMMY_VERIFICATIONS.load(std::sync::atomic::Ordering::SeqCst)
}
