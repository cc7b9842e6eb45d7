/// Store error type shared by every persistence backend
///
/// Backends translate their native failures into [`StoreError`] so the auth
/// flow can tell a uniqueness conflict apart from an I/O failure without
/// knowing which store is behind the trait object.

/// Error type for credential, task and session store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A user with the same normalized email already exists
    #[error("A user with this email already exists")]
    DuplicateEmail,

    /// Database query or connection failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some(constraint) if constraint.contains("email") => StoreError::DuplicateEmail,
                    _ => StoreError::Database(err),
                }
            }
            _ => StoreError::Database(err),
        }
    }
}

impl StoreError {
    /// Returns true if this error is a uniqueness conflict on the email column
    pub fn is_duplicate_email(&self) -> bool {
        matches!(self, StoreError::DuplicateEmail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_is_database_error() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Database(_)));
        assert!(!err.is_duplicate_email());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            StoreError::DuplicateEmail.to_string(),
            "A user with this email already exists"
        );
    }
}
