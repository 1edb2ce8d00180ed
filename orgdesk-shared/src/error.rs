/// Error types for the tenancy core
///
/// Two layers of errors live here:
///
/// - [`StoreError`]: what a [`TenancyStore`](crate::store::TenancyStore) reports.
///   It only knows about rows and constraints.
/// - [`TenancyError`]: what the resolver and the services report to callers.
///   Store errors are wrapped with the action that was being attempted.
///
/// Validation errors (`InvalidInput`, `Forbidden`, `Unauthenticated`) are
/// raised before the store is touched. Only `StoreUnavailable` is worth a
/// retry; constraint and query failures surface as `Storage`.

use uuid::Uuid;

use crate::models::membership::MembershipRole;

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result alias for resolver and service operations
pub type TenancyResult<T> = Result<T, TenancyError>;

/// Errors raised by a tenancy store implementation
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The datastore could not be reached or the query failed transiently
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    /// A foreign key rejected the write
    #[error("Foreign key violated: {constraint}")]
    ForeignKeyViolation { constraint: String },

    /// The conditional `accepted = false -> true` update matched no row
    #[error("Invite has already been accepted")]
    InviteAlreadyAccepted,

    /// The row targeted by the operation does not exist
    #[error("Row not found")]
    NotFound,

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Returns true when the error was raised by the named unique constraint
    pub fn is_unique_violation(&self, name: &str) -> bool {
        matches!(self, StoreError::UniqueViolation { constraint } if constraint == name)
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                match db_err.code().as_deref() {
                    // unique_violation
                    Some("23505") => StoreError::UniqueViolation { constraint },
                    // foreign_key_violation
                    Some("23503") => StoreError::ForeignKeyViolation { constraint },
                    _ => StoreError::Database(db_err.to_string()),
                }
            }
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Errors surfaced by the membership resolver and the tenancy services
#[derive(Debug, thiserror::Error)]
pub enum TenancyError {
    /// No authenticated identity accompanied the call
    #[error("Not authenticated")]
    Unauthenticated,

    /// The identity has no membership in any organization
    #[error("No organization found")]
    NoOrganization,

    /// The caller's role is below what the operation requires
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    Forbidden {
        required: MembershipRole,
        actual: MembershipRole,
    },

    /// Input failed validation
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Token/email pair does not match any invite
    #[error("Invalid invite")]
    InvalidInvite,

    /// Invite was already redeemed (possibly by a concurrent request)
    #[error("Invite has already been accepted")]
    AlreadyAccepted,

    /// The user already holds a membership
    #[error("User already belongs to an organization")]
    DuplicateMembership,

    /// A tenant-scoped row is not visible to the caller
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// Transient datastore failure; the attempted action is named
    #[error("Store unavailable while attempting to {action}: {source}")]
    StoreUnavailable {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    /// Permanent datastore failure (constraint or query error)
    #[error("Storage error while attempting to {action}: {source}")]
    Storage {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    /// Organization row exists (or existed) but the owner membership was not created
    #[error("Organization {org_id} was created but its owner membership was not: {reason}")]
    PartialFailure {
        org_id: Uuid,
        /// Whether the orphaned organization was deleted again
        orphan_removed: bool,
        reason: String,
    },
}

impl TenancyError {
    /// Shorthand for an `InvalidInput` error
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        TenancyError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Wraps a store error with the attempted action
    ///
    /// Only [`StoreError::Unavailable`] becomes `StoreUnavailable`.
    pub fn store(action: &'static str, source: StoreError) -> Self {
        match source {
            StoreError::Unavailable(_) => TenancyError::StoreUnavailable { action, source },
            source => TenancyError::Storage { action, source },
        }
    }

    /// Whether retrying the same call could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, TenancyError::StoreUnavailable { .. })
    }
}

/// Attaches the attempted action to a store result
pub(crate) trait StoreContext<T> {
    fn during(self, action: &'static str) -> TenancyResult<T>;
}

impl<T> StoreContext<T> for StoreResult<T> {
    fn during(self, action: &'static str) -> TenancyResult<T> {
        self.map_err(|source| TenancyError::store(action, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_store_errors_are_retryable() {
        let err = TenancyError::StoreUnavailable {
            action: "create project",
            source: StoreError::Unavailable("connection refused".to_string()),
        };
        assert!(err.is_retryable());

        assert!(!TenancyError::NoOrganization.is_retryable());
        assert!(!TenancyError::Unauthenticated.is_retryable());
        assert!(!TenancyError::invalid("name", "is required").is_retryable());
    }

    #[test]
    fn test_constraint_errors_are_not_retryable() {
        let err: TenancyResult<()> = Err(StoreError::UniqueViolation {
            constraint: "invites_token_key".to_string(),
        })
        .during("create invite");
        let err = err.unwrap_err();

        assert!(matches!(err, TenancyError::Storage { action: "create invite", .. }));
        assert!(!err.is_retryable());

        let err = TenancyError::store("create project", StoreError::Database("syntax".to_string()));
        assert!(!err.is_retryable());

        let err = TenancyError::store("create project", StoreError::Unavailable("timeout".to_string()));
        assert!(matches!(err, TenancyError::StoreUnavailable { .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = TenancyError::Forbidden {
            required: MembershipRole::Owner,
            actual: MembershipRole::Member,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient permissions: requires owner, has member"
        );

        let err = TenancyError::invalid("name", "must not be empty");
        assert_eq!(err.to_string(), "Invalid name: must not be empty");

        let err: TenancyResult<()> =
            Err(StoreError::Unavailable("timeout".to_string())).during("create task");
        assert!(err
            .unwrap_err()
            .to_string()
            .contains("while attempting to create task"));
    }

    #[test]
    fn test_unique_violation_match() {
        let err = StoreError::UniqueViolation {
            constraint: "memberships_user_key".to_string(),
        };
        assert!(err.is_unique_violation("memberships_user_key"));
        assert!(!err.is_unique_violation("invites_token_key"));
        assert!(!StoreError::NotFound.is_unique_violation("memberships_user_key"));
    }
}
