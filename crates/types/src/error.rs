//! Error types for the investment flow service using snafu.
//!
//! Defines a unified error type that captures:
//! - Authorization failures (role and ownership gates)
//! - Application errors (missing entities, rejected transitions)
//! - Storage errors (persistence collaborator failures)
//!
//! Each error variant maps to an [`ErrorCode`] with a unique numeric
//! identifier, retryability classification, and suggested recovery action.

use core::fmt;

use snafu::{Location, Snafu};

use crate::types::{EscrowAccountId, PaymentId, ReservationId};

/// Unified result type for flow operations.
pub type Result<T, E = FlowError> = std::result::Result<T, E>;

/// Machine-readable error codes for programmatic error handling.
///
/// Each [`FlowError`] variant maps to a unique numeric code. Codes are
/// organized into ranges:
///
/// | Range       | Domain        | Examples                                  |
/// |-------------|---------------|-------------------------------------------|
/// | 1000–1099   | Storage       | Persistence collaborator failure          |
/// | 2000–2099   | Authorization | Role gate, ownership gate, email gate     |
/// | 3100–3199   | Application   | Not-found, rejected transition, floor     |
/// | 3200–3299   | Application   | Invalid argument, internal                |
///
/// # Wire Format
///
/// Error codes are transmitted as the string representation of their numeric
/// value (e.g., `"2000"`) in error detail metadata. Use [`ErrorCode::as_u16`]
/// for serialization and [`ErrorCode::from_u16`] for deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // --- Storage errors (1000–1099) ---
    /// Persistence collaborator failed.
    StorageFailure = 1000,

    // --- Authorization errors (2000–2099) ---
    /// Caller lacks the required role or ownership.
    Forbidden = 2000,
    /// Caller's email address has not been verified.
    EmailUnverified = 2001,

    // --- Application errors (3100–3299) ---
    /// Reservation not found.
    ReservationNotFound = 3100,
    /// Payment not found.
    PaymentNotFound = 3101,
    /// Escrow account not found.
    EscrowAccountNotFound = 3102,
    /// Status transition rejected by the transition table.
    TransitionConflict = 3103,
    /// Escrow balance delta would breach the configured floor.
    BalanceFloor = 3104,
    /// Invalid request argument.
    InvalidArgument = 3200,
    /// Internal error (unexpected state, invariant violation).
    Internal = 3201,
}

impl ErrorCode {
    /// Returns the numeric code value.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Converts a numeric code to an `ErrorCode`, returning `None` for
    /// unknown values.
    #[must_use]
    pub fn from_u16(code: u16) -> Option<Self> {
        match code {
            1000 => Some(Self::StorageFailure),
            2000 => Some(Self::Forbidden),
            2001 => Some(Self::EmailUnverified),
            3100 => Some(Self::ReservationNotFound),
            3101 => Some(Self::PaymentNotFound),
            3102 => Some(Self::EscrowAccountNotFound),
            3103 => Some(Self::TransitionConflict),
            3104 => Some(Self::BalanceFloor),
            3200 => Some(Self::InvalidArgument),
            3201 => Some(Self::Internal),
            _ => None,
        }
    }

    /// Whether this error is retryable.
    ///
    /// Retryable errors may succeed on a subsequent attempt, typically after
    /// backoff. Non-retryable errors require corrective action first.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::StorageFailure)
    }

    /// Suggested recovery action for this error code.
    ///
    /// Returns a human-readable string describing what the caller should do.
    /// This guidance is stable and safe to display in UIs.
    #[must_use]
    pub const fn suggested_action(self) -> &'static str {
        match self {
            Self::StorageFailure => {
                "Retry with backoff. The persistence layer reported a failure."
            },
            Self::Forbidden => {
                "Use an account with the required role, or act only on your own records."
            },
            Self::EmailUnverified => {
                "Verify your email address, then retry the reservation."
            },
            Self::ReservationNotFound => "Check the reservation id; it does not exist.",
            Self::PaymentNotFound => "Check the payment id; it does not exist.",
            Self::EscrowAccountNotFound => "Check the escrow account id; it does not exist.",
            Self::TransitionConflict => {
                "Re-read the entity; its status already reached a terminal state."
            },
            Self::BalanceFloor => {
                "Reduce the withdrawal amount; the escrow balance cannot go negative."
            },
            Self::InvalidArgument => "Fix the request parameters and resubmit.",
            Self::Internal => {
                "Unexpected state or invariant violation. Collect context and report as an issue."
            },
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Top-level error type for investment flow operations.
///
/// All failures surface synchronously to the caller with both a
/// machine-readable [`ErrorCode`] and a human-readable message. Nothing is
/// retried internally, and no operation partially commits.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FlowError {
    /// Caller lacks the required role or ownership for the operation.
    #[snafu(display("Forbidden: {reason}"))]
    Forbidden {
        /// Short reason suitable for direct display.
        reason: String,
    },

    /// Caller must verify their email address before reserving shares.
    ///
    /// Carries actionable guidance rather than a bare denial.
    #[snafu(display("Email verification required: verify your email address to reserve shares"))]
    EmailUnverified,

    /// Reservation does not exist in the store.
    #[snafu(display("Reservation {id} not found"))]
    ReservationNotFound {
        /// Reservation identifier.
        id: ReservationId,
    },

    /// Payment does not exist in the store.
    #[snafu(display("Payment {id} not found"))]
    PaymentNotFound {
        /// Payment identifier.
        id: PaymentId,
    },

    /// Escrow account does not exist in the store.
    #[snafu(display("Escrow account {id} not found"))]
    EscrowAccountNotFound {
        /// Escrow account identifier.
        id: EscrowAccountId,
    },

    /// Status transition rejected by the entity's transition table.
    #[snafu(display("{entity} cannot transition from {from} to {to}"))]
    TransitionConflict {
        /// Entity kind ("reservation", "payment", "escrow account").
        entity: String,
        /// Current status.
        from: String,
        /// Requested status.
        to: String,
    },

    /// Escrow balance delta would drive the balance below the floor.
    #[snafu(display(
        "Escrow account {id}: delta {delta_cents} would drive balance {balance_cents} negative"
    ))]
    BalanceFloor {
        /// Escrow account identifier.
        id: EscrowAccountId,
        /// Balance before the delta, in cents.
        balance_cents: i64,
        /// Rejected delta, in cents.
        delta_cents: i64,
    },

    /// Invalid argument (malformed request parameter).
    #[snafu(display("Invalid argument: {message}"))]
    InvalidArgument {
        /// Error description.
        message: String,
    },

    /// Persistence collaborator failure.
    #[snafu(display("Storage error at {location}: {message}"))]
    Storage {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },

    /// Internal error (unexpected state, invariant violation).
    #[snafu(display("Internal error at {location}: {message}"))]
    Internal {
        /// Error description.
        message: String,
        /// Source location.
        #[snafu(implicit)]
        location: Location,
    },
}

impl FlowError {
    /// Returns the machine-readable error code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Forbidden { .. } => ErrorCode::Forbidden,
            Self::EmailUnverified => ErrorCode::EmailUnverified,
            Self::ReservationNotFound { .. } => ErrorCode::ReservationNotFound,
            Self::PaymentNotFound { .. } => ErrorCode::PaymentNotFound,
            Self::EscrowAccountNotFound { .. } => ErrorCode::EscrowAccountNotFound,
            Self::TransitionConflict { .. } => ErrorCode::TransitionConflict,
            Self::BalanceFloor { .. } => ErrorCode::BalanceFloor,
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Storage { .. } => ErrorCode::StorageFailure,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Whether this error is retryable. Delegates to
    /// [`ErrorCode::is_retryable`] for consistency with the wire format.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }

    /// Suggested recovery action. Delegates to
    /// [`ErrorCode::suggested_action`].
    #[must_use]
    pub const fn suggested_action(&self) -> &'static str {
        self.code().suggested_action()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    /// Returns all ErrorCode variants.
    fn all_error_codes() -> Vec<ErrorCode> {
        vec![
            ErrorCode::StorageFailure,
            ErrorCode::Forbidden,
            ErrorCode::EmailUnverified,
            ErrorCode::ReservationNotFound,
            ErrorCode::PaymentNotFound,
            ErrorCode::EscrowAccountNotFound,
            ErrorCode::TransitionConflict,
            ErrorCode::BalanceFloor,
            ErrorCode::InvalidArgument,
            ErrorCode::Internal,
        ]
    }

    #[test]
    fn test_error_code_numeric_uniqueness() {
        let mut seen = HashSet::new();
        for code in all_error_codes() {
            let numeric = code.as_u16();
            assert!(seen.insert(numeric), "Duplicate error code: {numeric} for {code:?}");
        }
    }

    #[test]
    fn test_error_code_round_trip() {
        for code in all_error_codes() {
            let numeric = code.as_u16();
            assert_eq!(
                ErrorCode::from_u16(numeric),
                Some(code),
                "Round-trip failed for {code:?} (numeric: {numeric})"
            );
        }
    }

    #[test]
    fn test_error_code_unknown_value_returns_none() {
        assert_eq!(ErrorCode::from_u16(0), None);
        assert_eq!(ErrorCode::from_u16(1500), None);
        assert_eq!(ErrorCode::from_u16(9999), None);
    }

    #[test]
    fn test_error_code_ranges() {
        assert!((1000..1100).contains(&ErrorCode::StorageFailure.as_u16()));
        for code in [ErrorCode::Forbidden, ErrorCode::EmailUnverified] {
            assert!(
                (2000..2100).contains(&code.as_u16()),
                "{code:?} not in authorization range"
            );
        }
        for code in [
            ErrorCode::ReservationNotFound,
            ErrorCode::PaymentNotFound,
            ErrorCode::EscrowAccountNotFound,
            ErrorCode::TransitionConflict,
            ErrorCode::BalanceFloor,
            ErrorCode::InvalidArgument,
            ErrorCode::Internal,
        ] {
            assert!(
                (3100..3300).contains(&code.as_u16()),
                "{code:?} not in application range"
            );
        }
    }

    #[test]
    fn test_only_storage_is_retryable() {
        for code in all_error_codes() {
            assert_eq!(
                code.is_retryable(),
                code == ErrorCode::StorageFailure,
                "unexpected retryability for {code:?}"
            );
        }
    }

    #[test]
    fn test_suggested_action_non_empty() {
        for code in all_error_codes() {
            assert!(!code.suggested_action().is_empty(), "{code:?} has empty suggested_action");
        }
    }

    #[test]
    fn test_error_display() {
        let err = FlowError::ReservationNotFound { id: ReservationId::new(42) };
        assert_eq!(err.to_string(), "Reservation rsv:42 not found");

        let err = FlowError::TransitionConflict {
            entity: "reservation".to_string(),
            from: "converted".to_string(),
            to: "cancelled".to_string(),
        };
        assert_eq!(err.to_string(), "reservation cannot transition from converted to cancelled");
    }

    #[test]
    fn test_email_unverified_carries_guidance() {
        let err = FlowError::EmailUnverified;
        assert!(err.to_string().contains("verify your email address"));
        assert_eq!(err.code(), ErrorCode::EmailUnverified);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_flow_error_code_mapping() {
        let cases: Vec<(FlowError, ErrorCode)> = vec![
            (FlowError::Forbidden { reason: String::new() }, ErrorCode::Forbidden),
            (FlowError::EmailUnverified, ErrorCode::EmailUnverified),
            (
                FlowError::ReservationNotFound { id: ReservationId::new(0) },
                ErrorCode::ReservationNotFound,
            ),
            (FlowError::PaymentNotFound { id: PaymentId::new(0) }, ErrorCode::PaymentNotFound),
            (
                FlowError::EscrowAccountNotFound { id: EscrowAccountId::new(0) },
                ErrorCode::EscrowAccountNotFound,
            ),
            (
                FlowError::TransitionConflict {
                    entity: String::new(),
                    from: String::new(),
                    to: String::new(),
                },
                ErrorCode::TransitionConflict,
            ),
            (
                FlowError::BalanceFloor {
                    id: EscrowAccountId::new(0),
                    balance_cents: 0,
                    delta_cents: 0,
                },
                ErrorCode::BalanceFloor,
            ),
            (FlowError::InvalidArgument { message: String::new() }, ErrorCode::InvalidArgument),
            (
                FlowError::Storage {
                    message: String::new(),
                    location: snafu::Location::new("", 0, 0),
                },
                ErrorCode::StorageFailure,
            ),
            (
                FlowError::Internal {
                    message: String::new(),
                    location: snafu::Location::new("", 0, 0),
                },
                ErrorCode::Internal,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.code(), expected, "code mismatch for {err:?}");
            // Every code must have a valid round-trip.
            assert!(ErrorCode::from_u16(err.code().as_u16()).is_some());
        }
    }

    #[test]
    fn test_retryability_matches_code() {
        let err = FlowError::Storage {
            message: "backend down".to_string(),
            location: snafu::Location::new("test.rs", 1, 1),
        };
        assert!(err.is_retryable());
        assert_eq!(err.is_retryable(), err.code().is_retryable());

        let err = FlowError::Forbidden { reason: "admins only".to_string() };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_suggested_action_delegates_to_code() {
        let err = FlowError::InvalidArgument { message: "bad".to_string() };
        assert_eq!(err.suggested_action(), err.code().suggested_action());
    }
}
