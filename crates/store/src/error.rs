//! Error types for store operations.

use snafu::Snafu;

/// Errors returned by [`crate::FlowStore`] operations.
///
/// These are wrapped into the service-level error type when propagated, with
/// entity ids attached at the call site.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum StoreError {
    /// The referenced row does not exist.
    #[snafu(display("{entity} not found"))]
    NotFound {
        /// Entity kind ("reservation", "payment", "escrow account").
        entity: &'static str,
    },

    /// A conditional status write found the row in a state the condition
    /// rejects.
    #[snafu(display("{entity} cannot transition from {from} to {to}"))]
    TransitionConflict {
        /// Entity kind.
        entity: &'static str,
        /// Status the row currently holds.
        from: String,
        /// Status the write requested.
        to: String,
    },

    /// A balance delta would drive the accumulator below the floor.
    #[snafu(display("delta {delta_cents} would drive balance {balance_cents} below zero"))]
    BalanceFloor {
        /// Balance before the delta, in cents.
        balance_cents: i64,
        /// Rejected delta, in cents.
        delta_cents: i64,
    },

    /// The backing store failed (I/O, connection, transaction). Never
    /// produced by [`crate::MemoryStore`].
    #[snafu(display("backend error: {message}"))]
    Backend {
        /// Error description.
        message: String,
    },
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
