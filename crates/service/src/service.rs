//! The flow service handle and shared authorization/error plumbing.

use std::sync::Arc;

use investflow_store::{FlowStore, StoreError};
use investflow_types::config::ConfigError;
use investflow_types::validation::ValidationError;
use investflow_types::{
    Caller, EscrowAccountId, FlowConfig, FlowError, PaymentId, ReservationId, Result,
};

/// Investment flow service over a persistence collaborator `S`.
///
/// Cheap to clone; handlers typically hold one per request pipeline.
#[derive(Debug)]
pub struct FlowService<S> {
    store: Arc<S>,
    config: FlowConfig,
}

impl<S> Clone for FlowService<S> {
    fn clone(&self) -> Self {
        Self { store: Arc::clone(&self.store), config: self.config.clone() }
    }
}

impl<S: FlowStore> FlowService<S> {
    /// Creates a service over `store` with `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration fails validation.
    pub fn new(store: Arc<S>, config: FlowConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// Creates a service over `store` with the default configuration.
    #[must_use]
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self { store, config: FlowConfig::default() }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    /// Rejects callers that are not platform administrators.
    pub(crate) fn require_admin(caller: &Caller, operation: &str) -> Result<()> {
        if caller.is_admin() {
            Ok(())
        } else {
            Err(FlowError::Forbidden { reason: format!("{operation} requires an admin") })
        }
    }

    /// Rejects callers that are neither admins nor fundraisers.
    pub(crate) fn require_offering_manager(caller: &Caller, operation: &str) -> Result<()> {
        if caller.manages_offerings() {
            Ok(())
        } else {
            Err(FlowError::Forbidden {
                reason: format!("{operation} requires an admin or fundraiser"),
            })
        }
    }
}

/// Maps a validation failure to the service error type.
pub(crate) fn invalid(err: ValidationError) -> FlowError {
    FlowError::InvalidArgument { message: err.to_string() }
}

/// Maps store failures from read/list paths, which can only be backend
/// trouble.
#[track_caller]
pub(crate) fn map_storage_err(err: StoreError) -> FlowError {
    let loc = std::panic::Location::caller();
    let location = snafu::Location::new(loc.file(), loc.line(), loc.column());
    match err {
        StoreError::Backend { message } => FlowError::Storage { message, location },
        other => FlowError::Internal {
            message: format!("unexpected store error on read path: {other}"),
            location,
        },
    }
}

/// Maps store failures from reservation mutations, attaching the id.
pub(crate) fn map_reservation_err(id: ReservationId, err: StoreError) -> FlowError {
    match err {
        StoreError::NotFound { .. } => FlowError::ReservationNotFound { id },
        StoreError::TransitionConflict { entity, from, to } => {
            FlowError::TransitionConflict { entity: entity.to_string(), from, to }
        },
        other => map_storage_err(other),
    }
}

/// Maps store failures from payment mutations, attaching the id.
pub(crate) fn map_payment_err(id: PaymentId, err: StoreError) -> FlowError {
    match err {
        StoreError::NotFound { .. } => FlowError::PaymentNotFound { id },
        StoreError::TransitionConflict { entity, from, to } => {
            FlowError::TransitionConflict { entity: entity.to_string(), from, to }
        },
        other => map_storage_err(other),
    }
}

/// Maps store failures from escrow mutations, attaching the id.
pub(crate) fn map_escrow_err(id: EscrowAccountId, err: StoreError) -> FlowError {
    match err {
        StoreError::NotFound { .. } => FlowError::EscrowAccountNotFound { id },
        StoreError::TransitionConflict { entity, from, to } => {
            FlowError::TransitionConflict { entity: entity.to_string(), from, to }
        },
        StoreError::BalanceFloor { balance_cents, delta_cents } => {
            FlowError::BalanceFloor { id, balance_cents, delta_cents }
        },
        other => map_storage_err(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use investflow_store::MemoryStore;
    use investflow_types::{ErrorCode, Role, UserId};

    use super::*;
    use crate::testing;

    #[test]
    fn test_new_validates_config() {
        let config = FlowConfig { min_expiration_minutes: 0, ..Default::default() };
        let err = FlowService::new(Arc::new(MemoryStore::new()), config).unwrap_err();
        assert!(err.to_string().contains("invalid config"));
    }

    #[test]
    fn test_require_admin() {
        let admin = testing::admin(1);
        let investor = testing::investor(2);
        assert!(FlowService::<MemoryStore>::require_admin(&admin, "op").is_ok());
        let err = FlowService::<MemoryStore>::require_admin(&investor, "convert").unwrap_err();
        assert_eq!(err.code(), ErrorCode::Forbidden);
        assert!(err.to_string().contains("convert"));
    }

    #[test]
    fn test_require_offering_manager_admits_both_roles() {
        for caller in [testing::admin(1), testing::fundraiser(2)] {
            assert!(FlowService::<MemoryStore>::require_offering_manager(&caller, "op").is_ok());
        }
        let investor = investflow_types::Caller::new(UserId::new(3), Role::Investor, true);
        assert!(FlowService::<MemoryStore>::require_offering_manager(&investor, "op").is_err());
    }

    #[test]
    fn test_store_error_mapping() {
        let err = map_reservation_err(
            ReservationId::new(7),
            StoreError::NotFound { entity: "reservation" },
        );
        assert_eq!(err.code(), ErrorCode::ReservationNotFound);

        let err = map_payment_err(
            PaymentId::new(7),
            StoreError::TransitionConflict {
                entity: "payment",
                from: "verified".to_string(),
                to: "rejected".to_string(),
            },
        );
        assert_eq!(err.code(), ErrorCode::TransitionConflict);

        let err = map_escrow_err(
            EscrowAccountId::new(7),
            StoreError::BalanceFloor { balance_cents: 10, delta_cents: -20 },
        );
        assert_eq!(err.code(), ErrorCode::BalanceFloor);

        let err = map_storage_err(StoreError::Backend { message: "connection reset".to_string() });
        assert_eq!(err.code(), ErrorCode::StorageFailure);
        assert!(err.is_retryable());
    }
}
