//! Investment flow service: share reservations, investor eligibility,
//! payment verification, and escrow accounts.
//!
//! [`FlowService`] is a stateless request/response handler. Every operation
//! takes the authenticated [`Caller`](investflow_types::Caller) as an
//! explicit parameter and performs its own authorization before touching the
//! store; there is no ambient session state. Failures surface synchronously
//! as [`FlowError`](investflow_types::FlowError) values carrying a numeric
//! code and a displayable message.
//!
//! Operations are grouped into four namespaces, one module each:
//! - [`reservations`] — time-boxed share holds (create, read, cancel,
//!   convert)
//! - [`eligibility`] — per-(user, offering) investment permission records
//! - [`payments`] — funds submitted against investments, gated behind admin
//!   verification
//! - [`escrow`] — per-offering holding accounts with admin-controlled
//!   lifecycle and balance

pub mod eligibility;
pub mod escrow;
pub mod payments;
pub mod reservations;
pub mod service;

pub use eligibility::{AdminEligibilityOverride, SelfEligibilityCheck};
pub use escrow::{CreateEscrowAccount, CreatedEscrowAccount};
pub use payments::{CreatePayment, CreatedPayment, VerifyPayment};
pub use reservations::{CreateReservation, CreatedReservation};
pub use service::FlowService;

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for module tests.

    use std::sync::Arc;

    use investflow_store::MemoryStore;
    use investflow_types::{Caller, FlowConfig, Role, UserId};

    use crate::FlowService;

    /// Service over a fresh in-memory store with the default configuration.
    pub fn service() -> FlowService<MemoryStore> {
        FlowService::with_defaults(Arc::new(MemoryStore::new()))
    }

    /// Service over a fresh in-memory store with the given configuration.
    #[allow(clippy::expect_used)]
    pub fn service_with(config: FlowConfig) -> FlowService<MemoryStore> {
        FlowService::new(Arc::new(MemoryStore::new()), config).expect("valid test config")
    }

    pub fn admin(id: i64) -> Caller {
        Caller::new(UserId::new(id), Role::Admin, true)
    }

    pub fn fundraiser(id: i64) -> Caller {
        Caller::new(UserId::new(id), Role::Fundraiser, true)
    }

    pub fn investor(id: i64) -> Caller {
        Caller::new(UserId::new(id), Role::Investor, true)
    }

    pub fn unverified(id: i64) -> Caller {
        Caller::new(UserId::new(id), Role::Investor, false)
    }
}
