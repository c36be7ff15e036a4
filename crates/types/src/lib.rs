//! Core types for the InvestFlow investment flow service.
//!
//! This crate provides the foundational types used throughout the flow:
//! - Type-safe identifiers (`UserId`, `OfferingId`, `ReservationId`, ...)
//! - Entity structures for reservations, eligibility, payments, and escrow
//! - Status enums with their transition tables
//! - The authenticated caller context
//! - Error types using snafu
//! - Configuration with validated invariant knobs

pub mod config;
pub mod error;
pub mod identity;
pub mod snowflake;
pub mod types;
pub mod validation;

// Re-export commonly used types at crate root
pub use config::FlowConfig;
pub use error::{ErrorCode, FlowError, Result};
pub use identity::{Caller, Role};
pub use types::*;
