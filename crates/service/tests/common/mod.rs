//! Shared fixtures for integration tests.

use std::sync::Arc;

use investflow_service::FlowService;
use investflow_store::MemoryStore;
use investflow_types::{Caller, FlowConfig, Role, UserId};

/// Service over a fresh in-memory store with the default configuration.
pub fn service() -> FlowService<MemoryStore> {
    FlowService::with_defaults(Arc::new(MemoryStore::new()))
}

/// Service over a fresh in-memory store with the given configuration.
#[allow(dead_code, clippy::expect_used)]
pub fn service_with(config: FlowConfig) -> FlowService<MemoryStore> {
    FlowService::new(Arc::new(MemoryStore::new()), config).expect("valid test config")
}

pub fn admin(id: i64) -> Caller {
    Caller::new(UserId::new(id), Role::Admin, true)
}

#[allow(dead_code)]
pub fn fundraiser(id: i64) -> Caller {
    Caller::new(UserId::new(id), Role::Fundraiser, true)
}

pub fn investor(id: i64) -> Caller {
    Caller::new(UserId::new(id), Role::Investor, true)
}
