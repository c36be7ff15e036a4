//! Eligibility operations: per-(user, offering) investment permission.
//!
//! Two authorization tiers write the same record shape. Self-service checks
//! let a user record any subset of the fields about themselves; the admin
//! override requires a complete judgment of the core fields. Either way the
//! write is an atomic upsert keyed on (user, offering) — at most one record
//! ever exists per pair — and stamps `checked_at`.

use chrono::Utc;
use investflow_store::FlowStore;
use investflow_types::{
    AccreditationStatus, Caller, Eligibility, EligibilityPatch, JurisdictionCheck, OfferingId,
    Result, UserId,
};
use tracing::{info, instrument};

use crate::service::{FlowService, map_storage_err};

/// Self-service eligibility check. Every field beyond the offering is
/// optional; omitted fields preserve whatever the record already holds.
#[derive(Debug, Clone, bon::Builder)]
pub struct SelfEligibilityCheck {
    /// Offering the check is scoped to.
    pub offering_id: OfferingId,
    /// Explicit eligibility flag.
    pub is_eligible: Option<bool>,
    /// Accreditation review state.
    pub accreditation_status: Option<AccreditationStatus>,
    /// Jurisdiction screen outcome.
    pub jurisdiction_check: Option<JurisdictionCheck>,
    /// Investment cap in cents.
    pub investment_limit_cents: Option<i64>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Admin override of a user's eligibility. The core fields are required:
/// an override is a complete, authoritative judgment, not a partial touch-up.
#[derive(Debug, Clone, bon::Builder)]
pub struct AdminEligibilityOverride {
    /// User the judgment is about.
    pub user_id: UserId,
    /// Offering the judgment is scoped to.
    pub offering_id: OfferingId,
    /// Eligibility verdict.
    pub is_eligible: bool,
    /// Accreditation review state.
    pub accreditation_status: AccreditationStatus,
    /// Jurisdiction screen outcome.
    pub jurisdiction_check: JurisdictionCheck,
    /// Investment cap in cents.
    pub investment_limit_cents: Option<i64>,
    /// Free-form notes.
    pub notes: Option<String>,
}

impl<S: FlowStore> FlowService<S> {
    /// Records a self-service eligibility check for the caller.
    ///
    /// Upserts on (caller, offering): a repeat check updates the one
    /// existing record rather than creating a second.
    #[instrument(skip(self, check), fields(user = %caller.user_id, offering = %check.offering_id))]
    pub fn check_eligibility(
        &self,
        caller: &Caller,
        check: SelfEligibilityCheck,
    ) -> Result<Eligibility> {
        let patch = EligibilityPatch {
            is_eligible: check.is_eligible,
            accreditation_status: check.accreditation_status,
            jurisdiction_check: check.jurisdiction_check,
            investment_limit_cents: check.investment_limit_cents,
            notes: check.notes,
        };
        let record = self
            .store()
            .upsert_eligibility(caller.user_id, check.offering_id, patch, Utc::now())
            .map_err(map_storage_err)?;
        info!(eligible = record.is_eligible(), "eligibility self-check recorded");
        Ok(record)
    }

    /// Returns the caller's eligibility record for an offering, if any.
    pub fn my_eligibility(
        &self,
        caller: &Caller,
        offering_id: OfferingId,
    ) -> Result<Option<Eligibility>> {
        self.store().eligibility(caller.user_id, offering_id).map_err(map_storage_err)
    }

    /// Derived convenience read: whether the caller is currently cleared to
    /// invest in the offering. `false` when no record exists.
    pub fn is_eligible(&self, caller: &Caller, offering_id: OfferingId) -> Result<bool> {
        Ok(self
            .my_eligibility(caller, offering_id)?
            .is_some_and(|record| record.is_eligible()))
    }

    /// Returns every eligibility record for the caller, across offerings.
    pub fn my_eligibility_checks(&self, caller: &Caller) -> Result<Vec<Eligibility>> {
        self.store().eligibility_for_user(caller.user_id).map_err(map_storage_err)
    }

    /// Replaces a user's eligibility judgment. Admin only.
    ///
    /// Uses the same upsert key as the self-service check, so an admin
    /// override lands on the one record the user may already have.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`](investflow_types::FlowError::Forbidden) for
    /// non-admins.
    #[instrument(
        skip(self, judgment),
        fields(admin = %caller.user_id, user = %judgment.user_id, offering = %judgment.offering_id)
    )]
    pub fn update_user_eligibility(
        &self,
        caller: &Caller,
        judgment: AdminEligibilityOverride,
    ) -> Result<Eligibility> {
        Self::require_admin(caller, "overriding eligibility")?;
        let patch = EligibilityPatch {
            is_eligible: Some(judgment.is_eligible),
            accreditation_status: Some(judgment.accreditation_status),
            jurisdiction_check: Some(judgment.jurisdiction_check),
            investment_limit_cents: judgment.investment_limit_cents,
            notes: judgment.notes,
        };
        let record = self
            .store()
            .upsert_eligibility(judgment.user_id, judgment.offering_id, patch, Utc::now())
            .map_err(map_storage_err)?;
        info!(eligible = record.is_eligible(), "eligibility overridden");
        Ok(record)
    }
}
