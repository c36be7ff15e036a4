//! Escrow operations: per-offering holding accounts.
//!
//! Escrow accounts are created and mutated by admins only; reads are open to
//! any authenticated caller. The balance is a signed accumulator adjusted
//! through atomic deltas — deposits positive, withdrawals negative — and is
//! never overwritten directly. Whether a withdrawal may drive the balance
//! negative, and whether status updates must follow the adjacency table, are
//! configuration decisions.

use chrono::Utc;
use investflow_store::FlowStore;
use investflow_types::validation::{validate_account_number, validate_balance_delta};
use investflow_types::{
    Caller, EscrowAccount, EscrowAccountId, EscrowStatus, FlowError, OfferingId, Result,
    snowflake,
};
use tracing::{info, instrument};

use crate::service::{FlowService, invalid, map_escrow_err, map_storage_err};

/// Request to open an escrow account for an offering.
#[derive(Debug, Clone, bon::Builder)]
pub struct CreateEscrowAccount {
    /// Offering the account holds funds for.
    pub offering_id: OfferingId,
    /// Bank account number.
    #[builder(into)]
    pub account_number: String,
    /// Display name for the account.
    #[builder(into)]
    pub account_name: Option<String>,
    /// Bank holding the account.
    #[builder(into)]
    pub bank_name: Option<String>,
    /// Conditions under which held funds are released.
    #[builder(into)]
    pub release_conditions: Option<String>,
    /// Free-form notes.
    #[builder(into)]
    pub notes: Option<String>,
}

/// Result of a successful escrow account creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedEscrowAccount {
    /// Id of the new account.
    pub id: EscrowAccountId,
}

impl<S: FlowStore> FlowService<S> {
    /// Opens an escrow account for an offering. Admin only.
    ///
    /// The account starts in `PendingSetup` with a zero balance.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] for non-admins;
    /// [`FlowError::InvalidArgument`] for a malformed account number.
    #[instrument(
        skip(self, request),
        fields(admin = %caller.user_id, offering = %request.offering_id)
    )]
    pub fn create_escrow_account(
        &self,
        caller: &Caller,
        request: CreateEscrowAccount,
    ) -> Result<CreatedEscrowAccount> {
        Self::require_admin(caller, "creating an escrow account")?;
        validate_account_number(&request.account_number).map_err(invalid)?;

        let id = snowflake::generate_escrow_account_id().map_err(|e| FlowError::Internal {
            message: format!("id generation failed: {e}"),
            location: snafu::Location::new(file!(), line!(), column!()),
        })?;
        self.store()
            .insert_escrow_account(EscrowAccount {
                id,
                offering_id: request.offering_id,
                account_number: request.account_number,
                account_name: request.account_name,
                bank_name: request.bank_name,
                release_conditions: request.release_conditions,
                notes: request.notes,
                status: EscrowStatus::PendingSetup,
                total_held_cents: 0,
                created_at: Utc::now(),
            })
            .map_err(map_storage_err)?;

        info!(%id, "escrow account created");
        Ok(CreatedEscrowAccount { id })
    }

    /// Returns an escrow account by id. Open to any authenticated caller.
    ///
    /// # Errors
    ///
    /// [`FlowError::EscrowAccountNotFound`] if absent.
    pub fn escrow_account(&self, _caller: &Caller, id: EscrowAccountId) -> Result<EscrowAccount> {
        self.store()
            .escrow_account(id)
            .map_err(map_storage_err)?
            .ok_or(FlowError::EscrowAccountNotFound { id })
    }

    /// Returns the escrow account backing an offering, if one exists. Open
    /// to any authenticated caller.
    pub fn offering_escrow(
        &self,
        _caller: &Caller,
        offering_id: OfferingId,
    ) -> Result<Option<EscrowAccount>> {
        self.store().escrow_by_offering(offering_id).map_err(map_storage_err)
    }

    /// Moves an escrow account to a new lifecycle status. Admin only.
    ///
    /// With `strict_escrow_transitions` enabled the move must follow the
    /// adjacency table; by default any jump is written, as the source
    /// system allowed.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] for non-admins;
    /// [`FlowError::EscrowAccountNotFound`];
    /// [`FlowError::TransitionConflict`] under strict transitions.
    #[instrument(skip(self), fields(admin = %caller.user_id, %id, %status))]
    pub fn update_escrow_status(
        &self,
        caller: &Caller,
        id: EscrowAccountId,
        status: EscrowStatus,
    ) -> Result<EscrowAccount> {
        Self::require_admin(caller, "updating escrow status")?;
        let updated = self
            .store()
            .set_escrow_status(id, status, self.config().strict_escrow_transitions)
            .map_err(|e| map_escrow_err(id, e))?;
        info!(%id, %status, "escrow status updated");
        Ok(updated)
    }

    /// Applies a signed delta to an escrow balance. Admin only.
    ///
    /// Deposits are positive, withdrawals negative. Unless
    /// `allow_negative_escrow_balance` is set, a delta that would drive the
    /// balance below zero is rejected and nothing is written.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] for non-admins;
    /// [`FlowError::InvalidArgument`] for a zero delta;
    /// [`FlowError::EscrowAccountNotFound`];
    /// [`FlowError::BalanceFloor`] when the floor would be breached.
    #[instrument(skip(self), fields(admin = %caller.user_id, %id, delta_cents))]
    pub fn update_escrow_balance(
        &self,
        caller: &Caller,
        id: EscrowAccountId,
        delta_cents: i64,
    ) -> Result<EscrowAccount> {
        Self::require_admin(caller, "adjusting escrow balance")?;
        validate_balance_delta(delta_cents).map_err(invalid)?;

        let floor = if self.config().allow_negative_escrow_balance { None } else { Some(0) };
        let updated = self
            .store()
            .apply_escrow_delta(id, delta_cents, floor)
            .map_err(|e| map_escrow_err(id, e))?;
        info!(%id, delta_cents, balance = updated.total_held_cents, "escrow balance adjusted");
        Ok(updated)
    }

    /// Returns every escrow account currently `Active`. Admin only.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] for non-admins.
    pub fn active_escrow_accounts(&self, caller: &Caller) -> Result<Vec<EscrowAccount>> {
        Self::require_admin(caller, "listing active escrow accounts")?;
        self.store().active_escrow_accounts().map_err(map_storage_err)
    }
}
