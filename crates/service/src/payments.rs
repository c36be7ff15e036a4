//! Payment operations: funds submitted against investments.
//!
//! Any authenticated user may record a payment; recognition of the funds is
//! gated behind admin verification. The request shape cannot carry a
//! verification status, so every payment starts `Pending` — verification is
//! unrepresentable as self-asserted. The admin decision is one-shot: once a
//! payment leaves `Pending` it never returns.

use chrono::{DateTime, Utc};
use investflow_store::FlowStore;
use investflow_types::validation::validate_amount_cents;
use investflow_types::{
    Caller, FlowError, InvestmentId, Payment, PaymentId, PaymentMethod, Result,
    VerificationStatus, snowflake,
};
use tracing::{info, instrument};

use crate::service::{FlowService, invalid, map_payment_err, map_storage_err};

/// Request to record funds against an investment.
#[derive(Debug, Clone, bon::Builder)]
pub struct CreatePayment {
    /// Investment the funds apply to.
    pub investment_id: InvestmentId,
    /// How the funds were moved.
    pub payment_method: PaymentMethod,
    /// Amount in cents. Must be positive.
    pub amount_cents: i64,
    /// External reference (e.g., wire confirmation number).
    #[builder(into)]
    pub payment_reference: Option<String>,
    /// Date the payment was made.
    pub payment_date: Option<DateTime<Utc>>,
    /// URL of an uploaded receipt.
    #[builder(into)]
    pub receipt_url: Option<String>,
    /// Object-store key of an uploaded receipt.
    #[builder(into)]
    pub receipt_key: Option<String>,
    /// Free-form notes.
    #[builder(into)]
    pub notes: Option<String>,
}

/// Result of a successful payment creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedPayment {
    /// Id of the new payment record.
    pub id: PaymentId,
}

/// Admin verification decision for a pending payment.
#[derive(Debug, Clone, bon::Builder)]
pub struct VerifyPayment {
    /// Payment to decide on.
    pub id: PaymentId,
    /// The decision. Must be terminal (`Verified`, `Failed`, or
    /// `Rejected`).
    pub status: VerificationStatus,
    /// Reviewer notes to attach.
    #[builder(into)]
    pub notes: Option<String>,
}

impl<S: FlowStore> FlowService<S> {
    /// Records a payment against an investment. The record always starts
    /// `Pending`.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidArgument`] for a non-positive amount.
    #[instrument(
        skip(self, request),
        fields(user = %caller.user_id, investment = %request.investment_id)
    )]
    pub fn create_payment(
        &self,
        caller: &Caller,
        request: CreatePayment,
    ) -> Result<CreatedPayment> {
        validate_amount_cents(request.amount_cents).map_err(invalid)?;

        let id = snowflake::generate_payment_id().map_err(|e| FlowError::Internal {
            message: format!("id generation failed: {e}"),
            location: snafu::Location::new(file!(), line!(), column!()),
        })?;
        self.store()
            .insert_payment(Payment {
                id,
                investment_id: request.investment_id,
                payment_method: request.payment_method,
                amount_cents: request.amount_cents,
                payment_reference: request.payment_reference,
                payment_date: request.payment_date,
                receipt_url: request.receipt_url,
                receipt_key: request.receipt_key,
                notes: request.notes,
                verification_status: VerificationStatus::Pending,
                verified_by: None,
                verified_at: None,
                created_at: Utc::now(),
            })
            .map_err(map_storage_err)?;

        info!(%id, amount_cents = request.amount_cents, "payment recorded");
        Ok(CreatedPayment { id })
    }

    /// Returns a payment by id.
    ///
    /// Any authenticated caller may read any payment; ownership of the
    /// backing investment is not resolvable at this layer.
    ///
    /// # Errors
    ///
    /// [`FlowError::PaymentNotFound`] if absent.
    pub fn payment(&self, _caller: &Caller, id: PaymentId) -> Result<Payment> {
        self.store()
            .payment(id)
            .map_err(map_storage_err)?
            .ok_or(FlowError::PaymentNotFound { id })
    }

    /// Returns every payment recorded against an investment.
    pub fn investment_payments(
        &self,
        _caller: &Caller,
        investment_id: InvestmentId,
    ) -> Result<Vec<Payment>> {
        self.store().payments_by_investment(investment_id).map_err(map_storage_err)
    }

    /// Returns the verified total for an investment: the sum of
    /// `amount_cents` over its `Verified` payments, zero if none.
    pub fn investment_payment_total(
        &self,
        _caller: &Caller,
        investment_id: InvestmentId,
    ) -> Result<i64> {
        self.store().verified_payment_total(investment_id).map_err(map_storage_err)
    }

    /// Records an admin verification decision on a pending payment.
    ///
    /// One-shot: the decision transitions the payment out of `Pending`
    /// permanently. Stamps `verified_by` and `verified_at`.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] for non-admins;
    /// [`FlowError::InvalidArgument`] if the requested status is `Pending`;
    /// [`FlowError::PaymentNotFound`];
    /// [`FlowError::TransitionConflict`] if the payment was already decided.
    #[instrument(skip(self, decision), fields(admin = %caller.user_id, id = %decision.id))]
    pub fn verify_payment(&self, caller: &Caller, decision: VerifyPayment) -> Result<Payment> {
        Self::require_admin(caller, "verifying a payment")?;
        if !decision.status.is_terminal() {
            return Err(FlowError::InvalidArgument {
                message: "verification decision must be verified, failed, or rejected"
                    .to_string(),
            });
        }

        let updated = self
            .store()
            .verify_payment(
                decision.id,
                decision.status,
                caller.user_id,
                decision.notes,
                Utc::now(),
            )
            .map_err(|e| map_payment_err(decision.id, e))?;
        info!(id = %decision.id, status = %decision.status, "payment decided");
        Ok(updated)
    }

    /// Returns every payment platform-wide still awaiting a decision.
    /// Admin only.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] for non-admins.
    pub fn pending_payments(&self, caller: &Caller) -> Result<Vec<Payment>> {
        Self::require_admin(caller, "listing pending payments")?;
        self.store().pending_payments().map_err(map_storage_err)
    }
}
