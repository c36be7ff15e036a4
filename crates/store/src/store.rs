//! The durable-store contract consumed by the flow service.

use chrono::{DateTime, Utc};
use investflow_types::{
    Eligibility, EligibilityPatch, EscrowAccount, EscrowAccountId, EscrowStatus, InvestmentId,
    OfferingId, Payment, PaymentId, Reservation, ReservationId, ReservationStatus, UserId,
    VerificationStatus,
};

use crate::error::Result;

/// Typed persistence operations for the four flow entities.
///
/// Implementations must make every method atomic with respect to the row(s)
/// it touches: the conditional-update methods
/// ([`transition_reservation`](Self::transition_reservation),
/// [`verify_payment`](Self::verify_payment),
/// [`set_escrow_status`](Self::set_escrow_status),
/// [`apply_escrow_delta`](Self::apply_escrow_delta)) perform their
/// read-check-write as one critical section, and
/// [`upsert_eligibility`](Self::upsert_eligibility) is atomic per
/// (user, offering) key. Last-writer-wins between whole calls is acceptable;
/// interleaving within a call is not.
///
/// List methods return rows ordered by id ascending. Ids are snowflakes, so
/// this is creation order.
pub trait FlowStore: Send + Sync {
    // --- Reservations ---

    /// Persists a new reservation.
    fn insert_reservation(&self, reservation: Reservation) -> Result<()>;

    /// Returns a reservation by id, or `None` if absent.
    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>>;

    /// Returns every reservation belonging to `user_id`.
    fn reservations_by_user(&self, user_id: UserId) -> Result<Vec<Reservation>>;

    /// Returns every reservation against `offering_id`, across all users.
    fn reservations_by_offering(&self, offering_id: OfferingId) -> Result<Vec<Reservation>>;

    /// Atomically moves a reservation to `to`.
    ///
    /// With `enforce_table = true` the write only succeeds when the stored
    /// status admits the transition
    /// ([`ReservationStatus::can_transition_to`]); otherwise the status is
    /// overwritten unconditionally. Returns the updated row.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the id is absent;
    /// [`StoreError::TransitionConflict`] if the table rejects the move.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    /// [`StoreError::TransitionConflict`]: crate::StoreError::TransitionConflict
    fn transition_reservation(
        &self,
        id: ReservationId,
        to: ReservationStatus,
        enforce_table: bool,
    ) -> Result<Reservation>;

    // --- Eligibility ---

    /// Atomically merges `patch` into the record keyed on
    /// (`user_id`, `offering_id`), creating it if absent, stamping
    /// `checked_at = now`. Returns the resulting record.
    ///
    /// At most one record ever exists per key.
    fn upsert_eligibility(
        &self,
        user_id: UserId,
        offering_id: OfferingId,
        patch: EligibilityPatch,
        now: DateTime<Utc>,
    ) -> Result<Eligibility>;

    /// Returns the record for (`user_id`, `offering_id`), or `None`.
    fn eligibility(&self, user_id: UserId, offering_id: OfferingId)
        -> Result<Option<Eligibility>>;

    /// Returns every eligibility record for `user_id`, across offerings.
    fn eligibility_for_user(&self, user_id: UserId) -> Result<Vec<Eligibility>>;

    // --- Payments ---

    /// Persists a new payment.
    fn insert_payment(&self, payment: Payment) -> Result<()>;

    /// Returns a payment by id, or `None` if absent.
    fn payment(&self, id: PaymentId) -> Result<Option<Payment>>;

    /// Returns every payment recorded against `investment_id`.
    fn payments_by_investment(&self, investment_id: InvestmentId) -> Result<Vec<Payment>>;

    /// Sums `amount_cents` over payments for `investment_id` with
    /// verification status `Verified`. Zero if none.
    fn verified_payment_total(&self, investment_id: InvestmentId) -> Result<i64>;

    /// Atomically records an admin verification decision.
    ///
    /// The write requires the stored status to be `Pending`; the check and
    /// the write happen in one critical section, so a decision can never be
    /// silently overwritten. Appends `notes` (if any) and stamps
    /// `verified_by`/`verified_at`. Returns the updated row.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the id is absent;
    /// [`StoreError::TransitionConflict`] if the payment already left
    /// `Pending`.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    /// [`StoreError::TransitionConflict`]: crate::StoreError::TransitionConflict
    fn verify_payment(
        &self,
        id: PaymentId,
        status: VerificationStatus,
        verified_by: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Payment>;

    /// Returns every payment platform-wide with status `Pending`.
    fn pending_payments(&self) -> Result<Vec<Payment>>;

    // --- Escrow ---

    /// Persists a new escrow account.
    fn insert_escrow_account(&self, account: EscrowAccount) -> Result<()>;

    /// Returns an escrow account by id, or `None` if absent.
    fn escrow_account(&self, id: EscrowAccountId) -> Result<Option<EscrowAccount>>;

    /// Returns the escrow account for `offering_id`, or `None`.
    ///
    /// When several accounts exist for one offering (uniqueness is not
    /// enforced at this layer), the earliest-created one is the primary and
    /// is returned.
    fn escrow_by_offering(&self, offering_id: OfferingId) -> Result<Option<EscrowAccount>>;

    /// Atomically moves an escrow account to `status`.
    ///
    /// With `enforce_table = true` the write only succeeds when the
    /// adjacency table admits it ([`EscrowStatus::can_transition_to`]);
    /// otherwise any jump is written. Returns the updated row.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the id is absent;
    /// [`StoreError::TransitionConflict`] if the table rejects the move.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    /// [`StoreError::TransitionConflict`]: crate::StoreError::TransitionConflict
    fn set_escrow_status(
        &self,
        id: EscrowAccountId,
        status: EscrowStatus,
        enforce_table: bool,
    ) -> Result<EscrowAccount>;

    /// Atomically applies a signed delta to `total_held_cents`.
    ///
    /// With `floor = Some(f)` the write is rejected when it would leave the
    /// balance below `f`. The check and the increment are one critical
    /// section; concurrent deltas never lose updates. Returns the updated
    /// row.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the id is absent;
    /// [`StoreError::BalanceFloor`] if the floor would be breached.
    ///
    /// [`StoreError::NotFound`]: crate::StoreError::NotFound
    /// [`StoreError::BalanceFloor`]: crate::StoreError::BalanceFloor
    fn apply_escrow_delta(
        &self,
        id: EscrowAccountId,
        delta_cents: i64,
        floor: Option<i64>,
    ) -> Result<EscrowAccount>;

    /// Returns every escrow account with status `Active`.
    fn active_escrow_accounts(&self) -> Result<Vec<EscrowAccount>>;
}
