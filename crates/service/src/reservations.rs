//! Reservation operations: time-boxed holds on offering shares.
//!
//! A reservation lets an email-verified user temporarily hold a quantity of
//! shares. The hold is released by the owner (cancel), promoted by an admin
//! (convert), or lapses at `expires_at`. Expiry is derived at read time —
//! there is no background sweep — so every read path here reports the
//! effective status, never the raw stored one.

use chrono::{DateTime, Duration, Utc};
use investflow_store::FlowStore;
use investflow_types::validation::{validate_expiration_minutes, validate_share_quantity};
use investflow_types::{
    Caller, FlowError, OfferingId, Reservation, ReservationId, ReservationStatus, Result,
    snowflake,
};
use tracing::{info, instrument};

use crate::service::{FlowService, invalid, map_reservation_err, map_storage_err};

/// Request to hold shares in an offering.
#[derive(Debug, Clone, bon::Builder)]
pub struct CreateReservation {
    /// Offering to hold shares in.
    pub offering_id: OfferingId,
    /// Number of shares to hold. Must be positive.
    pub share_quantity: u32,
    /// Lifetime of the hold in minutes. The configured default (30 unless
    /// overridden) applies when omitted.
    pub expiration_minutes: Option<i64>,
}

/// Result of a successful reservation creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedReservation {
    /// Id of the new reservation.
    pub id: ReservationId,
    /// Instant at which the hold lapses.
    pub expires_at: DateTime<Utc>,
}

/// Swaps the stored status for the effective one before a row leaves the
/// service.
fn materialize_expiry(mut reservation: Reservation, now: DateTime<Utc>) -> Reservation {
    reservation.status = reservation.effective_status(now);
    reservation
}

impl<S: FlowStore> FlowService<S> {
    /// Creates a reservation for the caller.
    ///
    /// The caller must have a verified email address; this gate runs before
    /// input validation, so an unverified caller is told to verify even when
    /// the input is also malformed.
    ///
    /// # Errors
    ///
    /// [`FlowError::EmailUnverified`] for unverified callers;
    /// [`FlowError::InvalidArgument`] for a zero share quantity or an
    /// out-of-bounds lifetime.
    #[instrument(skip(self, request), fields(user = %caller.user_id, offering = %request.offering_id))]
    pub fn create_reservation(
        &self,
        caller: &Caller,
        request: CreateReservation,
    ) -> Result<CreatedReservation> {
        if !caller.email_verified {
            return Err(FlowError::EmailUnverified);
        }
        validate_share_quantity(request.share_quantity).map_err(invalid)?;
        let minutes =
            request.expiration_minutes.unwrap_or(self.config().default_expiration_minutes);
        validate_expiration_minutes(minutes, self.config()).map_err(invalid)?;

        let id = snowflake::generate_reservation_id().map_err(|e| FlowError::Internal {
            message: format!("id generation failed: {e}"),
            location: snafu::Location::new(file!(), line!(), column!()),
        })?;
        let now = Utc::now();
        let expires_at = now + Duration::minutes(minutes);

        self.store()
            .insert_reservation(Reservation {
                id,
                offering_id: request.offering_id,
                user_id: caller.user_id,
                share_quantity: request.share_quantity,
                status: ReservationStatus::Active,
                expires_at,
                created_at: now,
            })
            .map_err(map_storage_err)?;

        info!(%id, shares = request.share_quantity, minutes, "reservation created");
        Ok(CreatedReservation { id, expires_at })
    }

    /// Returns the caller's reservations, scoped strictly to their own
    /// user id. There is no admin override on this view.
    pub fn my_reservations(&self, caller: &Caller) -> Result<Vec<Reservation>> {
        let now = Utc::now();
        let rows =
            self.store().reservations_by_user(caller.user_id).map_err(map_storage_err)?;
        Ok(rows.into_iter().map(|r| materialize_expiry(r, now)).collect())
    }

    /// Returns a reservation by id.
    ///
    /// # Errors
    ///
    /// [`FlowError::ReservationNotFound`] if absent;
    /// [`FlowError::Forbidden`] unless the caller owns it or is an admin.
    pub fn reservation(&self, caller: &Caller, id: ReservationId) -> Result<Reservation> {
        let reservation = self
            .store()
            .reservation(id)
            .map_err(map_storage_err)?
            .ok_or(FlowError::ReservationNotFound { id })?;
        if !caller.owns(reservation.user_id) && !caller.is_admin() {
            return Err(FlowError::Forbidden {
                reason: "you do not have access to this reservation".to_string(),
            });
        }
        Ok(materialize_expiry(reservation, Utc::now()))
    }

    /// Cancels a reservation, releasing the hold.
    ///
    /// Ownership follows the same rule as [`Self::reservation`]. Under
    /// strict transitions (the default) cancelling a converted or cancelled
    /// reservation fails with a conflict; with
    /// `strict_reservation_transitions = false` the status is overwritten
    /// unconditionally, as the source system did.
    ///
    /// # Errors
    ///
    /// [`FlowError::ReservationNotFound`], [`FlowError::Forbidden`], or
    /// [`FlowError::TransitionConflict`] under strict transitions.
    #[instrument(skip(self), fields(user = %caller.user_id, %id))]
    pub fn cancel_reservation(&self, caller: &Caller, id: ReservationId) -> Result<Reservation> {
        let reservation = self
            .store()
            .reservation(id)
            .map_err(map_storage_err)?
            .ok_or(FlowError::ReservationNotFound { id })?;
        if !caller.owns(reservation.user_id) && !caller.is_admin() {
            return Err(FlowError::Forbidden {
                reason: "you do not have access to this reservation".to_string(),
            });
        }

        let updated = self
            .store()
            .transition_reservation(
                id,
                ReservationStatus::Cancelled,
                self.config().strict_reservation_transitions,
            )
            .map_err(|e| map_reservation_err(id, e))?;
        info!(%id, "reservation cancelled");
        Ok(updated)
    }

    /// Promotes a reservation into an investment. Admin only; any admin may
    /// convert any reservation.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] for non-admins;
    /// [`FlowError::ReservationNotFound`];
    /// [`FlowError::TransitionConflict`] under strict transitions.
    #[instrument(skip(self), fields(admin = %caller.user_id, %id))]
    pub fn convert_reservation(&self, caller: &Caller, id: ReservationId) -> Result<Reservation> {
        Self::require_admin(caller, "converting a reservation")?;
        let updated = self
            .store()
            .transition_reservation(
                id,
                ReservationStatus::Converted,
                self.config().strict_reservation_transitions,
            )
            .map_err(|e| map_reservation_err(id, e))?;
        info!(%id, "reservation converted");
        Ok(updated)
    }

    /// Returns every reservation against an offering, across all users.
    /// Admin or fundraiser only.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] for ordinary investors.
    pub fn offering_reservations(
        &self,
        caller: &Caller,
        offering_id: OfferingId,
    ) -> Result<Vec<Reservation>> {
        Self::require_offering_manager(caller, "listing an offering's reservations")?;
        let now = Utc::now();
        let rows =
            self.store().reservations_by_offering(offering_id).map_err(map_storage_err)?;
        Ok(rows.into_iter().map(|r| materialize_expiry(r, now)).collect())
    }
}
