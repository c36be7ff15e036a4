//! In-memory implementation of [`FlowStore`].
//!
//! Backed by `parking_lot::RwLock`-guarded hash maps, one per entity table.
//! Every conditional update takes the write lock once and performs its
//! read-check-write inside that critical section, which is what gives the
//! trait its atomicity guarantees in this implementation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use investflow_types::{
    Eligibility, EligibilityPatch, EscrowAccount, EscrowAccountId, EscrowStatus, InvestmentId,
    OfferingId, Payment, PaymentId, Reservation, ReservationId, ReservationStatus, UserId,
    VerificationStatus,
};
use parking_lot::RwLock;

use crate::error::{Result, StoreError};
use crate::store::FlowStore;

/// Entity tables. One map per entity; eligibility is keyed on its
/// (user, offering) compound key, everything else on its id.
#[derive(Default, Debug)]
struct Tables {
    reservations: HashMap<ReservationId, Reservation>,
    eligibility: HashMap<(UserId, OfferingId), Eligibility>,
    payments: HashMap<PaymentId, Payment>,
    escrow_accounts: HashMap<EscrowAccountId, EscrowAccount>,
}

/// In-memory [`FlowStore`] for tests and embedding.
#[derive(Default, Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Collects rows matching `filter` from `map`, sorted by id ascending.
fn collect_sorted<K, V: Clone, F: Fn(&V) -> bool>(
    map: &HashMap<K, V>,
    filter: F,
    id_of: impl Fn(&V) -> u64,
) -> Vec<V> {
    let mut rows: Vec<V> = map.values().filter(|v| filter(v)).cloned().collect();
    rows.sort_by_key(|v| id_of(v));
    rows
}

impl FlowStore for MemoryStore {
    fn insert_reservation(&self, reservation: Reservation) -> Result<()> {
        self.tables.write().reservations.insert(reservation.id, reservation);
        Ok(())
    }

    fn reservation(&self, id: ReservationId) -> Result<Option<Reservation>> {
        Ok(self.tables.read().reservations.get(&id).cloned())
    }

    fn reservations_by_user(&self, user_id: UserId) -> Result<Vec<Reservation>> {
        let tables = self.tables.read();
        Ok(collect_sorted(
            &tables.reservations,
            |r| r.user_id == user_id,
            |r| r.id.value(),
        ))
    }

    fn reservations_by_offering(&self, offering_id: OfferingId) -> Result<Vec<Reservation>> {
        let tables = self.tables.read();
        Ok(collect_sorted(
            &tables.reservations,
            |r| r.offering_id == offering_id,
            |r| r.id.value(),
        ))
    }

    fn transition_reservation(
        &self,
        id: ReservationId,
        to: ReservationStatus,
        enforce_table: bool,
    ) -> Result<Reservation> {
        let mut tables = self.tables.write();
        let reservation = tables
            .reservations
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "reservation" })?;

        if enforce_table && !reservation.status.can_transition_to(to) {
            return Err(StoreError::TransitionConflict {
                entity: "reservation",
                from: reservation.status.to_string(),
                to: to.to_string(),
            });
        }
        reservation.status = to;
        Ok(reservation.clone())
    }

    fn upsert_eligibility(
        &self,
        user_id: UserId,
        offering_id: OfferingId,
        patch: EligibilityPatch,
        now: DateTime<Utc>,
    ) -> Result<Eligibility> {
        let mut tables = self.tables.write();
        let key = (user_id, offering_id);
        let existing = tables.eligibility.get(&key).cloned();
        let record = patch.apply(existing, user_id, offering_id, now);
        tables.eligibility.insert(key, record.clone());
        Ok(record)
    }

    fn eligibility(
        &self,
        user_id: UserId,
        offering_id: OfferingId,
    ) -> Result<Option<Eligibility>> {
        Ok(self.tables.read().eligibility.get(&(user_id, offering_id)).cloned())
    }

    fn eligibility_for_user(&self, user_id: UserId) -> Result<Vec<Eligibility>> {
        let tables = self.tables.read();
        let mut rows: Vec<Eligibility> =
            tables.eligibility.values().filter(|e| e.user_id == user_id).cloned().collect();
        rows.sort_by_key(|e| e.offering_id);
        Ok(rows)
    }

    fn insert_payment(&self, payment: Payment) -> Result<()> {
        self.tables.write().payments.insert(payment.id, payment);
        Ok(())
    }

    fn payment(&self, id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.tables.read().payments.get(&id).cloned())
    }

    fn payments_by_investment(&self, investment_id: InvestmentId) -> Result<Vec<Payment>> {
        let tables = self.tables.read();
        Ok(collect_sorted(
            &tables.payments,
            |p| p.investment_id == investment_id,
            |p| p.id.value(),
        ))
    }

    fn verified_payment_total(&self, investment_id: InvestmentId) -> Result<i64> {
        let tables = self.tables.read();
        Ok(tables
            .payments
            .values()
            .filter(|p| {
                p.investment_id == investment_id
                    && p.verification_status == VerificationStatus::Verified
            })
            .map(|p| p.amount_cents)
            .sum())
    }

    fn verify_payment(
        &self,
        id: PaymentId,
        status: VerificationStatus,
        verified_by: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Payment> {
        let mut tables = self.tables.write();
        let payment =
            tables.payments.get_mut(&id).ok_or(StoreError::NotFound { entity: "payment" })?;

        if payment.verification_status != VerificationStatus::Pending {
            return Err(StoreError::TransitionConflict {
                entity: "payment",
                from: payment.verification_status.to_string(),
                to: status.to_string(),
            });
        }
        payment.verification_status = status;
        payment.verified_by = Some(verified_by);
        payment.verified_at = Some(now);
        if notes.is_some() {
            payment.notes = notes;
        }
        Ok(payment.clone())
    }

    fn pending_payments(&self) -> Result<Vec<Payment>> {
        let tables = self.tables.read();
        Ok(collect_sorted(
            &tables.payments,
            |p| p.verification_status == VerificationStatus::Pending,
            |p| p.id.value(),
        ))
    }

    fn insert_escrow_account(&self, account: EscrowAccount) -> Result<()> {
        self.tables.write().escrow_accounts.insert(account.id, account);
        Ok(())
    }

    fn escrow_account(&self, id: EscrowAccountId) -> Result<Option<EscrowAccount>> {
        Ok(self.tables.read().escrow_accounts.get(&id).cloned())
    }

    fn escrow_by_offering(&self, offering_id: OfferingId) -> Result<Option<EscrowAccount>> {
        let tables = self.tables.read();
        // Earliest-created account is the primary; ids are time-ordered.
        Ok(tables
            .escrow_accounts
            .values()
            .filter(|a| a.offering_id == offering_id)
            .min_by_key(|a| a.id)
            .cloned())
    }

    fn set_escrow_status(
        &self,
        id: EscrowAccountId,
        status: EscrowStatus,
        enforce_table: bool,
    ) -> Result<EscrowAccount> {
        let mut tables = self.tables.write();
        let account = tables
            .escrow_accounts
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "escrow account" })?;

        if enforce_table && !account.status.can_transition_to(status) {
            return Err(StoreError::TransitionConflict {
                entity: "escrow account",
                from: account.status.to_string(),
                to: status.to_string(),
            });
        }
        account.status = status;
        Ok(account.clone())
    }

    fn apply_escrow_delta(
        &self,
        id: EscrowAccountId,
        delta_cents: i64,
        floor: Option<i64>,
    ) -> Result<EscrowAccount> {
        let mut tables = self.tables.write();
        let account = tables
            .escrow_accounts
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "escrow account" })?;

        let next = account.total_held_cents.saturating_add(delta_cents);
        if let Some(floor) = floor {
            if next < floor {
                return Err(StoreError::BalanceFloor {
                    balance_cents: account.total_held_cents,
                    delta_cents,
                });
            }
        }
        account.total_held_cents = next;
        Ok(account.clone())
    }

    fn active_escrow_accounts(&self) -> Result<Vec<EscrowAccount>> {
        let tables = self.tables.read();
        Ok(collect_sorted(
            &tables.escrow_accounts,
            |a| a.status == EscrowStatus::Active,
            |a| a.id.value(),
        ))
    }
}
