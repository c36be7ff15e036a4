//! Core type definitions for the investment flow.
//!
//! - Identifier newtypes (`UserId`, `OfferingId`, `ReservationId`, ...)
//! - Entity structures (`Reservation`, `Eligibility`, `Payment`, `EscrowAccount`)
//! - Status enums and their transition tables

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Identifier Types
// ============================================================================

/// Generates a newtype wrapper around a numeric type for type-safe identifiers.
///
/// Each generated type provides:
/// - Standard derives: Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord
/// - Serde with `#[serde(transparent)]` for wire format compatibility
/// - `From<inner>` and `Into<inner>` conversions
/// - `Display` with a semantic prefix (e.g., `offering:7`)
/// - `new()` constructor and `value()` accessor
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $inner:ty, $prefix:expr
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Creates a new identifier from a raw value.
            #[inline]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Returns the raw numeric value.
            #[inline]
            pub const fn value(self) -> $inner {
                self.0
            }
        }

        impl From<$inner> for $name {
            #[inline]
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl From<$name> for $inner {
            #[inline]
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}:{}", $prefix, self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = <$inner as std::str::FromStr>::Err;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse::<$inner>().map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a platform user.
    ///
    /// Users are owned by the external identity collaborator; this subsystem
    /// only references them by id.
    ///
    /// # Display
    ///
    /// Formats with `user:` prefix: `user:42`.
    UserId, i64, "user"
);

define_id!(
    /// Unique identifier for an offering.
    ///
    /// Offerings are owned by an external collaborator; existence of the id
    /// is assumed, not validated here.
    ///
    /// # Display
    ///
    /// Formats with `offering:` prefix: `offering:7`.
    OfferingId, i64, "offering"
);

define_id!(
    /// Unique identifier for an investment.
    ///
    /// Investments are owned by an external collaborator; payments reference
    /// them by id only.
    ///
    /// # Display
    ///
    /// Formats with `investment:` prefix: `investment:3`.
    InvestmentId, i64, "investment"
);

define_id!(
    /// Unique identifier for a share reservation.
    ///
    /// Generated from the snowflake scheme in [`crate::snowflake`], so ids
    /// are time-ordered.
    ///
    /// # Display
    ///
    /// Formats with `rsv:` prefix: `rsv:123456`.
    ReservationId, u64, "rsv"
);

define_id!(
    /// Unique identifier for a payment record.
    ///
    /// # Display
    ///
    /// Formats with `pay:` prefix: `pay:123456`.
    PaymentId, u64, "pay"
);

define_id!(
    /// Unique identifier for an escrow account.
    ///
    /// # Display
    ///
    /// Formats with `escrow:` prefix: `escrow:123456`.
    EscrowAccountId, u64, "escrow"
);

// ============================================================================
// Reservation
// ============================================================================

/// Lifecycle status of a share reservation.
///
/// Transition table: `Active → {Cancelled, Converted, Expired}`. The three
/// target states are terminal. `Expired` is derived at read time from
/// `expires_at` and is never stored; see [`Reservation::effective_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// The hold is live (subject to `expires_at`).
    #[default]
    Active,
    /// Released by the owning user.
    Cancelled,
    /// Promoted into an investment by an admin.
    Converted,
    /// The hold lapsed without being cancelled or converted.
    Expired,
}

impl ReservationStatus {
    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Whether the transition table permits moving from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(self, Self::Active) && !matches!(to, Self::Active)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Converted => "converted",
            Self::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// A time-boxed hold on shares of an offering.
///
/// Created by an authenticated, email-verified user; the status is mutated
/// by the owning user (cancel) or an admin (convert). Reservations are never
/// physically deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation identifier.
    pub id: ReservationId,
    /// Offering the shares belong to.
    pub offering_id: OfferingId,
    /// User holding the reservation.
    pub user_id: UserId,
    /// Number of shares held. Always positive.
    pub share_quantity: u32,
    /// Stored lifecycle status. Prefer [`Self::effective_status`] on reads.
    pub status: ReservationStatus,
    /// Instant at which the hold lapses.
    pub expires_at: DateTime<Utc>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Whether the hold has lapsed: still stored as `Active` but past
    /// `expires_at`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Active && self.expires_at < now
    }

    /// The status as observed at `now`.
    ///
    /// Expiry is derived, not stored: an `Active` reservation past its
    /// `expires_at` reads as `Expired` even though no transition was written.
    #[must_use]
    pub fn effective_status(&self, now: DateTime<Utc>) -> ReservationStatus {
        if self.is_expired(now) {
            ReservationStatus::Expired
        } else {
            self.status
        }
    }
}

// ============================================================================
// Eligibility
// ============================================================================

/// Regulatory investor-qualification state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccreditationStatus {
    /// No accreditation review has happened yet.
    #[default]
    NotChecked,
    /// Review is in progress.
    Pending,
    /// Accreditation confirmed.
    Verified,
    /// Accreditation denied.
    Rejected,
    /// A previously granted accreditation has lapsed.
    Expired,
}

/// Outcome of the jurisdiction screen for a (user, offering) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JurisdictionCheck {
    /// No jurisdiction screen has happened yet.
    #[default]
    NotChecked,
    /// The user's jurisdiction permits investing in this offering.
    Allowed,
    /// Investing is restricted (e.g., capped) in the user's jurisdiction.
    Restricted,
    /// Investing is prohibited in the user's jurisdiction.
    Prohibited,
}

/// Per-(user, offering) record of whether a user may invest.
///
/// At most one record exists per pair; every write is an upsert keyed on
/// (`user_id`, `offering_id`) and stamps `checked_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    /// User the record is about.
    pub user_id: UserId,
    /// Offering the record is scoped to.
    pub offering_id: OfferingId,
    /// Explicit eligibility flag. When unset, eligibility is derived from
    /// the two status enums; see [`Self::is_eligible`].
    pub is_eligible: Option<bool>,
    /// Accreditation review state.
    pub accreditation_status: AccreditationStatus,
    /// Jurisdiction screen outcome.
    pub jurisdiction_check: JurisdictionCheck,
    /// Optional monetary cap on this user's investment, in cents.
    pub investment_limit_cents: Option<i64>,
    /// Free-form reviewer notes.
    pub notes: Option<String>,
    /// When this record was last written.
    pub checked_at: DateTime<Utc>,
}

impl Eligibility {
    /// Derived eligibility: the explicit flag when set, otherwise verified
    /// accreditation combined with an allowed jurisdiction.
    #[must_use]
    pub fn is_eligible(&self) -> bool {
        self.is_eligible.unwrap_or_else(|| {
            self.accreditation_status == AccreditationStatus::Verified
                && self.jurisdiction_check == JurisdictionCheck::Allowed
        })
    }
}

/// Partial update applied to an [`Eligibility`] record during an upsert.
///
/// `Some` fields overwrite the stored value; `None` fields preserve it (or
/// take the field default when no record exists yet). Both the self-service
/// check and the admin override reduce to this shape — the admin variant
/// simply arrives with every core field populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibilityPatch {
    /// Explicit eligibility flag to record.
    pub is_eligible: Option<bool>,
    /// Accreditation review state to record.
    pub accreditation_status: Option<AccreditationStatus>,
    /// Jurisdiction screen outcome to record.
    pub jurisdiction_check: Option<JurisdictionCheck>,
    /// Investment cap to record, in cents.
    pub investment_limit_cents: Option<i64>,
    /// Reviewer notes to record.
    pub notes: Option<String>,
}

impl EligibilityPatch {
    /// Merges this patch onto an existing record (or a fresh one), stamping
    /// `checked_at = now`.
    #[must_use]
    pub fn apply(
        self,
        existing: Option<Eligibility>,
        user_id: UserId,
        offering_id: OfferingId,
        now: DateTime<Utc>,
    ) -> Eligibility {
        let mut record = existing.unwrap_or_else(|| Eligibility {
            user_id,
            offering_id,
            is_eligible: None,
            accreditation_status: AccreditationStatus::default(),
            jurisdiction_check: JurisdictionCheck::default(),
            investment_limit_cents: None,
            notes: None,
            checked_at: now,
        });

        if let Some(flag) = self.is_eligible {
            record.is_eligible = Some(flag);
        }
        if let Some(status) = self.accreditation_status {
            record.accreditation_status = status;
        }
        if let Some(check) = self.jurisdiction_check {
            record.jurisdiction_check = check;
        }
        if let Some(limit) = self.investment_limit_cents {
            record.investment_limit_cents = Some(limit);
        }
        if let Some(notes) = self.notes {
            record.notes = Some(notes);
        }
        record.checked_at = now;
        record
    }
}

// ============================================================================
// Payment
// ============================================================================

/// How the funds behind a payment record were moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Domestic bank transfer.
    BankTransfer,
    /// Wire transfer.
    WireTransfer,
    /// Credit card.
    CreditCard,
    /// Debit card.
    DebitCard,
    /// ACH pull.
    Ach,
    /// Paper check.
    Check,
    /// Cryptocurrency transfer.
    Crypto,
    /// Anything else, described in `notes`.
    Other,
}

/// Admin verification state of a payment record.
///
/// Transition table: `Pending → {Verified, Failed, Rejected}`, terminal on
/// all three target states. There is no un-verify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    /// Awaiting admin review. Every payment starts here.
    #[default]
    Pending,
    /// Confirmed as genuine funds received.
    Verified,
    /// The transfer did not complete.
    Failed,
    /// Rejected by the reviewing admin.
    Rejected,
}

impl VerificationStatus {
    /// Whether this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Failed => "failed",
            Self::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// A record of funds applied toward an investment.
///
/// Recognition of the funds is gated behind admin verification: only
/// `Verified` payments count toward an investment's total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique payment identifier.
    pub id: PaymentId,
    /// Investment the funds apply to.
    pub investment_id: InvestmentId,
    /// How the funds were moved.
    pub payment_method: PaymentMethod,
    /// Amount in cents. Always positive.
    pub amount_cents: i64,
    /// External reference (e.g., wire confirmation number).
    pub payment_reference: Option<String>,
    /// Date the payment was made, as reported by the submitter.
    pub payment_date: Option<DateTime<Utc>>,
    /// URL of an uploaded receipt.
    pub receipt_url: Option<String>,
    /// Object-store key of an uploaded receipt.
    pub receipt_key: Option<String>,
    /// Free-form notes from the submitter or the verifying admin.
    pub notes: Option<String>,
    /// Admin verification state. Starts `Pending`, transitions exactly once.
    pub verification_status: VerificationStatus,
    /// Admin who performed the verification.
    pub verified_by: Option<UserId>,
    /// When the verification happened.
    pub verified_at: Option<DateTime<Utc>>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Escrow
// ============================================================================

/// Lifecycle status of an escrow account.
///
/// The nominal progression is `PendingSetup → Active → Releasing → Released
/// → Closed`, with an `Active → Closed` shortcut for offerings that wind
/// down without a release. Whether non-adjacent jumps are rejected is a
/// configuration decision ([`crate::FlowConfig::strict_escrow_transitions`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    /// Account created but not yet ready to receive funds.
    #[default]
    PendingSetup,
    /// Accepting deposits.
    Active,
    /// Release conditions met; funds are being disbursed.
    Releasing,
    /// All funds disbursed.
    Released,
    /// Account closed.
    Closed,
}

impl EscrowStatus {
    /// Whether the adjacency table permits moving from `self` to `to`.
    #[must_use]
    pub const fn can_transition_to(self, to: Self) -> bool {
        matches!(
            (self, to),
            (Self::PendingSetup, Self::Active)
                | (Self::Active, Self::Releasing)
                | (Self::Active, Self::Closed)
                | (Self::Releasing, Self::Released)
                | (Self::Released, Self::Closed)
        )
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::PendingSetup => "pending_setup",
            Self::Active => "active",
            Self::Releasing => "releasing",
            Self::Released => "released",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// A bank-style holding account tied to one offering.
///
/// The balance is a signed accumulator adjusted only by delta operations;
/// it is never overwritten directly. Accounts are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowAccount {
    /// Unique account identifier.
    pub id: EscrowAccountId,
    /// Offering this account holds funds for.
    pub offering_id: OfferingId,
    /// Bank account number.
    pub account_number: String,
    /// Display name for the account.
    pub account_name: Option<String>,
    /// Bank holding the account.
    pub bank_name: Option<String>,
    /// Conditions under which held funds are released.
    pub release_conditions: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Lifecycle status.
    pub status: EscrowStatus,
    /// Running balance in cents. Deposits are positive deltas, withdrawals
    /// negative.
    pub total_held_cents: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}
