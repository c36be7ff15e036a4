//! Snowflake-style globally unique ID generation.
//!
//! Generates 64-bit IDs that are globally unique, roughly time-ordered, and
//! monotonically increasing within a single process. Reservation, payment,
//! and escrow account ids are all snowflakes, so sorting by id is sorting by
//! creation time.
//!
//! # ID Structure
//!
//! ```text
//! | 42 bits: timestamp (ms since epoch) | 12 bits: worker | 10 bits: sequence |
//! ```
//!
//! - **Timestamp**: milliseconds since 2024-01-01 00:00:00 UTC (~139 years range)
//! - **Worker**: per-process identifier from entropy mixed with PID (4096 values)
//! - **Sequence**: counter within each millisecond (1024 IDs/ms per worker)
//!
//! # Thread Safety
//!
//! Uses a global `parking_lot::Mutex`; the lock is held only for the
//! duration of the increment.
//!
//! # Security Considerations
//!
//! Snowflake IDs are designed for uniqueness and ordering, not secrecy: the
//! timestamp component is predictable. They must not be used as bearer
//! tokens — every operation that takes an id also checks authorization.

use std::{
    sync::OnceLock,
    time::{SystemTime, UNIX_EPOCH},
};

use parking_lot::Mutex;
use snafu::Snafu;

use crate::types::{EscrowAccountId, PaymentId, ReservationId};

/// Custom epoch: 2024-01-01 00:00:00 UTC (milliseconds since Unix epoch).
const EPOCH_MS: u64 = 1_704_067_200_000;

/// Number of bits used for the random worker ID.
const WORKER_BITS: u32 = 12;

/// Number of bits used for the sequence portion.
const SEQUENCE_BITS: u32 = 10;

/// Mask for extracting the worker ID (12 bits).
const WORKER_MASK: u64 = (1 << WORKER_BITS) - 1;

/// Mask for extracting the sequence portion (10 bits).
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// State for sequence-based ID generation.
struct SnowflakeState {
    /// Last timestamp used for ID generation.
    last_timestamp: u64,
    /// Sequence counter within the current millisecond.
    sequence: u64,
}

/// Global state for thread-safe ID generation.
static SNOWFLAKE_STATE: Mutex<SnowflakeState> =
    Mutex::new(SnowflakeState { last_timestamp: 0, sequence: 0 });

/// Per-process worker ID, initialized once from OS entropy mixed with PID.
static WORKER_ID: OnceLock<u64> = OnceLock::new();

/// Returns the per-process worker ID, generating it on first call.
///
/// Mixing the PID into the random value keeps concurrent processes on the
/// same machine distinct even if their RNGs produce identical initial
/// values.
fn worker_id() -> u64 {
    *WORKER_ID.get_or_init(|| {
        use rand::Rng;
        let pid = u64::from(std::process::id());
        (rand::rng().random::<u64>() ^ pid) & WORKER_MASK
    })
}

/// Errors from Snowflake ID generation.
#[derive(Debug, Snafu)]
pub enum SnowflakeError {
    /// System clock is before the Unix epoch.
    #[snafu(display("system clock is before Unix epoch"))]
    SystemClock,
}

/// Generates a new Snowflake ID.
///
/// Combines a timestamp (milliseconds since 2024-01-01) with the per-process
/// worker ID and a sequence counter. If more than 1024 IDs are requested in
/// one millisecond, generation parks for a millisecond and retries.
///
/// # Errors
///
/// Returns [`SnowflakeError::SystemClock`] if the system clock is before the
/// Unix epoch.
pub fn generate() -> Result<u64, SnowflakeError> {
    loop {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| SnowflakeError::SystemClock)?
            .as_millis() as u64;
        let timestamp = now_ms.saturating_sub(EPOCH_MS);
        let wid = worker_id();

        let mut state = SNOWFLAKE_STATE.lock();

        if timestamp > state.last_timestamp {
            // New millisecond — reset the sequence.
            state.last_timestamp = timestamp;
            state.sequence = 0;
        } else {
            // Same millisecond, or the clock went backwards; keep the last
            // timestamp to preserve monotonicity and bump the sequence.
            state.sequence += 1;
            if state.sequence > SEQUENCE_MASK {
                // Sequence exhausted (>1024 IDs in 1ms). Wait out the
                // millisecond and try again.
                drop(state);
                std::thread::sleep(std::time::Duration::from_millis(1));
                continue;
            }
        }

        let id = (state.last_timestamp << (WORKER_BITS + SEQUENCE_BITS))
            | (wid << SEQUENCE_BITS)
            | state.sequence;
        return Ok(id);
    }
}

/// Generates a new [`ReservationId`].
///
/// # Errors
///
/// Returns [`SnowflakeError::SystemClock`] if the system clock is before the
/// Unix epoch.
pub fn generate_reservation_id() -> Result<ReservationId, SnowflakeError> {
    generate().map(ReservationId::new)
}

/// Generates a new [`PaymentId`].
///
/// # Errors
///
/// Returns [`SnowflakeError::SystemClock`] if the system clock is before the
/// Unix epoch.
pub fn generate_payment_id() -> Result<PaymentId, SnowflakeError> {
    generate().map(PaymentId::new)
}

/// Generates a new [`EscrowAccountId`].
///
/// # Errors
///
/// Returns [`SnowflakeError::SystemClock`] if the system clock is before the
/// Unix epoch.
pub fn generate_escrow_account_id() -> Result<EscrowAccountId, SnowflakeError> {
    generate().map(EscrowAccountId::new)
}

/// Extracts the timestamp portion from a Snowflake ID.
///
/// Returns milliseconds since the custom epoch (2024-01-01 00:00:00 UTC).
#[must_use]
pub fn extract_timestamp(id: u64) -> u64 {
    id >> (WORKER_BITS + SEQUENCE_BITS)
}

/// Extracts the worker ID portion from a Snowflake ID.
#[must_use]
pub fn extract_worker(id: u64) -> u64 {
    (id >> SEQUENCE_BITS) & WORKER_MASK
}

/// Extracts the sequence portion from a Snowflake ID.
#[must_use]
pub fn extract_sequence(id: u64) -> u64 {
    id & SEQUENCE_MASK
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_generate_returns_nonzero() {
        let id = generate().unwrap();
        assert!(id > 0, "Snowflake ID should be non-zero");
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let id1 = generate().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = generate().unwrap();

        assert!(extract_timestamp(id2) > extract_timestamp(id1));
        assert!(id2 > id1, "later ID should be higher: {id1} vs {id2}");
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            let id = generate().unwrap();
            assert!(ids.insert(id), "Snowflake IDs should be unique, got duplicate: {id}");
        }
    }

    #[test]
    fn test_id_reconstructs_from_parts() {
        let id = generate().unwrap();
        let ts = extract_timestamp(id);
        let w = extract_worker(id);
        let seq = extract_sequence(id);
        assert_eq!((ts << (WORKER_BITS + SEQUENCE_BITS)) | (w << SEQUENCE_BITS) | seq, id);
        assert!(w <= WORKER_MASK);
        assert!(seq <= SEQUENCE_MASK);
    }

    #[test]
    fn test_worker_id_is_consistent_within_process() {
        let id1 = generate().unwrap();
        let id2 = generate().unwrap();
        assert_eq!(extract_worker(id1), extract_worker(id2));
    }

    #[test]
    fn test_monotonic_within_same_millisecond() {
        let id1 = generate().unwrap();
        let id2 = generate().unwrap();
        assert!(id2 > id1, "IDs should be monotonically increasing");
    }

    #[test]
    fn test_typed_id_generators() {
        assert!(generate_reservation_id().unwrap().value() > 0);
        assert!(generate_payment_id().unwrap().value() > 0);
        assert!(generate_escrow_account_id().unwrap().value() > 0);
    }

    #[test]
    fn test_typed_ids_share_ordering() {
        let r1 = generate_reservation_id().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let r2 = generate_reservation_id().unwrap();
        assert!(r2 > r1, "reservation ids should sort by creation time");
    }
}
