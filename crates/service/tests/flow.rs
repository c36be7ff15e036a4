#![allow(clippy::unwrap_used, clippy::expect_used)]

//! End-to-end walk through the reservation flow, exercising the scenario
//! from the service's acceptance checklist: create as one user, read as
//! another, convert as admin, then observe what a late cancel does under
//! each transition policy.

mod common;

use chrono::{Duration, Utc};
use investflow_service::{CreatePayment, CreateReservation, VerifyPayment};
use investflow_types::{
    ErrorCode, FlowConfig, InvestmentId, OfferingId, PaymentMethod, ReservationStatus,
    VerificationStatus,
};

use common::{admin, investor, service, service_with};

#[test]
fn reservation_lifecycle_strict_policy() {
    let svc = service();
    let alice = investor(1);
    let bob = investor(2);
    let carol = admin(3);

    // Alice reserves 10 shares for 15 minutes.
    let before = Utc::now();
    let created = svc
        .create_reservation(
            &alice,
            CreateReservation::builder()
                .offering_id(OfferingId::new(7))
                .share_quantity(10)
                .expiration_minutes(15)
                .build(),
        )
        .unwrap();
    assert!(created.expires_at >= before + Duration::minutes(15));
    assert!(created.expires_at <= Utc::now() + Duration::minutes(15));

    // Bob cannot see it; admin Carol can.
    let err = svc.reservation(&bob, created.id).unwrap_err();
    assert_eq!(err.code(), ErrorCode::Forbidden);
    let seen = svc.reservation(&carol, created.id).unwrap();
    assert_eq!(seen.user_id, alice.user_id);
    assert_eq!(seen.share_quantity, 10);

    // Carol converts the hold into an investment.
    let converted = svc.convert_reservation(&carol, created.id).unwrap();
    assert_eq!(converted.status, ReservationStatus::Converted);

    // Under the default strict policy, Alice's late cancel is rejected and
    // the conversion stands.
    let err = svc.cancel_reservation(&alice, created.id).unwrap_err();
    assert_eq!(err.code(), ErrorCode::TransitionConflict);
    assert_eq!(
        svc.reservation(&carol, created.id).unwrap().status,
        ReservationStatus::Converted
    );
}

#[test]
fn reservation_lifecycle_permissive_policy_matches_source_system() {
    let svc = service_with(FlowConfig {
        strict_reservation_transitions: false,
        ..Default::default()
    });
    let alice = investor(1);
    let carol = admin(3);

    let created = svc
        .create_reservation(
            &alice,
            CreateReservation::builder()
                .offering_id(OfferingId::new(7))
                .share_quantity(10)
                .build(),
        )
        .unwrap();
    svc.convert_reservation(&carol, created.id).unwrap();

    // The source system applied transitions unconditionally: a cancel after
    // a convert succeeds and overwrites the decision.
    let cancelled = svc.cancel_reservation(&alice, created.id).unwrap();
    assert_eq!(cancelled.status, ReservationStatus::Cancelled);
}

#[test]
fn payment_flow_from_submission_to_recognition() {
    let svc = service();
    let alice = investor(1);
    let carol = admin(3);
    let investment = InvestmentId::new(41);

    // Alice submits two payments; nothing is recognized yet.
    let wire = svc
        .create_payment(
            &alice,
            CreatePayment::builder()
                .investment_id(investment)
                .payment_method(PaymentMethod::WireTransfer)
                .amount_cents(250_000_00)
                .payment_reference("FEDWIRE-20260806-0042")
                .build(),
        )
        .unwrap();
    let check = svc
        .create_payment(
            &alice,
            CreatePayment::builder()
                .investment_id(investment)
                .payment_method(PaymentMethod::Check)
                .amount_cents(50_000_00)
                .build(),
        )
        .unwrap();
    assert_eq!(svc.investment_payment_total(&alice, investment).unwrap(), 0);
    assert_eq!(svc.pending_payments(&carol).unwrap().len(), 2);

    // Carol verifies the wire and rejects the check.
    svc.verify_payment(
        &carol,
        VerifyPayment::builder()
            .id(wire.id)
            .status(VerificationStatus::Verified)
            .build(),
    )
    .unwrap();
    svc.verify_payment(
        &carol,
        VerifyPayment::builder()
            .id(check.id)
            .status(VerificationStatus::Rejected)
            .notes("no matching deposit")
            .build(),
    )
    .unwrap();

    // Only the verified wire counts toward the investment.
    assert_eq!(svc.investment_payment_total(&alice, investment).unwrap(), 250_000_00);
    assert!(svc.pending_payments(&carol).unwrap().is_empty());

    let rejected = svc.payment(&alice, check.id).unwrap();
    assert_eq!(rejected.verification_status, VerificationStatus::Rejected);
    assert_eq!(rejected.notes.as_deref(), Some("no matching deposit"));
}

#[test]
fn escrow_balance_is_order_independent_sum_of_deltas() {
    // Negative balances are allowed here so both permutations can run
    // through their intermediate states; order-independence is the point.
    let svc = service_with(FlowConfig {
        allow_negative_escrow_balance: true,
        ..Default::default()
    });
    let carol = admin(3);
    let account = svc
        .create_escrow_account(
            &carol,
            investflow_service::CreateEscrowAccount::builder()
                .offering_id(OfferingId::new(7))
                .account_number("ESC-2026-007")
                .bank_name("First Meridian Trust")
                .build(),
        )
        .unwrap();

    // Two permutations of the same deltas land on the same balance.
    let deltas = [50_000_00, -10_000_00, 25_000_00, -5_000_00];
    for delta in deltas {
        svc.update_escrow_balance(&carol, account.id, delta).unwrap();
    }
    let forward = svc.escrow_account(&carol, account.id).unwrap().total_held_cents;

    let account2 = svc
        .create_escrow_account(
            &carol,
            investflow_service::CreateEscrowAccount::builder()
                .offering_id(OfferingId::new(8))
                .account_number("ESC-2026-008")
                .build(),
        )
        .unwrap();
    for delta in deltas.iter().rev() {
        svc.update_escrow_balance(&carol, account2.id, *delta).unwrap();
    }
    let reverse = svc.escrow_account(&carol, account2.id).unwrap().total_held_cents;

    assert_eq!(forward, deltas.iter().sum::<i64>());
    assert_eq!(forward, reverse);
}
