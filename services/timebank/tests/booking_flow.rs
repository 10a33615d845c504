//! Integration tests for the booking lifecycle
//!
//! Each test drives the orchestrator against a real PostgreSQL instance;
//! they are ignored unless a provisioned database is available via
//! DATABASE_URL.

mod support;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serial_test::serial;

use timebank::error::TimebankError;
use timebank::models::{BookingStatus, NewSlot, Reschedule, TransactionKind};
use timebank::repositories::SlotRepository;

use support::{
    balance_of, booking_payload, create_skill, create_user, service, set_balance, test_pool,
    transaction_count,
};

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn confirm_then_complete_moves_one_credit() -> Result<(), Box<dyn std::error::Error>> {
    let pool = test_pool().await?;
    let svc = service(&pool);

    let requester = create_user(&pool, "requester").await?;
    let provider = create_user(&pool, "provider").await?;
    let skill = create_skill(&pool).await?;

    let booking = svc
        .create(requester, &booking_payload(skill, provider, 60))
        .await?;
    assert_eq!(booking.status, BookingStatus::Pending);

    // Confirmation opens a pending transaction but moves no funds.
    let booking = svc
        .transition(booking.id, provider, BookingStatus::Confirmed, None)
        .await?;
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(balance_of(&pool, requester).await?, Decimal::new(1000, 2));
    assert_eq!(balance_of(&pool, provider).await?, Decimal::new(1000, 2));
    assert_eq!(transaction_count(&pool, booking.id).await?, 1);

    // Completion settles: requester pays 1.00, provider earns 1.00.
    let booking = svc
        .transition(booking.id, requester, BookingStatus::Completed, None)
        .await?;
    assert_eq!(booking.status, BookingStatus::Completed);
    assert_eq!(balance_of(&pool, requester).await?, Decimal::new(900, 2));
    assert_eq!(balance_of(&pool, provider).await?, Decimal::new(1100, 2));

    // The pending record became a debit, paired with a credit.
    let kinds: Vec<TransactionKind> = sqlx::query_scalar(
        "SELECT kind FROM transactions WHERE booking_id = $1 ORDER BY created_at, kind",
    )
    .bind(booking.id)
    .fetch_all(&pool)
    .await?;
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&TransactionKind::Debit));
    assert!(kinds.contains(&TransactionKind::Credit));

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn confirm_fails_closed_on_insufficient_balance() -> Result<(), Box<dyn std::error::Error>> {
    let pool = test_pool().await?;
    let svc = service(&pool);

    let requester = create_user(&pool, "requester").await?;
    let provider = create_user(&pool, "provider").await?;
    let skill = create_skill(&pool).await?;

    set_balance(&pool, requester, Decimal::new(50, 2)).await?;

    let booking = svc
        .create(requester, &booking_payload(skill, provider, 60))
        .await?;

    let err = svc
        .transition(booking.id, provider, BookingStatus::Confirmed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TimebankError::InsufficientFunds { .. }));

    // The booking stays pending and no transaction was created.
    let status: BookingStatus = sqlx::query_scalar("SELECT status FROM bookings WHERE id = $1")
        .bind(booking.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(status, BookingStatus::Pending);
    assert_eq!(transaction_count(&pool, booking.id).await?, 0);
    assert_eq!(balance_of(&pool, requester).await?, Decimal::new(50, 2));

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn cancelling_pending_booking_releases_slot() -> Result<(), Box<dyn std::error::Error>> {
    let pool = test_pool().await?;
    let svc = service(&pool);
    let slots = SlotRepository::new(pool.clone());

    let requester = create_user(&pool, "requester").await?;
    let provider = create_user(&pool, "provider").await?;
    let skill = create_skill(&pool).await?;

    let slot = slots
        .create(
            provider,
            &NewSlot {
                weekday: 2,
                start_time: "09:00:00".parse()?,
                end_time: "11:00:00".parse()?,
            },
        )
        .await?;

    let mut payload = booking_payload(skill, provider, 60);
    payload.availability_slot_id = Some(slot.id);

    let booking = svc.create(requester, &payload).await?;

    // Creation reserved the slot.
    let slot = slots.fetch(slot.id).await?.unwrap();
    assert!(slot.is_booked);

    let booking = svc
        .transition(
            booking.id,
            requester,
            BookingStatus::Cancelled,
            Some("schedule conflict"),
        )
        .await?;
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(booking.cancel_reason.as_deref(), Some("schedule conflict"));

    // Cancellation released the slot and left no ledger records behind.
    let slot = slots.fetch(slot.id).await?.unwrap();
    assert!(!slot.is_booked);
    assert_eq!(transaction_count(&pool, booking.id).await?, 0);

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn cancel_without_reason_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let pool = test_pool().await?;
    let svc = service(&pool);

    let requester = create_user(&pool, "requester").await?;
    let provider = create_user(&pool, "provider").await?;
    let skill = create_skill(&pool).await?;

    let booking = svc
        .create(requester, &booking_payload(skill, provider, 60))
        .await?;

    let err = svc
        .transition(booking.id, requester, BookingStatus::Cancelled, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TimebankError::Validation(_)));

    let status: BookingStatus = sqlx::query_scalar("SELECT status FROM bookings WHERE id = $1")
        .bind(booking.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(status, BookingStatus::Pending);

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn requester_cannot_confirm_own_booking() -> Result<(), Box<dyn std::error::Error>> {
    let pool = test_pool().await?;
    let svc = service(&pool);

    let requester = create_user(&pool, "requester").await?;
    let provider = create_user(&pool, "provider").await?;
    let skill = create_skill(&pool).await?;

    let booking = svc
        .create(requester, &booking_payload(skill, provider, 60))
        .await?;

    let err = svc
        .transition(booking.id, requester, BookingStatus::Confirmed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TimebankError::Forbidden(_)));

    let status: BookingStatus = sqlx::query_scalar("SELECT status FROM bookings WHERE id = $1")
        .bind(booking.id)
        .fetch_one(&pool)
        .await?;
    assert_eq!(status, BookingStatus::Pending);

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn reschedule_to_past_time_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let pool = test_pool().await?;
    let svc = service(&pool);

    let requester = create_user(&pool, "requester").await?;
    let provider = create_user(&pool, "provider").await?;
    let skill = create_skill(&pool).await?;

    let booking = svc
        .create(requester, &booking_payload(skill, provider, 60))
        .await?;
    let booking = svc
        .transition(booking.id, provider, BookingStatus::Confirmed, None)
        .await?;

    let err = svc
        .reschedule(
            booking.id,
            requester,
            &Reschedule {
                scheduled_time: Utc::now() - Duration::hours(3),
                duration_minutes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TimebankError::Validation(_)));

    let stored: chrono::DateTime<Utc> =
        sqlx::query_scalar("SELECT scheduled_time FROM bookings WHERE id = $1")
            .bind(booking.id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(stored, booking.scheduled_time);

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn concurrent_completions_settle_exactly_once() -> Result<(), Box<dyn std::error::Error>> {
    let pool = test_pool().await?;
    let svc = service(&pool);

    let requester = create_user(&pool, "requester").await?;
    let provider = create_user(&pool, "provider").await?;
    let skill = create_skill(&pool).await?;

    let booking = svc
        .create(requester, &booking_payload(skill, provider, 60))
        .await?;
    svc.transition(booking.id, provider, BookingStatus::Confirmed, None)
        .await?;

    let first = svc.transition(booking.id, requester, BookingStatus::Completed, None);
    let second = svc.transition(booking.id, requester, BookingStatus::Completed, None);
    let (a, b) = tokio::join!(first, second);

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "exactly one completion must win");

    let losing_err = if a.is_err() {
        a.unwrap_err()
    } else {
        b.unwrap_err()
    };
    assert!(matches!(losing_err, TimebankError::InvalidTransition { .. }));

    // Exactly one transfer happened.
    assert_eq!(balance_of(&pool, requester).await?, Decimal::new(900, 2));
    assert_eq!(balance_of(&pool, provider).await?, Decimal::new(1100, 2));

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn slot_cannot_be_double_booked() -> Result<(), Box<dyn std::error::Error>> {
    let pool = test_pool().await?;
    let svc = service(&pool);
    let slots = SlotRepository::new(pool.clone());

    let first_requester = create_user(&pool, "requester").await?;
    let second_requester = create_user(&pool, "requester").await?;
    let provider = create_user(&pool, "provider").await?;
    let skill = create_skill(&pool).await?;

    let slot = slots
        .create(
            provider,
            &NewSlot {
                weekday: 4,
                start_time: "14:00:00".parse()?,
                end_time: "15:00:00".parse()?,
            },
        )
        .await?;

    let mut payload = booking_payload(skill, provider, 60);
    payload.availability_slot_id = Some(slot.id);

    svc.create(first_requester, &payload).await?;

    let err = svc.create(second_requester, &payload).await.unwrap_err();
    assert!(matches!(err, TimebankError::Validation(_)));

    Ok(())
}

#[tokio::test]
#[serial]
#[ignore = "requires a running PostgreSQL instance"]
async fn creation_validation_rejects_bad_input() -> Result<(), Box<dyn std::error::Error>> {
    let pool = test_pool().await?;
    let svc = service(&pool);
    let slots = SlotRepository::new(pool.clone());

    let requester = create_user(&pool, "requester").await?;
    let provider = create_user(&pool, "provider").await?;
    let stranger = create_user(&pool, "stranger").await?;
    let skill = create_skill(&pool).await?;

    // Past scheduled time.
    let mut payload = booking_payload(skill, provider, 60);
    payload.scheduled_time = Utc::now() - Duration::hours(1);
    let err = svc.create(requester, &payload).await.unwrap_err();
    assert!(matches!(err, TimebankError::Validation(_)));

    // Non-positive duration.
    let payload = booking_payload(skill, provider, 0);
    let err = svc.create(requester, &payload).await.unwrap_err();
    assert!(matches!(err, TimebankError::Validation(_)));

    // Slot owned by someone other than the provider.
    let foreign_slot = slots
        .create(
            stranger,
            &NewSlot {
                weekday: 1,
                start_time: "10:00:00".parse()?,
                end_time: "12:00:00".parse()?,
            },
        )
        .await?;
    let mut payload = booking_payload(skill, provider, 60);
    payload.availability_slot_id = Some(foreign_slot.id);
    let err = svc.create(requester, &payload).await.unwrap_err();
    assert!(matches!(err, TimebankError::Validation(_)));

    Ok(())
}
