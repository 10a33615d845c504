//! Booking orchestrator
//!
//! Single entry point for every booking state change. Each operation opens
//! one transaction, locks the booking row first, runs the pure lifecycle
//! checks, dispatches the ledger and slot side effects, and persists the new
//! state before committing. Notifications go out only after a successful
//! commit.

use chrono::Utc;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::error::{TimebankError, TimebankResult};
use crate::ledger::Ledger;
use crate::lifecycle;
use crate::models::{
    Booking, BookingStatus, NewBooking, NewReview, NotificationKind, Reschedule, Review,
    TransferRequest,
};
use crate::notifier::Notifier;
use crate::repositories::{
    BookingRepository, DirectoryRepository, ReviewRepository, SlotRepository, StatsRepository,
    WalletRepository,
};

/// Orchestrates booking state changes and their ledger side effects
#[derive(Clone)]
pub struct BookingService {
    pool: PgPool,
    bookings: BookingRepository,
    slots: SlotRepository,
    wallets: WalletRepository,
    directory: DirectoryRepository,
    stats: StatsRepository,
    reviews: ReviewRepository,
    ledger: Ledger,
    notifier: Notifier,
}

impl BookingService {
    /// Create a new booking service
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: PgPool,
        bookings: BookingRepository,
        slots: SlotRepository,
        wallets: WalletRepository,
        directory: DirectoryRepository,
        stats: StatsRepository,
        reviews: ReviewRepository,
        ledger: Ledger,
        notifier: Notifier,
    ) -> Self {
        Self {
            pool,
            bookings,
            slots,
            wallets,
            directory,
            stats,
            reviews,
            ledger,
            notifier,
        }
    }

    /// Create a booking in the pending state.
    ///
    /// The availability slot, when given, must belong to the provider and be
    /// free; it is reserved in the same transaction as the booking insert so
    /// two concurrent requests cannot double-book it. Wallets for both
    /// parties are provisioned if they do not exist yet.
    pub async fn create(&self, actor: Uuid, new: &NewBooking) -> TimebankResult<Booking> {
        lifecycle::check_schedule(new.scheduled_time, Utc::now())?;
        lifecycle::check_duration(new.duration_minutes)?;
        if new.booked_for == actor {
            return Err(TimebankError::Validation(
                "cannot book a session with yourself".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        if !self.directory.user_exists(&mut *tx, new.booked_for).await? {
            return Err(TimebankError::NotFound("user"));
        }
        if !self.directory.skill_exists(&mut *tx, new.skill_id).await? {
            return Err(TimebankError::NotFound("skill"));
        }

        if let Some(slot_id) = new.availability_slot_id {
            let slot = self
                .slots
                .fetch_locked(&mut *tx, slot_id)
                .await?
                .ok_or(TimebankError::NotFound("availability slot"))?;
            if slot.owner_id != new.booked_for {
                return Err(TimebankError::Validation(
                    "availability slot does not belong to the provider".to_string(),
                ));
            }
            if !self.slots.reserve(&mut *tx, slot_id).await? {
                return Err(TimebankError::Validation(
                    "availability slot is already booked".to_string(),
                ));
            }
        }

        self.wallets.ensure(&mut *tx, actor).await?;
        self.wallets.ensure(&mut *tx, new.booked_for).await?;

        let booking = self.bookings.insert(&mut *tx, actor, new).await?;

        tx.commit().await?;

        info!(booking_id = %booking.id, "booking created");
        self.notifier
            .notify(
                booking.booked_for,
                NotificationKind::BookingRequest,
                format!(
                    "You have a new booking request scheduled for {}.",
                    booking.scheduled_time.format("%Y-%m-%d %H:%M UTC")
                ),
            )
            .await;

        Ok(booking)
    }

    /// Apply a status transition to a booking.
    ///
    /// Validation, the ledger side effects, and the status write all happen
    /// inside one transaction serialized on the booking row; any failure
    /// rolls everything back and the caller sees the specific error.
    pub async fn transition(
        &self,
        booking_id: Uuid,
        actor: Uuid,
        target: BookingStatus,
        cancel_reason: Option<&str>,
    ) -> TimebankResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let booking = self.bookings.fetch_for_update(&mut *tx, booking_id).await?;
        lifecycle::check_transition(&booking, actor, target, cancel_reason)?;

        match target {
            BookingStatus::Confirmed => {
                self.ledger.open_pending(&mut *tx, &booking).await?;
            }
            BookingStatus::Completed => {
                self.ledger.settle_on_completion(&mut *tx, &booking).await?;
            }
            BookingStatus::Cancelled => {
                self.ledger.void_on_cancellation(&mut *tx, &booking).await?;
                if let Some(slot_id) = booking.availability_slot_id {
                    self.slots.release(&mut *tx, slot_id).await?;
                }
            }
            // check_transition rejects pending as a target
            BookingStatus::Pending => {}
        }

        let reason = if target == BookingStatus::Cancelled {
            cancel_reason.map(str::trim)
        } else {
            None
        };
        self.bookings
            .set_status(&mut *tx, booking_id, target, reason)
            .await?;

        if target == BookingStatus::Completed {
            // The aggregates read booking rows by status, so this runs after
            // the status write, still inside the same transaction.
            self.stats.recompute(&mut *tx, booking.booked_for).await?;
            self.stats.recompute(&mut *tx, booking.booked_by).await?;
        }

        tx.commit().await?;

        info!(
            booking_id = %booking_id,
            from = %booking.status,
            to = %target,
            "booking transition applied"
        );
        self.notify_transition(&booking, actor, target, reason).await;

        let mut updated = booking;
        updated.status = target;
        updated.cancel_reason = reason.map(str::to_string);
        Ok(updated)
    }

    /// Move a pending or confirmed booking to a new time and, optionally, a
    /// new duration. A confirmed booking's pending reservation is repriced
    /// when the duration changes.
    pub async fn reschedule(
        &self,
        booking_id: Uuid,
        actor: Uuid,
        change: &Reschedule,
    ) -> TimebankResult<Booking> {
        let mut tx = self.pool.begin().await?;

        let booking = self.bookings.fetch_for_update(&mut *tx, booking_id).await?;
        lifecycle::check_reschedule(&booking, actor, change.scheduled_time, Utc::now())?;

        let duration = match change.duration_minutes {
            Some(d) => {
                lifecycle::check_duration(d)?;
                d
            }
            None => booking.duration_minutes,
        };

        if booking.status == BookingStatus::Confirmed && duration != booking.duration_minutes {
            self.ledger.reprice_pending(&mut *tx, &booking, duration).await?;
        }

        self.bookings
            .set_schedule(&mut *tx, booking_id, change.scheduled_time, duration)
            .await?;

        tx.commit().await?;

        let counterparty = if actor == booking.booked_by {
            booking.booked_for
        } else {
            booking.booked_by
        };
        self.notifier
            .notify(
                counterparty,
                NotificationKind::BookingStatus,
                format!(
                    "Your booking was rescheduled to {}.",
                    change.scheduled_time.format("%Y-%m-%d %H:%M UTC")
                ),
            )
            .await;

        let mut updated = booking;
        updated.scheduled_time = change.scheduled_time;
        updated.duration_minutes = duration;
        Ok(updated)
    }

    /// Direct wallet-to-wallet transfer of time-credits
    pub async fn transfer(&self, actor: Uuid, request: &TransferRequest) -> TimebankResult<()> {
        let mut tx = self.pool.begin().await?;

        if !self.directory.user_exists(&mut *tx, request.receiver_id).await? {
            return Err(TimebankError::NotFound("user"));
        }

        self.wallets.ensure(&mut *tx, actor).await?;
        self.wallets.ensure(&mut *tx, request.receiver_id).await?;

        let reason = request.reason.as_deref().unwrap_or("");
        self.ledger
            .transfer(&mut *tx, actor, request.receiver_id, request.amount, reason)
            .await?;

        tx.commit().await?;

        self.notifier
            .notify(
                request.receiver_id,
                NotificationKind::Transfer,
                format!("You received {} time-credits.", request.amount),
            )
            .await;

        Ok(())
    }

    /// Review a completed booking. Only the requester may review, once per
    /// booking.
    pub async fn submit_review(&self, actor: Uuid, new: &NewReview) -> TimebankResult<Review> {
        if !(1..=5).contains(&new.rating) {
            return Err(TimebankError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }

        let booking = self
            .bookings
            .fetch(new.booking_id)
            .await?
            .ok_or(TimebankError::NotFound("booking"))?;

        if booking.status != BookingStatus::Completed {
            return Err(TimebankError::Validation(
                "only completed bookings can be reviewed".to_string(),
            ));
        }
        if actor != booking.booked_by {
            return Err(TimebankError::Forbidden(
                "only the requester can review a booking".to_string(),
            ));
        }

        let review = self
            .reviews
            .insert(
                new.booking_id,
                actor,
                new.rating,
                new.comment.as_deref().unwrap_or(""),
            )
            .await?;

        self.notifier
            .notify(
                booking.booked_for,
                NotificationKind::Review,
                format!("You received a {}-star review.", new.rating),
            )
            .await;

        Ok(review)
    }

    async fn notify_transition(
        &self,
        booking: &Booking,
        actor: Uuid,
        target: BookingStatus,
        reason: Option<&str>,
    ) {
        match target {
            BookingStatus::Confirmed => {
                self.notifier
                    .notify(
                        booking.booked_by,
                        NotificationKind::BookingStatus,
                        "Your booking request was confirmed by the provider.".to_string(),
                    )
                    .await;
            }
            BookingStatus::Completed => {
                let amount = Ledger::hours_for_duration(booking.duration_minutes);
                self.notifier
                    .notify(
                        booking.booked_for,
                        NotificationKind::BookingStatus,
                        format!("Booking completed: you received {amount} time-credits."),
                    )
                    .await;
            }
            BookingStatus::Cancelled => {
                let counterparty = if actor == booking.booked_by {
                    booking.booked_for
                } else {
                    booking.booked_by
                };
                self.notifier
                    .notify(
                        counterparty,
                        NotificationKind::BookingStatus,
                        format!(
                            "Your booking was cancelled: {}.",
                            reason.unwrap_or("no reason given")
                        ),
                    )
                    .await;
            }
            BookingStatus::Pending => {}
        }
    }
}
