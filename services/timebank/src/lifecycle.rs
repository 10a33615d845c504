//! Booking state machine
//!
//! Pure transition rules over a [`Booking`]: role authorization, state-graph
//! adjacency, and schedule validation. No I/O happens here; the orchestrator
//! runs these checks before it touches the ledger or the database.
//!
//! The state graph is:
//!
//! ```text
//! pending -> confirmed -> completed
//!    \            /
//!     `-> cancelled <-'
//! ```
//!
//! Role table: the provider (booked_for) confirms, the requester (booked_by)
//! completes, and either party may cancel or reschedule.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{TimebankError, TimebankResult};
use crate::models::{Booking, BookingStatus};

/// Role of an actor relative to a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The user who requested the session (booked_by)
    Requester,
    /// The user providing the session (booked_for)
    Provider,
}

/// Resolve the actor's role, rejecting users who are not a party to the
/// booking
pub fn role_of(booking: &Booking, actor: Uuid) -> TimebankResult<Role> {
    if actor == booking.booked_by {
        Ok(Role::Requester)
    } else if actor == booking.booked_for {
        Ok(Role::Provider)
    } else {
        Err(TimebankError::Forbidden(
            "you are not a party to this booking".to_string(),
        ))
    }
}

/// Validate a requested status transition.
///
/// Checks run in a fixed order: terminal-state rejection, role gate,
/// state-graph adjacency, cancel-reason presence.
pub fn check_transition(
    booking: &Booking,
    actor: Uuid,
    target: BookingStatus,
    cancel_reason: Option<&str>,
) -> TimebankResult<()> {
    if booking.status.is_terminal() {
        return Err(TimebankError::InvalidTransition {
            from: booking.status,
            to: target,
        });
    }

    let role = role_of(booking, actor)?;

    match target {
        BookingStatus::Confirmed => {
            if role != Role::Provider {
                return Err(TimebankError::Forbidden(
                    "only the provider can confirm a booking".to_string(),
                ));
            }
            if booking.status != BookingStatus::Pending {
                return Err(TimebankError::InvalidTransition {
                    from: booking.status,
                    to: target,
                });
            }
        }
        BookingStatus::Completed => {
            if role != Role::Requester {
                return Err(TimebankError::Forbidden(
                    "only the requester can complete a booking".to_string(),
                ));
            }
            if booking.status != BookingStatus::Confirmed {
                return Err(TimebankError::InvalidTransition {
                    from: booking.status,
                    to: target,
                });
            }
        }
        BookingStatus::Cancelled => {
            // Either party may cancel a pending or confirmed booking, but a
            // reason is required.
            if cancel_reason.map(str::trim).filter(|r| !r.is_empty()).is_none() {
                return Err(TimebankError::Validation(
                    "cancel_reason is required when cancelling a booking".to_string(),
                ));
            }
        }
        BookingStatus::Pending => {
            return Err(TimebankError::InvalidTransition {
                from: booking.status,
                to: target,
            });
        }
    }

    Ok(())
}

/// A scheduled time must be strictly in the future
pub fn check_schedule(scheduled_time: DateTime<Utc>, now: DateTime<Utc>) -> TimebankResult<()> {
    if scheduled_time <= now {
        return Err(TimebankError::Validation(
            "scheduled time must be in the future".to_string(),
        ));
    }
    Ok(())
}

/// Duration is expressed in whole minutes and must be positive
pub fn check_duration(duration_minutes: i32) -> TimebankResult<()> {
    if duration_minutes <= 0 {
        return Err(TimebankError::Validation(
            "duration must be a positive number of minutes".to_string(),
        ));
    }
    Ok(())
}

/// Validate a reschedule request: party-only, pending or confirmed bookings
/// only, and the new time must be strictly in the future
pub fn check_reschedule(
    booking: &Booking,
    actor: Uuid,
    new_time: DateTime<Utc>,
    now: DateTime<Utc>,
) -> TimebankResult<()> {
    role_of(booking, actor)?;

    if !matches!(
        booking.status,
        BookingStatus::Pending | BookingStatus::Confirmed
    ) {
        return Err(TimebankError::Validation(
            "only pending or confirmed bookings can be rescheduled".to_string(),
        ));
    }

    check_schedule(new_time, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            skill_id: Uuid::new_v4(),
            booked_by: Uuid::new_v4(),
            booked_for: Uuid::new_v4(),
            status,
            scheduled_time: Utc::now() + Duration::days(1),
            duration_minutes: 60,
            cancel_reason: None,
            availability_slot_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn provider_confirms_pending() {
        let b = booking(BookingStatus::Pending);
        assert!(check_transition(&b, b.booked_for, BookingStatus::Confirmed, None).is_ok());
    }

    #[test]
    fn requester_cannot_confirm() {
        let b = booking(BookingStatus::Pending);
        let err = check_transition(&b, b.booked_by, BookingStatus::Confirmed, None).unwrap_err();
        assert!(matches!(err, TimebankError::Forbidden(_)));
    }

    #[test]
    fn stranger_is_rejected() {
        let b = booking(BookingStatus::Pending);
        let err =
            check_transition(&b, Uuid::new_v4(), BookingStatus::Confirmed, None).unwrap_err();
        assert!(matches!(err, TimebankError::Forbidden(_)));
    }

    #[test]
    fn requester_completes_confirmed() {
        let b = booking(BookingStatus::Confirmed);
        assert!(check_transition(&b, b.booked_by, BookingStatus::Completed, None).is_ok());
    }

    #[test]
    fn provider_cannot_complete() {
        let b = booking(BookingStatus::Confirmed);
        let err = check_transition(&b, b.booked_for, BookingStatus::Completed, None).unwrap_err();
        assert!(matches!(err, TimebankError::Forbidden(_)));
    }

    #[test]
    fn cannot_complete_pending() {
        let b = booking(BookingStatus::Pending);
        let err = check_transition(&b, b.booked_by, BookingStatus::Completed, None).unwrap_err();
        assert!(matches!(err, TimebankError::InvalidTransition { .. }));
    }

    #[test]
    fn cannot_confirm_twice() {
        let b = booking(BookingStatus::Confirmed);
        let err = check_transition(&b, b.booked_for, BookingStatus::Confirmed, None).unwrap_err();
        assert!(matches!(err, TimebankError::InvalidTransition { .. }));
    }

    #[test]
    fn either_party_cancels_with_reason() {
        let b = booking(BookingStatus::Pending);
        assert!(
            check_transition(&b, b.booked_by, BookingStatus::Cancelled, Some("conflict")).is_ok()
        );
        assert!(
            check_transition(&b, b.booked_for, BookingStatus::Cancelled, Some("conflict")).is_ok()
        );
        let c = booking(BookingStatus::Confirmed);
        assert!(
            check_transition(&c, c.booked_by, BookingStatus::Cancelled, Some("conflict")).is_ok()
        );
    }

    #[test]
    fn cancel_requires_reason() {
        let b = booking(BookingStatus::Pending);
        let err = check_transition(&b, b.booked_by, BookingStatus::Cancelled, None).unwrap_err();
        assert!(matches!(err, TimebankError::Validation(_)));

        let err =
            check_transition(&b, b.booked_by, BookingStatus::Cancelled, Some("  ")).unwrap_err();
        assert!(matches!(err, TimebankError::Validation(_)));
    }

    #[test]
    fn terminal_states_are_immutable() {
        for terminal in [BookingStatus::Completed, BookingStatus::Cancelled] {
            let b = booking(terminal);
            for target in [
                BookingStatus::Pending,
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ] {
                let err =
                    check_transition(&b, b.booked_by, target, Some("reason")).unwrap_err();
                assert!(
                    matches!(err, TimebankError::InvalidTransition { .. }),
                    "expected InvalidTransition from {terminal} to {target}"
                );
            }
        }
    }

    #[test]
    fn nothing_transitions_back_to_pending() {
        let b = booking(BookingStatus::Confirmed);
        let err = check_transition(&b, b.booked_by, BookingStatus::Pending, None).unwrap_err();
        assert!(matches!(err, TimebankError::InvalidTransition { .. }));
    }

    #[test]
    fn schedule_must_be_future() {
        let now = Utc::now();
        assert!(check_schedule(now + Duration::minutes(5), now).is_ok());
        assert!(check_schedule(now, now).is_err());
        assert!(check_schedule(now - Duration::minutes(5), now).is_err());
    }

    #[test]
    fn duration_must_be_positive() {
        assert!(check_duration(30).is_ok());
        assert!(check_duration(0).is_err());
        assert!(check_duration(-15).is_err());
    }

    #[test]
    fn reschedule_rules() {
        let now = Utc::now();
        let future = now + Duration::days(2);

        let b = booking(BookingStatus::Pending);
        assert!(check_reschedule(&b, b.booked_by, future, now).is_ok());
        assert!(check_reschedule(&b, b.booked_for, future, now).is_ok());

        // past target time
        let err = check_reschedule(&b, b.booked_by, now - Duration::hours(1), now).unwrap_err();
        assert!(matches!(err, TimebankError::Validation(_)));

        // non-party
        let err = check_reschedule(&b, Uuid::new_v4(), future, now).unwrap_err();
        assert!(matches!(err, TimebankError::Forbidden(_)));

        // terminal states cannot be rescheduled
        for status in [BookingStatus::Completed, BookingStatus::Cancelled] {
            let b = booking(status);
            let err = check_reschedule(&b, b.booked_by, future, now).unwrap_err();
            assert!(matches!(err, TimebankError::Validation(_)));
        }
    }
}
