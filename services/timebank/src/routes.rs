//! Timebank service routes
//!
//! Thin JSON handlers: extract the caller, delegate to the orchestrator or a
//! repository, and let the domain error map itself to a response. No
//! business logic lives here.

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, Query, State},
    http::{StatusCode, request::Parts},
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::TimebankError,
    models::{
        HistoryQuery, HistoryResponse, LeaderboardQuery, NewBooking, NewReview, NewSlot, NewUser,
        Reschedule, ReviewQuery, StatusChange, TransferRequest,
    },
    state::AppState,
};

/// Caller identity taken from the `x-user-id` header.
///
/// Authentication itself is out of scope for this service; upstream
/// infrastructure is expected to resolve the session and set this header.
pub struct ActorId(pub Uuid);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ActorId
where
    S: Send + Sync,
{
    type Rejection = TimebankError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(ActorId)
            .ok_or(TimebankError::Unauthorized)
    }
}

/// Create the router for the timebank service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/users", post(create_user))
        .route("/users/:id/slots", get(list_user_slots))
        .route("/slots", post(create_slot).get(list_my_slots))
        .route("/slots/:id", delete(delete_slot))
        .route("/bookings", post(create_booking).get(list_my_bookings))
        .route("/bookings/:id", get(get_booking))
        .route("/bookings/:id/status", patch(update_booking_status))
        .route("/bookings/:id/reschedule", patch(reschedule_booking))
        .route("/wallet", get(get_wallet))
        .route("/wallet/transactions", get(list_transactions))
        .route("/transfers", post(create_transfer))
        .route("/leaderboard", get(get_leaderboard))
        .route("/notifications", get(list_notifications))
        .route("/notifications/:id/read", patch(mark_notification_read))
        .route("/reviews", post(create_review).get(list_reviews))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "timebank"
    }))
}

/// Register a user and provision their wallet
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, TimebankError> {
    let user = state.directory.create_user(&payload).await?;
    let wallet = state.wallets.get_or_create(user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "user": user, "wallet": wallet })),
    ))
}

/// List availability slots for a specific user
pub async fn list_user_slots(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, TimebankError> {
    state
        .directory
        .fetch_user(user_id)
        .await?
        .ok_or(TimebankError::NotFound("user"))?;

    let slots = state.slots.list_for_owner(user_id).await?;
    Ok(Json(slots))
}

/// Create an availability slot for the caller
pub async fn create_slot(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Json(payload): Json<NewSlot>,
) -> Result<impl IntoResponse, TimebankError> {
    let slot = state.slots.create(actor, &payload).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

/// List the caller's availability slots
pub async fn list_my_slots(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
) -> Result<impl IntoResponse, TimebankError> {
    let slots = state.slots.list_for_owner(actor).await?;
    Ok(Json(slots))
}

/// Delete one of the caller's availability slots
pub async fn delete_slot(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(slot_id): Path<Uuid>,
) -> Result<impl IntoResponse, TimebankError> {
    let slot = state
        .slots
        .fetch(slot_id)
        .await?
        .ok_or(TimebankError::NotFound("availability slot"))?;

    if slot.owner_id != actor {
        return Err(TimebankError::Forbidden(
            "you do not have permission to modify this slot".to_string(),
        ));
    }

    state.slots.delete(slot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create a new booking
pub async fn create_booking(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Json(payload): Json<NewBooking>,
) -> Result<impl IntoResponse, TimebankError> {
    let booking = state.booking_service.create(actor, &payload).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// List all bookings the caller is a party to
pub async fn list_my_bookings(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
) -> Result<impl IntoResponse, TimebankError> {
    let bookings = state.bookings.list_for_user(actor).await?;
    Ok(Json(bookings))
}

/// Retrieve a single booking; only its parties may view it
pub async fn get_booking(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(booking_id): Path<Uuid>,
) -> Result<impl IntoResponse, TimebankError> {
    let booking = state
        .bookings
        .fetch(booking_id)
        .await?
        .ok_or(TimebankError::NotFound("booking"))?;

    if actor != booking.booked_by && actor != booking.booked_for {
        return Err(TimebankError::Forbidden(
            "you are not allowed to view this booking".to_string(),
        ));
    }

    Ok(Json(booking))
}

/// Update the status of a booking (confirm, complete, cancel)
pub async fn update_booking_status(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<StatusChange>,
) -> Result<impl IntoResponse, TimebankError> {
    let booking = state
        .booking_service
        .transition(
            booking_id,
            actor,
            payload.status,
            payload.cancel_reason.as_deref(),
        )
        .await?;

    Ok(Json(booking))
}

/// Reschedule a booking
pub async fn reschedule_booking(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<Reschedule>,
) -> Result<impl IntoResponse, TimebankError> {
    let booking = state
        .booking_service
        .reschedule(booking_id, actor, &payload)
        .await?;

    Ok(Json(booking))
}

/// Show the caller's wallet, provisioning it on first access
pub async fn get_wallet(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
) -> Result<impl IntoResponse, TimebankError> {
    let wallet = state.wallets.get_or_create(actor).await?;
    Ok(Json(wallet))
}

/// Paginated transaction history for the caller's wallet
pub async fn list_transactions(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse, TimebankError> {
    let (items, total) = state.transactions.history_for_user(actor, &query).await?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);

    Ok(Json(HistoryResponse {
        items,
        page,
        limit,
        total,
    }))
}

/// Transfer time-credits directly to another user
pub async fn create_transfer(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Json(payload): Json<TransferRequest>,
) -> Result<impl IntoResponse, TimebankError> {
    state.booking_service.transfer(actor, &payload).await?;
    Ok(Json(json!({ "message": "transfer completed" })))
}

/// Top providers by hours given
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<impl IntoResponse, TimebankError> {
    let entries = state.stats.leaderboard(query.limit.unwrap_or(10)).await?;
    Ok(Json(entries))
}

/// List the caller's notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
) -> Result<impl IntoResponse, TimebankError> {
    let notifications = state.notifications.list_for_user(actor).await?;
    Ok(Json(notifications))
}

/// Mark one of the caller's notifications as read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Path(notification_id): Path<Uuid>,
) -> Result<impl IntoResponse, TimebankError> {
    if !state.notifications.mark_read(notification_id, actor).await? {
        return Err(TimebankError::NotFound("notification"));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Submit a review for a completed booking
pub async fn create_review(
    State(state): State<AppState>,
    ActorId(actor): ActorId,
    Json(payload): Json<NewReview>,
) -> Result<impl IntoResponse, TimebankError> {
    let review = state.booking_service.submit_review(actor, &payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// List reviews, optionally filtered by booking or reviewed user
pub async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> Result<impl IntoResponse, TimebankError> {
    let reviews = state.reviews.list(&query).await?;
    Ok(Json(reviews))
}
