use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::error;

use super::domain::ObjectId;
use super::service::{FeedbackError, FeedbackService, FeedbackSubmission};
use super::store::{FeedbackStore, StoreError};

/// Router builder exposing HTTP endpoints for feedback submission and ratings.
pub fn feedback_router<S>(service: Arc<FeedbackService<S>>) -> Router
where
    S: FeedbackStore + 'static,
{
    Router::new()
        .route("/api/v1/feedback", post(submit_handler::<S>))
        .route(
            "/api/v1/bookings/:booking_id/feedback/terms",
            get(terms_handler::<S>),
        )
        .route(
            "/api/v1/users/:user_id/feedback/required",
            get(required_handler::<S>),
        )
        .route(
            "/api/v1/users/:user_id/feedback/average",
            get(average_handler::<S>),
        )
        .with_state(service)
}

impl FeedbackError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FeedbackError::UserRequired
            | FeedbackError::BookingRequired
            | FeedbackError::ValueRequired => StatusCode::BAD_REQUEST,
            FeedbackError::FeedbackAlreadyProvided
            | FeedbackError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
            FeedbackError::BookingNotFound | FeedbackError::NoFeedbackAvailable => {
                StatusCode::NOT_FOUND
            }
            FeedbackError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for FeedbackError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.code(), error = %self, "feedback request failed");
        }

        let payload = json!({
            "code": self.code(),
            "error": self.to_string(),
        });
        (status, axum::Json(payload)).into_response()
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<FeedbackService<S>>>,
    axum::Json(submission): axum::Json<FeedbackSubmission>,
) -> Response
where
    S: FeedbackStore + 'static,
{
    match service.submit(submission) {
        Ok(feedback) => (StatusCode::CREATED, axum::Json(feedback)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn terms_handler<S>(
    State(service): State<Arc<FeedbackService<S>>>,
    Path(booking_id): Path<String>,
) -> Response
where
    S: FeedbackStore + 'static,
{
    match service.get_terms(&ObjectId(booking_id)) {
        Ok(terms) => (StatusCode::OK, axum::Json(terms)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn required_handler<S>(
    State(service): State<Arc<FeedbackService<S>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: FeedbackStore + 'static,
{
    match service.get_required(&ObjectId(user_id)) {
        Ok(bookings) => (StatusCode::OK, axum::Json(bookings)).into_response(),
        Err(error) => error.into_response(),
    }
}

pub(crate) async fn average_handler<S>(
    State(service): State<Arc<FeedbackService<S>>>,
    Path(user_id): Path<String>,
) -> Response
where
    S: FeedbackStore + 'static,
{
    match service.get_average_user_rating(&ObjectId(user_id)) {
        Ok(rating) => (StatusCode::OK, axum::Json(rating)).into_response(),
        Err(error) => error.into_response(),
    }
}
