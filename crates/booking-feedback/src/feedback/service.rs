use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::average::{average, AverageRating};
use super::domain::{
    Acl, Booking, BookingStatus, FeedbackTerm, ObjectId, Pointer, Related, TermStatus,
    UserFeedback,
};
use super::rating::{cap_value, coerce, RatingValue};
use super::store::{
    BookingOrder, BookingQuery, FeedbackQuery, FeedbackStore, Include, StoreError, TermQuery,
};
use crate::config::FeedbackConfig;

/// Feedback payload as received from a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    #[serde(default)]
    pub user: Option<ObjectId>,
    #[serde(default)]
    pub booking_id: Option<ObjectId>,
    #[serde(default)]
    pub terms: BTreeMap<String, RatingValue>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub value: Option<RatingValue>,
}

/// Service handling feedback submission, term lookup, and rating aggregation.
pub struct FeedbackService<S> {
    store: Arc<S>,
    config: FeedbackConfig,
}

impl<S> FeedbackService<S>
where
    S: FeedbackStore + 'static,
{
    pub fn new(store: Arc<S>, config: FeedbackConfig) -> Self {
        Self { store, config }
    }

    /// Create feedback for a booking and link the booking back to it.
    ///
    /// Linking happens after creation; if it fails the feedback record stays behind
    /// unlinked and the linking error is returned.
    pub fn submit(&self, submission: FeedbackSubmission) -> Result<UserFeedback, FeedbackError> {
        let (feedback_id, feedback) = self.insert_feedback(submission)?;
        let booking_id = feedback.booking.object_id.clone();

        if let Err(err) = self.connect_booking(&feedback_id, &booking_id) {
            warn!(
                feedback = %feedback_id,
                booking = %booking_id,
                error = %err,
                "feedback stored but booking link failed"
            );
            return Err(err);
        }

        Ok(feedback)
    }

    /// Validate, sanitize, and persist a new feedback record.
    pub fn create(&self, submission: FeedbackSubmission) -> Result<UserFeedback, FeedbackError> {
        let (_, feedback) = self.insert_feedback(submission)?;
        Ok(feedback)
    }

    fn insert_feedback(
        &self,
        submission: FeedbackSubmission,
    ) -> Result<(ObjectId, UserFeedback), FeedbackError> {
        let FeedbackSubmission {
            user,
            booking_id,
            terms,
            source,
            comment,
            value,
        } = submission;

        let user = user
            .filter(|id| !id.is_blank())
            .ok_or(FeedbackError::UserRequired)?;
        let booking_id = booking_id
            .filter(|id| !id.is_blank())
            .ok_or(FeedbackError::BookingRequired)?;
        let value = coerce(value.as_ref());
        if value.is_nan() {
            return Err(FeedbackError::ValueRequired);
        }

        let terms = self.sanitize_terms(&terms, &booking_id)?;
        let value = cap_value(value);

        let user_pointer = Pointer::user(user.clone());
        let booking_pointer = Pointer::booking(booking_id.clone());

        if self.store.fetch_user(&user)?.is_none() {
            debug!(user = %user, "submitting user has no stored record");
        }
        let existing = self.store.query_feedback(&FeedbackQuery {
            user: user_pointer.clone(),
            booking: Some(booking_pointer.clone()),
        })?;
        if !existing.is_empty() {
            warn!(user = %user, booking = %booking_id, "duplicate feedback rejected");
            return Err(FeedbackError::FeedbackAlreadyProvided);
        }

        let mut feedback = UserFeedback {
            object_id: None,
            user: user_pointer,
            booking: booking_pointer,
            acl: Acl::admin_only(&self.config.admin_role),
            value: Some(value),
            terms,
            source,
            comment,
        };
        let id = self.store.save_feedback(&feedback)?;
        info!(feedback = %id, user = %user, booking = %booking_id, value, "feedback created");
        feedback.object_id = Some(id.clone());

        Ok((id, feedback))
    }

    /// Keep only terms that are active for the booking's activity type, with capped values.
    pub fn sanitize_terms(
        &self,
        terms: &BTreeMap<String, RatingValue>,
        booking_id: &ObjectId,
    ) -> Result<BTreeMap<String, f64>, FeedbackError> {
        let active = self.get_terms(booking_id)?;

        let mut valid = BTreeMap::new();
        for (slug, raw) in terms {
            if !active.iter().any(|term| &term.slug == slug) {
                debug!(slug = %slug, booking = %booking_id, "dropping inactive feedback term");
                continue;
            }
            match raw.capped() {
                Some(value) => {
                    valid.insert(slug.clone(), value);
                }
                None => debug!(slug = %slug, "dropping non-numeric feedback term"),
            }
        }

        Ok(valid)
    }

    /// Active feedback terms for the activity type of a booking.
    pub fn get_terms(&self, booking_id: &ObjectId) -> Result<Vec<FeedbackTerm>, FeedbackError> {
        let booking = self
            .get_booking(booking_id)?
            .ok_or(FeedbackError::BookingNotFound)?;

        let activity_type = match &booking.activity {
            Related::Included(activity) => activity.activity_type.clone(),
            Related::Pointer(pointer) => {
                self.store
                    .fetch_activity(&pointer.object_id)?
                    .ok_or_else(|| StoreError::NotFound {
                        class: pointer.kind.class_name(),
                        id: pointer.object_id.clone(),
                    })?
                    .activity_type
            }
        };

        let terms = self.store.query_terms(&TermQuery {
            status: TermStatus::Active,
            activity_type,
        })?;
        Ok(terms)
    }

    /// Booking with its activity included.
    pub fn get_booking(&self, booking_id: &ObjectId) -> Result<Option<Booking>, FeedbackError> {
        let booking = self
            .store
            .fetch_booking(booking_id, &[Include::Activity])?;
        Ok(booking)
    }

    /// Point the booking at a stored feedback record and persist it.
    pub fn connect_booking(
        &self,
        feedback_id: &ObjectId,
        booking_id: &ObjectId,
    ) -> Result<Booking, FeedbackError> {
        let mut booking = self
            .store
            .fetch_booking(booking_id, &[])?
            .ok_or(FeedbackError::BookingNotFound)?;
        booking.feedback = Some(Pointer::feedback(feedback_id.clone()));
        self.store.save_booking(&booking)?;

        info!(booking = %booking.object_id, feedback = %feedback_id, "booking linked to feedback");
        Ok(booking)
    }

    /// Bookings the user still has to rate, judged against the current time.
    pub fn get_required(&self, user: &ObjectId) -> Result<Vec<Booking>, FeedbackError> {
        self.get_required_as_of(user, Utc::now())
    }

    /// The user's latest completed active booking, unless it already has feedback.
    pub fn get_required_as_of(
        &self,
        user: &ObjectId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>, FeedbackError> {
        let query = BookingQuery {
            status: Some(BookingStatus::Active),
            started_before: Some(now - self.config.completion_buffer()),
            order: BookingOrder::StartDescending,
            limit: Some(1),
            include: vec![Include::Partner, Include::Activity],
            ..BookingQuery::for_member(Pointer::user(user.clone()))
        };

        let last = self.store.query_bookings(&query)?.into_iter().next();
        match last {
            Some(booking) if !booking.has_feedback() => Ok(vec![booking]),
            _ => Ok(Vec::new()),
        }
    }

    /// Average overall and per-term ratings over all of a user's feedback.
    pub fn get_average_user_rating(
        &self,
        user_id: &ObjectId,
    ) -> Result<AverageRating, FeedbackError> {
        let records = self.store.query_feedback(&FeedbackQuery {
            user: Pointer::user(user_id.clone()),
            booking: None,
        })?;

        if records.is_empty() {
            return Err(FeedbackError::NoFeedbackAvailable);
        }

        Ok(average(&records))
    }
}

/// Error raised by the feedback service. Each kind carries a stable numeric code.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("user is required")]
    UserRequired,
    #[error("booking id is required")]
    BookingRequired,
    #[error("feedback has already been provided")]
    FeedbackAlreadyProvided,
    #[error("value is required")]
    ValueRequired,
    #[error("booking not found")]
    BookingNotFound,
    #[error("no feedback has been found")]
    NoFeedbackAvailable,
    #[error("feedback error: {0}")]
    Store(#[from] StoreError),
}

impl FeedbackError {
    pub fn code(&self) -> u32 {
        match self {
            FeedbackError::Store(_) => 25000,
            FeedbackError::UserRequired => 25001,
            FeedbackError::BookingRequired => 25002,
            FeedbackError::FeedbackAlreadyProvided => 25003,
            FeedbackError::ValueRequired => 25004,
            FeedbackError::BookingNotFound => 25005,
            FeedbackError::NoFeedbackAvailable => 25006,
        }
    }

    /// Whether the caller can fix the request, as opposed to a store failure.
    pub fn is_validation(&self) -> bool {
        !matches!(self, FeedbackError::Store(_))
    }
}
