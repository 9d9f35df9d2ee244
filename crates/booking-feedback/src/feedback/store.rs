use chrono::{DateTime, Utc};

use super::domain::{
    Activity, ActivityType, Booking, BookingStatus, FeedbackTerm, ObjectId, Pointer, TermStatus,
    UserFeedback, UserRecord,
};

/// Relations a store can resolve in place of bare pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Include {
    Activity,
    Partner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingOrder {
    #[default]
    Natural,
    StartDescending,
}

/// Booking lookup: filter, ordering, limit, and includes.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingQuery {
    pub member: Pointer,
    pub status: Option<BookingStatus>,
    pub started_before: Option<DateTime<Utc>>,
    pub order: BookingOrder,
    pub limit: Option<usize>,
    pub include: Vec<Include>,
}

impl BookingQuery {
    pub fn for_member(member: Pointer) -> Self {
        Self {
            member,
            status: None,
            started_before: None,
            order: BookingOrder::Natural,
            limit: None,
            include: Vec::new(),
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        booking.member == self.member
            && self.status.map_or(true, |status| booking.status == status)
            && self
                .started_before
                .map_or(true, |cutoff| booking.start < cutoff)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermQuery {
    pub status: TermStatus,
    pub activity_type: ActivityType,
}

impl TermQuery {
    pub fn matches(&self, term: &FeedbackTerm) -> bool {
        term.status == self.status && term.activity_type == self.activity_type
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackQuery {
    pub user: Pointer,
    pub booking: Option<Pointer>,
}

impl FeedbackQuery {
    pub fn matches(&self, feedback: &UserFeedback) -> bool {
        feedback.user == self.user
            && self
                .booking
                .as_ref()
                .map_or(true, |booking| &feedback.booking == booking)
    }
}

/// Storage abstraction so the service can be exercised in isolation.
pub trait FeedbackStore: Send + Sync {
    fn fetch_user(&self, id: &ObjectId) -> Result<Option<UserRecord>, StoreError>;
    fn fetch_booking(
        &self,
        id: &ObjectId,
        include: &[Include],
    ) -> Result<Option<Booking>, StoreError>;
    fn fetch_activity(&self, id: &ObjectId) -> Result<Option<Activity>, StoreError>;
    fn query_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, StoreError>;
    fn query_terms(&self, query: &TermQuery) -> Result<Vec<FeedbackTerm>, StoreError>;
    fn query_feedback(&self, query: &FeedbackQuery) -> Result<Vec<UserFeedback>, StoreError>;
    /// Persist a new feedback record, returning the identifier the store assigned.
    fn save_feedback(&self, feedback: &UserFeedback) -> Result<ObjectId, StoreError>;
    fn save_booking(&self, booking: &Booking) -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{class} {id} not found")]
    NotFound { class: &'static str, id: ObjectId },
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
