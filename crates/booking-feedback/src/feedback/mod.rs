//! Post-booking feedback: term lookup, submission, and rating aggregation.
//!
//! Members rate a completed booking against the active terms defined for its activity type.
//! The service reaches storage only through [`FeedbackStore`], so callers decide where records
//! live. Duplicate checks and booking links are best effort: two concurrent submissions for
//! the same booking can both pass the duplicate check unless the store enforces uniqueness.

pub mod average;
pub mod domain;
pub mod memory;
pub mod rating;
pub mod router;
pub mod service;
pub mod store;

#[cfg(test)]
mod tests;

pub use average::{AverageRating, RatingAccumulator};
pub use domain::{
    Acl, AclPermissions, Activity, ActivityType, Booking, BookingStatus, Entity, EntityKind,
    FeedbackTerm, ObjectId, Partner, Pointer, Related, TermStatus, UserFeedback, UserRecord,
};
pub use memory::InMemoryFeedbackStore;
pub use rating::{cap_value, RatingValue, MAX_RATING, MIN_RATING};
pub use router::feedback_router;
pub use service::{FeedbackError, FeedbackService, FeedbackSubmission};
pub use store::{
    BookingOrder, BookingQuery, FeedbackQuery, FeedbackStore, Include, StoreError, TermQuery,
};
