use std::collections::BTreeMap;
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

use crate::config::FeedbackConfig;
use crate::feedback::domain::{
    Acl, Activity, ActivityType, Booking, BookingStatus, EntityKind, FeedbackTerm, ObjectId,
    Partner, Pointer, Related, TermStatus, UserFeedback, UserRecord,
};
use crate::feedback::memory::InMemoryFeedbackStore;
use crate::feedback::rating::RatingValue;
use crate::feedback::service::{FeedbackService, FeedbackSubmission};
use crate::feedback::store::{
    BookingQuery, FeedbackQuery, FeedbackStore, Include, StoreError, TermQuery,
};

pub(super) const USER: &str = "user-1";

pub(super) fn id(value: &str) -> ObjectId {
    ObjectId::new(value)
}

fn activity_pointer(activity: &str) -> Related<Activity> {
    Related::Pointer(Pointer::new(EntityKind::Activity, id(activity)))
}

fn booking(
    object_id: &str,
    activity: &str,
    status: BookingStatus,
    start: DateTime<Utc>,
    feedback: Option<&str>,
) -> Booking {
    Booking {
        object_id: id(object_id),
        member: Pointer::user(id(USER)),
        activity: activity_pointer(activity),
        partner: Related::Pointer(Pointer::new(EntityKind::Partner, id("partner-1"))),
        status,
        start,
        feedback: feedback.map(|feedback| Pointer::feedback(id(feedback))),
    }
}

fn term(object_id: &str, slug: &str, status: TermStatus, activity_type: &str) -> FeedbackTerm {
    FeedbackTerm {
        object_id: id(object_id),
        slug: slug.to_string(),
        status,
        activity_type: ActivityType::new(activity_type),
    }
}

pub(super) fn stored_feedback(
    object_id: &str,
    booking: &str,
    value: Option<f64>,
    terms: &[(&str, f64)],
) -> UserFeedback {
    UserFeedback {
        object_id: Some(id(object_id)),
        user: Pointer::user(id(USER)),
        booking: Pointer::booking(id(booking)),
        acl: Acl::admin_only("admin"),
        value,
        terms: terms
            .iter()
            .map(|(slug, value)| (slug.to_string(), *value))
            .collect(),
        source: None,
        comment: None,
    }
}

/// Seed data: course and infrastructure activities, bookings at various ages, three stored
/// feedback records, and a mix of active and draft terms.
pub(super) fn seeded_store(now: DateTime<Utc>, skip_bookings: &[&str]) -> InMemoryFeedbackStore {
    let store = InMemoryFeedbackStore::new();

    store.insert_user(UserRecord {
        object_id: id(USER),
        username: Some("member".to_string()),
    });
    store.insert_activity(Activity {
        object_id: id("course-1"),
        status: "active".to_string(),
        activity_type: ActivityType::new("course"),
    });
    store.insert_activity(Activity {
        object_id: id("infra-1"),
        status: "active".to_string(),
        activity_type: ActivityType::new("infrastructure"),
    });
    store.insert_partner(Partner {
        object_id: id("partner-1"),
        name: "Riverside Sports".to_string(),
    });

    let bookings = [
        booking("booking-1", "course-1", BookingStatus::Active, now - Duration::days(2), None),
        booking("booking-2", "course-1", BookingStatus::Active, now - Duration::weeks(2), None),
        booking(
            "booking-3",
            "course-1",
            BookingStatus::Active,
            now - Duration::days(4),
            Some("feedback-a"),
        ),
        booking(
            "booking-4",
            "course-1",
            BookingStatus::Reservation,
            now + Duration::weeks(1),
            None,
        ),
        booking("booking-5", "infra-1", BookingStatus::Active, now + Duration::days(2), None),
        booking(
            "booking-6",
            "course-1",
            BookingStatus::Active,
            now - Duration::days(4),
            Some("feedback-b"),
        ),
        booking(
            "booking-7",
            "course-1",
            BookingStatus::Active,
            now - Duration::days(4),
            Some("feedback-c"),
        ),
    ];
    for booking in bookings {
        if !skip_bookings.contains(&booking.object_id.as_str()) {
            store.insert_booking(booking);
        }
    }

    store.insert_feedback(stored_feedback("feedback-a", "booking-3", None, &[]));
    store.insert_feedback(stored_feedback(
        "feedback-b",
        "booking-6",
        Some(3.0),
        &[("term1", 5.0)],
    ));
    store.insert_feedback(stored_feedback(
        "feedback-c",
        "booking-7",
        Some(4.0),
        &[("term1", 2.0), ("term3", 3.0)],
    ));

    store.insert_term(term("term-id-1", "term1", TermStatus::Active, "course"));
    store.insert_term(term("term-id-2", "term2", TermStatus::Draft, "course"));
    store.insert_term(term("term-id-3", "term3", TermStatus::Active, "course"));
    store.insert_term(term("term-id-4", "term4", TermStatus::Active, "infrastructure"));
    store.insert_term(term("term-id-5", "term5", TermStatus::Active, "infrastructure"));

    store
}

pub(super) fn build_service_at(
    now: DateTime<Utc>,
    skip_bookings: &[&str],
) -> (
    FeedbackService<InMemoryFeedbackStore>,
    Arc<InMemoryFeedbackStore>,
) {
    let store = Arc::new(seeded_store(now, skip_bookings));
    let service = FeedbackService::new(store.clone(), FeedbackConfig::default());
    (service, store)
}

pub(super) fn build_service() -> (
    FeedbackService<InMemoryFeedbackStore>,
    Arc<InMemoryFeedbackStore>,
) {
    build_service_at(Utc::now(), &[])
}

pub(super) fn ratings(entries: &[(&str, RatingValue)]) -> BTreeMap<String, RatingValue> {
    entries
        .iter()
        .map(|(slug, value)| (slug.to_string(), value.clone()))
        .collect()
}

pub(super) fn submission(booking_id: &str, value: RatingValue) -> FeedbackSubmission {
    FeedbackSubmission {
        user: Some(id(USER)),
        booking_id: Some(id(booking_id)),
        terms: ratings(&[("term1", RatingValue::from(5))]),
        source: Some("app".to_string()),
        comment: None,
        value: Some(value),
    }
}

/// Store whose every call fails, standing in for a lost database connection.
pub(super) struct UnavailableStore;

fn offline<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("database offline".to_string()))
}

impl FeedbackStore for UnavailableStore {
    fn fetch_user(&self, _id: &ObjectId) -> Result<Option<UserRecord>, StoreError> {
        offline()
    }

    fn fetch_booking(
        &self,
        _id: &ObjectId,
        _include: &[Include],
    ) -> Result<Option<Booking>, StoreError> {
        offline()
    }

    fn fetch_activity(&self, _id: &ObjectId) -> Result<Option<Activity>, StoreError> {
        offline()
    }

    fn query_bookings(&self, _query: &BookingQuery) -> Result<Vec<Booking>, StoreError> {
        offline()
    }

    fn query_terms(&self, _query: &TermQuery) -> Result<Vec<FeedbackTerm>, StoreError> {
        offline()
    }

    fn query_feedback(&self, _query: &FeedbackQuery) -> Result<Vec<UserFeedback>, StoreError> {
        offline()
    }

    fn save_feedback(&self, _feedback: &UserFeedback) -> Result<ObjectId, StoreError> {
        offline()
    }

    fn save_booking(&self, _booking: &Booking) -> Result<(), StoreError> {
        offline()
    }
}

/// Delegates to the seeded store but refuses booking writes.
pub(super) struct ReadOnlyBookings(pub(super) InMemoryFeedbackStore);

impl FeedbackStore for ReadOnlyBookings {
    fn fetch_user(&self, id: &ObjectId) -> Result<Option<UserRecord>, StoreError> {
        self.0.fetch_user(id)
    }

    fn fetch_booking(
        &self,
        id: &ObjectId,
        include: &[Include],
    ) -> Result<Option<Booking>, StoreError> {
        self.0.fetch_booking(id, include)
    }

    fn fetch_activity(&self, id: &ObjectId) -> Result<Option<Activity>, StoreError> {
        self.0.fetch_activity(id)
    }

    fn query_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, StoreError> {
        self.0.query_bookings(query)
    }

    fn query_terms(&self, query: &TermQuery) -> Result<Vec<FeedbackTerm>, StoreError> {
        self.0.query_terms(query)
    }

    fn query_feedback(&self, query: &FeedbackQuery) -> Result<Vec<UserFeedback>, StoreError> {
        self.0.query_feedback(query)
    }

    fn save_feedback(&self, feedback: &UserFeedback) -> Result<ObjectId, StoreError> {
        self.0.save_feedback(feedback)
    }

    fn save_booking(&self, _booking: &Booking) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("bookings are read only".to_string()))
    }
}

/// Delegates to the seeded store but never resolves includes on single booking lookups,
/// like a backend that hands back bare references.
pub(super) struct UnresolvedActivities(pub(super) InMemoryFeedbackStore);

impl FeedbackStore for UnresolvedActivities {
    fn fetch_user(&self, id: &ObjectId) -> Result<Option<UserRecord>, StoreError> {
        self.0.fetch_user(id)
    }

    fn fetch_booking(
        &self,
        id: &ObjectId,
        _include: &[Include],
    ) -> Result<Option<Booking>, StoreError> {
        self.0.fetch_booking(id, &[])
    }

    fn fetch_activity(&self, id: &ObjectId) -> Result<Option<Activity>, StoreError> {
        self.0.fetch_activity(id)
    }

    fn query_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, StoreError> {
        self.0.query_bookings(query)
    }

    fn query_terms(&self, query: &TermQuery) -> Result<Vec<FeedbackTerm>, StoreError> {
        self.0.query_terms(query)
    }

    fn query_feedback(&self, query: &FeedbackQuery) -> Result<Vec<UserFeedback>, StoreError> {
        self.0.query_feedback(query)
    }

    fn save_feedback(&self, feedback: &UserFeedback) -> Result<ObjectId, StoreError> {
        self.0.save_feedback(feedback)
    }

    fn save_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        self.0.save_booking(booking)
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
