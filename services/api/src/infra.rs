use booking_feedback::feedback::{
    Acl, Activity, ActivityType, Booking, BookingStatus, EntityKind, FeedbackTerm,
    InMemoryFeedbackStore, ObjectId, Partner, Pointer, Related, TermStatus, UserFeedback,
    UserRecord,
};
use chrono::{DateTime, Duration, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) const DEMO_MEMBER: &str = "member-001";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn pointer(kind: EntityKind, id: &str) -> Pointer {
    Pointer::new(kind, ObjectId::new(id))
}

fn demo_booking(
    id: &str,
    activity: &str,
    status: BookingStatus,
    start: DateTime<Utc>,
    feedback: Option<&str>,
) -> Booking {
    Booking {
        object_id: ObjectId::new(id),
        member: pointer(EntityKind::User, DEMO_MEMBER),
        activity: Related::Pointer(pointer(EntityKind::Activity, activity)),
        partner: Related::Pointer(pointer(EntityKind::Partner, "partner-harbour")),
        status,
        start,
        feedback: feedback.map(|id| pointer(EntityKind::UserFeedback, id)),
    }
}

/// In-memory store seeded with one member, two activity types, and a short booking history.
pub(crate) fn seeded_store(now: DateTime<Utc>, admin_role: &str) -> InMemoryFeedbackStore {
    let store = InMemoryFeedbackStore::new().with_unique_feedback();

    store.insert_user(UserRecord {
        object_id: ObjectId::new(DEMO_MEMBER),
        username: Some("demo".to_string()),
    });
    store.insert_partner(Partner {
        object_id: ObjectId::new("partner-harbour"),
        name: "Harbour Sports Club".to_string(),
    });
    for (id, activity_type) in [
        ("activity-pilates", "course"),
        ("activity-tennis-court", "infrastructure"),
    ] {
        store.insert_activity(Activity {
            object_id: ObjectId::new(id),
            status: "active".to_string(),
            activity_type: ActivityType::new(activity_type),
        });
    }
    for (id, slug, status, activity_type) in [
        ("term-instructor", "instructor", TermStatus::Active, "course"),
        ("term-atmosphere", "atmosphere", TermStatus::Active, "course"),
        ("term-playlist", "playlist", TermStatus::Draft, "course"),
        ("term-surface", "surface", TermStatus::Active, "infrastructure"),
        ("term-lighting", "lighting", TermStatus::Active, "infrastructure"),
    ] {
        store.insert_term(FeedbackTerm {
            object_id: ObjectId::new(id),
            slug: slug.to_string(),
            status,
            activity_type: ActivityType::new(activity_type),
        });
    }

    store.insert_booking(demo_booking(
        "booking-pilates-1",
        "activity-pilates",
        BookingStatus::Active,
        now - Duration::days(10),
        Some("feedback-seed-1"),
    ));
    store.insert_booking(demo_booking(
        "booking-tennis-1",
        "activity-tennis-court",
        BookingStatus::Active,
        now - Duration::days(1),
        None,
    ));
    store.insert_booking(demo_booking(
        "booking-pilates-2",
        "activity-pilates",
        BookingStatus::Reservation,
        now + Duration::days(3),
        None,
    ));

    store.insert_feedback(UserFeedback {
        object_id: Some(ObjectId::new("feedback-seed-1")),
        user: pointer(EntityKind::User, DEMO_MEMBER),
        booking: pointer(EntityKind::Booking, "booking-pilates-1"),
        acl: Acl::admin_only(admin_role),
        value: Some(4.0),
        terms: [("instructor".to_string(), 5.0), ("atmosphere".to_string(), 3.0)]
            .into_iter()
            .collect(),
        source: Some("seed".to_string()),
        comment: Some("Great class".to_string()),
    });

    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_store_links_historical_feedback() {
        let store = seeded_store(Utc::now(), "admin");

        let booking = store
            .booking(&ObjectId::new("booking-pilates-1"))
            .expect("seeded booking");
        assert_eq!(
            booking.feedback.map(|pointer| pointer.object_id),
            Some(ObjectId::new("feedback-seed-1"))
        );
        assert_eq!(store.feedback_records().len(), 1);
    }
}
