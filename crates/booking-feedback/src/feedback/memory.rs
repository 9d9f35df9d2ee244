//! In-process [`FeedbackStore`] used by the demo binary and the test suites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::domain::{
    Activity, Booking, Entity, EntityKind, FeedbackTerm, ObjectId, Partner, Related,
    UserFeedback, UserRecord,
};
use super::store::{
    BookingOrder, BookingQuery, FeedbackQuery, FeedbackStore, Include, StoreError, TermQuery,
};

#[derive(Debug, Default)]
struct Records {
    users: HashMap<ObjectId, UserRecord>,
    activities: HashMap<ObjectId, Activity>,
    partners: HashMap<ObjectId, Partner>,
    // Vectors keep insertion order as the natural query order.
    bookings: Vec<Booking>,
    terms: Vec<FeedbackTerm>,
    feedback: Vec<UserFeedback>,
}

impl Records {
    fn resolve(&self, booking: &Booking, include: &[Include]) -> Booking {
        let mut resolved = booking.clone();
        if include.contains(&Include::Activity) {
            if let Some(activity) = self.activities.get(booking.activity.object_id()) {
                resolved.activity = Related::Included(activity.clone());
            }
        }
        if include.contains(&Include::Partner) {
            if let Some(partner) = self.partners.get(booking.partner.object_id()) {
                resolved.partner = Related::Included(partner.clone());
            }
        }
        resolved
    }
}

/// Mutex-guarded store keeping every class in memory.
#[derive(Debug, Default)]
pub struct InMemoryFeedbackStore {
    records: Mutex<Records>,
    sequence: AtomicU64,
    unique_feedback: bool,
}

impl InMemoryFeedbackStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject a second feedback record for the same user and booking, like a unique index.
    pub fn with_unique_feedback(mut self) -> Self {
        self.unique_feedback = true;
        self
    }

    fn records(&self) -> Result<MutexGuard<'_, Records>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("store mutex poisoned".to_string()))
    }

    fn seed(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_feedback_id(&self) -> ObjectId {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        ObjectId(format!("feedback-{id:06}"))
    }

    pub fn insert_user(&self, user: UserRecord) {
        self.seed().users.insert(user.object_id.clone(), user);
    }

    pub fn insert_activity(&self, activity: Activity) {
        self.seed()
            .activities
            .insert(activity.object_id.clone(), activity);
    }

    pub fn insert_partner(&self, partner: Partner) {
        self.seed().partners.insert(partner.object_id.clone(), partner);
    }

    pub fn insert_booking(&self, mut booking: Booking) {
        booking.activity = booking.activity.collapse();
        booking.partner = booking.partner.collapse();
        let mut records = self.seed();
        records
            .bookings
            .retain(|existing| existing.object_id != booking.object_id);
        records.bookings.push(booking);
    }

    pub fn insert_term(&self, term: FeedbackTerm) {
        self.seed().terms.push(term);
    }

    /// Seed a stored feedback record; records without an identifier get one assigned.
    pub fn insert_feedback(&self, mut feedback: UserFeedback) -> ObjectId {
        let id = feedback
            .object_id
            .clone()
            .unwrap_or_else(|| self.next_feedback_id());
        feedback.object_id = Some(id.clone());
        self.seed().feedback.push(feedback);
        id
    }

    /// Current state of a booking, relations left as pointers.
    pub fn booking(&self, id: &ObjectId) -> Option<Booking> {
        self.seed()
            .bookings
            .iter()
            .find(|booking| &booking.object_id == id)
            .cloned()
    }

    pub fn feedback_records(&self) -> Vec<UserFeedback> {
        self.seed().feedback.clone()
    }
}

impl FeedbackStore for InMemoryFeedbackStore {
    fn fetch_user(&self, id: &ObjectId) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.records()?.users.get(id).cloned())
    }

    fn fetch_booking(
        &self,
        id: &ObjectId,
        include: &[Include],
    ) -> Result<Option<Booking>, StoreError> {
        let records = self.records()?;
        Ok(records
            .bookings
            .iter()
            .find(|booking| &booking.object_id == id)
            .map(|booking| records.resolve(booking, include)))
    }

    fn fetch_activity(&self, id: &ObjectId) -> Result<Option<Activity>, StoreError> {
        Ok(self.records()?.activities.get(id).cloned())
    }

    fn query_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, StoreError> {
        let records = self.records()?;
        let mut matches: Vec<&Booking> = records
            .bookings
            .iter()
            .filter(|booking| query.matches(booking))
            .collect();

        if query.order == BookingOrder::StartDescending {
            matches.sort_by(|a, b| b.start.cmp(&a.start));
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matches
            .into_iter()
            .take(limit)
            .map(|booking| records.resolve(booking, &query.include))
            .collect())
    }

    fn query_terms(&self, query: &TermQuery) -> Result<Vec<FeedbackTerm>, StoreError> {
        Ok(self
            .records()?
            .terms
            .iter()
            .filter(|term| query.matches(term))
            .cloned()
            .collect())
    }

    fn query_feedback(&self, query: &FeedbackQuery) -> Result<Vec<UserFeedback>, StoreError> {
        Ok(self
            .records()?
            .feedback
            .iter()
            .filter(|feedback| query.matches(feedback))
            .cloned()
            .collect())
    }

    fn save_feedback(&self, feedback: &UserFeedback) -> Result<ObjectId, StoreError> {
        let mut records = self.records()?;
        if self.unique_feedback
            && records.feedback.iter().any(|existing| {
                existing.user == feedback.user && existing.booking == feedback.booking
            })
        {
            return Err(StoreError::Conflict(format!(
                "{} for {}",
                EntityKind::UserFeedback.class_name(),
                feedback.booking
            )));
        }

        let id = self.next_feedback_id();
        let mut stored = feedback.clone();
        stored.object_id = Some(id.clone());
        records.feedback.push(stored);
        Ok(id)
    }

    fn save_booking(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut records = self.records()?;
        let slot = records
            .bookings
            .iter_mut()
            .find(|existing| existing.object_id == booking.object_id)
            .ok_or_else(|| StoreError::NotFound {
                class: Booking::KIND.class_name(),
                id: booking.object_id.clone(),
            })?;

        let mut stored = booking.clone();
        stored.activity = stored.activity.collapse();
        stored.partner = stored.partner.collapse();
        *slot = stored;
        Ok(())
    }
}
