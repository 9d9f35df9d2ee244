use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the backing store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub String);

impl ObjectId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record classes known to the feedback module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Booking,
    Activity,
    Partner,
    UserFeedback,
    UserFeedbackTerm,
}

impl EntityKind {
    /// Class name used by the backing store.
    pub fn class_name(self) -> &'static str {
        match self {
            EntityKind::User => "_User",
            EntityKind::Booking => "Booking",
            EntityKind::Activity => "Activity",
            EntityKind::Partner => "Partner",
            EntityKind::UserFeedback => "UserFeedback",
            EntityKind::UserFeedbackTerm => "UserFeedbackTerm",
        }
    }
}

/// Tagged reference to a record of another class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    pub kind: EntityKind,
    pub object_id: ObjectId,
}

impl Pointer {
    pub fn new(kind: EntityKind, object_id: ObjectId) -> Self {
        Self { kind, object_id }
    }

    pub fn user(object_id: ObjectId) -> Self {
        Self::new(EntityKind::User, object_id)
    }

    pub fn booking(object_id: ObjectId) -> Self {
        Self::new(EntityKind::Booking, object_id)
    }

    pub fn feedback(object_id: ObjectId) -> Self {
        Self::new(EntityKind::UserFeedback, object_id)
    }
}

impl fmt::Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}${}", self.kind.class_name(), self.object_id)
    }
}

/// Records that can be referenced through a [`Pointer`].
pub trait Entity {
    const KIND: EntityKind;

    fn object_id(&self) -> &ObjectId;

    fn pointer(&self) -> Pointer {
        Pointer::new(Self::KIND, self.object_id().clone())
    }
}

/// Relation field holding either a bare pointer or the included record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Related<T> {
    Included(T),
    Pointer(Pointer),
}

impl<T: Entity> Related<T> {
    pub fn object_id(&self) -> &ObjectId {
        match self {
            Related::Included(record) => record.object_id(),
            Related::Pointer(pointer) => &pointer.object_id,
        }
    }

    pub fn pointer(&self) -> Pointer {
        match self {
            Related::Included(record) => record.pointer(),
            Related::Pointer(pointer) => pointer.clone(),
        }
    }

    pub fn included(&self) -> Option<&T> {
        match self {
            Related::Included(record) => Some(record),
            Related::Pointer(_) => None,
        }
    }

    /// Drop the included record, keeping only the reference.
    pub fn collapse(&self) -> Self {
        Related::Pointer(self.pointer())
    }
}

/// Platform member account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub object_id: ObjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl Entity for UserRecord {
    const KIND: EntityKind = EntityKind::User;

    fn object_id(&self) -> &ObjectId {
        &self.object_id
    }
}

/// Activity category that feedback terms are scoped to, e.g. `course`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityType(pub String);

impl ActivityType {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub object_id: ObjectId,
    pub status: String,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
}

impl Entity for Activity {
    const KIND: EntityKind = EntityKind::Activity;

    fn object_id(&self) -> &ObjectId {
        &self.object_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub object_id: ObjectId,
    pub name: String,
}

impl Entity for Partner {
    const KIND: EntityKind = EntityKind::Partner;

    fn object_id(&self) -> &ObjectId {
        &self.object_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Active,
    Reservation,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub object_id: ObjectId,
    pub member: Pointer,
    pub activity: Related<Activity>,
    pub partner: Related<Partner>,
    pub status: BookingStatus,
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Pointer>,
}

impl Booking {
    pub fn has_feedback(&self) -> bool {
        self.feedback.is_some()
    }
}

impl Entity for Booking {
    const KIND: EntityKind = EntityKind::Booking;

    fn object_id(&self) -> &ObjectId {
        &self.object_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermStatus {
    Active,
    Draft,
}

/// Admin-defined rating category scoped to an activity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackTerm {
    pub object_id: ObjectId,
    pub slug: String,
    pub status: TermStatus,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
}

impl Entity for FeedbackTerm {
    const KIND: EntityKind = EntityKind::UserFeedbackTerm;

    fn object_id(&self) -> &ObjectId {
        &self.object_id
    }
}

/// Read/write grant for one ACL principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclPermissions {
    pub read: bool,
    pub write: bool,
}

/// Access-control list keyed by principal (`role:<name>`, user id, or `*`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Acl(pub BTreeMap<String, AclPermissions>);

impl Acl {
    /// ACL granting read and write to a single administrative role and nobody else.
    pub fn admin_only(role: &str) -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            format!("role:{role}"),
            AclPermissions {
                read: true,
                write: true,
            },
        );
        Self(entries)
    }

    pub fn permissions(&self, principal: &str) -> Option<AclPermissions> {
        self.0.get(principal).copied()
    }
}

/// Stored rating of one booking by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeedback {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub user: Pointer,
    pub booking: Pointer,
    #[serde(default)]
    pub acl: Acl,
    /// Older records may predate the overall rating.
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub terms: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}
