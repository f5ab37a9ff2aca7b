//! Item domain entity
//!
//! An item is one user-submitted piece of content progressing through
//! moderation and publishing. Its lifecycle is a strict state machine;
//! every transition goes through the item store's compare-and-set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub Uuid);

impl ItemId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ItemId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemState {
    New,
    Analyzing,
    PendingReview,
    Approved,
    Rejected,
    Publishing,
    Published,
    PublishFailed,
}

impl ItemState {
    /// Whether `self -> next` is a legal edge of the lifecycle graph.
    ///
    /// `Approved -> Rejected` is the explicit human-override edge; it is
    /// only reachable through `ReviewService::override_decision`.
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        use ItemState::*;
        matches!(
            (*self, next),
            (New, Analyzing)
                | (Analyzing, Approved)
                | (Analyzing, Rejected)
                | (Analyzing, PendingReview)
                | (PendingReview, Approved)
                | (PendingReview, Rejected)
                | (Approved, Publishing)
                | (Approved, Rejected)
                | (Publishing, Published)
                | (Publishing, PublishFailed)
                | (PublishFailed, Publishing)
        )
    }

    /// Terminal states have no outgoing edges.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemState::Rejected | ItemState::Published)
    }
}

impl std::fmt::Display for ItemState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemState::New => "new",
            ItemState::Analyzing => "analyzing",
            ItemState::PendingReview => "pending_review",
            ItemState::Approved => "approved",
            ItemState::Rejected => "rejected",
            ItemState::Publishing => "publishing",
            ItemState::Published => "published",
            ItemState::PublishFailed => "publish_failed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for ItemState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" => Ok(ItemState::New),
            "analyzing" => Ok(ItemState::Analyzing),
            "pending_review" => Ok(ItemState::PendingReview),
            "approved" => Ok(ItemState::Approved),
            "rejected" => Ok(ItemState::Rejected),
            "publishing" => Ok(ItemState::Publishing),
            "published" => Ok(ItemState::Published),
            "publish_failed" => Ok(ItemState::PublishFailed),
            _ => Err(format!("Unknown item state: {}", s)),
        }
    }
}

/// Moderation decision for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
    Review,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Approve => write!(f, "approve"),
            Decision::Reject => write!(f, "reject"),
            Decision::Review => write!(f, "review"),
        }
    }
}

/// Who made a moderation decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionSource {
    Automated,
    Manual,
}

impl std::fmt::Display for DecisionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecisionSource::Automated => write!(f, "automated"),
            DecisionSource::Manual => write!(f, "manual"),
        }
    }
}

/// Record of who decided an item's fate and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: DecisionSource,
    /// Classifier confidence; None for manual decisions
    pub confidence: Option<f64>,
    pub rationale: String,
    pub decided_at: DateTime<Utc>,
}

impl Provenance {
    pub fn automated(confidence: f64, rationale: impl Into<String>) -> Self {
        Self {
            source: DecisionSource::Automated,
            confidence: Some(confidence),
            rationale: rationale.into(),
            decided_at: Utc::now(),
        }
    }

    pub fn manual(rationale: impl Into<String>) -> Self {
        Self {
            source: DecisionSource::Manual,
            confidence: None,
            rationale: rationale.into(),
            decided_at: Utc::now(),
        }
    }
}

/// A submitted content item
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: ItemId,
    /// Opaque content; only forwarded to the classifier and the platform
    pub payload: String,
    pub state: ItemState,
    /// The classifier's decision hint, kept for override detection
    pub suggestion: Option<Decision>,
    pub provenance: Option<Provenance>,
    pub publish_attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Platform reference of the published post
    pub external_ref: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub failure_reason: Option<String>,
    /// Permanent publish failures are not retried by the scheduler
    pub failure_permanent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Whether the scheduler should include this item in the next batch.
    pub fn is_publishable(&self) -> bool {
        match self.state {
            ItemState::Approved => true,
            ItemState::PublishFailed => !self.failure_permanent,
            _ => false,
        }
    }
}

/// Data needed to create a new item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub payload: String,
}
