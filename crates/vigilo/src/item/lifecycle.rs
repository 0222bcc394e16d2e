use chrono::{DateTime, Utc};
use thiserror::Error;

use super::{Item, ItemStatus};
use crate::geo::Coordinates;

#[derive(Error, Debug, PartialEq)]
pub enum LifecycleError {
    #[error("Cannot {action} an item that is {from}")]
    InvalidTransition {
        from: ItemStatus,
        action: &'static str,
    },
    #[error("User {actor} does not own item {item_id}")]
    NotOwner { item_id: u64, actor: u64 },
    #[error("Reward must be a non-negative amount, got {0}")]
    NegativeReward(f64),
    #[error("No item with id {0}")]
    UnknownItem(u64),
}

/// What happened to the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Lost,
    Stolen,
    Damaged,
}

impl From<ReportKind> for ItemStatus {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Lost => Self::Lost,
            ReportKind::Stolen => Self::Stolen,
            ReportKind::Damaged => Self::Damaged,
        }
    }
}

/// Details filed with a lost/stolen/damaged report.
#[derive(Debug, Clone, PartialEq)]
pub struct IncidentReport {
    pub kind: ReportKind,
    pub coordinates: Option<Coordinates>,
    pub location: Option<String>,
    pub reward: f64,
    /// List the item on the public map
    pub make_public: bool,
    pub reported_at: DateTime<Utc>,
}

impl IncidentReport {
    pub fn new(kind: ReportKind) -> Self {
        Self {
            kind,
            coordinates: None,
            location: None,
            reward: 0.0,
            make_public: false,
            reported_at: Utc::now(),
        }
    }

    pub fn at(mut self, coordinates: Coordinates, location: impl Into<String>) -> Self {
        self.coordinates = Some(coordinates);
        self.location = Some(location.into());
        self
    }

    pub fn reward(mut self, reward: f64) -> Self {
        self.reward = reward;
        self
    }

    pub fn public(mut self) -> Self {
        self.make_public = true;
        self
    }
}

/// A status change requested by an item's owner.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Report(IncidentReport),
    MarkFound,
    MarkSold,
    Archive,
}

impl Transition {
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::Report(_) => "report",
            Self::MarkFound => "mark as found",
            Self::MarkSold => "mark as sold",
            Self::Archive => "archive",
        }
    }
}

impl Item {
    /// Apply `transition` on behalf of `actor`.
    ///
    /// The item is left untouched when the transition is rejected.
    pub fn apply(&mut self, actor: u64, transition: Transition) -> Result<(), LifecycleError> {
        if actor != self.owner_id {
            return Err(LifecycleError::NotOwner {
                item_id: self.id,
                actor,
            });
        }

        let invalid = |from| LifecycleError::InvalidTransition {
            from,
            action: transition.action(),
        };

        match (&transition, self.status) {
            (
                Transition::Report(report),
                ItemStatus::Active | ItemStatus::Lost | ItemStatus::Stolen | ItemStatus::Damaged,
            ) => {
                if report.reward < 0.0 || !report.reward.is_finite() {
                    return Err(LifecycleError::NegativeReward(report.reward));
                }
                self.status = report.kind.into();
                self.reward = report.reward;
                self.reported_at = Some(report.reported_at);
                self.latitude = report.coordinates.map(|c| c.lat());
                self.longitude = report.coordinates.map(|c| c.lng());
                self.incident_location.clone_from(&report.location);
                self.is_public = report.make_public;
            }
            (
                Transition::MarkFound,
                ItemStatus::Lost | ItemStatus::Stolen | ItemStatus::Damaged,
            ) => {
                self.status = ItemStatus::Found;
                self.is_public = false;
            }
            (Transition::MarkSold, ItemStatus::Active | ItemStatus::Found) => {
                self.status = ItemStatus::Sold;
                self.is_public = false;
            }
            (Transition::Archive, from) if from != ItemStatus::Archived => {
                self.status = ItemStatus::Archived;
                self.is_public = false;
            }
            (_, from) => return Err(invalid(from)),
        }
        Ok(())
    }
}
