use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of editable content. Every kind is persisted in its own table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    AgendaItem,
    Highlight,
    Event,
}

/// Publication status of a persisted content record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentStatus {
    Draft,
    Published,
    Scheduled,
    Archived,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownValueError {
    pub kind: &'static str,
    pub value: String,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::AgendaItem,
        EntityKind::Highlight,
        EntityKind::Event,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::AgendaItem => "agenda-item",
            EntityKind::Highlight => "highlight",
            EntityKind::Event => "event",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::AgendaItem => "agenda_items",
            EntityKind::Highlight => "highlights",
            EntityKind::Event => "events",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| UnknownValueError {
                kind: "entity",
                value: s.to_string(),
            })
    }
}

impl ContentStatus {
    pub const ALL: [ContentStatus; 4] = [
        ContentStatus::Draft,
        ContentStatus::Published,
        ContentStatus::Scheduled,
        ContentStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentStatus::Draft => "draft",
            ContentStatus::Published => "published",
            ContentStatus::Scheduled => "scheduled",
            ContentStatus::Archived => "archived",
        }
    }

    /// Statuses that are only reachable through the publish gate.
    pub fn requires_publish_gate(&self) -> bool {
        matches!(self, ContentStatus::Published | ContentStatus::Scheduled)
    }
}

impl Display for ContentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentStatus {
    type Err = UnknownValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s.trim())
            .ok_or_else(|| UnknownValueError {
                kind: "status",
                value: s.to_string(),
            })
    }
}
