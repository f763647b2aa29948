//! Priority tiers and their display colour/icon.

use serde::Serialize;

/// Display category derived from a message priority.
///
/// Bounds are inclusive-lower, exclusive-upper; `Urgent` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Low,
    Normal,
    Important,
    Urgent,
}

impl PriorityTier {
    pub fn from_priority(priority: i64) -> Self {
        match priority {
            p if p >= 8 => Self::Urgent,
            p if p >= 5 => Self::Important,
            p if p >= 2 => Self::Normal,
            _ => Self::Low,
        }
    }

    /// Hex colour of the tier indicator.
    pub fn color(self) -> &'static str {
        match self {
            Self::Urgent => "#EF4444",
            Self::Important => "#F59E0B",
            Self::Normal => "#3B82F6",
            Self::Low => "#6B7280",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Urgent => "❗",
            Self::Important => "⚠️",
            Self::Normal => "ℹ️",
            Self::Low => "📌",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::Important => "important",
            Self::Normal => "normal",
            Self::Low => "low",
        }
    }
}
