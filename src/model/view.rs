use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::task::Priority;

/// Which tasks the list shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
    High,
    Medium,
    Low,
}

impl Filter {
    pub const ALL: [Filter; 6] = [
        Filter::All,
        Filter::Active,
        Filter::Completed,
        Filter::High,
        Filter::Medium,
        Filter::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
            Filter::High => "high",
            Filter::Medium => "medium",
            Filter::Low => "low",
        }
    }

    /// The priority this filter selects, if it is a priority filter
    pub fn priority(self) -> Option<Priority> {
        match self {
            Filter::High => Some(Priority::High),
            Filter::Medium => Some(Priority::Medium),
            Filter::Low => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Filter::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                format!("unknown filter: {wanted} (expected all, active, completed, high, medium or low)")
            })
    }
}

/// Display order of the derived view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Newest first
    #[default]
    Date,
    /// High, then medium, then low
    Priority,
    Alphabetical,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Date => "date",
            SortOrder::Priority => "priority",
            SortOrder::Alphabetical => "alphabetical",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "date" => Ok(SortOrder::Date),
            "priority" => Ok(SortOrder::Priority),
            "alphabetical" | "alpha" => Ok(SortOrder::Alphabetical),
            other => Err(format!("unknown sort: {other} (expected date, priority or alphabetical)")),
        }
    }
}

/// Ephemeral view selection. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub filter: Filter,
    pub sort: SortOrder,
    /// Case-insensitive substring; empty shows everything
    pub search: String,
    /// Priority used by the next add that doesn't name one
    pub pending_priority: Priority,
}
