//! Plan model.
//!
//! A plan is one node of the fixed five-rank goal tree:
//! 5-Year Vision → Annual Goal → Quarterly Target → Monthly Milestone → Weekly Action.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rank of a plan in the goal tree.
///
/// Stored by symbolic name (`FIVE_YEAR`, `YEAR`, ...). A plan's parent is
/// always exactly one rank above it; `FiveYear` plans are roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanType {
    FiveYear,
    Year,
    Quarter,
    Month,
    Week,
}

impl PlanType {
    /// All ranks, root first.
    pub const ALL: [Self; 5] = [
        Self::FiveYear,
        Self::Year,
        Self::Quarter,
        Self::Month,
        Self::Week,
    ];

    /// Numeric rank (0 = root).
    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::FiveYear => 0,
            Self::Year => 1,
            Self::Quarter => 2,
            Self::Month => 3,
            Self::Week => 4,
        }
    }

    /// Get the string representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FiveYear => "FIVE_YEAR",
            Self::Year => "YEAR",
            Self::Quarter => "QUARTER",
            Self::Month => "MONTH",
            Self::Week => "WEEK",
        }
    }

    /// Human-facing label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FiveYear => "5-Year Vision",
            Self::Year => "Annual Goal",
            Self::Quarter => "Quarterly Target",
            Self::Month => "Monthly Milestone",
            Self::Week => "Weekly Action",
        }
    }

    /// Parse a stored symbolic name.
    ///
    /// Use [`crate::validate::normalize_plan_type`] for user input.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }

    /// The rank directly above this one.
    #[must_use]
    pub const fn parent_type(&self) -> Option<Self> {
        match self {
            Self::FiveYear => None,
            Self::Year => Some(Self::FiveYear),
            Self::Quarter => Some(Self::Year),
            Self::Month => Some(Self::Quarter),
            Self::Week => Some(Self::Month),
        }
    }

    /// The rank directly below this one.
    #[must_use]
    pub const fn child_type(&self) -> Option<Self> {
        match self {
            Self::FiveYear => Some(Self::Year),
            Self::Year => Some(Self::Quarter),
            Self::Quarter => Some(Self::Month),
            Self::Month => Some(Self::Week),
            Self::Week => None,
        }
    }

    /// Whether this rank is the tree root.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        matches!(self, Self::FiveYear)
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A goal node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Store-assigned identifier (0 until inserted)
    pub id: i64,

    /// Plan title
    pub title: String,

    /// Free-form description (empty when unset)
    pub description: String,

    /// Rank in the goal tree
    #[serde(rename = "type")]
    pub plan_type: PlanType,

    /// Parent plan, one rank above. `None` for 5-year visions.
    pub parent_id: Option<i64>,

    /// Completion flag
    pub is_completed: bool,

    /// Coaching note attached to the plan
    pub ai_coaching_tip: Option<String>,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,
}

impl Plan {
    /// Create a new, unsaved plan.
    pub fn new(title: impl Into<String>, plan_type: PlanType) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            plan_type,
            parent_id: None,
            is_completed: false,
            ai_coaching_tip: None,
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    /// Attach to a parent plan.
    #[must_use]
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Attach a coaching note.
    #[must_use]
    pub fn with_coaching_tip(mut self, tip: &str) -> Self {
        self.ai_coaching_tip = Some(tip.to_string());
        self
    }

    /// Set the creation timestamp.
    #[must_use]
    pub fn with_created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Mark as completed.
    #[must_use]
    pub fn completed(mut self) -> Self {
        self.is_completed = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_plan() {
        let plan = Plan::new("Get Fit", PlanType::FiveYear);
        assert_eq!(plan.id, 0);
        assert_eq!(plan.title, "Get Fit");
        assert!(plan.description.is_empty());
        assert!(plan.parent_id.is_none());
        assert!(!plan.is_completed);
        assert!(plan.created_at > 0);
    }

    #[test]
    fn test_rank_edges() {
        for pair in PlanType::ALL.windows(2) {
            assert_eq!(pair[1].parent_type(), Some(pair[0]));
            assert_eq!(pair[0].child_type(), Some(pair[1]));
            assert_eq!(pair[1].level(), pair[0].level() + 1);
        }
        assert_eq!(PlanType::FiveYear.parent_type(), None);
        assert_eq!(PlanType::Week.child_type(), None);
    }

    #[test]
    fn test_plan_type_parsing() {
        for t in PlanType::ALL {
            assert_eq!(PlanType::parse(t.as_str()), Some(t));
        }
        assert_eq!(PlanType::parse("five_year"), None);
    }

    #[test]
    fn test_plan_type_serializes_as_symbolic_name() {
        let json = serde_json::to_string(&PlanType::FiveYear).unwrap();
        assert_eq!(json, "\"FIVE_YEAR\"");
        let plan = Plan::new("Ship it", PlanType::Quarter).with_parent(3);
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["type"], "QUARTER");
        assert_eq!(value["parent_id"], 3);
    }
}
