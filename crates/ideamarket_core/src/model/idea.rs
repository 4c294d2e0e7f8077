//! Idea record model.

use super::RecordId;
use crate::input::InputError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Budget used when the form leaves the field blank.
pub const DEFAULT_BUDGET: f64 = 0.0;
/// Timeline (months) used when the form leaves the field blank.
pub const DEFAULT_TIMELINE_MONTHS: u32 = 6;

/// Lifecycle stage of an idea.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdeaStage {
    #[default]
    Concept,
    Validation,
    Development,
    /// Launched; no longer counted as an active project.
    Market,
}

impl IdeaStage {
    pub const ALL: [IdeaStage; 4] = [
        IdeaStage::Concept,
        IdeaStage::Validation,
        IdeaStage::Development,
        IdeaStage::Market,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Validation => "validation",
            Self::Development => "development",
            Self::Market => "market",
        }
    }
}

impl Display for IdeaStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdeaStage {
    type Err = InputError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == normalized)
            .ok_or_else(|| InputError::UnknownStage(value.to_string()))
    }
}

/// Idea field values that cannot be stored losslessly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IdeaValidationError {
    /// JSON has no representation for NaN or infinity.
    NonFiniteBudget(f64),
}

impl Display for IdeaValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteBudget(value) => write!(f, "budget must be finite, got {value}"),
        }
    }
}

impl Error for IdeaValidationError {}

/// Stored business idea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Idea {
    pub id: RecordId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub stage: IdeaStage,
    #[serde(default)]
    pub target_market: String,
    #[serde(default)]
    pub budget: f64,
    #[serde(default = "default_timeline")]
    pub timeline: u32,
    #[serde(default)]
    pub success_criteria: String,
    #[serde(default)]
    pub team_members: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

fn default_timeline() -> u32 {
    DEFAULT_TIMELINE_MONTHS
}

impl Idea {
    /// Builds the stored record from caller fields plus store-assigned identity.
    pub(crate) fn from_new(id: RecordId, created_at: i64, fields: NewIdea) -> Self {
        Self {
            id,
            created_at,
            name: fields.name,
            description: fields.description,
            category: fields.category,
            stage: fields.stage,
            target_market: fields.target_market,
            budget: fields.budget,
            timeline: fields.timeline,
            success_criteria: fields.success_criteria,
            team_members: fields.team_members,
            tags: fields.tags,
            notes: fields.notes,
        }
    }

    /// Checks that the record survives a JSON round trip unchanged.
    pub fn validate(&self) -> Result<(), IdeaValidationError> {
        if !self.budget.is_finite() {
            return Err(IdeaValidationError::NonFiniteBudget(self.budget));
        }
        Ok(())
    }

    /// Whether the idea still counts as an active project.
    pub fn is_active(&self) -> bool {
        self.stage != IdeaStage::Market
    }
}

/// Caller-supplied fields for a new idea.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIdea {
    pub name: String,
    pub description: String,
    pub category: String,
    pub stage: IdeaStage,
    pub target_market: String,
    pub budget: f64,
    pub timeline: u32,
    pub success_criteria: String,
    pub team_members: Vec<String>,
    pub tags: Vec<String>,
    pub notes: String,
}

impl NewIdea {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl Default for NewIdea {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: String::new(),
            stage: IdeaStage::default(),
            target_market: String::new(),
            budget: DEFAULT_BUDGET,
            timeline: DEFAULT_TIMELINE_MONTHS,
            success_criteria: String::new(),
            team_members: Vec::new(),
            tags: Vec::new(),
            notes: String::new(),
        }
    }
}

/// Partial idea update. `Some` overwrites, `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdeaPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub stage: Option<IdeaStage>,
    pub target_market: Option<String>,
    pub budget: Option<f64>,
    pub timeline: Option<u32>,
    pub success_criteria: Option<String>,
    pub team_members: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl IdeaPatch {
    /// Returns whether applying this patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges present fields over `idea`. Identity fields are never touched.
    pub fn apply(self, idea: &mut Idea) {
        if let Some(name) = self.name {
            idea.name = name;
        }
        if let Some(description) = self.description {
            idea.description = description;
        }
        if let Some(category) = self.category {
            idea.category = category;
        }
        if let Some(stage) = self.stage {
            idea.stage = stage;
        }
        if let Some(target_market) = self.target_market {
            idea.target_market = target_market;
        }
        if let Some(budget) = self.budget {
            idea.budget = budget;
        }
        if let Some(timeline) = self.timeline {
            idea.timeline = timeline;
        }
        if let Some(success_criteria) = self.success_criteria {
            idea.success_criteria = success_criteria;
        }
        if let Some(team_members) = self.team_members {
            idea.team_members = team_members;
        }
        if let Some(tags) = self.tags {
            idea.tags = tags;
        }
        if let Some(notes) = self.notes {
            idea.notes = notes;
        }
    }
}
