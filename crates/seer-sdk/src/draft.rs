//! The in-memory market draft edited by the creation wizard.

use serde::{Deserialize, Serialize};

/// Placeholder replaced by each outcome value in a multi-scalar question
/// template.
pub const OUTCOME_PLACEHOLDER: &str = "[outcome]";

/// Minimum number of outcomes for variants that carry an outcome list.
pub const MIN_OUTCOMES: usize = 2;

/// Market variant. Determines which draft fields are required.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    Categorical,
    Scalar,
    MultiCategorical,
    MultiScalar,
}

impl MarketType {
    /// Variants whose outcomes are entered as a list.
    pub fn has_outcomes(self) -> bool {
        !matches!(self, MarketType::Scalar)
    }

    pub fn needs_outcomes_template(self) -> bool {
        matches!(self, MarketType::MultiScalar)
    }

    pub fn needs_bounds(self) -> bool {
        matches!(self, MarketType::Scalar)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Misc,
    Politics,
    Sports,
    Crypto,
    Economy,
    Science,
    Weather,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Misc,
        Category::Politics,
        Category::Sports,
        Category::Crypto,
        Category::Economy,
        Category::Science,
        Category::Weather,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Misc => "misc",
            Category::Politics => "politics",
            Category::Sports => "sports",
            Category::Crypto => "crypto",
            Category::Economy => "economy",
            Category::Science => "science",
            Category::Weather => "weather",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Misc => "Miscellaneous",
            Category::Politics => "Politics",
            Category::Sports => "Sports",
            Category::Crypto => "Crypto",
            Category::Economy => "Economy",
            Category::Science => "Science",
            Category::Weather => "Weather",
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let needle = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle) || c.label().eq_ignore_ascii_case(needle))
            .ok_or_else(|| format!("invalid category: {}", s))
    }
}

/// Stable identifier of an outcome entry. Never reused within a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutcomeId(pub u64);

impl std::fmt::Display for OutcomeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    pub id: OutcomeId,
    pub value: String,
}

/// Ordered outcome entries addressed by id rather than position, plus the
/// entry that currently has input focus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeList {
    entries: Vec<OutcomeEntry>,
    next_id: u64,
    focused: Option<OutcomeId>,
}

impl OutcomeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an empty entry and return its id.
    pub fn add(&mut self) -> OutcomeId {
        self.push(String::new())
    }

    pub fn push(&mut self, value: impl Into<String>) -> OutcomeId {
        let id = OutcomeId(self.next_id);
        self.next_id += 1;
        self.entries.push(OutcomeEntry {
            id,
            value: value.into(),
        });
        id
    }

    /// Remove an entry; remaining entries keep their relative order.
    ///
    /// If the removed entry had focus, focus moves to the entry that now sits
    /// at the same position, else to the new last entry, else to none.
    pub fn remove(&mut self, id: OutcomeId) -> Option<OutcomeEntry> {
        let pos = self.position(id)?;
        let removed = self.entries.remove(pos);
        if self.focused == Some(id) {
            self.focused = self
                .entries
                .get(pos)
                .or_else(|| self.entries.last())
                .map(|e| e.id);
        }
        Some(removed)
    }

    /// Returns `false` if no entry has this id.
    pub fn set(&mut self, id: OutcomeId, value: impl Into<String>) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: OutcomeId) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .map(|e| e.value.as_str())
    }

    pub fn position(&self, id: OutcomeId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Returns `false` if no entry has this id; focus is left unchanged then.
    pub fn focus(&mut self, id: OutcomeId) -> bool {
        if self.position(id).is_some() {
            self.focused = Some(id);
            true
        } else {
            false
        }
    }

    pub fn focused(&self) -> Option<OutcomeId> {
        self.focused
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutcomeEntry> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<OutcomeId> {
        self.entries.iter().map(|e| e.id).collect()
    }

    /// Values in entry order, trimmed.
    pub fn values(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.value.trim().to_string()).collect()
    }
}

/// Render the per-outcome question of a multi-scalar market.
pub fn outcome_question(template: &str, outcome: &str) -> String {
    template.replace(OUTCOME_PLACEHOLDER, outcome)
}

/// Everything entered in the creation wizard so far.
///
/// Bounds are kept as the raw text the user typed; they are parsed during
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDraft {
    pub market_type: MarketType,
    pub market_question: String,
    pub category: Option<Category>,
    pub outcomes: OutcomeList,
    pub lower_bound: String,
    pub upper_bound: String,
    pub unit: String,
    pub outcomes_question_template: String,
}

impl MarketDraft {
    /// Outcome variants start with two empty entries, as the form shows them.
    pub fn new(market_type: MarketType) -> Self {
        let mut outcomes = OutcomeList::new();
        if market_type.has_outcomes() {
            outcomes.add();
            outcomes.add();
        }
        Self {
            market_type,
            market_question: String::new(),
            category: None,
            outcomes,
            lower_bound: String::new(),
            upper_bound: String::new(),
            unit: String::new(),
            outcomes_question_template: String::new(),
        }
    }

    /// Switch variant without discarding anything already typed. Seeds the
    /// outcome list when moving to an outcome variant with no entries.
    pub fn set_market_type(&mut self, market_type: MarketType) {
        self.market_type = market_type;
        if market_type.has_outcomes() && self.outcomes.is_empty() {
            self.outcomes.add();
            self.outcomes.add();
        }
    }

    /// Help text for one outcome field: the rendered outcome question, when
    /// both a template and a value exist.
    pub fn outcome_help_text(&self, id: OutcomeId) -> Option<String> {
        let template = self.outcomes_question_template.trim();
        let value = self.outcomes.get(id)?.trim();
        if template.is_empty() || value.is_empty() {
            return None;
        }
        Some(format!(
            "Outcome question: {}",
            outcome_question(template, value)
        ))
    }
}
