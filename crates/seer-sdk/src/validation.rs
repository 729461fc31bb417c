//! Field-level validation results.
//!
//! Validation never fails with an [`Error`](crate::Error): a form returns a
//! [`FieldErrors`] map, and an empty map means the form may emit.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::draft::OutcomeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    MarketQuestion,
    Category,
    /// The outcome list as a whole (e.g. too few entries).
    Outcomes,
    Outcome(OutcomeId),
    OutcomesQuestionTemplate,
    LowerBound,
    UpperBound,
    Unit,
    Amount,
}

impl Field {
    /// Key used by the frontend to place the message next to its input.
    pub fn key(&self) -> String {
        match self {
            Field::MarketQuestion => "market".to_string(),
            Field::Category => "category".to_string(),
            Field::Outcomes => "outcomes".to_string(),
            Field::Outcome(id) => format!("outcomes.{id}.value"),
            Field::OutcomesQuestionTemplate => "outcomesQuestion".to_string(),
            Field::LowerBound => "lowerBound".to_string(),
            Field::UpperBound => "upperBound".to_string(),
            Field::Unit => "unit".to_string(),
            Field::Amount => "amount".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Required,
    Negative,
    NotANumber,
    /// Upper bound not strictly above the lower bound.
    BoundOrder { lower: String },
    /// More fractional digits than the on-chain encoding keeps.
    TooPrecise { decimals: u8 },
    TooLarge,
    TooFewOutcomes { min: usize },
    AmountNotPositive,
    TooManyDecimals,
    InsufficientBalance,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Required => f.write_str("This field is required."),
            ValidationError::Negative => f.write_str("Value cannot be negative."),
            ValidationError::NotANumber => f.write_str("Value must be a number."),
            ValidationError::BoundOrder { lower } => {
                write!(f, "Value must be greater than {lower}.")
            }
            ValidationError::TooPrecise { decimals } => {
                write!(f, "Value can have at most {decimals} decimals.")
            }
            ValidationError::TooLarge => f.write_str("Value is too large."),
            ValidationError::TooFewOutcomes { min } => {
                write!(f, "At least {min} outcomes are required.")
            }
            ValidationError::AmountNotPositive => f.write_str("Amount must be greater than 0."),
            ValidationError::TooManyDecimals => f.write_str("Amount has too many decimals."),
            ValidationError::InsufficientBalance => f.write_str("Not enough balance."),
        }
    }
}

/// Errors keyed by field. Serializes as `{ "<field key>": "<message>" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, ValidationError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: Field, error: ValidationError) {
        self.0.insert(field, error);
    }

    pub fn get(&self, field: Field) -> Option<&ValidationError> {
        self.0.get(&field)
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Field, &ValidationError)> {
        self.0.iter()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }

    /// `field -> message` map, as rendered inline by the frontend.
    pub fn messages(&self) -> BTreeMap<String, String> {
        self.0
            .iter()
            .map(|(field, err)| (field.key(), err.to_string()))
            .collect()
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.messages().serialize(serializer)
    }
}

/// Required check on free text: blank after trimming counts as empty.
pub(crate) fn require_text(errors: &mut FieldErrors, field: Field, value: &str) {
    if value.trim().is_empty() {
        errors.insert(field, ValidationError::Required);
    }
}
