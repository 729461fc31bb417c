//! Per-step validation of the market draft.

use std::cmp::Ordering;
use std::fmt;

use crate::draft::{MIN_OUTCOMES, MarketDraft};
use crate::primitives::{ParseUnitsError, U256, format_units, parse_units};
use crate::validation::{Field, FieldErrors, ValidationError, require_text};
use crate::wizard::{SCALAR_BOUND_DECIMALS, Step};

/// One wizard step: the fields it owns and the rules that gate it.
pub trait StepForm {
    fn step(&self) -> Step;

    /// Pure check of the fields this step owns. Empty result means valid.
    fn validate(&self, draft: &MarketDraft) -> FieldErrors;
}

/// Market question and category.
pub struct QuestionForm;

/// Outcome list, multi-scalar template, or scalar range, by market type.
pub struct OutcomesForm;

/// Review step; owns no fields.
pub struct ConfirmForm;

impl StepForm for QuestionForm {
    fn step(&self) -> Step {
        Step::Question
    }

    fn validate(&self, draft: &MarketDraft) -> FieldErrors {
        let mut errors = FieldErrors::new();
        require_text(&mut errors, Field::MarketQuestion, &draft.market_question);
        if draft.category.is_none() {
            errors.insert(Field::Category, ValidationError::Required);
        }
        errors
    }
}

impl StepForm for OutcomesForm {
    fn step(&self) -> Step {
        Step::Outcomes
    }

    fn validate(&self, draft: &MarketDraft) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let market_type = draft.market_type;

        if market_type.needs_outcomes_template() {
            require_text(
                &mut errors,
                Field::OutcomesQuestionTemplate,
                &draft.outcomes_question_template,
            );
        }

        if market_type.has_outcomes() {
            if draft.outcomes.len() < MIN_OUTCOMES {
                errors.insert(
                    Field::Outcomes,
                    ValidationError::TooFewOutcomes { min: MIN_OUTCOMES },
                );
            }
            for entry in draft.outcomes.iter() {
                require_text(&mut errors, Field::Outcome(entry.id), &entry.value);
            }
        }

        if market_type.needs_bounds() {
            validate_bounds(&mut errors, &draft.lower_bound, &draft.upper_bound);
            require_text(&mut errors, Field::Unit, &draft.unit);
        }

        errors
    }
}

impl StepForm for ConfirmForm {
    fn step(&self) -> Step {
        Step::Confirm
    }

    fn validate(&self, _draft: &MarketDraft) -> FieldErrors {
        FieldErrors::new()
    }
}

pub fn form_for(step: Step) -> &'static dyn StepForm {
    match step {
        Step::Question => &QuestionForm,
        Step::Outcomes => &OutcomesForm,
        Step::Confirm => &ConfirmForm,
    }
}

// ── Scalar bounds ───────────────────────────────────────────────────────────

/// A scalar bound in base units of [`SCALAR_BOUND_DECIMALS`], with its sign.
///
/// Bounds are compared exactly at the precision they are submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    negative: bool,
    magnitude: U256,
}

impl Bound {
    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Base units, if the bound is not negative.
    pub fn units(&self) -> Option<U256> {
        (!self.negative).then_some(self.magnitude)
    }
}

impl Ord for Bound {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, false) => self.magnitude.cmp(&other.magnitude),
            (true, true) => other.magnitude.cmp(&self.magnitude),
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Bound {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&format_units(self.magnitude, SCALAR_BOUND_DECIMALS))
    }
}

/// Plain decimal notation (`-12.5`, `.5`, `3.`) with at most
/// [`SCALAR_BOUND_DECIMALS`] fractional digits. Exponents and `inf`/`NaN`
/// spellings are rejected.
pub fn parse_bound(input: &str) -> Result<Bound, ParseUnitsError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ParseUnitsError::Empty);
    }
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    if !unsigned.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(ParseUnitsError::Invalid);
    }
    let magnitude = parse_units(unsigned, SCALAR_BOUND_DECIMALS)?;
    Ok(Bound {
        negative: negative && !magnitude.is_zero(),
        magnitude,
    })
}

/// Field error for a bound that did not parse; `invalid` covers malformed
/// input.
pub(crate) fn bound_error(error: ParseUnitsError, invalid: ValidationError) -> ValidationError {
    match error {
        ParseUnitsError::TooManyDecimals(decimals) => ValidationError::TooPrecise { decimals },
        ParseUnitsError::Overflow => ValidationError::TooLarge,
        ParseUnitsError::Empty | ParseUnitsError::Negative | ParseUnitsError::Invalid => invalid,
    }
}

// An unparseable bound reports its own error and skips the order check.
fn validate_bounds(errors: &mut FieldErrors, lower_raw: &str, upper_raw: &str) {
    let lower = if lower_raw.trim().is_empty() {
        errors.insert(Field::LowerBound, ValidationError::Required);
        None
    } else {
        match parse_bound(lower_raw) {
            Ok(lower) => {
                if lower.is_negative() {
                    errors.insert(Field::LowerBound, ValidationError::Negative);
                }
                Some(lower)
            }
            Err(e) => {
                errors.insert(Field::LowerBound, bound_error(e, ValidationError::Negative));
                None
            }
        }
    };

    if upper_raw.trim().is_empty() {
        errors.insert(Field::UpperBound, ValidationError::Required);
        return;
    }
    match (parse_bound(upper_raw), lower) {
        (Err(e), _) => errors.insert(
            Field::UpperBound,
            bound_error(e, ValidationError::NotANumber),
        ),
        (Ok(upper), Some(lower)) if upper <= lower => errors.insert(
            Field::UpperBound,
            ValidationError::BoundOrder {
                lower: lower.to_string(),
            },
        ),
        (Ok(upper), _) if upper.is_negative() => {
            errors.insert(Field::UpperBound, ValidationError::Negative)
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{Category, MarketType};

    fn scalar(lower: &str, upper: &str) -> MarketDraft {
        let mut draft = MarketDraft::new(MarketType::Scalar);
        draft.lower_bound = lower.to_string();
        draft.upper_bound = upper.to_string();
        draft.unit = "USD".to_string();
        draft
    }

    #[test]
    fn question_requires_text_and_category() {
        let mut draft = MarketDraft::new(MarketType::Categorical);
        let errors = QuestionForm.validate(&draft);
        assert_eq!(errors.get(Field::MarketQuestion), Some(&ValidationError::Required));
        assert_eq!(errors.get(Field::Category), Some(&ValidationError::Required));

        draft.market_question = "Will X happen?".to_string();
        draft.category = Some(Category::Politics);
        assert!(QuestionForm.validate(&draft).is_valid());
    }

    #[test]
    fn categorical_needs_two_filled_outcomes() {
        let mut draft = MarketDraft::new(MarketType::Categorical);
        let ids = draft.outcomes.ids();
        let errors = OutcomesForm.validate(&draft);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Outcome(ids[0])), Some(&ValidationError::Required));

        draft.outcomes.set(ids[0], "Yes");
        draft.outcomes.remove(ids[1]);
        let errors = OutcomesForm.validate(&draft);
        assert_eq!(
            errors.get(Field::Outcomes),
            Some(&ValidationError::TooFewOutcomes { min: 2 })
        );
    }

    #[test]
    fn multi_scalar_requires_template() {
        let mut draft = MarketDraft::new(MarketType::MultiScalar);
        for (id, v) in draft.outcomes.ids().into_iter().zip(["Alice", "Bob"]) {
            draft.outcomes.set(id, v);
        }
        let errors = OutcomesForm.validate(&draft);
        assert_eq!(
            errors.get(Field::OutcomesQuestionTemplate),
            Some(&ValidationError::Required)
        );
        draft.outcomes_question_template = "Votes for [outcome]?".to_string();
        assert!(OutcomesForm.validate(&draft).is_valid());
    }

    #[test]
    fn scalar_bound_order_fails_regardless_of_other_fields() {
        for (lower, upper) in [("10", "10"), ("10", "5"), ("0", "0"), ("-5", "-6")] {
            let mut draft = scalar(lower, upper);
            draft.unit.clear();
            let errors = OutcomesForm.validate(&draft);
            assert!(
                matches!(
                    errors.get(Field::UpperBound),
                    Some(ValidationError::BoundOrder { .. })
                ),
                "{lower}..{upper}"
            );
        }
    }

    #[test]
    fn scalar_accepts_increasing_range() {
        assert!(OutcomesForm.validate(&scalar("0", "100")).is_valid());
        assert!(OutcomesForm.validate(&scalar("0.5", "0.75")).is_valid());
    }

    #[test]
    fn scalar_parse_errors() {
        let errors = OutcomesForm.validate(&scalar("abc", "10"));
        assert_eq!(errors.get(Field::LowerBound), Some(&ValidationError::Negative));
        assert!(errors.get(Field::UpperBound).is_none());

        let errors = OutcomesForm.validate(&scalar("1", "ten"));
        assert_eq!(errors.get(Field::UpperBound), Some(&ValidationError::NotANumber));

        let errors = OutcomesForm.validate(&scalar("", ""));
        assert_eq!(errors.get(Field::LowerBound), Some(&ValidationError::Required));
        assert_eq!(errors.get(Field::UpperBound), Some(&ValidationError::Required));

        let errors = OutcomesForm.validate(&scalar("inf", "NaN"));
        assert_eq!(errors.get(Field::LowerBound), Some(&ValidationError::Negative));
        assert_eq!(errors.get(Field::UpperBound), Some(&ValidationError::NotANumber));
    }

    #[test]
    fn scalar_ignores_outcome_list() {
        let mut draft = scalar("1", "2");
        draft.outcomes.add();
        assert!(OutcomesForm.validate(&draft).is_valid());
    }

    #[test]
    fn bounds_beyond_on_chain_precision_are_blocked() {
        let errors = OutcomesForm.validate(&scalar("0", "0.0000000000000000001"));
        assert_eq!(
            errors.get(Field::UpperBound),
            Some(&ValidationError::TooPrecise { decimals: 18 })
        );
        assert!(errors.get(Field::LowerBound).is_none());

        let errors = OutcomesForm.validate(&scalar("0.0000000000000000001", "1"));
        assert_eq!(
            errors.get(Field::LowerBound),
            Some(&ValidationError::TooPrecise { decimals: 18 })
        );

        let huge = "9".repeat(80);
        let errors = OutcomesForm.validate(&scalar("0", &huge));
        assert_eq!(errors.get(Field::UpperBound), Some(&ValidationError::TooLarge));
    }

    #[test]
    fn bounds_are_ordered_exactly() {
        assert!(OutcomesForm.validate(&scalar("0.1", "0.10000000000000001")).is_valid());
        assert!(OutcomesForm.validate(&scalar("0", "0.000000000000000001")).is_valid());

        let errors = OutcomesForm.validate(&scalar("0.10000000000000001", "0.1"));
        assert_eq!(
            errors.get(Field::UpperBound),
            Some(&ValidationError::BoundOrder {
                lower: "0.10000000000000001".to_string()
            })
        );
        // equal once trailing zeros are dropped
        let errors = OutcomesForm.validate(&scalar("2.50", "2.5"));
        assert_eq!(
            errors.get(Field::UpperBound).map(ToString::to_string).as_deref(),
            Some("Value must be greater than 2.5.")
        );
    }

    #[test]
    fn parse_bound_accepts_plain_decimals_only() {
        assert_eq!(parse_bound(" 12.5 ").unwrap().units(), parse_units("12.5", 18).ok());
        assert_eq!(parse_bound(".5").unwrap().to_string(), "0.5");
        let minus_three = parse_bound("-3").unwrap();
        assert!(minus_three.is_negative());
        assert_eq!(minus_three.units(), None);
        assert_eq!(minus_three.to_string(), "-3");
        assert!(!parse_bound("-0.0").unwrap().is_negative());
        assert_eq!(parse_bound("1e3"), Err(ParseUnitsError::Invalid));
        assert_eq!(parse_bound("."), Err(ParseUnitsError::Invalid));
        assert_eq!(parse_bound("1.2.3"), Err(ParseUnitsError::Invalid));
        assert_eq!(parse_bound("--1"), Err(ParseUnitsError::Invalid));
        assert_eq!(parse_bound("- 1"), Err(ParseUnitsError::Invalid));
        assert_eq!(parse_bound("+1"), Err(ParseUnitsError::Invalid));
    }

    #[test]
    fn bound_order_is_signed() {
        let b = |s| parse_bound(s).unwrap();
        assert!(b("-5") > b("-6"));
        assert!(b("-0.5") < b("0"));
        assert!(b("-0") == b("0"));
        assert!(b("1") > b("0.999999999999999999"));
    }

    #[test]
    fn form_for_maps_each_step() {
        for step in [Step::Question, Step::Outcomes, Step::Confirm] {
            assert_eq!(form_for(step).step(), step);
        }
    }
}
