//! Market-creation wizard: a finite-state machine over [`MarketDraft`].
//!
//! ```text
//!   Question ──next──▶ Outcomes ──next──▶ Confirm ──submit──▶ Submitted
//!      ▲                  │  ▲               │
//!      └──────prev────────┘  └─────prev──────┘
//!   (any editing step) ──abandon──▶ Abandoned
//! ```
//!
//! Forward moves are gated by the current step's [`StepForm`]; backward moves
//! are unconditional and never touch the draft. While a submission is pending
//! the draft is frozen: edits, moves and abandon all fail.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::draft::{Category, MarketDraft, MarketType, OutcomeId, outcome_question};
use crate::error::{Error, Result};
use crate::forms::{StepForm, bound_error, form_for, parse_bound};
use crate::primitives::U256;
use crate::validation::{Field, FieldErrors, ValidationError};

/// Decimals used to encode scalar bounds on-chain.
pub const SCALAR_BOUND_DECIMALS: u8 = 18;

/// Outcome names of a scalar market, low end first.
pub const SCALAR_OUTCOMES: [&str; 2] = ["DOWN", "UP"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Question,
    Outcomes,
    Confirm,
}

impl Step {
    pub const ALL: [Step; 3] = [Step::Question, Step::Outcomes, Step::Confirm];

    pub fn title(self) -> &'static str {
        match self {
            Step::Question => "Question",
            Step::Outcomes => "Outcomes",
            Step::Confirm => "Confirm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Next,
    Prev,
}

/// Every allowed step change. Anything absent is not a legal move.
const TRANSITIONS: &[(Step, Direction, Step)] = &[
    (Step::Question, Direction::Next, Step::Outcomes),
    (Step::Outcomes, Direction::Next, Step::Confirm),
    (Step::Outcomes, Direction::Prev, Step::Question),
    (Step::Confirm, Direction::Prev, Step::Outcomes),
];

pub fn transition(from: Step, direction: Direction) -> Option<Step> {
    TRANSITIONS
        .iter()
        .find(|(f, d, _)| *f == from && *d == direction)
        .map(|(_, _, to)| *to)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "step", rename_all = "snake_case")]
pub enum WizardState {
    Editing(Step),
    Submitted,
    Abandoned,
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Moved(Step),
    /// The current step did not validate; the wizard stayed put.
    Blocked(FieldErrors),
    /// No step in that direction.
    Unchanged(Step),
}

/// Outcome of a submission request.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Ready(CreateMarketRequest),
    Blocked(FieldErrors),
}

/// What the transaction layer needs to create the market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMarketRequest {
    pub market_type: MarketType,
    /// The question exactly as entered.
    pub market_name: String,
    pub category: Category,
    /// Outcome names in entry order.
    pub outcomes: Vec<String>,
    /// Per-outcome questions (multi-scalar only).
    pub outcome_questions: Vec<String>,
    pub lower_bound: Option<U256>,
    pub upper_bound: Option<U256>,
    pub unit: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeUpdate {
    pub id: OutcomeId,
    pub value: String,
}

/// Partial draft edit coming from the frontend. Absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DraftUpdate {
    pub market_type: Option<MarketType>,
    pub market_question: Option<String>,
    pub category: Option<Category>,
    pub lower_bound: Option<String>,
    pub upper_bound: Option<String>,
    pub unit: Option<String>,
    pub outcomes_question_template: Option<String>,
    pub outcomes: Vec<OutcomeUpdate>,
    pub focus: Option<OutcomeId>,
}

/// Serializable wizard snapshot for the frontend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardView {
    pub state: WizardState,
    pub draft: MarketDraft,
    pub errors: FieldErrors,
    pub can_advance: bool,
    pub furthest_step: Step,
    pub pending: bool,
    /// Outcome id -> rendered outcome question.
    pub outcome_help: BTreeMap<OutcomeId, String>,
}

pub struct Wizard {
    state: WizardState,
    draft: MarketDraft,
    furthest: Step,
    pending: bool,
}

impl Wizard {
    pub fn new(market_type: MarketType) -> Self {
        Self {
            state: WizardState::Editing(Step::Question),
            draft: MarketDraft::new(market_type),
            furthest: Step::Question,
            pending: false,
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn draft(&self) -> &MarketDraft {
        &self.draft
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn step(&self) -> Result<Step> {
        match self.state {
            WizardState::Editing(step) => Ok(step),
            _ => Err(Error::WizardClosed),
        }
    }

    /// The current step, unless a submission is in flight.
    fn unlocked_step(&self) -> Result<Step> {
        let step = self.step()?;
        if self.pending {
            return Err(Error::SubmissionPending);
        }
        Ok(step)
    }

    fn editing(&mut self) -> Result<&mut MarketDraft> {
        self.unlocked_step()?;
        Ok(&mut self.draft)
    }

    // ── Field edits ─────────────────────────────────────────────────────────

    pub fn set_market_type(&mut self, market_type: MarketType) -> Result<()> {
        self.editing()?.set_market_type(market_type);
        Ok(())
    }

    pub fn set_market_question(&mut self, question: impl Into<String>) -> Result<()> {
        self.editing()?.market_question = question.into();
        Ok(())
    }

    pub fn set_category(&mut self, category: Option<Category>) -> Result<()> {
        self.editing()?.category = category;
        Ok(())
    }

    pub fn set_lower_bound(&mut self, value: impl Into<String>) -> Result<()> {
        self.editing()?.lower_bound = value.into();
        Ok(())
    }

    pub fn set_upper_bound(&mut self, value: impl Into<String>) -> Result<()> {
        self.editing()?.upper_bound = value.into();
        Ok(())
    }

    pub fn set_unit(&mut self, value: impl Into<String>) -> Result<()> {
        self.editing()?.unit = value.into();
        Ok(())
    }

    pub fn set_outcomes_question_template(&mut self, value: impl Into<String>) -> Result<()> {
        self.editing()?.outcomes_question_template = value.into();
        Ok(())
    }

    pub fn add_outcome(&mut self) -> Result<OutcomeId> {
        let draft = self.editing()?;
        let id = draft.outcomes.add();
        draft.outcomes.focus(id);
        Ok(id)
    }

    pub fn remove_outcome(&mut self, id: OutcomeId) -> Result<()> {
        self.editing()?
            .outcomes
            .remove(id)
            .map(|_| ())
            .ok_or(Error::UnknownOutcome(id.0))
    }

    pub fn set_outcome(&mut self, id: OutcomeId, value: impl Into<String>) -> Result<()> {
        if self.editing()?.outcomes.set(id, value) {
            Ok(())
        } else {
            Err(Error::UnknownOutcome(id.0))
        }
    }

    pub fn focus_outcome(&mut self, id: OutcomeId) -> Result<()> {
        if self.editing()?.outcomes.focus(id) {
            Ok(())
        } else {
            Err(Error::UnknownOutcome(id.0))
        }
    }

    /// Apply a partial edit atomically: on an unknown outcome id nothing
    /// changes.
    pub fn apply(&mut self, update: DraftUpdate) -> Result<()> {
        let mut draft = self.editing()?.clone();
        if let Some(t) = update.market_type {
            draft.set_market_type(t);
        }
        if let Some(q) = update.market_question {
            draft.market_question = q;
        }
        if update.category.is_some() {
            draft.category = update.category;
        }
        if let Some(v) = update.lower_bound {
            draft.lower_bound = v;
        }
        if let Some(v) = update.upper_bound {
            draft.upper_bound = v;
        }
        if let Some(v) = update.unit {
            draft.unit = v;
        }
        if let Some(v) = update.outcomes_question_template {
            draft.outcomes_question_template = v;
        }
        for o in update.outcomes {
            if !draft.outcomes.set(o.id, o.value) {
                return Err(Error::UnknownOutcome(o.id.0));
            }
        }
        if let Some(id) = update.focus {
            if !draft.outcomes.focus(id) {
                return Err(Error::UnknownOutcome(id.0));
            }
        }
        self.draft = draft;
        Ok(())
    }

    // ── Validation & navigation ─────────────────────────────────────────────

    /// Errors of the current step; on `Confirm`, of every step.
    pub fn errors(&self) -> FieldErrors {
        match self.state {
            WizardState::Editing(Step::Confirm) => self.all_errors(),
            WizardState::Editing(step) => form_for(step).validate(&self.draft),
            _ => FieldErrors::new(),
        }
    }

    fn all_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for step in Step::ALL {
            errors.merge(form_for(step).validate(&self.draft));
        }
        errors
    }

    pub fn can_advance(&self) -> bool {
        self.step().is_ok() && self.errors().is_valid()
    }

    pub fn go_to_next_step(&mut self) -> Result<Transition> {
        let step = self.unlocked_step()?;
        let Some(to) = transition(step, Direction::Next) else {
            return Ok(Transition::Unchanged(step));
        };
        let errors = form_for(step).validate(&self.draft);
        if !errors.is_valid() {
            log::debug!("wizard: {step:?} blocked with {} errors", errors.len());
            return Ok(Transition::Blocked(errors));
        }
        self.state = WizardState::Editing(to);
        self.furthest = self.furthest.max(to);
        log::debug!("wizard: {step:?} -> {to:?}");
        Ok(Transition::Moved(to))
    }

    pub fn go_to_prev_step(&mut self) -> Result<Transition> {
        let step = self.unlocked_step()?;
        match transition(step, Direction::Prev) {
            Some(to) => {
                self.state = WizardState::Editing(to);
                log::debug!("wizard: {step:?} <- {to:?}");
                Ok(Transition::Moved(to))
            }
            None => Ok(Transition::Unchanged(step)),
        }
    }

    // ── Submission ──────────────────────────────────────────────────────────

    /// Validate everything and hand out the request. The wizard stays on
    /// `Confirm` with `pending` set until [`complete_submission`] or
    /// [`fail_submission`] is called.
    ///
    /// [`complete_submission`]: Wizard::complete_submission
    /// [`fail_submission`]: Wizard::fail_submission
    pub fn begin_submission(&mut self) -> Result<Submission> {
        let step = self.step()?;
        if step != Step::Confirm {
            return Err(Error::NotOnStep {
                expected: Step::Confirm,
                found: step,
            });
        }
        if self.pending {
            return Err(Error::SubmissionPending);
        }
        let errors = self.all_errors();
        if !errors.is_valid() {
            return Ok(Submission::Blocked(errors));
        }
        match build_request(&self.draft) {
            Ok(request) => {
                self.pending = true;
                Ok(Submission::Ready(request))
            }
            Err(errors) => Ok(Submission::Blocked(errors)),
        }
    }

    /// One-shot submission: on success the wizard is `Submitted` right away.
    pub fn submit(&mut self) -> Result<Submission> {
        let submission = self.begin_submission()?;
        if let Submission::Ready(_) = submission {
            self.complete_submission();
        }
        Ok(submission)
    }

    /// The external collaborator accepted the request; the draft is discarded.
    pub fn complete_submission(&mut self) {
        self.pending = false;
        self.state = WizardState::Submitted;
        self.draft = MarketDraft::new(self.draft.market_type);
    }

    /// The external collaborator failed; the draft stays as it was.
    pub fn fail_submission(&mut self) {
        self.pending = false;
    }

    pub fn abandon(&mut self) -> Result<()> {
        self.unlocked_step()?;
        self.state = WizardState::Abandoned;
        self.draft = MarketDraft::new(self.draft.market_type);
        Ok(())
    }

    pub fn view(&self) -> WizardView {
        let outcome_help = self
            .draft
            .outcomes
            .iter()
            .filter_map(|e| self.draft.outcome_help_text(e.id).map(|h| (e.id, h)))
            .collect();
        WizardView {
            state: self.state,
            draft: self.draft.clone(),
            errors: self.errors(),
            can_advance: self.can_advance(),
            furthest_step: self.furthest,
            pending: self.pending,
            outcome_help,
        }
    }
}

// Same parse as the Outcomes form, so a bound it accepted always scales.
fn scaled_bound(errors: &mut FieldErrors, field: Field, raw: &str) -> Option<U256> {
    let error = match parse_bound(raw) {
        Ok(bound) => match bound.units() {
            Some(units) => return Some(units),
            None => ValidationError::Negative,
        },
        Err(e) => bound_error(e, ValidationError::NotANumber),
    };
    errors.insert(field, error);
    None
}

/// Assemble the request from a draft that already passed every step form.
fn build_request(draft: &MarketDraft) -> std::result::Result<CreateMarketRequest, FieldErrors> {
    let mut errors = FieldErrors::new();
    let Some(category) = draft.category else {
        errors.insert(Field::Category, ValidationError::Required);
        return Err(errors);
    };

    let (outcomes, lower_bound, upper_bound) = if draft.market_type.needs_bounds() {
        let lower = scaled_bound(&mut errors, Field::LowerBound, &draft.lower_bound);
        let upper = scaled_bound(&mut errors, Field::UpperBound, &draft.upper_bound);
        let outcomes = SCALAR_OUTCOMES.iter().map(|s| s.to_string()).collect();
        (outcomes, lower, upper)
    } else {
        (draft.outcomes.values(), None, None)
    };
    if !errors.is_valid() {
        return Err(errors);
    }

    let outcome_questions = if draft.market_type.needs_outcomes_template() {
        let template = draft.outcomes_question_template.trim();
        outcomes.iter().map(|o| outcome_question(template, o)).collect()
    } else {
        Vec::new()
    };

    Ok(CreateMarketRequest {
        market_type: draft.market_type,
        market_name: draft.market_question.clone(),
        category,
        outcomes,
        outcome_questions,
        lower_bound,
        upper_bound,
        unit: draft.unit.trim().to_string(),
    })
}
