pub mod abi;
pub mod chain;
pub mod draft;
pub mod error;
pub mod forms;
pub mod market;
pub mod market_view;
pub mod network;
pub mod node;
pub mod primitives;
pub mod split;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod validation;
pub mod wizard;

// Core types
pub use chain::{ChainBackend, TransactionBackend};
pub use error::{Error, NodeError, Result};
pub use network::{Chain, ContractAddresses};
pub use node::SeerNode;
pub use primitives::{
    Address, H256, ParseUnitsError, U256, format_units, parse_address, parse_units,
};

// Read model
pub use market::{MarketInfo, MarketStatus, QuestionInfo};

// Market creation
pub use draft::{Category, MarketDraft, MarketType, OutcomeEntry, OutcomeId, OutcomeList};
pub use forms::{Bound, StepForm, form_for, parse_bound};
pub use validation::{Field, FieldErrors, ValidationError};
pub use wizard::{
    CreateMarketRequest, DraftUpdate, OutcomeUpdate, Step, Submission, Transition, Wizard,
    WizardState, WizardView,
};

// Split
pub use split::{SplitContext, SplitForm, SplitRequest};
