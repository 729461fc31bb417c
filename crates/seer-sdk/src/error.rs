use thiserror::Error;

use crate::wizard::Step;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("ABI error: {0}")]
    Abi(#[from] ethabi::Error),

    #[error("ABI encoding error: {0}")]
    AbiEncode(String),

    #[error("ABI decoding error: {0}")]
    AbiDecode(String),

    #[error("unknown ABI function: {0}")]
    UnknownFunction(String),

    #[error("invalid market: {0}")]
    InvalidMarket(String),

    #[error("wizard is closed (already submitted or abandoned)")]
    WizardClosed,

    #[error("operation requires the {expected:?} step (current step is {found:?})")]
    NotOnStep { expected: Step, found: Step },

    #[error("unknown outcome id {0}")]
    UnknownOutcome(u64),

    #[error("a submission is already pending")]
    SubmissionPending,

    #[error("contract address not configured: {0}")]
    MissingContract(&'static str),

    #[error("chain backend error: {0}")]
    Backend(String),

    #[error("transaction error: {0}")]
    Transaction(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by [`SeerNode`](crate::node::SeerNode) async operations.
#[derive(Debug)]
pub enum NodeError {
    /// An SDK operation failed.
    Sdk(Error),
    /// A `spawn_blocking` task failed to join.
    Task(String),
    /// The shared address book mutex was poisoned.
    MutexPoisoned,
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeError::Sdk(e) => write!(f, "sdk error: {e}"),
            NodeError::Task(e) => write!(f, "task join error: {e}"),
            NodeError::MutexPoisoned => write!(f, "mutex poisoned"),
        }
    }
}

impl std::error::Error for NodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            NodeError::Sdk(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for NodeError {
    fn from(e: Error) -> Self {
        NodeError::Sdk(e)
    }
}
