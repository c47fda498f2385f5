use thiserror::Error;

/// Failure of a single swap attempt, kept so the final report can show every reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapAttempt {
    pub direction: u64,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Invalid amount. Please enter a positive number.")]
    InvalidAmount,

    #[error("Invalid count. Please enter a positive integer.")]
    InvalidCount,

    #[error("Insufficient {symbol} balance. Available: {available}, Required: {required} {symbol}")]
    InsufficientBalance {
        symbol: String,
        available: String,
        required: String,
    },

    #[error("Transaction canceled.")]
    UserCanceled,

    #[error("Approval canceled, cannot proceed without a sufficient allowance.")]
    AllowanceDenied,

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("{message}")]
    Revert {
        message: String,
        reason: Option<String>,
        data: Option<String>,
    },

    #[error("Swap failed in every direction: {}", format_attempts(.attempts))]
    SwapFailed { attempts: Vec<SwapAttempt> },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Input closed")]
    InputClosed,

    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

fn format_attempts(attempts: &[SwapAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("directions={} ({})", a.direction, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

impl BotError {
    /// User-driven outcomes that end an action without anything going wrong on chain.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BotError::UserCanceled | BotError::AllowanceDenied)
    }

    /// The interactive input is gone; nothing more can be asked.
    pub fn is_input_failure(&self) -> bool {
        matches!(self, BotError::InputClosed | BotError::Io(_))
    }

    /// One-line description including the revert reason when there is one.
    pub fn summary(&self) -> String {
        match self {
            BotError::Revert {
                message,
                reason: Some(reason),
                ..
            } => format!("{message}: {reason}"),
            other => other.to_string(),
        }
    }

    /// Revert reason and raw revert data, when the failure carried them.
    pub fn revert_details(&self) -> (Option<&str>, Option<&str>) {
        match self {
            BotError::Revert { reason, data, .. } => (reason.as_deref(), data.as_deref()),
            _ => (None, None),
        }
    }
}

pub type Result<T, E = BotError> = std::result::Result<T, E>;
