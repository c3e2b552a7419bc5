//! Domain error type for workstack, carrying the eight categories of §7.
//!
//! Internal propagation inside command handlers and collectors uses
//! `anyhow::Result`; at the CLI boundary (`main.rs`) an error is downcast to
//! [`WsError`] when possible to pick an exit code, else treated as an
//! unexpected internal error (exit 1).

use crate::styling::{ERROR, ERROR_EMOJI, HINT, HINT_EMOJI};

/// One of the eight error categories (§7).
#[derive(Debug)]
pub enum WsError {
    /// Invalid flag combination or missing required input.
    Usage { message: String },
    /// Input violates a data rule (e.g. reserved worktree name).
    Validation { message: String },
    /// A referenced entity doesn't exist.
    NotFound { message: String, hint: Option<String> },
    /// An entity already exists or is in use.
    Conflict { message: String, hint: Option<String> },
    /// State doesn't permit the action.
    Precondition { message: String, hint: Option<String> },
    /// An underlying tool (git, PR host CLI, stacked-diff CLI) failed.
    External {
        message: String,
        command: String,
        exit_code: Option<i32>,
    },
    /// Persisted data is malformed (e.g. corrupt branch-graph cache).
    Corruption { message: String },
    /// A status collector exceeded its budget. Internal only; never
    /// surfaced to a user as a command failure.
    Timeout { collector: String },
}

impl WsError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            hint: None,
        }
    }

    pub fn not_found_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            hint: None,
        }
    }

    pub fn conflict_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
            hint: None,
        }
    }

    pub fn precondition_with_hint(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn external(message: impl Into<String>, command: impl Into<String>) -> Self {
        Self::External {
            message: message.into(),
            command: command.into(),
            exit_code: None,
        }
    }

    pub fn external_with_code(
        message: impl Into<String>,
        command: impl Into<String>,
        exit_code: i32,
    ) -> Self {
        Self::External {
            message: message.into(),
            command: command.into(),
            exit_code: Some(exit_code),
        }
    }

    pub fn corruption(message: impl Into<String>) -> Self {
        Self::Corruption {
            message: message.into(),
        }
    }

    /// Exit code this error should cause `main` to return, per §6/§7.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::External { exit_code, .. } => exit_code.unwrap_or(1),
            _ => 1,
        }
    }
}

impl std::fmt::Display for WsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Usage { message } | Self::Validation { message } => {
                write!(f, "{ERROR_EMOJI} {ERROR}{message}{ERROR:#}")
            }
            Self::NotFound { message, hint }
            | Self::Conflict { message, hint }
            | Self::Precondition { message, hint } => {
                write!(f, "{ERROR_EMOJI} {ERROR}{message}{ERROR:#}")?;
                if let Some(hint) = hint {
                    write!(f, "\n{HINT_EMOJI} {HINT}{hint}{HINT:#}")?;
                }
                Ok(())
            }
            Self::External {
                message, command, ..
            } => {
                write!(
                    f,
                    "{ERROR_EMOJI} {ERROR}{message}{ERROR:#}\n{HINT_EMOJI} {HINT}failed command: {command}{HINT:#}"
                )
            }
            Self::Corruption { message } => {
                write!(f, "{ERROR_EMOJI} {ERROR}corrupt data: {message}{ERROR:#}")
            }
            Self::Timeout { collector } => {
                write!(f, "collector '{collector}' timed out")
            }
        }
    }
}

impl std::error::Error for WsError {}
