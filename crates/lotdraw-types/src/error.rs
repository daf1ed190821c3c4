//! Construction and parsing errors for core types

use thiserror::Error;

/// Errors raised while building or parsing core values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("group numbers start at 1, got {0}")]
    InvalidGroup(u32),

    #[error("unknown draw class: {0}")]
    UnknownDrawClass(String),

    #[error("unknown result kind: {0}")]
    UnknownResultKind(String),
}
