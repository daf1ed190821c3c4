use lotdraw_types::{Bucket, Group, LotId, ParticipantId, ResultId, ResultKind};
use thiserror::Error;

use crate::broadcast::Channel;

/// Why a participant cannot enter a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    /// Registered in another group
    WrongGroup { registered: Group },
    /// Priority draws only admit the priority pool
    NotInPriorityPool,
}

impl std::fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IneligibleReason::WrongGroup { registered } => {
                write!(f, "registered in group {}", registered)
            }
            IneligibleReason::NotInPriorityPool => f.write_str("not registered in the priority pool"),
        }
    }
}

/// Why a lot cannot be awarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotUnavailableReason {
    /// Offered in another (group, draw class) pool
    WrongPool,
    /// Already linked to a committed result
    AlreadyAwarded(ResultId),
}

impl std::fmt::Display for LotUnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LotUnavailableReason::WrongPool => f.write_str("not offered in this pool"),
            LotUnavailableReason::AlreadyAwarded(id) => write!(f, "already awarded by {}", id),
        }
    }
}

/// Commit-time rejections. Returned to the caller as-is, never coerced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("quota exhausted for {bucket}: {committed} of {limit} committed")]
    QuotaExceeded {
        bucket: Bucket,
        limit: u32,
        committed: u32,
    },

    #[error("{participant} is not eligible: {reason}")]
    ParticipantIneligible {
        participant: ParticipantId,
        reason: IneligibleReason,
    },

    #[error("{participant} already holds an {kind} result in group {group}")]
    ParticipantAlreadyAssigned {
        participant: ParticipantId,
        group: Group,
        kind: ResultKind,
    },

    #[error("an incumbent result requires a lot")]
    LotRequired,

    #[error("{lot} is unavailable: {reason}")]
    LotUnavailable {
        lot: LotId,
        reason: LotUnavailableReason,
    },
}

/// Unknown record identifiers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    #[error("{0} not found")]
    Participant(ParticipantId),

    #[error("{0} not found")]
    Lot(LotId),

    #[error("{0} not found")]
    Result(ResultId),

    #[error("no results have been committed yet")]
    NoResults,
}

/// Persistence failures. A commit that fails here is never broadcast.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The fence check failed: another commit changed the bucket first.
    #[error("commit conflict: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Broadcast emission failures. Logged and contained by the orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("no subscribers on channel {0}")]
    NoSubscribers(Channel),

    #[error("channel {0} is closed")]
    Closed(Channel),

    #[error("failed to build payload: {0}")]
    Payload(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("sequence task failed: {0}")]
    Task(String),
}

/// Quota configuration errors, raised once at start-up.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QuotaError {
    #[error("group {0} is configured more than once")]
    DuplicateGroup(Group),

    #[error("invalid group: {0}")]
    InvalidGroup(#[from] lotdraw_types::TypeError),

    #[error("quota schedule has no groups")]
    Empty,
}

/// Errors surfaced by the draw engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// The validation rejection, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            EngineError::Validation(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, EngineError::Store(StoreError::Conflict(_)))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
