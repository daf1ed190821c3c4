//! Result orchestration for a public lot lottery.
//!
//! Participants are drawn group by group, first from the priority pool and
//! then from the general pool. Each (group, draw class) pool produces a fixed
//! number of incumbents, who win a lot, and alternates, who queue with an
//! order number. This crate is the part of the system that keeps those
//! numbers honest:
//!
//! - **Quota Schedule**: immutable limits per bucket, shared by reference.
//! - **Result Validator**: five ordered stages; the first rejection wins.
//! - **Commit**: a fenced insert that the store refuses if a concurrent
//!   commit changed the bucket since validation.
//! - **Next-Draw Calculator**: the slot at index `committed` of the flattened
//!   schedule. No cursor is persisted.
//! - **Broadcast Orchestrator**: a cancellable task per commit that plays a
//!   timed script on three audience channels.
//!
//! ## Invariants
//!
//! - Committed results per bucket never exceed the configured limit.
//! - A participant holds at most one incumbent and one alternate per group.
//! - A lot is linked to at most one result.
//! - Alternate order numbers in a pool start at 1 and strictly increase in
//!   commit order.
//! - Nothing is broadcast for a commit the store did not confirm.

pub mod broadcast;
pub mod engine;
pub mod error;
pub mod mocks;
pub mod next_draw;
pub mod quota;
pub mod schedule;
pub mod store;
pub mod validator;

pub use broadcast::{
    BroadcastConfig, BroadcastDelays, BroadcastEvent, BroadcastSink, Broadcaster, Channel,
    ChannelHub, EventEnvelope, SequenceHandle, SequenceReport, Timer, TokioTimer, WinnerDetails,
};
pub use engine::{BucketProgress, Committed, DrawEngine, DrawEngineBuilder, EngineConfig};
pub use error::{
    BroadcastError, EngineError, EngineResult, IneligibleReason, LotUnavailableReason,
    NotFoundError, QuotaError, StoreError, ValidationError,
};
pub use mocks::{FailingSink, RecordingSink, RecordingTimer};
pub use next_draw::{NextDraw, NextDrawCalculator};
pub use quota::{GroupQuota, QuotaLimits, QuotaSchedule};
pub use schedule::{DrawSchedule, DrawSlot, SlotRun};
pub use store::{
    CommitFence, InMemoryDirectory, InMemoryResultStore, LotDirectory, ParticipantDirectory,
    ParticipantFilter, Registry, ResultFilter, ResultStore, SortOrder,
};
pub use validator::{ResultValidator, ValidatedCandidate, ValidationStage};
