//! Post-commit broadcasting to the operator console and public displays

mod event;
mod hub;
mod orchestrator;
mod script;
mod timer;

pub use event::{BroadcastEvent, Channel, EventEnvelope, WinnerDetails};
pub use hub::{BroadcastSink, ChannelHub};
pub use orchestrator::{BroadcastConfig, Broadcaster, SequenceHandle, SequenceReport};
pub use script::{script_for, BroadcastDelays, Emission, ScriptStep};
pub use timer::{Timer, TokioTimer};
