//! Broadcast event contract

use chrono::{DateTime, Utc};
use lotdraw_types::{DrawResult, Lot, Participant};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::next_draw::NextDraw;

/// Audience channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    /// Operator console
    Prompter,
    /// Public display in the room
    MainScreen,
    /// Public feed
    Broadcast,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Prompter, Channel::MainScreen, Channel::Broadcast];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Channel::Prompter => "prompter",
            Channel::MainScreen => "mainScreen",
            Channel::Broadcast => "broadcast",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the prompter shows about a winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerDetails {
    pub result: DrawResult,
    pub participant: Participant,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot: Option<Lot>,
}

/// Events a display can receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum BroadcastEvent {
    WinnerAnnounced(DrawResult),
    FullInfo(WinnerDetails),
    DefaultPage,
    RecentResults {
        limit: usize,
        results: Vec<DrawResult>,
    },
    /// `None` once the schedule is exhausted
    NextDrawPreview(Option<NextDraw>),
}

impl BroadcastEvent {
    pub const fn name(&self) -> &'static str {
        match self {
            BroadcastEvent::WinnerAnnounced(_) => "winnerAnnounced",
            BroadcastEvent::FullInfo(_) => "fullInfo",
            BroadcastEvent::DefaultPage => "defaultPage",
            BroadcastEvent::RecentResults { .. } => "recentResults",
            BroadcastEvent::NextDrawPreview(_) => "nextDrawPreview",
        }
    }
}

/// One emission on one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub id: Uuid,
    pub emitted_at: DateTime<Utc>,
    pub channel: Channel,
    #[serde(flatten)]
    pub event: BroadcastEvent,
}

impl EventEnvelope {
    pub fn new(channel: Channel, event: BroadcastEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            emitted_at: Utc::now(),
            channel,
            event,
        }
    }
}
