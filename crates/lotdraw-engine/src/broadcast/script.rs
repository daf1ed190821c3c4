//! Broadcast scripts: what goes out, where, and after which pause.

use std::time::Duration;

use lotdraw_types::ResultKind;
use serde::{Deserialize, Serialize};

use super::event::Channel;

/// Pauses between steps of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastDelays {
    /// Before the prompter receives the full winner information
    #[serde(with = "millis")]
    pub full_info: Duration,
    /// Before the main screen returns to its default page
    #[serde(with = "millis")]
    pub default_page: Duration,
    /// Before the main screen lists recent results
    #[serde(with = "millis")]
    pub recent_results: Duration,
    /// Before the next draw is previewed
    #[serde(with = "millis")]
    pub next_draw: Duration,
}

impl BroadcastDelays {
    pub const fn from_millis(full_info: u64, default_page: u64, recent_results: u64, next_draw: u64) -> Self {
        Self {
            full_info: Duration::from_millis(full_info),
            default_page: Duration::from_millis(default_page),
            recent_results: Duration::from_millis(recent_results),
            next_draw: Duration::from_millis(next_draw),
        }
    }

    /// No pauses at all.
    pub const fn immediate() -> Self {
        Self::from_millis(0, 0, 0, 0)
    }
}

impl Default for BroadcastDelays {
    fn default() -> Self {
        Self::from_millis(3_000, 7_000, 5_000, 5_000)
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// What to build for a single emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emission {
    WinnerAnnounced,
    FullInfo,
    DefaultPage,
    RecentResults(usize),
    NextDrawPreview,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptStep {
    /// Pause before this step, measured from the end of the previous one
    pub delay: Duration,
    pub emissions: Vec<(Channel, Emission)>,
}

impl ScriptStep {
    fn new(delay: Duration, emissions: impl IntoIterator<Item = (Channel, Emission)>) -> Self {
        Self {
            delay,
            emissions: emissions.into_iter().collect(),
        }
    }
}

fn announce_everywhere() -> impl Iterator<Item = (Channel, Emission)> {
    Channel::ALL
        .into_iter()
        .map(|channel| (channel, Emission::WinnerAnnounced))
}

/// The sequence played after a result of `kind` is committed.
pub fn script_for(kind: ResultKind, delays: &BroadcastDelays) -> Vec<ScriptStep> {
    match kind {
        ResultKind::Incumbent => vec![
            ScriptStep::new(Duration::ZERO, announce_everywhere()),
            ScriptStep::new(delays.full_info, [(Channel::Prompter, Emission::FullInfo)]),
            ScriptStep::new(
                delays.default_page,
                [
                    (Channel::MainScreen, Emission::DefaultPage),
                    (Channel::Broadcast, Emission::RecentResults(3)),
                ],
            ),
            ScriptStep::new(
                delays.recent_results,
                [(Channel::MainScreen, Emission::RecentResults(5))],
            ),
            ScriptStep::new(
                delays.next_draw,
                [
                    (Channel::MainScreen, Emission::NextDrawPreview),
                    (Channel::Broadcast, Emission::NextDrawPreview),
                ],
            ),
        ],
        ResultKind::Alternate => vec![
            ScriptStep::new(
                Duration::ZERO,
                announce_everywhere().chain([
                    (Channel::MainScreen, Emission::RecentResults(5)),
                    (Channel::Broadcast, Emission::RecentResults(3)),
                ]),
            ),
            ScriptStep::new(delays.full_info, [(Channel::Prompter, Emission::FullInfo)]),
        ],
    }
}
