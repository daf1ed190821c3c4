//! Participant and lot fixtures for simulated lotteries

use std::path::Path;

use lotdraw_engine::QuotaSchedule;
use lotdraw_types::{DrawClass, Lot, LotId, Participant, ParticipantId};
use serde::de::DeserializeOwned;

use crate::error::{CliError, CliResult};

const FIRST_NAMES: [&str; 8] = [
    "Ana", "Bruno", "Carla", "Diego", "Elena", "Fabio", "Gloria", "Hugo",
];
const LAST_NAMES: [&str; 6] = ["Rojas", "Quispe", "Mendoza", "Vargas", "Flores", "Torres"];

fn load_json<T: DeserializeOwned>(path: &Path) -> CliResult<Vec<T>> {
    let fixture_error = |reason: String| CliError::Fixture {
        path: path.display().to_string(),
        reason,
    };
    let raw = std::fs::read_to_string(path).map_err(|e| fixture_error(e.to_string()))?;
    serde_json::from_str(&raw).map_err(|e| fixture_error(e.to_string()))
}

/// Read a JSON array of participants.
pub fn load_participants(path: &Path) -> CliResult<Vec<Participant>> {
    load_json(path)
}

/// Read a JSON array of lots.
pub fn load_lots(path: &Path) -> CliResult<Vec<Lot>> {
    load_json(path)
}

/// Participants for every group of the schedule: twice as many per pool as
/// the pool has slots, so the draw never runs dry.
pub fn synthesize_participants(quota: &QuotaSchedule) -> Vec<Participant> {
    let mut participants = Vec::new();
    for (group, limits) in quota.groups() {
        for draw_class in DrawClass::ALL {
            let pool_size = limits.limits(draw_class).total() * 2;
            for ball in 1..=pool_size {
                let id = participants.len() as u64 + 1;
                let index = id as usize;
                participants.push(Participant {
                    id: ParticipantId::new(id),
                    ball_number: ball,
                    first_name: FIRST_NAMES[index % FIRST_NAMES.len()].to_string(),
                    last_name: LAST_NAMES[index % LAST_NAMES.len()].to_string(),
                    national_id: format!("{:08}", 10_000_000 + id),
                    group,
                    draw_class,
                });
            }
        }
    }
    participants
}

/// One lot per incumbent slot of every pool.
pub fn synthesize_lots(quota: &QuotaSchedule) -> Vec<Lot> {
    let mut lots = Vec::new();
    for (group, limits) in quota.groups() {
        for draw_class in DrawClass::ALL {
            for number in 1..=limits.limits(draw_class).incumbent {
                let id = lots.len() as u64 + 1;
                lots.push(Lot {
                    id: LotId::new(id),
                    group,
                    draw_class,
                    denomination: format!(
                        "G{}-{}-{:03}",
                        group.number(),
                        draw_class.as_str().to_uppercase(),
                        number
                    ),
                    image: None,
                });
            }
        }
    }
    lots
}
