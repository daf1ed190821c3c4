#![allow(dead_code)]

use std::sync::Arc;

use lotdraw_engine::{GroupQuota, InMemoryDirectory, QuotaLimits, QuotaSchedule, Registry};
use lotdraw_types::{DrawClass, Group, Lot, LotId, Participant, ParticipantId};

pub fn g(n: u32) -> Group {
    Group::new(n).unwrap()
}

pub fn participant(id: u64, group: u32, draw_class: DrawClass) -> Participant {
    Participant {
        id: ParticipantId::new(id),
        ball_number: id as u32,
        first_name: format!("Name{}", id),
        last_name: format!("Surname{}", id),
        national_id: format!("{:08}", id),
        group: g(group),
        draw_class,
    }
}

pub fn lot(id: u64, group: u32, draw_class: DrawClass) -> Lot {
    Lot {
        id: LotId::new(id),
        group: g(group),
        draw_class,
        denomination: format!("Mz {} Lt {}", id / 100, id % 100),
        image: None,
    }
}

/// Group 1: priority 2 incumbents / 8 alternates, general 3 / 2.
pub fn small_quota() -> Arc<QuotaSchedule> {
    Arc::new(
        QuotaSchedule::from_table(&[(
            1,
            GroupQuota::new(QuotaLimits::new(2, 8), QuotaLimits::new(3, 2)),
        )])
        .unwrap(),
    )
}

/// Participants 1-10 in the priority pool and 11-30 in the general pool of
/// group 1; priority lots 101-102 and general lots 201-203.
pub async fn registry() -> Registry {
    let participants = (1..=10)
        .map(|id| participant(id, 1, DrawClass::Priority))
        .chain((11..=30).map(|id| participant(id, 1, DrawClass::General)));
    let lots = [101, 102]
        .into_iter()
        .map(|id| lot(id, 1, DrawClass::Priority))
        .chain([201, 202, 203].into_iter().map(|id| lot(id, 1, DrawClass::General)));

    Registry::in_memory(Arc::new(
        InMemoryDirectory::with_records(participants, lots).await,
    ))
}
