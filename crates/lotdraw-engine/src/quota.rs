//! Quota Schedule: how many incumbents and alternates each pool produces.
//!
//! Loaded once at start-up and shared by reference between the validator and
//! the draw schedule, so both always consult the same limits.

use std::collections::BTreeMap;

use lotdraw_types::{Bucket, DrawClass, Group, ResultKind};
use serde::{Deserialize, Serialize};

use crate::error::QuotaError;

/// Incumbent and alternate limits for one (group, draw class) pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaLimits {
    pub incumbent: u32,
    pub alternate: u32,
}

impl QuotaLimits {
    pub const fn new(incumbent: u32, alternate: u32) -> Self {
        Self {
            incumbent,
            alternate,
        }
    }

    pub const fn get(&self, kind: ResultKind) -> u32 {
        match kind {
            ResultKind::Incumbent => self.incumbent,
            ResultKind::Alternate => self.alternate,
        }
    }

    pub const fn total(&self) -> u32 {
        self.incumbent + self.alternate
    }
}

/// Limits of both draw classes of a group. Both classes are always present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupQuota {
    pub priority: QuotaLimits,
    pub general: QuotaLimits,
}

impl GroupQuota {
    pub const fn new(priority: QuotaLimits, general: QuotaLimits) -> Self {
        Self { priority, general }
    }

    pub const fn limits(&self, draw_class: DrawClass) -> QuotaLimits {
        match draw_class {
            DrawClass::Priority => self.priority,
            DrawClass::General => self.general,
        }
    }
}

/// Built-in catalogue: two groups, each with a small priority pool and a
/// general pool sized to the number of lots on offer.
const STANDARD_TABLE: [(u32, GroupQuota); 2] = [
    (
        1,
        GroupQuota::new(QuotaLimits::new(2, 8), QuotaLimits::new(74, 74)),
    ),
    (
        2,
        GroupQuota::new(QuotaLimits::new(2, 8), QuotaLimits::new(22, 22)),
    ),
];

/// Immutable (group, draw class) → limits lookup.
///
/// Lookups are total: a group outside the schedule has a limit of zero for
/// every bucket, so nothing can be committed there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotaSchedule {
    groups: BTreeMap<Group, GroupQuota>,
}

impl QuotaSchedule {
    /// Build a schedule, rejecting duplicate groups and empty input.
    pub fn new(entries: impl IntoIterator<Item = (Group, GroupQuota)>) -> Result<Self, QuotaError> {
        let mut groups = BTreeMap::new();
        for (group, quota) in entries {
            if groups.insert(group, quota).is_some() {
                return Err(QuotaError::DuplicateGroup(group));
            }
        }
        if groups.is_empty() {
            return Err(QuotaError::Empty);
        }
        Ok(Self { groups })
    }

    /// Build a schedule from raw group numbers.
    pub fn from_table(table: &[(u32, GroupQuota)]) -> Result<Self, QuotaError> {
        let entries = table
            .iter()
            .map(|(number, quota)| Ok((Group::new(*number)?, *quota)))
            .collect::<Result<Vec<_>, QuotaError>>()?;
        Self::new(entries)
    }

    /// Limit of a single bucket.
    pub fn limit(&self, bucket: Bucket) -> u32 {
        self.groups
            .get(&bucket.group)
            .map(|quota| quota.limits(bucket.draw_class).get(bucket.kind))
            .unwrap_or(0)
    }

    pub fn group(&self, group: Group) -> Option<&GroupQuota> {
        self.groups.get(&group)
    }

    /// Configured groups in ascending order.
    pub fn groups(&self) -> impl Iterator<Item = (Group, &GroupQuota)> + '_ {
        self.groups.iter().map(|(group, quota)| (*group, quota))
    }

    /// Every bucket in draw order: groups ascending, priority before
    /// general, incumbents before alternates.
    pub fn buckets(&self) -> impl Iterator<Item = Bucket> + '_ {
        self.groups.keys().flat_map(|group| {
            DrawClass::ALL.into_iter().flat_map(move |draw_class| {
                ResultKind::ALL
                    .into_iter()
                    .map(move |kind| Bucket::new(*group, draw_class, kind))
            })
        })
    }

    /// Number of draws the whole schedule produces.
    pub fn total_slots(&self) -> u64 {
        self.groups
            .values()
            .map(|q| u64::from(q.priority.total()) + u64::from(q.general.total()))
            .sum()
    }
}

impl Default for QuotaSchedule {
    fn default() -> Self {
        let groups = STANDARD_TABLE
            .iter()
            .filter_map(|(number, quota)| Group::new(*number).ok().map(|group| (group, *quota)))
            .collect();
        Self { groups }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(n: u32) -> Group {
        Group::new(n).unwrap()
    }

    #[test]
    fn standard_schedule_matches_catalogue() {
        let schedule = QuotaSchedule::default();
        assert_eq!(
            schedule.limit(Bucket::new(g(1), DrawClass::Priority, ResultKind::Incumbent)),
            2
        );
        assert_eq!(
            schedule.limit(Bucket::new(g(1), DrawClass::Priority, ResultKind::Alternate)),
            8
        );
        assert_eq!(
            schedule.limit(Bucket::new(g(2), DrawClass::General, ResultKind::Alternate)),
            22
        );
        assert_eq!(schedule.total_slots(), 10 + 148 + 10 + 44);
    }

    #[test]
    fn unknown_group_has_zero_limit() {
        let schedule = QuotaSchedule::default();
        assert_eq!(
            schedule.limit(Bucket::new(g(9), DrawClass::General, ResultKind::Incumbent)),
            0
        );
    }

    #[test]
    fn duplicate_groups_are_rejected() {
        let quota = GroupQuota::default();
        let err = QuotaSchedule::new([(g(1), quota), (g(1), quota)]).unwrap_err();
        assert_eq!(err, QuotaError::DuplicateGroup(g(1)));
    }

    #[test]
    fn group_zero_and_empty_tables_are_rejected() {
        assert!(matches!(
            QuotaSchedule::from_table(&[(0, GroupQuota::default())]),
            Err(QuotaError::InvalidGroup(_))
        ));
        assert_eq!(QuotaSchedule::from_table(&[]), Err(QuotaError::Empty));
    }

    #[test]
    fn buckets_follow_draw_order() {
        let schedule = QuotaSchedule::from_table(&[
            (2, GroupQuota::default()),
            (1, GroupQuota::default()),
        ])
        .unwrap();
        let buckets: Vec<Bucket> = schedule.buckets().collect();
        assert_eq!(buckets.len(), 8);
        assert_eq!(buckets[0], Bucket::new(g(1), DrawClass::Priority, ResultKind::Incumbent));
        assert_eq!(buckets[1], Bucket::new(g(1), DrawClass::Priority, ResultKind::Alternate));
        assert_eq!(buckets[2], Bucket::new(g(1), DrawClass::General, ResultKind::Incumbent));
        assert_eq!(buckets[4], Bucket::new(g(2), DrawClass::Priority, ResultKind::Incumbent));
    }
}
