//! Draw results: candidates, validated inserts and committed records

use crate::draw::{Bucket, DrawClass, Group, ResultKind};
use crate::ids::{LotId, ParticipantId, ResultId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a winner received.
///
/// Incumbents are linked to exactly one lot and alternates carry an order
/// number, never the other way round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "resultKind", rename_all = "lowercase")]
pub enum Award {
    Incumbent {
        #[serde(rename = "lotId")]
        lot_id: LotId,
    },
    Alternate {
        #[serde(rename = "orderNumber")]
        order_number: u32,
    },
}

impl Award {
    pub const fn kind(&self) -> ResultKind {
        match self {
            Award::Incumbent { .. } => ResultKind::Incumbent,
            Award::Alternate { .. } => ResultKind::Alternate,
        }
    }

    pub const fn lot_id(&self) -> Option<LotId> {
        match self {
            Award::Incumbent { lot_id } => Some(*lot_id),
            Award::Alternate { .. } => None,
        }
    }

    pub const fn order_number(&self) -> Option<u32> {
        match self {
            Award::Incumbent { .. } => None,
            Award::Alternate { order_number } => Some(*order_number),
        }
    }
}

/// A committed draw result. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResult {
    pub id: ResultId,
    pub group: Group,
    pub draw_class: DrawClass,
    pub participant_id: ParticipantId,
    #[serde(flatten)]
    pub award: Award,
    pub created_at: DateTime<Utc>,
}

impl DrawResult {
    pub const fn kind(&self) -> ResultKind {
        self.award.kind()
    }

    pub const fn bucket(&self) -> Bucket {
        Bucket::new(self.group, self.draw_class, self.award.kind())
    }

    pub const fn lot_id(&self) -> Option<LotId> {
        self.award.lot_id()
    }

    pub const fn order_number(&self) -> Option<u32> {
        self.award.order_number()
    }
}

/// A validated result ready to be inserted by a result store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResult {
    pub group: Group,
    pub draw_class: DrawClass,
    pub participant_id: ParticipantId,
    #[serde(flatten)]
    pub award: Award,
}

impl NewResult {
    pub const fn bucket(&self) -> Bucket {
        Bucket::new(self.group, self.draw_class, self.award.kind())
    }

    /// Attach the store-assigned identity and commit timestamp.
    pub fn into_committed(self, id: ResultId, created_at: DateTime<Utc>) -> DrawResult {
        DrawResult {
            id,
            group: self.group,
            draw_class: self.draw_class,
            participant_id: self.participant_id,
            award: self.award,
            created_at,
        }
    }
}

/// Output of the physical draw, submitted for validation.
///
/// The lot is optional here so that a missing lot on an incumbent draw can be
/// reported instead of being unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultCandidate {
    pub group: Group,
    pub draw_class: DrawClass,
    #[serde(rename = "resultKind")]
    pub kind: ResultKind,
    pub participant_id: ParticipantId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_id: Option<LotId>,
}

impl ResultCandidate {
    pub fn incumbent(
        group: Group,
        draw_class: DrawClass,
        participant_id: ParticipantId,
        lot_id: LotId,
    ) -> Self {
        Self {
            group,
            draw_class,
            kind: ResultKind::Incumbent,
            participant_id,
            lot_id: Some(lot_id),
        }
    }

    pub fn alternate(group: Group, draw_class: DrawClass, participant_id: ParticipantId) -> Self {
        Self {
            group,
            draw_class,
            kind: ResultKind::Alternate,
            participant_id,
            lot_id: None,
        }
    }

    /// Replace the lot reference.
    pub fn with_lot(mut self, lot_id: Option<LotId>) -> Self {
        self.lot_id = lot_id;
        self
    }

    pub const fn bucket(&self) -> Bucket {
        Bucket::new(self.group, self.draw_class, self.kind)
    }
}
