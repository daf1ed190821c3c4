//! Land lots awarded to incumbents

use crate::draw::{DrawClass, Group};
use crate::ids::LotId;
use serde::{Deserialize, Serialize};

/// A land parcel offered in one (group, draw class) pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lot {
    pub id: LotId,
    pub group: Group,
    pub draw_class: DrawClass,

    /// Public designation of the parcel, unique across the lottery
    pub denomination: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Lot {
    /// Whether the lot is offered in the given pool.
    pub fn belongs_to(&self, group: Group, draw_class: DrawClass) -> bool {
        self.group == group && self.draw_class == draw_class
    }
}
