//! Registered lottery participants

use crate::draw::{DrawClass, Group};
use crate::ids::ParticipantId;
use serde::{Deserialize, Serialize};

/// A registered participant
///
/// Identity attributes are owned by the registration system; draw logic only
/// reads `id`, `group` and `draw_class`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,

    /// Number of the physical ball assigned at registration
    pub ball_number: u32,

    pub first_name: String,

    pub last_name: String,

    /// National identity document number
    pub national_id: String,

    pub group: Group,

    /// Pool the participant registered for. Priority participants also
    /// remain eligible for general draws of their group.
    pub draw_class: DrawClass,
}

impl Participant {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Whether this participant may enter draws of the given class.
    pub fn eligible_for(&self, draw_class: DrawClass) -> bool {
        match draw_class {
            DrawClass::Priority => self.draw_class == DrawClass::Priority,
            DrawClass::General => true,
        }
    }
}
