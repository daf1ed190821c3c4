//! Draw partitioning: groups, draw classes, result kinds and quota buckets

use crate::error::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lottery group number (1-based)
///
/// Each group runs its own independent set of draws with its own quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Group(u32);

impl Group {
    /// Create a group, rejecting 0.
    pub fn new(number: u32) -> Result<Self, TypeError> {
        if number == 0 {
            return Err(TypeError::InvalidGroup(number));
        }
        Ok(Self(number))
    }

    pub const fn number(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Group {
    type Error = TypeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Group> for u32 {
    fn from(group: Group) -> Self {
        group.0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Draw class of a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawClass {
    /// Restricted to a pre-registered eligible subset of participants
    Priority,
    /// Open to every participant of the group
    General,
}

impl DrawClass {
    /// Catalogue order; draws of a group run the priority pool first.
    pub const ALL: [DrawClass; 2] = [DrawClass::Priority, DrawClass::General];

    pub const fn as_str(&self) -> &'static str {
        match self {
            DrawClass::Priority => "priority",
            DrawClass::General => "general",
        }
    }
}

impl fmt::Display for DrawClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DrawClass {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "priority" | "cpd" => Ok(DrawClass::Priority),
            "general" => Ok(DrawClass::General),
            _ => Err(TypeError::UnknownDrawClass(s.to_string())),
        }
    }
}

/// Kind of winner a draw produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// Primary winner, awarded exactly one lot
    Incumbent,
    /// Backup winner with a sequential order number and no lot
    Alternate,
}

impl ResultKind {
    /// Within a pool, all incumbents are drawn before any alternate.
    pub const ALL: [ResultKind; 2] = [ResultKind::Incumbent, ResultKind::Alternate];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ResultKind::Incumbent => "incumbent",
            ResultKind::Alternate => "alternate",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResultKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "incumbent" => Ok(ResultKind::Incumbent),
            "alternate" => Ok(ResultKind::Alternate),
            _ => Err(TypeError::UnknownResultKind(s.to_string())),
        }
    }
}

/// One quota bucket: (group, draw class, result kind)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub group: Group,
    pub draw_class: DrawClass,
    pub kind: ResultKind,
}

impl Bucket {
    pub const fn new(group: Group, draw_class: DrawClass, kind: ResultKind) -> Self {
        Self {
            group,
            draw_class,
            kind,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group {}/{}/{}", self.group, self.draw_class, self.kind)
    }
}
