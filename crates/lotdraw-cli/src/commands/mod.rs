//! CLI command implementations

pub mod next;
pub mod schedule;
pub mod simulate;
