//! Lotdraw Types - Core types for the land-lot lottery
//!
//! A lottery allocates land parcels ("lots") to registered participants over
//! a sequence of draws. Draws are partitioned into numbered groups and two
//! draw classes, and each (group, draw class) pool produces a fixed number
//! of primary winners (incumbents) and backup winners (alternates).
//!
//! ## Key Concepts
//!
//! - **Group**: administrative partition with its own independent quota
//! - **DrawClass**: the priority pool (pre-registered subset) or the general pool
//! - **ResultKind**: incumbent (wins a lot) or alternate (ordered backup)
//! - **Bucket**: one (group, draw class, result kind) quota bucket
//! - **DrawResult**: a committed winner, immutable once stored

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod draw;
pub mod error;
pub mod ids;
pub mod lot;
pub mod participant;
pub mod result;

pub use draw::{Bucket, DrawClass, Group, ResultKind};
pub use error::TypeError;
pub use ids::{LotId, ParticipantId, ResultId};
pub use lot::Lot;
pub use participant::Participant;
pub use result::{Award, DrawResult, NewResult, ResultCandidate};
