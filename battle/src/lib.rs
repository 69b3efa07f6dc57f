//! Card attributes, vitality, and battle resolution for PFP Battle.
//!
//! Everything here is pure: the combat loop draws all of its randomness
//! from an injected generator, so the same seed always replays the same
//! battle.

mod attributes;
mod combat;
mod vitality;

pub use attributes::*;
pub use combat::*;
pub use vitality::*;
