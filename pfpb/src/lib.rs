//! PFP Battle: a chat card battle game engine.
//!
//! Umbrella crate stitching the engine together: card attributes,
//! vitality, and combat from `pfpb-battle`; the stat extraction
//! boundary from `pfpb-extract`; challenge and session tracking from
//! `pfpb-game`.

pub use pfpb_battle as battle;
pub use pfpb_extract as extract;
pub use pfpb_game as game;
