//! Pinpoint Fusion
//!
//! Decides, per incoming raw fix, whether a session forwards it to the
//! consumer or suppresses it. Effectively a two-input debounced selector:
//! satellite fixes are always trusted immediately, network fixes pass only
//! while no satellite fix exists or once the satellite cadence has lapsed.

mod engine;
mod state;

pub use engine::{Decision, FusionEngine};
pub use state::FusionState;
