//! Driving tapes with inputs and checking what they compute.
//!
//! - `feed`: where the bits for each NOPF input request come from
//! - `sweep`: exhaustive multiply/divide verification over operand pairs

pub mod feed;
pub mod sweep;

pub use feed::{InputFeed, InputPhase, InteractiveFeed, ScriptedFeed, SweepFeed};
pub use sweep::{MAX_OPERAND_BITS, Operation, Outcome, Sweep, SweepConfig, SweepReport};
