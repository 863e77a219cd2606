//! Frame-driven simulation
//!
//! All gameplay logic lives here. Nothing in this module touches hardware:
//! - Time is passed in, never read
//! - Seeded RNG only
//! - Side effects go through `platform::Effects`

pub mod claw;
pub mod filter;
pub mod levels;
pub mod state;
pub mod targets;
pub mod tick;

pub use claw::{ClawDrop, ClawEvent, ClawStage};
pub use filter::{TiltFilter, calibrate, smooth, to_screen_position};
pub use levels::{LEVELS, Level};
pub use state::{Mode, Outcome, Phase, RoundState, RoundSummary, VersusState};
pub use targets::{TargetId, TargetSet, Targets};
pub use tick::{Session, TickInput};
