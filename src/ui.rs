//! HUD text and sprite snapshot
//!
//! The display owns fonts and layout; this module only decides what each of
//! the five text fields says and where the sprites are.

use crate::sim::state::Mode;

/// The five text labels on the panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    /// Top center
    Title,
    /// Top left
    Level,
    /// Under the level label
    Timer,
    /// Top right
    Hits,
    /// Screen center
    Message,
}

impl TextField {
    pub fn index(self) -> usize {
        self as usize
    }
}

pub const MSG_WIN: &str = "YOU WIN!";
pub const MSG_LOSE: &str = "YOU LOSE!";
pub const MSG_TIE: &str = "TIE!";
pub const MSG_GAME_OVER: &str = "GAME OVER";
pub const MSG_LINK_DOWN: &str = "UART N/A";
pub const TITLE_MENU: &str = "MENU";
pub const TITLE_SHOOTER: &str = "SHOOTER";

pub fn menu_text(mode: Mode) -> String {
    format!("< {} >", mode.name())
}

/// 1-based level label
pub fn level_text(level_index: usize) -> String {
    format!("Lv{}", level_index + 1)
}

pub fn timer_text(remaining: f64) -> String {
    format!("{:4.1}", remaining)
}

pub fn versus_timer_text(remaining: f64) -> String {
    format!("{:.0}s", remaining)
}

pub fn own_score_text(score: u32) -> String {
    format!("You:{}", score)
}

pub fn opponent_score_text(score: u32) -> String {
    format!("Opp:{}", score)
}

/// Claw sprite position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClawSprite {
    /// Left edge
    pub x: i32,
    /// Vertical drop below the resting position
    pub drop: i32,
}

/// Everything the display draws besides text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub claw: Option<ClawSprite>,
    /// Left edges of live targets, truncated to pixels
    pub targets: Vec<i32>,
    /// Remote dodger in versus play
    pub player: Option<i32>,
}
