//! Round bookkeeping
//!
//! Plain data for one single-player round or one versus round. The session
//! owns these alongside the target population; nothing here touches effects.

use serde::{Deserialize, Serialize};

use super::levels::{LEVELS, is_final};
use crate::consts::*;

/// Menu entries, in menu order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Easy,
    Medium,
    Hard,
    Multiplayer,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Easy, Mode::Medium, Mode::Hard, Mode::Multiplayer];

    pub fn name(self) -> &'static str {
        match self {
            Mode::Easy => "EASY",
            Mode::Medium => "MEDIUM",
            Mode::Hard => "HARD",
            Mode::Multiplayer => "MULTIPLAYER",
        }
    }

    /// Misses cost a life
    pub fn has_lives(self) -> bool {
        matches!(self, Mode::Medium | Mode::Hard)
    }
}

/// Single-player round phase. Terminal phases are only entered from `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Playing,
    GameOver,
    Win,
}

/// What a landed hit did to the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// Hits still owed on this level
    Continue,
    /// Moved on to the next level
    LevelUp,
    /// Final level cleared
    Win,
}

/// What a miss did to the round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissOutcome {
    Continue,
    /// Lives ran out
    GameOver,
}

/// Single-player round
#[derive(Debug, Clone)]
pub struct RoundState {
    pub mode: Mode,
    pub level_index: usize,
    /// Seconds for the current level
    pub time_limit: f64,
    pub target_hits: u32,
    pub hits_remaining: u32,
    /// Only meaningful for modes with lives
    pub lives: u8,
    pub round_start_time: f64,
    pub phase: Phase,
}

impl RoundState {
    /// Start on the first level
    pub fn new(mode: Mode, now: f64) -> Self {
        let mut round = Self {
            mode,
            level_index: 0,
            time_limit: 0.0,
            target_hits: 0,
            hits_remaining: 0,
            lives: MAX_LIVES,
            round_start_time: now,
            phase: Phase::Playing,
        };
        round.start_level(0, now);
        round
    }

    /// Reset timer, hits and lives from the level table
    pub fn start_level(&mut self, level_index: usize, now: f64) {
        let level = LEVELS[level_index];
        self.level_index = level_index;
        self.time_limit = level.time_limit;
        self.target_hits = level.target_hits;
        self.hits_remaining = level.target_hits;
        self.round_start_time = now;
        self.phase = Phase::Playing;
        if self.mode.has_lives() {
            self.lives = MAX_LIVES;
        }
    }

    /// Seconds left on the level clock, never negative
    pub fn remaining(&self, now: f64) -> f64 {
        (self.time_limit - (now - self.round_start_time)).max(0.0)
    }

    /// Fail the round if the clock ran out with hits still owed.
    /// Returns true on the transition.
    pub fn check_timeout(&mut self, now: f64) -> bool {
        if self.phase == Phase::Playing && self.remaining(now) <= 0.0 && self.hits_remaining > 0 {
            self.phase = Phase::GameOver;
            return true;
        }
        false
    }

    pub fn record_hit(&mut self, now: f64) -> HitOutcome {
        self.hits_remaining = self.hits_remaining.saturating_sub(1);
        if self.hits_remaining > 0 {
            return HitOutcome::Continue;
        }
        if is_final(self.level_index) {
            self.phase = Phase::Win;
            HitOutcome::Win
        } else {
            self.start_level(self.level_index + 1, now);
            HitOutcome::LevelUp
        }
    }

    pub fn record_miss(&mut self) -> MissOutcome {
        if !self.mode.has_lives() {
            return MissOutcome::Continue;
        }
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            self.phase = Phase::GameOver;
            MissOutcome::GameOver
        } else {
            MissOutcome::Continue
        }
    }
}

/// Result of a finished versus round, from the shooter's side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Win,
    Lose,
    Tie,
}

/// Shooter-side versus round
#[derive(Debug, Clone)]
pub struct VersusState {
    pub shooter_score: u32,
    pub dodger_score: u32,
    pub round_start: f64,
    pub round_duration: f64,
    /// `None` while the round is still running
    pub outcome: Option<Outcome>,
}

impl VersusState {
    pub fn new(now: f64) -> Self {
        Self {
            shooter_score: 0,
            dodger_score: 0,
            round_start: now,
            round_duration: MP_ROUND_TIME,
            outcome: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.outcome.is_none()
    }

    pub fn remaining(&self, now: f64) -> f64 {
        (self.round_duration - (now - self.round_start)).max(0.0)
    }

    /// Shooter lead, drives the LED bands
    pub fn diff(&self) -> i64 {
        i64::from(self.shooter_score) - i64::from(self.dodger_score)
    }

    pub fn record_hit(&mut self) {
        self.shooter_score += MP_HIT_POINTS;
    }

    pub fn record_miss(&mut self) {
        self.dodger_score += MP_MISS_POINTS;
    }

    /// Close the round once the clock runs out
    pub fn check_timeout(&mut self, now: f64) -> Option<Outcome> {
        if !self.is_playing() || self.remaining(now) > 0.0 {
            return None;
        }
        let outcome = match self.shooter_score.cmp(&self.dodger_score) {
            std::cmp::Ordering::Greater => Outcome::Win,
            std::cmp::Ordering::Less => Outcome::Lose,
            std::cmp::Ordering::Equal => Outcome::Tie,
        };
        self.outcome = Some(outcome);
        Some(outcome)
    }
}

/// Logged once when a round reaches a terminal outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoundSummary {
    Solo {
        mode: Mode,
        /// 1-based level the round ended on
        level: usize,
        phase: Phase,
        lives: u8,
        hits_remaining: u32,
    },
    Versus {
        outcome: Outcome,
        shooter_score: u32,
        dodger_score: u32,
    },
}

impl RoundSummary {
    pub fn solo(round: &RoundState) -> Self {
        RoundSummary::Solo {
            mode: round.mode,
            level: round.level_index + 1,
            phase: round.phase,
            lives: round.lives,
            hits_remaining: round.hits_remaining,
        }
    }

    pub fn versus(state: &VersusState, outcome: Outcome) -> Self {
        RoundSummary::Versus {
            outcome,
            shooter_score: state.shooter_score,
            dodger_score: state.dodger_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_hits_advance_level() {
        let mut round = RoundState::new(Mode::Easy, 0.0);
        assert_eq!((round.time_limit, round.hits_remaining), (30.0, 3));
        assert_eq!(round.record_hit(1.0), HitOutcome::Continue);
        assert_eq!(round.record_hit(2.0), HitOutcome::Continue);
        assert_eq!(round.record_hit(3.0), HitOutcome::LevelUp);
        assert_eq!(round.level_index, 1);
        assert_eq!((round.time_limit, round.hits_remaining), (30.0, 4));
        assert_eq!(round.round_start_time, 3.0);
        assert_eq!(round.phase, Phase::Playing);
    }

    #[test]
    fn test_final_level_wins() {
        let mut round = RoundState::new(Mode::Hard, 0.0);
        round.start_level(9, 0.0);
        for _ in 0..7 {
            assert_eq!(round.record_hit(1.0), HitOutcome::Continue);
        }
        assert_eq!(round.record_hit(1.0), HitOutcome::Win);
        assert_eq!(round.phase, Phase::Win);
        assert_eq!(round.level_index, 9);
    }

    #[test]
    fn test_three_misses_end_medium() {
        let mut round = RoundState::new(Mode::Medium, 0.0);
        assert_eq!(round.record_miss(), MissOutcome::Continue);
        assert_eq!(round.record_miss(), MissOutcome::Continue);
        assert_eq!(round.record_miss(), MissOutcome::GameOver);
        assert_eq!(round.lives, 0);
        assert_eq!(round.phase, Phase::GameOver);
    }

    #[test]
    fn test_easy_misses_are_free() {
        let mut round = RoundState::new(Mode::Easy, 0.0);
        for _ in 0..5 {
            assert_eq!(round.record_miss(), MissOutcome::Continue);
        }
        assert_eq!(round.phase, Phase::Playing);
    }

    #[test]
    fn test_level_up_restores_lives() {
        let mut round = RoundState::new(Mode::Medium, 0.0);
        round.record_miss();
        round.record_miss();
        for _ in 0..3 {
            round.record_hit(5.0);
        }
        assert_eq!(round.lives, MAX_LIVES);
    }

    #[test]
    fn test_timeout() {
        let mut round = RoundState::new(Mode::Easy, 0.0);
        assert!(!round.check_timeout(29.9));
        assert_eq!(round.remaining(31.0), 0.0);
        assert!(round.check_timeout(31.0));
        assert_eq!(round.phase, Phase::GameOver);
        // Only fires once
        assert!(!round.check_timeout(32.0));
    }

    #[test]
    fn test_versus_outcomes() {
        let mut state = VersusState::new(0.0);
        state.record_hit();
        state.record_miss();
        assert_eq!(state.diff(), 2);
        assert_eq!(state.check_timeout(60.0), None);
        assert_eq!(state.check_timeout(120.0), Some(Outcome::Win));
        assert!(!state.is_playing());
        assert_eq!(state.check_timeout(121.0), None);

        let mut tie = VersusState::new(0.0);
        assert_eq!(tie.check_timeout(130.0), Some(Outcome::Tie));

        let mut lose = VersusState::new(0.0);
        lose.record_miss();
        assert_eq!(lose.check_timeout(130.0), Some(Outcome::Lose));
    }

    #[test]
    fn test_summary_json() {
        let round = RoundState::new(Mode::Medium, 0.0);
        let json = serde_json::to_string(&RoundSummary::solo(&round)).unwrap();
        assert!(json.contains("\"kind\":\"solo\""));
        assert!(json.contains("\"mode\":\"Medium\""));
        assert!(json.contains("\"level\":1"));
    }
}
