//! Per-mode target populations
//!
//! Each difficulty owns its targets outright; the session only sees counts,
//! positions for drawing, and the id of whatever the claw caught.
//! - EASY: one static target, respawned elsewhere when hit
//! - MEDIUM: up to three pop-up targets that expire on their own
//! - HARD: 1-3 targets bouncing between the screen edges
//! - MULTIPLAYER: the remote dodger, positioned by the peer link

use rand::Rng;
use rand_pcg::Pcg32;

use super::levels::{hard_speed, hard_target_count};
use super::state::Mode;
use crate::consts::*;

pub type TargetId = u32;

/// The remote dodger is always the same target
pub const DODGER_ID: TargetId = 0;

/// Rightmost left edge a target can have
pub const TARGET_MAX_X: i32 = SCREEN_WIDTH - BALL_WIDTH;

/// Behaviour shared by every mode's population
pub trait TargetSet {
    /// Add a target if the mode's policy allows one this frame
    fn spawn_if_capacity(&mut self, now: f64, rng: &mut Pcg32);
    /// Advance motion and expire stale targets
    fn tick(&mut self, now: f64);
    /// Resolve a claw closing over `[claw_left, claw_right]` (inclusive).
    /// The caught target is removed or replaced per the mode's policy.
    fn hit_test(&mut self, claw_left: i32, claw_right: i32, rng: &mut Pcg32) -> Option<TargetId>;
    /// Left edges for drawing
    fn positions(&self) -> Vec<i32>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One frame of simulation: tick, then maybe spawn
    fn update(&mut self, now: f64, rng: &mut Pcg32) {
        self.tick(now);
        self.spawn_if_capacity(now, rng);
    }
}

#[derive(Debug, Clone, Default)]
struct Ids {
    next: TargetId,
}

impl Ids {
    fn next(&mut self) -> TargetId {
        self.next += 1;
        self.next
    }
}

#[inline]
fn within(center: f32, claw_left: i32, claw_right: i32) -> bool {
    center >= claw_left as f32 && center <= claw_right as f32
}

// ============================================================================
// EASY
// ============================================================================

#[derive(Debug, Clone)]
pub struct StaticTarget {
    pub id: TargetId,
    pub x: i32,
}

/// A single target that never moves
#[derive(Debug, Clone)]
pub struct EasyTargets {
    target: StaticTarget,
    ids: Ids,
}

impl EasyTargets {
    pub fn new(rng: &mut Pcg32) -> Self {
        let mut ids = Ids::default();
        let target = Self::place(&mut ids, rng);
        Self { target, ids }
    }

    /// Fixed placement for tests and replays
    pub fn at(x: i32) -> Self {
        let mut ids = Ids::default();
        let target = StaticTarget { id: ids.next(), x };
        Self { target, ids }
    }

    fn place(ids: &mut Ids, rng: &mut Pcg32) -> StaticTarget {
        StaticTarget {
            id: ids.next(),
            x: rng.random_range(BALL_WIDTH..=SCREEN_WIDTH - BALL_WIDTH),
        }
    }

    pub fn target(&self) -> &StaticTarget {
        &self.target
    }
}

impl TargetSet for EasyTargets {
    fn spawn_if_capacity(&mut self, _now: f64, _rng: &mut Pcg32) {}

    fn tick(&mut self, _now: f64) {}

    fn hit_test(&mut self, claw_left: i32, claw_right: i32, rng: &mut Pcg32) -> Option<TargetId> {
        // Sprite glyph is narrower than the cell, so its center sits a quarter in
        let center = self.target.x + BALL_WIDTH / 4;
        if !within(center as f32, claw_left, claw_right) {
            return None;
        }
        let caught = self.target.id;
        self.target = Self::place(&mut self.ids, rng);
        Some(caught)
    }

    fn positions(&self) -> Vec<i32> {
        vec![self.target.x]
    }

    fn len(&self) -> usize {
        1
    }
}

// ============================================================================
// MEDIUM
// ============================================================================

#[derive(Debug, Clone)]
pub struct PopUpTarget {
    pub id: TargetId,
    pub x: i32,
    /// Absolute time after which the target disappears
    pub expires_at: f64,
}

/// Short-lived targets that pop up at random
#[derive(Debug, Clone, Default)]
pub struct MediumTargets {
    targets: Vec<PopUpTarget>,
    ids: Ids,
}

impl MediumTargets {
    /// Start a level with 1..=capacity targets already up
    pub fn new(now: f64, rng: &mut Pcg32) -> Self {
        let mut set = Self::default();
        let initial = rng.random_range(1..=MEDIUM_MAX_BALLS);
        for _ in 0..initial {
            set.spawn(now, rng);
        }
        set
    }

    pub fn targets(&self) -> &[PopUpTarget] {
        &self.targets
    }

    /// Insert a target directly (tests and replays); ignores capacity
    pub fn push(&mut self, x: i32, expires_at: f64) -> TargetId {
        let id = self.ids.next();
        self.targets.push(PopUpTarget { id, x, expires_at });
        id
    }

    fn spawn(&mut self, now: f64, rng: &mut Pcg32) {
        if self.targets.len() >= MEDIUM_MAX_BALLS {
            return;
        }
        let x = rng.random_range(0..=TARGET_MAX_X);
        let life = rng.random_range(MEDIUM_BALL_MIN_LIFE..=MEDIUM_BALL_MAX_LIFE);
        self.push(x, now + life);
    }
}

impl TargetSet for MediumTargets {
    fn spawn_if_capacity(&mut self, now: f64, rng: &mut Pcg32) {
        if self.targets.len() < MEDIUM_MAX_BALLS && rng.random::<f64>() < MEDIUM_SPAWN_CHANCE {
            self.spawn(now, rng);
        }
    }

    fn tick(&mut self, now: f64) {
        self.targets.retain(|t| now <= t.expires_at);
    }

    fn hit_test(&mut self, claw_left: i32, claw_right: i32, _rng: &mut Pcg32) -> Option<TargetId> {
        let i = self
            .targets
            .iter()
            .position(|t| within((t.x + BALL_WIDTH / 2) as f32, claw_left, claw_right))?;
        Some(self.targets.remove(i).id)
    }

    fn positions(&self) -> Vec<i32> {
        self.targets.iter().map(|t| t.x).collect()
    }

    fn len(&self) -> usize {
        self.targets.len()
    }
}

// ============================================================================
// HARD
// ============================================================================

#[derive(Debug, Clone)]
pub struct BouncingTarget {
    pub id: TargetId,
    pub x: f32,
    /// Signed pixels per tick
    pub vx: f32,
}

impl BouncingTarget {
    /// Move one tick, reflecting off either edge. Returns true on a bounce.
    pub fn advance(&mut self) -> bool {
        let max_x = TARGET_MAX_X as f32;
        let x = self.x + self.vx;
        let (x, bounced) = if x < 0.0 {
            self.vx = self.vx.abs();
            (0.0, true)
        } else if x > max_x {
            self.vx = -self.vx.abs();
            (max_x, true)
        } else {
            (x, false)
        };
        self.x = x;
        bounced
    }
}

/// Constant-size population moving at the level's speed
#[derive(Debug, Clone)]
pub struct HardTargets {
    targets: Vec<BouncingTarget>,
    speed: f32,
    capacity: usize,
    ids: Ids,
}

impl HardTargets {
    pub fn new(level_index: usize, rng: &mut Pcg32) -> Self {
        let mut set = Self::empty(level_index);
        for _ in 0..set.capacity {
            set.spawn(rng);
        }
        set
    }

    /// Level parameters with no targets yet
    pub fn empty(level_index: usize) -> Self {
        Self {
            targets: Vec::new(),
            speed: hard_speed(level_index),
            capacity: hard_target_count(level_index),
            ids: Ids::default(),
        }
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn targets(&self) -> &[BouncingTarget] {
        &self.targets
    }

    /// Insert a target directly (tests and replays)
    pub fn push(&mut self, x: f32, vx: f32) -> TargetId {
        let id = self.ids.next();
        self.targets.push(BouncingTarget { id, x, vx });
        id
    }

    fn spawn(&mut self, rng: &mut Pcg32) {
        let x = rng.random_range(0..=TARGET_MAX_X) as f32;
        let direction = if rng.random::<f64>() < 0.5 { 1.0 } else { -1.0 };
        self.push(x, self.speed * direction);
    }
}

impl TargetSet for HardTargets {
    fn spawn_if_capacity(&mut self, _now: f64, rng: &mut Pcg32) {
        while self.targets.len() < self.capacity {
            self.spawn(rng);
        }
    }

    fn tick(&mut self, _now: f64) {
        for t in &mut self.targets {
            t.advance();
        }
    }

    fn hit_test(&mut self, claw_left: i32, claw_right: i32, rng: &mut Pcg32) -> Option<TargetId> {
        let half = BALL_WIDTH as f32 / 2.0;
        let i = self
            .targets
            .iter()
            .position(|t| within(t.x + half, claw_left, claw_right))?;
        let caught = self.targets.remove(i).id;
        self.spawn(rng);
        Some(caught)
    }

    fn positions(&self) -> Vec<i32> {
        self.targets.iter().map(|t| t.x as i32).collect()
    }

    fn len(&self) -> usize {
        self.targets.len()
    }
}

// ============================================================================
// MULTIPLAYER
// ============================================================================

/// The other device's player, as last reported over the link
#[derive(Debug, Clone)]
pub struct RemoteDodger {
    pub x: i32,
}

impl Default for RemoteDodger {
    fn default() -> Self {
        Self {
            x: SCREEN_WIDTH / 2,
        }
    }
}

impl TargetSet for RemoteDodger {
    fn spawn_if_capacity(&mut self, _now: f64, _rng: &mut Pcg32) {}

    fn tick(&mut self, _now: f64) {}

    fn hit_test(&mut self, claw_left: i32, claw_right: i32, _rng: &mut Pcg32) -> Option<TargetId> {
        let center = self.x + PLAYER_WIDTH / 2;
        within(center as f32, claw_left, claw_right).then_some(DODGER_ID)
    }

    fn positions(&self) -> Vec<i32> {
        vec![self.x]
    }

    fn len(&self) -> usize {
        1
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// The active mode's population
#[derive(Debug, Clone)]
pub enum Targets {
    Easy(EasyTargets),
    Medium(MediumTargets),
    Hard(HardTargets),
    Versus(RemoteDodger),
}

impl Targets {
    /// Fresh population for the start of a level
    pub fn for_level(mode: Mode, level_index: usize, now: f64, rng: &mut Pcg32) -> Self {
        match mode {
            Mode::Easy => Targets::Easy(EasyTargets::new(rng)),
            Mode::Medium => Targets::Medium(MediumTargets::new(now, rng)),
            Mode::Hard => Targets::Hard(HardTargets::new(level_index, rng)),
            Mode::Multiplayer => Targets::Versus(RemoteDodger::default()),
        }
    }

    fn as_set(&self) -> &dyn TargetSet {
        match self {
            Targets::Easy(t) => t,
            Targets::Medium(t) => t,
            Targets::Hard(t) => t,
            Targets::Versus(t) => t,
        }
    }

    fn as_set_mut(&mut self) -> &mut dyn TargetSet {
        match self {
            Targets::Easy(t) => t,
            Targets::Medium(t) => t,
            Targets::Hard(t) => t,
            Targets::Versus(t) => t,
        }
    }

    /// Update the remote dodger's position; other modes ignore it
    pub fn set_remote_x(&mut self, x: i32) {
        if let Targets::Versus(dodger) = self {
            dodger.x = x;
        }
    }
}

impl TargetSet for Targets {
    fn spawn_if_capacity(&mut self, now: f64, rng: &mut Pcg32) {
        self.as_set_mut().spawn_if_capacity(now, rng);
    }

    fn tick(&mut self, now: f64) {
        self.as_set_mut().tick(now);
    }

    fn hit_test(&mut self, claw_left: i32, claw_right: i32, rng: &mut Pcg32) -> Option<TargetId> {
        self.as_set_mut().hit_test(claw_left, claw_right, rng)
    }

    fn positions(&self) -> Vec<i32> {
        self.as_set().positions()
    }

    fn len(&self) -> usize {
        self.as_set().len()
    }
}
