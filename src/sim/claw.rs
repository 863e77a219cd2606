//! Claw drop animation
//!
//! A drop is a fixed timeline measured from the moment it starts:
//! eleven drop frames (offset 0, 3, ... 30) 30 ms apart, the hit check once
//! the last frame has been held, a 150 ms hold at depth (longer if LED
//! feedback is playing), then the same eleven frames in reverse.
//!
//! Every event is due at an absolute time computed from the stage start, so
//! polling late simply catches up and a virtual clock replays it exactly.

use crate::consts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClawStage {
    Dropping,
    /// At full depth, hit already resolved
    Holding,
    Rising,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClawEvent {
    /// Claw moved to a new vertical offset; targets tick once per step
    Step { offset: i32 },
    /// Bottom of the drop: resolve the hit exactly once
    ReachedDepth,
    /// Back at rest
    Finished,
}

/// One in-flight drop
#[derive(Debug, Clone)]
pub struct ClawDrop {
    x: i32,
    stage: ClawStage,
    stage_start: f64,
    steps_shown: u8,
    hold: f64,
    offset: i32,
}

impl ClawDrop {
    /// Begin a drop with the claw frozen at left edge `x`
    pub fn start(x: i32, now: f64) -> Self {
        Self {
            x,
            stage: ClawStage::Dropping,
            stage_start: now,
            steps_shown: 0,
            hold: DROP_DWELL,
            offset: 0,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    /// Claw extent used for the hit test
    pub fn bounds(&self) -> (i32, i32) {
        (self.x, self.x + CLAW_WIDTH)
    }

    pub fn offset(&self) -> i32 {
        self.offset
    }

    pub fn stage(&self) -> ClawStage {
        self.stage
    }

    pub fn is_done(&self) -> bool {
        self.stage == ClawStage::Done
    }

    /// Lengthen the hold at depth (feedback sequences play here)
    pub fn extend_hold(&mut self, extra: f64) {
        if self.stage == ClawStage::Holding {
            self.hold += extra;
        }
    }

    /// When the next event is due, if any
    pub fn next_deadline(&self) -> Option<f64> {
        match self.stage {
            ClawStage::Dropping | ClawStage::Rising => {
                Some(self.stage_start + f64::from(self.steps_shown) * DROP_STEP_DELAY)
            }
            ClawStage::Holding => Some(self.stage_start + self.hold),
            ClawStage::Done => None,
        }
    }

    /// Next event that has come due by `now`. Call until it returns `None`.
    pub fn poll(&mut self, now: f64) -> Option<ClawEvent> {
        loop {
            let due = self.next_deadline()?;
            if now < due {
                return None;
            }
            match self.stage {
                ClawStage::Dropping if self.steps_shown <= DROP_STEPS => {
                    self.offset = i32::from(self.steps_shown) * DROP_STEP_PIXELS;
                    self.steps_shown += 1;
                    return Some(ClawEvent::Step {
                        offset: self.offset,
                    });
                }
                ClawStage::Dropping => {
                    self.enter(ClawStage::Holding, due);
                    return Some(ClawEvent::ReachedDepth);
                }
                ClawStage::Holding => {
                    // No event of its own; fall through to the first rise frame
                    self.enter(ClawStage::Rising, due);
                }
                ClawStage::Rising if self.steps_shown <= DROP_STEPS => {
                    self.offset = i32::from(DROP_STEPS - self.steps_shown) * DROP_STEP_PIXELS;
                    self.steps_shown += 1;
                    return Some(ClawEvent::Step {
                        offset: self.offset,
                    });
                }
                ClawStage::Rising => {
                    self.enter(ClawStage::Done, due);
                    return Some(ClawEvent::Finished);
                }
                ClawStage::Done => return None,
            }
        }
    }

    fn enter(&mut self, stage: ClawStage, at: f64) {
        self.stage = stage;
        self.stage_start = at;
        self.steps_shown = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive a drop to completion by jumping straight to each deadline
    fn run(drop: &mut ClawDrop) -> Vec<(f64, ClawEvent)> {
        let mut events = Vec::new();
        while let Some(due) = drop.next_deadline() {
            while let Some(e) = drop.poll(due) {
                events.push((due, e));
            }
        }
        events
    }

    #[test]
    fn test_full_timeline() {
        let mut drop = ClawDrop::start(20, 10.0);
        let events = run(&mut drop);

        let steps: Vec<i32> = events
            .iter()
            .filter_map(|(_, e)| match e {
                ClawEvent::Step { offset } => Some(*offset),
                _ => None,
            })
            .collect();
        let down: Vec<i32> = (0..=10).map(|s| s * 3).collect();
        let up: Vec<i32> = down.iter().rev().copied().collect();
        assert_eq!(steps, [down, up].concat());

        let depth = events
            .iter()
            .position(|(_, e)| *e == ClawEvent::ReachedDepth)
            .unwrap();
        assert_eq!(depth, 11);
        assert!((events[depth].0 - 10.33).abs() < 1e-9);

        // First rise frame after the 150 ms hold
        assert!((events[depth + 1].0 - 10.48).abs() < 1e-9);

        let (end, last) = events.last().unwrap();
        assert_eq!(*last, ClawEvent::Finished);
        assert!((end - 10.81).abs() < 1e-9);
        assert!(drop.is_done());
        assert_eq!(drop.offset(), 0);
    }

    #[test]
    fn test_late_poll_catches_up() {
        let mut drop = ClawDrop::start(0, 0.0);
        let mut n = 0;
        while let Some(e) = drop.poll(0.2) {
            assert!(matches!(e, ClawEvent::Step { .. }));
            n += 1;
        }
        // Steps at 0, 30, ... 180 ms
        assert_eq!(n, 7);
        assert_eq!(drop.offset(), 18);
        assert_eq!(drop.stage(), ClawStage::Dropping);
    }

    #[test]
    fn test_depth_reported_once() {
        let mut drop = ClawDrop::start(0, 0.0);
        let mut depth = 0;
        while let Some(e) = drop.poll(0.4) {
            if e == ClawEvent::ReachedDepth {
                depth += 1;
            }
        }
        assert_eq!(depth, 1);
        assert_eq!(drop.stage(), ClawStage::Holding);
        assert_eq!(drop.offset(), 30);
    }

    #[test]
    fn test_extended_hold() {
        let mut drop = ClawDrop::start(0, 0.0);
        while drop.poll(0.35).is_some() {}
        assert_eq!(drop.stage(), ClawStage::Holding);
        drop.extend_hold(0.28);
        assert!((drop.next_deadline().unwrap() - 0.76).abs() < 1e-9);
        assert_eq!(drop.poll(0.5), None);
    }
}
