//! Level table and per-level difficulty scaling

use crate::consts::{HARD_BASE_SPEED, HARD_SPEED_STEP};

/// One entry of the level table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level {
    /// Seconds allowed to clear the level
    pub time_limit: f64,
    /// Hits needed to clear it
    pub target_hits: u32,
}

const fn level(time_limit: f64, target_hits: u32) -> Level {
    Level {
        time_limit,
        target_hits,
    }
}

/// Shared by every single-player mode, played strictly in order
pub const LEVELS: [Level; 10] = [
    level(30.0, 3),
    level(30.0, 4),
    level(30.0, 5),
    level(25.0, 5),
    level(25.0, 6),
    level(20.0, 6),
    level(20.0, 7),
    level(15.0, 7),
    level(15.0, 8),
    level(12.0, 8),
];

pub fn is_final(level_index: usize) -> bool {
    level_index + 1 >= LEVELS.len()
}

/// HARD target speed in pixels per tick
pub fn hard_speed(level_index: usize) -> f32 {
    HARD_BASE_SPEED + HARD_SPEED_STEP * level_index as f32
}

/// HARD population: one target through level 7, two for 8-9, three after
pub fn hard_target_count(level_index: usize) -> usize {
    match level_index + 1 {
        0..=7 => 1,
        8..=9 => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_shape() {
        assert_eq!(LEVELS.len(), 10);
        assert_eq!(LEVELS[0], level(30.0, 3));
        assert_eq!(LEVELS[9], level(12.0, 8));
        assert!(is_final(9));
        assert!(!is_final(8));
    }

    #[test]
    fn test_hard_scaling() {
        assert_eq!(hard_target_count(0), 1);
        assert_eq!(hard_target_count(6), 1);
        assert_eq!(hard_target_count(7), 2);
        assert_eq!(hard_target_count(8), 2);
        assert_eq!(hard_target_count(9), 3);
        assert!((hard_speed(0) - 0.7).abs() < 1e-6);
        assert!((hard_speed(4) - 1.7).abs() < 1e-6);
    }
}
