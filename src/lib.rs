//! Tilt Claw - a claw drop arcade game for a tilt-controlled handheld
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (sensor filter, targets, claw, session)
//! - `link`: Two-device serial peer link for versus play
//! - `platform`: Hardware seams (clock, sensor, controls, serial, effects)
//! - `driver`: Top-level frame loop tying the board to the session
//! - `audio`, `leds`, `ui`: What the core asks the board to show and play

pub mod audio;
pub mod driver;
pub mod error;
pub mod input;
pub mod leds;
pub mod link;
pub mod platform;
pub mod sim;
pub mod ui;

pub use driver::FrameDriver;
pub use error::{HalError, Result};

/// Game configuration constants
pub mod consts {
    /// Display dimensions (SSD1306 panel)
    pub const SCREEN_WIDTH: i32 = 128;
    pub const SCREEN_HEIGHT: i32 = 64;

    /// Claw sprite
    pub const CLAW_WIDTH: i32 = 40;
    pub const DROP_STEPS: u8 = 10;
    pub const DROP_STEP_PIXELS: i32 = 3;
    /// Delay after each drop/rise step (seconds)
    pub const DROP_STEP_DELAY: f64 = 0.03;
    /// Hold at full depth after the hit is resolved (seconds)
    pub const DROP_DWELL: f64 = 0.15;

    /// Tilt domain mapped onto the claw track (m/s²)
    pub const ACCEL_MIN: f32 = -4.0;
    pub const ACCEL_MAX: f32 = 4.0;
    /// Reportable range of the accelerometer at ±2 g (m/s²)
    pub const ACCEL_REPORTABLE: f32 = 2.0 * 9.806_65;
    pub const ACCEL_CALIB_SAMPLES: usize = 200;
    pub const ACCEL_CALIB_INTERVAL: f64 = 0.01;
    /// Exponential smoothing factor
    pub const ACCEL_ALPHA: f32 = 0.2;

    /// Target sprite width
    pub const BALL_WIDTH: i32 = 18;

    /// MEDIUM pop-up targets
    pub const MEDIUM_MAX_BALLS: usize = 3;
    pub const MEDIUM_BALL_MIN_LIFE: f64 = 1.0;
    pub const MEDIUM_BALL_MAX_LIFE: f64 = 3.0;
    pub const MEDIUM_SPAWN_CHANCE: f64 = 0.08;

    /// HARD bouncing targets (pixels per tick)
    pub const HARD_BASE_SPEED: f32 = 0.7;
    pub const HARD_SPEED_STEP: f32 = 0.25;

    pub const MAX_LIVES: u8 = 3;
    pub const NUM_LEDS: usize = 3;

    /// Versus play
    pub const PLAYER_WIDTH: i32 = 8;
    pub const MP_ROUND_TIME: f64 = 120.0;
    pub const MP_HIT_POINTS: u32 = 3;
    pub const MP_MISS_POINTS: u32 = 1;
    /// Minimum spacing between position broadcasts (seconds)
    pub const AIM_SEND_INTERVAL: f64 = 0.03;
    pub const SERIAL_BAUD: u32 = 115_200;

    /// Frame poll intervals (seconds)
    pub const FRAME_INTERVAL: f64 = 0.015;
    pub const MENU_FRAME_INTERVAL: f64 = 0.02;
}

/// Clamp `x` into `[in_min, in_max]` then rescale linearly into `[out_min, out_max]`
#[inline]
pub fn map_range(x: f32, in_min: f32, in_max: f32, out_min: f32, out_max: f32) -> f32 {
    let x = x.clamp(in_min, in_max);
    out_min + (out_max - out_min) * (x - in_min) / (in_max - in_min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_range_clamps() {
        assert_eq!(map_range(-10.0, -4.0, 4.0, 0.0, 88.0), 0.0);
        assert_eq!(map_range(10.0, -4.0, 4.0, 0.0, 88.0), 88.0);
        assert_eq!(map_range(0.0, -4.0, 4.0, 0.0, 88.0), 44.0);
    }
}
