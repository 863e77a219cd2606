//! Tilt sensor filtering
//!
//! Raw accelerometer X is noisy and biased. A one-time calibration removes the
//! resting bias, an exponential moving average removes jitter, and the result
//! is clamped and rescaled onto the claw's pixel track.

use crate::consts::*;
use crate::error::Result;
use crate::map_range;
use crate::platform::{Accelerometer, Clock};

/// Average `sample_count` readings spaced `ACCEL_CALIB_INTERVAL` apart.
///
/// Blocks for the whole sampling window. Failed reads are skipped; if every
/// read fails the bias is zero.
pub fn calibrate<S>(board: &mut S, sample_count: usize) -> f32
where
    S: Accelerometer + Clock + ?Sized,
{
    let mut sum = 0.0f32;
    let mut taken = 0usize;
    for _ in 0..sample_count {
        match board.read_x() {
            Ok(x) => {
                sum += x;
                taken += 1;
            }
            Err(e) => log::debug!("Calibration sample dropped: {}", e),
        }
        board.sleep(ACCEL_CALIB_INTERVAL);
    }
    let offset = if taken == 0 { 0.0 } else { sum / taken as f32 };
    log::info!("Calibration done, offset_x = {:.3} ({} samples)", offset, taken);
    offset
}

/// One exponential smoothing step
#[inline]
pub fn smooth(centered: f32, previous: f32, alpha: f32) -> f32 {
    alpha * centered + (1.0 - alpha) * previous
}

/// Clamp into the domain, rescale into the pixel range, truncate.
pub fn to_screen_position(
    filtered: f32,
    domain_min: f32,
    domain_max: f32,
    range_min: i32,
    range_max: i32,
) -> i32 {
    if filtered.is_nan() {
        return range_min;
    }
    let pos = map_range(
        filtered,
        domain_min,
        domain_max,
        range_min as f32,
        range_max as f32,
    ) as i32;
    pos.clamp(range_min, range_max)
}

/// Calibrated, smoothed horizontal tilt
#[derive(Debug, Clone)]
pub struct TiltFilter {
    offset: f32,
    filtered: f32,
}

impl TiltFilter {
    pub fn new(offset: f32) -> Self {
        Self {
            offset,
            filtered: 0.0,
        }
    }

    /// Calibrate against the resting sensor and start from zero tilt
    pub fn calibrated<S>(board: &mut S) -> Self
    where
        S: Accelerometer + Clock + ?Sized,
    {
        Self::new(calibrate(board, ACCEL_CALIB_SAMPLES))
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn filtered(&self) -> f32 {
        self.filtered
    }

    /// Fold one raw reading into the filter
    pub fn update(&mut self, raw: f32) -> f32 {
        let centered = raw - self.offset;
        self.filtered =
            smooth(centered, self.filtered, ACCEL_ALPHA).clamp(-ACCEL_REPORTABLE, ACCEL_REPORTABLE);
        self.filtered
    }

    /// Like `update`, but a failed read keeps the last good value
    pub fn sample(&mut self, reading: Result<f32>) -> f32 {
        match reading {
            Ok(raw) if raw.is_finite() => self.update(raw),
            Ok(raw) => {
                log::debug!("Ignoring non-finite tilt reading {}", raw);
                self.filtered
            }
            Err(e) => {
                log::debug!("Tilt read failed, holding {:.2}: {}", self.filtered, e);
                self.filtered
            }
        }
    }

    /// Left edge of the claw for the current tilt
    pub fn claw_x(&self) -> i32 {
        to_screen_position(self.filtered, ACCEL_MIN, ACCEL_MAX, 0, SCREEN_WIDTH - CLAW_WIDTH)
    }
}
