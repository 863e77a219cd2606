//! Status LED strip (three NeoPixel cells)
//!
//! Life bar for single-player, score comparison bands for versus play,
//! and the short timed feedback sequences that temporarily override them.

use crate::consts::NUM_LEDS;
use crate::platform::Effects;

/// 8-bit RGB colour for one LED cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const OFF: Rgb = Rgb(0, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const RED: Rgb = Rgb(255, 0, 0);
}

/// Hit gradient: green -> cyan -> blue -> purple
const GRADIENT: [Rgb; 7] = [
    Rgb(0, 255, 0),
    Rgb(0, 255, 128),
    Rgb(0, 255, 255),
    Rgb(0, 128, 255),
    Rgb(0, 0, 255),
    Rgb(128, 0, 255),
    Rgb(255, 0, 255),
];
const GRADIENT_FRAME: f64 = 0.04;
const BLINK_COUNT: usize = 3;
const BLINK_FRAME: f64 = 0.08;

/// Set every cell to one colour
pub fn fill(fx: &mut dyn Effects, color: Rgb) {
    for i in 0..NUM_LEDS {
        fx.set_led(i, color);
    }
}

pub fn clear(fx: &mut dyn Effects) {
    fill(fx, Rgb::OFF);
}

/// Green for each remaining life, red for each lost one
pub fn show_lives(fx: &mut dyn Effects, lives: u8) {
    for i in 0..NUM_LEDS {
        let color = if i < lives as usize { Rgb::GREEN } else { Rgb::RED };
        fx.set_led(i, color);
    }
}

/// Score comparison bands for `shooter - dodger`. A step function, not a gradient.
pub fn score_band(diff: i64) -> [Rgb; NUM_LEDS] {
    use Rgb as C;
    match diff {
        d if d >= 6 => [C::GREEN, C::GREEN, C::GREEN],
        d if d >= 3 => [C::GREEN, C::GREEN, C::OFF],
        d if d > 0 => [C::GREEN, C::OFF, C::OFF],
        0 => [C::YELLOW, C::OFF, C::OFF],
        d if d >= -3 => [C::RED, C::OFF, C::OFF],
        d if d >= -6 => [C::RED, C::RED, C::OFF],
        _ => [C::RED, C::RED, C::RED],
    }
}

pub fn show_score_band(fx: &mut dyn Effects, diff: i64) {
    for (i, color) in score_band(diff).into_iter().enumerate() {
        fx.set_led(i, color);
    }
}

/// A timed sequence of whole-strip colours
#[derive(Debug, Clone)]
pub struct LedSequence {
    /// (colour, how long it is held)
    frames: Vec<(Rgb, f64)>,
    started_at: f64,
    shown: usize,
}

impl LedSequence {
    pub fn new(frames: Vec<(Rgb, f64)>, started_at: f64) -> Self {
        Self {
            frames,
            started_at,
            shown: 0,
        }
    }

    /// Versus hit feedback
    pub fn gradient(started_at: f64) -> Self {
        let frames = GRADIENT.iter().map(|&c| (c, GRADIENT_FRAME)).collect();
        Self::new(frames, started_at)
    }

    /// Versus miss feedback
    pub fn red_blink(started_at: f64) -> Self {
        let frames = (0..BLINK_COUNT)
            .flat_map(|_| [(Rgb::RED, BLINK_FRAME), (Rgb::OFF, BLINK_FRAME)])
            .collect();
        Self::new(frames, started_at)
    }

    /// Total time the sequence holds the strip
    pub fn duration(&self) -> f64 {
        self.frames.iter().map(|(_, d)| d).sum()
    }

    pub fn ends_at(&self) -> f64 {
        self.started_at + self.duration()
    }

    /// When the next colour change (or the end) is due
    pub fn next_due(&self) -> f64 {
        if self.shown < self.frames.len() {
            self.frame_due(self.shown)
        } else {
            self.ends_at()
        }
    }

    fn frame_due(&self, index: usize) -> f64 {
        self.started_at + self.frames[..index].iter().map(|(_, d)| d).sum::<f64>()
    }

    /// Show every frame that has come due. Returns true once the last frame
    /// has been held for its full time.
    pub fn advance(&mut self, now: f64, fx: &mut dyn Effects) -> bool {
        while self.shown < self.frames.len() {
            if now < self.frame_due(self.shown) {
                break;
            }
            fill(fx, self.frames[self.shown].0);
            self.shown += 1;
        }
        self.shown == self.frames.len() && now >= self.ends_at()
    }
}
