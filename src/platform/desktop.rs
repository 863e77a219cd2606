//! Desktop stand-ins for the board
//!
//! Used by the desktop binary and by tests: real and virtual clocks, an
//! in-memory serial cable, an effects sink that records what the core asked
//! for, and an autopilot board that tilts and presses on its own.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::{Accelerometer, Clock, Controls, Effects, SerialPort};
use crate::consts::NUM_LEDS;
use crate::error::{HalError, Result};
use crate::leds::Rgb;
use crate::ui::{Scene, TextField};

// ============================================================================
// Clocks
// ============================================================================

/// Wall clock; `sleep` really blocks
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch: Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    fn sleep(&mut self, secs: f64) {
        if secs > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(secs));
        }
    }
}

/// Manually driven time. Clones share the same timeline.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Rc<Cell<f64>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, t: f64) {
        self.now.set(t);
    }

    pub fn advance(&self, secs: f64) {
        self.now.set(self.now.get() + secs);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }

    fn sleep(&mut self, secs: f64) {
        self.advance(secs.max(0.0));
    }
}

// ============================================================================
// Serial
// ============================================================================

type Buffer = Rc<RefCell<VecDeque<u8>>>;

/// One end of an in-memory null-modem cable
#[derive(Debug, Clone)]
pub struct MemorySerial {
    rx: Buffer,
    tx: Buffer,
    /// Shared by both ends
    fail_writes: Rc<Cell<bool>>,
}

impl MemorySerial {
    /// Two ends wired TX to RX
    pub fn pair() -> (MemorySerial, MemorySerial) {
        let a_to_b = Buffer::default();
        let b_to_a = Buffer::default();
        let fail = Rc::new(Cell::new(false));
        (
            MemorySerial {
                rx: b_to_a.clone(),
                tx: a_to_b.clone(),
                fail_writes: fail.clone(),
            },
            MemorySerial {
                rx: a_to_b,
                tx: b_to_a,
                fail_writes: fail,
            },
        )
    }

    /// Put raw bytes on the wire toward the other end
    pub fn inject(&self, bytes: &[u8]) {
        self.tx.borrow_mut().extend(bytes);
    }

    /// Bytes sent from this end that the other end has not read yet
    pub fn pending_outbound(&self) -> usize {
        self.tx.borrow().len()
    }

    /// Consume everything waiting to be read at this end
    pub fn take_received(&self) -> String {
        let bytes: Vec<u8> = self.rx.borrow_mut().drain(..).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Make every write on the cable fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }
}

impl SerialPort for MemorySerial {
    fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut rx = self.rx.borrow_mut();
        let Some(end) = rx.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };
        let mut line: Vec<u8> = rx.drain(..=end).collect();
        line.pop();
        Ok(Some(line))
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.get() {
            return Err(HalError::Serial("line down".into()));
        }
        self.tx.borrow_mut().extend(bytes);
        Ok(())
    }
}

// ============================================================================
// Effects
// ============================================================================

/// Records every effect; logs text changes
#[derive(Debug, Clone, Default)]
pub struct HeadlessEffects {
    texts: [String; 5],
    leds: [Rgb; NUM_LEDS],
    tones: Vec<(u32, f32)>,
    scene: Scene,
}

impl HeadlessEffects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, field: TextField) -> &str {
        &self.texts[field.index()]
    }

    pub fn leds(&self) -> [Rgb; NUM_LEDS] {
        self.leds
    }

    /// (frequency, duration) in the order played
    pub fn tones(&self) -> &[(u32, f32)] {
        &self.tones
    }

    pub fn clear_tones(&mut self) {
        self.tones.clear();
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

impl Effects for HeadlessEffects {
    fn render_text(&mut self, field: TextField, text: &str) {
        let slot = &mut self.texts[field.index()];
        if slot.as_str() == text {
            return;
        }
        match field {
            TextField::Title | TextField::Message if !text.is_empty() => {
                log::info!("[{:?}] {}", field, text)
            }
            _ => log::trace!("[{:?}] {}", field, text),
        }
        *slot = text.to_string();
    }

    fn set_led(&mut self, index: usize, color: Rgb) {
        if let Some(led) = self.leds.get_mut(index) {
            *led = color;
        }
    }

    fn play_tone(&mut self, frequency_hz: u32, duration_s: f32) {
        log::trace!("tone {} Hz for {:.2}s", frequency_hz, duration_s);
        self.tones.push((frequency_hz, duration_s));
    }

    fn present(&mut self, scene: &Scene) {
        self.scene = scene.clone();
    }
}

// ============================================================================
// Autopilot board
// ============================================================================

/// Pressed time per button cycle (long enough to span a few frames)
const PRESS_HOLD: f64 = 0.05;
const TILT_PERIOD: f64 = 3.1;
const TILT_AMPLITUDE: f64 = 4.5;
const TILT_NOISE: f32 = 0.3;

/// A board that plays by itself: swaying tilt, periodic presses and detents
#[derive(Debug)]
pub struct DesktopBoard<C: Clock> {
    clock: C,
    effects: HeadlessEffects,
    rng: Pcg32,
    /// Resting sensor bias, removed by calibration
    bias: f32,
    press_period: f64,
    detent_period: f64,
}

impl<C: Clock> DesktopBoard<C> {
    pub fn new(clock: C, seed: u64) -> Self {
        Self {
            clock,
            effects: HeadlessEffects::new(),
            rng: Pcg32::seed_from_u64(seed),
            bias: 0.4,
            press_period: 0.9,
            detent_period: 7.0,
        }
    }

    pub fn effects(&self) -> &HeadlessEffects {
        &self.effects
    }

    fn window(&self, period: f64) -> bool {
        self.clock.now() % period < PRESS_HOLD
    }
}

impl<C: Clock> Clock for DesktopBoard<C> {
    fn now(&self) -> f64 {
        self.clock.now()
    }

    fn sleep(&mut self, secs: f64) {
        self.clock.sleep(secs);
    }
}

impl<C: Clock> Accelerometer for DesktopBoard<C> {
    fn read_x(&mut self) -> Result<f32> {
        let phase = self.clock.now() * std::f64::consts::TAU / TILT_PERIOD;
        let noise = self.rng.random_range(-TILT_NOISE..=TILT_NOISE);
        Ok(self.bias + (TILT_AMPLITUDE * phase.sin()) as f32 + noise)
    }
}

impl<C: Clock> Controls for DesktopBoard<C> {
    fn button_level(&mut self) -> bool {
        !self.window(self.press_period)
    }

    fn encoder_levels(&mut self) -> (bool, bool) {
        (!self.window(self.detent_period), true)
    }
}

impl<C: Clock> Effects for DesktopBoard<C> {
    fn render_text(&mut self, field: TextField, text: &str) {
        self.effects.render_text(field, text);
    }

    fn set_led(&mut self, index: usize, color: Rgb) {
        self.effects.set_led(index, color);
    }

    fn play_tone(&mut self, frequency_hz: u32, duration_s: f32) {
        self.effects.play_tone(frequency_hz, duration_s);
    }

    fn present(&mut self, scene: &Scene) {
        self.effects.present(scene);
    }
}
