//! Platform abstraction layer
//!
//! The core never touches hardware directly. Each peripheral is a trait:
//! - Time and blocking waits (`Clock`)
//! - Tilt sensing (`Accelerometer`)
//! - Rotary encoder and its push button (`Controls`)
//! - The peer UART (`SerialPort`)
//! - Display text, LED strip and buzzer (`Effects`)

pub mod desktop;

use crate::error::Result;
use crate::leds::Rgb;
use crate::ui::{Scene, TextField};

/// Monotonic time source in seconds
pub trait Clock {
    fn now(&self) -> f64;
    /// Block the single execution context
    fn sleep(&mut self, secs: f64);
}

/// Horizontal tilt axis of the accelerometer (m/s²)
pub trait Accelerometer {
    fn read_x(&mut self) -> Result<f32>;
}

/// Raw pin levels, pulled up (true = released / high)
pub trait Controls {
    fn button_level(&mut self) -> bool;
    /// Encoder channels (A, B)
    fn encoder_levels(&mut self) -> (bool, bool);
}

/// Line-oriented, non-blocking serial port
pub trait SerialPort {
    /// Next complete buffered line without its terminator, or `None` when
    /// nothing complete is pending. Must never wait for data.
    fn read_line(&mut self) -> Result<Option<Vec<u8>>>;
    fn write(&mut self, bytes: &[u8]) -> Result<()>;
}

/// Output side effects the core decides on but does not implement
pub trait Effects {
    fn render_text(&mut self, field: TextField, text: &str);
    fn set_led(&mut self, index: usize, color: Rgb);
    fn play_tone(&mut self, frequency_hz: u32, duration_s: f32);
    /// Redraw sprites (claw, targets, remote player)
    fn present(&mut self, _scene: &Scene) {}
}

/// Everything the frame driver needs from a board
pub trait Board: Clock + Accelerometer + Controls + Effects {}

impl<T: Clock + Accelerometer + Controls + Effects> Board for T {}
