//! Tilt Claw desktop entry point
//!
//! Runs the frame driver against an autopilot board on the wall clock, with
//! a simulated second device on the other end of an in-memory serial cable.
//! Set `RUST_LOG=info` (or `debug`) to follow along.

use std::time::{SystemTime, UNIX_EPOCH};

use tilt_claw::FrameDriver;
use tilt_claw::consts::*;
use tilt_claw::link::{DodgerPeer, PeerLink};
use tilt_claw::platform::Clock;
use tilt_claw::platform::desktop::{DesktopBoard, MemorySerial, SystemClock};

/// How long the demo plays before exiting
const DEMO_SECONDS: f64 = 90.0;
/// Seconds for the simulated dodger to sweep across and back
const DODGER_SWEEP: f64 = 4.0;

fn main() {
    env_logger::init();
    log::info!("Tilt Claw (desktop) starting...");

    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    log::info!("Seed: {}", seed);

    let (shooter_end, dodger_end) = MemorySerial::pair();
    let mut dodger = DodgerPeer::new(PeerLink::new(Box::new(dodger_end)));

    let board = DesktopBoard::new(SystemClock::new(), seed);
    let mut driver = FrameDriver::start(board, Ok(Box::new(shooter_end)), seed);

    let end = driver.board().now() + DEMO_SECONDS;
    while driver.board().now() < end {
        driver.step();

        let now = driver.board().now();
        let phase = (now % DODGER_SWEEP) / DODGER_SWEEP;
        let sweep = 1.0 - (2.0 * phase - 1.0).abs();
        let x = (sweep * f64::from(SCREEN_WIDTH - PLAYER_WIDTH)) as i32;
        dodger.tick(x, now);
    }

    log::info!(
        "Demo over; dodger saw {} shots, last aim at x={:?}",
        dodger.fires_seen(),
        dodger.shooter_x()
    );
}
