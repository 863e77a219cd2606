//! Two-device peer link over a lossy serial line
//!
//! Newline-terminated ASCII, no handshake, no acks, no checksums:
//! - `AIM:<float>`  shooter's raw tilt, at most every 30 ms
//! - `FIRE:1`       shooter started a drop
//! - `P:<int>`      dodger's on-screen x
//!
//! Every send is fire-and-forget and every receive is best-effort. Lines that
//! fail to decode or parse are dropped without surfacing an error.

use std::fmt;

use crate::consts::*;
use crate::error::Result;
use crate::map_range;
use crate::platform::SerialPort;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PeerMessage {
    /// Shooter's raw tilt reading
    Aim(f32),
    /// Shooter dropped the claw
    Fire,
    /// Dodger's screen-space x
    Position(i32),
}

impl PeerMessage {
    /// Parse one received line. Surrounding whitespace is ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let (tag, value) = line.trim().split_once(':')?;
        let value = value.trim();
        match tag {
            "P" => value.parse().ok().map(PeerMessage::Position),
            "AIM" => value
                .parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .map(PeerMessage::Aim),
            "FIRE" => value.parse::<i32>().ok().map(|_| PeerMessage::Fire),
            _ => None,
        }
    }

    /// Wire form including the terminator
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for PeerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerMessage::Aim(v) => write!(f, "AIM:{:.1}", v),
            PeerMessage::Fire => write!(f, "FIRE:1"),
            PeerMessage::Position(x) => write!(f, "P:{}", x),
        }
    }
}

/// Everything that arrived in one drain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inbox {
    /// Most recent position; earlier ones in the same drain are stale
    pub position: Option<i32>,
    /// Most recent aim
    pub aim: Option<f32>,
    pub fires: u32,
    /// Lines that did not decode or parse
    pub dropped: u32,
}

/// Wall-clock send throttle, independent of frame rate
#[derive(Debug, Clone)]
pub struct RateLimiter {
    interval: f64,
    last_sent: Option<f64>,
}

impl RateLimiter {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            last_sent: None,
        }
    }

    pub fn ready(&self, now: f64) -> bool {
        self.last_sent.is_none_or(|t| now - t >= self.interval)
    }

    pub fn mark(&mut self, now: f64) {
        self.last_sent = Some(now);
    }
}

/// One end of the serial link
pub struct PeerLink {
    port: Box<dyn SerialPort>,
    limiter: RateLimiter,
}

impl fmt::Debug for PeerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerLink")
            .field("limiter", &self.limiter)
            .finish_non_exhaustive()
    }
}

impl PeerLink {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        Self {
            port,
            limiter: RateLimiter::new(AIM_SEND_INTERVAL),
        }
    }

    /// Bring the link up from a startup open attempt. A failed open is
    /// permanent for this power cycle: multiplayer stays unavailable.
    pub fn open(port: Result<Box<dyn SerialPort>>) -> Option<Self> {
        match port {
            Ok(port) => Some(Self::new(port)),
            Err(e) if e.is_unavailable() => {
                log::warn!("No serial port fitted ({}), multiplayer disabled", e);
                None
            }
            Err(e) => {
                log::warn!("Serial open failed ({}), multiplayer disabled", e);
                None
            }
        }
    }

    /// Consume every complete line currently buffered. Never waits: the port
    /// reports `None` once no complete line is pending.
    pub fn drain(&mut self) -> Inbox {
        let mut inbox = Inbox::default();
        loop {
            let bytes = match self.port.read_line() {
                Ok(Some(bytes)) => bytes,
                Ok(None) => break,
                Err(e) => {
                    log::trace!("Serial read failed: {}", e);
                    break;
                }
            };
            let msg = std::str::from_utf8(&bytes).ok().and_then(PeerMessage::parse);
            match msg {
                Some(PeerMessage::Position(x)) => inbox.position = Some(x),
                Some(PeerMessage::Aim(v)) => inbox.aim = Some(v),
                Some(PeerMessage::Fire) => inbox.fires += 1,
                None => {
                    log::trace!("Dropped peer line {:?}", String::from_utf8_lossy(&bytes));
                    inbox.dropped += 1;
                }
            }
        }
        inbox
    }

    /// Write one message; failures are swallowed. Returns whether it was written.
    pub fn send(&mut self, msg: PeerMessage) -> bool {
        match self.port.write(msg.encode().as_bytes()) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Serial write of {} failed: {}", msg, e);
                false
            }
        }
    }

    /// Send through the rate limiter; the window only restarts on a successful write
    fn send_throttled(&mut self, msg: PeerMessage, now: f64) -> bool {
        if !self.limiter.ready(now) {
            return false;
        }
        let sent = self.send(msg);
        if sent {
            self.limiter.mark(now);
        }
        sent
    }

    /// Shooter: broadcast raw tilt
    pub fn send_aim(&mut self, raw: f32, now: f64) -> bool {
        self.send_throttled(PeerMessage::Aim(raw), now)
    }

    /// Shooter: announce a drop
    pub fn send_fire(&mut self) -> bool {
        self.send(PeerMessage::Fire)
    }

    /// Dodger: broadcast own position
    pub fn send_position(&mut self, x: i32, now: f64) -> bool {
        self.send_throttled(PeerMessage::Position(x), now)
    }
}

/// The dodging device's end of a versus round
#[derive(Debug)]
pub struct DodgerPeer {
    link: PeerLink,
    x: i32,
    shooter_x: Option<i32>,
    fires_seen: u32,
}

impl DodgerPeer {
    pub fn new(link: PeerLink) -> Self {
        Self {
            link,
            x: SCREEN_WIDTH / 2,
            shooter_x: None,
            fires_seen: 0,
        }
    }

    /// Own position as last broadcast
    pub fn x(&self) -> i32 {
        self.x
    }

    /// Opposing claw's left edge, derived from its last aim
    pub fn shooter_x(&self) -> Option<i32> {
        self.shooter_x
    }

    pub fn fires_seen(&self) -> u32 {
        self.fires_seen
    }

    /// One dodger frame: take in the shooter's traffic, then report `x`
    pub fn tick(&mut self, x: i32, now: f64) -> Inbox {
        let inbox = self.link.drain();
        if let Some(aim) = inbox.aim {
            let right = (SCREEN_WIDTH - CLAW_WIDTH) as f32;
            let claw = map_range(aim, ACCEL_MIN, ACCEL_MAX, 0.0, right);
            self.shooter_x = Some(claw as i32);
        }
        if inbox.fires > 0 {
            log::debug!("Shooter fired ({} this frame)", inbox.fires);
            self.fires_seen += inbox.fires;
        }
        self.x = x.clamp(0, SCREEN_WIDTH - PLAYER_WIDTH);
        self.link.send_position(self.x, now);
        inbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HalError;
    use crate::platform::desktop::MemorySerial;

    #[test]
    fn test_position_round_trip() {
        let msg = PeerMessage::parse("P:57\n").unwrap();
        assert_eq!(msg, PeerMessage::Position(57));
        assert_eq!(msg.encode(), "P:57\n");
    }

    #[test]
    fn test_parse_grammar() {
        assert_eq!(PeerMessage::parse("AIM:-1.5"), Some(PeerMessage::Aim(-1.5)));
        assert_eq!(PeerMessage::parse("FIRE:1\r"), Some(PeerMessage::Fire));
        assert_eq!(PeerMessage::parse(" P: -3 "), Some(PeerMessage::Position(-3)));
        assert_eq!(PeerMessage::parse("P:abc"), None);
        assert_eq!(PeerMessage::parse("P57"), None);
        assert_eq!(PeerMessage::parse("AIM:nan"), None);
        assert_eq!(PeerMessage::parse("HELLO:1"), None);
        assert_eq!(PeerMessage::parse(""), None);
    }

    #[test]
    fn test_aim_wire_format() {
        assert_eq!(PeerMessage::Aim(2.345).encode(), "AIM:2.3\n");
        assert_eq!(PeerMessage::Fire.encode(), "FIRE:1\n");
    }

    #[test]
    fn test_drain_keeps_latest_position() {
        let (local, remote) = MemorySerial::pair();
        let mut link = PeerLink::new(Box::new(local));
        remote.inject(b"P:10\nP:20\ngarbage\n\xff\xfe\nP:30\nP:4");

        let inbox = link.drain();
        assert_eq!(inbox.position, Some(30));
        assert_eq!(inbox.dropped, 2);

        // Partial line stays buffered until its newline arrives
        assert_eq!(link.drain(), Inbox::default());
        remote.inject(b"0\n");
        assert_eq!(link.drain().position, Some(40));
    }

    #[test]
    fn test_drain_reads_whole_backlog() {
        let (local, remote) = MemorySerial::pair();
        let mut link = PeerLink::new(Box::new(local));
        let mut backlog = "P:1\n".repeat(200);
        backlog.push_str("P:99\n");
        remote.inject(backlog.as_bytes());

        let inbox = link.drain();
        assert_eq!(inbox.position, Some(99));
        assert_eq!(remote.pending_outbound(), 0);
    }

    #[test]
    fn test_open_failure_leaves_no_link() {
        let (local, _remote) = MemorySerial::pair();
        assert!(PeerLink::open(Ok(Box::new(local))).is_some());
        assert!(PeerLink::open(Err(HalError::Unavailable("uart0".into()))).is_none());
        assert!(PeerLink::open(Err(HalError::Serial("busy".into()))).is_none());
    }

    #[test]
    fn test_aim_rate_limited() {
        let (local, remote) = MemorySerial::pair();
        let mut link = PeerLink::new(Box::new(local));
        assert!(link.send_aim(1.0, 0.0));
        assert!(!link.send_aim(1.0, 0.01));
        assert!(!link.send_aim(1.0, 0.029));
        assert!(link.send_aim(1.0, 0.03));
        assert_eq!(remote.take_received(), "AIM:1.0\nAIM:1.0\n");
    }

    #[test]
    fn test_failed_write_swallowed() {
        let (local, remote) = MemorySerial::pair();
        let mut link = PeerLink::new(Box::new(local));
        remote.set_fail_writes(true);
        assert!(!link.send_fire());
        assert!(!link.send_aim(0.5, 0.0));
        remote.set_fail_writes(false);
        // A failed write does not start the throttle window
        assert!(link.send_aim(0.5, 0.001));
    }

    #[test]
    fn test_dodger_tracks_shooter() {
        let (shooter_end, dodger_end) = MemorySerial::pair();
        let mut shooter = PeerLink::new(Box::new(shooter_end));
        let mut dodger = DodgerPeer::new(PeerLink::new(Box::new(dodger_end)));

        shooter.send_aim(0.0, 0.0);
        shooter.send_fire();
        let inbox = dodger.tick(70, 0.0);
        assert_eq!(inbox.fires, 1);
        assert_eq!(dodger.shooter_x(), Some(44));
        assert_eq!(dodger.fires_seen(), 1);

        assert_eq!(shooter.drain().position, Some(70));
    }
}
