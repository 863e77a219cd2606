//! Polled input decoding
//!
//! Debouncing is only the frame poll interval: a press is a level change
//! between two consecutive polls.

/// Press detector for a pulled-up push button
#[derive(Debug, Clone, Copy)]
pub struct ButtonEdge {
    last: bool,
}

impl ButtonEdge {
    /// Latch the current level without reporting a press
    pub fn new(level: bool) -> Self {
        Self { last: level }
    }

    /// Returns true on a high-to-low transition (released -> pressed)
    pub fn update(&mut self, level: bool) -> bool {
        let pressed = self.last && !level;
        self.last = level;
        pressed
    }

    /// Forget any transition in progress
    pub fn resync(&mut self, level: bool) {
        self.last = level;
    }
}

/// One detent of the rotary encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

/// Quadrature decoding on the edges of channel A
#[derive(Debug, Clone, Copy)]
pub struct QuadratureDecoder {
    last_a: bool,
}

impl QuadratureDecoder {
    pub fn new(a: bool) -> Self {
        Self { last_a: a }
    }

    /// Direction is read from channel B when A falls
    pub fn update(&mut self, a: bool, b: bool) -> Option<Direction> {
        if a == self.last_a {
            return None;
        }
        self.last_a = a;
        if a {
            return None;
        }
        Some(if b {
            Direction::Clockwise
        } else {
            Direction::CounterClockwise
        })
    }
}

/// Wrap-around cursor over a fixed list of options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MenuCursor {
    index: usize,
}

impl MenuCursor {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn step(&mut self, direction: Direction, len: usize) {
        self.index = match direction {
            Direction::Clockwise => (self.index + 1) % len,
            Direction::CounterClockwise => (self.index + len - 1) % len,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_press_is_high_to_low() {
        let mut btn = ButtonEdge::new(true);
        assert!(!btn.update(true));
        assert!(btn.update(false));
        // Held down: no repeat
        assert!(!btn.update(false));
        // Release is not a press
        assert!(!btn.update(true));
    }

    #[test]
    fn test_resync_swallows_press() {
        let mut btn = ButtonEdge::new(true);
        btn.resync(false);
        assert!(!btn.update(false));
    }

    #[test]
    fn test_quadrature_direction() {
        let mut enc = QuadratureDecoder::new(true);
        assert_eq!(enc.update(true, true), None);
        assert_eq!(enc.update(false, true), Some(Direction::Clockwise));
        // Rising edge of A is ignored
        assert_eq!(enc.update(true, false), None);
        assert_eq!(enc.update(false, false), Some(Direction::CounterClockwise));
    }

    #[test]
    fn test_cursor_wraps() {
        let mut cursor = MenuCursor::default();
        cursor.step(Direction::CounterClockwise, 4);
        assert_eq!(cursor.index(), 3);
        cursor.step(Direction::Clockwise, 4);
        assert_eq!(cursor.index(), 0);
    }
}
