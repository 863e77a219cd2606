//! Frame driver
//!
//! Owns the board and the session. Each step is either one idle frame
//! (latch input, tick, redraw, wait one frame interval) or, while the claw
//! is moving, a wait until the next drop deadline followed by `advance`.
//! Input is not sampled while the claw is moving.

use crate::consts::SERIAL_BAUD;
use crate::error::Result;
use crate::input::{ButtonEdge, QuadratureDecoder};
use crate::link::PeerLink;
use crate::platform::{Board, SerialPort};
use crate::sim::filter::TiltFilter;
use crate::sim::tick::{Session, TickInput};

pub struct FrameDriver<B: Board> {
    board: B,
    session: Session,
    button: ButtonEdge,
    encoder: QuadratureDecoder,
}

impl<B: Board> FrameDriver<B> {
    /// Calibrate against the resting sensor (blocks ~2 s), bring up the peer
    /// link from `serial`, then open the menu
    pub fn start(mut board: B, serial: Result<Box<dyn SerialPort>>, seed: u64) -> Self {
        log::info!("Calibrating tilt sensor, keep the board still");
        let filter = TiltFilter::calibrated(&mut board);

        let link = PeerLink::open(serial);
        if link.is_some() {
            log::info!("Peer link up at {} baud", SERIAL_BAUD);
        }

        let button = ButtonEdge::new(board.button_level());
        let (a, _) = board.encoder_levels();
        let encoder = QuadratureDecoder::new(a);

        let mut session = Session::new(seed, filter, link);
        session.show_menu(&mut board);
        board.present(&session.scene());

        Self {
            board,
            session,
            button,
            encoder,
        }
    }

    pub fn board(&self) -> &B {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// One frame, or one batch of due drop events
    pub fn step(&mut self) {
        let now = self.board.now();
        if self.session.is_busy() {
            self.session.advance(now, &mut self.board);
        } else {
            let pressed = self.button.update(self.board.button_level());
            let turn = if self.session.in_menu() {
                let (a, b) = self.board.encoder_levels();
                self.encoder.update(a, b)
            } else {
                None
            };
            let input = TickInput {
                pressed,
                turn,
                tilt: self.board.read_x(),
            };
            self.session.tick(input, now, &mut self.board);
        }
        self.end_frame();

        match self.session.next_deadline() {
            Some(due) => {
                let wait = due - self.board.now();
                self.board.sleep(wait);
            }
            None => {
                let interval = self.session.frame_interval();
                self.board.sleep(interval);
            }
        }
    }

    fn end_frame(&mut self) {
        if self.session.take_input_resync() {
            self.button.resync(self.board.button_level());
        }
        if let Some(summary) = self.session.take_summary() {
            match serde_json::to_string(&summary) {
                Ok(json) => log::info!("Round summary: {}", json),
                Err(e) => log::warn!("Failed to encode round summary: {}", e),
            }
        }
        self.board.present(&self.session.scene());
    }

    /// Run for `secs` of board time
    pub fn run_for(&mut self, secs: f64) {
        let end = self.board.now() + secs;
        while self.board.now() < end {
            self.step();
        }
    }

    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use crate::error::HalError;
    use crate::leds::Rgb;
    use crate::platform::desktop::{DesktopBoard, HeadlessEffects, MemorySerial, VirtualClock};
    use crate::platform::{Accelerometer, Clock, Controls, Effects};
    use crate::sim::state::{Mode, Phase};
    use crate::ui::{Scene, TextField};

    /// Board whose pins and sensor the test sets directly
    #[derive(Default)]
    struct ScriptedBoard {
        clock: VirtualClock,
        fx: HeadlessEffects,
        button: bool,
        encoder: (bool, bool),
        tilt: f32,
        reads: usize,
    }

    impl ScriptedBoard {
        fn new() -> Self {
            Self {
                button: true,
                encoder: (true, true),
                ..Default::default()
            }
        }
    }

    impl Clock for ScriptedBoard {
        fn now(&self) -> f64 {
            self.clock.now()
        }

        fn sleep(&mut self, secs: f64) {
            self.clock.sleep(secs);
        }
    }

    impl Accelerometer for ScriptedBoard {
        fn read_x(&mut self) -> Result<f32> {
            self.reads += 1;
            Ok(self.tilt)
        }
    }

    impl Controls for ScriptedBoard {
        fn button_level(&mut self) -> bool {
            self.button
        }

        fn encoder_levels(&mut self) -> (bool, bool) {
            self.encoder
        }
    }

    impl Effects for ScriptedBoard {
        fn render_text(&mut self, field: TextField, text: &str) {
            self.fx.render_text(field, text);
        }

        fn set_led(&mut self, index: usize, color: Rgb) {
            self.fx.set_led(index, color);
        }

        fn play_tone(&mut self, frequency_hz: u32, duration_s: f32) {
            self.fx.play_tone(frequency_hz, duration_s);
        }

        fn present(&mut self, scene: &Scene) {
            self.fx.present(scene);
        }
    }

    fn no_uart() -> Result<Box<dyn SerialPort>> {
        Err(HalError::Unavailable("uart0".into()))
    }

    /// Press on one frame, release on the next
    fn click(driver: &mut FrameDriver<ScriptedBoard>) {
        driver.board_mut().button = false;
        driver.step();
        driver.board_mut().button = true;
        driver.step();
    }

    #[test]
    fn test_start_calibrates_then_shows_menu() {
        let mut board = ScriptedBoard::new();
        board.tilt = 0.5;
        let driver = FrameDriver::start(board, no_uart(), 1);

        assert_eq!(driver.board().reads, ACCEL_CALIB_SAMPLES);
        assert!((driver.board().now() - 2.0).abs() < 1e-6);
        assert!((driver.session().filter().offset() - 0.5).abs() < 1e-6);
        assert_eq!(driver.board().fx.text(TextField::Title), "MENU");
        assert_eq!(driver.board().fx.text(TextField::Message), "< EASY >");
    }

    #[test]
    fn test_encoder_moves_menu() {
        let mut driver = FrameDriver::start(ScriptedBoard::new(), no_uart(), 1);
        driver.board_mut().encoder = (false, true);
        driver.step();
        assert_eq!(driver.board().fx.text(TextField::Message), "< MEDIUM >");

        // Rising edge of A is not a detent
        driver.board_mut().encoder = (true, true);
        driver.step();
        assert_eq!(driver.board().fx.text(TextField::Message), "< MEDIUM >");
    }

    #[test]
    fn test_held_button_does_not_redrop() {
        let mut driver = FrameDriver::start(ScriptedBoard::new(), no_uart(), 1);
        click(&mut driver);
        assert_eq!(driver.session().mode(), Some(Mode::Easy));

        let reads = driver.board().reads;
        driver.board_mut().button = false;
        driver.step();
        assert!(driver.session().is_busy());
        while driver.session().is_busy() {
            driver.step();
        }
        // Tilt is only read on idle frames
        assert_eq!(driver.board().reads, reads + 1);

        // Still held after the claw is back: no new press
        driver.step();
        assert!(!driver.session().is_busy());
    }

    #[test]
    fn test_drop_takes_virtual_time() {
        let mut driver = FrameDriver::start(ScriptedBoard::new(), no_uart(), 1);
        click(&mut driver);
        let before = driver.board().now();
        click(&mut driver);
        while driver.session().is_busy() {
            driver.step();
        }
        let elapsed = driver.board().now() - before;
        assert!(elapsed >= 0.81 && elapsed < 0.9, "{}", elapsed);
    }

    #[test]
    fn test_round_times_out_and_returns_to_menu() {
        let mut driver = FrameDriver::start(ScriptedBoard::new(), no_uart(), 1);
        click(&mut driver);
        driver.run_for(31.0);
        assert_eq!(driver.session().round().map(|r| r.phase), Some(Phase::GameOver));
        assert_eq!(driver.board().fx.text(TextField::Message), "GAME OVER");

        click(&mut driver);
        assert!(driver.session().in_menu());
    }

    #[test]
    fn test_failed_serial_open_disables_multiplayer() {
        let serial = Err(HalError::Serial("port busy".into()));
        let mut driver = FrameDriver::start(ScriptedBoard::new(), serial, 1);
        assert!(!driver.session().link_available());

        // Turn back once from EASY to reach MULTI
        driver.board_mut().encoder = (false, false);
        driver.step();
        driver.board_mut().encoder = (true, true);
        driver.step();
        assert_eq!(driver.session().selected(), Mode::Multiplayer);

        click(&mut driver);
        assert!(driver.session().in_menu());
        assert_eq!(driver.board().fx.text(TextField::Message), "UART N/A");
    }

    #[test]
    fn test_open_serial_enables_multiplayer() {
        let (local, _remote) = MemorySerial::pair();
        let driver = FrameDriver::start(ScriptedBoard::new(), Ok(Box::new(local)), 1);
        assert!(driver.session().link_available());
    }

    #[test]
    fn test_autopilot_starts_a_round() {
        let board = DesktopBoard::new(VirtualClock::new(), 3);
        let mut driver = FrameDriver::start(board, no_uart(), 3);
        driver.run_for(10.0);
        assert_eq!(driver.session().mode(), Some(Mode::Easy));
        assert!(driver.board().effects().scene().claw.is_some());
    }
}
