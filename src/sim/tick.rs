//! Session state machine
//!
//! The menu and the two play tracks (single-player and versus) never
//! interleave; returning to the menu is their only common exit.
//!
//! The session is driven two ways: `tick` once per frame while idle, and
//! `advance` whenever a claw drop is in flight. While a drop runs nothing
//! happens except the drop's own timeline and target motion.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::claw::{ClawDrop, ClawEvent};
use super::filter::TiltFilter;
use super::state::{
    HitOutcome, MissOutcome, Mode, Outcome, Phase, RoundState, RoundSummary, VersusState,
};
use super::targets::{TargetSet, Targets};
use crate::audio::{self, SoundEffect};
use crate::consts::*;
use crate::error::Result;
use crate::input::{Direction, MenuCursor};
use crate::leds::{self, LedSequence};
use crate::link::PeerLink;
use crate::platform::Effects;
use crate::ui::{self, ClawSprite, Scene, TextField};

/// Input latched by the frame driver for a single frame
#[derive(Debug)]
pub struct TickInput {
    /// Button went from released to pressed since the last frame
    pub pressed: bool,
    /// Encoder detent (only read in the menu)
    pub turn: Option<Direction>,
    /// Raw tilt reading for this frame
    pub tilt: Result<f32>,
}

impl TickInput {
    /// No press, no turn
    pub fn new(tilt: Result<f32>) -> Self {
        Self {
            pressed: false,
            turn: None,
            tilt,
        }
    }
}

#[derive(Debug)]
enum Screen {
    Menu,
    Solo {
        round: RoundState,
        targets: Targets,
    },
    Versus {
        state: VersusState,
        targets: Targets,
        /// Hit/miss sequence currently overriding the score band
        feedback: Option<LedSequence>,
    },
}

/// Everything that lives for the whole power cycle
#[derive(Debug)]
pub struct Session {
    screen: Screen,
    cursor: MenuCursor,
    rng: Pcg32,
    filter: TiltFilter,
    /// `None` when the peer link could not be brought up at startup
    link: Option<PeerLink>,
    drop: Option<ClawDrop>,
    claw_x: i32,
    summary: Option<RoundSummary>,
    resync_input: bool,
}

impl Session {
    pub fn new(seed: u64, filter: TiltFilter, link: Option<PeerLink>) -> Self {
        let claw_x = filter.claw_x();
        Self {
            screen: Screen::Menu,
            cursor: MenuCursor::default(),
            rng: Pcg32::seed_from_u64(seed),
            filter,
            link,
            drop: None,
            claw_x,
            summary: None,
            resync_input: false,
        }
    }

    pub fn link_available(&self) -> bool {
        self.link.is_some()
    }

    pub fn in_menu(&self) -> bool {
        matches!(self.screen, Screen::Menu)
    }

    /// Mode being played, `None` in the menu
    pub fn mode(&self) -> Option<Mode> {
        match &self.screen {
            Screen::Menu => None,
            Screen::Solo { round, .. } => Some(round.mode),
            Screen::Versus { .. } => Some(Mode::Multiplayer),
        }
    }

    /// Menu entry under the cursor
    pub fn selected(&self) -> Mode {
        Mode::ALL[self.cursor.index()]
    }

    pub fn round(&self) -> Option<&RoundState> {
        match &self.screen {
            Screen::Solo { round, .. } => Some(round),
            _ => None,
        }
    }

    pub fn versus(&self) -> Option<&VersusState> {
        match &self.screen {
            Screen::Versus { state, .. } => Some(state),
            _ => None,
        }
    }

    pub fn targets(&self) -> Option<&Targets> {
        match &self.screen {
            Screen::Menu => None,
            Screen::Solo { targets, .. } | Screen::Versus { targets, .. } => Some(targets),
        }
    }

    /// Direct access for tests and replays
    pub fn targets_mut(&mut self) -> Option<&mut Targets> {
        match &mut self.screen {
            Screen::Menu => None,
            Screen::Solo { targets, .. } | Screen::Versus { targets, .. } => Some(targets),
        }
    }

    pub fn filter(&self) -> &TiltFilter {
        &self.filter
    }

    /// Claw left edge following the tilt (not the frozen drop position)
    pub fn claw_x(&self) -> i32 {
        self.claw_x
    }

    pub fn claw(&self) -> Option<&ClawDrop> {
        self.drop.as_ref()
    }

    /// A claw drop is in flight; only `advance` does anything
    pub fn is_busy(&self) -> bool {
        self.drop.is_some()
    }

    /// Poll cadence for idle frames
    pub fn frame_interval(&self) -> f64 {
        if self.in_menu() {
            MENU_FRAME_INTERVAL
        } else {
            FRAME_INTERVAL
        }
    }

    /// When `advance` next has work to do. `None` when idle.
    pub fn next_deadline(&self) -> Option<f64> {
        let claw = self.drop.as_ref()?.next_deadline();
        let feedback = match &self.screen {
            Screen::Versus {
                feedback: Some(seq),
                ..
            } => Some(seq.next_due()),
            _ => None,
        };
        match (claw, feedback) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Summary of a round that just reached a terminal outcome
    pub fn take_summary(&mut self) -> Option<RoundSummary> {
        self.summary.take()
    }

    /// True once after a versus round ends; the driver re-latches the button
    pub fn take_input_resync(&mut self) -> bool {
        std::mem::take(&mut self.resync_input)
    }

    /// Sprites for the current frame
    pub fn scene(&self) -> Scene {
        let claw = match &self.drop {
            Some(drop) => ClawSprite {
                x: drop.x(),
                drop: drop.offset(),
            },
            None => ClawSprite {
                x: self.claw_x,
                drop: 0,
            },
        };
        match &self.screen {
            Screen::Menu => Scene::default(),
            Screen::Solo { targets, .. } => Scene {
                claw: Some(claw),
                targets: targets.positions(),
                player: None,
            },
            Screen::Versus { targets, .. } => Scene {
                claw: Some(claw),
                targets: Vec::new(),
                player: targets.positions().first().copied(),
            },
        }
    }

    // ------------------------------------------------------------------------
    // Menu
    // ------------------------------------------------------------------------

    /// Drop any round and return to the menu
    pub fn show_menu(&mut self, fx: &mut dyn Effects) {
        self.screen = Screen::Menu;
        self.drop = None;
        leds::clear(fx);
        fx.render_text(TextField::Title, ui::TITLE_MENU);
        fx.render_text(TextField::Level, "");
        fx.render_text(TextField::Timer, "");
        fx.render_text(TextField::Hits, "");
        fx.render_text(TextField::Message, &ui::menu_text(self.selected()));
    }

    fn tick_menu(
        &mut self,
        pressed: bool,
        turn: Option<Direction>,
        now: f64,
        fx: &mut dyn Effects,
    ) {
        if let Some(direction) = turn {
            self.cursor.step(direction, Mode::ALL.len());
            fx.render_text(TextField::Message, &ui::menu_text(self.selected()));
        }
        if pressed {
            self.select(now, fx);
        }
    }

    fn select(&mut self, now: f64, fx: &mut dyn Effects) {
        match self.selected() {
            Mode::Multiplayer if self.link.is_none() => {
                log::warn!("Multiplayer selected but the peer link is unavailable");
                fx.render_text(TextField::Message, ui::MSG_LINK_DOWN);
            }
            Mode::Multiplayer => self.start_versus(now, fx),
            mode => self.start_solo(mode, now, fx),
        }
    }

    fn start_solo(&mut self, mode: Mode, now: f64, fx: &mut dyn Effects) {
        log::info!("Starting {} round", mode.name());
        let round = RoundState::new(mode, now);
        let targets = Targets::for_level(mode, round.level_index, now, &mut self.rng);
        fx.render_text(TextField::Title, mode.name());
        render_level(fx, &round);
        self.screen = Screen::Solo { round, targets };
    }

    fn start_versus(&mut self, now: f64, fx: &mut dyn Effects) {
        log::info!("Starting versus round as shooter");
        let state = VersusState::new(now);
        let targets = Targets::for_level(Mode::Multiplayer, 0, now, &mut self.rng);
        leds::show_score_band(fx, state.diff());
        fx.render_text(TextField::Title, ui::TITLE_SHOOTER);
        fx.render_text(TextField::Level, &ui::own_score_text(state.shooter_score));
        fx.render_text(TextField::Timer, &format!("{:.0}", state.round_duration));
        fx.render_text(TextField::Hits, &ui::opponent_score_text(state.dodger_score));
        fx.render_text(TextField::Message, "");
        self.screen = Screen::Versus {
            state,
            targets,
            feedback: None,
        };
    }

    // ------------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------------

    /// One idle frame. If a drop is in flight this only advances it.
    pub fn tick(&mut self, input: TickInput, now: f64, fx: &mut dyn Effects) {
        if self.is_busy() {
            self.advance(now, fx);
            return;
        }
        self.advance_feedback(now, fx);

        let TickInput {
            pressed,
            turn,
            tilt,
        } = input;
        match self.screen {
            Screen::Menu => self.tick_menu(pressed, turn, now, fx),
            Screen::Solo { .. } => self.tick_solo(pressed, tilt, now, fx),
            Screen::Versus { .. } => self.tick_versus(pressed, tilt, now, fx),
        }

        // First drop frame is due immediately
        if self.is_busy() {
            self.advance(now, fx);
        }
    }

    fn tick_solo(&mut self, pressed: bool, tilt: Result<f32>, now: f64, fx: &mut dyn Effects) {
        let Session {
            screen,
            rng,
            filter,
            drop,
            claw_x,
            summary,
            ..
        } = self;
        let Screen::Solo { round, targets } = screen else {
            return;
        };

        let remaining = round.remaining(now);
        fx.render_text(TextField::Timer, &ui::timer_text(remaining));
        if round.check_timeout(now) {
            log::info!(
                "{} round out of time on level {}",
                round.mode.name(),
                round.level_index + 1
            );
            fx.render_text(TextField::Message, ui::MSG_GAME_OVER);
            audio::play(fx, SoundEffect::GameOver);
            *summary = Some(RoundSummary::solo(round));
        }

        if round.phase == Phase::Playing {
            targets.update(now, rng);
        }

        filter.sample(tilt);
        *claw_x = filter.claw_x();

        if !pressed {
            return;
        }
        let phase = round.phase;
        match phase {
            Phase::Playing if remaining > 0.0 => {
                log::debug!("Claw drop at x={}", claw_x);
                *drop = Some(ClawDrop::start(*claw_x, now));
            }
            Phase::Playing => {}
            Phase::GameOver | Phase::Win => self.show_menu(fx),
        }
    }

    fn tick_versus(&mut self, pressed: bool, tilt: Result<f32>, now: f64, fx: &mut dyn Effects) {
        let Session {
            screen,
            filter,
            link,
            drop,
            claw_x,
            summary,
            resync_input,
            ..
        } = self;
        let Screen::Versus { state, targets, .. } = screen else {
            return;
        };

        fx.render_text(TextField::Timer, &ui::versus_timer_text(state.remaining(now)));
        if let Some(outcome) = state.check_timeout(now) {
            log::info!(
                "Versus round over: {:?} ({} to {})",
                outcome,
                state.shooter_score,
                state.dodger_score
            );
            let (message, effect) = match outcome {
                Outcome::Win => (ui::MSG_WIN, Some(SoundEffect::LevelUp)),
                Outcome::Lose => (ui::MSG_LOSE, Some(SoundEffect::GameOver)),
                Outcome::Tie => (ui::MSG_TIE, None),
            };
            fx.render_text(TextField::Message, message);
            if let Some(effect) = effect {
                audio::play(fx, effect);
            }
            *summary = Some(RoundSummary::versus(state, outcome));
            *resync_input = true;
        }

        if let Some(link) = link.as_mut() {
            if let Some(x) = link.drain().position {
                targets.set_remote_x(x);
            }
        }

        let raw = tilt.as_ref().ok().copied().filter(|v| v.is_finite());
        filter.sample(tilt);
        *claw_x = filter.claw_x();

        if state.is_playing() {
            if let Some(link) = link.as_mut() {
                // Failed read: send the held reading, back in raw units
                let aim = raw.unwrap_or_else(|| filter.offset() + filter.filtered());
                link.send_aim(aim, now);
            }
        }

        if !pressed {
            return;
        }
        if state.is_playing() {
            if let Some(link) = link.as_mut() {
                link.send_fire();
            }
            log::debug!("Versus claw drop at x={}", claw_x);
            *drop = Some(ClawDrop::start(*claw_x, now));
        } else {
            self.show_menu(fx);
        }
    }

    // ------------------------------------------------------------------------
    // Claw drop
    // ------------------------------------------------------------------------

    /// Run every drop event that has come due by `now`
    pub fn advance(&mut self, now: f64, fx: &mut dyn Effects) {
        let Some(mut claw) = self.drop.take() else {
            self.advance_feedback(now, fx);
            return;
        };
        while let Some(event) = claw.poll(now) {
            match event {
                ClawEvent::Step { .. } => self.step_targets(now),
                ClawEvent::ReachedDepth => {
                    let extra_hold = self.resolve_drop(&claw, now, fx);
                    claw.extend_hold(extra_hold);
                }
                ClawEvent::Finished => log::trace!("Claw back at rest"),
            }
        }
        self.advance_feedback(now, fx);
        if !claw.is_done() {
            self.drop = Some(claw);
        }
    }

    fn step_targets(&mut self, now: f64) {
        if let Screen::Solo { targets, .. } | Screen::Versus { targets, .. } = &mut self.screen {
            targets.update(now, &mut self.rng);
        }
    }

    /// Hit test at full depth. Returns how much longer to hold there.
    fn resolve_drop(&mut self, claw: &ClawDrop, now: f64, fx: &mut dyn Effects) -> f64 {
        let (left, right) = claw.bounds();
        match &mut self.screen {
            Screen::Menu => 0.0,
            Screen::Solo { round, targets } => {
                let summary = resolve_solo(round, targets, left, right, &mut self.rng, now, fx);
                if summary.is_some() {
                    self.summary = summary;
                }
                0.0
            }
            Screen::Versus {
                state,
                targets,
                feedback,
            } => {
                let sequence = if targets.hit_test(left, right, &mut self.rng).is_some() {
                    log::debug!("Dodger caught");
                    state.record_hit();
                    audio::play(fx, SoundEffect::VersusHit);
                    LedSequence::gradient(now)
                } else {
                    log::debug!("Dodger escaped");
                    state.record_miss();
                    audio::play(fx, SoundEffect::VersusMiss);
                    LedSequence::red_blink(now)
                };
                fx.render_text(TextField::Level, &ui::own_score_text(state.shooter_score));
                fx.render_text(TextField::Hits, &ui::opponent_score_text(state.dodger_score));
                let hold = sequence.duration();
                *feedback = Some(sequence);
                hold
            }
        }
    }

    /// Play any due feedback frames; restore the score band when done
    fn advance_feedback(&mut self, now: f64, fx: &mut dyn Effects) {
        let Screen::Versus {
            state, feedback, ..
        } = &mut self.screen
        else {
            return;
        };
        let finished = feedback.as_mut().is_some_and(|seq| seq.advance(now, fx));
        if finished {
            *feedback = None;
            leds::show_score_band(fx, state.diff());
        }
    }
}

/// Level, timer, hits and life bar for the start of a level
fn render_level(fx: &mut dyn Effects, round: &RoundState) {
    fx.render_text(TextField::Level, &ui::level_text(round.level_index));
    fx.render_text(TextField::Timer, &ui::timer_text(round.time_limit));
    fx.render_text(TextField::Hits, &round.hits_remaining.to_string());
    fx.render_text(TextField::Message, "");
    if round.mode.has_lives() {
        leds::show_lives(fx, round.lives);
    } else {
        leds::clear(fx);
    }
}

/// Single-player hit resolution. Returns a summary if the round ended.
fn resolve_solo(
    round: &mut RoundState,
    targets: &mut Targets,
    left: i32,
    right: i32,
    rng: &mut Pcg32,
    now: f64,
    fx: &mut dyn Effects,
) -> Option<RoundSummary> {
    if let Some(id) = targets.hit_test(left, right, rng) {
        log::debug!("Caught target {} between x={} and x={}", id, left, right);
        audio::play(fx, SoundEffect::Hit);
        match round.record_hit(now) {
            HitOutcome::Continue => {
                fx.render_text(TextField::Hits, &round.hits_remaining.to_string());
            }
            HitOutcome::LevelUp => {
                log::info!("{} level {} reached", round.mode.name(), round.level_index + 1);
                *targets = Targets::for_level(round.mode, round.level_index, now, rng);
                render_level(fx, round);
                audio::play(fx, SoundEffect::LevelUp);
            }
            HitOutcome::Win => {
                log::info!("{} cleared every level", round.mode.name());
                fx.render_text(TextField::Hits, &round.hits_remaining.to_string());
                fx.render_text(TextField::Message, ui::MSG_WIN);
                return Some(RoundSummary::solo(round));
            }
        }
        return None;
    }

    audio::play(fx, SoundEffect::Miss);
    let outcome = round.record_miss();
    if round.mode.has_lives() {
        leds::show_lives(fx, round.lives);
    }
    if outcome == MissOutcome::GameOver {
        log::info!("{} out of lives on level {}", round.mode.name(), round.level_index + 1);
        fx.render_text(TextField::Message, ui::MSG_GAME_OVER);
        audio::play(fx, SoundEffect::GameOver);
        return Some(RoundSummary::solo(round));
    }
    None
}
