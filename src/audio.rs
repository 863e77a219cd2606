//! Buzzer sound effects
//!
//! Every effect is a short fixed sequence of square-wave tones. The board
//! decides how a tone is produced; the core only picks which ones.

use crate::platform::Effects;

/// A single buzzer tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: u32,
    pub duration_s: f32,
}

const fn tone(frequency_hz: u32, duration_s: f32) -> Tone {
    Tone {
        frequency_hz,
        duration_s,
    }
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Claw closed on a target
    Hit,
    /// Claw came up empty
    Miss,
    /// Out of time or out of lives; also the versus loss jingle
    GameOver,
    /// Level cleared; also the versus win jingle
    LevelUp,
    /// Versus: dodger caught
    VersusHit,
    /// Versus: dodger escaped
    VersusMiss,
}

const HIT: [Tone; 1] = [tone(2400, 0.06)];
const MISS: [Tone; 1] = [tone(500, 0.35)];
const GAME_OVER: [Tone; 3] = [tone(400, 0.15), tone(300, 0.15), tone(200, 0.2)];
const LEVEL_UP: [Tone; 3] = [tone(1500, 0.05), tone(1800, 0.05), tone(2200, 0.07)];

impl SoundEffect {
    pub fn tones(self) -> &'static [Tone] {
        match self {
            // Versus reuses the single-player sounds
            SoundEffect::Hit | SoundEffect::VersusHit => &HIT,
            SoundEffect::Miss | SoundEffect::VersusMiss => &MISS,
            SoundEffect::GameOver => &GAME_OVER,
            SoundEffect::LevelUp => &LEVEL_UP,
        }
    }
}

/// Play a sound effect
pub fn play(fx: &mut dyn Effects, effect: SoundEffect) {
    log::trace!("sfx {:?}", effect);
    for t in effect.tones() {
        fx.play_tone(t.frequency_hz, t.duration_s);
    }
}
