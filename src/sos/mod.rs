//! Morse SOS blink pattern
//!
//! [`SosSequence`] is the pure timeline: three short, three long and three
//! short flashes, expressed as a list of light phases. [`SosPlayer`] walks it
//! on a background thread.

mod player;

use embassy_time::Duration;

pub use player::SosPlayer;

/// Flashes per Morse letter.
const MARKS_PER_LETTER: usize = 3;

/// Letters in "SOS".
const LETTERS: usize = 3;

/// Number of light phases in one SOS sequence.
pub const SOS_STEP_COUNT: usize = LETTERS * MARKS_PER_LETTER * 2 + (LETTERS - 1);

/// Timing of the SOS pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SosTimings {
    /// On time of a short flash
    pub dot: Duration,
    /// On time of a long flash
    pub dash: Duration,
    /// Off time after every flash
    pub element_gap: Duration,
    /// Extra off time between letters
    pub letter_gap: Duration,
}

impl SosTimings {
    pub const DEFAULT: Self = Self {
        dot: Duration::from_millis(200),
        dash: Duration::from_millis(600),
        element_gap: Duration::from_millis(200),
        letter_gap: Duration::from_millis(400),
    };
}

impl Default for SosTimings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// One light phase: hold the torch `lit` (or dark) for `hold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SosStep {
    pub lit: bool,
    pub hold: Duration,
}

impl SosStep {
    const fn on(hold: Duration) -> Self {
        Self { lit: true, hold }
    }

    const fn off(hold: Duration) -> Self {
        Self { lit: false, hold }
    }
}

/// Complete SOS timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SosSequence {
    steps: [SosStep; SOS_STEP_COUNT],
}

impl SosSequence {
    pub fn new(timings: &SosTimings) -> Self {
        let mut steps = [SosStep::off(timings.letter_gap); SOS_STEP_COUNT];
        let mut cursor = 0;

        for letter in 0..LETTERS {
            // The middle letter is the "O"
            let mark = if letter == 1 {
                timings.dash
            } else {
                timings.dot
            };
            for _ in 0..MARKS_PER_LETTER {
                steps[cursor] = SosStep::on(mark);
                steps[cursor + 1] = SosStep::off(timings.element_gap);
                cursor += 2;
            }
            if letter + 1 < LETTERS {
                steps[cursor] = SosStep::off(timings.letter_gap);
                cursor += 1;
            }
        }

        Self { steps }
    }

    pub fn steps(&self) -> &[SosStep] {
        &self.steps
    }

    /// Time from the first flash to the end of the last phase
    pub fn total_duration(&self) -> Duration {
        self.steps
            .iter()
            .fold(Duration::from_millis(0), |total, step| total + step.hold)
    }

    /// Longest single phase, which bounds how late a cancellation is observed
    pub fn longest_step(&self) -> Duration {
        self.steps
            .iter()
            .map(|step| step.hold)
            .max()
            .unwrap_or(Duration::from_millis(0))
    }

    /// Torch state `elapsed` after the sequence started.
    ///
    /// Returns `None` once the sequence is over. Lets a host drive the
    /// pattern from its own frame loop instead of the player thread.
    pub fn light_at(&self, elapsed: Duration) -> Option<bool> {
        let mut phase_end = Duration::from_millis(0);
        for step in &self.steps {
            phase_end += step.hold;
            if elapsed < phase_end {
                return Some(step.lit);
            }
        }
        None
    }
}

impl Default for SosSequence {
    fn default() -> Self {
        Self::new(&SosTimings::DEFAULT)
    }
}
