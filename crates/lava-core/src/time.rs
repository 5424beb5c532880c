//! Playback timing.
//!
//! The host presentation clock fires at whatever rate the platform provides
//! (typically display refresh), while the animation plays at the manifest's
//! fps. [`FrameClock`] gates host ticks down to the animation rate with
//! phase-corrected scheduling, so late or skipped callbacks do not accumulate
//! drift over long runs.

/// Outcome of feeding one host tick to a [`FrameClock`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Less than one frame duration has elapsed; nothing to decode.
    Hold,
    /// First tick since the clock was armed; render the current frame
    /// without advancing.
    Start,
    /// At least one frame duration has elapsed; advance exactly one frame.
    Step,
}

/// Converts a variable-rate monotonic clock into fixed-rate frame steps.
///
/// Timestamps are monotonic milliseconds. A tick qualifies when at least
/// `1000/fps` ms have passed since the last qualifying tick; the last-tick
/// time is then rewound by the elapsed remainder (`now - elapsed % duration`)
/// so the next frame is scheduled relative to the ideal grid rather than the
/// actual callback time. A qualifying tick steps exactly one frame even when
/// several durations have elapsed: diff frames depend on the immediately
/// preceding composite state, so under clock starvation playback falls behind
/// real time instead of skipping frames.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_duration_ms: f64,
    last_tick_ms: Option<f64>,
}

impl FrameClock {
    /// Create a clock for the given frame rate. `fps` must be positive
    /// (validated at manifest load).
    pub fn new(fps: u32) -> Self {
        Self {
            frame_duration_ms: 1000.0 / fps as f64,
            last_tick_ms: None,
        }
    }

    /// Duration of one frame in milliseconds.
    pub fn frame_duration_ms(&self) -> f64 {
        self.frame_duration_ms
    }

    /// Feed one host tick at monotonic time `now_ms`.
    pub fn tick(&mut self, now_ms: f64) -> Tick {
        let last = match self.last_tick_ms {
            Some(last) => last,
            None => {
                self.last_tick_ms = Some(now_ms);
                return Tick::Start;
            }
        };

        let elapsed = now_ms - last;
        if elapsed < self.frame_duration_ms {
            return Tick::Hold;
        }

        self.last_tick_ms = Some(now_ms - elapsed % self.frame_duration_ms);
        Tick::Step
    }
}
