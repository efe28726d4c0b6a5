//! Traffic-light phase scheduling
//!
//! A fixed-window cycle timer: the scheduler owns the phase state and the
//! simulator only reads right-of-way through `is_green`/`is_yellow`.

use anyhow::{bail, Result};
use log::debug;

use super::types::{Axis, Direction};

/// One of the four fixed windows in the signal cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalPhase {
    NorthSouthGreen,
    /// North-south yellow while east-west stays red
    NorthSouthClearing,
    EastWestGreen,
    /// East-west yellow while north-south stays red
    EastWestClearing,
}

impl SignalPhase {
    pub fn name(self) -> &'static str {
        match self {
            SignalPhase::NorthSouthGreen => "NS green",
            SignalPhase::NorthSouthClearing => "NS clearing",
            SignalPhase::EastWestGreen => "EW green",
            SignalPhase::EastWestClearing => "EW clearing",
        }
    }
}

/// A half-open `[start, end)` slice of the cycle
#[derive(Debug, Clone, Copy)]
pub struct PhaseWindow {
    pub start: f32,
    pub end: f32,
    pub phase: SignalPhase,
}

/// Default cycle length in simulated seconds
pub const DEFAULT_CYCLE_LENGTH: f32 = 20.0;

/// Fixed-duration 4-phase cycle timer
pub struct SignalScheduler {
    windows: Vec<PhaseWindow>,
    cycle_length: f32,
    current_time: f32,
    current_phase: SignalPhase,
    cycle_count: u32,
    running: bool,
}

impl Default for SignalScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalScheduler {
    /// Scheduler with the default 20 second cycle: 0-8 NS green, 8-10
    /// clearing, 10-18 EW green, 18-20 clearing
    pub fn new() -> Self {
        let windows = vec![
            PhaseWindow {
                start: 0.0,
                end: 8.0,
                phase: SignalPhase::NorthSouthGreen,
            },
            PhaseWindow {
                start: 8.0,
                end: 10.0,
                phase: SignalPhase::NorthSouthClearing,
            },
            PhaseWindow {
                start: 10.0,
                end: 18.0,
                phase: SignalPhase::EastWestGreen,
            },
            PhaseWindow {
                start: 18.0,
                end: 20.0,
                phase: SignalPhase::EastWestClearing,
            },
        ];
        Self::from_validated(windows, DEFAULT_CYCLE_LENGTH)
    }

    /// Scheduler with a custom phase partition
    ///
    /// The windows must start at zero, be ordered and contiguous, and have
    /// positive total length; anything else is rejected here so that phase
    /// lookup stays total afterwards.
    pub fn with_phases(windows: Vec<PhaseWindow>) -> Result<Self> {
        if windows.is_empty() {
            bail!("phase windows must not be empty");
        }
        if windows[0].start != 0.0 {
            bail!("first phase window must start at 0");
        }
        let mut expected_start = 0.0;
        for window in &windows {
            if window.start != expected_start {
                bail!(
                    "phase windows must be contiguous: expected start {}, got {}",
                    expected_start,
                    window.start
                );
            }
            if window.end <= window.start {
                bail!(
                    "phase window [{}, {}) must have positive length",
                    window.start,
                    window.end
                );
            }
            expected_start = window.end;
        }
        let cycle_length = expected_start;
        Ok(Self::from_validated(windows, cycle_length))
    }

    fn from_validated(windows: Vec<PhaseWindow>, cycle_length: f32) -> Self {
        let current_phase = windows[0].phase;
        Self {
            windows,
            cycle_length,
            current_time: 0.0,
            current_phase,
            cycle_count: 1,
            running: false,
        }
    }

    /// Begin or resume cycling
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Freeze the cycle at the current phase
    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advance the cycle clock by `wall_delta * acceleration_factor`
    /// simulated seconds and commit the containing phase.
    pub fn update(&mut self, wall_delta: f32, acceleration_factor: f32) {
        if !self.running {
            return;
        }

        self.current_time += wall_delta * acceleration_factor;

        if self.current_time >= self.cycle_length {
            let wraps = (self.current_time / self.cycle_length) as u32;
            self.current_time %= self.cycle_length;
            self.cycle_count += wraps;
        }

        self.commit_phase();
    }

    /// Whether this direction's axis currently has right of way
    pub fn is_green(&self, direction: Direction) -> bool {
        match direction.axis() {
            Axis::NorthSouth => self.current_phase == SignalPhase::NorthSouthGreen,
            Axis::EastWest => self.current_phase == SignalPhase::EastWestGreen,
        }
    }

    /// Whether this direction's axis is in its clearing window
    pub fn is_yellow(&self, direction: Direction) -> bool {
        match direction.axis() {
            Axis::NorthSouth => self.current_phase == SignalPhase::NorthSouthClearing,
            Axis::EastWest => self.current_phase == SignalPhase::EastWestClearing,
        }
    }

    /// Zero the clock and cycle counter and recommit phase 0
    pub fn reset(&mut self) {
        self.current_time = 0.0;
        self.cycle_count = 1;
        self.commit_phase();
    }

    /// Jump the cycle clock; `cycle_length` itself wraps to 0
    pub fn set_time(&mut self, time: f32) {
        let clamped = time.clamp(0.0, self.cycle_length);
        self.current_time = if clamped >= self.cycle_length {
            0.0
        } else {
            clamped
        };
        self.commit_phase();
    }

    pub fn phase(&self) -> SignalPhase {
        self.current_phase
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn cycle_length(&self) -> f32 {
        self.cycle_length
    }

    pub fn cycle_count(&self) -> u32 {
        self.cycle_count
    }

    /// Position within the cycle as a display percentage
    pub fn progress_percent(&self) -> f32 {
        self.current_time / self.cycle_length * 100.0
    }

    fn commit_phase(&mut self) {
        let phase = self.phase_at(self.current_time);
        if phase != self.current_phase {
            self.current_phase = phase;
            debug!("signal phase -> {}", phase.name());
        }
    }

    fn phase_at(&self, time: f32) -> SignalPhase {
        self.windows
            .iter()
            .find(|w| time >= w.start && time < w.end)
            .map(|w| w.phase)
            .expect("phase windows partition the cycle")
    }
}
