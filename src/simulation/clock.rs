//! Simulated/real time bookkeeping
//!
//! Converts wall-clock tick deltas into simulated seconds through the
//! acceleration factor and tracks progress against a real-time budget.

use log::warn;

/// Default run: two simulated hours in thirty real seconds
pub const DEFAULT_SIMULATED_TOTAL: f32 = 2.0 * 3600.0;
pub const DEFAULT_REAL_TOTAL: f32 = 30.0;

/// The simulated/real/acceleration-factor triple for a run
pub struct SimulationClock {
    simulated_total: f32,
    real_total: f32,
    time_factor: f32,
    real_elapsed: f32,
    simulated_elapsed: f32,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationClock {
    pub fn new() -> Self {
        Self {
            simulated_total: DEFAULT_SIMULATED_TOTAL,
            real_total: DEFAULT_REAL_TOTAL,
            time_factor: DEFAULT_SIMULATED_TOTAL / DEFAULT_REAL_TOTAL,
            real_elapsed: 0.0,
            simulated_elapsed: 0.0,
        }
    }

    /// Replace the time triple and restart both elapsed counters.
    /// Negative inputs are clamped to zero.
    pub fn configure(&mut self, simulated_total: f32, real_total: f32, time_factor: f32) {
        if simulated_total < 0.0 || real_total < 0.0 || time_factor < 0.0 {
            warn!(
                "negative time configuration ({}, {}, {}) clamped to zero",
                simulated_total, real_total, time_factor
            );
        }
        self.simulated_total = simulated_total.max(0.0);
        self.real_total = real_total.max(0.0);
        self.time_factor = time_factor.max(0.0);
        self.reset();
    }

    /// Account one wall-clock tick; returns the simulated delta it covers
    pub fn advance(&mut self, wall_delta: f32) -> f32 {
        let wall = wall_delta.max(0.0);
        self.real_elapsed += wall;
        let simulated = wall * self.time_factor;
        self.simulated_elapsed += simulated;
        simulated
    }

    /// Zero both elapsed counters, keeping the configuration
    pub fn reset(&mut self) {
        self.real_elapsed = 0.0;
        self.simulated_elapsed = 0.0;
    }

    pub fn is_finished(&self) -> bool {
        self.real_elapsed >= self.real_total
    }

    pub fn real_elapsed(&self) -> f32 {
        self.real_elapsed
    }

    pub fn simulated_elapsed(&self) -> f32 {
        self.simulated_elapsed
    }

    pub fn simulated_total(&self) -> f32 {
        self.simulated_total
    }

    pub fn time_factor(&self) -> f32 {
        self.time_factor
    }

    /// Progress through the real-time budget as a display percentage
    pub fn progress_percent(&self) -> f32 {
        if self.real_total <= 0.0 {
            return 100.0;
        }
        (self.real_elapsed / self.real_total * 100.0).min(100.0)
    }
}
