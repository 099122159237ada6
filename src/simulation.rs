//! Pausable simulation clock.
//!
//! [`Simulation`] is a small value type: the render loop passes the current
//! state into each frame's update and keeps whatever comes back. Time only
//! accumulates while running, so every body freezes at the same instant when
//! paused and picks up from exactly that instant when resumed.
//!
//! ```
//! use orrery::Simulation;
//!
//! let sim = Simulation::new().advance(1.0).toggled().advance(5.0);
//! assert!(!sim.is_running());
//! assert_eq!(sim.time(), 1.0);
//!
//! let sim = sim.toggled().advance(0.5);
//! assert_eq!(sim.time(), 1.5);
//! ```

/// Running flag plus accumulated simulation time in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Simulation {
    running: bool,
    time: f32,
}

impl Default for Simulation {
    fn default() -> Self {
        Self {
            running: true,
            time: 0.0,
        }
    }
}

impl Simulation {
    /// A running simulation at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// A paused simulation at time zero.
    pub fn paused() -> Self {
        Self {
            running: false,
            time: 0.0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Simulation time fed to the transform pipeline.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Returns the state after `dt` seconds of wall-clock time.
    ///
    /// Negative or non-finite deltas are treated as zero.
    #[must_use]
    pub fn advance(self, dt: f32) -> Self {
        if !self.running || !dt.is_finite() || dt <= 0.0 {
            return self;
        }
        Self {
            time: self.time + dt,
            ..self
        }
    }

    /// Returns the state with the running flag flipped.
    #[must_use]
    pub fn toggled(self) -> Self {
        Self {
            running: !self.running,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_accumulates_time() {
        let sim = Simulation::new().advance(0.25).advance(0.5);
        assert!(sim.is_running());
        assert_eq!(sim.time(), 0.75);
    }

    #[test]
    fn paused_time_is_frozen() {
        let frozen = Simulation::new().advance(2.0).toggled();
        let mut sim = frozen;
        for _ in 0..100 {
            sim = sim.advance(1.0 / 60.0);
            assert_eq!(sim.time().to_bits(), frozen.time().to_bits());
        }
    }

    #[test]
    fn resume_continues_from_frozen_time() {
        let before = Simulation::new().advance(3.0);
        let resumed = before.toggled().advance(10.0).toggled();
        assert_eq!(resumed.time(), before.time());
        assert_eq!(resumed.advance(0.1).time(), 3.1);
    }

    #[test]
    fn ignores_bad_deltas() {
        let sim = Simulation::new().advance(1.0);
        assert_eq!(sim.advance(-1.0), sim);
        assert_eq!(sim.advance(f32::NAN), sim);
        assert_eq!(sim.advance(f32::INFINITY), sim);
    }

    #[test]
    fn starts_paused_on_request() {
        let sim = Simulation::paused().advance(1.0);
        assert!(!sim.is_running());
        assert_eq!(sim.time(), 0.0);
    }
}
