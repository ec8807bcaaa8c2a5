//! Interval-boundary chime scheduling for the stopwatch.
//!
//! The chime grid lives on *elapsed* time, so pauses stretch the wall-clock
//! gap between chimes without moving the boundaries themselves. The armed
//! single-shot is always recomputed from the actual elapsed reading, never
//! assumed exact, which absorbs timer drift.

/// Tuning for boundary-edge handling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChimeConfig {
    /// How close to a boundary (either side, in milliseconds) still counts
    /// as "on it": a wake landing inside this window fires immediately
    /// instead of arming a zero-or-negative timer. Beyond it on the late
    /// side the boundary is stale and is skipped without sounding.
    pub edge_tolerance_ms: f64,
}

impl Default for ChimeConfig {
    fn default() -> Self {
        Self { edge_tolerance_ms: 50.0 }
    }
}

/// Decision produced when (re)arming the chime shot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ChimeArm {
    /// No interval configured; nothing to schedule.
    Disabled,
    /// Arm a single-shot for this many milliseconds.
    After(f64),
    /// The boundary is due: fire now, then arm again.
    FireNow,
    /// Hopelessly late; the target was skipped forward — arm again.
    Stale,
}

/// Cursor over the chime grid.
///
/// Invariant: `next_target_ms` is the smallest grid point at or after the
/// last consumed boundary; it is recomputed from current elapsed time after
/// every discontinuity and never left stale.
#[derive(Clone, Copy, Debug)]
pub struct ChimeScheduler {
    config: ChimeConfig,
    /// Grid spacing in milliseconds; 0 disables the chime.
    interval_ms: f64,
    /// Next boundary in elapsed milliseconds; infinity when disabled.
    next_target_ms: f64,
}

impl ChimeScheduler {
    pub fn new(config: ChimeConfig) -> Self {
        Self { config, interval_ms: 0.0, next_target_ms: f64::INFINITY }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn is_enabled(&self) -> bool {
        self.interval_ms > 0.0
    }

    pub fn next_target_ms(&self) -> f64 {
        self.next_target_ms
    }

    /// Change the interval. Zero, negative, or absent disables the chime;
    /// otherwise the target snaps to the next boundary of the *new* grid
    /// past the current elapsed time.
    pub fn set_interval(&mut self, interval_secs: Option<f64>, elapsed_ms: f64) {
        match interval_secs {
            Some(secs) if secs.is_finite() && secs > 0.0 => {
                self.interval_ms = secs * 1000.0;
                self.next_target_ms = next_boundary(elapsed_ms, self.interval_ms);
            }
            _ => {
                self.interval_ms = 0.0;
                self.next_target_ms = f64::INFINITY;
            }
        }
    }

    /// Forget the pending target (reset/seek); the next `arm` recomputes it.
    pub fn invalidate(&mut self) {
        self.next_target_ms = f64::INFINITY;
    }

    /// Decide how to schedule the next fire from the current elapsed time.
    pub fn arm(&mut self, elapsed_ms: f64) -> ChimeArm {
        if !self.is_enabled() {
            return ChimeArm::Disabled;
        }
        if !self.next_target_ms.is_finite() {
            self.next_target_ms = next_boundary(elapsed_ms, self.interval_ms);
        }
        let delay = self.next_target_ms - elapsed_ms;
        if delay > self.config.edge_tolerance_ms {
            ChimeArm::After(delay)
        } else if delay >= -self.config.edge_tolerance_ms {
            ChimeArm::FireNow
        } else {
            self.next_target_ms = next_boundary(elapsed_ms, self.interval_ms);
            ChimeArm::Stale
        }
    }

    /// Consume the armed boundary after a fire. The next target is derived
    /// from the actual elapsed reading (or the boundary itself if the fire
    /// came in early) so drift never accumulates.
    pub fn fired(&mut self, elapsed_ms: f64) {
        let consumed = if self.next_target_ms.is_finite() {
            elapsed_ms.max(self.next_target_ms)
        } else {
            elapsed_ms
        };
        self.next_target_ms = next_boundary(consumed, self.interval_ms);
    }
}

/// Smallest grid point strictly after `elapsed_ms`.
fn next_boundary(elapsed_ms: f64, interval_ms: f64) -> f64 {
    (libm::floor(elapsed_ms / interval_ms) + 1.0) * interval_ms
}
