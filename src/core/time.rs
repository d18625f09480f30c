//! Tick timing for the host loop

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Longest step handed to the simulation; longer stalls are clamped.
pub const DEFAULT_MAX_DT: f32 = 0.1;

/// Rolling tick statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TickStats {
    /// Ticks completed over the last second
    pub ticks_per_second: f32,
    /// Mean simulated step over the last second
    pub avg_dt: f32,
    /// Largest simulated step over the last second
    pub max_dt: f32,
    /// Total ticks since the clock was created
    pub tick_count: u64,
}

/// Converts wall-clock frame times into clamped simulation steps
pub struct TickClock {
    last_tick: Instant,
    max_dt: f32,
    last_dt: f32,
    tick_count: u64,
    /// (timestamp, dt) for the rolling window
    history: VecDeque<(Instant, f32)>,
}

impl TickClock {
    pub fn new(max_dt: f32) -> Self {
        Self {
            last_tick: Instant::now(),
            max_dt: max_dt.max(f32::EPSILON),
            last_dt: 0.0,
            tick_count: 0,
            history: VecDeque::new(),
        }
    }

    /// Call once per tick; returns the step to simulate in seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    pub(crate) fn tick_at(&mut self, now: Instant) -> f32 {
        let elapsed = now.saturating_duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.record_at(now, elapsed)
    }

    /// Record a step chosen by the host (fixed-step loops). Returns the clamped step.
    pub fn record(&mut self, dt: f32) -> f32 {
        self.record_at(Instant::now(), dt)
    }

    fn record_at(&mut self, now: Instant, dt: f32) -> f32 {
        let dt = dt.clamp(0.0, self.max_dt);
        self.last_dt = dt;
        self.tick_count += 1;
        self.history.push_back((now, dt));

        // Prune samples older than one second
        if let Some(cutoff) = now.checked_sub(Duration::from_secs(1)) {
            while let Some(&(timestamp, _)) = self.history.front() {
                if timestamp < cutoff {
                    self.history.pop_front();
                } else {
                    break;
                }
            }
        }

        dt
    }

    /// Step returned by the most recent tick
    pub fn last_dt(&self) -> f32 {
        self.last_dt
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Statistics over the last second
    pub fn stats(&self) -> TickStats {
        let count = self.history.len();
        if count == 0 {
            return TickStats { tick_count: self.tick_count, ..Default::default() };
        }

        let total: f32 = self.history.iter().map(|&(_, dt)| dt).sum();
        let max_dt = self.history.iter().map(|&(_, dt)| dt).fold(0.0f32, f32::max);

        TickStats {
            ticks_per_second: count as f32,
            avg_dt: total / count as f32,
            max_dt,
            tick_count: self.tick_count,
        }
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DT)
    }
}
