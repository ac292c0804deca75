use instant::Instant;

/// Which phase of the simulation tick is being timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SystemPhase {
    Player = 0,
    Scene = 1,
    Behavior = 2,
    Perception = 3,
    Scan = 4,
    Movement = 5,
}

impl SystemPhase {
    pub const ALL: [SystemPhase; 6] = [
        Self::Player,
        Self::Scene,
        Self::Behavior,
        Self::Perception,
        Self::Scan,
        Self::Movement,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Scene => "Scene",
            Self::Behavior => "Behavior",
            Self::Perception => "Perception",
            Self::Scan => "Scan",
            Self::Movement => "Movement",
        }
    }
}

/// Per-system timing with exponential moving average smoothing.
pub struct SystemTimers {
    /// EMA-smoothed duration in microseconds per phase.
    pub durations_us: [f64; 6],
    /// Timestamp when `begin()` was called.
    start: Instant,
}

const EMA_ALPHA: f64 = 0.1;

impl SystemTimers {
    pub fn new() -> Self {
        Self {
            durations_us: [0.0; 6],
            start: Instant::now(),
        }
    }

    /// Call before a system runs.
    pub fn begin(&mut self) {
        self.start = Instant::now();
    }

    /// Call after a system finishes. Records elapsed time for `phase`.
    pub fn end(&mut self, phase: SystemPhase) {
        let elapsed_us = self.start.elapsed().as_secs_f64() * 1_000_000.0;
        let idx = phase as usize;
        self.durations_us[idx] =
            self.durations_us[idx] * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA;
    }

    /// Sum of all phase durations (microseconds).
    pub fn total_us(&self) -> f64 {
        self.durations_us.iter().sum()
    }

    /// One-line breakdown for the periodic summary log.
    pub fn summary(&self) -> String {
        SystemPhase::ALL
            .iter()
            .map(|&phase| format!("{} {:.1}us", phase.label(), self.durations_us[phase as usize]))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}
