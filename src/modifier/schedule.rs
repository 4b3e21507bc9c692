//! Start/update/end bookkeeping shared by every modifier

use super::ModifierContext;

/// Lifecycle phase of a scheduled modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Inactive,
    Active,
    Ended,
}

/// How often an active modifier wants an update between start and end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cadence {
    /// Only at start and end.
    Never,
    /// Every step.
    EveryStep,
    /// Every this many epochs, rounded to whole steps.
    Epochs(f64),
}

impl Cadence {
    /// Cadence for an `update_frequency` field; `<= 0` disables periodic updates.
    pub fn from_frequency(update_frequency: f64) -> Self {
        if update_frequency > 0.0 {
            Cadence::Epochs(update_frequency)
        } else {
            Cadence::Never
        }
    }

    /// Like [`Cadence::from_frequency`], but `<= 0` means every step.
    pub fn from_frequency_or_every_step(update_frequency: f64) -> Self {
        if update_frequency > 0.0 {
            Cadence::Epochs(update_frequency)
        } else {
            Cadence::EveryStep
        }
    }
}

/// What [`ScheduleTracker::mark_update`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transition {
    pub started: bool,
    pub ended: bool,
}

/// Decides when a modifier is due and tracks its phase.
///
/// A negative `start_epoch` starts at the first update check; a negative
/// `end_epoch` never ends.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleTracker {
    start_epoch: f64,
    end_epoch: f64,
    cadence: Cadence,
    phase: Phase,
    last_update_step: Option<i64>,
}

impl ScheduleTracker {
    pub fn new(start_epoch: f64, end_epoch: f64, cadence: Cadence) -> Self {
        Self {
            start_epoch,
            end_epoch,
            cadence,
            phase: Phase::Inactive,
            last_update_step: None,
        }
    }

    pub fn start_epoch(&self) -> f64 {
        self.start_epoch
    }

    pub fn end_epoch(&self) -> f64 {
        self.end_epoch
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn has_started(&self) -> bool {
        self.phase != Phase::Inactive
    }

    pub fn start_due(&self, ctx: &ModifierContext) -> bool {
        self.start_epoch < 0.0 || ctx.step() >= ctx.epoch_to_step(self.start_epoch)
    }

    pub fn end_due(&self, ctx: &ModifierContext) -> bool {
        self.end_epoch >= 0.0 && ctx.step() >= ctx.epoch_to_step(self.end_epoch)
    }

    fn periodic_due(&self, ctx: &ModifierContext) -> bool {
        let step = ctx.step();
        match (self.cadence, self.last_update_step) {
            (Cadence::Never, _) => false,
            (_, None) => true,
            (Cadence::EveryStep, Some(last)) => step > last,
            (Cadence::Epochs(freq), Some(last)) => step >= last + ctx.frequency_steps(freq),
        }
    }

    /// Whether the modifier should run a scheduled update at `ctx`.
    pub fn update_ready(&self, ctx: &ModifierContext) -> bool {
        match self.phase {
            Phase::Inactive => self.start_due(ctx),
            Phase::Active => self.end_due(ctx) || self.periodic_due(ctx),
            Phase::Ended => false,
        }
    }

    /// Record an update at `ctx` and advance the phase.
    pub fn mark_update(&mut self, ctx: &ModifierContext) -> Transition {
        let started = self.phase == Phase::Inactive;
        if started {
            self.phase = Phase::Active;
        }
        let ended = self.phase == Phase::Active && self.end_due(ctx);
        if ended {
            self.phase = Phase::Ended;
        }
        self.last_update_step = Some(ctx.step());
        Transition { started, ended }
    }

    /// Jump straight to the ended phase.
    pub fn force_end(&mut self) {
        self.phase = Phase::Ended;
    }
}
