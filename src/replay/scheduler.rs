//! Cooperative periodic-task scheduler
//!
//! The scheduler is a deadline table, not a thread: the owner asks for the
//! next deadline, sleeps until then, and pops the ticks that are due. Each
//! named slot holds at most one periodic task; installing into a slot
//! replaces the previous task, and every install bumps the slot generation
//! so ticks minted under an older install are recognizably stale.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Independent, cancellable timer slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskSlot {
    Countdown,
    Rotation,
}

/// One due occurrence of a periodic task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub slot: TaskSlot,
    /// Scheduled instant of this occurrence
    pub due: Instant,
    generation: u64,
}

#[derive(Debug, Clone, Copy)]
struct PeriodicTask {
    period: Duration,
    next_due: Instant,
    generation: u64,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    tasks: HashMap<TaskSlot, PeriodicTask>,
    generation: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a periodic task in `slot`, first firing at `now + period`.
    /// Any task already in the slot is cancelled.
    pub fn install(&mut self, slot: TaskSlot, period: Duration, now: Instant) {
        let period = period.max(Duration::from_millis(1));
        self.generation += 1;
        self.tasks.insert(
            slot,
            PeriodicTask {
                period,
                next_due: now + period,
                generation: self.generation,
            },
        );
    }

    /// Returns true if a task was installed in the slot
    pub fn cancel(&mut self, slot: TaskSlot) -> bool {
        self.tasks.remove(&slot).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_active(&self, slot: TaskSlot) -> bool {
        self.tasks.contains_key(&slot)
    }

    pub fn period(&self, slot: TaskSlot) -> Option<Duration> {
        self.tasks.get(&slot).map(|task| task.period)
    }

    /// Earliest instant at which any task is due
    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.values().map(|task| task.next_due).min()
    }

    /// Pop the earliest tick due at or before `now` and reschedule its task.
    ///
    /// Ties are broken by slot order, so a countdown tick always runs before
    /// a rotation tick due at the same instant.
    pub fn pop_due(&mut self, now: Instant) -> Option<Tick> {
        let (slot, task) = self
            .tasks
            .iter_mut()
            .filter(|(_, task)| task.next_due <= now)
            .min_by_key(|(slot, task)| (task.next_due, **slot))?;

        let tick = Tick {
            slot: *slot,
            due: task.next_due,
            generation: task.generation,
        };
        task.next_due += task.period;
        Some(tick)
    }

    /// Whether the task that produced `tick` is still installed
    pub fn is_current(&self, tick: &Tick) -> bool {
        self.tasks
            .get(&tick.slot)
            .map(|task| task.generation == tick.generation)
            .unwrap_or(false)
    }
}
