//! The timer pool.
//!
//! A fixed set of reusable slots. Starting a timer claims the first
//! free slot or refuses outright; expiry frees the slot and hands the
//! event back to the caller for dispatch. Timers are polled once per
//! frame by the subsystem, never from inside an in-progress
//! interpretation, so firing cannot re-enter the VM.

use thiserror::Error;
use tracing::warn;

use statescript_core::EntityId;
use statescript_vm::ParamBag;

/// Starting a timer with every slot occupied.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerError {
    #[error("timer pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },
}

/// Who receives the timer's event when it fires.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TimerTarget {
    Entity(EntityId),
    Broadcast,
}

#[derive(Clone, Debug)]
struct TimerSlot {
    active: bool,
    remaining: f32,
    event: String,
    target: TimerTarget,
    params: ParamBag,
}

impl Default for TimerSlot {
    fn default() -> Self {
        Self {
            active: false,
            remaining: 0.0,
            event: String::new(),
            target: TimerTarget::Broadcast,
            params: ParamBag::new(),
        }
    }
}

/// A timer that elapsed during a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct FiredTimer {
    pub event: String,
    pub target: TimerTarget,
    pub params: ParamBag,
}

/// Fixed-capacity pool of one-shot timers.
#[derive(Debug)]
pub struct TimerPool {
    slots: Vec<TimerSlot>,
}

impl TimerPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![TimerSlot::default(); capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    /// Claim a free slot. Returns the slot index, or refuses when the
    /// pool is full.
    pub fn start(
        &mut self,
        duration: f32,
        event: impl Into<String>,
        target: TimerTarget,
        params: ParamBag,
    ) -> Result<usize, TimerError> {
        let Some((index, slot)) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, s)| !s.active)
        else {
            let capacity = self.slots.len();
            warn!(capacity, "timer pool exhausted, refusing timer");
            return Err(TimerError::PoolExhausted { capacity });
        };
        slot.active = true;
        slot.remaining = duration;
        slot.event = event.into();
        slot.target = target;
        slot.params = params;
        Ok(index)
    }

    /// Advance all active timers, collecting those that elapsed. Fired
    /// slots are freed and their parameter bags cleared.
    pub fn tick(&mut self, dt: f32) -> Vec<FiredTimer> {
        let mut fired = Vec::new();
        for slot in &mut self.slots {
            if !slot.active {
                continue;
            }
            slot.remaining -= dt;
            if slot.remaining <= 0.0 {
                slot.active = false;
                fired.push(FiredTimer {
                    event: std::mem::take(&mut slot.event),
                    target: slot.target,
                    params: std::mem::take(&mut slot.params),
                });
            }
        }
        fired
    }

    /// Cancel every pending timer targeting `entity`, returning how
    /// many were cancelled. Runs when the entity is destroyed so no
    /// timer fires at a dead target.
    pub fn cancel_for(&mut self, entity: EntityId) -> usize {
        let mut cancelled = 0;
        for slot in &mut self.slots {
            if slot.active && slot.target == TimerTarget::Entity(entity) {
                slot.active = false;
                slot.event.clear();
                slot.params.clear();
                cancelled += 1;
            }
        }
        cancelled
    }

    /// Halt every timer without firing anything.
    pub fn stop_all(&mut self) {
        for slot in &mut self.slots {
            slot.active = false;
            slot.event.clear();
            slot.params.clear();
        }
    }
}
