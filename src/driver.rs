//! Glue between an input event stream and the trigger engine.
//!
//! [`EventClock`] decides what time each event is processed at, and
//! [`Activation`] keeps the engine running only while the camera app is in
//! the foreground and triggering is not paused.

use crate::activity::ActivityLog;
use crate::clock::{ClockSource, ManualClock, MonotonicClock};
use crate::collector::InputEvent;
use crate::core::{Trigger, TriggerEngine};
use crate::settings::SettingsStore;

/// Drives a [`ManualClock`] from the events of a stream.
///
/// Replayed events are processed at their recorded `at_ms`. Events without
/// one advance the clock by the wall time since the previous event, and in
/// live mode every event takes the wall time. The clock never moves
/// backwards.
pub struct EventClock<W = MonotonicClock> {
    clock: ManualClock,
    wall: W,
    live: bool,
    wall_mark: u64,
}

impl EventClock {
    pub fn new(live: bool) -> Self {
        Self::with_wall(live, MonotonicClock::new())
    }
}

impl<W: ClockSource> EventClock<W> {
    /// Use `wall` in place of the system monotonic clock.
    pub fn with_wall(live: bool, wall: W) -> Self {
        let wall_mark = wall.now_ms();
        Self {
            clock: ManualClock::new(0),
            wall,
            live,
            wall_mark,
        }
    }

    /// A handle to hand to the engine or a calibration session.
    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    /// Move the clock to the time an event with `at_ms` is processed at,
    /// and return that time.
    pub fn stamp(&mut self, at_ms: Option<u64>) -> u64 {
        let wall_now = self.wall.now_ms();
        let current = self.clock.now_ms();
        let next = match (self.live, at_ms) {
            (true, _) => wall_now,
            (false, Some(at_ms)) => at_ms,
            (false, None) => current + wall_now.saturating_sub(self.wall_mark),
        };
        self.wall_mark = wall_now;

        if next < current {
            tracing::warn!("Event at {next} ms is older than {current} ms, keeping clock");
            return current;
        }
        self.clock.set(next);
        next
    }
}

/// Whether the engine should be running.
///
/// The engine runs while the camera app is in the foreground and triggering
/// is not paused. Foreground is assumed until the stream reports otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    paused: bool,
    foreground: bool,
}

impl Activation {
    pub fn new(paused: bool) -> Self {
        Self {
            paused,
            foreground: true,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground
    }

    pub fn wants_active(&self) -> bool {
        self.foreground && !self.paused
    }

    /// Start or stop `engine` to match. Starting always resets detectors.
    pub fn apply<S: SettingsStore, C: ClockSource>(
        &self,
        engine: &mut TriggerEngine<S, C>,
        activity: &ActivityLog,
    ) {
        if self.wants_active() {
            if !engine.is_active() {
                activity.record_activation();
            }
            engine.start();
        } else {
            engine.stop();
        }
    }

    /// Record a pause or resume. Returns false when nothing changed, in which
    /// case the engine is left alone.
    pub fn set_paused<S: SettingsStore, C: ClockSource>(
        &mut self,
        paused: bool,
        engine: &mut TriggerEngine<S, C>,
        activity: &ActivityLog,
    ) -> bool {
        if self.paused == paused {
            return false;
        }
        self.paused = paused;
        self.apply(engine, activity);
        true
    }

    /// Route one input event: foreground changes start or stop the engine,
    /// samples go to the engine.
    pub fn handle_event<S: SettingsStore, C: ClockSource>(
        &mut self,
        event: InputEvent,
        engine: &mut TriggerEngine<S, C>,
        activity: &ActivityLog,
    ) -> Option<Trigger> {
        match event {
            InputEvent::Foreground { active } => {
                self.foreground = active;
                self.apply(engine, activity);
                None
            }
            InputEvent::Sample(sample) => {
                if engine.is_active() {
                    activity.record_sample(sample.kind());
                }
                engine.dispatch(sample)
            }
        }
    }
}
