//! Run control shared between the episode loop and whoever supervises it.
//!
//! All fields are atomics or a [`Notify`], so a [`RunControl`] can sit in an
//! [`Arc`](std::sync::Arc) and be flipped from a signal handler or another
//! task without locking the tick loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

/// Smallest interval accepted by [`RunControl::set_tick_interval_ms`].
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Largest pause between ticks. Longer configured values are capped.
pub const MAX_TICK_INTERVAL_MS: u64 = 60_000;

/// Why an episode ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every survivor was rescued or died.
    AllSurvivorsResolved,
    /// The tick ceiling was reached first.
    MaxTicksReached,
    /// A stop was requested.
    Stopped,
}

impl core::fmt::Display for EndReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::AllSurvivorsResolved => "all survivors resolved",
            Self::MaxTicksReached => "max ticks reached",
            Self::Stopped => "stopped",
        })
    }
}

/// Cooperative controls checked at the top of every tick.
#[derive(Debug)]
pub struct RunControl {
    stop_requested: AtomicBool,
    paused: AtomicBool,
    resume_notify: Notify,
    pacing_notify: Notify,
    tick_interval_ms: AtomicU64,
}

impl RunControl {
    /// Controls with the given pacing between ticks. Zero disables pacing;
    /// anything above [`MAX_TICK_INTERVAL_MS`] is capped.
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            pacing_notify: Notify::new(),
            tick_interval_ms: AtomicU64::new(tick_interval_ms.min(MAX_TICK_INTERVAL_MS)),
        }
    }

    /// Ask the loop to stop before its next tick. Cuts short any pacing
    /// sleep in progress.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
        self.pacing_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Hold the loop before its next tick.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
        self.pacing_notify.notify_one();
    }

    /// Release a paused loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Whether the loop is held.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Wait until resumed or stopped. Returns at once if not paused.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    /// Milliseconds to sleep between ticks.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the pacing. Returns the previous value, or `None` when `ms`
    /// is outside `MIN_TICK_INTERVAL_MS..=MAX_TICK_INTERVAL_MS`.
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if !(MIN_TICK_INTERVAL_MS..=MAX_TICK_INTERVAL_MS).contains(&ms) {
            return None;
        }
        let prev = self.tick_interval_ms.swap(ms, Ordering::AcqRel);
        self.pacing_notify.notify_one();
        Some(prev)
    }

    /// Sleep for the current tick interval. Returns early on a stop, a
    /// pause, or a speed change.
    pub async fn pace(&self) {
        let ms = self.tick_interval_ms();
        if ms == 0 || self.is_stop_requested() {
            return;
        }
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(ms)) => {}
            () = self.pacing_notify.notified() => {}
        }
    }
}

impl Default for RunControl {
    fn default() -> Self {
        Self::new(0)
    }
}
