//! Repeating timer polled from the player's event pump.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    /// Next firing instant (None while stopped).
    next_fire: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_fire: None,
        }
    }

    /// Starts the ticker. The first poll fires immediately.
    pub fn start(&mut self, now: Instant) {
        self.next_fire = Some(now);
    }

    pub fn cancel(&mut self) {
        self.next_fire = None;
    }

    pub fn is_active(&self) -> bool {
        self.next_fire.is_some()
    }

    /// Returns true when a tick is due and schedules the next one.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_fire {
            Some(due) if now >= due => {
                self.next_fire = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }
}
