//! Callback channel between an engine and its backend player.
//!
//! The player hands a [`SignalSender`] to its engine when it loads a track.
//! [`SignalChannel::reset`] swaps in a fresh channel and drops the old
//! receiver, so every sender issued before the reset becomes inert: late
//! completions from a cleared attempt are discarded instead of being applied
//! to the next track.

use crossbeam_channel::{Receiver, Sender, unbounded};

#[derive(Debug)]
pub struct SignalChannel<S> {
    tx: Sender<S>,
    rx: Receiver<S>,
}

impl<S> Default for SignalChannel<S> {
    fn default() -> Self {
        let (tx, rx) = unbounded::<S>();
        Self { tx, rx }
    }
}

impl<S> SignalChannel<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> SignalSender<S> {
        SignalSender {
            tx: self.tx.clone(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn drain(&self) -> Vec<S> {
        self.rx.try_iter().collect()
    }
}

/// Engine-side handle. Cheap to clone.
#[derive(Debug)]
pub struct SignalSender<S> {
    tx: Sender<S>,
}

impl<S> Clone for SignalSender<S> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S> SignalSender<S> {
    /// Returns false when the owning player has since been cleared.
    pub fn send(&self, signal: S) -> bool {
        self.tx.send(signal).is_ok()
    }
}
