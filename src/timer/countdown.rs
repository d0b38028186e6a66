use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

use super::controller::ControllerEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownKind {
    Work,
    Break,
    Reshow,
}

/// A fire-once timer that posts `ControllerEvent::Elapsed` back to the controller.
///
/// Each kind owns exactly one slot: scheduling replaces (and aborts) whatever was pending.
/// The generation number lets the controller drop an event that was already queued
/// when its countdown got cancelled.
pub struct Countdown {
    kind: CountdownKind,
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl Countdown {
    pub fn new(kind: CountdownKind) -> Self {
        Self {
            kind,
            generation: 0,
            handle: None,
        }
    }

    pub fn schedule(&mut self, after: Duration, tx: &mpsc::UnboundedSender<ControllerEvent>) {
        self.cancel();
        self.generation += 1;
        let kind = self.kind;
        let generation = self.generation;
        let tx = tx.clone();
        self.handle = Some(tokio::spawn(async move {
            sleep(after).await;
            if tx.send(ControllerEvent::Elapsed { kind, generation }).is_err() {
                debug!("{:?} countdown #{} fired after the controller stopped", kind, generation);
            }
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.is_some()
    }

    /// Claims an elapsed event. False means it belongs to a cancelled or replaced countdown.
    pub fn claim(&mut self, generation: u64) -> bool {
        if self.handle.is_some() && generation == self.generation {
            self.handle = None;
            true
        } else {
            false
        }
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
