//! Signals observed on the surface that the runner reacts to.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Instant;

static DEPLETION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Acabou a tinta|Out of paint|No more charges").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    ResourceDepleted,
    ChallengeShown,
    ChallengeCleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal {
    pub kind: SignalKind,
    pub at: Instant,
}

/// Whether a notification text announces that the paint resource ran out.
pub fn is_depletion_notice(text: &str) -> bool {
    DEPLETION_RE.is_match(text)
}

/// Maps a notification added to the surface into a signal, if it is one.
pub fn classify_notification(text: &str, at: Instant) -> Option<Signal> {
    is_depletion_notice(text).then_some(Signal {
        kind: SignalKind::ResourceDepleted,
        at,
    })
}

pub trait SignalHandler {
    fn on_signal(&mut self, kind: SignalKind, at: Instant);
}

/// Receiving end of the observation channel.
pub struct SignalFeed {
    rx: Receiver<Signal>,
}

#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: Sender<Signal>,
}

pub fn channel() -> (SignalSender, SignalFeed) {
    let (tx, rx) = mpsc::channel();
    (SignalSender { tx }, SignalFeed { rx })
}

impl SignalSender {
    pub fn send(&self, kind: SignalKind, at: Instant) -> bool {
        self.tx.send(Signal { kind, at }).is_ok()
    }
}

impl SignalFeed {
    /// Hands every queued signal to `handler`. Returns how many were
    /// delivered.
    pub fn drain_into(&self, handler: &mut impl SignalHandler) -> usize {
        let mut delivered = 0;
        loop {
            match self.rx.try_recv() {
                Ok(signal) => {
                    handler.on_signal(signal.kind, signal.at);
                    delivered += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("signal feed disconnected");
                    break;
                }
            }
        }
        delivered
    }
}
