// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! History notifications.
//!
//! After each step batch the engine captures a [`HistorySnapshot`] and hands
//! it to every registered [`HistorySubscriber`]. Subscribers live behind a
//! trait so the engine never depends on whoever renders or stores the data.

use std::sync::Arc;

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use serde::Serialize;
use tracing::{trace, warn};

use crate::history::HistoryBuffer;
use crate::stimulus::{StimulusChannel, StimulusEvent, StimulusLedger};

/// Gate fractions, index-aligned with [`HistorySnapshot::time`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GatingTrace {
    pub m: Vec<f64>,
    pub h: Vec<f64>,
    pub n: Vec<f64>,
}

/// Everything a consumer needs to draw the trace.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySnapshot {
    pub time: Vec<f64>,
    pub voltage: Vec<f64>,
    pub i_na: Vec<f64>,
    pub i_k: Vec<f64>,
    pub i_l: Vec<f64>,
    pub gating: GatingTrace,
    pub stim1_events: Vec<StimulusEvent>,
    pub stim2_events: Vec<StimulusEvent>,
    /// Set only on the notification emitted by a full reset
    pub reset: bool,
}

impl HistorySnapshot {
    pub fn capture(history: &HistoryBuffer, ledger: &StimulusLedger, reset: bool) -> Self {
        let len = history.len();
        let mut snapshot = HistorySnapshot {
            time: Vec::with_capacity(len),
            voltage: Vec::with_capacity(len),
            i_na: Vec::with_capacity(len),
            i_k: Vec::with_capacity(len),
            i_l: Vec::with_capacity(len),
            gating: GatingTrace {
                m: Vec::with_capacity(len),
                h: Vec::with_capacity(len),
                n: Vec::with_capacity(len),
            },
            stim1_events: ledger.events(StimulusChannel::One).to_vec(),
            stim2_events: ledger.events(StimulusChannel::Two).to_vec(),
            reset,
        };
        for s in history.iter() {
            snapshot.time.push(s.time);
            snapshot.voltage.push(s.voltage);
            snapshot.i_na.push(s.i_na);
            snapshot.i_k.push(s.i_k);
            snapshot.i_l.push(s.i_l);
            snapshot.gating.m.push(s.m);
            snapshot.gating.h.push(s.h);
            snapshot.gating.n.push(s.n);
        }
        snapshot
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Most recent voltage, if any
    pub fn latest_voltage(&self) -> Option<f64> {
        self.voltage.last().copied()
    }
}

/// Receives history snapshots from the engine.
///
/// Called on the thread driving the engine; implementations must not block
/// and must not call back into the same engine.
pub trait HistorySubscriber: Send + Sync {
    fn publish_history(&self, snapshot: &HistorySnapshot) -> Result<(), String>;
}

impl<F> HistorySubscriber for F
where
    F: Fn(&HistorySnapshot) -> Result<(), String> + Send + Sync,
{
    fn publish_history(&self, snapshot: &HistorySnapshot) -> Result<(), String> {
        self(snapshot)
    }
}

/// Forwards snapshots into a bounded channel.
///
/// A full channel is reported as an error instead of blocking the engine.
pub struct ChannelSubscriber {
    sender: Sender<HistorySnapshot>,
}

impl ChannelSubscriber {
    pub fn bounded(capacity: usize) -> (Self, Receiver<HistorySnapshot>) {
        let (sender, receiver) = channel::bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl HistorySubscriber for ChannelSubscriber {
    fn publish_history(&self, snapshot: &HistorySnapshot) -> Result<(), String> {
        match self.sender.try_send(snapshot.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err("subscriber channel full, snapshot dropped".to_string()),
            Err(TrySendError::Disconnected(_)) => {
                Err("subscriber channel disconnected".to_string())
            }
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Registered subscribers in subscription order.
#[derive(Default)]
pub struct SubscriberRegistry {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Arc<dyn HistorySubscriber>)>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: Arc<dyn HistorySubscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, subscriber));
        id
    }

    /// Returns false if `id` was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Deliver to every subscriber. Failures are logged, never propagated.
    /// Returns the number of failed deliveries.
    pub fn publish(&self, snapshot: &HistorySnapshot) -> usize {
        let mut failures = 0;
        for (id, subscriber) in &self.subscribers {
            if let Err(e) = subscriber.publish_history(snapshot) {
                failures += 1;
                warn!("[SIM-ENGINE] ⚠️ Subscriber {:?} failed: {}", id, e);
            }
        }
        trace!(
            "[SIM-ENGINE] Published {} samples to {} subscribers (reset={})",
            snapshot.len(),
            self.subscribers.len(),
            snapshot.reset
        );
        failures
    }
}

impl std::fmt::Debug for SubscriberRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberRegistry")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistorySample;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn small_history() -> HistoryBuffer {
        let mut history = HistoryBuffer::new(10, 0.0);
        for i in 0..3 {
            history.record(HistorySample {
                time: i as f64,
                voltage: -65.0,
                i_na: 1.0,
                i_k: 2.0,
                i_l: 3.0,
                m: 0.1,
                h: 0.6,
                n: 0.3,
            });
        }
        history
    }

    #[test]
    fn test_capture_is_index_aligned() {
        let mut ledger = StimulusLedger::new();
        ledger.apply_event(
            StimulusChannel::Two,
            StimulusEvent::new(-10.0, 2.0, 0.0).unwrap(),
        );
        let snapshot = HistorySnapshot::capture(&small_history(), &ledger, false);

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.voltage.len(), 3);
        assert_eq!(snapshot.gating.n.len(), 3);
        assert_eq!(snapshot.time, vec![0.0, 1.0, 2.0]);
        assert!(snapshot.stim1_events.is_empty());
        assert_eq!(snapshot.stim2_events.len(), 1);
    }

    #[test]
    fn test_snapshot_field_names() {
        let snapshot = HistorySnapshot::capture(&small_history(), &StimulusLedger::new(), true);
        let json = serde_json::to_value(&snapshot).unwrap();
        for key in [
            "time",
            "voltage",
            "iNa",
            "iK",
            "iL",
            "gating",
            "stim1Events",
            "stim2Events",
            "reset",
        ] {
            assert!(json.get(key).is_some(), "missing {}", key);
        }
        assert!(json["gating"].get("m").is_some());
        assert_eq!(json["reset"], serde_json::json!(true));
    }

    #[test]
    fn test_registry_publish_and_unsubscribe() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = SubscriberRegistry::new();

        let counter = calls.clone();
        let id = registry.subscribe(Arc::new(move |_: &HistorySnapshot| -> Result<(), String> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }));
        registry.subscribe(Arc::new(|_: &HistorySnapshot| -> Result<(), String> {
            Err("boom".to_string())
        }));

        let snapshot = HistorySnapshot::default();
        assert_eq!(registry.publish(&snapshot), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        registry.publish(&snapshot);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_channel_subscriber_reports_full() {
        let (subscriber, receiver) = ChannelSubscriber::bounded(1);
        let snapshot = HistorySnapshot::default();

        assert!(subscriber.publish_history(&snapshot).is_ok());
        assert!(subscriber.publish_history(&snapshot).is_err());
        assert!(receiver.try_recv().is_ok());
        assert!(subscriber.publish_history(&snapshot).is_ok());

        drop(receiver);
        assert!(subscriber.publish_history(&snapshot).is_err());
    }
}
