//! Outbound channels for filter results
//!
//! A [`DispatchSink`] is the pair of destinations a filter emits to: `forward`
//! for accepted messages and `reject` for diagnostics. Decorators add logging
//! and metrics around any other sink.

use crate::message::OscMessage;
use metrics::{counter, describe_counter};
use parking_lot::Mutex;
use std::sync::Once;
use tracing::{debug, trace};

/// Destination for filter emissions
pub trait DispatchSink: Send + Sync {
    /// Receive an accepted message, unchanged
    fn forward(&self, msg: OscMessage);

    /// Receive a rejection diagnostic
    fn reject(&self, diagnostic: String);
}

impl<S: DispatchSink + ?Sized> DispatchSink for &S {
    fn forward(&self, msg: OscMessage) {
        (**self).forward(msg)
    }

    fn reject(&self, diagnostic: String) {
        (**self).reject(diagnostic)
    }
}

impl<S: DispatchSink + ?Sized> DispatchSink for std::sync::Arc<S> {
    fn forward(&self, msg: OscMessage) {
        (**self).forward(msg)
    }

    fn reject(&self, diagnostic: String) {
        (**self).reject(diagnostic)
    }
}

impl<S: DispatchSink + ?Sized> DispatchSink for Box<S> {
    fn forward(&self, msg: OscMessage) {
        (**self).forward(msg)
    }

    fn reject(&self, diagnostic: String) {
        (**self).reject(diagnostic)
    }
}

/// Receiving ends of a [`ChannelSink`]
#[derive(Debug, Clone)]
pub struct ChannelReceivers {
    pub accepted: flume::Receiver<OscMessage>,
    pub rejected: flume::Receiver<String>,
}

/// Sink backed by two flume channels
#[derive(Debug, Clone)]
pub struct ChannelSink {
    accepted: flume::Sender<OscMessage>,
    rejected: flume::Sender<String>,
}

impl ChannelSink {
    pub fn new(accepted: flume::Sender<OscMessage>, rejected: flume::Sender<String>) -> Self {
        Self { accepted, rejected }
    }

    /// Sink over a fresh pair of unbounded channels
    pub fn unbounded() -> (Self, ChannelReceivers) {
        let (accept_tx, accept_rx) = flume::unbounded();
        let (reject_tx, reject_rx) = flume::unbounded();
        (
            Self::new(accept_tx, reject_tx),
            ChannelReceivers {
                accepted: accept_rx,
                rejected: reject_rx,
            },
        )
    }

    /// Sink over a fresh pair of bounded channels; emitting blocks while full
    pub fn bounded(capacity: usize) -> (Self, ChannelReceivers) {
        let (accept_tx, accept_rx) = flume::bounded(capacity);
        let (reject_tx, reject_rx) = flume::bounded(capacity);
        (
            Self::new(accept_tx, reject_tx),
            ChannelReceivers {
                accepted: accept_rx,
                rejected: reject_rx,
            },
        )
    }
}

impl DispatchSink for ChannelSink {
    fn forward(&self, msg: OscMessage) {
        if let Err(flume::SendError(msg)) = self.accepted.send(msg) {
            debug!(address = %msg.address_str(), "Accept channel closed, dropping message");
        }
    }

    fn reject(&self, diagnostic: String) {
        if let Err(flume::SendError(diagnostic)) = self.rejected.send(diagnostic) {
            debug!(%diagnostic, "Reject channel closed, dropping diagnostic");
        }
    }
}

/// Sink that calls one closure per channel
pub struct CallbackSink<F, G> {
    on_forward: F,
    on_reject: G,
}

impl<F, G> CallbackSink<F, G>
where
    F: Fn(OscMessage) + Send + Sync,
    G: Fn(String) + Send + Sync,
{
    pub fn new(on_forward: F, on_reject: G) -> Self {
        Self {
            on_forward,
            on_reject,
        }
    }
}

impl<F, G> DispatchSink for CallbackSink<F, G>
where
    F: Fn(OscMessage) + Send + Sync,
    G: Fn(String) + Send + Sync,
{
    fn forward(&self, msg: OscMessage) {
        (self.on_forward)(msg)
    }

    fn reject(&self, diagnostic: String) {
        (self.on_reject)(diagnostic)
    }
}

/// One recorded emission
#[derive(Debug, Clone, PartialEq)]
pub enum Emission {
    Forward(OscMessage),
    Reject(String),
}

/// Sink that records every emission in order
#[derive(Debug, Default)]
pub struct CollectingSink {
    emissions: Mutex<Vec<Emission>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn emissions(&self) -> Vec<Emission> {
        self.emissions.lock().clone()
    }

    /// Drain everything recorded so far
    pub fn take(&self) -> Vec<Emission> {
        std::mem::take(&mut *self.emissions.lock())
    }

    pub fn forwarded(&self) -> Vec<OscMessage> {
        self.emissions
            .lock()
            .iter()
            .filter_map(|e| match e {
                Emission::Forward(msg) => Some(msg.clone()),
                Emission::Reject(_) => None,
            })
            .collect()
    }

    pub fn rejected(&self) -> Vec<String> {
        self.emissions
            .lock()
            .iter()
            .filter_map(|e| match e {
                Emission::Reject(d) => Some(d.clone()),
                Emission::Forward(_) => None,
            })
            .collect()
    }
}

impl DispatchSink for CollectingSink {
    fn forward(&self, msg: OscMessage) {
        self.emissions.lock().push(Emission::Forward(msg));
    }

    fn reject(&self, diagnostic: String) {
        self.emissions.lock().push(Emission::Reject(diagnostic));
    }
}

/// Logs emissions through `tracing` at trace and debug level, then delegates
#[derive(Debug, Clone)]
pub struct TracingSink<S> {
    inner: S,
}

impl<S: DispatchSink> TracingSink<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DispatchSink> DispatchSink for TracingSink<S> {
    fn forward(&self, msg: OscMessage) {
        trace!(address = %msg.address_str(), args = msg.args.len(), "Message accepted");
        self.inner.forward(msg);
    }

    fn reject(&self, diagnostic: String) {
        debug!(%diagnostic, "Message rejected");
        self.inner.reject(diagnostic);
    }
}

/// Counter name for accepted messages
pub const ACCEPTED_COUNTER: &str = "mrposc_messages_accepted_total";
/// Counter name for rejected messages
pub const REJECTED_COUNTER: &str = "mrposc_messages_rejected_total";

static DESCRIBE_METRICS: Once = Once::new();

/// Counts emissions through the `metrics` facade, then delegates
#[derive(Debug, Clone)]
pub struct MetricsSink<S> {
    inner: S,
}

impl<S: DispatchSink> MetricsSink<S> {
    pub fn new(inner: S) -> Self {
        DESCRIBE_METRICS.call_once(|| {
            describe_counter!(ACCEPTED_COUNTER, "Messages forwarded on the accept channel");
            describe_counter!(REJECTED_COUNTER, "Diagnostics sent on the reject channel");
        });
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: DispatchSink> DispatchSink for MetricsSink<S> {
    fn forward(&self, msg: OscMessage) {
        counter!(ACCEPTED_COUNTER).increment(1);
        self.inner.forward(msg);
    }

    fn reject(&self, diagnostic: String) {
        counter!(REJECTED_COUNTER).increment(1);
        self.inner.reject(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_channel_sink() {
        let (sink, rx) = ChannelSink::unbounded();

        sink.forward(osc!("/midi", 144, 90, 60));
        sink.reject("invalid path: /nope".to_string());

        assert_eq!(rx.accepted.try_recv().unwrap(), osc!("/midi", 144, 90, 60));
        assert_eq!(rx.rejected.try_recv().unwrap(), "invalid path: /nope");
        assert!(rx.accepted.try_recv().is_err());
        assert!(rx.rejected.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_closed_receiver() {
        let (sink, rx) = ChannelSink::unbounded();
        let ChannelReceivers { accepted, rejected } = rx;
        drop(rejected);

        sink.reject("invalid path: ".to_string());
        sink.forward(osc!("/midi"));
        sink.reject("invalid path: /x".to_string());

        assert!(sink.rejected.is_disconnected());
        assert_eq!(accepted.try_recv().unwrap(), osc!("/midi"));
        assert!(accepted.try_recv().is_err());

        drop(accepted);
        sink.forward(osc!("/midi"));
        assert!(sink.accepted.is_disconnected());
    }

    #[test]
    fn test_callback_sink() {
        let forwarded = Arc::new(AtomicUsize::new(0));
        let rejected = Arc::new(AtomicUsize::new(0));
        let f = Arc::clone(&forwarded);
        let r = Arc::clone(&rejected);

        let sink = CallbackSink::new(
            move |_| {
                f.fetch_add(1, Ordering::SeqCst);
            },
            move |_| {
                r.fetch_add(1, Ordering::SeqCst);
            },
        );

        sink.forward(osc!("/ui/patch/up"));
        sink.forward(osc!("/ui/patch/down"));
        sink.reject("invalid path: /ui/patch".to_string());

        assert_eq!(forwarded.load(Ordering::SeqCst), 2);
        assert_eq!(rejected.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_collecting_sink_order() {
        let sink = CollectingSink::new();
        sink.reject("invalid path: /a".to_string());
        sink.forward(osc!("/midi"));

        assert_eq!(sink.forwarded(), vec![osc!("/midi")]);
        assert_eq!(sink.rejected(), vec!["invalid path: /a".to_string()]);
        assert_eq!(
            sink.take(),
            vec![
                Emission::Reject("invalid path: /a".to_string()),
                Emission::Forward(osc!("/midi")),
            ]
        );
        assert!(sink.emissions().is_empty());
    }

    #[test]
    fn test_decorators_delegate() {
        let sink = MetricsSink::new(TracingSink::new(CollectingSink::new()));

        sink.forward(osc!("/ui/volume", 0.8));
        sink.reject("invalid path: /ui/volum".to_string());

        let inner = sink.into_inner().into_inner();
        assert_eq!(inner.forwarded(), vec![osc!("/ui/volume", 0.8)]);
        assert_eq!(inner.rejected(), vec!["invalid path: /ui/volum".to_string()]);
    }

    #[test]
    fn test_trait_object_and_references() {
        let collecting = Arc::new(CollectingSink::new());
        let shared: Arc<dyn DispatchSink> = collecting.clone();
        let boxed: Box<dyn DispatchSink> = Box::new(Arc::clone(&shared));

        let by_ref = &shared;
        by_ref.forward(osc!("/midi"));
        shared.reject("invalid path: x".to_string());
        boxed.forward(osc!("/ui/allnotesoff"));
        (&boxed).reject("invalid path: y".to_string());

        assert_eq!(
            collecting.take(),
            vec![
                Emission::Forward(osc!("/midi")),
                Emission::Reject("invalid path: x".to_string()),
                Emission::Forward(osc!("/ui/allnotesoff")),
                Emission::Reject("invalid path: y".to_string()),
            ]
        );
    }
}
