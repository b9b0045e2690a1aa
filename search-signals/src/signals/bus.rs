//! Publish-subscribe dispatch of lifecycle signals.

use std::sync::Arc;

use search_signals_shared::{ModelInstance, ModelType};
use tokio::sync::RwLock;
use tracing::{debug, instrument, trace};

use super::{Signal, SignalReceiver};
use crate::errors::SignalError;

/// One subscription of a receiver to a signal for a sender model.
struct Binding {
    signal: Signal,
    sender: ModelType,
    receiver: Arc<dyn SignalReceiver>,
}

impl Binding {
    fn matches(&self, signal: Signal, sender: &ModelType, receiver: &Arc<dyn SignalReceiver>) -> bool {
        self.signal == signal && &self.sender == sender && same_receiver(&self.receiver, receiver)
    }
}

/// Receivers are identified by the address of their shared allocation.
fn same_receiver(a: &Arc<dyn SignalReceiver>, b: &Arc<dyn SignalReceiver>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Registry of signal bindings.
///
/// Bindings are kept in connection order. Dispatch clones the matching
/// receivers out of the table first, so receivers may connect or disconnect
/// while a signal is being sent.
#[derive(Default)]
pub struct SignalBus {
    bindings: RwLock<Vec<Binding>>,
}

impl SignalBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `receiver` to `signal` for instances of `sender`.
    ///
    /// Returns `false` if the same receiver was already connected for this
    /// signal and sender; the table is left unchanged in that case.
    pub async fn connect(
        &self,
        signal: Signal,
        receiver: Arc<dyn SignalReceiver>,
        sender: &ModelType,
    ) -> bool {
        let mut bindings = self.bindings.write().await;
        if bindings.iter().any(|b| b.matches(signal, sender, &receiver)) {
            trace!(signal = %signal, sender = %sender, "Receiver already connected");
            return false;
        }

        bindings.push(Binding {
            signal,
            sender: sender.clone(),
            receiver,
        });
        debug!(signal = %signal, sender = %sender, "Receiver connected");
        true
    }

    /// Remove the subscription of `receiver` to `signal` for `sender`.
    ///
    /// Returns whether a binding was removed.
    pub async fn disconnect(
        &self,
        signal: Signal,
        receiver: &Arc<dyn SignalReceiver>,
        sender: &ModelType,
    ) -> bool {
        let mut bindings = self.bindings.write().await;
        let before = bindings.len();
        bindings.retain(|b| !b.matches(signal, sender, receiver));
        let removed = bindings.len() != before;
        if removed {
            debug!(signal = %signal, sender = %sender, "Receiver disconnected");
        }
        removed
    }

    /// Deliver `signal` for `instance` to every receiver bound to `sender`.
    ///
    /// Receivers run in connection order; the first error stops delivery and
    /// is returned. On success, returns the number of receivers called.
    #[instrument(skip(self, instance), fields(pk = %instance.pk))]
    pub async fn send(
        &self,
        signal: Signal,
        sender: &ModelType,
        instance: &ModelInstance,
    ) -> Result<usize, SignalError> {
        let receivers: Vec<Arc<dyn SignalReceiver>> = self
            .bindings
            .read()
            .await
            .iter()
            .filter(|b| b.signal == signal && &b.sender == sender)
            .map(|b| Arc::clone(&b.receiver))
            .collect();

        for receiver in &receivers {
            match signal {
                Signal::PostSave => receiver.post_save_connector(sender, instance).await?,
                Signal::PreDelete => receiver.pre_delete_connector(sender, instance).await?,
            }
        }

        trace!(receivers = receivers.len(), "Signal delivered");
        Ok(receivers.len())
    }

    /// Total number of active bindings.
    pub async fn binding_count(&self) -> usize {
        self.bindings.read().await.len()
    }

    /// Whether any receiver is bound to `signal` for `sender`.
    pub async fn has_listeners(&self, signal: Signal, sender: &ModelType) -> bool {
        self.bindings
            .read()
            .await
            .iter()
            .any(|b| b.signal == signal && &b.sender == sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use search_signals_repository::SearchIndexError;
    use std::sync::Mutex;

    /// Receiver that records every call it gets.
    #[derive(Default)]
    struct RecordingReceiver {
        calls: Mutex<Vec<(Signal, String, String)>>,
        fail: bool,
    }

    impl RecordingReceiver {
        fn failing() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn record(&self, signal: Signal, sender: &ModelType, instance: &ModelInstance) -> Result<(), SignalError> {
            self.calls
                .lock()
                .unwrap()
                .push((signal, sender.name().to_string(), instance.pk.clone()));
            if self.fail {
                return Err(SearchIndexError::bulk_index("receiver failed").into());
            }
            Ok(())
        }

        fn calls(&self) -> Vec<(Signal, String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SignalReceiver for RecordingReceiver {
        async fn post_save_connector(
            &self,
            sender: &ModelType,
            instance: &ModelInstance,
        ) -> Result<(), SignalError> {
            self.record(Signal::PostSave, sender, instance)
        }

        async fn pre_delete_connector(
            &self,
            sender: &ModelType,
            instance: &ModelInstance,
        ) -> Result<(), SignalError> {
            self.record(Signal::PreDelete, sender, instance)
        }
    }

    #[tokio::test]
    async fn test_send_routes_by_signal_and_sender() {
        let bus = SignalBus::new();
        let recorder = Arc::new(RecordingReceiver::default());
        let receiver: Arc<dyn SignalReceiver> = recorder.clone();
        let article = ModelType::new("Article");
        let comment = ModelType::new("Comment");

        bus.connect(Signal::PostSave, receiver.clone(), &article).await;
        bus.connect(Signal::PreDelete, receiver, &comment).await;

        let instance = ModelInstance::new("1");
        assert_eq!(bus.send(Signal::PostSave, &article, &instance).await.unwrap(), 1);
        assert_eq!(bus.send(Signal::PreDelete, &article, &instance).await.unwrap(), 0);
        assert_eq!(bus.send(Signal::PostSave, &comment, &instance).await.unwrap(), 0);
        assert_eq!(bus.send(Signal::PreDelete, &comment, &instance).await.unwrap(), 1);

        assert_eq!(
            recorder.calls(),
            vec![
                (Signal::PostSave, "Article".to_string(), "1".to_string()),
                (Signal::PreDelete, "Comment".to_string(), "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_connect_is_ignored() {
        let bus = SignalBus::new();
        let receiver: Arc<dyn SignalReceiver> = Arc::new(RecordingReceiver::default());
        let article = ModelType::new("Article");

        assert!(bus.connect(Signal::PostSave, receiver.clone(), &article).await);
        assert!(!bus.connect(Signal::PostSave, receiver.clone(), &article).await);
        assert_eq!(bus.binding_count().await, 1);
    }

    #[tokio::test]
    async fn test_distinct_receivers_both_called() {
        let bus = SignalBus::new();
        let first = Arc::new(RecordingReceiver::default());
        let second = Arc::new(RecordingReceiver::default());
        let article = ModelType::new("Article");

        bus.connect(Signal::PostSave, first.clone(), &article).await;
        bus.connect(Signal::PostSave, second.clone(), &article).await;

        let delivered = bus
            .send(Signal::PostSave, &article, &ModelInstance::new("9"))
            .await
            .unwrap();
        assert_eq!(delivered, 2);
        assert_eq!(first.calls().len(), 1);
        assert_eq!(second.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_removes_only_matching_binding() {
        let bus = SignalBus::new();
        let receiver: Arc<dyn SignalReceiver> = Arc::new(RecordingReceiver::default());
        let article = ModelType::new("Article");

        bus.connect(Signal::PostSave, receiver.clone(), &article).await;
        bus.connect(Signal::PreDelete, receiver.clone(), &article).await;

        assert!(bus.disconnect(Signal::PostSave, &receiver, &article).await);
        assert!(!bus.disconnect(Signal::PostSave, &receiver, &article).await);
        assert!(!bus.has_listeners(Signal::PostSave, &article).await);
        assert!(bus.has_listeners(Signal::PreDelete, &article).await);
        assert_eq!(bus.binding_count().await, 1);
    }

    #[tokio::test]
    async fn test_first_error_stops_delivery() {
        let bus = SignalBus::new();
        let failing = Arc::new(RecordingReceiver::failing());
        let after = Arc::new(RecordingReceiver::default());
        let article = ModelType::new("Article");

        bus.connect(Signal::PostSave, failing.clone(), &article).await;
        bus.connect(Signal::PostSave, after.clone(), &article).await;

        let result = bus
            .send(Signal::PostSave, &article, &ModelInstance::new("1"))
            .await;
        assert!(matches!(result, Err(SignalError::IndexError(_))));
        assert_eq!(failing.calls().len(), 1);
        assert!(after.calls().is_empty());
    }
}
