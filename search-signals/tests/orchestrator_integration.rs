//! Integration tests for the signal dispatcher orchestrator.
//!
//! These tests use the real Orchestrator, SignalBus and buffered processor
//! with a mock consumer and a mock SearchIndexProvider.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tokio::time::{timeout, Duration};

use search_signals::config::SignalSettings;
use search_signals::consumer::{Consumer, JsonLinesConsumer, LifecycleEvent, StreamMessage};
use search_signals::errors::IngestError;
use search_signals::orchestrator::{Orchestrator, OrchestratorConfig};
use search_signals::processor::{
    get_signal_processor, ModelSelection, ProcessorContext, ProcessorFactories,
};
use search_signals::signals::SignalBus;
use search_signals_repository::{
    BatchOperationResult, BatchOperationSummary, SearchIndexError, SearchIndexProvider,
    StaticIndexRegistry,
};
use search_signals_shared::ModelInstance;

// Mock Consumer for testing
struct MockConsumer {
    events_to_send: Vec<LifecycleEvent>,
}

impl MockConsumer {
    fn new(events: Vec<LifecycleEvent>) -> Self {
        Self {
            events_to_send: events,
        }
    }
}

#[async_trait::async_trait]
impl Consumer for MockConsumer {
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        _shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError> {
        for event in self.events_to_send.clone() {
            sender
                .send(StreamMessage::Event(event))
                .await
                .map_err(|e| IngestError::consumer(e.to_string()))?;
        }
        let _ = sender.send(StreamMessage::End).await;
        Ok(())
    }
}

// Mock Search Provider for testing
#[derive(Default)]
struct MockSearchProvider {
    update_batches: Mutex<Vec<(String, Vec<String>)>>,
    deleted: Mutex<Vec<(String, String)>>,
    fail_deletes: AtomicBool,
    fail_updates: AtomicBool,
}

impl MockSearchProvider {
    fn update_batches(&self) -> Vec<(String, Vec<String>)> {
        self.update_batches.lock().unwrap().clone()
    }

    fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SearchIndexProvider for MockSearchProvider {
    async fn update_index(
        &self,
        instances: &[ModelInstance],
        model_name: &str,
        _batch_size: usize,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(SearchIndexError::bulk_index("Mock update error"));
        }
        self.update_batches.lock().unwrap().push((
            model_name.to_string(),
            instances.iter().map(|i| i.pk.clone()).collect(),
        ));
        Ok(BatchOperationSummary::from_results(
            instances
                .iter()
                .map(|i| BatchOperationResult {
                    pk: i.pk.clone(),
                    success: true,
                    error: None,
                })
                .collect(),
        ))
    }

    async fn delete_index_item(
        &self,
        instance: &ModelInstance,
        model_name: &str,
    ) -> Result<(), SearchIndexError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(SearchIndexError::delete("Mock delete error"));
        }
        self.deleted
            .lock()
            .unwrap()
            .push((model_name.to_string(), instance.pk.clone()));
        Ok(())
    }
}

struct Harness {
    orchestrator: Orchestrator,
    provider: Arc<MockSearchProvider>,
    bus: Arc<SignalBus>,
}

fn harness(consumer: Arc<dyn Consumer>, buffer_size: usize) -> Harness {
    let registry: StaticIndexRegistry = "catalog=Article,Comment".parse().unwrap();
    let provider = Arc::new(MockSearchProvider::default());
    let bus = Arc::new(SignalBus::new());

    let context = ProcessorContext {
        settings: SignalSettings {
            signal_class: None,
            buffer_size: Some(buffer_size),
        },
        registry: Arc::new(registry),
        provider: provider.clone(),
        bus: bus.clone(),
    };
    let processor = get_signal_processor(context, &ProcessorFactories::new()).unwrap();

    let config = OrchestratorConfig {
        channel_buffer_size: 16,
        ..Default::default()
    };
    let orchestrator =
        Orchestrator::with_config(consumer, processor, ModelSelection::AllManaged, config);

    Harness {
        orchestrator,
        provider,
        bus,
    }
}

fn save(model: &str, pk: &str) -> LifecycleEvent {
    LifecycleEvent::post_save(model, ModelInstance::new(pk).with_field("title", pk))
}

fn delete(model: &str, pk: &str) -> LifecycleEvent {
    LifecycleEvent::pre_delete(model, ModelInstance::new(pk))
}

#[tokio::test]
async fn test_orchestrator_buffers_saves_and_flushes_on_end() {
    let events = vec![
        save("Article", "1"),
        save("Article", "2"),
        save("Article", "3"),
        delete("Article", "2"),
        save("Invoice", "1"),
        save("Comment", "1"),
    ];
    let mut h = harness(Arc::new(MockConsumer::new(events)), 2);

    timeout(Duration::from_secs(5), h.orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .expect("orchestrator failed");

    let mut batches = h.provider.update_batches();
    assert_eq!(
        batches.remove(0),
        ("Article".to_string(), vec!["1".to_string(), "2".to_string()])
    );
    // The final flush drains the remaining buffers in no particular order.
    batches.sort();
    assert_eq!(
        batches,
        vec![
            ("Article".to_string(), vec!["3".to_string()]),
            ("Comment".to_string(), vec!["1".to_string()]),
        ]
    );
    assert_eq!(
        h.provider.deleted(),
        vec![("Article".to_string(), "2".to_string())]
    );

    let stats = h.orchestrator.stats();
    assert_eq!(stats.events_received, 6);
    assert_eq!(stats.events_dispatched, 6);
    assert_eq!(stats.dispatch_failures, 0);
    assert_eq!(stats.instances_flushed, 2);

    assert_eq!(h.bus.binding_count().await, 0);
}

#[tokio::test]
async fn test_delete_failures_are_counted_not_fatal() {
    let events = vec![delete("Article", "1"), save("Article", "2")];
    let mut h = harness(Arc::new(MockConsumer::new(events)), 10);
    h.provider.fail_deletes.store(true, Ordering::SeqCst);

    timeout(Duration::from_secs(5), h.orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .expect("orchestrator failed");

    let stats = h.orchestrator.stats();
    assert_eq!(stats.dispatch_failures, 1);
    assert_eq!(stats.events_dispatched, 1);
    assert_eq!(
        h.provider.update_batches(),
        vec![("Article".to_string(), vec!["2".to_string()])]
    );
}

#[tokio::test]
async fn test_failed_final_flush_is_reported() {
    let events = vec![save("Article", "1")];
    let mut h = harness(Arc::new(MockConsumer::new(events)), 10);
    h.provider.fail_updates.store(true, Ordering::SeqCst);

    let result = timeout(Duration::from_secs(5), h.orchestrator.run())
        .await
        .expect("orchestrator timed out");

    assert!(matches!(result, Err(IngestError::SignalError(_))));
    assert_eq!(h.bus.binding_count().await, 0);
}

#[tokio::test]
async fn test_json_lines_input_end_to_end() {
    let input = concat!(
        r#"{"signal":"post_save","model":"Comment","instance":{"pk":"c1","fields":{"body":"hi"}}}"#,
        "\n",
        "{broken\n",
        r#"{"signal":"post_save","model":"Comment","instance":{"pk":"c2"}}"#,
        "\n",
        r#"{"signal":"pre_delete","model":"Comment","instance":{"pk":"c1"}}"#,
        "\n",
    );
    let consumer = JsonLinesConsumer::new(input.as_bytes());
    let mut h = harness(Arc::new(consumer), 2);

    timeout(Duration::from_secs(5), h.orchestrator.run())
        .await
        .expect("orchestrator timed out")
        .expect("orchestrator failed");

    assert_eq!(
        h.provider.update_batches(),
        vec![(
            "Comment".to_string(),
            vec!["c1".to_string(), "c2".to_string()]
        )]
    );
    assert_eq!(
        h.provider.deleted(),
        vec![("Comment".to_string(), "c1".to_string())]
    );

    let stats = h.orchestrator.stats();
    assert_eq!(stats.malformed_events, 1);
    assert_eq!(stats.events_received, 3);
    assert_eq!(stats.instances_flushed, 0);
}
