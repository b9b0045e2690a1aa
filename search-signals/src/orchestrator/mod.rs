//! Orchestrator module for the signal dispatcher.
//!
//! Coordinates the consumer, the signal bus and the signal processor.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::consumer::{Consumer, LifecycleEvent, StreamMessage};
use crate::errors::IngestError;
use crate::processor::{ModelSelection, SignalProcessor};

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Size of the message channel buffer.
    pub channel_buffer_size: usize,
    /// How often progress is logged.
    pub progress_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: 1000,
            progress_interval: Duration::from_secs(10),
        }
    }
}

/// Counters collected while running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorStats {
    /// Events received from the consumer.
    pub events_received: u64,
    /// Events delivered to the bus without error.
    pub events_dispatched: u64,
    /// Events whose delivery returned an error.
    pub dispatch_failures: u64,
    /// Input records the consumer could not parse.
    pub malformed_events: u64,
    /// Instances written by the final flush.
    pub instances_flushed: u64,
}

/// Orchestrator that drives lifecycle events through the signal bus.
///
/// The orchestrator:
/// - Connects the processor for the selected models on start
/// - Sends every consumed event on the bus
/// - Stops on end of stream or Ctrl-C
/// - Flushes buffered saves and disconnects the processor on stop
pub struct Orchestrator {
    consumer: Arc<dyn Consumer>,
    processor: SignalProcessor,
    selection: ModelSelection,
    config: OrchestratorConfig,
    shutdown_tx: broadcast::Sender<()>,
    stats: OrchestratorStats,
}

impl Orchestrator {
    /// Create a new orchestrator with the given components.
    pub fn new(
        consumer: Arc<dyn Consumer>,
        processor: SignalProcessor,
        selection: ModelSelection,
    ) -> Self {
        Self::with_config(consumer, processor, selection, OrchestratorConfig::default())
    }

    /// Create a new orchestrator with custom configuration.
    pub fn with_config(
        consumer: Arc<dyn Consumer>,
        processor: SignalProcessor,
        selection: ModelSelection,
        config: OrchestratorConfig,
    ) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            consumer,
            processor,
            selection,
            config,
            shutdown_tx,
            stats: OrchestratorStats::default(),
        }
    }

    /// Counters from the current or last run.
    pub fn stats(&self) -> OrchestratorStats {
        self.stats
    }

    /// The wired signal processor.
    pub fn processor(&self) -> &SignalProcessor {
        &self.processor
    }

    /// Run the orchestrator.
    ///
    /// Blocks until the consumer's stream ends or a shutdown signal is
    /// received. Buffered saves are flushed before returning.
    #[instrument(skip(self), fields(processor = %self.processor.name()))]
    pub async fn run(&mut self) -> Result<(), IngestError> {
        info!("Starting signal dispatcher");

        self.processor.setup(&self.selection).await?;

        let (event_transmitter, mut event_receiver) =
            mpsc::channel::<StreamMessage>(self.config.channel_buffer_size);

        let consumer = Arc::clone(&self.consumer);
        let shutdown_rx = self.shutdown_tx.subscribe();
        let consumer_handle = tokio::spawn(async move {
            if let Err(e) = consumer.run(event_transmitter, shutdown_rx).await {
                error!(error = %e, "Consumer error");
            }
        });

        let mut progress_timer = interval(self.config.progress_interval);
        progress_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut prev_events: u64 = 0;
        let mut prev_time = Instant::now();

        loop {
            tokio::select! {
                msg = event_receiver.recv() => {
                    match msg {
                        Some(StreamMessage::Event(event)) => self.dispatch(event).await,
                        Some(StreamMessage::Error(e)) => {
                            self.stats.malformed_events += 1;
                            warn!(error = %e, "Received error from consumer");
                        }
                        Some(StreamMessage::End) | None => {
                            info!("Consumer stream ended");
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    let _ = self.shutdown_tx.send(());
                    self.drain_queued(&mut event_receiver).await;
                    break;
                }
                _ = progress_timer.tick() => {
                    let events = self.stats.events_received;
                    let now = Instant::now();
                    let elapsed_secs = now.duration_since(prev_time).as_secs_f64();
                    let events_per_sec = if elapsed_secs > 0.0 {
                        (events.saturating_sub(prev_events) as f64) / elapsed_secs
                    } else {
                        0.0
                    };

                    info!(
                        events_received = events,
                        dispatch_failures = self.stats.dispatch_failures,
                        events_per_sec = format!("{:.2}", events_per_sec),
                        "Processing progress"
                    );

                    prev_events = events;
                    prev_time = now;
                }
            }
        }

        let flush_result = self.processor.flush_pending().await;
        match &flush_result {
            Ok(count) => {
                self.stats.instances_flushed += *count as u64;
                info!(count = count, "Flushed buffered instances");
            }
            Err(e) => error!(error = %e, "Failed to flush buffered instances"),
        }

        self.processor.teardown(&self.selection).await?;

        let _ = self.shutdown_tx.send(());
        let _ = consumer_handle.await;

        info!(
            events_received = self.stats.events_received,
            events_dispatched = self.stats.events_dispatched,
            dispatch_failures = self.stats.dispatch_failures,
            malformed_events = self.stats.malformed_events,
            instances_flushed = self.stats.instances_flushed,
            "Orchestrator shutdown complete"
        );

        flush_result.map(|_| ()).map_err(IngestError::from)
    }

    /// Dispatch events the consumer already queued, without waiting for more.
    async fn drain_queued(&mut self, event_receiver: &mut mpsc::Receiver<StreamMessage>) {
        let mut drained: u64 = 0;
        loop {
            match event_receiver.try_recv() {
                Ok(StreamMessage::Event(event)) => {
                    drained += 1;
                    self.dispatch(event).await;
                }
                Ok(StreamMessage::Error(e)) => {
                    self.stats.malformed_events += 1;
                    warn!(error = %e, "Received error from consumer");
                }
                Ok(StreamMessage::End)
                | Err(TryRecvError::Empty)
                | Err(TryRecvError::Disconnected) => break,
            }
        }
        if drained > 0 {
            info!(count = drained, "Dispatched queued events before shutdown");
        }
    }

    /// Send one event on the bus. Delivery errors are counted and logged;
    /// they do not stop the run.
    async fn dispatch(&mut self, event: LifecycleEvent) {
        self.stats.events_received += 1;

        match self
            .processor
            .bus()
            .send(event.signal, &event.model, &event.instance)
            .await
        {
            Ok(0) => {
                self.stats.events_dispatched += 1;
                debug!(signal = %event.signal, model = %event.model, "No receiver for event");
            }
            Ok(_) => self.stats.events_dispatched += 1,
            Err(e) => {
                self.stats.dispatch_failures += 1;
                error!(
                    signal = %event.signal,
                    model = %event.model,
                    pk = %event.instance.pk,
                    error = %e,
                    "Failed to dispatch event"
                );
            }
        }
    }

    /// Trigger a graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}
