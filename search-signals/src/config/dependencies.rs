//! Dependency initialization and wiring for the signal dispatcher.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::SignalSettings;
use crate::consumer::JsonLinesConsumer;
use crate::orchestrator::Orchestrator;
use crate::processor::{get_signal_processor, ModelSelection, ProcessorContext, ProcessorFactories};
use crate::signals::SignalBus;
use crate::AppError;
use search_signals_repository::{IndexRegistry, OpenSearchProvider, StaticIndexRegistry};

/// Default OpenSearch URL.
const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default connection retry interval in seconds.
const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Connection mode for OpenSearch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if connection fails.
    FailFast,
    /// Retry connection every retry interval until successful.
    Retry,
}

impl ConnectionMode {
    /// Parse connection mode from environment variable.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive)
    /// Defaults to "retry" if not set or invalid.
    fn from_env() -> Self {
        Self::parse(&env::var("OPENSEARCH_CONNECTION_MODE").unwrap_or_else(|_| "retry".to_string()))
    }

    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!(value = %value, "Invalid OPENSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables, using only the
    /// built-in signal processor.
    pub async fn new() -> Result<Self, AppError> {
        Self::with_factories(ProcessorFactories::new()).await
    }

    /// Initialize all dependencies from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `SEARCH_INDICES`: Managed models, e.g. `catalog=Article,Comment;people=User`
    /// - `OPENSEARCH_CONNECTION_MODE`: Connection mode - "fail-fast" or "retry" (default: retry)
    /// - `OPENSEARCH_RETRY_INTERVAL_SECS`: Retry interval in seconds (default: 15)
    /// - `SIGNALS_SIGNAL_CLASS`, `SIGNALS_BUFFER_SIZE`: see [`SignalSettings::from_env`]
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(AppError)` - If initialization fails
    pub async fn with_factories(factories: ProcessorFactories) -> Result<Self, AppError> {
        let opensearch_url =
            env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let indices_spec = env::var("SEARCH_INDICES").unwrap_or_default();
        let connection_mode = ConnectionMode::from_env();
        let retry_interval = env::var("OPENSEARCH_RETRY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_RETRY_INTERVAL_SECS);
        let settings = SignalSettings::from_env();

        info!(
            opensearch_url = %opensearch_url,
            search_indices = %indices_spec,
            connection_mode = ?connection_mode,
            retry_interval_secs = retry_interval,
            signal_class = ?settings.signal_class,
            buffer_size = settings.buffer_size(),
            "Initializing dependencies"
        );

        let registry: StaticIndexRegistry = indices_spec
            .parse()
            .map_err(|e| AppError::config(format!("Invalid SEARCH_INDICES: {}", e)))?;
        if registry.is_empty() {
            warn!("SEARCH_INDICES is empty, no model is managed");
        }
        let registry: Arc<dyn IndexRegistry> = Arc::new(registry);

        let provider = Self::connect_to_opensearch(
            &opensearch_url,
            registry.clone(),
            connection_mode,
            Duration::from_secs(retry_interval),
        )
        .await?;

        info!("OpenSearch connection established");

        let context = ProcessorContext {
            settings,
            registry,
            provider: Arc::new(provider),
            bus: Arc::new(SignalBus::new()),
        };
        let processor = get_signal_processor(context, &factories)?;

        let consumer = JsonLinesConsumer::stdin();
        let orchestrator =
            Orchestrator::new(Arc::new(consumer), processor, ModelSelection::AllManaged);

        Ok(Self { orchestrator })
    }

    /// Connect to OpenSearch with retry logic based on connection mode.
    async fn connect_to_opensearch(
        url: &str,
        registry: Arc<dyn IndexRegistry>,
        mode: ConnectionMode,
        retry_interval: Duration,
    ) -> Result<OpenSearchProvider, AppError> {
        loop {
            match Self::try_connect_opensearch(url, registry.clone()).await {
                Ok(provider) => return Ok(provider),
                Err(e) => match mode {
                    ConnectionMode::FailFast => {
                        return Err(AppError::config(format!(
                            "Failed to connect to OpenSearch: {}",
                            e
                        )));
                    }
                    ConnectionMode::Retry => {
                        warn!(
                            opensearch_url = %url,
                            error = %e,
                            retry_interval_secs = retry_interval.as_secs(),
                            "Failed to connect to OpenSearch, retrying..."
                        );
                        sleep(retry_interval).await;
                    }
                },
            }
        }
    }

    /// Attempt to connect to OpenSearch.
    async fn try_connect_opensearch(
        url: &str,
        registry: Arc<dyn IndexRegistry>,
    ) -> Result<OpenSearchProvider, AppError> {
        let provider = OpenSearchProvider::new(url, registry)
            .await
            .map_err(|e| AppError::config(format!("Failed to create OpenSearch provider: {}", e)))?;

        provider
            .ping()
            .await
            .map_err(|e| AppError::config(format!("OpenSearch did not answer: {}", e)))?;

        Ok(provider)
    }
}
