pub mod command;
pub mod error;
pub mod events;
pub mod id;
pub mod lifecycle;
pub mod observability;
pub mod results;
pub mod tally;

use chrono::{DateTime, Utc};
use quorum_db::PollBackend;
use std::sync::Arc;

pub use lifecycle::{PollService, PollServiceConfig};

#[derive(Clone)]
pub struct AppState {
    pub polls: PollService<PollBackend>,
    pub event_bus: events::EventBus,
    pub metrics: Arc<observability::PollMetrics>,
    pub config: AppConfig,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub poll_service: PollServiceConfig,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wire the poll service to `backend`, sharing one bus and one set of
    /// counters between the service and the outer layers.
    pub fn new(backend: PollBackend, poll_service: PollServiceConfig, event_capacity: usize) -> Self {
        let event_bus = events::EventBus::new(event_capacity);
        let metrics = Arc::new(observability::PollMetrics::new());
        let polls = PollService::new(
            backend,
            poll_service.clone(),
            event_bus.clone(),
            metrics.clone(),
        );
        Self {
            polls,
            event_bus,
            metrics,
            config: AppConfig {
                poll_service,
                started_at: Utc::now(),
            },
        }
    }

    pub fn storage_backend(&self) -> &'static str {
        self.polls.store().name()
    }
}
