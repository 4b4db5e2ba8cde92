//! Test helpers: endpoint shorthand and a warning recorder.
//!
//! Compiled for this crate's unit tests and, behind the `test-util`
//! feature, for downstream test crates.

use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, PoisonError};

use tessera_core::{NodeId, PartitionId};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::Registry;

use crate::partition_map::Endpoint;

/// Builds an endpoint for `node` serving `partitions`, with no capabilities.
#[must_use]
pub fn endpoint(node: u64, partitions: &[u32]) -> Endpoint {
    Endpoint::new(
        NodeId::new(node),
        partitions.iter().copied().map(PartitionId::new),
    )
}

/// Tracing layer that captures the fields of every `WARN` event.
///
/// Install it for the duration of a closure with [`WarnRecorder::record`].
#[derive(Debug, Clone, Default)]
pub struct WarnRecorder {
    warnings: Arc<Mutex<Vec<String>>>,
}

impl WarnRecorder {
    /// Runs `f` with this recorder installed as the thread's subscriber.
    pub fn record<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = Registry::default().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Returns the captured warnings, one string of `name=value` pairs each.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        self.warnings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many captured warnings mention `needle`.
    #[must_use]
    pub fn warnings_mentioning(&self, needle: &str) -> usize {
        self.warnings().iter().filter(|w| w.contains(needle)).count()
    }
}

struct FieldCollector(String);

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        let _ = write!(self.0, "{}={value:?}", field.name());
    }
}

impl<S: Subscriber> Layer<S> for WarnRecorder {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            let mut collector = FieldCollector(String::new());
            event.record(&mut collector);
            self.warnings
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(collector.0);
        }
    }
}
