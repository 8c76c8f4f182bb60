//! Metadata subscription port (driving/primary port)
//!
//! Delivers filer change events in order, strictly after a start timestamp,
//! over an `mpsc` channel. The stream ends when the sender is dropped; a
//! transport failure is delivered as an `Err` item.

use tokio::sync::mpsc;

use crate::domain::MetadataEvent;

/// Receiving end of a metadata subscription
pub type EventReceiver = mpsc::Receiver<anyhow::Result<MetadataEvent>>;

/// What to subscribe to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    /// Client identifier reported to the filer
    pub client_name: String,
    /// Root of the watched tree
    pub path_prefix: String,
    /// Additional trees to deliver (the configuration directory)
    pub additional_prefixes: Vec<String>,
    /// Sub-trees to leave out
    pub excluded_prefixes: Vec<String>,
    /// Deliver only events newer than this timestamp (nanoseconds, exclusive)
    pub since_ns: i64,
}

/// Port trait for the ordered metadata event stream
#[async_trait::async_trait]
pub trait IMetadataSubscriber: Send + Sync {
    /// Opens a subscription
    async fn subscribe(&self, request: SubscriptionRequest) -> anyhow::Result<EventReceiver>;
}
