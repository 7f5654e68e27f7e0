//! Events delivered to live subscribers over the [`super::EventBus`].

use serde::Serialize;

use super::Document;

/// Event published on the broadcast bus.
///
/// Serialized with a `topic` discriminator matching the subscriber-side
/// event names: `realTimeData` for poller output and `alert` for
/// operator-triggered alerts.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "topic")]
pub enum BusEvent {
    /// Bounded sample of one collection, republished every poll tick.
    #[serde(rename = "realTimeData")]
    RealTimeData {
        /// Collection name.
        collection: String,
        /// First documents of the collection in store order.
        data: Vec<Document>,
    },

    /// Operator alert, delivered once and never persisted.
    #[serde(rename = "alert")]
    Alert {
        /// Collection the alert concerns.
        collection: String,
        /// Condition that triggered the alert.
        condition: String,
        /// Human-readable message.
        message: String,
    },
}

impl BusEvent {
    /// Returns the topic name of this event.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::RealTimeData { .. } => "realTimeData",
            Self::Alert { .. } => "alert",
        }
    }

    /// Returns the collection this event concerns.
    #[must_use]
    pub fn collection(&self) -> &str {
        match self {
            Self::RealTimeData { collection, .. } | Self::Alert { collection, .. } => collection,
        }
    }
}
