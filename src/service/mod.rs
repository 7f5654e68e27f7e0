//! Service layer: business logic orchestration.
//!
//! [`CollectionGateway`] mediates every document operation and records it
//! in the audit log. [`BroadcastPoller`] periodically samples every
//! collection through the gateway and publishes the samples on the
//! [`crate::domain::EventBus`].

pub mod collection_gateway;
pub mod poller;

pub use collection_gateway::{CollectionGateway, TopAggregates};
pub use poller::BroadcastPoller;
