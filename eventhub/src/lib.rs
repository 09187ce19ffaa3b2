#![deny(missing_docs)]

//! Event Hub trigger types and the function that forwards every message of a
//! batch to a blob output binding.
//!
//! The function runs on [`azfn_runtime`]: the host delivers a batch of Event Hub
//! messages per invocation, the [`forwarder`] logs the batch, then logs and
//! assigns each message to the `outputBlob` binding in order.

pub mod batch;
pub mod forwarder;
mod message;

pub use crate::batch::{EventHubBatch, TriggerMetadata};
pub use crate::message::Message;

/// Name of the Event Hub trigger binding.
pub const TRIGGER_BINDING: &str = "eventHubMessages";
