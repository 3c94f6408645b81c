//! SceneFlow Transport - Pub/Sub Client
//!
//! Thin client for the simulator's pub/sub endpoint:
//! - request/response service calls (scene snapshot)
//! - topic subscriptions (pose stream)
//! - service advertisement (screenshot trigger)
//!
//! IO runs on a dedicated tokio runtime thread; the public API is
//! synchronous and hands messages over on crossbeam channels so the render
//! and UI threads never touch async code.

use thiserror::Error;

pub mod messages;
pub mod node;

pub use messages::{Envelope, ServiceRequest};
pub use node::Node;

/// Transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not reach the endpoint
    #[error("Connection error: {0}")]
    Connection(String),

    /// No response within the deadline
    #[error("Request to {0} timed out")]
    Timeout(String),

    /// The remote answered with ok = false
    #[error("Service {0} reported failure")]
    ServiceFailure(String),

    /// Payload did not match the expected message shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The connection was closed while a call was in flight
    #[error("Connection closed")]
    Closed,
}

/// Result type for transport operations
pub type Result<T> = std::result::Result<T, TransportError>;
