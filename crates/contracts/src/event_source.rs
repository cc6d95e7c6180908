//! EventSource trait - rower event source abstraction
//!
//! Decouples the bridge from the serial decoder that turns the rower's
//! protocol into [`RowerEvent`]s. Real hardware adapters and the mock rower
//! implement the same interface.

use std::sync::Arc;

use crate::{ContractError, RowerEvent};

/// Event callback type
///
/// Invoked from the source's own thread for every decoded event.
pub type EventCallback = Arc<dyn Fn(RowerEvent) + Send + Sync>;

/// Rower event source trait
///
/// # Example
///
/// ```ignore
/// let source: Box<dyn EventSource> = open_rower();
/// source.listen(Arc::new(|event| {
///     println!("event: {}", event.kind);
/// }));
/// source.request_reset()?;
/// // ...
/// source.stop();
/// ```
pub trait EventSource: Send + Sync {
    /// Source name (used for logging)
    fn name(&self) -> &str;

    /// Register the event callback
    ///
    /// Repeated calls while already listening are ignored.
    fn listen(&self, callback: EventCallback);

    /// Ask the device to reset its counters
    ///
    /// The device answers with a `reset` event through the callback.
    fn request_reset(&self) -> Result<(), ContractError>;

    /// Stop delivering events
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
