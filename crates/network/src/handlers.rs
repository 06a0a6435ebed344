//! # Packet Handler System
//!
//! Routes decoded frames to the code that understands them.
//!
//! # Architecture
//!
//! ## Handler Registry
//!
//! The registry maps a (family, action) pair to exactly one handler.
//! Registering a second handler for the same key replaces the first; the
//! replaced handler is returned and a warning is logged.
//!
//! # Performance
//!
//! - O(1) dispatch via direct HashMap lookup
//! - Handler functions are `Arc` wrapped so dispatch clones the handle and
//!   releases the lock before running it
//!
//! # Thread Safety
//!
//! The registry is shared between the receiver task and whoever registers
//! handlers. Handlers run on the receiver task, one frame at a time, and
//! must not block.
//!
//! # Example
//!
//! ```
//! use eoclient_network::HandlerRegistry;
//! use eoclient_protocol::{FamilyActionKey, PacketAction, PacketFamily};
//!
//! let registry = HandlerRegistry::new();
//! let key = FamilyActionKey::new(PacketFamily::Locker, PacketAction::Open);
//!
//! registry.register_function(key, |frame| {
//!     let x = frame.get_byte()?;
//!     tracing::info!("Locker opened at x={}", x);
//!     Ok(())
//! });
//! assert!(registry.has_handler(key));
//! ```

use eoclient_core::Result;
use eoclient_protocol::{FamilyActionKey, PacketFrame};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Type for packet handler functions
///
/// # Purpose
/// Synchronous function that consumes a frame's payload through its read
/// cursor and returns a Result.
///
/// # Errors
/// Errors that are connection-fatal (see
/// [`EoError::is_connection_fatal`](eoclient_core::EoError::is_connection_fatal))
/// tear the connection down; any other error is logged and the receiver
/// carries on.
pub type HandlerFunction = Arc<dyn Fn(&mut PacketFrame) -> Result<()> + Send + Sync>;

/// Registry of packet handlers
///
/// # Purpose
/// Maintains a mapping from packet keys to handler functions.
/// Provides O(1) lookup and dispatch.
#[derive(Default)]
pub struct HandlerRegistry {
    /// Map from packet key to handler function
    handlers: RwLock<HashMap<FamilyActionKey, HandlerFunction>>,
}

impl HandlerRegistry {
    /// Create a new handler registry
    ///
    /// # Returns
    /// An empty registry ready for handler registration
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function-based handler
    ///
    /// # Arguments
    /// * `key` - The (family, action) pair to handle
    /// * `handler` - Function to call for frames with this key
    ///
    /// # Returns
    /// The handler previously registered for `key`, if any
    pub fn register_function<F>(&self, key: FamilyActionKey, handler: F) -> Option<HandlerFunction>
    where
        F: Fn(&mut PacketFrame) -> Result<()> + Send + Sync + 'static,
    {
        let previous = self.handlers.write().insert(key, Arc::new(handler));
        if previous.is_some() {
            tracing::warn!("Replaced existing handler for {}", key);
        } else {
            tracing::debug!("Registered handler for {}", key);
        }
        previous
    }

    /// Remove the handler for `key`
    pub fn unregister(&self, key: FamilyActionKey) -> Option<HandlerFunction> {
        let removed = self.handlers.write().remove(&key);
        if removed.is_some() {
            tracing::debug!("Unregistered handler for {}", key);
        }
        removed
    }

    /// Dispatch a frame to its registered handler
    ///
    /// # Returns
    /// - `Ok(true)` - A handler ran and succeeded
    /// - `Ok(false)` - No handler is registered for this key
    /// - `Err(e)` - The handler failed
    pub fn dispatch(&self, frame: &mut PacketFrame) -> Result<bool> {
        let key = frame.key();
        let handler = self.handlers.read().get(&key).cloned();

        match handler {
            Some(handler) => {
                handler(frame)?;
                Ok(true)
            }
            None => {
                tracing::trace!("No handler registered for {}", key);
                Ok(false)
            }
        }
    }

    /// Check if a handler is registered for a key
    pub fn has_handler(&self, key: FamilyActionKey) -> bool {
        self.handlers.read().contains_key(&key)
    }

    /// Get the number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eoclient_core::EoError;
    use eoclient_protocol::{PacketAction, PacketFamily};
    use std::sync::atomic::{AtomicU32, Ordering};

    const OPEN: FamilyActionKey = FamilyActionKey::new(PacketFamily::Locker, PacketAction::Open);

    #[test]
    fn test_registry_register() {
        let registry = HandlerRegistry::new();

        assert!(registry.register_function(OPEN, |_| Ok(())).is_none());

        assert!(registry.has_handler(OPEN));
        assert_eq!(registry.handler_count(), 1);
    }

    #[test]
    fn test_registry_dispatch() {
        let registry = HandlerRegistry::new();
        let seen = Arc::new(AtomicU32::new(0));

        let counter = Arc::clone(&seen);
        registry.register_function(OPEN, move |frame| {
            counter.store(frame.get_byte()?, Ordering::SeqCst);
            Ok(())
        });

        let mut frame = PacketFrame::with_payload(PacketFamily::Locker, PacketAction::Open, &[43]);
        assert!(registry.dispatch(&mut frame).unwrap());
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_dispatch_routes_each_frame_to_its_handler() {
        let registry = HandlerRegistry::new();
        let calls = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let get = FamilyActionKey::new(PacketFamily::Locker, PacketAction::Get);
        let buy = FamilyActionKey::new(PacketFamily::Locker, PacketAction::Buy);

        for key in [OPEN, get, buy] {
            let calls = Arc::clone(&calls);
            registry.register_function(key, move |frame| {
                calls.lock().push((key, frame.get_byte()?));
                Ok(())
            });
        }

        let sequence = [
            (PacketAction::Open, 1),
            (PacketAction::Buy, 2),
            (PacketAction::Open, 3),
            (PacketAction::Take, 4),
            (PacketAction::Get, 5),
        ];
        for (action, marker) in sequence {
            let mut frame = PacketFrame::new(PacketFamily::Locker, action);
            frame.add_byte(marker).unwrap();
            let handled = registry.dispatch(&mut frame).unwrap();
            assert_eq!(handled, action != PacketAction::Take);
        }

        let calls = calls.lock();
        assert_eq!(*calls, vec![(OPEN, 1), (buy, 2), (OPEN, 3), (get, 5)]);
        assert_eq!(calls.iter().filter(|(key, _)| *key == OPEN).count(), 2);
        assert_eq!(calls.iter().filter(|(key, _)| *key == buy).count(), 1);
        assert_eq!(calls.iter().filter(|(key, _)| *key == get).count(), 1);
    }

    #[test]
    fn test_registry_no_handler() {
        let registry = HandlerRegistry::new();
        let mut frame = PacketFrame::new(PacketFamily::Locker, PacketAction::Buy);

        assert!(!registry.dispatch(&mut frame).unwrap());
    }

    #[test]
    fn test_replace_returns_previous() {
        let registry = HandlerRegistry::new();
        let calls = Arc::new(AtomicU32::new(0));

        registry.register_function(OPEN, |_| Err(EoError::Protocol("old".into())));
        let counter = Arc::clone(&calls);
        let previous = registry.register_function(OPEN, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(previous.is_some());
        assert_eq!(registry.handler_count(), 1);

        let mut frame = PacketFrame::new(PacketFamily::Locker, PacketAction::Open);
        assert!(registry.dispatch(&mut frame).unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_error_propagates() {
        let registry = HandlerRegistry::new();
        registry.register_function(OPEN, |frame| frame.get_short().map(|_| ()));

        let mut frame = PacketFrame::new(PacketFamily::Locker, PacketAction::Open);
        assert!(matches!(
            registry.dispatch(&mut frame),
            Err(EoError::TruncatedFrame { .. })
        ));
    }

    #[test]
    fn test_unregister() {
        let registry = HandlerRegistry::new();
        registry.register_function(OPEN, |_| Ok(()));

        assert!(registry.unregister(OPEN).is_some());
        assert!(registry.unregister(OPEN).is_none());
        assert!(!registry.has_handler(OPEN));
        assert_eq!(registry.handler_count(), 0);
    }
}
