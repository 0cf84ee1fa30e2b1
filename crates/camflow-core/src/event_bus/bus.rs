//! Event Bus implementation.
//!
//! Provides the core EventBus struct. One bus is owned by the `Core` context; there is no
//! process-wide instance.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use tracing::{debug, info, trace};
use uuid::Uuid;

use super::events::EventPayload;

/// Subscription handle for unsubscribing a single entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new unique subscription ID
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", &self.0.to_string()[..8])
    }
}

/// Type alias for event handler functions
///
/// Handlers are compared by pointer identity when unsubscribing, so keep a clone of the
/// `Rc` around if you intend to remove it later.
pub type EventHandler = Rc<dyn Fn(&EventPayload)>;

/// Result of a single `emit`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// Handlers ran; carries how many.
    Delivered(usize),
    /// The event holds a block token, nothing ran.
    Blocked,
    /// Nobody ever subscribed to this event name.
    Unregistered,
}

impl EmitOutcome {
    /// True if at least the handler loop ran
    pub fn is_delivered(&self) -> bool {
        matches!(self, EmitOutcome::Delivered(_))
    }
}

/// Configuration for the event bus
#[derive(Debug, Clone)]
pub struct EventBusConfig {
    /// Whether to keep a history of delivered event names.
    pub enable_history: bool,
    /// Maximum number of events to retain in history.
    pub max_history_size: usize,
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self {
            enable_history: false,
            max_history_size: 1000,
        }
    }
}

struct Subscription {
    id: SubscriptionId,
    handler: EventHandler,
}

#[derive(Default)]
struct EventSlot {
    handlers: Vec<Subscription>,
    blocker_tokens: usize,
}

/// Central event bus for kernel-wide event distribution
pub struct EventBus {
    events: RefCell<HashMap<String, EventSlot>>,
    history: RefCell<VecDeque<String>>,
    config: EventBusConfig,
}

/// Pops the block token pushed by `emit_with`, also when a handler panics.
struct EmissionGuard<'a> {
    bus: &'a EventBus,
    event: &'a str,
}

impl Drop for EmissionGuard<'_> {
    fn drop(&mut self) {
        self.bus.unblock(self.event);
    }
}

impl EventBus {
    /// Create a new event bus with default configuration
    pub fn new() -> Self {
        Self::with_config(EventBusConfig::default())
    }

    /// Create a new event bus with custom configuration
    pub fn with_config(config: EventBusConfig) -> Self {
        Self {
            events: RefCell::new(HashMap::new()),
            history: RefCell::new(VecDeque::new()),
            config,
        }
    }

    /// Subscribe a handler to an event
    ///
    /// There is no uniqueness check: subscribing the same handler twice makes it run twice
    /// per emission.
    pub fn subscribe(&self, event: impl Into<String>, handler: EventHandler) -> SubscriptionId {
        let event = event.into();
        let id = SubscriptionId::new();
        self.events
            .borrow_mut()
            .entry(event.clone())
            .or_default()
            .handlers
            .push(Subscription { id, handler });
        debug!("Subscription {} added to '{}'", id, event);
        id
    }

    /// Remove every entry of `event` that holds this handler
    ///
    /// Returns the number of removed entries. Unknown events are logged and ignored.
    pub fn unsubscribe(&self, event: &str, handler: &EventHandler) -> usize {
        let mut events = self.events.borrow_mut();
        match events.get_mut(event) {
            Some(slot) => {
                let before = slot.handlers.len();
                slot.handlers.retain(|s| !Rc::ptr_eq(&s.handler, handler));
                before - slot.handlers.len()
            }
            None => {
                info!("Trying to unregister an unknown event: {}", event);
                0
            }
        }
    }

    /// Remove a single subscription by its id
    ///
    /// Returns true if the subscription was found and removed.
    pub fn unsubscribe_id(&self, id: SubscriptionId) -> bool {
        let mut events = self.events.borrow_mut();
        for slot in events.values_mut() {
            if let Some(pos) = slot.handlers.iter().position(|s| s.id == id) {
                slot.handlers.remove(pos);
                debug!("Subscription {} removed", id);
                return true;
            }
        }
        false
    }

    /// Emit an event without payload
    pub fn emit(&self, event: &str) -> EmitOutcome {
        self.emit_with(event, EventPayload::Empty)
    }

    /// Emit an event, passing `payload` to every handler
    ///
    /// While the handlers run the event holds a block token, so a handler that (directly or
    /// transitively) emits the same event again is dropped rather than queued. The handler
    /// list is snapshotted first: handlers may subscribe or unsubscribe freely.
    pub fn emit_with(&self, event: &str, payload: EventPayload) -> EmitOutcome {
        trace!("Event emitted: {}", event);
        let handlers: Vec<EventHandler> = {
            let mut events = self.events.borrow_mut();
            let Some(slot) = events.get_mut(event) else {
                debug!("No events registered for event '{}'", event);
                return EmitOutcome::Unregistered;
            };
            if slot.blocker_tokens > 0 {
                trace!("Ignoring blocked event: {}", event);
                return EmitOutcome::Blocked;
            }
            slot.blocker_tokens += 1;
            slot.handlers.iter().map(|s| s.handler.clone()).collect()
        };

        let guard = EmissionGuard { bus: self, event };
        for handler in &handlers {
            handler(&payload);
        }
        drop(guard);

        if self.config.enable_history {
            self.add_to_history(event);
        }
        EmitOutcome::Delivered(handlers.len())
    }

    /// Push a block token, suppressing emissions of `event` until the matching `unblock`
    pub fn block(&self, event: &str) {
        match self.events.borrow_mut().get_mut(event) {
            Some(slot) => slot.blocker_tokens += 1,
            None => info!("Trying to block an unknown event: {}", event),
        }
    }

    /// Pop one block token of `event`
    ///
    /// Popping from an empty stack or an unknown event is logged and ignored.
    pub fn unblock(&self, event: &str) {
        match self.events.borrow_mut().get_mut(event) {
            Some(slot) if slot.blocker_tokens > 0 => slot.blocker_tokens -= 1,
            Some(_) => debug!("Trying to unblock non-blocked event '{}'", event),
            None => info!("Trying to unblock an unknown event: {}", event),
        }
    }

    /// Whether `event` currently holds at least one block token
    pub fn is_blocked(&self, event: &str) -> bool {
        self.events
            .borrow()
            .get(event)
            .is_some_and(|slot| slot.blocker_tokens > 0)
    }

    /// Whether anybody ever subscribed to `event`
    pub fn is_registered(&self, event: &str) -> bool {
        self.events.borrow().contains_key(event)
    }

    /// Number of handlers subscribed to `event`
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.events
            .borrow()
            .get(event)
            .map_or(0, |slot| slot.handlers.len())
    }

    /// Names of delivered emissions, oldest first (empty unless history is enabled)
    pub fn history(&self) -> Vec<String> {
        self.history.borrow().iter().cloned().collect()
    }

    /// Clear event history
    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }

    /// Get the current configuration
    pub fn config(&self) -> &EventBusConfig {
        &self.config
    }

    fn add_to_history(&self, event: &str) {
        let mut history = self.history.borrow_mut();
        history.push_back(event.to_string());
        while history.len() > self.config.max_history_size {
            history.pop_front();
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.events.borrow().len())
            .field("config", &self.config)
            .finish()
    }
}
