//! Domain events published by the matching orchestrator.
//!
//! Publishing is fire-and-forget: `publish` returns nothing and a misbehaving
//! handler cannot fail a match request.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    MatchingCompleted,
    MatchingFailed,
}

impl EventKind {
    pub fn event_type(&self) -> &'static str {
        match self {
            EventKind::MatchingCompleted => "MATCHING_COMPLETED",
            EventKind::MatchingFailed => "MATCHING_FAILED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub message: String,
    /// Which workflow raised the event, e.g. "Job to CVs Matching".
    pub context: String,
    pub level: EventLevel,
    pub occurred_at: DateTime<Utc>,
}

impl DomainEvent {
    pub fn matching_completed(message: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: EventKind::MatchingCompleted,
            message: message.into(),
            context: context.into(),
            level: EventLevel::Success,
            occurred_at: Utc::now(),
        }
    }

    /// Message is rendered as `"<context>: <error>"`.
    pub fn matching_failed(error_message: &str, context: impl Into<String>) -> Self {
        let context = context.into();
        Self {
            id: Uuid::new_v4(),
            kind: EventKind::MatchingFailed,
            message: format!("{context}: {error_message}"),
            context,
            level: EventLevel::Error,
            occurred_at: Utc::now(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }
}

/// Sink for domain events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: DomainEvent);
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &DomainEvent);
}

/// In-memory publisher that fans each event out to the handlers subscribed to
/// its kind, in subscription order.
#[derive(Default)]
pub struct DomainEventPublisher {
    handlers: RwLock<HashMap<EventKind, Vec<Arc<dyn EventHandler>>>>,
}

impl DomainEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        match self.handlers.write() {
            Ok(mut handlers) => handlers.entry(kind).or_default().push(handler),
            Err(poisoned) => poisoned.into_inner().entry(kind).or_default().push(handler),
        }
    }

    pub fn clear(&self) {
        match self.handlers.write() {
            Ok(mut handlers) => handlers.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }

    fn handlers_for(&self, kind: EventKind) -> Vec<Arc<dyn EventHandler>> {
        let handlers = match self.handlers.read() {
            Ok(handlers) => handlers,
            Err(poisoned) => poisoned.into_inner(),
        };
        handlers.get(&kind).cloned().unwrap_or_default()
    }
}

impl EventPublisher for DomainEventPublisher {
    fn publish(&self, event: DomainEvent) {
        // Handlers run outside the lock so they may subscribe or publish themselves.
        for handler in self.handlers_for(event.kind) {
            handler.handle(&event);
        }
    }
}

/// Forwards events to the `tracing` log at the event's level.
pub struct TracingEventHandler;

impl EventHandler for TracingEventHandler {
    fn handle(&self, event: &DomainEvent) {
        let event_type = event.event_type();
        match event.level {
            EventLevel::Info | EventLevel::Success => {
                info!(event_id = %event.id, event_type, context = %event.context, "{}", event.message)
            }
            EventLevel::Warning => {
                warn!(event_id = %event.id, event_type, context = %event.context, "{}", event.message)
            }
            EventLevel::Error => {
                error!(event_id = %event.id, event_type, context = %event.context, "{}", event.message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl EventHandler for Collect {
        fn handle(&self, event: &DomainEvent) {
            self.0.lock().unwrap().push(event.message.clone());
        }
    }

    #[test]
    fn test_failed_event_message_includes_context() {
        let event = DomainEvent::matching_failed("repository offline", "Job to CVs Matching");
        assert_eq!(event.message, "Job to CVs Matching: repository offline");
        assert_eq!(event.level, EventLevel::Error);
        assert_eq!(event.event_type(), "MATCHING_FAILED");
    }

    #[test]
    fn test_each_event_gets_its_own_id() {
        let a = DomainEvent::matching_completed("Found 1 job matches", "ctx");
        let b = DomainEvent::matching_completed("Found 1 job matches", "ctx");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_publisher_routes_by_kind() {
        let publisher = DomainEventPublisher::new();
        let completed = Arc::new(Collect::default());
        let failed = Arc::new(Collect::default());
        publisher.subscribe(EventKind::MatchingCompleted, completed.clone());
        publisher.subscribe(EventKind::MatchingFailed, failed.clone());

        publisher.publish(DomainEvent::matching_completed("Found 3 CV matches", "ctx"));

        assert_eq!(*completed.0.lock().unwrap(), vec!["Found 3 CV matches"]);
        assert!(failed.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_publish_without_handlers_is_noop() {
        let publisher = DomainEventPublisher::new();
        publisher.publish(DomainEvent::matching_completed("nobody listens", "ctx"));
    }

    #[test]
    fn test_clear_removes_subscriptions() {
        let publisher = DomainEventPublisher::new();
        let handler = Arc::new(Collect::default());
        publisher.subscribe(EventKind::MatchingCompleted, handler.clone());
        publisher.clear();
        publisher.publish(DomainEvent::matching_completed("dropped", "ctx"));
        assert!(handler.0.lock().unwrap().is_empty());
    }

    #[test]
    fn test_event_kind_serializes_as_event_type() {
        let json = serde_json::to_string(&EventKind::MatchingCompleted).unwrap();
        assert_eq!(json, "\"MATCHING_COMPLETED\"");
    }
}
