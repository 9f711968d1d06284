use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

pub type Properties = Map<String, Value>;

/// Turns a `json!({...})` object into a property map. Anything else yields an empty map.
pub fn properties(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Current time in epoch milliseconds, the unit view events carry in `timestamp`.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Clone)]
pub struct TelemetryEvent {
    pub name: String,
    pub properties: Properties,
    pub timestamp: DateTime<Utc>,
}

impl TelemetryEvent {
    pub fn new(name: &str, properties: Properties) -> Self {
        Self {
            name: name.to_string(),
            properties,
            timestamp: Utc::now(),
        }
    }
}

/// Sink for engagement events.
///
/// Best effort: `capture` must return immediately and never fail. A sink that is
/// not ready drops the event instead of queueing it.
pub trait TelemetryPort: Send + Sync {
    fn capture(&self, name: &str, properties: Properties);
}

/// Stamps every event with the id of one page session before handing it on.
pub struct SessionTelemetry {
    inner: Arc<dyn TelemetryPort>,
    distinct_id: String,
}

impl SessionTelemetry {
    pub fn new(inner: Arc<dyn TelemetryPort>, distinct_id: impl Into<String>) -> Self {
        Self {
            inner,
            distinct_id: distinct_id.into(),
        }
    }
}

impl TelemetryPort for SessionTelemetry {
    fn capture(&self, name: &str, mut properties: Properties) {
        properties
            .entry("distinct_id")
            .or_insert_with(|| Value::String(self.distinct_id.clone()));
        self.inner.capture(name, properties);
    }
}

/// Keeps events in memory, in capture order.
#[derive(Default)]
pub struct MemoryTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name == name).count()
    }
}

impl TelemetryPort for MemoryTelemetry {
    fn capture(&self, name: &str, properties: Properties) {
        let event = TelemetryEvent::new(name, properties);
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
