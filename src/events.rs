//! Diagnostics emitted while classifying rows and extracting recipes.
//!
//! Extraction code never talks to the logger directly: it receives an
//! [`EventSink`] and reports through it, so callers decide whether events
//! end up in the log, in a review list, or both.

use log::Level;
use std::cell::RefCell;

/// One diagnostic from the extraction code
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub level: Level,
    pub message: String,
    /// Key/value pairs identifying the recipe, row, etc.
    pub context: Vec<(&'static str, String)>,
}

impl Event {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }
}

pub trait EventSink {
    fn emit(&self, event: Event);
}

/// Forwards events to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: Event) {
        if event.context.is_empty() {
            log::log!(event.level, "{}", event.message);
        } else {
            let context = event
                .context
                .iter()
                .map(|(k, v)| format!("{k}={v:?}"))
                .collect::<Vec<_>>()
                .join(" ");
            log::log!(event.level, "{} [{}]", event.message, context);
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: RefCell<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn at_level(&self, level: Level) -> Vec<Event> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.level == level)
            .cloned()
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }
}

/// Adds one context pair to every event before passing it on
pub struct Scoped<'a> {
    inner: &'a dyn EventSink,
    key: &'static str,
    value: String,
}

impl<'a> Scoped<'a> {
    pub fn new(inner: &'a dyn EventSink, key: &'static str, value: impl Into<String>) -> Self {
        Self {
            inner,
            key,
            value: value.into(),
        }
    }
}

impl EventSink for Scoped<'_> {
    fn emit(&self, mut event: Event) {
        event.context.insert(0, (self.key, self.value.clone()));
        self.inner.emit(event);
    }
}

/// Sends each event to two sinks
pub struct Tee<'a>(pub &'a dyn EventSink, pub &'a dyn EventSink);

impl EventSink for Tee<'_> {
    fn emit(&self, event: Event) {
        self.0.emit(event.clone());
        self.1.emit(event);
    }
}
