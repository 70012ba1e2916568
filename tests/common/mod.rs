//! Common test utilities and helpers for integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pinchy::error::{RegistryError, SourceError};
use pinchy::models::Service;
use pinchy::plugins::registry::Registry;
use pinchy::plugins::source::Source;
use tracing::field::{Field, Visit};
use tracing::{Dispatch, Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

/// Source serving whatever dataset was last assigned to it
pub struct TestSource {
    services: Mutex<Result<Vec<Service>, SourceError>>,
}

impl TestSource {
    pub fn new(services: Vec<Service>) -> Self {
        Self {
            services: Mutex::new(Ok(services)),
        }
    }

    /// Replace the dataset returned by the next fetch
    pub fn set(&self, services: Vec<Service>) {
        *self.services.lock().unwrap() = Ok(services);
    }

    /// Make every following fetch fail
    pub fn fail(&self, message: &str) {
        *self.services.lock().unwrap() = Err(SourceError::Network(message.to_string()));
    }
}

impl Default for TestSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl Source for TestSource {
    fn name(&self) -> &str {
        "test"
    }

    async fn fetch(&self) -> Result<Vec<Service>, SourceError> {
        self.services.lock().unwrap().clone()
    }
}

/// Registry keeping services in memory, keyed by id
#[derive(Default)]
pub struct TestRegistry {
    services: Mutex<BTreeMap<String, Service>>,
    rejected: Mutex<Vec<String>>,
}

impl TestRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the registry as if an earlier run had written `service`
    pub fn seed(&self, service: Service) {
        self.services
            .lock()
            .unwrap()
            .insert(service.id().to_string(), service);
    }

    /// Reject registration of the given id with a server error
    pub fn reject(&self, id: &str) {
        self.rejected.lock().unwrap().push(id.to_string());
    }

    /// Ids currently stored, sorted
    pub fn ids(&self) -> Vec<String> {
        self.services.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, id: &str) -> Option<Service> {
        self.services.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl Registry for TestRegistry {
    fn name(&self) -> &str {
        "test"
    }

    async fn register(&self, service: &Service) -> Result<(), RegistryError> {
        if self.rejected.lock().unwrap().iter().any(|id| id == service.id()) {
            return Err(RegistryError::ServerError(500));
        }
        self.seed(service.clone());
        Ok(())
    }

    async fn deregister(&self, id: &str) -> Result<(), RegistryError> {
        self.services.lock().unwrap().remove(id);
        Ok(())
    }

    async fn services(&self) -> Result<Vec<String>, RegistryError> {
        Ok(self.ids())
    }
}

/// Log entry recorded by [`CaptureLayer`]
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub level: Level,
    pub message: String,
}

/// Layer keeping every event it sees, for assertions
#[derive(Clone, Default)]
pub struct CaptureLayer {
    entries: Arc<Mutex<Vec<Entry>>>,
}

impl CaptureLayer {
    pub fn dispatch(&self) -> Dispatch {
        Dispatch::new(tracing_subscriber::registry().with(self.clone()))
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.entries.lock().unwrap().clone()
    }

    /// Entries at `level` only
    pub fn at(&self, level: Level) -> Vec<Entry> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .collect()
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        self.entries.lock().unwrap().push(Entry {
            level: *event.metadata().level(),
            message: visitor.message,
        });
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }
}
