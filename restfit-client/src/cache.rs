//! Descriptor cache.
//!
//! Parsed endpoint descriptors are shared by every call to the same
//! endpoint. The cache is keyed by `(service, endpoint)` and safe for
//! concurrent readers and writers; when two parses of the same endpoint
//! race, the last insert wins. Both results are identical since parsing is
//! deterministic.

use std::sync::Arc;

use dashmap::DashMap;
use restfit_core::EndpointDescriptor;

type Key = (String, String);

/// Concurrent map from `(service, endpoint)` to its parsed descriptor.
#[derive(Debug, Default)]
pub struct DescriptorCache {
    entries: DashMap<Key, Arc<EndpointDescriptor>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a descriptor, replacing any previous entry for the same key.
    pub fn insert(&self, service: &str, descriptor: EndpointDescriptor) -> Arc<EndpointDescriptor> {
        let descriptor = Arc::new(descriptor);
        let key = (service.to_string(), descriptor.name().to_string());
        self.entries.insert(key, descriptor.clone());
        descriptor
    }

    pub fn get(&self, service: &str, endpoint: &str) -> Option<Arc<EndpointDescriptor>> {
        self.entries
            .get(&(service.to_string(), endpoint.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn contains(&self, service: &str, endpoint: &str) -> bool {
        self.entries
            .contains_key(&(service.to_string(), endpoint.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
