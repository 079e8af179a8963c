//! Registry of struct descriptors keyed by struct name.

use std::collections::HashMap;
use std::sync::Arc;

use super::StructDescriptor;
use crate::error::{Result, WireError};

/// Holds shared descriptors by name.
///
/// Built once at startup and read concurrently afterwards.
#[derive(Debug, Default, Clone)]
pub struct DescriptorRegistry {
    descriptors: HashMap<String, Arc<StructDescriptor>>,
}

impl DescriptorRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor and returns the shared instance.
    ///
    /// Registering an identical layout under an existing name returns the
    /// entry already held. A different layout under that name is an error.
    pub fn register(&mut self, descriptor: StructDescriptor) -> Result<Arc<StructDescriptor>> {
        if let Some(existing) = self.descriptors.get(descriptor.name()) {
            if **existing == descriptor {
                return Ok(Arc::clone(existing));
            }
            return Err(WireError::Schema(format!(
                "conflicting descriptor for '{}'",
                descriptor.name()
            )));
        }
        let name = descriptor.name().to_string();
        let shared = Arc::new(descriptor);
        tracing::debug!(name = %name, fields = shared.field_count(), "registered descriptor");
        self.descriptors.insert(name, Arc::clone(&shared));
        Ok(shared)
    }

    /// Returns the descriptor registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<StructDescriptor>> {
        self.descriptors.get(name).cloned()
    }

    /// Like [`get`](Self::get), but an unknown name is a schema error.
    pub fn require(&self, name: &str) -> Result<Arc<StructDescriptor>> {
        self.get(name)
            .ok_or_else(|| WireError::Schema(format!("no descriptor registered for '{}'", name)))
    }

    /// Returns true if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(name)
    }

    /// Returns the number of registered descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
