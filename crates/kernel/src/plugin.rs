use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;

/// Errors from plugin registry lookups.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("plugin {0} not found")]
    PluginNotFound(&'static str),
}

struct PluginEntry {
    name: &'static str,
    value: Box<dyn Any>,
}

/// Registry of engine plugins keyed by their concrete type.
///
/// Host applications insert collaborators here (the window surface, custom
/// game plugins) and other plugins look them up when the game starts.
#[derive(Default)]
pub struct Plugins {
    entries: HashMap<TypeId, PluginEntry>,
}

impl Plugins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a plugin, replacing any previous plugin of the same type.
    pub fn insert<T: 'static>(&mut self, plugin: T) {
        tracing::debug!(plugin = type_name::<T>(), "plugin registered");
        self.entries.insert(
            TypeId::of::<T>(),
            PluginEntry {
                name: type_name::<T>(),
                value: Box::new(plugin),
            },
        );
    }

    /// Returns `true` if a plugin of type `T` has been inserted.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn get<T: 'static>(&self) -> Result<&T, KernelError> {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .ok_or(KernelError::PluginNotFound(type_name::<T>()))
    }

    pub fn get_mut<T: 'static>(&mut self) -> Result<&mut T, KernelError> {
        self.entries
            .get_mut(&TypeId::of::<T>())
            .and_then(|entry| entry.value.downcast_mut::<T>())
            .ok_or(KernelError::PluginNotFound(type_name::<T>()))
    }

    /// Remove a plugin and hand ownership to the caller.
    pub fn take<T: 'static>(&mut self) -> Result<T, KernelError> {
        let entry = self
            .entries
            .remove(&TypeId::of::<T>())
            .ok_or(KernelError::PluginNotFound(type_name::<T>()))?;
        entry
            .value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| KernelError::PluginNotFound(type_name::<T>()))
    }

    /// Type names of all registered plugins, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.values().map(|entry| entry.name).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
