//! Compiled-definition cache.
//!
//! Definitions are cached under a caller-chosen key (usually the script
//! path) and shared by reference count, so many components can run the
//! same compiled script. A failed recompile keeps the previous good
//! definition installed; running components are not broken by an edit
//! that does not compile.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{info, warn};

use statescript_core::{Diagnostic, ScriptDefinition};
use statescript_compiler::compile_source;

/// Key-to-definition cache with keep-last-good recompiles.
#[derive(Debug, Default)]
pub struct DefinitionCache {
    entries: IndexMap<String, Arc<ScriptDefinition>>,
}

impl DefinitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Arc<ScriptDefinition>> {
        self.entries.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Install a pre-built definition under `key`.
    pub fn install(&mut self, key: impl Into<String>, definition: Arc<ScriptDefinition>) {
        self.entries.insert(key.into(), definition);
    }

    /// Compile `source` and cache the result under `key`.
    ///
    /// On compile errors the diagnostics come back and any previously
    /// cached definition for `key` stays in place.
    pub fn compile(
        &mut self,
        key: &str,
        source: &str,
    ) -> Result<Arc<ScriptDefinition>, Vec<Diagnostic>> {
        let output = compile_source(key, source);
        match output.definition {
            Some(definition) => {
                let definition = Arc::new(definition);
                self.entries.insert(key.to_string(), definition.clone());
                info!(key, states = definition.states.len(), "script compiled");
                Ok(definition)
            }
            None => {
                warn!(
                    key,
                    errors = output.diagnostics.len(),
                    kept_previous = self.entries.contains_key(key),
                    "script failed to compile"
                );
                Err(output.diagnostics)
            }
        }
    }

    /// Drop the cached definition for `key`.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.shift_remove(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
