//! The scripting subsystem.
//!
//! One [`ScriptSystem`] per process (or per world). It owns every
//! shared collaborator: the type and native registries, the object
//! pool, the compiled-definition cache, the timer pool, and the table
//! of per-entity components. Components are stored and ticked in spawn
//! order so frame behavior is deterministic.
//!
//! Timer expiry is reaped at the end of `update`, after every
//! component has ticked, so a firing timer never interrupts an
//! in-progress interpretation.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info};

use statescript_core::{Diagnostic, EntityId, ScriptDefinition, TypeId};
use statescript_vm::{ExecCtx, NativeRegistry, ObjectPool, ParamBag, TypeRegistry, Value};

use crate::component::ScriptComponent;
use crate::definitions::DefinitionCache;
use crate::timers::{TimerError, TimerPool, TimerTarget};

/// Capacity knobs for the subsystem's fixed pools.
#[derive(Clone, Copy, Debug)]
pub struct SystemConfig {
    pub object_pool_capacity: usize,
    pub timer_capacity: usize,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            object_pool_capacity: 256,
            timer_capacity: 64,
        }
    }
}

/// Failures crossing the subsystem's boundary API.
#[derive(Error, Debug)]
pub enum SystemError {
    #[error("failed to read script file '{path}'")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("script '{key}' failed to compile ({n} error(s))", n = .diagnostics.len())]
    Compile {
        key: String,
        diagnostics: Vec<Diagnostic>,
    },

    #[error("no compiled script under key '{0}'")]
    UnknownScript(String),

    #[error("no script component on entity {0}")]
    UnknownEntity(EntityId),

    #[error(transparent)]
    Timer(#[from] TimerError),
}

/// The embedding surface of the scripting subsystem.
pub struct ScriptSystem {
    types: TypeRegistry,
    natives: NativeRegistry,
    pool: ObjectPool,
    cache: DefinitionCache,
    timers: TimerPool,
    /// Attached components, in spawn order.
    components: IndexMap<EntityId, ScriptComponent>,
}

impl ScriptSystem {
    pub fn new(config: SystemConfig) -> Self {
        info!(
            object_pool = config.object_pool_capacity,
            timers = config.timer_capacity,
            "script system starting"
        );
        Self {
            types: TypeRegistry::new(),
            natives: NativeRegistry::new(),
            pool: ObjectPool::new(config.object_pool_capacity),
            cache: DefinitionCache::new(),
            timers: TimerPool::new(config.timer_capacity),
            components: IndexMap::new(),
        }
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register a user type usable from scripts and natives.
    pub fn register_type(
        &mut self,
        name: impl Into<String>,
        members: impl IntoIterator<Item = (String, Value)>,
    ) -> TypeId {
        self.types.register_type(name, members)
    }

    /// Attach a method to a registered user type.
    pub fn register_method<F>(&mut self, type_id: TypeId, name: impl Into<String>, f: F) -> bool
    where
        F: Fn(&statescript_vm::ObjRef, &[Value]) -> Value + 'static,
    {
        self.types.register_method(type_id, name, f)
    }

    /// Register an engine function callable from scripts.
    pub fn register_native<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(EntityId, &ParamBag) -> Value + 'static,
    {
        self.natives.register(name, f);
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    // ------------------------------------------------------------------
    // Compilation and the definition cache
    // ------------------------------------------------------------------

    /// Compile source and cache the definition under `key`.
    pub fn compile_str(
        &mut self,
        key: &str,
        source: &str,
    ) -> Result<Arc<ScriptDefinition>, SystemError> {
        self.cache
            .compile(key, source)
            .map_err(|diagnostics| SystemError::Compile {
                key: key.to_string(),
                diagnostics,
            })
    }

    /// Compile a script file, cached under its path.
    pub fn compile_file(&mut self, path: &Path) -> Result<Arc<ScriptDefinition>, SystemError> {
        let key = path.to_string_lossy().to_string();
        let source = std::fs::read_to_string(path).map_err(|source| SystemError::Io {
            path: key.clone(),
            source,
        })?;
        self.compile_str(&key, &source)
    }

    /// Drop a cached definition. Running components keep their current
    /// definition until rebound.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.cache.invalidate(key)
    }

    /// Recompile one script and rebind every component running it.
    pub fn reload(
        &mut self,
        key: &str,
        source: &str,
    ) -> Result<Arc<ScriptDefinition>, SystemError> {
        let definition = self.compile_str(key, source)?;
        let running: Vec<EntityId> = self
            .components
            .iter()
            .filter(|(_, c)| c.definition().name() == key)
            .map(|(entity, _)| *entity)
            .collect();
        for entity in &running {
            if let Some(component) = self.components.get_mut(entity) {
                let mut ctx = ExecCtx::new(&self.types, &self.natives, &mut self.pool, *entity);
                component.rebind(definition.clone(), &mut ctx);
            }
        }
        info!(key, rebound = running.len(), "script reloaded");
        Ok(definition)
    }

    /// Recompile every cached script from `loader` (key to fresh
    /// source), rebinding affected components.
    pub fn reload_all(&mut self, mut loader: impl FnMut(&str) -> Option<String>) {
        let keys: Vec<String> = self.cache.keys().map(str::to_string).collect();
        for key in keys {
            if let Some(source) = loader(&key)
                && let Err(err) = self.reload(&key, &source)
            {
                debug!(key, %err, "reload skipped");
            }
        }
    }

    // ------------------------------------------------------------------
    // Components
    // ------------------------------------------------------------------

    /// Attach a script to an entity and run its initialization, with
    /// per-instance variable overrides seeded first.
    pub fn attach(
        &mut self,
        entity: EntityId,
        key: &str,
        overrides: &ParamBag,
    ) -> Result<(), SystemError> {
        let definition = self
            .cache
            .get(key)
            .ok_or_else(|| SystemError::UnknownScript(key.to_string()))?;
        let mut component = ScriptComponent::new(entity, definition);
        let mut ctx = ExecCtx::new(&self.types, &self.natives, &mut self.pool, entity);
        component.initialize(overrides, &mut ctx);
        self.components.insert(entity, component);
        Ok(())
    }

    /// Remove an entity's component and cancel its pending timers.
    pub fn destroy(&mut self, entity: EntityId) -> bool {
        let removed = self.components.shift_remove(&entity).is_some();
        if removed {
            let cancelled = self.timers.cancel_for(entity);
            debug!(%entity, cancelled, "script component destroyed");
        }
        removed
    }

    pub fn component(&self, entity: EntityId) -> Option<&ScriptComponent> {
        self.components.get(&entity)
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Resolve deferred entity references on every component. Call once
    /// after the scene has finished spawning.
    pub fn resolve_entity_refs(&mut self, mut resolver: impl FnMut(&str) -> Option<EntityId>) {
        for component in self.components.values_mut() {
            component.resolve_entity_refs(&mut resolver);
        }
    }

    // ------------------------------------------------------------------
    // Dispatch
    // ------------------------------------------------------------------

    /// Fire an event at one entity's script. Returns whether any
    /// handler ran.
    pub fn fire_event(&mut self, entity: EntityId, name: &str, params: &ParamBag) -> bool {
        let Some(component) = self.components.get_mut(&entity) else {
            debug!(%entity, event = name, "event fired at entity with no script");
            return false;
        };
        let mut ctx = ExecCtx::new(&self.types, &self.natives, &mut self.pool, entity);
        component.fire_event(name, params, &mut ctx).handled()
    }

    /// Fire an event at every component in spawn order. Returns how
    /// many handled it.
    pub fn broadcast(&mut self, name: &str, params: &ParamBag) -> usize {
        let mut handled = 0;
        for (entity, component) in self.components.iter_mut() {
            let mut ctx = ExecCtx::new(&self.types, &self.natives, &mut self.pool, *entity);
            if component.fire_event(name, params, &mut ctx).handled() {
                handled += 1;
            }
        }
        handled
    }

    /// Engine-initiated state transition.
    pub fn change_state(&mut self, entity: EntityId, target: &str) -> Result<(), SystemError> {
        let Some(component) = self.components.get_mut(&entity) else {
            return Err(SystemError::UnknownEntity(entity));
        };
        let mut ctx = ExecCtx::new(&self.types, &self.natives, &mut self.pool, entity);
        component.change_state(target, &mut ctx);
        Ok(())
    }

    pub fn current_state(&self, entity: EntityId) -> Option<&str> {
        self.components.get(&entity)?.current_state()
    }

    /// Read a script global of one entity.
    pub fn get_global(&self, entity: EntityId, name: &str) -> Option<Value> {
        self.components.get(&entity)?.get_global(name)
    }

    /// Write a script global of one entity.
    pub fn set_global(
        &mut self,
        entity: EntityId,
        name: &str,
        value: Value,
    ) -> Result<(), SystemError> {
        let Some(component) = self.components.get_mut(&entity) else {
            return Err(SystemError::UnknownEntity(entity));
        };
        component.set_global(name, value);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    /// Schedule an event after `duration` seconds.
    pub fn start_timer(
        &mut self,
        duration: f32,
        event: impl Into<String>,
        target: TimerTarget,
        params: ParamBag,
    ) -> Result<usize, TimerError> {
        self.timers.start(duration, event, target, params)
    }

    /// Halt every pending timer without firing.
    pub fn stop_all_timers(&mut self) {
        self.timers.stop_all();
    }

    pub fn active_timers(&self) -> usize {
        self.timers.active_count()
    }

    // ------------------------------------------------------------------
    // Frame tick
    // ------------------------------------------------------------------

    /// One frame: tick every component in spawn order, then reap and
    /// dispatch elapsed timers.
    pub fn update(&mut self, dt: f32) {
        let entities: Vec<EntityId> = self.components.keys().copied().collect();
        for entity in entities {
            if let Some(component) = self.components.get_mut(&entity) {
                let mut ctx = ExecCtx::new(&self.types, &self.natives, &mut self.pool, entity);
                component.update(dt, &mut ctx);
            }
        }

        for fired in self.timers.tick(dt) {
            match fired.target {
                TimerTarget::Entity(entity) => {
                    self.fire_event(entity, &fired.event, &fired.params);
                }
                TimerTarget::Broadcast => {
                    self.broadcast(&fired.event, &fired.params);
                }
            }
        }
    }
}

impl Default for ScriptSystem {
    fn default() -> Self {
        Self::new(SystemConfig::default())
    }
}
