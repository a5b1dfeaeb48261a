//! Per-entity script components.
//!
//! A component binds one entity to one compiled script definition and
//! carries the instance state (current state, scope chain). Event
//! dispatch resolves the current state's handlers first, then the
//! global chunk's; an event neither declares is simply unhandled, not
//! an error.
//!
//! A component whose global chunk fails to interpret is permanently
//! invalid: every later dispatch on it is a checked no-op.

use std::sync::Arc;

use tracing::{debug, error, warn};

use statescript_core::{EntityId, ScriptDefinition};
use statescript_vm::{
    change_state, interpret, run_event, ExecCtx, Instance, ParamBag, Value,
};

/// Where an event dispatch landed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dispatch {
    /// Handled by the current state's event chunk.
    State,
    /// Handled by the global chunk's event chunk.
    Global,
    Unhandled,
}

impl Dispatch {
    pub fn handled(self) -> bool {
        !matches!(self, Dispatch::Unhandled)
    }
}

impl From<Dispatch> for bool {
    fn from(dispatch: Dispatch) -> bool {
        dispatch.handled()
    }
}

/// A script bound to an entity.
#[derive(Debug)]
pub struct ScriptComponent {
    owner: EntityId,
    definition: Arc<ScriptDefinition>,
    instance: Instance,
    valid: bool,
}

impl ScriptComponent {
    pub fn new(owner: EntityId, definition: Arc<ScriptDefinition>) -> Self {
        Self {
            owner,
            definition,
            instance: Instance::new(),
            valid: true,
        }
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn definition(&self) -> &Arc<ScriptDefinition> {
        &self.definition
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn current_state(&self) -> Option<&str> {
        self.instance.current_state.as_deref()
    }

    /// Run the global chunk to set up script globals and any initial
    /// transition. Per-instance overrides are seeded first so the
    /// definition's own initializers do not clobber them.
    ///
    /// A hard interpretation failure here disables the component for
    /// good.
    pub fn initialize(&mut self, overrides: &ParamBag, ctx: &mut ExecCtx) {
        for (name, value) in overrides.iter() {
            self.instance.scopes.set_global(name, value.clone());
        }
        let definition = self.definition.clone();
        if let Err(err) = interpret(
            &definition.global,
            &definition,
            &mut self.instance,
            &ParamBag::new(),
            ctx,
        ) {
            error!(
                owner = %self.owner,
                script = definition.name(),
                %err,
                "script initialization failed, component disabled"
            );
            self.valid = false;
        }
    }

    /// Resolve deferred entity references recorded by the global chunk.
    ///
    /// Runs once after the whole scene has spawned, when named entities
    /// exist to be looked up. Unresolvable names stay Null.
    pub fn resolve_entity_refs(&mut self, mut resolver: impl FnMut(&str) -> Option<EntityId>) {
        if !self.valid {
            return;
        }
        let definition = self.definition.clone();
        for (var, entity_name) in &definition.global.entity_inits {
            match resolver(entity_name) {
                Some(id) => {
                    self.instance.scopes.set_global(var, Value::Entity(id));
                }
                None => warn!(
                    owner = %self.owner,
                    variable = var,
                    entity = entity_name,
                    "entity reference did not resolve"
                ),
            }
        }
    }

    /// Dispatch an event: current state first, then the global chunk.
    pub fn fire_event(&mut self, name: &str, params: &ParamBag, ctx: &mut ExecCtx) -> Dispatch {
        if !self.valid {
            return Dispatch::Unhandled;
        }
        let definition = self.definition.clone();

        if let Some(state) = self.instance.current_state.clone()
            && let Some(chunk) = definition.state(&state).and_then(|c| c.event(name))
        {
            if let Err(err) = run_event(chunk, &definition, &mut self.instance, params, ctx) {
                error!(owner = %self.owner, event = name, state, %err, "event failed");
            }
            return Dispatch::State;
        }

        if let Some(chunk) = definition.global.event(name) {
            if let Err(err) = run_event(chunk, &definition, &mut self.instance, params, ctx) {
                error!(owner = %self.owner, event = name, %err, "event failed");
            }
            return Dispatch::Global;
        }

        debug!(owner = %self.owner, event = name, "unhandled event");
        Dispatch::Unhandled
    }

    /// Per-frame tick: fires `OnUpdate` with `deltaTime` in the params.
    pub fn update(&mut self, dt: f32, ctx: &mut ExecCtx) {
        let params = ParamBag::new().with("deltaTime", Value::Number(dt));
        self.fire_event("OnUpdate", &params, ctx);
    }

    /// Engine-initiated transition; same semantics as the ChangeState
    /// opcode.
    pub fn change_state(&mut self, target: &str, ctx: &mut ExecCtx) {
        if !self.valid {
            return;
        }
        let definition = self.definition.clone();
        if let Err(err) = change_state(target, &definition, &mut self.instance, ctx) {
            error!(owner = %self.owner, target, %err, "state transition failed");
        }
    }

    /// Read a script global.
    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.instance.scopes.global(name).cloned()
    }

    /// Write a script global, creating it if needed.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.instance.scopes.set_global(name, value);
    }

    /// Swap in a recompiled definition and reinitialize from scratch.
    /// Hot-reload path; instance state does not survive.
    pub fn rebind(&mut self, definition: Arc<ScriptDefinition>, ctx: &mut ExecCtx) {
        self.definition = definition;
        self.instance = Instance::new();
        self.valid = true;
        self.initialize(&ParamBag::new(), ctx);
    }
}
