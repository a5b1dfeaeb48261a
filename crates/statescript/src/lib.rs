//! StateScript: an embeddable scripting subsystem for game engines.
//!
//! Scripts are small state machines: a global chunk of shared variables
//! and event handlers, plus named states each with their own locals and
//! handlers (`OnEnter`, `OnUpdate`, `OnExit`, and custom events). Source
//! compiles in a single pass to bytecode executed by a stack VM; the
//! engine talks to scripts through events, parameter bags, registered
//! native functions, and registered types.
//!
//! [`ScriptSystem`] is the embedding surface: it owns the type and
//! native registries, the compiled-definition cache, the timer pool,
//! and the per-entity script components, and drives them all from one
//! `update(dt)` call per frame.

pub mod component;
pub mod definitions;
pub mod system;
pub mod timers;

pub use component::{Dispatch, ScriptComponent};
pub use definitions::DefinitionCache;
pub use system::{ScriptSystem, SystemConfig, SystemError};
pub use timers::{FiredTimer, TimerError, TimerPool, TimerTarget};

pub use statescript_core::{
    Chunk, Constant, Diagnostic, EntityId, ErrorCode, OpCode, ScriptDefinition, Severity, TypeId,
};
pub use statescript_compiler::{compile_source, CompileOutput};
pub use statescript_vm::{
    ExecCtx, Instance, NativeRegistry, ObjRef, ObjectPool, ParamBag, RuntimeError, TypeRegistry,
    Value,
};
