//! StateScript virtual machine.
//!
//! Executes compiled bytecode chunks against a per-script [`Instance`]
//! (scope chain plus current-state pointer). The machine is a stack VM:
//! each dispatched chunk gets a fresh operand stack, and interpreting a
//! compiled chunk always leaves that stack empty.
//!
//! Runtime type behavior is split between the closed [`Value`] sum type
//! (built-in members and operators dispatch on the tag) and the
//! [`TypeRegistry`] side table for user-registered object types.

pub mod error;
pub mod execute;
pub mod machine;
pub mod natives;
pub mod ops;
pub mod params;
pub mod pool;
pub mod registry;
pub mod scope;
pub mod value;

pub use error::RuntimeError;
pub use execute::{change_state, interpret, run_event, ExecCtx, Instance, MAX_DEPTH};
pub use machine::{Stack, StackError};
pub use natives::{NativeFn, NativeRegistry};
pub use params::ParamBag;
pub use pool::{ObjRef, ObjectData, ObjectPool};
pub use registry::{MethodFn, TypeInfo, TypeRegistry};
pub use scope::Scopes;
pub use value::Value;
