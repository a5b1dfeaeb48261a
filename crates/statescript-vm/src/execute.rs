//! The fetch-decode-execute loop.
//!
//! [`interpret`] runs one chunk against a script [`Instance`]. Event
//! dispatch and state transitions nest further interpretations; the
//! nesting depth is bounded by [`MAX_DEPTH`] so mutually transitioning
//! states cannot recurse without limit.
//!
//! Transition semantics: `ChangeState` is a no-op for the current state
//! or an undeclared one. Otherwise it fires the outgoing state's
//! `OnExit`, swaps the current-state pointer, re-interprets the new
//! state's chunk body into a fresh state scope, then fires `OnEnter`.

use smallvec::SmallVec;
use tracing::{debug, warn};

use statescript_core::{Chunk, Constant, EntityId, OpCode, ScriptDefinition};

use crate::error::RuntimeError;
use crate::machine::Stack;
use crate::natives::NativeRegistry;
use crate::ops;
use crate::params::ParamBag;
use crate::pool::ObjectPool;
use crate::registry::{self, TypeRegistry};
use crate::scope::Scopes;
use crate::value::Value;

/// Maximum nesting of chunk interpretations (event dispatch plus
/// transition cascades).
pub const MAX_DEPTH: usize = 16;

/// Mutable run state of one script: the current-state pointer and the
/// variable scope chain.
#[derive(Clone, Debug, Default)]
pub struct Instance {
    pub current_state: Option<String>,
    pub scopes: Scopes,
}

impl Instance {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shared collaborators one interpretation runs against.
pub struct ExecCtx<'a> {
    pub types: &'a TypeRegistry,
    pub natives: &'a NativeRegistry,
    pub pool: &'a mut ObjectPool,
    /// Entity owning the running script, handed to native calls.
    pub owner: EntityId,
    depth: usize,
}

impl<'a> ExecCtx<'a> {
    pub fn new(
        types: &'a TypeRegistry,
        natives: &'a NativeRegistry,
        pool: &'a mut ObjectPool,
        owner: EntityId,
    ) -> Self {
        Self {
            types,
            natives,
            pool,
            owner,
            depth: 0,
        }
    }
}

/// Dispatch an event chunk: depth-guarded, with its own block scope and
/// a clean chain (the caller's transient blocks are stashed away).
pub fn run_event(
    chunk: &Chunk,
    definition: &ScriptDefinition,
    instance: &mut Instance,
    params: &ParamBag,
    ctx: &mut ExecCtx,
) -> Result<Value, RuntimeError> {
    run_nested(chunk, definition, instance, params, ctx, true)
}

fn run_nested(
    chunk: &Chunk,
    definition: &ScriptDefinition,
    instance: &mut Instance,
    params: &ParamBag,
    ctx: &mut ExecCtx,
    own_scope: bool,
) -> Result<Value, RuntimeError> {
    if ctx.depth >= MAX_DEPTH {
        return Err(RuntimeError::DepthExceeded { max: MAX_DEPTH });
    }
    ctx.depth += 1;
    let saved = instance.scopes.take_blocks();
    if own_scope {
        instance.scopes.push_block();
    }
    let result = interpret(chunk, definition, instance, params, ctx);
    instance.scopes.restore_blocks(saved);
    ctx.depth -= 1;
    result
}

/// Transition the instance to `target`.
///
/// Transitioning to the current state or to a state the definition does
/// not declare is a no-op: nothing fires, nothing is torn down.
pub fn change_state(
    target: &str,
    definition: &ScriptDefinition,
    instance: &mut Instance,
    ctx: &mut ExecCtx,
) -> Result<(), RuntimeError> {
    if instance.current_state.as_deref() == Some(target) {
        return Ok(());
    }
    let Some(state_chunk) = definition.state(target) else {
        debug!(target, "transition to undeclared state ignored");
        return Ok(());
    };

    let empty = ParamBag::new();

    // Outgoing state's OnExit fires while it is still current
    if let Some(current) = instance.current_state.clone()
        && let Some(exit) = definition.state(&current).and_then(|c| c.event("OnExit"))
    {
        run_event(exit, definition, instance, &empty, ctx)?;
    }

    instance.current_state = Some(target.to_string());
    instance.scopes.reset_state();

    // Re-run the state chunk body to rebuild its locals in the fresh
    // state scope
    run_nested(state_chunk, definition, instance, &empty, ctx, false)?;

    if let Some(enter) = state_chunk.event("OnEnter") {
        run_event(enter, definition, instance, &empty, ctx)?;
    }
    Ok(())
}

fn underflow(chunk: &Chunk, offset: usize) -> RuntimeError {
    RuntimeError::StackUnderflow {
        chunk: chunk.name().to_string(),
        offset,
    }
}

fn operand_u16(chunk: &Chunk, at: usize) -> Result<u16, RuntimeError> {
    if at + 2 <= chunk.len() {
        Ok(chunk.read_u16(at))
    } else {
        Err(RuntimeError::TruncatedOperand {
            chunk: chunk.name().to_string(),
            offset: at,
        })
    }
}

fn operand_u8(chunk: &Chunk, at: usize) -> Result<u8, RuntimeError> {
    chunk
        .code
        .get(at)
        .copied()
        .ok_or_else(|| RuntimeError::TruncatedOperand {
            chunk: chunk.name().to_string(),
            offset: at,
        })
}

fn const_str(chunk: &Chunk, index: u16) -> Result<&str, RuntimeError> {
    chunk
        .constant(index)
        .and_then(Constant::as_str)
        .ok_or_else(|| RuntimeError::MissingConstant {
            chunk: chunk.name().to_string(),
            index,
        })
}

/// Interpret one chunk to completion.
///
/// Returns the chunk's result value (Null unless a `return expr;` ran).
/// The operand stack is local to this call; interpreting a compiled
/// chunk leaves it empty.
pub fn interpret(
    chunk: &Chunk,
    definition: &ScriptDefinition,
    instance: &mut Instance,
    params: &ParamBag,
    ctx: &mut ExecCtx,
) -> Result<Value, RuntimeError> {
    let mut stack = Stack::new();
    let mut ip = 0usize;

    while ip < chunk.len() {
        let offset = ip;
        let byte = chunk.code[ip];
        let op = OpCode::from_byte(byte).ok_or_else(|| RuntimeError::InvalidOpcode {
            chunk: chunk.name().to_string(),
            byte,
            offset,
        })?;
        ip += 1;

        match op {
            OpCode::Return => return Ok(stack.pop_or_null()),

            OpCode::LoadConst => {
                let index = operand_u16(chunk, ip)?;
                ip += 2;
                let value = match chunk.constant(index) {
                    Some(Constant::Number(n)) => Value::Number(*n),
                    Some(Constant::String(s)) => Value::string(s),
                    None => {
                        return Err(RuntimeError::MissingConstant {
                            chunk: chunk.name().to_string(),
                            index,
                        });
                    }
                };
                stack.push(value);
            }

            OpCode::Construct => {
                let index = operand_u16(chunk, ip)?;
                ip += 2;
                let argc = operand_u8(chunk, ip)? as usize;
                ip += 1;
                let mut args: SmallVec<[Value; 4]> = SmallVec::with_capacity(argc);
                for _ in 0..argc {
                    args.push(stack.pop().map_err(|_| underflow(chunk, offset))?);
                }
                args.reverse();
                let name = const_str(chunk, index)?;
                let value = ctx.types.construct(name, &args, ctx.pool)?;
                stack.push(value);
            }

            OpCode::DefineVar => {
                let index = operand_u16(chunk, ip)?;
                ip += 2;
                let value = stack.pop().map_err(|_| underflow(chunk, offset))?;
                let name = const_str(chunk, index)?;
                instance.scopes.define(name, value);
            }

            OpCode::GetVar => {
                let index = operand_u16(chunk, ip)?;
                ip += 2;
                let name = const_str(chunk, index)?;
                let value = instance
                    .scopes
                    .get(name)
                    .cloned()
                    .or_else(|| params.get(name).cloned())
                    .unwrap_or_else(|| {
                        debug!(name, "read of undefined variable");
                        Value::Null
                    });
                stack.push(value);
            }

            OpCode::Assign => {
                let index = operand_u16(chunk, ip)?;
                ip += 2;
                // Value stays on the stack; the statement pops it
                let value = stack.peek().map_err(|_| underflow(chunk, offset))?.clone();
                let name = const_str(chunk, index)?;
                if !instance.scopes.assign(name, value.clone()) {
                    debug!(name, "assignment to undeclared variable defines it");
                    instance.scopes.define(name, value);
                }
            }

            OpCode::Pop => {
                stack.pop().map_err(|_| underflow(chunk, offset))?;
            }

            OpCode::MemberGet => {
                let index = operand_u16(chunk, ip)?;
                ip += 2;
                let receiver = stack.pop().map_err(|_| underflow(chunk, offset))?;
                let name = const_str(chunk, index)?;
                let value = registry::member_get(&receiver, name).unwrap_or_else(|| {
                    warn!(member = name, receiver = %receiver.type_name(), "unknown member");
                    Value::Null
                });
                stack.push(value);
            }

            OpCode::MemberSet => {
                let var_index = operand_u16(chunk, ip)?;
                let member_index = operand_u16(chunk, ip + 2)?;
                ip += 4;
                let value = stack.peek().map_err(|_| underflow(chunk, offset))?.clone();
                let var = const_str(chunk, var_index)?;
                let member = const_str(chunk, member_index)?;
                match instance.scopes.get_mut(var) {
                    Some(slot) => {
                        if !registry::member_set(slot, member, value) {
                            warn!(variable = var, member, "member assignment rejected");
                        }
                    }
                    None => warn!(variable = var, "member assignment to undefined variable"),
                }
            }

            OpCode::MemberCall => {
                let index = operand_u16(chunk, ip)?;
                ip += 2;
                let argc = operand_u8(chunk, ip)? as usize;
                ip += 1;
                let mut args: SmallVec<[Value; 4]> = SmallVec::with_capacity(argc);
                for _ in 0..argc {
                    args.push(stack.pop().map_err(|_| underflow(chunk, offset))?);
                }
                args.reverse();
                let receiver = stack.pop().map_err(|_| underflow(chunk, offset))?;
                let name = const_str(chunk, index)?;
                let value =
                    registry::member_call(ctx.types, &receiver, name, &args).unwrap_or_else(|| {
                        warn!(method = name, receiver = %receiver.type_name(), "unknown method");
                        Value::Null
                    });
                stack.push(value);
            }

            OpCode::Call => {
                let index = operand_u16(chunk, ip)?;
                ip += 2;
                let argc = operand_u8(chunk, ip)? as usize;
                ip += 1;
                let mut args: SmallVec<[Value; 4]> = SmallVec::with_capacity(argc);
                for _ in 0..argc {
                    args.push(stack.pop().map_err(|_| underflow(chunk, offset))?);
                }
                args.reverse();
                let name = const_str(chunk, index)?;
                let bag = ParamBag::from_args(args);
                // Unknown natives already warn inside the registry
                let value = ctx
                    .natives
                    .call(name, ctx.owner, &bag)
                    .unwrap_or(Value::Null);
                stack.push(value);
            }

            OpCode::ChangeState => {
                let index = operand_u16(chunk, ip)?;
                ip += 2;
                let target = const_str(chunk, index)?.to_string();
                change_state(&target, definition, instance, ctx)?;
            }

            OpCode::Jump => {
                let distance = operand_u16(chunk, ip)? as usize;
                ip += 2 + distance;
                if ip > chunk.len() {
                    return Err(RuntimeError::JumpOutOfBounds {
                        chunk: chunk.name().to_string(),
                        offset,
                    });
                }
            }

            OpCode::JumpIfFalse => {
                let distance = operand_u16(chunk, ip)? as usize;
                ip += 2;
                let condition = stack.pop().map_err(|_| underflow(chunk, offset))?;
                if !condition.is_truthy() {
                    ip += distance;
                    if ip > chunk.len() {
                        return Err(RuntimeError::JumpOutOfBounds {
                            chunk: chunk.name().to_string(),
                            offset,
                        });
                    }
                }
            }

            OpCode::PushScope => instance.scopes.push_block(),
            OpCode::PopScope => instance.scopes.pop_block(),

            OpCode::Negate => {
                let a = stack.pop().map_err(|_| underflow(chunk, offset))?;
                stack.push(ops::negate(&a));
            }
            OpCode::Not => {
                let a = stack.pop().map_err(|_| underflow(chunk, offset))?;
                stack.push(ops::not(&a));
            }

            OpCode::Add
            | OpCode::Subtract
            | OpCode::Multiply
            | OpCode::Divide
            | OpCode::Equal
            | OpCode::NotEqual
            | OpCode::Greater
            | OpCode::GreaterEqual
            | OpCode::Less
            | OpCode::LessEqual
            | OpCode::And
            | OpCode::Or => {
                let b = stack.pop().map_err(|_| underflow(chunk, offset))?;
                let a = stack.pop().map_err(|_| underflow(chunk, offset))?;
                let value = match op {
                    OpCode::Add => ops::add(&a, &b),
                    OpCode::Subtract => ops::subtract(&a, &b),
                    OpCode::Multiply => ops::multiply(&a, &b),
                    OpCode::Divide => ops::divide(&a, &b),
                    OpCode::Equal => Value::Bool(ops::equals(&a, &b)),
                    OpCode::NotEqual => Value::Bool(!ops::equals(&a, &b)),
                    OpCode::Greater => ops::greater(&a, &b),
                    OpCode::GreaterEqual => ops::greater_equal(&a, &b),
                    OpCode::Less => ops::less(&a, &b),
                    OpCode::LessEqual => ops::less_equal(&a, &b),
                    OpCode::And => ops::and(&a, &b),
                    _ => ops::or(&a, &b),
                };
                stack.push(value);
            }

            OpCode::LoadTrue => stack.push(Value::Bool(true)),
            OpCode::LoadFalse => stack.push(Value::Bool(false)),
            OpCode::LoadNull => stack.push(Value::Null),
        }
    }

    Ok(Value::Null)
}
