//! Evaluator for Brewin programs
//!
//! A tree-walking interpreter over the parsed AST. Statements produce a
//! `ControlFlow` signal so that `return` unwinds through nested blocks and
//! loops up to the function boundary; runtime errors travel separately in the
//! `Result` and abort the whole run.

use brewin_ast::ast::{BinOp, Call, Expr, Lit, Program, Stmt, UnOp};
use brewin_types::{coerce, default_value, Binding, TypeTag, Value};
use std::collections::HashMap;

use crate::env::Env;
use crate::error::{Result, RuntimeError};
use crate::functions::{Builtin, FunctionDef, FunctionRegistry};
use crate::host::Console;
use crate::structs::StructRegistry;
use crate::typing::{self, Site};

/// Maximum user call depth before the run is aborted
const MAX_CALL_DEPTH: u32 = 10_000;

/// Remaining stack below which evaluation grows the stack
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Result of executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFlow {
    /// Continue with the next statement
    Normal,
    /// Return statement - bubbles up to function boundary
    Return(Value),
}

impl ControlFlow {
    pub fn is_return(&self) -> bool {
        matches!(self, ControlFlow::Return(_))
    }
}

/// Registers every struct and function of `program`, then calls `main()`.
///
/// Output written before an error stays written; the error is returned.
pub fn run_program(program: &Program, console: &mut dyn Console) -> Result<Value> {
    let structs = StructRegistry::new(&program.structs);
    let functions = FunctionRegistry::new(&program.functions);
    tracing::debug!(
        structs = structs.len(),
        functions = functions.len(),
        "registered program definitions"
    );
    Interpreter::new(&structs, &functions, console).run_main()
}

pub struct Interpreter<'a> {
    structs: &'a StructRegistry,
    functions: &'a FunctionRegistry,
    console: &'a mut dyn Console,
    depth: u32,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        structs: &'a StructRegistry,
        functions: &'a FunctionRegistry,
        console: &'a mut dyn Console,
    ) -> Self {
        Self {
            structs,
            functions,
            console,
            depth: 0,
        }
    }

    /// Call the zero-argument `main`.
    pub fn run_main(&mut self) -> Result<Value> {
        let functions = self.functions;
        let main = functions
            .resolve("main", 0)
            .map_err(|_| RuntimeError::name("no main() function was found"))?;
        self.call_function(main, Vec::new())
    }

    pub fn execute_statement(&mut self, stmt: &Stmt, env: &mut Env) -> Result<ControlFlow> {
        tracing::trace!(kind = stmt_kind(stmt), "execute");
        match stmt {
            Stmt::VarDef { name, ty } => {
                let binding = self.structs.default_binding(&TypeTag::from(ty))?;
                env.declare(name, binding)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Assign { target, value } => {
                let v = self.evaluate_expression(value, env)?;
                env.assign(target, v, self.structs)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Call(call) => {
                self.eval_call(call, env, false)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Return(value) => {
                let v = match value {
                    Some(expr) => self.evaluate_expression(expr, env)?,
                    None => Value::Nil,
                };
                Ok(ControlFlow::Return(v))
            }

            Stmt::If { cond, then_, else_ } => {
                let branch = if self.condition(cond, env, "if")? {
                    then_.as_slice()
                } else {
                    else_.as_deref().unwrap_or(&[])
                };
                env.with_scope(|env| self.execute_statements(branch, env))
            }

            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                let cf = self.execute_statement(init, env)?;
                if cf.is_return() {
                    return Ok(cf);
                }
                while self.condition(cond, env, "for")? {
                    let cf = env.with_scope(|env| self.execute_statements(body, env))?;
                    // A return skips the update
                    if cf.is_return() {
                        return Ok(cf);
                    }
                    self.execute_statement(update, env)?;
                }
                Ok(ControlFlow::Normal)
            }
        }
    }

    /// Run `stmts` in order in the current scope, stopping at the first
    /// return.
    fn execute_statements(&mut self, stmts: &[Stmt], env: &mut Env) -> Result<ControlFlow> {
        for stmt in stmts {
            let cf = self.execute_statement(stmt, env)?;
            if cf.is_return() {
                return Ok(cf);
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// Evaluate an expression, growing the native stack for deep recursion
    pub fn evaluate_expression(&mut self, expr: &Expr, env: &Env) -> Result<Value> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.eval_inner(expr, env))
    }

    fn eval_inner(&mut self, expr: &Expr, env: &Env) -> Result<Value> {
        match expr {
            Expr::Lit(Lit::Int(v)) => Ok(Value::Int(*v)),
            Expr::Lit(Lit::Bool(b)) => Ok(Value::Bool(*b)),
            Expr::Lit(Lit::Str(s)) => Ok(Value::Str(s.clone())),
            Expr::Lit(Lit::Nil) => Ok(Value::Nil),

            Expr::Var(path) => env.read(path),

            Expr::Unary { op, expr } => {
                let v = self.evaluate_expression(expr, env)?;
                eval_unary(*op, v)
            }

            // Both operands are always evaluated, left to right; `&&` and
            // `||` do not short-circuit.
            Expr::Binary { lhs, op, rhs } => {
                let l = self.evaluate_expression(lhs, env)?;
                let r = self.evaluate_expression(rhs, env)?;
                eval_binary(*op, l, r)
            }

            Expr::Call(call) => self.eval_call(call, env, true),

            Expr::New(name) => self.structs.instantiate(name),
        }
    }

    /// Evaluate a condition, coercing `int` to `bool`.
    fn condition(&mut self, cond: &Expr, env: &Env, construct: &str) -> Result<bool> {
        match coerce(self.evaluate_expression(cond, env)?, &TypeTag::Bool) {
            Value::Bool(b) => Ok(b),
            other => Err(RuntimeError::type_(format!(
                "{construct} condition must be bool, got {}",
                other.type_name()
            ))),
        }
    }

    fn eval_call(&mut self, call: &Call, env: &Env, in_expression: bool) -> Result<Value> {
        if let Some(builtin) = Builtin::from_name(&call.name) {
            return self.call_builtin(builtin, &call.args, env);
        }

        let functions = self.functions;
        let def = functions.resolve(&call.name, call.args.len())?;
        if in_expression && def.ret_ty == TypeTag::Void {
            return Err(RuntimeError::type_(format!(
                "function `{}` returns void and cannot be used in an expression",
                def.name
            )));
        }

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.evaluate_expression(arg, env)?);
        }
        self.call_function(def, args)
    }

    /// Call a user function with already evaluated arguments.
    ///
    /// The callee runs in a fresh environment holding only its parameters;
    /// the caller's environment is untouched. The returned value is typed
    /// against the declared return type, `nil` standing in for the type's
    /// default.
    pub fn call_function(&mut self, def: &FunctionDef, args: Vec<Value>) -> Result<Value> {
        if args.len() != def.arity() {
            return Err(RuntimeError::arity_mismatch(&def.name, args.len()));
        }

        let mut frame = HashMap::with_capacity(args.len());
        for ((name, ty), value) in def.params.iter().zip(args) {
            let site = Site::Param {
                func: &def.name,
                param: name,
            };
            let value = typing::conform(self.structs, value, ty, site)?;
            frame.insert(name.clone(), Binding::new(value, ty.clone()));
        }

        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeError::fault(format!(
                "maximum call depth exceeded (limit: {MAX_CALL_DEPTH} calls)"
            )));
        }
        self.depth += 1;
        tracing::debug!(function = %def.name, depth = self.depth, "call");

        // Call statements recurse without passing through evaluate_expression.
        let mut callee_env = Env::with_bindings(frame);
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || {
            callee_env.with_scope(|env| self.execute_statements(&def.body, env))
        });
        self.depth -= 1;

        let returned = match result? {
            ControlFlow::Return(v) => v,
            ControlFlow::Normal => Value::Nil,
        };
        let returned = if returned.is_nil() {
            default_value(&def.ret_ty).unwrap_or(Value::Nil)
        } else {
            returned
        };
        let value = typing::conform(self.structs, returned, &def.ret_ty, Site::Return { func: &def.name })?;
        tracing::debug!(function = %def.name, depth = self.depth, "return");
        Ok(value)
    }

    fn call_builtin(&mut self, builtin: Builtin, args: &[Expr], env: &Env) -> Result<Value> {
        match builtin {
            Builtin::Print => {
                let mut line = String::new();
                for arg in args {
                    let v = self.evaluate_expression(arg, env)?;
                    line.push_str(&v.to_string());
                }
                self.console.write_line(&line)?;
                Ok(Value::Nil)
            }
            Builtin::InputI | Builtin::InputS => {
                if args.len() > 1 {
                    return Err(RuntimeError::name(format!(
                        "no {}() function found that takes {} parameters",
                        builtin.name(),
                        args.len()
                    )));
                }
                if let Some(prompt) = args.first() {
                    let prompt = self.evaluate_expression(prompt, env)?;
                    self.console.write_line(&prompt.to_string())?;
                }
                let line = self.console.read_line()?;
                if builtin == Builtin::InputI {
                    if let Ok(n) = line.trim().parse::<i64>() {
                        return Ok(Value::Int(n));
                    }
                }
                Ok(Value::Str(line))
            }
        }
    }
}

fn eval_unary(op: UnOp, v: Value) -> Result<Value> {
    match (op, v) {
        (UnOp::Neg, Value::Int(i)) => Ok(Value::Int(i.wrapping_neg())),
        (UnOp::Neg, other) => Err(RuntimeError::type_(format!(
            "negation expects int, got {}",
            other.type_name()
        ))),
        (UnOp::Not, v) => match coerce(v, &TypeTag::Bool) {
            Value::Bool(b) => Ok(Value::Bool(!b)),
            other => Err(RuntimeError::type_(format!(
                "`!` expects bool, got {}",
                other.type_name()
            ))),
        },
    }
}

fn eval_binary(op: BinOp, l: Value, r: Value) -> Result<Value> {
    use BinOp::*;

    match op {
        Add => match (l, r) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
            (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
            (l, r) => Err(operand_mismatch(op, &l, &r, "both int or both string")),
        },

        Sub | Mul | Div => match (l, r) {
            (Value::Int(a), Value::Int(b)) => match op {
                Sub => Ok(Value::Int(a.wrapping_sub(b))),
                Mul => Ok(Value::Int(a.wrapping_mul(b))),
                _ if b == 0 => Err(RuntimeError::fault("division by zero")),
                _ => Ok(Value::Int(a.wrapping_div(b))),
            },
            (l, r) => Err(operand_mismatch(op, &l, &r, "int")),
        },

        Lt | Le | Gt | Ge => match (l, r) {
            (Value::Int(a), Value::Int(b)) => Ok(Value::Bool(match op {
                Lt => a < b,
                Le => a <= b,
                Gt => a > b,
                _ => a >= b,
            })),
            (l, r) => Err(operand_mismatch(op, &l, &r, "int")),
        },

        // Values of different types are simply unequal.
        Eq => Ok(Value::Bool(l == r)),
        Ne => Ok(Value::Bool(l != r)),

        And | Or => {
            // An int operand is coerced only when the other side is a bool.
            let l = if matches!(r, Value::Bool(_)) {
                coerce(l, &TypeTag::Bool)
            } else {
                l
            };
            let r = if matches!(l, Value::Bool(_)) {
                coerce(r, &TypeTag::Bool)
            } else {
                r
            };
            match (l, r) {
                (Value::Bool(a), Value::Bool(b)) => {
                    Ok(Value::Bool(if op == And { a && b } else { a || b }))
                }
                (l, r) => Err(operand_mismatch(op, &l, &r, "bool")),
            }
        }
    }
}

fn operand_mismatch(op: BinOp, l: &Value, r: &Value, expected: &str) -> RuntimeError {
    RuntimeError::type_(format!(
        "operands of `{op}` must be {expected}, got {} and {}",
        l.type_name(),
        r.type_name()
    ))
}

fn stmt_kind(stmt: &Stmt) -> &'static str {
    match stmt {
        Stmt::VarDef { .. } => "vardef",
        Stmt::Assign { .. } => "assign",
        Stmt::Call(_) => "call",
        Stmt::Return(_) => "return",
        Stmt::If { .. } => "if",
        Stmt::For { .. } => "for",
    }
}
