//! Tree-walking evaluator. `其` is threaded explicitly through `EvalContext`
//! rather than stored globally, per the design note in §4.4/§9 ("avoid a
//! global mutable — thread it through the evaluation context").

#[cfg(test)]
mod tests;

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::span::Span;
use crate::value::{zero_value, Closure, Scope, Value};

/// A thrown, in-language error: `嗚呼 <name> 之禍`, with an optional detail
/// value from a following `以 <detail>` clause. Distinct from `RuntimeError`
/// (§7): a `ThrownError` is only observable by a Wenyan `try`/`catch`, and
/// only becomes a `執行之禍` if it escapes uncaught to the top level.
#[derive(Clone, Debug, PartialEq)]
pub struct ThrownError {
    pub name: Value,
    pub detail: Option<Value>,
}

/// Non-local control transfer produced while executing a statement.
enum Flow {
    Return(Value),
    Break,
    Throw(ThrownError),
    Error(RuntimeError),
}

impl From<RuntimeError> for Flow {
    fn from(e: RuntimeError) -> Self {
        Flow::Error(e)
    }
}

type ExecResult = Result<(), Flow>;

/// Evaluation state threaded through statement execution: the current
/// lexical scope and the implicit `其` register.
pub struct EvalContext {
    pub scope: Rc<RefCell<Scope>>,
    pub it: Value,
}

impl EvalContext {
    pub fn new() -> Self {
        Self { scope: Rc::new(RefCell::new(Scope::default())), it: Value::Unit }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a whole program to completion, returning the final `其`.
pub fn eval_program(program: &Program) -> Result<Value, RuntimeError> {
    let mut ctx = EvalContext::new();
    match exec_block(&program.statements, &mut ctx) {
        Ok(()) => Ok(ctx.it),
        Err(Flow::Return(v)) => Ok(v),
        Err(Flow::Break) => Err(RuntimeError::new("`乃止是遍` used outside of a loop", 0..0)),
        Err(Flow::Throw(t)) => Err(RuntimeError::new(format!("uncaught exception: {}", t.name), 0..0)),
        Err(Flow::Error(e)) => Err(e),
    }
}

fn exec_block(stmts: &[Stmt], ctx: &mut EvalContext) -> ExecResult {
    for stmt in stmts {
        exec_stmt(stmt, ctx)?;
    }
    Ok(())
}

fn eval_value(node: &ValueNode, ctx: &EvalContext) -> Result<Value, RuntimeError> {
    match &node.node {
        Value_::Str(s) => Ok(Value::Str(s.clone())),
        Value_::Bool(b) => Ok(Value::Bool(*b)),
        Value_::Int(i) => Ok(Value::Int(*i)),
        Value_::Float(f) => Ok(Value::Float(*f)),
        Value_::It => Ok(ctx.it.clone()),
        Value_::Ident(name) => Scope::get(&ctx.scope, name)
            .ok_or_else(|| RuntimeError::new(format!("undefined variable `{name}`"), node.span.clone())),
    }
}

// `ast::Value` and `value::Value` share a name; alias the AST one locally so
// the match arms above read cleanly.
use crate::ast::Value as Value_;

fn exec_stmt(stmt: &Stmt, ctx: &mut EvalContext) -> ExecResult {
    match stmt {
        Stmt::Comment(_) => Ok(()),
        Stmt::Declare(d) => exec_declare(d, ctx).map_err(Flow::from),
        Stmt::Define(d) => exec_define(d, ctx).map_err(Flow::from),
        Stmt::FunctionDef(f) => {
            let closure = Closure { def: Rc::new(f.clone()), captured: Rc::clone(&ctx.scope) };
            Scope::declare(&ctx.scope, &f.name, Value::Function(closure));
            Ok(())
        }
        Stmt::Object(o) => exec_object(o, ctx).map_err(Flow::from),
        Stmt::If(i) => exec_if(i, ctx),
        Stmt::ForArr(f) => exec_for_arr(f, ctx),
        Stmt::ForEnum(f) => exec_for_enum(f, ctx),
        Stmt::ForForever(f) => exec_for_forever(f, ctx),
        Stmt::Break(_) => Err(Flow::Break),
        Stmt::Try(t) => exec_try(t, ctx),
        Stmt::Throw(t) => exec_throw(t, ctx),
        Stmt::Assign(a) => exec_assign(a, ctx).map_err(Flow::from),
        Stmt::Import(_) => Ok(()),
        Stmt::Print(_) => {
            println!("{}", ctx.it);
            Ok(())
        }
        Stmt::Return(r, span) => exec_return(r, span, ctx),
        Stmt::Expr(e) => exec_expr(e, ctx),
    }
}

/// A bare `吾有` declaration has nothing to bind, but it still produces a
/// value: `其` ends up holding the last slot's value, initialized or
/// zero-valued (§4.4, §8 "Loop" scenario).
fn exec_declare(d: &Declare, ctx: &mut EvalContext) -> Result<(), RuntimeError> {
    let count = d.count.max(0) as usize;
    for i in 0..count {
        let value = match d.inits.get(i) {
            Some(node) => eval_value(node, ctx)?,
            None => zero_value(d.type_tag),
        };
        ctx.it = value;
    }
    Ok(())
}

fn exec_define(d: &Define, ctx: &mut EvalContext) -> Result<(), RuntimeError> {
    let count = d.declare.count.max(0) as usize;
    for i in 0..count {
        let value = match d.declare.inits.get(i) {
            Some(node) => eval_value(node, ctx)?,
            None => zero_value(d.declare.type_tag),
        };
        if let Some(name) = d.names.get(i) {
            Scope::declare(&ctx.scope, name, value.clone());
        }
        ctx.it = value;
    }
    Ok(())
}

fn exec_object(o: &ObjectDef, ctx: &mut EvalContext) -> Result<(), RuntimeError> {
    let mut props = Vec::with_capacity(o.props.len());
    for (name, _tag, value) in &o.props {
        props.push((name.clone(), eval_value(value, ctx)?));
    }
    let object = Value::Object(Rc::new(RefCell::new(props)));
    for name in &o.names {
        Scope::declare(&ctx.scope, name, object.clone());
    }
    Ok(())
}

fn eval_if_expr(expr: &IfExpr, ctx: &EvalContext) -> Result<bool, RuntimeError> {
    let mut acc = eval_if_atom(&expr.first, ctx)?;
    for (op, atom) in &expr.rest {
        let rhs_atom = eval_if_atom(atom, ctx)?;
        acc = match op {
            LogicOp::And => acc && rhs_atom,
            LogicOp::Or => acc || rhs_atom,
            _ => {
                let lhs_value = eval_if_atom_value(&expr.first, ctx)?;
                let rhs_value = eval_value(&atom.value, ctx)?;
                let mut cmp = compare(op, &lhs_value, &rhs_value)?;
                if atom.negated {
                    cmp = !cmp;
                }
                cmp
            }
        };
    }
    Ok(acc)
}

fn eval_if_atom(atom: &IfAtom, ctx: &EvalContext) -> Result<bool, RuntimeError> {
    let value = eval_value(&atom.value, ctx)?;
    let truthy = value.is_truthy();
    Ok(if atom.negated { !truthy } else { truthy })
}

fn eval_if_atom_value(atom: &IfAtom, ctx: &EvalContext) -> Result<Value, RuntimeError> {
    eval_value(&atom.value, ctx)
}

fn compare(op: &LogicOp, lhs: &Value, rhs: &Value) -> Result<bool, RuntimeError> {
    let ordering = match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Int(a), Value::Float(b)) => (*a as f64).partial_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
        _ => None,
    };
    Ok(match op {
        LogicOp::Eq => lhs == rhs,
        LogicOp::Neq => lhs != rhs,
        LogicOp::Gt => ordering == Some(std::cmp::Ordering::Greater),
        LogicOp::Lt => ordering == Some(std::cmp::Ordering::Less),
        LogicOp::Ge => matches!(ordering, Some(std::cmp::Ordering::Greater) | Some(std::cmp::Ordering::Equal)),
        LogicOp::Le => matches!(ordering, Some(std::cmp::Ordering::Less) | Some(std::cmp::Ordering::Equal)),
        LogicOp::And | LogicOp::Or => unreachable!("handled before reaching compare"),
    })
}

fn exec_if(i: &If, ctx: &mut EvalContext) -> ExecResult {
    for clause in &i.clauses {
        let taken = match &clause.cond {
            Cond::Const(b) => *b,
            Cond::Expr(expr) => eval_if_expr(expr, ctx).map_err(Flow::from)?,
        };
        if taken {
            return exec_block(&clause.body, ctx);
        }
    }
    if let Some(body) = &i.else_body {
        return exec_block(body, ctx);
    }
    Ok(())
}

fn exec_for_arr(f: &ForArr, ctx: &mut EvalContext) -> ExecResult {
    let array = eval_value(&f.array, ctx).map_err(Flow::from)?;
    let items = match array {
        Value::Array(a) => a.borrow().clone(),
        other => return Err(Flow::Error(RuntimeError::new(format!("`中之` needs an array, found {}", other.type_name()), f.span.clone()))),
    };
    for item in items {
        Scope::declare(&ctx.scope, &f.name, item);
        match exec_block(&f.body, ctx) {
            Ok(()) => {}
            Err(Flow::Break) => break,
            other => return other,
        }
    }
    Ok(())
}

fn exec_for_enum(f: &ForEnum, ctx: &mut EvalContext) -> ExecResult {
    let count = match eval_value(&f.count, ctx).map_err(Flow::from)? {
        Value::Int(i) => i,
        other => return Err(Flow::Error(RuntimeError::new(format!("`遍` needs a count, found {}", other.type_name()), f.span.clone()))),
    };
    for _ in 0..count.max(0) {
        match exec_block(&f.body, ctx) {
            Ok(()) => {}
            Err(Flow::Break) => break,
            other => return other,
        }
    }
    Ok(())
}

fn exec_for_forever(f: &ForForever, ctx: &mut EvalContext) -> ExecResult {
    loop {
        match exec_block(&f.body, ctx) {
            Ok(()) => {}
            Err(Flow::Break) => break,
            other => return other,
        }
    }
    Ok(())
}

fn exec_try(t: &Try, ctx: &mut EvalContext) -> ExecResult {
    let result = exec_block(&t.body, ctx);
    match result {
        Err(Flow::Throw(thrown)) => {
            for catch in &t.catches {
                let matches = match &catch.kind {
                    CatchKind::Any => true,
                    CatchKind::Typed(type_value) => {
                        let descriptor = eval_value(type_value, ctx).map_err(Flow::from)?;
                        descriptor == thrown.name
                    }
                };
                if !matches {
                    continue;
                }
                if let Some(name) = &catch.bind {
                    let bound = thrown.detail.clone().unwrap_or_else(|| thrown.name.clone());
                    Scope::declare(&ctx.scope, name, bound);
                }
                return exec_block(&catch.body, ctx);
            }
            Err(Flow::Throw(thrown))
        }
        other => other,
    }
}

fn exec_throw(t: &Throw, ctx: &mut EvalContext) -> ExecResult {
    let name = eval_value(&t.value, ctx).map_err(Flow::from)?;
    let detail = match &t.detail {
        Some(node) => Some(eval_value(node, ctx).map_err(Flow::from)?),
        None => None,
    };
    Err(Flow::Throw(ThrownError { name, detail }))
}

fn exec_assign(a: &Assign, ctx: &mut EvalContext) -> Result<(), RuntimeError> {
    if matches!(a.rhs, AssignRhs::Delete) {
        if !Scope::remove(&ctx.scope, &a.target) {
            return Err(RuntimeError::new(format!("cannot delete undefined variable `{}`", a.target), a.span.clone()));
        }
        return Ok(());
    }

    let (value, subscript) = match &a.rhs {
        AssignRhs::Value { value, subscript } => (eval_value(value, ctx)?, subscript.as_ref()),
        AssignRhs::Delete => unreachable!(),
    };
    let index_node = a.target_subscript.as_ref().or(subscript);

    if let Some(index_node) = index_node {
        let current = Scope::get(&ctx.scope, &a.target)
            .ok_or_else(|| RuntimeError::new(format!("undefined variable `{}`", a.target), a.span.clone()))?;
        let index = match eval_value(index_node, ctx)? {
            Value::Int(i) => i,
            other => return Err(RuntimeError::new(format!("expected an index, found {}", other.type_name()), a.span.clone())),
        };
        match current {
            Value::Array(arr) => {
                let mut arr = arr.borrow_mut();
                let idx = (index - 1).max(0) as usize;
                if idx >= arr.len() {
                    return Err(RuntimeError::new(format!("index {index} out of bounds"), a.span.clone()));
                }
                arr[idx] = value;
                Ok(())
            }
            other => Err(RuntimeError::new(format!("cannot index into {}", other.type_name()), a.span.clone())),
        }
    } else if Scope::set(&ctx.scope, &a.target, value) {
        Ok(())
    } else {
        Err(RuntimeError::new(format!("undefined variable `{}`", a.target), a.span.clone()))
    }
}

fn exec_return(r: &Return, span: &Span, ctx: &mut EvalContext) -> ExecResult {
    let value = match r {
        Return::It => ctx.it.clone(),
        Return::Unit => Value::Unit,
        Return::Value(node) => eval_value(node, ctx).map_err(Flow::from)?,
    };
    let _ = span;
    Err(Flow::Return(value))
}

fn exec_expr(e: &ExprStmt, ctx: &mut EvalContext) -> ExecResult {
    let value = eval_expr(&e.expr, &e.span, ctx)?;
    ctx.it = value;
    Ok(())
}

fn eval_expr(expr: &Expr, span: &Span, ctx: &mut EvalContext) -> Result<Value, Flow> {
    match expr {
        Expr::Bare(v) => eval_value(v, ctx).map_err(Flow::from),
        Expr::Subscript { target, index } => eval_subscript(target, index, span, ctx),
        Expr::Length { target } => eval_length(target, span, ctx),
        Expr::LogicProbe(expr) => Ok(Value::Bool(eval_if_expr(expr, ctx).map_err(Flow::from)?)),
        Expr::Math(m) => eval_math(m, span, ctx),
        Expr::Not(v) => Ok(Value::Bool(!eval_value(v, ctx).map_err(Flow::from)?.is_truthy())),
        Expr::Concat { lhs, rhs } => {
            let lhs = eval_value(lhs, ctx).map_err(Flow::from)?;
            let rhs = eval_value(rhs, ctx).map_err(Flow::from)?;
            Ok(Value::Str(format!("{lhs}{rhs}")))
        }
        Expr::Push { target, value } => eval_push(target, value, span, ctx),
        Expr::Call { callee, args } => eval_call(callee, args, span, ctx),
    }
}

fn eval_subscript(target: &ValueNode, index: &ValueNode, span: &Span, ctx: &mut EvalContext) -> Result<Value, Flow> {
    let target_value = eval_value(target, ctx).map_err(Flow::from)?;
    let index_value = eval_value(index, ctx).map_err(Flow::from)?;
    let i = match index_value {
        Value::Int(i) => i,
        other => return Err(Flow::Error(RuntimeError::new(format!("expected an index, found {}", other.type_name()), span.clone()))),
    };
    match target_value {
        Value::Array(arr) => {
            let arr = arr.borrow();
            let idx = i - 1;
            if idx < 0 || idx as usize >= arr.len() {
                return Err(Flow::Error(RuntimeError::new(format!("index {i} out of bounds"), span.clone())));
            }
            Ok(arr[idx as usize].clone())
        }
        Value::Str(s) => {
            let idx = i - 1;
            s.chars().nth(idx.max(0) as usize).map(|c| Value::Str(c.to_string())).ok_or_else(|| {
                Flow::Error(RuntimeError::new(format!("index {i} out of bounds"), span.clone()))
            })
        }
        other => Err(Flow::Error(RuntimeError::new(format!("cannot index into {}", other.type_name()), span.clone()))),
    }
}

fn eval_length(target: &ValueNode, span: &Span, ctx: &mut EvalContext) -> Result<Value, Flow> {
    let value = eval_value(target, ctx).map_err(Flow::from)?;
    match value {
        Value::Array(arr) => Ok(Value::Int(arr.borrow().len() as i64)),
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        other => Err(Flow::Error(RuntimeError::new(format!("`之長` needs an array or string, found {}", other.type_name()), span.clone()))),
    }
}

fn eval_math(m: &Math, span: &Span, ctx: &mut EvalContext) -> Result<Value, Flow> {
    let lhs = eval_value(&m.lhs, ctx).map_err(Flow::from)?;
    let rhs = eval_value(&m.rhs, ctx).map_err(Flow::from)?;

    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        let (a, b) = (*a, *b);
        if m.modulo {
            if m.op != MathOp::Div {
                return Err(Flow::Error(RuntimeError::new("`所餘幾何` is only meaningful with `除`", span.clone())));
            }
            if b == 0 {
                return Err(Flow::Error(RuntimeError::new("division by zero", span.clone())));
            }
            return Ok(Value::Int(a.checked_rem(b).ok_or_else(|| overflow(span))?));
        }
        let result = match m.op {
            MathOp::Add => a.checked_add(b),
            MathOp::Sub => a.checked_sub(b),
            MathOp::Mul => a.checked_mul(b),
            MathOp::Div => {
                if b == 0 {
                    return Err(Flow::Error(RuntimeError::new("division by zero", span.clone())));
                }
                a.checked_div(b)
            }
        };
        return result.map(Value::Int).ok_or_else(|| overflow(span));
    }

    let a = as_f64(&lhs).ok_or_else(|| type_error(&lhs, span))?;
    let b = as_f64(&rhs).ok_or_else(|| type_error(&rhs, span))?;
    let result = match m.op {
        MathOp::Add => a + b,
        MathOp::Sub => a - b,
        MathOp::Mul => a * b,
        MathOp::Div => a / b,
    };
    Ok(Value::Float(if m.modulo { a % b } else { result }))
}

fn as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn overflow(span: &Span) -> Flow {
    Flow::Error(RuntimeError::new("arithmetic overflowed i64", span.clone()))
}

fn type_error(v: &Value, span: &Span) -> Flow {
    Flow::Error(RuntimeError::new(format!("expected a number, found {}", v.type_name()), span.clone()))
}

fn eval_push(target: &ValueNode, value: &ValueNode, span: &Span, ctx: &mut EvalContext) -> Result<Value, Flow> {
    let target_value = eval_value(target, ctx).map_err(Flow::from)?;
    let pushed = eval_value(value, ctx).map_err(Flow::from)?;
    match target_value {
        Value::Array(arr) => {
            arr.borrow_mut().push(pushed);
            Ok(Value::Array(arr))
        }
        other => Err(Flow::Error(RuntimeError::new(format!("`充` needs an array, found {}", other.type_name()), span.clone()))),
    }
}

fn eval_call(callee: &ValueNode, args: &[ValueNode], span: &Span, ctx: &mut EvalContext) -> Result<Value, Flow> {
    let callee_value = eval_value(callee, ctx).map_err(Flow::from)?;
    let closure = match callee_value {
        Value::Function(c) => c,
        other => return Err(Flow::Error(RuntimeError::new(format!("cannot call {}", other.type_name()), span.clone()))),
    };

    let mut arg_values = Vec::with_capacity(args.len());
    for arg in args {
        arg_values.push(eval_value(arg, ctx).map_err(Flow::from)?);
    }

    let mut call_ctx = EvalContext { scope: Scope::child(Rc::clone(&closure.captured)), it: Value::Unit };

    let mut flat_names: Vec<&str> = Vec::new();
    for group in &closure.def.param_groups {
        for name in &group.names {
            flat_names.push(name);
        }
    }

    let mut values = arg_values.drain(..);
    for name in &flat_names {
        let value = values.next().unwrap_or(Value::Unit);
        Scope::declare(&call_ctx.scope, name, value);
    }
    if let Some(rest) = &closure.def.rest_param {
        let remaining: Vec<Value> = values.collect();
        Scope::declare(&call_ctx.scope, &rest.name, Value::Array(Rc::new(RefCell::new(remaining))));
    }

    match exec_block(&closure.def.body, &mut call_ctx) {
        Ok(()) => Ok(Value::Unit),
        Err(Flow::Return(v)) => Ok(v),
        Err(Flow::Break) => Err(Flow::Error(RuntimeError::new("`乃止是遍` used outside of a loop", span.clone()))),
        Err(other) => Err(other),
    }
}
