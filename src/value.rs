//! Runtime values produced by the evaluator. Distinct from `ast::Value`,
//! which is parse-time syntax (`data | 其`) — this is what that syntax
//! evaluates to.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use enum_map::Enum;

use crate::ast::{FunctionDef, TypeTag};

/// A function value closes over the scope it was defined in, per §4.4
/// lexical scoping.
#[derive(Clone)]
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub captured: Rc<RefCell<Scope>>,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Closure({})", self.def.name)
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.def, &other.def) && Rc::ptr_eq(&self.captured, &other.captured)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Array(Rc<RefCell<Vec<Value>>>),
    /// Object properties keep declaration order (§3 "ordered map"), so a
    /// `Vec` of pairs stands in for an order-preserving map without
    /// introducing a new dependency for it.
    Object(Rc<RefCell<Vec<(String, Value)>>>),
    Function(Closure),
    Unit,
}

impl Value {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Int(_) | Value::Float(_) => TypeTag::Num,
            Value::Str(_) => TypeTag::Str,
            Value::Bool(_) => TypeTag::Bool,
            Value::Array(_) => TypeTag::Arr,
            Value::Object(_) => TypeTag::Obj,
            Value::Function(_) => TypeTag::Obj,
            Value::Unit => TypeTag::Unit,
        }
    }

    /// §4.4 truthiness: `陰`/`陽` are literal, numbers nonzero, strings and
    /// arrays nonempty, objects always truthy, `元` always falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(a) => !a.borrow().is_empty(),
            Value::Object(_) | Value::Function(_) => true,
            Value::Unit => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self.type_tag() {
            TypeTag::Num => "數",
            TypeTag::Str => "言",
            TypeTag::Bool => "爻",
            TypeTag::Arr => "列",
            TypeTag::Obj => "物",
            TypeTag::Unit => "元",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::Bool(true) => write!(f, "陽"),
            Value::Bool(false) => write!(f, "陰"),
            Value::Array(a) => {
                let items: Vec<String> = a.borrow().iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            Value::Object(o) => {
                let items: Vec<String> = o.borrow().iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            Value::Function(c) => write!(f, "<術 {}>", c.def.name),
            Value::Unit => write!(f, "元"),
        }
    }
}

impl Enum for TypeTag {
    const LENGTH: usize = 6;

    fn from_usize(value: usize) -> Self {
        match value {
            0 => TypeTag::Num,
            1 => TypeTag::Str,
            2 => TypeTag::Bool,
            3 => TypeTag::Arr,
            4 => TypeTag::Obj,
            5 => TypeTag::Unit,
            _ => panic!("out of range TypeTag index: {value}"),
        }
    }

    fn into_usize(self) -> usize {
        match self {
            TypeTag::Num => 0,
            TypeTag::Str => 1,
            TypeTag::Bool => 2,
            TypeTag::Arr => 3,
            TypeTag::Obj => 4,
            TypeTag::Unit => 5,
        }
    }
}

/// The type-specific zero value used to populate a `吾有 <N> <TYPE>`
/// declaration whose initializers run short (§3 `Declare` invariant).
pub fn zero_value(tag: TypeTag) -> Value {
    use enum_map::enum_map;
    let defaults = enum_map! {
        TypeTag::Num => Value::Int(0),
        TypeTag::Str => Value::Str(String::new()),
        TypeTag::Bool => Value::Bool(false),
        TypeTag::Arr => Value::Array(Rc::new(RefCell::new(Vec::new()))),
        TypeTag::Obj => Value::Object(Rc::new(RefCell::new(Vec::new()))),
        TypeTag::Unit => Value::Unit,
    };
    defaults[tag].clone()
}

/// A lexical scope: a frame of bindings with an optional parent, per §4.4.
#[derive(Debug, Default)]
pub struct Scope {
    pub bindings: std::collections::HashMap<String, Value>,
    pub parent: Option<Rc<RefCell<Scope>>>,
}

impl Scope {
    pub fn child(parent: Rc<RefCell<Scope>>) -> Rc<RefCell<Scope>> {
        Rc::new(RefCell::new(Scope {
            bindings: std::collections::HashMap::new(),
            parent: Some(parent),
        }))
    }

    pub fn get(scope: &Rc<RefCell<Scope>>, name: &str) -> Option<Value> {
        let this = scope.borrow();
        if let Some(v) = this.bindings.get(name) {
            return Some(v.clone());
        }
        this.parent.as_ref().and_then(|p| Scope::get(p, name))
    }

    pub fn set(scope: &Rc<RefCell<Scope>>, name: &str, value: Value) -> bool {
        let mut this = scope.borrow_mut();
        if this.bindings.contains_key(name) {
            this.bindings.insert(name.to_string(), value);
            return true;
        }
        match &this.parent {
            Some(p) => {
                let parent = Rc::clone(p);
                drop(this);
                Scope::set(&parent, name, value)
            }
            None => false,
        }
    }

    pub fn declare(scope: &Rc<RefCell<Scope>>, name: &str, value: Value) {
        scope.borrow_mut().bindings.insert(name.to_string(), value);
    }

    pub fn remove(scope: &Rc<RefCell<Scope>>, name: &str) -> bool {
        scope.borrow_mut().bindings.remove(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_rules() {
        assert!(!Value::Unit.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
        assert!(Value::Bool(false).is_truthy() == false);
    }

    #[test]
    fn zero_values_per_tag() {
        assert_eq!(zero_value(TypeTag::Num), Value::Int(0));
        assert_eq!(zero_value(TypeTag::Bool), Value::Bool(false));
    }

    #[test]
    fn scope_lookup_walks_parents() {
        let root = Rc::new(RefCell::new(Scope::default()));
        Scope::declare(&root, "甲", Value::Int(1));
        let child = Scope::child(Rc::clone(&root));
        assert_eq!(Scope::get(&child, "甲"), Some(Value::Int(1)));
        assert!(Scope::set(&child, "甲", Value::Int(2)));
        assert_eq!(Scope::get(&root, "甲"), Some(Value::Int(2)));
    }
}
