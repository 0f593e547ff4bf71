use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::lua::Stat;
use crate::types::ty::format_number;

use super::scope::Scope;

/// Builtin function identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    ToString,
    Error,
    Require,
    Type,
    StringUpper,
    StringLower,
    StringLen,
    StringRep,
    StringSub,
    MathFloor,
    MathAbs,
    MathMax,
    MathMin,
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::ToString => "tostring",
            Builtin::Error => "error",
            Builtin::Require => "require",
            Builtin::Type => "type",
            Builtin::StringUpper => "string.upper",
            Builtin::StringLower => "string.lower",
            Builtin::StringLen => "string.len",
            Builtin::StringRep => "string.rep",
            Builtin::StringSub => "string.sub",
            Builtin::MathFloor => "math.floor",
            Builtin::MathAbs => "math.abs",
            Builtin::MathMax => "math.max",
            Builtin::MathMin => "math.min",
        }
    }
}

/// A Lua table: string keys plus the array part `1..n`.
#[derive(Debug, Default)]
pub struct Table {
    pub fields: HashMap<String, Value>,
    pub items: Vec<Value>,
}

impl Table {
    pub fn get(&self, key: &Value) -> Value {
        match key {
            Value::Str(name) => self.fields.get(name.as_ref()).cloned().unwrap_or(Value::Nil),
            Value::Number(n) => array_slot(*n)
                .and_then(|i| self.items.get(i))
                .cloned()
                .unwrap_or(Value::Nil),
            _ => Value::Nil,
        }
    }

    pub fn set(&mut self, key: &Value, value: Value) {
        match key {
            Value::Str(name) => {
                self.fields.insert(name.to_string(), value);
            }
            Value::Number(n) => match array_slot(*n) {
                Some(i) if i < self.items.len() => self.items[i] = value,
                Some(i) if i == self.items.len() => self.items.push(value),
                _ => {}
            },
            _ => {}
        }
    }
}

fn array_slot(n: f64) -> Option<usize> {
    (n.fract() == 0.0 && n >= 1.0).then(|| n as usize - 1)
}

/// A Lua function closing over the scope it was created in.
#[derive(Debug)]
pub struct Closure {
    pub params: Vec<String>,
    pub body: Vec<Stat>,
    pub scope: Rc<Scope>,
}

/// Runtime value representation
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Table(Rc<RefCell<Table>>),
    Function(Rc<Closure>),
    Builtin(Builtin),
}

impl Value {
    pub fn string(value: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(value.as_ref()))
    }

    pub fn table(table: Table) -> Self {
        Value::Table(Rc::new(RefCell::new(table)))
    }

    /// Only `nil` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Table(_) => "table",
            Value::Function(_) | Value::Builtin(_) => "function",
        }
    }

    /// Primitive equality: tables and functions compare by identity.
    pub fn raw_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Table(a), Value::Table(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Table(t) => write!(f, "table: {:p}", Rc::as_ptr(t)),
            Value::Function(c) => write!(f, "function: {:p}", Rc::as_ptr(c)),
            Value::Builtin(b) => write!(f, "function: builtin: {}", b.name()),
        }
    }
}
