use std::collections::HashMap;
use std::rc::Rc;

use crate::lua::{BinOp, Expr, Stat, TableField, UnOp};
use crate::types::ty::format_number;

use super::RuntimeError;
use super::scope::Scope;
use super::value::{Builtin, Closure, Table, Value};

/// Largest string `string.rep` may build.
const MAX_STRING_LEN: usize = 1 << 28;

/// How a block finished.
enum Flow {
    Normal,
    Return(Vec<Value>),
}

/// Evaluates Lua trees produced by the code generator.
pub struct Interpreter {
    root: Rc<Scope>,
    /// Globals assigned at runtime.
    globals: HashMap<String, Value>,
    /// Values returned by loaded chunks, keyed by module name.
    modules: HashMap<String, Value>,
    output: Vec<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let library = |entries: &[Builtin]| {
            let mut table = Table::default();
            for builtin in entries {
                let name = builtin.name().rsplit('.').next().unwrap_or_default();
                table.fields.insert(name.to_string(), Value::Builtin(*builtin));
            }
            Value::table(table)
        };

        let globals = [
            ("print", Value::Builtin(Builtin::Print)),
            ("tostring", Value::Builtin(Builtin::ToString)),
            ("error", Value::Builtin(Builtin::Error)),
            ("require", Value::Builtin(Builtin::Require)),
            ("type", Value::Builtin(Builtin::Type)),
            (
                "string",
                library(&[
                    Builtin::StringUpper,
                    Builtin::StringLower,
                    Builtin::StringLen,
                    Builtin::StringRep,
                    Builtin::StringSub,
                ]),
            ),
            (
                "math",
                library(&[
                    Builtin::MathFloor,
                    Builtin::MathAbs,
                    Builtin::MathMax,
                    Builtin::MathMin,
                ]),
            ),
        ];

        Interpreter {
            root: Scope::root(globals.into_iter().map(|(name, value)| (name.to_string(), value))),
            globals: HashMap::new(),
            modules: HashMap::new(),
            output: Vec::new(),
        }
    }

    /// Lines written by `print` so far.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub fn module(&self, name: &str) -> Option<&Value> {
        self.modules.get(name)
    }

    /// Run a chunk as module `name`; its return value becomes what
    /// `require(name)` yields.
    pub fn load(&mut self, name: &str, chunk: &crate::lua::Chunk) -> Result<Value, RuntimeError> {
        log::debug!("running chunk {}", name);
        let root = Rc::clone(&self.root);
        let value = match self.exec_block(&chunk.body, &root)? {
            Flow::Return(values) => values.into_iter().next().unwrap_or(Value::Nil),
            Flow::Normal => Value::Nil,
        };
        self.modules.insert(name.to_string(), value.clone());
        Ok(value)
    }

    /// Call a function value with the given arguments.
    pub fn call(&mut self, func: &Value, args: Vec<Value>) -> Result<Vec<Value>, RuntimeError> {
        match func {
            Value::Function(closure) => {
                let bindings = closure
                    .params
                    .iter()
                    .enumerate()
                    .map(|(i, param)| (param.clone(), args.get(i).cloned().unwrap_or(Value::Nil)));
                let scope = Scope::extend(&closure.scope, bindings);
                match self.exec_block(&closure.body, &scope)? {
                    Flow::Return(values) => Ok(values),
                    Flow::Normal => Ok(vec![]),
                }
            }
            Value::Builtin(builtin) => self.call_builtin(*builtin, args),
            other => Err(RuntimeError::NotCallable(other.type_name())),
        }
    }

    fn call_builtin(&mut self, builtin: Builtin, args: Vec<Value>) -> Result<Vec<Value>, RuntimeError> {
        let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Nil);
        let number = |i: usize| match arg(i) {
            Value::Number(n) => Ok(n),
            other => Err(RuntimeError::BadArgument {
                function: builtin.name(),
                expected: "number",
                found: other.type_name(),
            }),
        };
        let string = |i: usize| match arg(i) {
            Value::Str(s) => Ok(s),
            Value::Number(n) => Ok(Rc::from(format_number(n))),
            other => Err(RuntimeError::BadArgument {
                function: builtin.name(),
                expected: "string",
                found: other.type_name(),
            }),
        };

        let result = match builtin {
            Builtin::Print => {
                let line = args.iter().map(Value::to_string).collect::<Vec<_>>().join("\t");
                self.output.push(line);
                return Ok(vec![]);
            }
            Builtin::ToString => Value::string(arg(0).to_string()),
            Builtin::Error => return Err(RuntimeError::Raised(arg(0).to_string())),
            Builtin::Require => {
                let name = string(0)?;
                return self
                    .modules
                    .get(name.as_ref())
                    .cloned()
                    .map(|module| vec![module])
                    .ok_or_else(|| RuntimeError::UnknownModule(name.to_string()));
            }
            Builtin::Type => Value::string(arg(0).type_name()),
            Builtin::StringUpper => Value::string(string(0)?.to_uppercase()),
            Builtin::StringLower => Value::string(string(0)?.to_lowercase()),
            Builtin::StringLen => Value::Number(string(0)?.len() as f64),
            Builtin::StringRep => {
                let s = string(0)?;
                let count = number(1)?;
                let count = if count.is_nan() || count < 1.0 { 0.0 } else { count.floor() };
                if count * s.len() as f64 > MAX_STRING_LEN as f64 {
                    return Err(RuntimeError::StringTooLarge);
                }
                Value::string(s.repeat(count as usize))
            }
            Builtin::StringSub => {
                let s = string(0)?;
                let len = s.len() as i64;
                let index = |n: f64| if n < 0.0 { len + n as i64 + 1 } else { n as i64 };
                let start = index(number(1)?).max(1);
                let end = match arg(2) {
                    Value::Nil => len,
                    _ => index(number(2)?).min(len),
                };
                if start > end {
                    Value::string("")
                } else {
                    // byte offsets, as in Lua
                    let bytes = &s.as_bytes()[(start - 1) as usize..end as usize];
                    Value::string(String::from_utf8_lossy(bytes))
                }
            }
            Builtin::MathFloor => Value::Number(number(0)?.floor()),
            Builtin::MathAbs => Value::Number(number(0)?.abs()),
            Builtin::MathMax => Value::Number(number(0)?.max(number(1)?)),
            Builtin::MathMin => Value::Number(number(0)?.min(number(1)?)),
        };
        Ok(vec![result])
    }

    // === Statements ===

    fn exec_block(&mut self, body: &[Stat], scope: &Rc<Scope>) -> Result<Flow, RuntimeError> {
        let mut scope = Rc::clone(scope);
        for stat in body {
            match stat {
                Stat::Local { names, values } => {
                    let mut evaluated = Vec::with_capacity(values.len());
                    for value in values {
                        evaluated.push(self.eval(value, &scope)?);
                    }
                    let mut evaluated = evaluated.into_iter();
                    let bindings: Vec<(String, Value)> = names
                        .iter()
                        .map(|name| (name.clone(), evaluated.next().unwrap_or(Value::Nil)))
                        .collect();
                    scope = Scope::extend(&scope, bindings);
                }
                Stat::LocalFunction { name, params, body } => {
                    scope = Scope::extend(&scope, [(name.clone(), Value::Nil)]);
                    let closure = closure(params, body, &scope);
                    self.assign_name(name, closure, &scope);
                }
                Stat::Function { name, params, body } => {
                    let closure = closure(params, body, &scope);
                    self.assign_name(name, closure, &scope);
                }
                Stat::Assign { target, value } => {
                    let value = self.eval(value, &scope)?;
                    match target {
                        Expr::Name(name) => self.assign_name(name, value, &scope),
                        Expr::Field(object, name) => {
                            let object = self.eval(object, &scope)?;
                            set_index(&object, &Value::string(name), value)?;
                        }
                        Expr::Index(object, key) => {
                            let object = self.eval(object, &scope)?;
                            let key = self.eval(key, &scope)?;
                            set_index(&object, &key, value)?;
                        }
                        _ => return Err(RuntimeError::InvalidAssignment),
                    }
                }
                Stat::Call(expr) => {
                    self.eval_multi(expr, &scope)?;
                }
                Stat::If {
                    branches,
                    else_body,
                } => {
                    let mut taken = None;
                    for (condition, body) in branches {
                        if self.eval(condition, &scope)?.is_truthy() {
                            taken = Some(body);
                            break;
                        }
                    }
                    if let Some(body) = taken.or(else_body.as_ref()) {
                        if let Flow::Return(values) = self.exec_block(body, &scope)? {
                            return Ok(Flow::Return(values));
                        }
                    }
                }
                Stat::NumericFor {
                    var,
                    start,
                    end,
                    body,
                } => {
                    let start = self.eval_number(start, &scope)?;
                    let end = self.eval_number(end, &scope)?;
                    let mut i = start;
                    while i <= end {
                        let inner = Scope::extend(&scope, [(var.clone(), Value::Number(i))]);
                        if let Flow::Return(values) = self.exec_block(body, &inner)? {
                            return Ok(Flow::Return(values));
                        }
                        i += 1.0;
                    }
                }
                Stat::Return(exprs) => {
                    let mut values = Vec::with_capacity(exprs.len());
                    for expr in exprs {
                        values.push(self.eval(expr, &scope)?);
                    }
                    return Ok(Flow::Return(values));
                }
                Stat::Do(body) => {
                    if let Flow::Return(values) = self.exec_block(body, &scope)? {
                        return Ok(Flow::Return(values));
                    }
                }
            }
        }
        Ok(Flow::Normal)
    }

    fn assign_name(&mut self, name: &str, value: Value, scope: &Rc<Scope>) {
        match scope.resolve(name) {
            Some(cell) => *cell.borrow_mut() = value,
            None => {
                self.globals.insert(name.to_string(), value);
            }
        }
    }

    // === Expressions ===

    fn eval(&mut self, expr: &Expr, scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Call(..) => Ok(self.eval_multi(expr, scope)?.into_iter().next().unwrap_or(Value::Nil)),
            Expr::Nil => Ok(Value::Nil),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(s) => Ok(Value::string(s)),
            Expr::Name(name) => Ok(match scope.resolve(name) {
                Some(cell) => cell.borrow().clone(),
                None => self.globals.get(name).cloned().unwrap_or(Value::Nil),
            }),
            Expr::Field(object, name) => {
                let object = self.eval(object, scope)?;
                get_index(&object, &Value::string(name))
            }
            Expr::Index(object, key) => {
                let object = self.eval(object, scope)?;
                let key = self.eval(key, scope)?;
                get_index(&object, &key)
            }
            Expr::Function { params, body } => Ok(closure(params, body, scope)),
            Expr::Table(entries) => {
                let mut table = Table::default();
                for entry in entries {
                    match entry {
                        TableField::Named(name, value) => {
                            let value = self.eval(value, scope)?;
                            table.fields.insert(name.clone(), value);
                        }
                        TableField::Positional(value) => {
                            let value = self.eval(value, scope)?;
                            table.items.push(value);
                        }
                    }
                }
                Ok(Value::table(table))
            }
            Expr::Binary { op, left, right } => self.eval_binary(*op, left, right, scope),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand, scope)?;
                match (op, value) {
                    (UnOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
                    (UnOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
                    (UnOp::Len, Value::Table(t)) => Ok(Value::Number(t.borrow().items.len() as f64)),
                    (UnOp::Len, Value::Str(s)) => Ok(Value::Number(s.len() as f64)),
                    (UnOp::Neg, other) => Err(RuntimeError::Arithmetic(other.type_name())),
                    (UnOp::Len, other) => Err(RuntimeError::Length(other.type_name())),
                }
            }
        }
    }

    /// Evaluate a call keeping all of its results.
    fn eval_multi(&mut self, expr: &Expr, scope: &Rc<Scope>) -> Result<Vec<Value>, RuntimeError> {
        match expr {
            Expr::Call(func, args) => {
                let func = self.eval(func, scope)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg, scope)?);
                }
                self.call(&func, values)
            }
            other => Ok(vec![self.eval(other, scope)?]),
        }
    }

    fn eval_number(&mut self, expr: &Expr, scope: &Rc<Scope>) -> Result<f64, RuntimeError> {
        match self.eval(expr, scope)? {
            Value::Number(n) => Ok(n),
            other => Err(RuntimeError::Arithmetic(other.type_name())),
        }
    }

    fn eval_binary(&mut self, op: BinOp, left: &Expr, right: &Expr, scope: &Rc<Scope>) -> Result<Value, RuntimeError> {
        let left = self.eval(left, scope)?;
        match op {
            BinOp::And if !left.is_truthy() => return Ok(left),
            BinOp::Or if left.is_truthy() => return Ok(left),
            BinOp::And | BinOp::Or => return self.eval(right, scope),
            _ => {}
        }
        let right = self.eval(right, scope)?;

        match op {
            BinOp::Eq => Ok(Value::Bool(left.raw_equals(&right))),
            BinOp::NotEq => Ok(Value::Bool(!left.raw_equals(&right))),
            BinOp::Concat => match (&left, &right) {
                (Value::Str(_) | Value::Number(_), Value::Str(_) | Value::Number(_)) => {
                    Ok(Value::string(format!("{}{}", left, right)))
                }
                (Value::Str(_) | Value::Number(_), other) | (other, _) => {
                    Err(RuntimeError::Concat(other.type_name()))
                }
            },
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
                let ordering = match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => a.partial_cmp(b),
                    (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
                    _ => return Err(RuntimeError::Compare(left.type_name(), right.type_name())),
                };
                let result = match ordering {
                    Some(ordering) => match op {
                        BinOp::Lt => ordering.is_lt(),
                        BinOp::Gt => ordering.is_gt(),
                        BinOp::LtEq => ordering.is_le(),
                        _ => ordering.is_ge(),
                    },
                    None => false,
                };
                Ok(Value::Bool(result))
            }
            _ => {
                let (a, b) = match (&left, &right) {
                    (Value::Number(a), Value::Number(b)) => (*a, *b),
                    (Value::Number(_), other) | (other, _) => {
                        return Err(RuntimeError::Arithmetic(other.type_name()));
                    }
                };
                Ok(Value::Number(match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div => a / b,
                    _ => a - (a / b).floor() * b,
                }))
            }
        }
    }
}

fn closure(params: &[String], body: &[Stat], scope: &Rc<Scope>) -> Value {
    Value::Function(Rc::new(Closure {
        params: params.to_vec(),
        body: body.to_vec(),
        scope: Rc::clone(scope),
    }))
}

fn get_index(object: &Value, key: &Value) -> Result<Value, RuntimeError> {
    match object {
        Value::Table(table) => Ok(table.borrow().get(key)),
        other => Err(RuntimeError::NotIndexable(other.type_name())),
    }
}

fn set_index(object: &Value, key: &Value, value: Value) -> Result<(), RuntimeError> {
    match object {
        Value::Table(table) => {
            table.borrow_mut().set(key, value);
            Ok(())
        }
        other => Err(RuntimeError::NotIndexable(other.type_name())),
    }
}
