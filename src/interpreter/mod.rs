//! Reference evaluator for generated Lua.
//!
//! Runs [`crate::lua::Chunk`]s directly so the behavior of generated code can
//! be observed without an external Lua: the order of side effects, how often
//! an argument is evaluated, which match arm is taken. Only the Lua the code
//! generator emits is supported, plus a handful of standard library
//! functions.
//!
//! Operands are evaluated strictly left to right. PUC Lua reads a local
//! operand of a binary operator only after its right operand, so the code
//! generator copies a mutable left operand into a temporary when the right
//! operand calls a function; this evaluator cannot observe the difference.

mod eval;
mod scope;
mod value;

pub use eval::Interpreter;
pub use scope::Scope;
pub use value::{Builtin, Table, Value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("attempt to call a {0} value")]
    NotCallable(&'static str),
    #[error("attempt to index a {0} value")]
    NotIndexable(&'static str),
    #[error("attempt to perform arithmetic on a {0} value")]
    Arithmetic(&'static str),
    #[error("attempt to concatenate a {0} value")]
    Concat(&'static str),
    #[error("attempt to get length of a {0} value")]
    Length(&'static str),
    #[error("attempt to compare {0} with {1}")]
    Compare(&'static str, &'static str),
    #[error("bad argument to '{function}' ({expected} expected, got {found})")]
    BadArgument {
        function: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("module '{0}' not found")]
    UnknownModule(String),
    #[error("invalid assignment target")]
    InvalidAssignment,
    #[error("resulting string too large")]
    StringTooLarge,
    /// Raised by `error(message)`.
    #[error("{0}")]
    Raised(String),
}

/// Run a single chunk and return everything it printed.
pub fn run_chunk(chunk: &crate::lua::Chunk) -> Result<Vec<String>, RuntimeError> {
    let mut interpreter = Interpreter::new();
    interpreter.load("main", chunk)?;
    Ok(interpreter.take_output())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::{BinOp, Chunk, Expr, Stat, TableField};

    fn chunk(body: Vec<Stat>) -> Chunk {
        Chunk { header: None, body }
    }

    fn print(value: Expr) -> Stat {
        Stat::Call(Expr::call(Expr::name("print"), vec![value]))
    }

    #[test]
    fn test_print_is_captured() {
        let output = run_chunk(&chunk(vec![
            Stat::local("x", Expr::Number(20.0)),
            print(Expr::binary(BinOp::Concat, Expr::string("x = "), Expr::name("x"))),
        ]))
        .unwrap();
        assert_eq!(output, vec!["x = 20"]);
    }

    #[test]
    fn test_closures_share_assigned_locals() {
        // local x = 1
        // local function get() return x end
        // x = 2
        // print(get())
        let output = run_chunk(&chunk(vec![
            Stat::local("x", Expr::Number(1.0)),
            Stat::LocalFunction {
                name: "get".to_string(),
                params: vec![],
                body: vec![Stat::Return(vec![Expr::name("x")])],
            },
            Stat::assign("x", Expr::Number(2.0)),
            print(Expr::call(Expr::name("get"), vec![])),
        ]))
        .unwrap();
        assert_eq!(output, vec!["2"]);
    }

    #[test]
    fn test_later_local_does_not_affect_closure() {
        let output = run_chunk(&chunk(vec![
            Stat::local("x", Expr::Number(1.0)),
            Stat::local(
                "get",
                Expr::function(vec![], vec![Stat::Return(vec![Expr::name("x")])]),
            ),
            Stat::local("x", Expr::Number(2.0)),
            print(Expr::call(Expr::name("get"), vec![])),
        ]))
        .unwrap();
        assert_eq!(output, vec!["1"]);
    }

    #[test]
    fn test_recursive_local_function() {
        // local function fact(n) if n == 0 then return 1 end return n * fact(n - 1) end
        let body = vec![
            Stat::If {
                branches: vec![(
                    Expr::binary(BinOp::Eq, Expr::name("n"), Expr::Number(0.0)),
                    vec![Stat::Return(vec![Expr::Number(1.0)])],
                )],
                else_body: None,
            },
            Stat::Return(vec![Expr::binary(
                BinOp::Mul,
                Expr::name("n"),
                Expr::call(
                    Expr::name("fact"),
                    vec![Expr::binary(BinOp::Sub, Expr::name("n"), Expr::Number(1.0))],
                ),
            )]),
        ];
        let output = run_chunk(&chunk(vec![
            Stat::LocalFunction {
                name: "fact".to_string(),
                params: vec!["n".to_string()],
                body,
            },
            print(Expr::call(Expr::name("fact"), vec![Expr::Number(5.0)])),
        ]))
        .unwrap();
        assert_eq!(output, vec!["120"]);
    }

    #[test]
    fn test_tables_and_tags() {
        let output = run_chunk(&chunk(vec![
            Stat::local(
                "p",
                Expr::Table(vec![
                    TableField::Named("tag".to_string(), Expr::string("Pair")),
                    TableField::Positional(Expr::Number(1.0)),
                    TableField::Positional(Expr::Number(2.0)),
                ]),
            ),
            print(Expr::field(Expr::name("p"), "tag")),
            print(Expr::index(Expr::name("p"), Expr::Number(2.0))),
        ]))
        .unwrap();
        assert_eq!(output, vec!["Pair", "2"]);
    }

    #[test]
    fn test_error_is_raised() {
        let err = run_chunk(&chunk(vec![Stat::Call(Expr::call(
            Expr::name("error"),
            vec![Expr::string("boom")],
        ))]))
        .unwrap_err();
        assert_eq!(err, RuntimeError::Raised("boom".to_string()));
    }

    fn call_string(function: &str, args: Vec<Expr>) -> Result<Vec<String>, RuntimeError> {
        run_chunk(&chunk(vec![print(Expr::call(Expr::path(function), args))]))
    }

    #[test]
    fn test_string_sub_counts_bytes() {
        let sub = |start: f64, end: f64| {
            call_string(
                "string.sub",
                vec![Expr::string("héllo"), Expr::Number(start), Expr::Number(end)],
            )
            .unwrap()
        };
        assert_eq!(sub(1.0, 3.0), vec!["hé"]);
        assert_eq!(sub(4.0, -1.0), vec!["llo"]);
        assert_eq!(sub(1.0, 2.0), vec!["h\u{FFFD}"]);
    }

    #[test]
    fn test_string_rep_is_bounded() {
        let rep = |count: f64| call_string("string.rep", vec![Expr::string("ab"), Expr::Number(count)]);
        assert_eq!(rep(3.0).unwrap(), vec!["ababab"]);
        assert_eq!(rep(-2.0).unwrap(), vec![""]);
        assert_eq!(rep(f64::NAN).unwrap(), vec![""]);
        assert_eq!(rep(1e300).unwrap_err(), RuntimeError::StringTooLarge);
    }

    #[test]
    fn test_calling_nil_fails() {
        let err = run_chunk(&chunk(vec![Stat::Call(Expr::call(Expr::name("missing"), vec![]))]))
            .unwrap_err();
        assert_eq!(err, RuntimeError::NotCallable("nil"));
    }

    #[test]
    fn test_require_resolves_loaded_chunks() {
        let mut interpreter = Interpreter::new();
        interpreter
            .load(
                "Math",
                &chunk(vec![
                    Stat::local("_M", Expr::Table(vec![])),
                    Stat::Assign {
                        target: Expr::field(Expr::name("_M"), "pi"),
                        value: Expr::Number(3.0),
                    },
                    Stat::Return(vec![Expr::name("_M")]),
                ]),
            )
            .unwrap();
        interpreter
            .load(
                "Main",
                &chunk(vec![
                    Stat::local("Math", Expr::call(Expr::name("require"), vec![Expr::string("Math")])),
                    print(Expr::field(Expr::name("Math"), "pi")),
                ]),
            )
            .unwrap();
        assert_eq!(interpreter.output(), ["3"]);
    }
}
