//! Printer for generated Lua.
//!
//! Output is indented with two spaces. Parentheses are only inserted where Lua
//! precedence requires them.

use std::fmt::{self, Display, Write};

use crate::lua::{BinOp, Chunk, Expr, Stat, TableField, UNARY_PRECEDENCE, UnOp};
use crate::types::ty::format_number;

const INDENT: &str = "  ";

/// Precedence of prefix positions (call targets, indexed objects).
const PREFIX: u8 = 100;

struct Formatter {
    buffer: String,
    indent_level: usize,
}

impl Formatter {
    fn new() -> Self {
        Self {
            buffer: String::new(),
            indent_level: 0,
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.buffer.push_str(INDENT);
        }
    }

    fn write_str(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    fn write_newline(&mut self) {
        self.buffer.push('\n');
    }

    fn finish(self) -> String {
        self.buffer
    }
}

impl Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formatter = Formatter::new();
        if let Some(header) = &self.header {
            for line in header.lines() {
                formatter.write_str("-- ");
                formatter.write_str(line);
                formatter.write_newline();
            }
        }
        format_body(&self.body, &mut formatter);
        write!(f, "{}", formatter.finish())
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formatter = Formatter::new();
        format_expr(self, &mut formatter, 0);
        write!(f, "{}", formatter.finish())
    }
}

/// Render a chunk as Lua source.
pub fn print_chunk(chunk: &Chunk) -> String {
    chunk.to_string()
}

fn format_body(body: &[Stat], fmt: &mut Formatter) {
    for stat in body {
        format_stat(stat, fmt);
    }
}

fn format_nested(body: &[Stat], fmt: &mut Formatter) {
    fmt.indent();
    format_body(body, fmt);
    fmt.dedent();
}

fn format_stat(stat: &Stat, fmt: &mut Formatter) {
    fmt.write_indent();
    match stat {
        Stat::Local { names, values } => {
            fmt.write_str("local ");
            fmt.write_str(&names.join(", "));
            if !values.is_empty() {
                fmt.write_str(" = ");
                format_list(values, fmt);
            }
        }
        Stat::LocalFunction { name, params, body } => {
            fmt.write_str("local function ");
            format_function_tail(name, params, body, fmt);
        }
        Stat::Function { name, params, body } => {
            fmt.write_str("function ");
            format_function_tail(name, params, body, fmt);
        }
        Stat::Assign { target, value } => {
            format_expr(target, fmt, PREFIX);
            fmt.write_str(" = ");
            format_expr(value, fmt, 0);
        }
        Stat::Call(call) => format_expr(call, fmt, 0),
        Stat::If {
            branches,
            else_body,
        } => {
            for (i, (condition, body)) in branches.iter().enumerate() {
                if i > 0 {
                    fmt.write_indent();
                    fmt.write_str("else");
                }
                fmt.write_str("if ");
                format_expr(condition, fmt, 0);
                fmt.write_str(" then");
                fmt.write_newline();
                format_nested(body, fmt);
            }
            if let Some(body) = else_body {
                fmt.write_indent();
                fmt.write_str("else");
                fmt.write_newline();
                format_nested(body, fmt);
            }
            fmt.write_indent();
            fmt.write_str("end");
        }
        Stat::NumericFor {
            var,
            start,
            end,
            body,
        } => {
            fmt.write_str("for ");
            fmt.write_str(var);
            fmt.write_str(" = ");
            format_expr(start, fmt, 0);
            fmt.write_str(", ");
            format_expr(end, fmt, 0);
            fmt.write_str(" do");
            fmt.write_newline();
            format_nested(body, fmt);
            fmt.write_indent();
            fmt.write_str("end");
        }
        Stat::Return(values) => {
            fmt.write_str("return");
            if !values.is_empty() {
                fmt.write_str(" ");
                format_list(values, fmt);
            }
        }
        Stat::Do(body) => {
            fmt.write_str("do");
            fmt.write_newline();
            format_nested(body, fmt);
            fmt.write_indent();
            fmt.write_str("end");
        }
    }
    fmt.write_newline();
}

/// `name(params) body end`, shared by both function statements.
fn format_function_tail(name: &str, params: &[String], body: &[Stat], fmt: &mut Formatter) {
    fmt.write_str(name);
    fmt.write_str("(");
    fmt.write_str(&params.join(", "));
    fmt.write_str(")");
    fmt.write_newline();
    format_nested(body, fmt);
    fmt.write_indent();
    fmt.write_str("end");
}

fn format_list(exprs: &[Expr], fmt: &mut Formatter) {
    for (i, expr) in exprs.iter().enumerate() {
        if i > 0 {
            fmt.write_str(", ");
        }
        format_expr(expr, fmt, 0);
    }
}

fn format_expr(expr: &Expr, fmt: &mut Formatter, precedence: u8) {
    match expr {
        Expr::Nil => fmt.write_str("nil"),
        Expr::Bool(b) => fmt.write_str(if *b { "true" } else { "false" }),
        Expr::Number(n) => format_number_literal(*n, fmt, precedence),
        Expr::String(s) => fmt.write_str(&quote(s)),
        Expr::Name(name) => fmt.write_str(name),
        Expr::Field(object, name) => {
            format_expr(object, fmt, PREFIX);
            fmt.write_str(".");
            fmt.write_str(name);
        }
        Expr::Index(object, key) => {
            format_expr(object, fmt, PREFIX);
            fmt.write_str("[");
            format_expr(key, fmt, 0);
            fmt.write_str("]");
        }
        Expr::Call(func, args) => {
            format_expr(func, fmt, PREFIX);
            fmt.write_str("(");
            format_list(args, fmt);
            fmt.write_str(")");
        }
        Expr::Function { params, body } => {
            let needs_parens = precedence == PREFIX;
            if needs_parens {
                fmt.write_str("(");
            }
            fmt.write_str("function(");
            fmt.write_str(&params.join(", "));
            fmt.write_str(")");
            fmt.write_newline();
            format_nested(body, fmt);
            fmt.write_indent();
            fmt.write_str("end");
            if needs_parens {
                fmt.write_str(")");
            }
        }
        Expr::Table(fields) => format_table(fields, fmt, precedence),
        Expr::Binary { op, left, right } => format_binary(*op, left, right, fmt, precedence),
        Expr::Unary { op, operand } => format_unary(*op, operand, fmt, precedence),
    }
}

fn format_number_literal(value: f64, fmt: &mut Formatter, precedence: u8) {
    let text = if value.is_nan() {
        "(0/0)".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "math.huge" } else { "-math.huge" }.to_string()
    } else {
        format_number(value)
    };
    let needs_parens = text.starts_with('-') && precedence > UNARY_PRECEDENCE;
    if needs_parens {
        fmt.write_str("(");
    }
    fmt.write_str(&text);
    if needs_parens {
        fmt.write_str(")");
    }
}

fn format_table(fields: &[TableField], fmt: &mut Formatter, precedence: u8) {
    if precedence == PREFIX {
        fmt.write_str("(");
    }
    if fields.is_empty() {
        fmt.write_str("{}");
    } else {
        fmt.write_str("{ ");
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                fmt.write_str(", ");
            }
            match field {
                TableField::Named(name, value) => {
                    fmt.write_str(name);
                    fmt.write_str(" = ");
                    format_expr(value, fmt, 0);
                }
                TableField::Positional(value) => format_expr(value, fmt, 0),
            }
        }
        fmt.write_str(" }");
    }
    if precedence == PREFIX {
        fmt.write_str(")");
    }
}

fn format_binary(op: BinOp, left: &Expr, right: &Expr, fmt: &mut Formatter, parent_prec: u8) {
    let op_prec = op.precedence();
    let needs_parens = op_prec < parent_prec;
    let (left_prec, right_prec) = if op.is_right_assoc() {
        (op_prec + 1, op_prec)
    } else {
        (op_prec, op_prec + 1)
    };

    if needs_parens {
        fmt.write_str("(");
    }
    format_expr(left, fmt, left_prec);
    fmt.write_str(" ");
    fmt.write_str(op.symbol());
    fmt.write_str(" ");
    format_expr(right, fmt, right_prec);
    if needs_parens {
        fmt.write_str(")");
    }
}

fn format_unary(op: UnOp, operand: &Expr, fmt: &mut Formatter, parent_prec: u8) {
    let needs_parens = UNARY_PRECEDENCE < parent_prec;
    if needs_parens {
        fmt.write_str("(");
    }
    fmt.write_str(op.symbol());
    // `- -x` must not print as the comment `--x`
    let starts_with_minus = match operand {
        Expr::Number(n) => *n < 0.0,
        Expr::Unary { op: UnOp::Neg, .. } => true,
        _ => false,
    };
    if op == UnOp::Neg && starts_with_minus {
        fmt.write_str("(");
        format_expr(operand, fmt, 0);
        fmt.write_str(")");
    } else {
        format_expr(operand, fmt, UNARY_PRECEDENCE);
    }
    if needs_parens {
        fmt.write_str(")");
    }
}

/// Quote a string as a Lua string literal.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\{}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
