//! # exx - A Statically-Typed Functional Language Compiled to Lua
//!
//! exx is a small expression-oriented language with Hindley-Milner inference,
//! algebraic data types, literal unions and exhaustive pattern matching. Every
//! module compiles to a plain Lua file returning a table of its exports.
//!
//! ## Architecture Overview
//!
//! 1. **Lexer** (`lexer`) - Tokenizes source code using the `lachs` library
//! 2. **Parser** (`parser`) - Builds the surface AST with combinator-based recursive descent
//! 3. **Type Checking** (`types`) - Infers and checks types, freezing each module's interface
//! 4. **Exhaustiveness** (`exhaustive`) - Rejects incomplete and redundant `match` arms
//! 5. **Lowering** (`desugar`) - Turns the typed tree into a Lua tree, flattening curried calls
//! 6. **Printing** (`fmt`) - Prints the Lua tree as source text
//!
//! ## Pipeline Flow
//!
//! ```text
//! Source Code (String)
//!     ↓
//! [Lexer] → Token Stream
//!     ↓
//! [Parser] → Surface AST (ast::Module<()>)
//!     ↓
//! [Inference] → Typed AST (ast::Module<Type>) + ModuleInterface
//!     ↓
//! [Exhaustiveness] → checked matches
//!     ↓
//! [Lowering] → Lua tree (lua::Chunk)
//!     ↓
//! [Printer] → Lua source (String)
//! ```
//!
//! [`compiler::Compiler`] drives all stages and keeps the interfaces of
//! compiled modules for the modules that import them. The [`interpreter`]
//! evaluates generated chunks directly and is used to test generated code.
//!
//! ## Example Program
//!
//! ```text
//! type Option<T> = Some(T) | None;
//!
//! fn add(a: number, b: number) -> number { a + b }
//!
//! export fn or_zero(o: Option<number>) -> number {
//!     match o { Some(n) => add(n, 0), None => 0 }
//! }
//! ```
//!
//! ## Getting Started
//!
//! 1. Create a [`compiler::Compiler`] with [`compiler::CompilerOptions`]
//! 2. Call [`compiler::Compiler::compile_source`] for each module, imports first
//! 3. Write out [`compiler::CompiledModule::lua`]

pub mod ast;
pub mod compiler;
pub mod desugar;
pub mod error;
pub mod exhaustive;
pub mod fmt;
pub mod interpreter;
pub mod lexer;
pub mod lua;
pub mod parser;
pub mod types;

pub use compiler::{CodegenOptions, CompiledModule, Compiler, CompilerOptions};
pub use error::CompileError;

/// Type alias for a parsed module with no type information yet
pub type ParsedModule = ast::Module<()>;
