//! # Compiler Pipeline
//!
//! ```text
//! source ─[parser]→ Module<()> ─[types]→ Module<Type> ─[exhaustive]→ ✓
//!        ─[desugar]→ lua::Chunk ─[fmt::lua]→ Lua source
//! ```
//!
//! Every stage fails fast: the first error aborts the module and nothing is
//! emitted for it. A successfully compiled module's interface is kept so that
//! modules compiled later can `import` it.

use std::collections::HashMap;
use std::sync::Arc;

use crate::ast::Module;
use crate::error::CompileError;
use crate::exhaustive;
use crate::fmt::print_chunk;
use crate::lua::Chunk;
use crate::parser::parse_source;
use crate::types::{Infer, ModuleInterface, SignatureTable};

pub use crate::desugar::CodegenOptions;
use crate::desugar::lower_module;

#[derive(Debug, Clone, PartialEq)]
pub struct CompilerOptions {
    pub codegen: CodegenOptions,
    /// Types of the Lua bindings modules may use.
    pub signatures: SignatureTable,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            codegen: CodegenOptions::default(),
            signatures: SignatureTable::prelude(),
        }
    }
}

/// Output of a successful compilation.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub name: String,
    pub interface: Arc<ModuleInterface>,
    pub chunk: Chunk,
    /// Generated Lua source.
    pub lua: String,
}

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
    interfaces: HashMap<String, Arc<ModuleInterface>>,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Compiler {
            options,
            interfaces: HashMap::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn interface(&self, module: &str) -> Option<&Arc<ModuleInterface>> {
        self.interfaces.get(module)
    }

    /// Make `interface` importable by modules compiled afterwards.
    pub fn register(&mut self, interface: Arc<ModuleInterface>) {
        log::debug!("registered interface of module {}", interface.name);
        self.interfaces.insert(interface.name.clone(), interface);
    }

    /// Compile a module from source and register its interface.
    pub fn compile_source(&mut self, name: &str, source: &str) -> Result<CompiledModule, CompileError> {
        let module = parse_source(source)?;
        self.compile_module(name, &module)
    }

    /// Compile an already parsed module and register its interface.
    pub fn compile_module(&mut self, name: &str, module: &Module<()>) -> Result<CompiledModule, CompileError> {
        let compiled = self.build(name, module)?;
        self.register(Arc::clone(&compiled.interface));
        Ok(compiled)
    }

    /// Compile without touching the registry. Only needs shared access, so
    /// independent modules can be built from several threads at once.
    pub fn build(&self, name: &str, module: &Module<()>) -> Result<CompiledModule, CompileError> {
        let checked = Infer::new()
            .with_signatures(self.options.signatures.clone())
            .with_interfaces(self.interfaces.clone())
            .check_module(name, module)?;
        exhaustive::check_module(&checked.module, &checked.types)?;

        let chunk = lower_module(&checked, &self.options.codegen);
        let lua = print_chunk(&chunk);
        log::debug!("compiled module {} ({} bytes of Lua)", name, lua.len());

        Ok(CompiledModule {
            name: name.to_string(),
            interface: Arc::new(checked.interface),
            chunk,
            lua,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ErrorKind;

    #[test]
    fn test_compile_registers_interface() {
        let mut compiler = Compiler::default();
        let compiled = compiler
            .compile_source("Math", "export fn square(n: number) -> number { n * n }")
            .unwrap();
        assert!(compiled.lua.contains("_M.square = square"));
        assert!(compiler.interface("Math").is_some());
    }

    #[test]
    fn test_failed_module_is_not_registered() {
        let mut compiler = Compiler::default();
        let err = compiler
            .compile_source("Bad", "export let x: number = \"nope\";")
            .unwrap_err();
        assert_eq!(err.as_type_error().map(|e| e.kind()), Some(ErrorKind::Unification));
        assert!(compiler.interface("Bad").is_none());
    }

    #[test]
    fn test_exhaustiveness_runs_before_lowering() {
        let mut compiler = Compiler::default();
        let err = compiler
            .compile_source("Main", "fn f(b: boolean) -> number { match b { true => 1 } }")
            .unwrap_err();
        assert_eq!(
            err.as_type_error().map(|e| e.kind()),
            Some(ErrorKind::NonExhaustiveMatch)
        );
    }

    #[test]
    fn test_parse_errors_are_reported() {
        let mut compiler = Compiler::default();
        let err = compiler.compile_source("Main", "let = ;").unwrap_err();
        assert!(matches!(err, CompileError::Source(_)));
    }
}
