//! Surface syntax tree.
//!
//! Every node is generic over its `info`: the parser produces `Module<()>` and
//! inference produces `Module<Type>` with the resolved type of each node.

pub mod expression;
pub mod pattern;
pub mod statement;
pub mod types;

use lachs::Span;

use statement::Statement;

#[derive(Debug, Clone)]
pub struct Module<T> {
    pub items: Vec<Item<T>>,
}

/// A top-level statement, optionally exported.
#[derive(Debug, Clone)]
pub struct Item<T> {
    pub export: bool,
    pub statement: Statement<T>,
    pub position: Span,
}

impl<T> Module<T> {
    pub fn statements(&self) -> impl Iterator<Item = &Statement<T>> {
        self.items.iter().map(|item| &item.statement)
    }
}
