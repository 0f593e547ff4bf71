use std::collections::HashMap;

use super::table::TypeTable;
use super::ty::TypeScheme;

/// What a checked module exposes to its importers: the closed schemes of its
/// exported values and its exported types under qualified names.
///
/// Interfaces are frozen once the module is checked and only ever read
/// afterwards, so they can be shared between compilations on other threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleInterface {
    pub name: String,
    pub values: HashMap<String, TypeScheme>,
    pub types: TypeTable,
}

impl ModuleInterface {
    pub fn new(name: impl Into<String>) -> Self {
        ModuleInterface {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn value(&self, name: &str) -> Option<&TypeScheme> {
        self.values.get(name)
    }

    /// Exported value names in sorted order.
    pub fn exported_names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_interface_is_shareable() {
        assert_send_sync::<ModuleInterface>();
    }

    #[test]
    fn test_exported_names_sorted() {
        let mut iface = ModuleInterface::new("Math");
        iface
            .values
            .insert("square".into(), TypeScheme::monomorphic(Type::Number));
        iface.values.insert("add".into(), TypeScheme::monomorphic(Type::Number));
        assert_eq!(iface.exported_names(), vec!["add", "square"]);
        assert!(iface.value("add").is_some());
    }
}
