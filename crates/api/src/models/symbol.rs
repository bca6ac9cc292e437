use super::resource::{Origin, ResourceKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Class,
    Function,
    Constant,
    Method,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SymbolKind::Class => "class",
            SymbolKind::Function => "function",
            SymbolKind::Constant => "constant",
            SymbolKind::Method => "method",
        };
        f.write_str(s)
    }
}

/// A definition extracted from a script module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub name: String,
    pub qualified_name: String,
    /// 1-based source line of the declaration.
    pub definition_line: usize,
    /// Parameter text for classes (constructor parameters), functions and methods.
    pub signature: Option<String>,
    /// Index of the owning class within the module's symbol list, for methods.
    pub owner: Option<usize>,
}

impl Symbol {
    /// Call-style form, e.g. `utils.helpers.Logger(level)`. Constants have none.
    pub fn call_style(&self) -> Option<String> {
        match self.kind {
            SymbolKind::Constant => None,
            SymbolKind::Class | SymbolKind::Function | SymbolKind::Method => Some(format!(
                "{}({})",
                self.qualified_name,
                self.signature.as_deref().unwrap_or("")
            )),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.owner.is_none()
    }
}

/// Symbol table of one script resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptModule {
    /// Dotted module path, e.g. `utils.helpers`.
    pub qualified_path: String,
    pub resource: ResourceKey,
    pub content_hash: u64,
    pub symbols: Vec<Symbol>,
}

impl ScriptModule {
    pub fn top_level(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter().filter(|s| s.is_top_level())
    }

    pub fn find_class(&self, name: &str) -> Option<(usize, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .find(|(_, s)| s.kind == SymbolKind::Class && s.owner.is_none() && s.name == name)
    }

    pub fn members_of(&self, class_index: usize) -> impl Iterator<Item = &Symbol> {
        self.symbols
            .iter()
            .filter(move |s| s.owner == Some(class_index))
    }

    pub fn symbol(&self, name: &str) -> Option<&Symbol> {
        self.top_level().find(|s| s.name == name)
    }
}

/// Modules of a single project, keyed by qualified path.
pub type ModuleIndex = BTreeMap<String, Arc<ScriptModule>>;

/// A module as seen from a project's merged index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedModule {
    pub module: Arc<ScriptModule>,
    pub origin: Origin,
}

/// Inheritance-resolved module index: one module per qualified path, nearest definer wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedIndex {
    modules: BTreeMap<String, IndexedModule>,
}

impl MergedIndex {
    pub fn from_modules(modules: BTreeMap<String, IndexedModule>) -> Self {
        Self { modules }
    }

    pub fn module(&self, qualified_path: &str) -> Option<&IndexedModule> {
        self.modules.get(qualified_path)
    }

    pub fn modules(&self) -> impl Iterator<Item = (&str, &IndexedModule)> {
        self.modules.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_style() {
        let class = Symbol {
            kind: SymbolKind::Class,
            name: "Logger".to_string(),
            qualified_name: "utils.helpers.Logger".to_string(),
            definition_line: 3,
            signature: Some("level".to_string()),
            owner: None,
        };
        assert_eq!(class.call_style().as_deref(), Some("utils.helpers.Logger(level)"));

        let bare = Symbol {
            signature: None,
            ..class.clone()
        };
        assert_eq!(bare.call_style().as_deref(), Some("utils.helpers.Logger()"));

        let constant = Symbol {
            kind: SymbolKind::Constant,
            signature: None,
            ..class
        };
        assert_eq!(constant.call_style(), None);
    }
}
