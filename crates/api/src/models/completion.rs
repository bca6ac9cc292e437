use super::resource::Origin;
use super::symbol::{Symbol, SymbolKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionKind {
    /// A folder of script modules.
    Package,
    Module,
    Class,
    Function,
    Constant,
    Method,
}

impl CompletionKind {
    /// Packages and modules list ahead of leaf symbols.
    pub fn is_container(&self) -> bool {
        matches!(self, CompletionKind::Package | CompletionKind::Module)
    }
}

impl From<SymbolKind> for CompletionKind {
    fn from(kind: SymbolKind) -> Self {
        match kind {
            SymbolKind::Class => CompletionKind::Class,
            SymbolKind::Function => CompletionKind::Function,
            SymbolKind::Constant => CompletionKind::Constant,
            SymbolKind::Method => CompletionKind::Method,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    pub qualified_name: String,
    /// Call-style text to insert, for callables.
    pub call_style: Option<String>,
    pub definition_line: Option<usize>,
    /// Origin of the module that provides this entry. Packages have none.
    pub origin: Option<Origin>,
}

impl CompletionItem {
    pub fn package(label: &str, qualified_name: String) -> Self {
        Self {
            label: label.to_string(),
            kind: CompletionKind::Package,
            qualified_name,
            call_style: None,
            definition_line: None,
            origin: None,
        }
    }

    pub fn module(label: &str, qualified_name: String, origin: Origin) -> Self {
        Self {
            label: label.to_string(),
            kind: CompletionKind::Module,
            qualified_name,
            call_style: None,
            definition_line: None,
            origin: Some(origin),
        }
    }

    pub fn symbol(symbol: &Symbol, origin: Origin) -> Self {
        Self {
            label: symbol.name.clone(),
            kind: symbol.kind.into(),
            qualified_name: symbol.qualified_name.clone(),
            call_style: symbol.call_style(),
            definition_line: Some(symbol.definition_line),
            origin: Some(origin),
        }
    }
}
