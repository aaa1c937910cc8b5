use oxc_ast::ast::*;
use oxc_semantic::{Scoping, SemanticBuilder};
use oxc_syntax::reference::ReferenceId;
use oxc_syntax::symbol::SymbolId;
use serde::Serialize;
use std::collections::HashSet;

use crate::error::{LibraryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Value,
}

/// A name declared directly in the module scope, in source order.
#[derive(Debug, Clone)]
pub struct ModuleDeclaration {
    pub name: String,
    pub symbol_id: SymbolId,
    pub kind: SymbolKind,
}

/// Result of scope analysis over an export-free module: the module-level declarations
/// plus the resolved reference graph. Read-only once built.
pub struct ModuleScope {
    scoping: Scoping,
    declarations: Vec<ModuleDeclaration>,
    nested_names: HashSet<String>,
}

impl ModuleScope {
    pub fn analyze(program: &Program<'_>) -> Result<Self> {
        let ret = SemanticBuilder::new().build(program);
        if !ret.errors.is_empty() {
            return Err(LibraryError::Syntax {
                messages: ret.errors.iter().map(|e| e.to_string()).collect(),
            });
        }
        let scoping = ret.semantic.into_scoping();
        let root = scoping.root_scope_id();

        let mut declarations = Vec::new();
        let mut seen = HashSet::new();
        let mut declare = |id: &BindingIdentifier<'_>, kind: SymbolKind| -> Result<()> {
            let name = id.name.to_string();
            let symbol_id = id.symbol_id.get().ok_or_else(|| {
                LibraryError::internal(format!("scope analysis left '{}' unbound", name))
            })?;
            if scoping.symbol_scope_id(symbol_id) != root {
                return Err(LibraryError::internal(format!(
                    "'{}' is not bound in the module scope",
                    name
                )));
            }
            if !seen.insert(symbol_id) {
                return Err(LibraryError::collision(
                    &name,
                    "declared more than once at module level",
                ));
            }
            declarations.push(ModuleDeclaration {
                name,
                symbol_id,
                kind,
            });
            Ok(())
        };

        for stmt in &program.body {
            match stmt {
                Statement::FunctionDeclaration(func) => {
                    let id = func.id.as_ref().ok_or_else(|| {
                        LibraryError::internal("top-level function declaration without a name")
                    })?;
                    declare(id, SymbolKind::Function)?;
                }
                Statement::VariableDeclaration(decl) => {
                    for declarator in &decl.declarations {
                        let BindingPattern::BindingIdentifier(id) = &declarator.id else {
                            return Err(LibraryError::internal(
                                "destructuring declarator survived validation",
                            ));
                        };
                        declare(id, SymbolKind::Value)?;
                    }
                }
                _ => {
                    return Err(LibraryError::internal(
                        "module body still holds a statement other than a declaration",
                    ));
                }
            }
        }

        let nested_names = scoping
            .symbol_ids()
            .filter(|&symbol_id| scoping.symbol_scope_id(symbol_id) != root)
            .map(|symbol_id| scoping.symbol_name(symbol_id).to_string())
            .collect();

        Ok(ModuleScope {
            scoping,
            declarations,
            nested_names,
        })
    }

    pub fn declarations(&self) -> &[ModuleDeclaration] {
        &self.declarations
    }

    /// Whether some function, block or parameter scope binds `name`.
    pub fn binds_nested(&self, name: &str) -> bool {
        self.nested_names.contains(name)
    }

    /// The symbol a use-site identifier binds to, `None` for globals.
    pub fn resolve(&self, ident: &IdentifierReference<'_>) -> Option<SymbolId> {
        let reference_id: ReferenceId = ident.reference_id.get()?;
        self.scoping.get_reference(reference_id).symbol_id()
    }
}
