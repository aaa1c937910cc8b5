//! Dependency analysis: which module-level symbols each symbol's body or initializer
//! reads, expressed as indices into the [`SymbolTable`].

use oxc_ast::ast::*;
use oxc_ast_visit::Visit;
use oxc_syntax::scope::ScopeFlags;

use crate::error::{LibraryError, Result};
use crate::renamer::SymbolTable;
use crate::scope::ModuleScope;

/// Adjacency list parallel to [`SymbolTable::symbols`]. Each list is deduplicated,
/// keeps first-reference order and never contains its own index.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    edges: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn analyze(program: &Program<'_>, scope: &ModuleScope, symbols: &SymbolTable) -> Result<Self> {
        let mut edges = vec![Vec::new(); symbols.len()];

        for stmt in &program.body {
            match stmt {
                Statement::FunctionDeclaration(func) => {
                    let owner = owner_index(func.id.as_ref(), symbols)?;
                    let mut collector = ReferenceCollector::new(owner, scope, symbols);
                    collector.visit_function(func, ScopeFlags::Function);
                    edges[owner] = collector.found;
                }
                Statement::VariableDeclaration(decl) => {
                    for declarator in &decl.declarations {
                        let id = match &declarator.id {
                            BindingPattern::BindingIdentifier(id) => Some(&**id),
                            _ => None,
                        };
                        let owner = owner_index(id, symbols)?;
                        if let Some(init) = &declarator.init {
                            let mut collector = ReferenceCollector::new(owner, scope, symbols);
                            collector.visit_expression(init);
                            edges[owner] = collector.found;
                        }
                    }
                }
                _ => {
                    return Err(LibraryError::internal(
                        "dependency analysis reached a non-declaration statement",
                    ));
                }
            }
        }

        Ok(DependencyGraph { edges })
    }

    pub fn dependencies_of(&self, index: usize) -> &[usize] {
        self.edges.get(index).map(Vec::as_slice).unwrap_or_default()
    }

    /// Dependencies of `index` spelled as descriptor keys.
    pub fn keys_of<'t>(&self, index: usize, symbols: &'t SymbolTable) -> Vec<&'t str> {
        self.dependencies_of(index)
            .iter()
            .map(|&dep| symbols.symbols()[dep].key.as_str())
            .collect()
    }
}

pub(crate) fn owner_index(id: Option<&BindingIdentifier<'_>>, symbols: &SymbolTable) -> Result<usize> {
    id.and_then(|id| id.symbol_id.get())
        .and_then(|symbol_id| symbols.index_of(symbol_id))
        .ok_or_else(|| LibraryError::internal("declaration has no entry in the symbol table"))
}

struct ReferenceCollector<'s> {
    owner: usize,
    scope: &'s ModuleScope,
    symbols: &'s SymbolTable,
    found: Vec<usize>,
}

impl<'s> ReferenceCollector<'s> {
    fn new(owner: usize, scope: &'s ModuleScope, symbols: &'s SymbolTable) -> Self {
        ReferenceCollector {
            owner,
            scope,
            symbols,
            found: Vec::new(),
        }
    }
}

impl<'a> Visit<'a> for ReferenceCollector<'_> {
    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        let Some(index) = self
            .scope
            .resolve(ident)
            .and_then(|symbol_id| self.symbols.index_of(symbol_id))
        else {
            return;
        };
        if index != self.owner && !self.found.contains(&index) {
            self.found.push(index);
        }
    }
}
