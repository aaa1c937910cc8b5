use oxc_allocator::Allocator;
use oxc_ast::AstBuilder;
use oxc_parser::Parser;
use oxc_span::SourceType;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

use crate::dependencies::DependencyGraph;
use crate::descriptor::{DescriptorSerializer, LibraryManifest};
use crate::error::{LibraryError, Result};
use crate::exports::resolve_exports;
use crate::options::LibraryOptions;
use crate::renamer::{rename_program, SymbolTable};
use crate::scope::ModuleScope;
use crate::validate::validate_program;

/// Emitted descriptor text plus the manifest describing its entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryOutput {
    pub code: String,
    pub manifest: LibraryManifest,
}

impl LibraryOutput {
    /// Persists the descriptor text, creating missing parent directories.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| LibraryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, &self.code).map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = self.code.len(), "wrote library descriptor");
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PIPELINE
// ═══════════════════════════════════════════════════════════════════════════════

/// Compiles one flattened ES module into an `Object.assign(LibraryManager.library, ...)`
/// descriptor. Either the whole module converts or nothing is produced.
pub fn transform_library(source: &str, options: &LibraryOptions) -> Result<LibraryOutput> {
    options.validate()?;

    let allocator = Allocator::default();
    let ast = AstBuilder::new(&allocator);
    let source_type = SourceType::default().with_module(true);

    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() || ret.panicked {
        let mut messages: Vec<String> = ret.errors.iter().map(|e| e.to_string()).collect();
        if messages.is_empty() {
            messages.push("parser aborted without a diagnostic".to_string());
        }
        return Err(LibraryError::Syntax { messages });
    }
    let mut program = ret.program;

    validate_program(&program, options.initializers)?;
    debug!(statements = program.body.len(), "validated module");

    let exports = resolve_exports(&mut program, ast)?;
    debug!(exports = exports.len(), "resolved exports");

    let scope = ModuleScope::analyze(&program)?;
    let symbols = SymbolTable::resolve(&scope, &exports, options)?;
    let stats = rename_program(&mut program, ast, &scope, &symbols);
    debug!(
        symbols = symbols.len(),
        bindings = stats.bindings,
        references = stats.references,
        "renamed module symbols"
    );

    let graph = DependencyGraph::analyze(&program, &scope, &symbols)?;
    let edges: usize = (0..symbols.len()).map(|i| graph.dependencies_of(i).len()).sum();
    debug!(edges, "collected dependency edges");

    let body = std::mem::replace(&mut program.body, ast.vec());
    let (code, manifest) = DescriptorSerializer::new(ast, source_type, options.initializers)
        .serialize(body, &options.namespace, &symbols, &graph)?;

    info!(
        namespace = %options.namespace,
        entries = manifest.entry_keys().len(),
        "library descriptor ready"
    );

    Ok(LibraryOutput { code, manifest })
}
