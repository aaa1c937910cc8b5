//! Export resolution: strips `export` wrappers and records the public names.

use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use std::collections::HashMap;

use crate::error::{LibraryError, Result};
use crate::validate::node_text;

/// Internal symbol name → externally visible name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportMap {
    names: HashMap<String, String>,
}

impl ExportMap {
    pub fn get(&self, internal: &str) -> Option<&str> {
        self.names.get(internal).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn insert(&mut self, internal: String, external: String, node: &str) -> Result<()> {
        match self.names.get(&internal) {
            Some(existing) if *existing != external => Err(LibraryError::unsupported(
                node,
                &format!(
                    "'{}' is already exported as '{}'; a symbol has exactly one public name",
                    internal, existing
                ),
            )),
            _ => {
                self.names.insert(internal, external);
                Ok(())
            }
        }
    }
}

/// Replaces every named export in `program` by the declaration it wraps (or drops it
/// when it is a specifier list) and returns the collected export names.
pub fn resolve_exports<'a>(program: &mut Program<'a>, ast: AstBuilder<'a>) -> Result<ExportMap> {
    let source = program.source_text;
    let mut exports = ExportMap::default();
    let body = std::mem::replace(&mut program.body, ast.vec());

    for stmt in body {
        let Statement::ExportNamedDeclaration(mut export) = stmt else {
            program.body.push(stmt);
            continue;
        };

        let node = node_text(source, export.span);
        match export.declaration.take() {
            Some(Declaration::FunctionDeclaration(func)) => {
                let name = func
                    .id
                    .as_ref()
                    .map(|id| id.name.to_string())
                    .ok_or_else(|| LibraryError::internal("exported function without a name"))?;
                exports.insert(name.clone(), name, &node)?;
                program.body.push(Statement::FunctionDeclaration(func));
            }
            Some(Declaration::VariableDeclaration(decl)) => {
                for declarator in &decl.declarations {
                    if let BindingPattern::BindingIdentifier(id) = &declarator.id {
                        let name = id.name.to_string();
                        exports.insert(name.clone(), name, &node)?;
                    }
                }
                program.body.push(Statement::VariableDeclaration(decl));
            }
            Some(_) => {
                return Err(LibraryError::internal(format!(
                    "validator admitted an exported declaration it cannot resolve: {}",
                    node
                )));
            }
            None => {
                for specifier in &export.specifiers {
                    let (Some(local), Some(exported)) = (
                        export_name(&specifier.local),
                        export_name(&specifier.exported),
                    ) else {
                        return Err(LibraryError::internal(format!(
                            "string export name survived validation: {}",
                            node
                        )));
                    };
                    exports.insert(local, exported, &node)?;
                }
            }
        }
    }

    Ok(exports)
}

fn export_name(name: &ModuleExportName<'_>) -> Option<String> {
    match name {
        ModuleExportName::IdentifierName(id) => Some(id.name.to_string()),
        ModuleExportName::IdentifierReference(id) => Some(id.name.to_string()),
        ModuleExportName::StringLiteral(_) => None,
    }
}
