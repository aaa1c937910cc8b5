//! Canonical naming of module-level symbols and the rewrite of every occurrence.

use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_ast_visit::{walk_mut, VisitMut};
use oxc_syntax::identifier::is_identifier_name;
use oxc_syntax::symbol::SymbolId;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{LibraryError, Result};
use crate::exports::ExportMap;
use crate::options::{LibraryOptions, NamingConvention};
use crate::scope::{ModuleScope, SymbolKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone)]
pub struct Symbol {
    pub internal_name: String,
    /// Property key in the descriptor; also the spelling used in `__deps` lists.
    pub key: String,
    /// Spelling of the symbol at use sites inside executable code.
    pub reference: String,
    pub visibility: Visibility,
    pub kind: SymbolKind,
    pub symbol_id: SymbolId,
}

// ═══════════════════════════════════════════════════════════════════════════════
// SYMBOL TABLE
// ═══════════════════════════════════════════════════════════════════════════════

/// Words that cannot stand as an identifier reference in module (strict) code, plus
/// `arguments` and `eval`, which would resolve to something else inside a function.
const UNREFERENCEABLE: &[&str] = &[
    "arguments", "await", "break", "case", "catch", "class", "const", "continue",
    "debugger", "default", "delete", "do", "else", "enum", "eval", "export", "extends",
    "false", "finally", "for", "function", "if", "implements", "import", "in",
    "instanceof", "interface", "let", "new", "null", "package", "private", "protected",
    "public", "return", "static", "super", "switch", "this", "throw", "true", "try",
    "typeof", "var", "void", "while", "with", "yield",
];

fn is_referenceable(name: &str) -> bool {
    is_identifier_name(name) && !UNREFERENCEABLE.contains(&name)
}

/// Every module-level symbol with its final spellings, in declaration order.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    index: HashMap<SymbolId, usize>,
}

impl SymbolTable {
    pub fn resolve(
        scope: &ModuleScope,
        exports: &ExportMap,
        options: &LibraryOptions,
    ) -> Result<Self> {
        let mut undefined: Vec<&str> = exports
            .iter()
            .map(|(internal, _)| internal)
            .filter(|internal| !scope.declarations().iter().any(|d| d.name == *internal))
            .collect();
        undefined.sort_unstable();
        if let Some(name) = undefined.first() {
            return Err(LibraryError::UndefinedExport {
                name: name.to_string(),
            });
        }

        let mut table = SymbolTable::default();
        let mut keys: HashMap<String, String> = HashMap::new();
        let mut references: HashMap<String, String> = HashMap::new();

        for decl in scope.declarations() {
            let (visibility, key, reference) = match exports.get(&decl.name) {
                Some(external) => {
                    let reference = match options.naming {
                        NamingConvention::Flat => external.to_string(),
                        NamingConvention::Emscripten => format!("_{}", external),
                    };
                    (Visibility::Public, external.to_string(), reference)
                }
                None => {
                    let namespaced = format!("{}_{}", options.namespace, decl.name);
                    match options.naming {
                        NamingConvention::Flat => {
                            let name = format!("_{}", namespaced);
                            (Visibility::Private, name.clone(), name)
                        }
                        NamingConvention::Emscripten => {
                            (Visibility::Private, format!("${}", namespaced), namespaced)
                        }
                    }
                }
            };

            if !is_referenceable(&reference) {
                return Err(match visibility {
                    Visibility::Public => LibraryError::unsupported(
                        &format!("export {{ {} as {} }}", decl.name, key),
                        &format!(
                            "'{}' cannot be referenced from code under the {:?} naming convention",
                            reference, options.naming
                        ),
                    ),
                    Visibility::Private => LibraryError::InvalidNamespace {
                        namespace: options.namespace.clone(),
                    },
                });
            }

            claim(&mut keys, &key, &decl.name)?;
            claim(&mut references, &reference, &decl.name)?;
            // Use sites are the only occurrences left in nested scopes.
            if reference != decl.name && scope.binds_nested(&reference) {
                return Err(LibraryError::collision(
                    &reference,
                    format!(
                        "'{}' is renamed to it, but a nested binding of that name would capture its references",
                        decl.name
                    ),
                ));
            }

            table.index.insert(decl.symbol_id, table.symbols.len());
            table.symbols.push(Symbol {
                internal_name: decl.name.clone(),
                key,
                reference,
                visibility,
                kind: decl.kind,
                symbol_id: decl.symbol_id,
            });
        }

        Ok(table)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn index_of(&self, symbol_id: SymbolId) -> Option<usize> {
        self.index.get(&symbol_id).copied()
    }
}

fn claim(taken: &mut HashMap<String, String>, name: &str, owner: &str) -> Result<()> {
    if let Some(first) = taken.get(name) {
        return Err(LibraryError::collision(
            name,
            format!("claimed by both '{}' and '{}'", first, owner),
        ));
    }
    taken.insert(name.to_string(), owner.to_string());
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// RENAMER VISITOR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenameStats {
    pub bindings: usize,
    pub references: usize,
}

/// Rewrites declaration sites to the symbol key and use sites to its reference spelling.
pub struct RenamerVisitor<'a, 's> {
    ast: AstBuilder<'a>,
    scope: &'s ModuleScope,
    names: HashMap<SymbolId, (&'a str, &'a str)>,
    pub stats: RenameStats,
}

impl<'a, 's> RenamerVisitor<'a, 's> {
    pub fn new(ast: AstBuilder<'a>, scope: &'s ModuleScope, symbols: &SymbolTable) -> Self {
        let names = symbols
            .symbols()
            .iter()
            .map(|symbol| {
                let key: &'a str = ast.allocator.alloc_str(&symbol.key);
                let reference: &'a str = ast.allocator.alloc_str(&symbol.reference);
                (symbol.symbol_id, (key, reference))
            })
            .collect();
        RenamerVisitor {
            ast,
            scope,
            names,
            stats: RenameStats::default(),
        }
    }
}

impl<'a> VisitMut<'a> for RenamerVisitor<'a, '_> {
    fn visit_binding_identifier(&mut self, ident: &mut BindingIdentifier<'a>) {
        let Some(symbol_id) = ident.symbol_id.get() else {
            return;
        };
        if let Some((key, _)) = self.names.get(&symbol_id) {
            ident.name = (*key).into();
            self.stats.bindings += 1;
        }
    }

    fn visit_identifier_reference(&mut self, ident: &mut IdentifierReference<'a>) {
        let Some(symbol_id) = self.scope.resolve(ident) else {
            return;
        };
        if let Some((_, reference)) = self.names.get(&symbol_id) {
            ident.name = (*reference).into();
            self.stats.references += 1;
        }
    }

    fn visit_object_property(&mut self, prop: &mut ObjectProperty<'a>) {
        walk_mut::walk_object_property(self, prop);
        // `{ x }` must keep reading as property `x` once the value is renamed.
        if prop.shorthand {
            if let (PropertyKey::StaticIdentifier(key), Expression::Identifier(value)) =
                (&prop.key, &prop.value)
            {
                if key.name.as_str() != value.name.as_str() {
                    prop.shorthand = false;
                }
            }
        }
    }

    fn visit_assignment_target_property(&mut self, prop: &mut AssignmentTargetProperty<'a>) {
        let original = match prop {
            AssignmentTargetProperty::AssignmentTargetPropertyIdentifier(shorthand) => {
                Some(shorthand.binding.name)
            }
            AssignmentTargetProperty::AssignmentTargetPropertyProperty(_) => None,
        };
        walk_mut::walk_assignment_target_property(self, prop);

        // `({ x } = obj)` reads property `x`; keep reading it once the target is renamed.
        let Some(original) = original else {
            return;
        };
        let AssignmentTargetProperty::AssignmentTargetPropertyIdentifier(shorthand) = prop else {
            return;
        };
        if shorthand.binding.name.as_str() == original.as_str() {
            return;
        }

        let span = shorthand.span;
        let target = AssignmentTarget::AssignmentTargetIdentifier(
            self.ast
                .alloc_identifier_reference(shorthand.binding.span, shorthand.binding.name),
        );
        let binding = match shorthand.init.take() {
            Some(init) => self
                .ast
                .assignment_target_maybe_default_assignment_target_with_default(span, target, init),
            None => AssignmentTargetMaybeDefault::from(target),
        };
        let key = PropertyKey::StaticIdentifier(self.ast.alloc(self.ast.identifier_name(span, original)));
        *prop = self
            .ast
            .assignment_target_property_assignment_target_property_property(span, key, binding, false);
    }
}

pub fn rename_program<'a>(
    program: &mut Program<'a>,
    ast: AstBuilder<'a>,
    scope: &ModuleScope,
    symbols: &SymbolTable,
) -> RenameStats {
    let mut renamer = RenamerVisitor::new(ast, scope, symbols);
    renamer.visit_program(program);
    renamer.stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exports::resolve_exports;
    use oxc_allocator::Allocator;
    use oxc_codegen::Codegen;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn rename(code: &str, options: &LibraryOptions) -> Result<(String, Vec<Symbol>)> {
        let allocator = Allocator::default();
        let ast = AstBuilder::new(&allocator);
        let source_type = SourceType::default().with_module(true);
        let mut program = Parser::new(&allocator, code, source_type).parse().program;
        let exports = resolve_exports(&mut program, ast)?;
        let scope = ModuleScope::analyze(&program)?;
        let symbols = SymbolTable::resolve(&scope, &exports, options)?;
        rename_program(&mut program, ast, &scope, &symbols);
        Ok((
            Codegen::new().build(&program).code,
            symbols.symbols().to_vec(),
        ))
    }

    #[test]
    fn test_private_symbols_are_namespaced() {
        let (code, symbols) = rename(
            "function x() {} export function y() { return x(); }",
            &LibraryOptions::with_namespace("test"),
        )
        .unwrap();
        assert_eq!(symbols[0].key, "_test_x");
        assert_eq!(symbols[0].visibility, Visibility::Private);
        assert_eq!(symbols[1].key, "y");
        assert_eq!(symbols[1].visibility, Visibility::Public);
        assert!(code.contains("function _test_x()"), "{}", code);
        assert!(code.contains("return _test_x()"), "{}", code);
    }

    #[test]
    fn test_alias_reaches_every_reference() {
        let (code, symbols) = rename(
            "function localFunc() { return localFunc; } function caller() { return localFunc(); } export { localFunc as exportedFunc };",
            &LibraryOptions::default(),
        )
        .unwrap();
        assert_eq!(symbols[0].key, "exportedFunc");
        assert!(!code.contains("localFunc"), "{}", code);
        assert!(code.contains("return exportedFunc()"), "{}", code);
        assert!(code.contains("function _unnamed_caller()"), "{}", code);
    }

    #[test]
    fn test_emscripten_convention_spellings() {
        let (code, symbols) = rename(
            "var state = 1; export function get() { return state; } export function twice() { return get() * 2; }",
            &LibraryOptions::with_namespace("gl").naming(NamingConvention::Emscripten),
        )
        .unwrap();
        assert_eq!(symbols[0].key, "$gl_state");
        assert_eq!(symbols[0].reference, "gl_state");
        assert_eq!(symbols[1].key, "get");
        assert_eq!(symbols[1].reference, "_get");
        assert!(code.contains("return gl_state"), "{}", code);
        assert!(code.contains("_get() * 2"), "{}", code);
    }

    #[test]
    fn test_shadowed_names_are_left_alone() {
        let (code, _) = rename(
            "var x = 1; export function f(x) { return x; } export function g() { var x = 2; return function() { return x; }; }",
            &LibraryOptions::with_namespace("ns"),
        )
        .unwrap();
        assert!(code.contains("var _ns_x = 1"), "{}", code);
        assert!(!code.contains("return _ns_x"), "{}", code);
    }

    #[test]
    fn test_shorthand_property_keeps_its_name() {
        let (code, _) = rename(
            "var count = 0; export function snapshot() { return { count }; }",
            &LibraryOptions::with_namespace("ns"),
        )
        .unwrap();
        assert!(code.contains("count: _ns_count"), "{}", code);
    }

    #[test]
    fn test_undefined_export() {
        let err = rename("export { missing };", &LibraryOptions::default()).unwrap_err();
        assert!(
            matches!(err, LibraryError::UndefinedExport { ref name } if name == "missing"),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_public_and_private_key_collision() {
        let err = rename(
            "function x() {} export function _ns_x() {}",
            &LibraryOptions::with_namespace("ns"),
        )
        .unwrap_err();
        assert!(matches!(err, LibraryError::NameCollision { ref key, .. } if key == "_ns_x"));
        assert!(err.to_string().contains("claimed by both 'x' and '_ns_x'"), "{}", err);
    }

    #[test]
    fn test_destructuring_assignment_keeps_property_name() {
        let (code, _) = rename(
            "var x = 1, y; export function f(obj) { ({ x, y = 2 } = obj); return x + y; }",
            &LibraryOptions::with_namespace("t"),
        )
        .unwrap();
        assert!(code.contains("x: _t_x"), "{}", code);
        assert!(code.contains("y: _t_y = 2"), "{}", code);
        assert!(code.contains("return _t_x + _t_y"), "{}", code);
    }

    #[test]
    fn test_local_destructuring_assignment_is_untouched() {
        let (code, _) = rename(
            "export function f(obj) { var x; ({ x } = obj); return x; }",
            &LibraryOptions::with_namespace("t"),
        )
        .unwrap();
        assert!(!code.contains("x:"), "{}", code);
        assert!(code.contains("return x"), "{}", code);
    }

    #[test]
    fn test_nested_binding_would_capture_new_name() {
        let err = rename(
            "var x = 1; export function f() { var _t_x = 2; return x; }",
            &LibraryOptions::with_namespace("t"),
        )
        .unwrap_err();
        assert!(
            matches!(err, LibraryError::NameCollision { ref key, .. } if key == "_t_x"),
            "{:?}",
            err
        );
    }

    #[test]
    fn test_nested_binding_of_own_public_name_is_shadowing() {
        let (code, _) = rename(
            "export function f(f) { return f; }",
            &LibraryOptions::default(),
        )
        .unwrap();
        assert!(code.contains("return f"), "{}", code);
    }

    #[test]
    fn test_reserved_public_reference_is_unsupported() {
        let err = rename(
            "function x() {} export { x as default };",
            &LibraryOptions::default(),
        )
        .unwrap_err();
        assert!(
            matches!(err, LibraryError::UnsupportedStatement { ref node, .. } if node == "export { x as default }"),
            "{:?}",
            err
        );
        let (_, symbols) = rename(
            "function x() {} export { x as default };",
            &LibraryOptions::default().naming(NamingConvention::Emscripten),
        )
        .unwrap();
        assert_eq!(symbols[0].key, "default");
        assert_eq!(symbols[0].reference, "_default");
    }

    #[test]
    fn test_namespace_must_yield_identifiers() {
        let err = rename(
            "var hidden = 1; export function f() { return hidden; }",
            &LibraryOptions::with_namespace("2d").naming(NamingConvention::Emscripten),
        )
        .unwrap_err();
        assert!(matches!(err, LibraryError::InvalidNamespace { .. }), "{:?}", err);
    }
}
