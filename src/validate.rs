//! Structural validation of the bundled module.
//!
//! A descriptor is a static property table, so the only top-level statements it can
//! represent are function declarations, variable declarations and named exports of
//! those. Variable values are evaluated once into the table, which is why their
//! initializers must be pure unless the postset policy was chosen explicitly.

use oxc_ast::ast::*;
use oxc_span::{GetSpan, Span};

use crate::error::{LibraryError, Result};
use crate::options::InitializerPolicy;

/// Source text covered by `span`, used to point the caller at the offending node.
pub(crate) fn node_text(source: &str, span: Span) -> String {
    source
        .get(span.start as usize..span.end as usize)
        .unwrap_or_default()
        .trim()
        .to_string()
}

// ═══════════════════════════════════════════════════════════════════════════════
// PURE VALUES
// ═══════════════════════════════════════════════════════════════════════════════

/// Whether evaluating `expr` can have no observable side effect.
///
/// Literals, `this`, function expressions, and unary/binary/logical operators, array
/// literals and object literals built only from pure parts.
pub fn is_pure_value(expr: &Expression<'_>) -> bool {
    match expr {
        Expression::BooleanLiteral(_)
        | Expression::NullLiteral(_)
        | Expression::NumericLiteral(_)
        | Expression::BigIntLiteral(_)
        | Expression::RegExpLiteral(_)
        | Expression::StringLiteral(_)
        | Expression::ThisExpression(_)
        | Expression::FunctionExpression(_) => true,
        Expression::UnaryExpression(unary) => is_pure_value(&unary.argument),
        Expression::ArrayExpression(array) => array.elements.iter().all(is_pure_element),
        Expression::ObjectExpression(object) => object.properties.iter().all(is_pure_property),
        Expression::BinaryExpression(binary) => {
            is_pure_value(&binary.left) && is_pure_value(&binary.right)
        }
        Expression::LogicalExpression(logical) => {
            is_pure_value(&logical.left) && is_pure_value(&logical.right)
        }
        Expression::ParenthesizedExpression(paren) => is_pure_value(&paren.expression),
        _ => false,
    }
}

fn is_pure_element(element: &ArrayExpressionElement<'_>) -> bool {
    match element {
        ArrayExpressionElement::SpreadElement(_) => false,
        ArrayExpressionElement::Elision(_) => true,
        other => other.as_expression().is_some_and(is_pure_value),
    }
}

fn is_pure_property(property: &ObjectPropertyKind<'_>) -> bool {
    match property {
        ObjectPropertyKind::ObjectProperty(prop) => {
            let key_is_pure = !prop.computed || prop.key.as_expression().is_some_and(is_pure_value);
            key_is_pure && is_pure_value(&prop.value)
        }
        // Spreading runs getters on the source object.
        ObjectPropertyKind::SpreadProperty(_) => false,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Rejects every top-level construct the descriptor format cannot hold.
pub fn validate_program(program: &Program<'_>, policy: InitializerPolicy) -> Result<()> {
    let source = program.source_text;

    for stmt in &program.body {
        match stmt {
            Statement::FunctionDeclaration(_) => {}
            Statement::VariableDeclaration(decl) => {
                check_variable_declaration(decl, source, policy)?;
            }
            Statement::ExportNamedDeclaration(export) => {
                check_named_export(export, source, policy)?;
            }
            other => {
                return Err(LibraryError::unsupported(
                    &node_text(source, other.span()),
                    describe_statement(other),
                ));
            }
        }
    }

    Ok(())
}

fn check_named_export(
    export: &ExportNamedDeclaration<'_>,
    source: &str,
    policy: InitializerPolicy,
) -> Result<()> {
    let unsupported = |reason: &str| LibraryError::unsupported(&node_text(source, export.span), reason);

    if export.source.is_some() {
        return Err(unsupported(
            "re-export from another module; the bundler must inline it",
        ));
    }

    match &export.declaration {
        Some(Declaration::FunctionDeclaration(_)) => Ok(()),
        Some(Declaration::VariableDeclaration(decl)) => {
            check_variable_declaration(decl, source, policy)
        }
        Some(_) => Err(unsupported(
            "only functions and variables can be exported",
        )),
        None => {
            for specifier in &export.specifiers {
                let string_name = matches!(specifier.local, ModuleExportName::StringLiteral(_))
                    || matches!(specifier.exported, ModuleExportName::StringLiteral(_));
                if string_name {
                    return Err(unsupported("string literal export names"));
                }
            }
            Ok(())
        }
    }
}

fn check_variable_declaration(
    decl: &VariableDeclaration<'_>,
    source: &str,
    policy: InitializerPolicy,
) -> Result<()> {
    if matches!(
        decl.kind,
        VariableDeclarationKind::Using | VariableDeclarationKind::AwaitUsing
    ) {
        return Err(LibraryError::unsupported(
            &node_text(source, decl.span),
            "`using` declarations",
        ));
    }

    for declarator in &decl.declarations {
        if !matches!(declarator.id, BindingPattern::BindingIdentifier(_)) {
            return Err(LibraryError::unsupported(
                &node_text(source, decl.span),
                "destructuring declarators",
            ));
        }

        if let Some(init) = &declarator.init {
            if policy == InitializerPolicy::Reject && !is_pure_value(init) {
                return Err(LibraryError::ImpureInitializer {
                    declarator: node_text(source, declarator.span),
                });
            }
        }
    }

    Ok(())
}

fn describe_statement(stmt: &Statement<'_>) -> &'static str {
    match stmt {
        Statement::ExpressionStatement(_) => "top-level expression with side effects",
        Statement::ImportDeclaration(_) => "import declaration; the bundler must resolve imports",
        Statement::ExportDefaultDeclaration(_) => "default export",
        Statement::ExportAllDeclaration(_) => "star re-export",
        Statement::ClassDeclaration(_) => "class declaration",
        Statement::IfStatement(_)
        | Statement::ForStatement(_)
        | Statement::ForInStatement(_)
        | Statement::ForOfStatement(_)
        | Statement::WhileStatement(_)
        | Statement::DoWhileStatement(_)
        | Statement::SwitchStatement(_)
        | Statement::TryStatement(_)
        | Statement::BlockStatement(_) => "top-level control flow",
        _ => "expected a function, variable or named export declaration",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn check(code: &str, policy: InitializerPolicy) -> Result<()> {
        let allocator = Allocator::default();
        let source_type = SourceType::default().with_module(true);
        let ret = Parser::new(&allocator, code, source_type).parse();
        assert!(ret.errors.is_empty(), "{:?}", ret.errors);
        validate_program(&ret.program, policy)
    }

    fn pure(code: &str) -> bool {
        let allocator = Allocator::default();
        let expr = Parser::new(&allocator, code, SourceType::default())
            .parse_expression()
            .unwrap();
        is_pure_value(&expr)
    }

    #[test]
    fn test_pure_values() {
        assert!(pure("10 + 20 - ~30"));
        assert!(pure("'a' || null"));
        assert!(pure("[1, , 'x', [true]]"));
        assert!(pure("({ a: 1, b: { c: this }, f: function() { return g(); } })"));
        assert!(pure("-(1 * 2)"));
        assert!(pure("/ab+c/g"));
        assert!(pure("({ ['k' + 1]: 2 })"));
    }

    #[test]
    fn test_impure_values() {
        assert!(!pure("new ArrayBuffer(10)"));
        assert!(!pure("getX()"));
        assert!(!pure("x"));
        assert!(!pure("[...items]"));
        assert!(!pure("({ ...other })"));
        assert!(!pure("({ [key]: 1 })"));
        assert!(!pure("1 + f()"));
        assert!(!pure("() => 1"));
        assert!(!pure("`template`"));
    }

    #[test]
    fn test_accepts_declarations_and_exports() {
        let pure_module = r#"
            var a = 1, b;
            function f() { return a; }
            export function g() {}
            export const h = 'h';
            export { a as alpha, f };
        "#;
        assert!(check(pure_module, InitializerPolicy::Reject).is_ok());

        let impure_module = "let c = [1, 2].length; export { c };";
        assert!(matches!(
            check(impure_module, InitializerPolicy::Reject),
            Err(LibraryError::ImpureInitializer { .. })
        ));
        assert!(check(impure_module, InitializerPolicy::Postset).is_ok());
    }

    #[test]
    fn test_rejects_side_effect_statement() {
        match check("sideEffect();", InitializerPolicy::Reject) {
            Err(LibraryError::UnsupportedStatement { node, .. }) => {
                assert_eq!(node, "sideEffect();");
            }
            other => panic!("expected UnsupportedStatement, got {:?}", other),
        }
    }

    #[test]
    fn test_impure_initializer_names_declarator() {
        match check(
            "var x = new ArrayBuffer(10);",
            InitializerPolicy::Reject,
        ) {
            Err(LibraryError::ImpureInitializer { declarator }) => {
                assert_eq!(declarator, "x = new ArrayBuffer(10)");
            }
            other => panic!("expected ImpureInitializer, got {:?}", other),
        }
    }

    #[test]
    fn test_exported_variable_is_checked() {
        assert!(matches!(
            check("export var x = getX(); function getX() { return 42; }", InitializerPolicy::Reject),
            Err(LibraryError::ImpureInitializer { .. })
        ));
    }

    #[test]
    fn test_rejects_unsupported_export_shapes() {
        for code in [
            "export default function f() {}",
            "export * from './other.js';",
            "export { a } from './other.js';",
            "export class K {}",
            "import { a } from './a.js';",
            "var { a, b } = {};",
            "class K {}",
            "if (true) {}",
        ] {
            assert!(
                matches!(
                    check(code, InitializerPolicy::Postset),
                    Err(LibraryError::UnsupportedStatement { .. })
                ),
                "{}",
                code
            );
        }
    }
}
