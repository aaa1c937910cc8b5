//! Descriptor serialization: reshapes the renamed declarations into the entry table and
//! prints it inside the `LibraryManager.library` merge call.

use oxc_allocator::Vec as ArenaVec;
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_span::{SourceType, SPAN};
use serde::Serialize;
use tracing::warn;

use crate::dependencies::{owner_index, DependencyGraph};
use crate::error::{LibraryError, Result};
use crate::options::InitializerPolicy;
use crate::renamer::{SymbolTable, Visibility};
use crate::scope::SymbolKind;
use crate::validate::is_pure_value;

/// Fixed output shape. The entry list becomes the second call argument.
pub const LIBRARY_TEMPLATE: &str = "Object.assign(LibraryManager.library, {});";

const DEPS_SUFFIX: &str = "__deps";
const POSTSET_SUFFIX: &str = "__postset";

// ═══════════════════════════════════════════════════════════════════════════════
// MANIFEST
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolManifest {
    pub internal_name: String,
    pub key: String,
    pub reference: String,
    pub visibility: Visibility,
    pub kind: SymbolKind,
    pub deps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postset: Option<String>,
}

/// Machine-readable summary of an emitted descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryManifest {
    pub namespace: String,
    pub symbols: Vec<SymbolManifest>,
    entries: Vec<String>,
}

impl LibraryManifest {
    /// Descriptor keys in the order they were emitted.
    pub fn entry_keys(&self) -> &[String] {
        &self.entries
    }

    pub fn symbol(&self, key: &str) -> Option<&SymbolManifest> {
        self.symbols.iter().find(|s| s.key == key)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| LibraryError::internal(format!("manifest serialization failed: {}", e)))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SERIALIZER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct DescriptorSerializer<'a> {
    ast: AstBuilder<'a>,
    source_type: SourceType,
    policy: InitializerPolicy,
}

impl<'a> DescriptorSerializer<'a> {
    pub fn new(ast: AstBuilder<'a>, source_type: SourceType, policy: InitializerPolicy) -> Self {
        DescriptorSerializer {
            ast,
            source_type,
            policy,
        }
    }

    /// Consumes the renamed module body and returns the descriptor text with its manifest.
    pub fn serialize(
        &self,
        body: ArenaVec<'a, Statement<'a>>,
        namespace: &str,
        symbols: &SymbolTable,
        graph: &DependencyGraph,
    ) -> Result<(String, LibraryManifest)> {
        let mut properties = self.ast.vec();
        let mut entries = Vec::new();
        let mut postsets: Vec<Option<String>> = vec![None; symbols.len()];

        for stmt in body {
            match stmt {
                Statement::FunctionDeclaration(mut func) => {
                    let index = owner_index(func.id.as_ref(), symbols)?;
                    func.r#type = FunctionType::FunctionExpression;
                    func.id = None;
                    let key = symbols.symbols()[index].key.as_str();
                    properties.push(self.entry(key, Expression::FunctionExpression(func)));
                    entries.push(key.to_string());
                }
                Statement::VariableDeclaration(mut decl) => {
                    let declarators = std::mem::replace(&mut decl.declarations, self.ast.vec());
                    for declarator in declarators {
                        let id = match &declarator.id {
                            BindingPattern::BindingIdentifier(id) => Some(&**id),
                            _ => None,
                        };
                        let index = owner_index(id, symbols)?;
                        let symbol = &symbols.symbols()[index];

                        let value = match declarator.init {
                            None => self.placeholder()?,
                            Some(init) if is_pure_value(&init) => init,
                            Some(init) => {
                                if self.policy != InitializerPolicy::Postset {
                                    return Err(LibraryError::internal(format!(
                                        "impure initializer of '{}' survived validation",
                                        symbol.internal_name
                                    )));
                                }
                                let deferred = format!(
                                    "{} = {};",
                                    symbol.reference,
                                    self.print_initializer(init)?
                                );
                                warn!(
                                    key = %symbol.key,
                                    "deferring impure initializer to {}{}",
                                    symbol.key,
                                    POSTSET_SUFFIX
                                );
                                postsets[index] = Some(deferred);
                                self.placeholder()?
                            }
                        };

                        properties.push(self.entry(&symbol.key, value));
                        entries.push(symbol.key.clone());

                        if let Some(deferred) = &postsets[index] {
                            let key = format!("{}{}", symbol.key, POSTSET_SUFFIX);
                            let text: &'a str = self.ast.allocator.alloc_str(deferred);
                            let literal = self.ast.expression_string_literal(SPAN, text, None);
                            properties.push(self.entry(&key, literal));
                            entries.push(key);
                        }
                    }
                }
                _ => {
                    return Err(LibraryError::internal(
                        "serializer reached a non-declaration statement",
                    ));
                }
            }
        }

        for index in 0..symbols.len() {
            let deps = graph.keys_of(index, symbols);
            if deps.is_empty() {
                continue;
            }
            let mut elements = self.ast.vec();
            for dep in deps {
                let text: &'a str = self.ast.allocator.alloc_str(dep);
                elements.push(ArrayExpressionElement::from(
                    self.ast.expression_string_literal(SPAN, text, None),
                ));
            }
            let key = format!("{}{}", symbols.symbols()[index].key, DEPS_SUFFIX);
            properties.push(self.entry(&key, self.ast.expression_array(SPAN, elements)));
            entries.push(key);
        }

        let code = self.print_library(properties)?;

        let manifest = LibraryManifest {
            namespace: namespace.to_string(),
            symbols: symbols
                .symbols()
                .iter()
                .zip(postsets)
                .enumerate()
                .map(|(index, (symbol, postset))| SymbolManifest {
                    internal_name: symbol.internal_name.clone(),
                    key: symbol.key.clone(),
                    reference: symbol.reference.clone(),
                    visibility: symbol.visibility,
                    kind: symbol.kind,
                    deps: graph
                        .keys_of(index, symbols)
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    postset,
                })
                .collect(),
            entries,
        };

        Ok((code, manifest))
    }

    fn entry(&self, key: &str, value: Expression<'a>) -> ObjectPropertyKind<'a> {
        let key: &'a str = self.ast.allocator.alloc_str(key);
        self.ast.object_property_kind_object_property(
            SPAN,
            PropertyKind::Init,
            PropertyKey::StaticIdentifier(self.ast.alloc(self.ast.identifier_name(SPAN, key))),
            value,
            false,
            false,
            false,
        )
    }

    fn placeholder(&self) -> Result<Expression<'a>> {
        Parser::new(self.ast.allocator, "void 0", SourceType::default())
            .parse_expression()
            .map_err(|_| LibraryError::internal("placeholder expression failed to parse"))
    }

    /// Initializer text as it appears on the right of an assignment.
    fn print_initializer(&self, init: Expression<'a>) -> Result<String> {
        let needs_parens = matches!(init, Expression::SequenceExpression(_));
        let mut statements = self.ast.vec();
        statements.push(self.ast.statement_expression(SPAN, init));
        let printed = self.print(statements);
        let text = printed.trim_end();
        let text = text.strip_suffix(';').unwrap_or(text);
        Ok(if needs_parens {
            format!("({})", text)
        } else {
            text.to_string()
        })
    }

    fn print_library(&self, properties: ArenaVec<'a, ObjectPropertyKind<'a>>) -> Result<String> {
        let ret = Parser::new(self.ast.allocator, LIBRARY_TEMPLATE, self.source_type).parse();
        let mut program = ret.program;

        let target = match program.body.first_mut() {
            Some(Statement::ExpressionStatement(stmt)) => match &mut stmt.expression {
                Expression::CallExpression(call) => match call.arguments.get_mut(1) {
                    Some(Argument::ObjectExpression(object)) => Some(object),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        };
        let object = target
            .ok_or_else(|| LibraryError::internal("library template lost its object argument"))?;
        object.properties = properties;

        Ok(Codegen::new().build(&program).code)
    }

    fn print(&self, statements: ArenaVec<'a, Statement<'a>>) -> String {
        let mut program = Parser::new(self.ast.allocator, "", self.source_type)
            .parse()
            .program;
        program.body = statements;
        Codegen::new().build(&program).code
    }
}
