//! Builds the class table from the syntax tree.
//!
//! This is a single pre-order walk. Duplicate declarations are reported and
//! the first declaration is kept, so the walk always produces a complete
//! table that the type checker can use.
use jmmc_dsl::{
    diagnostic::{Diagnostic, Label, StageOutput},
    syntax::{NodeId, NodeKind, SyntaxTree},
    types::{Symbol, Type},
};
use jmmc_problems::Problem;
use log::{debug, trace};

use crate::symbol_table::{ClassTable, Method};

pub fn build(tree: &SyntaxTree) -> StageOutput<ClassTable> {
    let mut builder = SymbolTableBuilder {
        tree,
        table: ClassTable::new(),
        diagnostics: vec![],
    };
    if let Some(root) = tree.root() {
        builder.visit(root);
    }

    debug!(
        "Symbol table for {}: {} imports, {} fields, {} methods, {} diagnostics",
        builder.table.class_name().unwrap_or("<none>"),
        builder.table.imports().len(),
        builder.table.fields().count(),
        builder.table.methods().count(),
        builder.diagnostics.len()
    );
    StageOutput::new(builder.table, builder.diagnostics)
}

/// Creates the method described by a `MainMethod` or `InstanceMethod` node,
/// without its locals.
pub fn method_from_node(tree: &SyntaxTree, id: NodeId) -> Option<Method> {
    match tree.kind(id) {
        NodeKind::MainMethod => {
            let parameters = tree
                .first_child_of_kind(id, NodeKind::MethodArguments)
                .map(|args| parameters(tree, args))
                .unwrap_or_default()
                .into_iter()
                .map(|param| Symbol::new(param.name, Type::string_array()))
                .collect();
            Some(Method::new("main", Type::void(), parameters, true))
        }
        NodeKind::InstanceMethod => {
            let header = tree.first_child_of_kind(id, NodeKind::MethodHeader)?;
            let name = tree.child_identifier(header)?;
            let return_type = tree
                .first_child_of_kind(header, NodeKind::Type)
                .and_then(|ty| tree.declared_type(ty))?;
            let parameters = tree
                .first_child_of_kind(id, NodeKind::MethodArguments)
                .map(|args| parameters(tree, args))
                .unwrap_or_default();
            Some(Method::new(name, return_type, parameters, false))
        }
        _ => None,
    }
}

/// Pairs up the `Type`, `ID` children of a `MethodArguments` node.
fn parameters(tree: &SyntaxTree, id: NodeId) -> Vec<Symbol> {
    let mut parameters = vec![];
    let mut pending: Option<Type> = None;
    for child in tree.children(id) {
        match tree.kind(*child) {
            NodeKind::Type => pending = tree.declared_type(*child),
            NodeKind::Id => {
                if let (Some(ty), Some(name)) = (pending.take(), tree.identifier(*child)) {
                    parameters.push(Symbol::new(name, ty));
                }
            }
            _ => {}
        }
    }
    parameters
}

/// The symbol declared by a `VarDeclaration` node.
pub fn declared_symbol(tree: &SyntaxTree, id: NodeId) -> Option<Symbol> {
    let ty = tree
        .first_child_of_kind(id, NodeKind::Type)
        .and_then(|ty| tree.declared_type(ty))?;
    let name = tree.child_identifier(id)?;
    Some(Symbol::new(name, ty))
}

struct SymbolTableBuilder<'a> {
    tree: &'a SyntaxTree,
    table: ClassTable,
    diagnostics: Vec<Diagnostic>,
}

impl SymbolTableBuilder<'_> {
    fn visit(&mut self, id: NodeId) {
        match self.tree.kind(id) {
            NodeKind::ImportDeclaration => self.visit_import(id),
            NodeKind::ClassDeclaration => {
                if self.table.class_name().is_none() {
                    if let Some(name) = self.tree.child_identifier(id) {
                        self.table.set_class_name(name);
                    }
                }
                self.visit_children(id);
            }
            NodeKind::InheritanceDeclaration => {
                if let Some(name) = self.tree.child_identifier(id) {
                    self.table.set_super_name(name);
                }
            }
            NodeKind::VarDeclaration => {
                if self.tree.parent(id).map(|p| self.tree.kind(p)) == Some(NodeKind::ClassDeclaration)
                {
                    self.visit_field(id);
                }
            }
            NodeKind::MainMethod | NodeKind::InstanceMethod => self.visit_method(id),
            _ => self.visit_children(id),
        }
    }

    fn visit_children(&mut self, id: NodeId) {
        for child in self.tree.children(id) {
            self.visit(*child);
        }
    }

    fn visit_import(&mut self, id: NodeId) {
        let path = self
            .tree
            .children_of_kind(id, NodeKind::Id)
            .filter_map(|child| self.tree.identifier(child))
            .collect::<Vec<_>>()
            .join(".");
        trace!("Import {}", path);
        if !self.table.add_import(path.clone()) {
            self.diagnostics.push(
                Diagnostic::problem(
                    Problem::DuplicateImport,
                    Label::at(self.tree.position(id), "Import declaration"),
                )
                .with_context("import", &path)
                .warning(),
            );
        }
    }

    fn visit_field(&mut self, id: NodeId) {
        let Some(symbol) = declared_symbol(self.tree, id) else {
            return;
        };
        trace!("Field {}", symbol);
        let name = symbol.name.clone();
        if let Err(existing) = self.table.add_field(symbol) {
            let existing = existing.to_string();
            self.diagnostics.push(
                Diagnostic::problem(
                    Problem::DuplicateField,
                    Label::at(self.tree.position(id), "Field declaration"),
                )
                .with_context("field", &name)
                .with_context("existing", &existing),
            );
        }
    }

    fn visit_method(&mut self, id: NodeId) {
        let Some(method) = method_from_node(self.tree, id) else {
            self.diagnostics.push(Diagnostic::todo(file!(), line!()));
            return;
        };
        let signature = method.signature();
        trace!("Method {}", signature);

        if self.table.add_method(method).is_err() {
            self.diagnostics.push(
                Diagnostic::problem(
                    Problem::DuplicateMethod,
                    Label::at(self.tree.position(id), "Method declaration"),
                )
                .with_context("signature", &signature.to_string()),
            );
            return;
        }

        let Some(body) = self.tree.first_child_of_kind(id, NodeKind::MethodBody) else {
            return;
        };
        let declarations: Vec<NodeId> = self
            .tree
            .children_of_kind(body, NodeKind::VarDeclaration)
            .collect();
        for declaration in declarations {
            let Some(symbol) = declared_symbol(self.tree, declaration) else {
                continue;
            };
            let name = symbol.name.clone();
            let Some(method) = self.table.method_mut(&signature) else {
                return;
            };
            if method.add_local(symbol).is_err() {
                self.diagnostics.push(
                    Diagnostic::problem(
                        Problem::DuplicateLocal,
                        Label::at(self.tree.position(declaration), "Variable declaration"),
                    )
                    .with_context("variable", &name)
                    .with_context("method", signature.name.as_str()),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use jmmc_dsl::types::Type;
    use jmmc_problems::Problem;
    use jmmc_test::ast::*;

    use super::build;
    use crate::symbol_table::Signature;
    use crate::test_helpers::codes;

    #[test]
    fn build_when_imports_and_inheritance_then_recorded() {
        let tree = program(
            &["io", "java.util.List"],
            class("Simple", Some("List"), vec![main_method(vec![])]),
        );

        let output = build(&tree);

        assert!(output.diagnostics.is_empty());
        let table = output.value;
        assert_eq!(table.imports(), &["io".to_string(), "java.util.List".to_string()]);
        assert_eq!(table.class_name(), Some("Simple"));
        assert_eq!(table.super_name(), Some("List"));
    }

    #[test]
    fn build_when_duplicate_import_then_warning() {
        let tree = program(&["io", "io"], class("Simple", None, vec![]));

        let output = build(&tree);

        assert_eq!(codes(&output.diagnostics), vec![Problem::DuplicateImport.code()]);
        assert!(!output.has_errors());
        assert_eq!(output.value.imports().len(), 1);
    }

    #[test]
    fn build_when_duplicate_field_then_error_and_keeps_first() {
        let tree = program(
            &[],
            class(
                "Simple",
                None,
                vec![var_decl("int", "a"), var_decl("boolean", "a")],
            ),
        );

        let output = build(&tree);

        assert_eq!(codes(&output.diagnostics), vec![Problem::DuplicateField.code()]);
        assert_eq!(output.value.field("a").unwrap().ty, Type::int());
    }

    #[test]
    fn build_when_duplicate_method_signature_then_one_error_and_keeps_first() {
        let tree = program(
            &[],
            class(
                "Simple",
                None,
                vec![
                    method(
                        "int",
                        "foo",
                        &[("int", "a")],
                        vec![var_decl("int", "first")],
                        Some(int(1)),
                    ),
                    method(
                        "int",
                        "foo",
                        &[("int", "b")],
                        vec![var_decl("int", "second")],
                        Some(int(2)),
                    ),
                ],
            ),
        );

        let output = build(&tree);

        assert_eq!(codes(&output.diagnostics), vec![Problem::DuplicateMethod.code()]);
        let signature = Signature {
            name: "foo".to_string(),
            return_type: Type::int(),
            parameter_types: vec![Type::int()],
        };
        let method = output.value.method(&signature).unwrap();
        assert_eq!(method.parameters()[0].name, "a");
        assert!(method.local("first").is_some());
        assert!(method.local("second").is_none());
    }

    #[test]
    fn build_when_overload_by_parameter_type_then_both_registered() {
        let tree = program(
            &[],
            class(
                "Simple",
                None,
                vec![
                    method("int", "foo", &[("int", "a")], vec![], Some(int(1))),
                    method("int", "foo", &[("boolean", "a")], vec![], Some(int(1))),
                ],
            ),
        );

        let output = build(&tree);

        assert!(output.diagnostics.is_empty());
        assert_eq!(output.value.methods_named("foo").count(), 2);
    }

    #[test]
    fn build_when_repeated_local_then_one_error_and_keeps_first_type() {
        let tree = program(
            &[],
            class(
                "Simple",
                None,
                vec![main_method(vec![
                    var_decl("int", "x"),
                    var_decl("boolean", "x"),
                ])],
            ),
        );

        let output = build(&tree);

        assert_eq!(codes(&output.diagnostics), vec![Problem::DuplicateLocal.code()]);
        let main = output.value.methods_named("main").next().unwrap();
        assert_eq!(main.local("x").unwrap().ty, Type::int());
    }

    #[test]
    fn build_when_main_method_then_static_void_with_string_array() {
        let tree = program(&[], class("Simple", None, vec![main_method(vec![])]));

        let output = build(&tree);

        let main = output.value.methods_named("main").next().unwrap();
        assert!(main.is_static());
        assert_eq!(main.return_type(), &Type::void());
        assert_eq!(main.parameters()[0].ty, Type::string_array());
        assert_eq!(main.parameters()[0].name, "args");
    }

    #[test]
    fn build_when_nested_scope_declaration_then_not_a_local() {
        let tree = program(
            &[],
            class(
                "Simple",
                None,
                vec![main_method(vec![scope(vec![var_decl("int", "inner")])])],
            ),
        );

        let output = build(&tree);

        let main = output.value.methods_named("main").next().unwrap();
        assert!(main.local("inner").is_none());
        assert!(output.value.field("inner").is_none());
    }
}
