//! Model builder: one top-down pass over a `SourceFile` producing a
//! `SourceModel` plus diagnostics.
//!
//! The traversal threads a [`Scope`] value that decides where each new
//! entity attaches: the model root, an owning object (inside an object
//! literal), the entity being initialized (right-hand side of `=`), or the
//! argument list of a call.

use crate::consts::resolve_constant;
use crate::diagnostic::Diagnostic;
use crate::id::{Name, dotted};
use crate::model::{Binding, Call, Entity, EntityId, Literal, Range, SourceModel};
use crate::syntax::*;

/// Result of one build. The model is complete unless `diagnostics` holds
/// a fatal entry, in which case it holds whatever was built before it.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub model: SourceModel,
    pub diagnostics: Vec<Diagnostic>,
}

impl BuildOutput {
    pub fn is_fatal(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == crate::diagnostic::Severity::Fatal)
    }
}

/// Build the semantic model of a parsed script.
#[must_use]
pub fn build_model(file: &SourceFile) -> BuildOutput {
    let mut builder = Builder {
        model: SourceModel::new(file.file_name.clone(), file.range),
        diagnostics: Vec::new(),
        statement: file.range,
    };

    for stmt in &file.statements {
        builder.statement = stmt.range;
        if builder.visit_stmt(stmt, Scope::Root).is_err() {
            log::warn!("{}: build aborted at {:?}", file.file_name, stmt.range);
            break;
        }
    }

    builder.model.prune();
    log::debug!(
        "{}: built {} entities ({} addressable), {} diagnostics",
        file.file_name,
        builder.model.entity_count(),
        builder.model.variables().len(),
        builder.diagnostics.len()
    );

    BuildOutput {
        model: builder.model,
        diagnostics: builder.diagnostics,
    }
}

/// Where the entity produced by the current node attaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Top-level statement.
    Root,
    /// Property of an object literal owned by `owner`. Children share the
    /// owner's declaring statement when `init_range` is set.
    Member {
        owner: EntityId,
        init_range: Option<Range>,
    },
    /// Right-hand side of a declaration or assignment to the entity.
    Init(EntityId),
    /// Positional argument of the call entity.
    Args(EntityId),
}

/// The build cannot continue.
struct Fatal;

struct Builder {
    model: SourceModel,
    diagnostics: Vec<Diagnostic>,
    /// Span of the top-level statement being visited.
    statement: Range,
}

impl Builder {
    // ─── Statements ─────────────────────────────────────────────────────

    fn visit_stmt(&mut self, stmt: &Stmt, scope: Scope) -> Result<(), Fatal> {
        match &stmt.kind {
            StmtKind::Variable(list) => self.visit_variable_list(list, scope),
            StmtKind::Expression(expr) => self.visit_expr(expr, scope),
            // Nested statements still range-widen against the top-level block.
            StmtKind::Block(stmts) => {
                for stmt in stmts {
                    self.visit_stmt(stmt, scope)?;
                }
                Ok(())
            }
            // No declarative meaning; skipped along with their children.
            StmtKind::If { .. } | StmtKind::Function { .. } | StmtKind::Empty => Ok(()),
            _ => {
                self.diagnostics
                    .push(Diagnostic::missed(stmt.range, stmt.describe()));
                Ok(())
            }
        }
    }

    fn visit_variable_list(&mut self, list: &VariableList, scope: Scope) -> Result<(), Fatal> {
        let single = list.declarations.len() == 1;
        for decl in &list.declarations {
            let ident = match &decl.target {
                BindingTarget::Identifier(ident) => ident,
                BindingTarget::Pattern(range) => {
                    self.diagnostics.push(Diagnostic::fatal(
                        *range,
                        "declaration target must be a plain identifier",
                    ));
                    return Err(Fatal);
                }
            };

            // A lone declaration owns the whole statement; in a list each
            // declarator only owns itself.
            let init_range = if single {
                self.full_init_range(list.range)
            } else {
                self.full_init_range(decl.range)
            };
            let id = self.model.alloc(Entity {
                range: decl.range,
                init_range,
                ..Entity::new(Name::intern(&ident.name))
            });
            log::trace!("declare `{}` at {:?}", ident.name, decl.range);
            self.attach(scope, id);

            if let Some(init) = &decl.init {
                self.visit_expr(init, Scope::Init(id))?;
            }
        }
        Ok(())
    }

    // ─── Expressions ────────────────────────────────────────────────────

    fn visit_expr(&mut self, expr: &Expr, scope: Scope) -> Result<(), Fatal> {
        match &expr.kind {
            ExprKind::Paren(inner) => self.visit_expr(inner, scope),
            ExprKind::Bool(value) => {
                self.literal(value.to_string(), expr.range, scope);
                Ok(())
            }
            ExprKind::Number(text) => {
                self.literal(text.clone(), expr.range, scope);
                Ok(())
            }
            ExprKind::String(text) => {
                self.literal(text.clone(), expr.range, scope);
                Ok(())
            }
            // Signed numbers are literals too: `SetLayout(-4, 0, 10, 10)`.
            ExprKind::Unary {
                op: op @ (UnaryOp::Neg | UnaryOp::Plus),
                operand,
            } if matches!(operand.kind, ExprKind::Number(_)) => {
                let ExprKind::Number(text) = &operand.kind else {
                    return Ok(());
                };
                let sign = if *op == UnaryOp::Neg { "-" } else { "" };
                self.literal(format!("{sign}{text}"), expr.range, scope);
                Ok(())
            }
            ExprKind::Identifier(_) | ExprKind::Member { .. } => {
                self.visit_name(expr, scope);
                Ok(())
            }
            ExprKind::Call { callee, args } => self.visit_call(expr, callee, args, scope),
            ExprKind::Object(properties) => self.visit_object(expr, properties, scope),
            ExprKind::Binary {
                op: BinaryOp::Assign,
                left,
                right,
            } => self.visit_assignment(expr, left, right),
            // Function expressions carry no declarative meaning; in an
            // argument slot they still occupy their position.
            ExprKind::Function => {
                if let Scope::Args(func) = scope {
                    self.opaque_arg(func, expr.range);
                }
                Ok(())
            }
            _ => {
                self.unsupported(expr, scope);
                Ok(())
            }
        }
    }

    /// A literal either becomes the value of the entity being initialized
    /// or an anonymous value in its own right.
    fn literal(&mut self, text: String, range: Range, scope: Scope) {
        let literal = Literal { text, range };
        match scope {
            Scope::Init(target) => {
                self.model.entity_mut(target).binding = Binding::Value(literal);
            }
            Scope::Root => {
                self.diagnostics.push(Diagnostic::warning(
                    range,
                    "no-effect",
                    "literal statement has no effect",
                ));
            }
            Scope::Member { .. } | Scope::Args(_) => {
                let id = self.model.alloc(Entity {
                    range,
                    init_range: range,
                    binding: Binding::Value(literal),
                    ..Entity::new(Name::anonymous())
                });
                self.attach(scope, id);
            }
        }
    }

    /// Identifier or property access: a symbolic constant, or a reference
    /// to a (possibly forward-declared) entity.
    fn visit_name(&mut self, expr: &Expr, scope: Scope) {
        let Some(path) = member_path(expr) else {
            self.unsupported(expr, scope);
            return;
        };

        if let Some(value) = resolve_constant(&path.join(".")) {
            self.literal(value, expr.range, scope);
            return;
        }

        let name: Vec<Name> = path.iter().map(|s| Name::intern(s)).collect();
        match scope {
            Scope::Root => {
                self.diagnostics.push(Diagnostic::warning(
                    expr.range,
                    "no-effect",
                    format!("`{}` on its own has no effect", path.join(".")),
                ));
            }
            Scope::Init(target) => {
                let referent = self.model.find_or_create(&name);
                self.model.entity_mut(target).binding = Binding::Reference(referent);
                log::trace!(
                    "`{}` refers to `{}`",
                    self.model.dotted_name(target, false),
                    dotted(&name)
                );
            }
            Scope::Member { .. } | Scope::Args(_) => {
                let referent = self.model.find_or_create(&name);
                let id = self.model.alloc(Entity {
                    range: expr.range,
                    init_range: expr.range,
                    binding: Binding::Reference(referent),
                    ..Entity::new(Name::anonymous())
                });
                self.attach(scope, id);
            }
        }
    }

    /// Every call site gets its own Function entity, named after the last
    /// callee segment and owned by the rest of the callee path.
    fn visit_call(
        &mut self,
        expr: &Expr,
        callee: &Expr,
        args: &[Expr],
        scope: Scope,
    ) -> Result<(), Fatal> {
        let Some(path) = member_path(callee) else {
            self.unsupported(expr, scope);
            return Ok(());
        };
        let Some((last, prefix)) = path.split_last() else {
            return Ok(());
        };

        let owner = if prefix.is_empty() {
            None
        } else {
            let prefix: Vec<Name> = prefix.iter().map(|s| Name::intern(s)).collect();
            Some(self.model.find_or_create(&prefix))
        };

        let init_range = self.full_init_range(expr.range);
        let func = self.model.alloc(Entity {
            owner,
            range: expr.range,
            init_range,
            call: Some(Call::default()),
            ..Entity::new(Name::intern(last))
        });
        log::trace!("call `{}` with {} args", path.join("."), args.len());

        for arg in args {
            self.visit_expr(arg, Scope::Args(func))?;
        }
        self.attach(scope, func);
        Ok(())
    }

    /// Object literal: its properties become children of the entity being
    /// initialized and share that entity's declaring statement.
    fn visit_object(
        &mut self,
        expr: &Expr,
        properties: &[Property],
        scope: Scope,
    ) -> Result<(), Fatal> {
        let owner = match scope {
            Scope::Init(owner) | Scope::Member { owner, .. } => owner,
            Scope::Args(func) => {
                self.diagnostics
                    .push(Diagnostic::missed(expr.range, "object literal argument"));
                self.opaque_arg(func, expr.range);
                return Ok(());
            }
            Scope::Root => {
                self.diagnostics.push(Diagnostic::missed(expr.range, expr.describe()));
                return Ok(());
            }
        };

        let child_scope = Scope::Member {
            owner,
            init_range: Some(self.model.entity(owner).init_range),
        };
        for property in properties {
            self.visit_property(property, child_scope)?;
        }
        Ok(())
    }

    fn visit_property(&mut self, property: &Property, scope: Scope) -> Result<(), Fatal> {
        match &property.kind {
            PropertyKind::Assignment { name, value } => {
                let init_range = self.full_init_range(property.range);
                let id = self.model.alloc(Entity {
                    range: property.range,
                    init_range,
                    ..Entity::new(Name::intern(&property_name(name)))
                });
                self.attach(scope, id);
                self.visit_expr(value, Scope::Init(id))
            }
            PropertyKind::Shorthand(ident) => {
                let init_range = self.full_init_range(property.range);
                let id = self.model.alloc(Entity {
                    range: property.range,
                    init_range,
                    ..Entity::new(Name::intern(&ident.name))
                });
                self.attach(scope, id);
                Ok(())
            }
            // Method bodies are skipped like any other function body.
            PropertyKind::Method(_) => Ok(()),
        }
    }

    /// `a.b.c = value`: the target is resolved (created if needed) and
    /// takes the assignment's spans, then the value binds to it.
    fn visit_assignment(&mut self, expr: &Expr, left: &Expr, right: &Expr) -> Result<(), Fatal> {
        let Some(path) = member_path(left) else {
            self.diagnostics
                .push(Diagnostic::missed(left.range, "assignment target"));
            return Ok(());
        };
        let name: Vec<Name> = path.iter().map(|s| Name::intern(s)).collect();
        let target = self.model.find_or_create(&name);

        let init_range = self.full_init_range(expr.range);
        let entity = self.model.entity_mut(target);
        entity.range = expr.range;
        entity.init_range = init_range;
        entity.binding = Binding::Unset;
        log::trace!("assign `{}` at {:?}", path.join("."), expr.range);

        self.visit_expr(right, Scope::Init(target))
    }

    // ─── Helpers ────────────────────────────────────────────────────────

    fn attach(&mut self, scope: Scope, id: EntityId) {
        match scope {
            Scope::Root => self.model.push_variable(id),
            Scope::Member { owner, init_range } => {
                let entity = self.model.entity_mut(id);
                entity.owner = Some(owner);
                if let Some(init_range) = init_range {
                    entity.init_range = init_range;
                }
                self.model.push_variable(id);
            }
            Scope::Init(target) => {
                let binding = match self.model.entity(id) {
                    entity if entity.call.is_none() && entity.value().is_some() => {
                        entity.binding.clone()
                    }
                    _ => Binding::Initializer(id),
                };
                self.model.entity_mut(target).binding = binding;
            }
            Scope::Args(func) => {
                if let Some(call) = &mut self.model.entity_mut(func).call {
                    call.args.push(id);
                }
            }
        }
    }

    /// Keep the argument slot of a construct the model does not represent.
    fn opaque_arg(&mut self, func: EntityId, range: Range) {
        let id = self.model.alloc(Entity {
            range,
            init_range: range,
            ..Entity::new(Name::anonymous())
        });
        self.attach(Scope::Args(func), id);
    }

    fn unsupported(&mut self, expr: &Expr, scope: Scope) {
        self.diagnostics
            .push(Diagnostic::missed(expr.range, expr.describe()));
        if let Scope::Args(func) = scope {
            self.opaque_arg(func, expr.range);
        }
    }

    /// Extend a node's span to its statement's end when only the statement
    /// terminator lies between them.
    fn full_init_range(&self, node: Range) -> Range {
        let end = if self.statement.end.abs_diff(node.end) < 2 {
            self.statement.end
        } else {
            node.end
        };
        Range::new(node.pos, end)
    }
}

/// Dotted segments of an identifier or property-access chain.
fn member_path(expr: &Expr) -> Option<Vec<String>> {
    match &expr.kind {
        ExprKind::Identifier(name) => Some(vec![name.clone()]),
        ExprKind::Member { object, property } => {
            let mut path = member_path(object)?;
            path.push(property.name.clone());
            Some(path)
        }
        ExprKind::Paren(inner) => member_path(inner),
        _ => None,
    }
}

fn property_name(name: &PropertyName) -> String {
    match name {
        PropertyName::Identifier(ident) => ident.name.clone(),
        PropertyName::String(value) => value.clone(),
        PropertyName::Number(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use crate::id::parse_dotted;
    use crate::model::EntityKind;
    use crate::parser::parse_script;
    use pretty_assertions::assert_eq;

    fn build(src: &str) -> BuildOutput {
        let file = parse_script(src, "test.js").expect("parse failed");
        build_model(&file)
    }

    fn lookup(out: &BuildOutput, name: &str) -> EntityId {
        out.model.find(&parse_dotted(name)).expect("entity not found")
    }

    #[test]
    fn block_children_are_modelled() {
        let src = "let f = NewForm();\n{ let b = f.NewButton('x'); }";
        let out = build(src);
        assert!(out.diagnostics.is_empty(), "{:?}", out.diagnostics);

        let b = lookup(&out, "b");
        let entity = out.model.entity(b);
        assert_eq!(entity.init_range.slice(src), " let b = f.NewButton('x')");
        let ctor = entity.initializer().expect("initializer");
        assert_eq!(out.model.dotted_name(ctor, false), "f.NewButton");
    }

    #[test]
    fn declaration_owns_its_statement() {
        let src = "let f = NewForm();\nf.Show();";
        let out = build(src);
        let f = lookup(&out, "f");
        let entity = out.model.entity(f);
        assert_eq!(entity.kind(), EntityKind::Object);
        assert_eq!(entity.init_range, Range::new(0, 18));
        assert_eq!(entity.range.slice(src), " f = NewForm()");

        let init = entity.initializer().expect("initializer");
        assert_eq!(out.model.dotted_name(init, false), "NewForm");
        assert!(out.model.entity(init).is_function());
    }

    #[test]
    fn literal_assignment_binds_value() {
        let src = "let f = NewForm();\nf.Caption = \"Login\";";
        let out = build(src);
        let caption = lookup(&out, "f.Caption");
        let literal = out.model.entity(caption).value().expect("value");
        assert_eq!(literal.text, "Login");
        assert_eq!(literal.range.slice(src), " \"Login\"");
        // Statement range absorbs the trailing `;`.
        assert_eq!(out.model.entity(caption).init_range.end, src.len());
    }

    #[test]
    fn statement_call_collects_positional_args() {
        let src = "let f = NewForm();\nlet b = f.NewButton(\"OK\");\nb.SetLayout(1, 2, 3, 4);";
        let out = build(src);
        let layout = out
            .model
            .find_function(&parse_dotted("b.SetLayout"))
            .expect("layout call");
        let args = out.model.entity(layout).args();
        let texts: Vec<_> = args
            .iter()
            .map(|&a| out.model.entity(a).value().map(|l| l.text.clone()))
            .collect();
        assert_eq!(
            texts,
            vec![
                Some("1".to_string()),
                Some("2".to_string()),
                Some("3".to_string()),
                Some("4".to_string())
            ]
        );
        assert_eq!(out.model.entity(args[1]).range.slice(src), " 2");

        let b = lookup(&out, "b");
        let ctor = out.model.entity(b).initializer().expect("constructor call");
        assert_eq!(out.model.dotted_name(ctor, false), "f.NewButton");
    }

    #[test]
    fn constants_become_values() {
        let out = build("let f = NewForm();\nf.Align = AlignType.Client;");
        let align = lookup(&out, "f.Align");
        assert_eq!(out.model.entity(align).value().map(|l| l.text.as_str()), Some("5"));
    }

    #[test]
    fn identifiers_become_references() {
        let out = build("let f = NewForm();\nlet g = f;");
        let g = lookup(&out, "g");
        assert_eq!(out.model.entity(g).kind(), EntityKind::Reference);
        assert_eq!(out.model.dotted_name(g, true), "f");
    }

    #[test]
    fn forward_reference_placeholder_is_pruned() {
        let out = build("let a = later;\nlet later = 1;");
        let names: Vec<_> = out
            .model
            .variables()
            .iter()
            .map(|&id| out.model.dotted_name(id, false))
            .collect();
        assert_eq!(names, vec!["a", "later"]);
    }

    #[test]
    fn object_literal_members_share_owner_statement() {
        let src = "let style = { Color: 3, Font: { Size: 10 } };";
        let out = build(src);
        let style = lookup(&out, "style");
        let color = lookup(&out, "style.Color");
        let size = lookup(&out, "style.Font.Size");
        assert_eq!(out.model.entity(color).owner, Some(style));
        assert_eq!(out.model.entity(color).init_range, out.model.entity(style).init_range);
        assert_eq!(out.model.entity(size).init_range, Range::new(0, src.len()));
        assert_eq!(out.model.entity(size).value().map(|l| l.text.as_str()), Some("10"));
    }

    #[test]
    fn nested_assignment_creates_intermediate_owner() {
        let out = build("let C = NewGroup();\nC.G.Q = 2;");
        let c = lookup(&out, "C");
        let g = lookup(&out, "C.G");
        // The placeholder inherits C's spans and so survives pruning.
        assert_eq!(out.model.entity(g).init_range, out.model.entity(c).init_range);
        assert!(out.model.exists(&parse_dotted("C.G.Q")));
    }

    #[test]
    fn conditionals_and_functions_are_skipped() {
        let out = build("if (x) { let a = 1; }\nfunction f() { let b = 2; }\nlet c = 3;");
        assert_eq!(out.model.variables().len(), 1);
        assert!(out.diagnostics.is_empty());
    }

    #[test]
    fn unsupported_argument_keeps_its_slot() {
        let out = build("let f = NewForm();\nf.Move(a + 1, 2);");
        let call = out
            .model
            .find_function(&parse_dotted("f.Move"))
            .expect("call");
        assert_eq!(out.model.entity(call).args().len(), 2);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].severity, Severity::Missed);
    }

    #[test]
    fn pattern_declaration_is_fatal_but_keeps_partial_model() {
        let out = build("let f = NewForm();\nlet { a } = f;\nlet late = 1;");
        assert!(out.is_fatal());
        assert!(out.model.exists(&parse_dotted("f")));
        assert!(!out.model.exists(&parse_dotted("late")));
    }

    #[test]
    fn negative_numbers_are_literals() {
        let out = build("let f = NewForm();\nf.Left = -4;");
        let left = lookup(&out, "f.Left");
        assert_eq!(out.model.entity(left).value().map(|l| l.text.as_str()), Some("-4"));
    }
}
