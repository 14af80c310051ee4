//! Semantic checker for the C# subset
//!
//! Resolves names, types every expression, tracks definite assignment and
//! reachability per method, and reports C#-style diagnostics. Only the
//! subset the front end parses is covered; there is no overload resolution
//! beyond arity and implicit `int` to `double` widening.

use super::{Compiler, Diagnostic, Diagnostics, Severity};
use crate::syntax::{AssignOp, BinaryOp, LiteralKind, NodeId, NodeKind, SyntaxTree, TypeName, UnaryOp};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::trace;

/// The built-in [`Compiler`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Checker;

impl Checker {
    pub fn new() -> Self {
        Self
    }
}

impl Compiler for Checker {
    fn compile(&self, tree: &SyntaxTree) -> Diagnostics {
        let mut cx = Context {
            tree,
            diagnostics: Diagnostics::new(),
        };
        let classes: Vec<NodeId> = tree
            .preorder()
            .filter(|&id| matches!(tree.kind(id), NodeKind::Class { .. }))
            .collect();
        for class in classes {
            cx.check_class(class);
        }
        trace!(diagnostics = cx.diagnostics.len(), "checked tree");
        cx.diagnostics
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ty {
    Int,
    /// Integer literals outside the `int` range
    Long,
    Double,
    Bool,
    String,
    Void,
    /// Already reported; suppresses follow-up diagnostics
    Error,
}

impl Ty {
    fn is_numeric(self) -> bool {
        matches!(self, Ty::Int | Ty::Long | Ty::Double)
    }

    fn converts_to(self, target: Ty) -> bool {
        self == target
            || self == Ty::Error
            || target == Ty::Error
            || matches!((self, target), (Ty::Int, Ty::Long | Ty::Double) | (Ty::Long, Ty::Double))
    }
}

impl From<TypeName> for Ty {
    fn from(ty: TypeName) -> Self {
        match ty {
            TypeName::Int => Ty::Int,
            TypeName::Double => Ty::Double,
            TypeName::Bool => Ty::Bool,
            TypeName::String => Ty::String,
            TypeName::Void => Ty::Void,
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ty::Int => "int",
            Ty::Long => "long",
            Ty::Double => "double",
            Ty::Bool => "bool",
            Ty::String => "string",
            Ty::Void => "void",
            Ty::Error => "?",
        })
    }
}

fn binary_type(op: BinaryOp, l: Ty, r: Ty) -> Option<Ty> {
    if l == Ty::Error || r == Ty::Error {
        return Some(Ty::Error);
    }
    let widened = || {
        if l == Ty::Double || r == Ty::Double {
            Ty::Double
        } else if l == Ty::Long || r == Ty::Long {
            Ty::Long
        } else {
            Ty::Int
        }
    };
    match op {
        BinaryOp::Add if (l == Ty::String || r == Ty::String) && l != Ty::Void && r != Ty::Void => Some(Ty::String),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
            (l.is_numeric() && r.is_numeric()).then(widened)
        }
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            (l.is_numeric() && r.is_numeric()).then_some(Ty::Bool)
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            ((l.is_numeric() && r.is_numeric()) || (l == r && l != Ty::Void)).then_some(Ty::Bool)
        }
        BinaryOp::And | BinaryOp::Or => (l == Ty::Bool && r == Ty::Bool).then_some(Ty::Bool),
    }
}

struct Signature {
    params: Vec<Ty>,
    ret: Ty,
}

#[derive(Default)]
struct ClassScope {
    fields: HashMap<String, Ty>,
    methods: HashMap<String, Vec<Signature>>,
}

/// Definite-assignment state at a program point.
#[derive(Debug, Clone)]
struct Flow {
    reachable: bool,
    assigned: HashSet<String>,
}

impl Flow {
    fn entry() -> Self {
        Self {
            reachable: true,
            assigned: HashSet::new(),
        }
    }

    fn into_unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    /// Merge of two incoming paths. Unreachable paths assign everything.
    fn join(self, other: Flow) -> Flow {
        match (self.reachable, other.reachable) {
            (false, _) => other,
            (_, false) => self,
            _ => Flow {
                reachable: true,
                assigned: self.assigned.intersection(&other.assigned).cloned().collect(),
            },
        }
    }
}

struct Local {
    ty: Ty,
    read: bool,
    written: bool,
    declarator: NodeId,
}

struct Context<'t> {
    tree: &'t SyntaxTree,
    diagnostics: Diagnostics,
}

impl<'t> Context<'t> {
    fn report(&mut self, severity: Severity, code: &'static str, node: NodeId, message: String) {
        let (line, column) = self.tree.line_col(node);
        self.diagnostics.push(Diagnostic {
            severity,
            code,
            message,
            line,
            column,
            span: self.tree.span(node),
        });
    }

    fn error(&mut self, code: &'static str, node: NodeId, message: String) {
        self.report(Severity::Error, code, node, message);
    }

    fn warning(&mut self, code: &'static str, node: NodeId, message: String) {
        self.report(Severity::Warning, code, node, message);
    }

    fn check_class(&mut self, class: NodeId) {
        let tree = self.tree;
        let mut scope = ClassScope::default();
        let mut field_inits = Vec::new();
        let mut methods = Vec::new();

        for &member in tree.children(class) {
            match tree.kind(member) {
                NodeKind::Field { .. } => {
                    let Some(&decl) = tree.children(member).first() else { continue };
                    let NodeKind::VariableDeclaration { ty } = tree.kind(decl) else { continue };
                    for &declarator in tree.children(decl) {
                        let NodeKind::VariableDeclarator { name } = tree.kind(declarator) else { continue };
                        if scope.fields.insert(name.clone(), Ty::from(*ty)).is_some() {
                            let class_name = match tree.kind(class) {
                                NodeKind::Class { name, .. } => name.as_str(),
                                _ => "",
                            };
                            self.error(
                                "CS0102",
                                declarator,
                                format!("The type '{class_name}' already contains a definition for '{name}'"),
                            );
                        }
                        if let Some(&init) = tree.children(declarator).first() {
                            field_inits.push((init, Ty::from(*ty)));
                        }
                    }
                }
                NodeKind::Method { name, return_type, .. } => {
                    let params: Vec<Ty> = tree
                        .children(member)
                        .iter()
                        .filter_map(|&c| match tree.kind(c) {
                            NodeKind::Parameter { ty, .. } => Some(Ty::from(*ty)),
                            _ => None,
                        })
                        .collect();
                    let overloads = scope.methods.entry(name.clone()).or_default();
                    if overloads.iter().any(|sig| sig.params == params) {
                        self.error(
                            "CS0111",
                            member,
                            format!("Type already defines a member called '{name}' with the same parameter types"),
                        );
                    } else {
                        overloads.push(Signature {
                            params,
                            ret: Ty::from(*return_type),
                        });
                    }
                    methods.push(member);
                }
                _ => {}
            }
        }

        for (init, ty) in field_inits {
            let mut checker = MethodChecker::new(self, &scope, Ty::Void, "");
            let mut flow = Flow::entry();
            let value = checker.expr(init, &mut flow);
            checker.expect_convertible(value, ty, init);
        }
        for method in methods {
            self.check_method(method, &scope);
        }
    }

    fn check_method(&mut self, method: NodeId, scope: &ClassScope) {
        let tree = self.tree;
        let NodeKind::Method { name, return_type, .. } = tree.kind(method) else {
            return;
        };
        let mut checker = MethodChecker::new(self, scope, Ty::from(*return_type), name);

        let children = tree.children(method);
        let Some((&body, params)) = children.split_last() else {
            return;
        };
        for &param in params {
            if let NodeKind::Parameter { name, ty } = tree.kind(param) {
                if checker.params.insert(name.clone(), Ty::from(*ty)).is_some() {
                    checker
                        .cx
                        .error("CS0100", param, format!("The parameter name '{name}' is a duplicate"));
                }
            }
        }

        let end = checker.block(body, Flow::entry());
        if end.reachable && *return_type != TypeName::Void {
            checker
                .cx
                .error("CS0161", method, format!("'{name}': not all code paths return a value"));
        }
    }
}

struct MethodChecker<'a, 't> {
    cx: &'a mut Context<'t>,
    class: &'a ClassScope,
    method: &'a str,
    params: HashMap<String, Ty>,
    scopes: Vec<Vec<(String, Local)>>,
    /// Names declared anywhere directly in each open scope
    reserved: Vec<HashSet<String>>,
    return_type: Ty,
}

impl<'a, 't> MethodChecker<'a, 't> {
    fn new(cx: &'a mut Context<'t>, class: &'a ClassScope, return_type: Ty, method: &'a str) -> Self {
        Self {
            cx,
            class,
            method,
            params: HashMap::new(),
            scopes: Vec::new(),
            reserved: Vec::new(),
            return_type,
        }
    }

    fn tree(&self) -> &'t SyntaxTree {
        self.cx.tree
    }

    // ---- scopes --------------------------------------------------------

    fn push_scope(&mut self, reserved: HashSet<String>) {
        self.scopes.push(Vec::new());
        self.reserved.push(reserved);
    }

    fn pop_scope(&mut self) {
        self.reserved.pop();
        let Some(scope) = self.scopes.pop() else { return };
        for (name, local) in scope {
            if local.read {
                continue;
            }
            if local.written {
                self.cx.warning(
                    "CS0219",
                    local.declarator,
                    format!("The variable '{name}' is assigned but its value is never used"),
                );
            } else {
                self.cx.warning(
                    "CS0168",
                    local.declarator,
                    format!("The variable '{name}' is declared but never used"),
                );
            }
        }
    }

    fn declare(&mut self, name: &str, ty: Ty, declarator: NodeId, initialized: bool) {
        let in_current = self
            .scopes
            .last()
            .is_some_and(|scope| scope.iter().any(|(n, _)| n == name));
        if in_current {
            self.cx.error(
                "CS0128",
                declarator,
                format!("A local variable named '{name}' is already defined in this scope"),
            );
            return;
        }
        // a local's scope is its whole block, including the part before it
        let enclosing = self.reserved.len().saturating_sub(1);
        let shadows = self.params.contains_key(name)
            || self.scopes.iter().flatten().any(|(n, _)| n == name)
            || self.reserved[..enclosing].iter().any(|names| names.contains(name));
        if shadows {
            self.cx.error(
                "CS0136",
                declarator,
                format!(
                    "A local or parameter named '{name}' cannot be declared in this scope because that name is used in an enclosing local scope"
                ),
            );
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.push((
                name.to_string(),
                Local {
                    ty,
                    read: false,
                    written: initialized,
                    declarator,
                },
            ));
        }
    }

    fn local_mut(&mut self, name: &str) -> Option<&mut Local> {
        self.scopes
            .iter_mut()
            .rev()
            .flat_map(|scope| scope.iter_mut().rev())
            .find(|(n, _)| n == name)
            .map(|(_, local)| local)
    }

    /// Type of a name being read; reports unknown and unassigned names.
    fn read(&mut self, name: &str, node: NodeId, flow: &Flow) -> Ty {
        if let Some(local) = self.local_mut(name) {
            local.read = true;
            let ty = local.ty;
            if flow.reachable && !flow.assigned.contains(name) {
                self.cx
                    .error("CS0165", node, format!("Use of unassigned local variable '{name}'"));
            }
            return ty;
        }
        self.non_local(name, node)
    }

    /// Type of a name being assigned.
    fn write(&mut self, name: &str, node: NodeId, flow: &mut Flow) -> Ty {
        if let Some(local) = self.local_mut(name) {
            local.written = true;
            let ty = local.ty;
            flow.assigned.insert(name.to_string());
            return ty;
        }
        self.non_local(name, node)
    }

    fn non_local(&mut self, name: &str, node: NodeId) -> Ty {
        if let Some(&ty) = self.params.get(name) {
            return ty;
        }
        if let Some(&ty) = self.class.fields.get(name) {
            return ty;
        }
        self.cx
            .error("CS0103", node, format!("The name '{name}' does not exist in the current context"));
        Ty::Error
    }

    fn expect_convertible(&mut self, from: Ty, to: Ty, node: NodeId) {
        if from == Ty::Long && to == Ty::Int {
            self.cx.error(
                "CS0266",
                node,
                "Cannot implicitly convert type 'long' to 'int'. An explicit conversion exists (are you missing a cast?)"
                    .to_string(),
            );
        } else if !from.converts_to(to) {
            self.cx
                .error("CS0029", node, format!("Cannot implicitly convert type '{from}' to '{to}'"));
        }
    }

    // ---- statements ----------------------------------------------------

    fn block(&mut self, block: NodeId, mut flow: Flow) -> Flow {
        let tree = self.tree();
        self.push_scope(declared_names(tree, block));
        let mut warned = false;
        for &stmt in tree.children(block) {
            if !flow.reachable && !warned && tree.kind(stmt) != &NodeKind::EmptyStatement {
                self.cx
                    .warning("CS0162", stmt, "Unreachable code detected".to_string());
                warned = true;
            }
            flow = self.statement(stmt, flow);
        }
        self.pop_scope();
        flow
    }

    fn warn_empty_body(&mut self, body: NodeId) {
        if self.tree().kind(body) == &NodeKind::EmptyStatement {
            self.cx
                .warning("CS0642", body, "Possible mistaken empty statement".to_string());
        }
    }

    fn statement(&mut self, stmt: NodeId, mut flow: Flow) -> Flow {
        let tree = self.tree();
        let children = tree.children(stmt);
        match tree.kind(stmt) {
            NodeKind::Block => self.block(stmt, flow),
            NodeKind::EmptyStatement => flow,
            NodeKind::LocalDeclaration => match children.first() {
                Some(&decl) => self.declaration(decl, flow),
                None => flow,
            },
            NodeKind::ExpressionStatement => {
                if let Some(&expr) = children.first() {
                    let valid = match tree.kind(expr) {
                        NodeKind::Assignment { .. } | NodeKind::Invocation { .. } => true,
                        NodeKind::PrefixUnary { op } | NodeKind::PostfixUnary { op } => op.is_step(),
                        _ => false,
                    };
                    if !valid {
                        self.cx.error(
                            "CS0201",
                            expr,
                            "Only assignment, call, increment, decrement, and new object expressions can be used as a statement"
                                .to_string(),
                        );
                    }
                    self.expr(expr, &mut flow);
                }
                flow
            }
            NodeKind::If => {
                let (Some(&cond), Some(&then)) = (children.first(), children.get(1)) else {
                    return flow;
                };
                self.condition(cond, &mut flow);
                self.warn_empty_body(then);
                let then_flow = self.statement(then, flow.clone());
                let else_flow = match children.get(2).and_then(|&e| tree.children(e).first()) {
                    Some(&otherwise) => self.statement(otherwise, flow),
                    None => flow,
                };
                then_flow.join(else_flow)
            }
            NodeKind::While => {
                let (Some(&cond), Some(&body)) = (children.first(), children.get(1)) else {
                    return flow;
                };
                self.condition(cond, &mut flow);
                self.warn_empty_body(body);
                self.statement(body, flow.clone());
                if is_true_literal(tree, cond) {
                    flow.into_unreachable()
                } else {
                    flow
                }
            }
            NodeKind::For => {
                let [init, cond, step, body] = children else {
                    return flow;
                };
                self.push_scope(HashSet::new());
                if matches!(tree.kind(*init), NodeKind::VariableDeclaration { .. }) {
                    flow = self.declaration(*init, flow);
                } else {
                    self.expr(*init, &mut flow);
                }
                self.condition(*cond, &mut flow);
                self.warn_empty_body(*body);
                let mut body_flow = self.statement(*body, flow.clone());
                if !body_flow.reachable {
                    body_flow = flow.clone();
                }
                self.expr(*step, &mut body_flow);
                self.pop_scope();
                if is_true_literal(tree, *cond) {
                    flow.into_unreachable()
                } else {
                    flow
                }
            }
            NodeKind::Return => {
                match (children.first(), self.return_type) {
                    (Some(&value), Ty::Void) => {
                        self.expr(value, &mut flow);
                        let method = self.method.to_string();
                        self.cx.error(
                            "CS0127",
                            stmt,
                            format!("Since '{method}' returns void, a return keyword must not be followed by an object expression"),
                        );
                    }
                    (Some(&value), expected) => {
                        let ty = self.expr(value, &mut flow);
                        self.expect_convertible(ty, expected, value);
                    }
                    (None, Ty::Void) => {}
                    (None, expected) => {
                        self.cx.error(
                            "CS0126",
                            stmt,
                            format!("An object of a type convertible to '{expected}' is required"),
                        );
                    }
                }
                flow.into_unreachable()
            }
            _ => flow,
        }
    }

    fn declaration(&mut self, decl: NodeId, mut flow: Flow) -> Flow {
        let tree = self.tree();
        let NodeKind::VariableDeclaration { ty } = tree.kind(decl) else {
            return flow;
        };
        let ty = Ty::from(*ty);
        for &declarator in tree.children(decl) {
            let NodeKind::VariableDeclarator { name } = tree.kind(declarator) else { continue };
            let init = tree.children(declarator).first().copied();
            if let Some(init) = init {
                let value = self.expr(init, &mut flow);
                self.expect_convertible(value, ty, init);
            }
            self.declare(name, ty, declarator, init.is_some());
            if init.is_some() {
                flow.assigned.insert(name.clone());
            } else {
                flow.assigned.remove(name);
            }
        }
        flow
    }

    fn condition(&mut self, cond: NodeId, flow: &mut Flow) {
        let ty = self.expr(cond, flow);
        self.expect_convertible(ty, Ty::Bool, cond);
    }

    // ---- expressions ---------------------------------------------------

    fn expr(&mut self, expr: NodeId, flow: &mut Flow) -> Ty {
        let tree = self.tree();
        let children = tree.children(expr);
        match tree.kind(expr) {
            NodeKind::Literal { value } => match value.kind {
                LiteralKind::Int => self.int_literal(&value.text, expr),
                LiteralKind::Double => Ty::Double,
                LiteralKind::Bool => Ty::Bool,
                LiteralKind::String => Ty::String,
            },
            NodeKind::Identifier { name } => self.read(name, expr, flow),
            NodeKind::Parenthesized => match children.first() {
                Some(&inner) => self.expr(inner, flow),
                None => Ty::Error,
            },
            NodeKind::Binary { op } => {
                let [left, right] = children else { return Ty::Error };
                let l = self.expr(*left, flow);
                let r = if op.is_logical() {
                    // assignments on the right are conditional
                    let mut short_circuit = flow.clone();
                    self.expr(*right, &mut short_circuit)
                } else {
                    self.expr(*right, flow)
                };
                self.binary(*op, l, r, expr, *right)
            }
            NodeKind::PrefixUnary { op } | NodeKind::PostfixUnary { op } => {
                let Some(&operand) = children.first() else { return Ty::Error };
                // `-2147483648` is the one literal only valid under a minus
                if *op == UnaryOp::Negate && is_int_min_magnitude(tree, operand) {
                    return Ty::Int;
                }
                self.unary(*op, operand, flow)
            }
            NodeKind::Assignment { op } => {
                let [target, value] = children else { return Ty::Error };
                self.assignment(*op, *target, *value, flow)
            }
            NodeKind::Invocation { callee } => {
                let args: Vec<(NodeId, Ty)> = children.iter().map(|&a| (a, self.expr(a, flow))).collect();
                self.invocation(callee, expr, &args)
            }
            _ => Ty::Error,
        }
    }

    fn int_literal(&mut self, text: &str, node: NodeId) -> Ty {
        match text.parse::<u64>() {
            Ok(v) if v <= i32::MAX as u64 => Ty::Int,
            Ok(_) => Ty::Long,
            Err(_) => {
                self.cx
                    .error("CS1021", node, "Integral constant is too large".to_string());
                Ty::Error
            }
        }
    }

    fn binary(&mut self, op: BinaryOp, l: Ty, r: Ty, node: NodeId, right: NodeId) -> Ty {
        let Some(ty) = binary_type(op, l, r) else {
            self.cx.error(
                "CS0019",
                node,
                format!("Operator '{}' cannot be applied to operands of type '{l}' and '{r}'", op.symbol()),
            );
            return Ty::Error;
        };
        if matches!(op, BinaryOp::Div | BinaryOp::Rem) && ty == Ty::Int && is_zero_literal(self.tree(), right) {
            self.cx.error("CS0020", node, "Division by constant zero".to_string());
        }
        ty
    }

    fn unary(&mut self, op: UnaryOp, operand: NodeId, flow: &mut Flow) -> Ty {
        let tree = self.tree();
        if op.is_step() {
            let target = unparenthesize(tree, operand);
            let NodeKind::Identifier { name } = tree.kind(target) else {
                self.expr(operand, flow);
                self.cx.error(
                    "CS1059",
                    operand,
                    "The operand of an increment or decrement operator must be a variable, property or indexer"
                        .to_string(),
                );
                return Ty::Error;
            };
            let ty = self.read(name, target, flow);
            self.write(name, target, flow);
            if !ty.is_numeric() && ty != Ty::Error {
                self.cx.error(
                    "CS0023",
                    operand,
                    format!("Operator '{}' cannot be applied to operand of type '{ty}'", op.symbol()),
                );
                return Ty::Error;
            }
            return ty;
        }

        let ty = self.expr(operand, flow);
        let ok = match op {
            UnaryOp::Not => ty == Ty::Bool,
            _ => ty.is_numeric(),
        };
        if ok || ty == Ty::Error {
            ty
        } else {
            self.cx.error(
                "CS0023",
                operand,
                format!("Operator '{}' cannot be applied to operand of type '{ty}'", op.symbol()),
            );
            Ty::Error
        }
    }

    fn assignment(&mut self, op: AssignOp, target: NodeId, value: NodeId, flow: &mut Flow) -> Ty {
        let tree = self.tree();
        let target_node = unparenthesize(tree, target);
        let NodeKind::Identifier { name } = tree.kind(target_node) else {
            self.expr(target, flow);
            self.expr(value, flow);
            self.cx.error(
                "CS0131",
                target,
                "The left-hand side of an assignment must be a variable, property or indexer".to_string(),
            );
            return Ty::Error;
        };

        let current = match op.binary_op() {
            Some(_) => self.read(name, target_node, flow),
            None => Ty::Error,
        };
        let value_ty = self.expr(value, flow);
        let target_ty = self.write(name, target_node, flow);

        match op.binary_op() {
            None => self.expect_convertible(value_ty, target_ty, value),
            Some(bin) => {
                let result = self.binary(bin, current, value_ty, target, value);
                let string_append = bin == BinaryOp::Add && target_ty == Ty::String;
                if !string_append {
                    self.expect_convertible(result, target_ty, value);
                }
            }
        }
        target_ty
    }

    fn invocation(&mut self, callee: &str, node: NodeId, args: &[(NodeId, Ty)]) -> Ty {
        if let Some((receiver, member)) = callee.rsplit_once('.') {
            if receiver != "Console" {
                let first = callee.split('.').next().unwrap_or(callee);
                self.cx.error(
                    "CS0103",
                    node,
                    format!("The name '{first}' does not exist in the current context"),
                );
                return Ty::Error;
            }
            let arity = match member {
                "WriteLine" => 0..=1,
                "Write" => 1..=1,
                _ => {
                    self.cx.error(
                        "CS0117",
                        node,
                        format!("'Console' does not contain a definition for '{member}'"),
                    );
                    return Ty::Error;
                }
            };
            if !arity.contains(&args.len()) {
                self.cx.error(
                    "CS1501",
                    node,
                    format!("No overload for method '{member}' takes {} arguments", args.len()),
                );
                return Ty::Void;
            }
            for (i, &(arg, ty)) in args.iter().enumerate() {
                if ty == Ty::Void {
                    self.cx.error(
                        "CS1503",
                        arg,
                        format!("Argument {}: cannot convert from 'void' to 'object'", i + 1),
                    );
                }
            }
            return Ty::Void;
        }

        let class = self.class;
        let Some(overloads) = class.methods.get(callee) else {
            self.cx
                .error("CS0103", node, format!("The name '{callee}' does not exist in the current context"));
            return Ty::Error;
        };
        let candidates: Vec<&Signature> = overloads.iter().filter(|s| s.params.len() == args.len()).collect();
        let Some(first) = candidates.first() else {
            self.cx.error(
                "CS1501",
                node,
                format!("No overload for method '{callee}' takes {} arguments", args.len()),
            );
            return Ty::Error;
        };
        let applicable = candidates
            .iter()
            .find(|sig| sig.params.iter().zip(args).all(|(&p, &(_, a))| a.converts_to(p)));
        match applicable {
            Some(sig) => sig.ret,
            None => {
                let ret = first.ret;
                let mismatches: Vec<(usize, NodeId, Ty, Ty)> = first
                    .params
                    .iter()
                    .zip(args)
                    .enumerate()
                    .filter(|(_, (&p, &(_, a)))| !a.converts_to(p))
                    .map(|(i, (&p, &(node, a)))| (i, node, a, p))
                    .collect();
                for (i, arg, from, to) in mismatches {
                    self.cx.error(
                        "CS1503",
                        arg,
                        format!("Argument {}: cannot convert from '{from}' to '{to}'", i + 1),
                    );
                }
                ret
            }
        }
    }
}

/// Locals declared by the statements directly inside `block`.
fn declared_names(tree: &SyntaxTree, block: NodeId) -> HashSet<String> {
    tree.children(block)
        .iter()
        .filter(|&&stmt| tree.kind(stmt) == &NodeKind::LocalDeclaration)
        .filter_map(|&stmt| tree.children(stmt).first().copied())
        .flat_map(move |decl| tree.children(decl).iter())
        .filter_map(|&declarator| match tree.kind(declarator) {
            NodeKind::VariableDeclarator { name } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn unparenthesize(tree: &SyntaxTree, mut id: NodeId) -> NodeId {
    while tree.kind(id) == &NodeKind::Parenthesized {
        match tree.children(id).first() {
            Some(&inner) => id = inner,
            None => break,
        }
    }
    id
}

fn is_true_literal(tree: &SyntaxTree, id: NodeId) -> bool {
    matches!(tree.kind(unparenthesize(tree, id)), NodeKind::Literal { value } if value.kind == LiteralKind::Bool && value.text == "true")
}

fn is_int_min_magnitude(tree: &SyntaxTree, id: NodeId) -> bool {
    matches!(tree.kind(id), NodeKind::Literal { value } if value.kind == LiteralKind::Int && value.text.parse::<u64>() == Ok(1 << 31))
}

fn is_zero_literal(tree: &SyntaxTree, id: NodeId) -> bool {
    matches!(tree.kind(unparenthesize(tree, id)), NodeKind::Literal { value } if value.as_int() == Some(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    fn check(body: &str) -> Diagnostics {
        let source = format!(
            "class Program {{ static int Twice(int n) {{ return n * 2; }} static void Main() {{ {body} }} }}"
        );
        Checker.compile(&parse(&source).unwrap())
    }

    fn error_codes(body: &str) -> Vec<&'static str> {
        check(body).errors().map(|d| d.code).collect()
    }

    #[test]
    fn test_accepts_well_formed_method() {
        let diagnostics = check(
            "int x = 0; int y = 1; if (x == 0) { y++; } else { --y; } x = y - 3; Console.WriteLine(x + Twice(y));",
        );
        assert!(diagnostics.is_accepted(), "{diagnostics}");
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(error_codes("int x = 0; x = z;"), vec!["CS0103"]);
    }

    #[test]
    fn test_duplicate_locals() {
        assert_eq!(error_codes("int x = 0; int x = 1; Console.WriteLine(x);"), vec!["CS0128"]);
        assert_eq!(
            error_codes("int x = 0; { int x = 1; Console.WriteLine(x); } Console.WriteLine(x);"),
            vec!["CS0136"]
        );
        assert!(error_codes("{ int a = 1; Console.WriteLine(a); } { int a = 2; Console.WriteLine(a); }").is_empty());
    }

    #[test]
    fn test_local_scope_covers_whole_block() {
        assert_eq!(
            error_codes("int n = 3; for (int i = 0; i < n; i++) { } int i = 1; Console.WriteLine(i);"),
            vec!["CS0136"]
        );
        assert_eq!(
            error_codes("{ int a = 1; Console.WriteLine(a); } int a = 2; Console.WriteLine(a);"),
            vec!["CS0136"]
        );
        assert!(error_codes("for (int i = 0; i < 3; i++) { } for (int i = 0; i < 3; i++) { }").is_empty());
    }

    #[test]
    fn test_integer_literal_range() {
        assert!(error_codes("int x = 2147483647; Console.WriteLine(x);").is_empty());
        assert!(error_codes("int x = -2147483648; Console.WriteLine(x);").is_empty());
        assert_eq!(error_codes("int x = 2147483648;"), vec!["CS0266"]);
        assert_eq!(error_codes("int x = -2147483649;"), vec!["CS0266"]);
        assert_eq!(error_codes("int x = 0; x += 3000000000;"), vec!["CS0266"]);
        assert!(error_codes("double d = 3000000000; Console.WriteLine(d);").is_empty());
        assert_eq!(error_codes("int x = 99999999999999999999;"), vec!["CS1021"]);
    }

    #[test]
    fn test_type_errors() {
        assert_eq!(error_codes("bool b = true; int x = b + 1;"), vec!["CS0019"]);
        assert_eq!(error_codes("int x = 1.5;"), vec!["CS0029"]);
        assert_eq!(error_codes("double d = 1; Console.WriteLine(d);"), Vec::<&str>::new());
        assert_eq!(error_codes("bool b = true; b++;"), vec!["CS0023"]);
        assert_eq!(error_codes("int x = 0; if (x) { }"), vec!["CS0029"]);
        assert_eq!(error_codes("string s = \"a\"; s += 1; Console.WriteLine(s);"), Vec::<&str>::new());
    }

    #[test]
    fn test_division_by_constant_zero() {
        assert_eq!(error_codes("int x = 4 / 0;"), vec!["CS0020"]);
        assert_eq!(error_codes("int x = 4; x %= 0;"), vec!["CS0020"]);
        assert!(error_codes("double d = 4.0 / 0;").is_empty());
    }

    #[test]
    fn test_definite_assignment() {
        assert_eq!(error_codes("int x; Console.WriteLine(x);"), vec!["CS0165"]);
        assert!(error_codes("int x; if (true) { x = 1; } else { x = 2; } Console.WriteLine(x);").is_empty());
        assert_eq!(
            error_codes("int x; int y = 0; if (y == 0) { x = 1; } Console.WriteLine(x);"),
            vec!["CS0165"]
        );
        assert_eq!(error_codes("int x; x += 1;"), vec!["CS0165"]);
    }

    #[test]
    fn test_expression_statement_forms() {
        assert_eq!(error_codes("int x = 0; x + 1;"), vec!["CS0201"]);
        assert_eq!(error_codes("int x = 0; -x;"), vec!["CS0201"]);
        assert_eq!(error_codes("1++;"), vec!["CS1059"]);
        assert_eq!(error_codes("int x = 0; (x + 1) = 2;"), vec!["CS0131"]);
    }

    #[test]
    fn test_invocations() {
        assert_eq!(error_codes("Twice();"), vec!["CS1501"]);
        assert_eq!(error_codes("Twice(true);"), vec!["CS1503"]);
        assert_eq!(error_codes("Console.ReadKey();"), vec!["CS0117"]);
        assert_eq!(error_codes("Console.Write();"), vec!["CS1501"]);
        assert_eq!(error_codes("Math.Abs(1);"), vec!["CS0103"]);
        assert_eq!(error_codes("Console.WriteLine(Main());"), vec!["CS1503"]);
    }

    #[test]
    fn test_return_paths() {
        let tree = parse("class C { int M(int a) { if (a > 0) { return 1; } } }").unwrap();
        let codes: Vec<_> = Checker.compile(&tree).errors().map(|d| d.code).collect();
        assert_eq!(codes, vec!["CS0161"]);

        let tree = parse("class C { int M() { while (true) { } } }").unwrap();
        assert!(Checker.compile(&tree).is_accepted());

        let tree = parse("class C { int M() { return; } void N() { return 1; } }").unwrap();
        let codes: Vec<_> = Checker.compile(&tree).errors().map(|d| d.code).collect();
        assert_eq!(codes, vec!["CS0126", "CS0127"]);
    }

    #[test]
    fn test_duplicate_members() {
        let tree = parse("class C { int f; int f; void M(int a, int a) { } void M(int a, int a) { } }").unwrap();
        let codes: Vec<_> = Checker.compile(&tree).errors().map(|d| d.code).collect();
        assert_eq!(codes, vec!["CS0102", "CS0111", "CS0100", "CS0100"]);
    }

    #[test]
    fn test_warnings_only() {
        let diagnostics = check("int unused; int spare = 1; return; Console.WriteLine(1);");
        assert!(diagnostics.is_accepted());
        let codes: Vec<_> = diagnostics.warnings().map(|d| d.code).collect();
        assert!(codes.contains(&"CS0162"));
        assert!(codes.contains(&"CS0168"));
        assert!(codes.contains(&"CS0219"));

        let diagnostics = check("int x = 0; if (x == 0) ; Console.WriteLine(x);");
        assert!(diagnostics.is_accepted());
        assert!(diagnostics.has_code("CS0642"));
    }

    #[test]
    fn test_fields_and_parameters_resolve() {
        let tree = parse(
            "class C { static int total = 1 + 2; int Add(int a) { total += a; return total; } }",
        )
        .unwrap();
        let diagnostics = Checker.compile(&tree);
        assert!(diagnostics.is_accepted(), "{diagnostics}");
    }
}
