//! Code-model adapter surface.
//!
//! Parsing and symbol binding are not this crate's job: an external code
//! model service supplies a [`Snapshot`] (or any other [`CodeModel`]
//! implementation) containing a node arena, resolved symbol facts and the
//! set of functions to analyze. Everything downstream — violation policies,
//! freshness tracing, report extraction — only talks to the [`CodeModel`]
//! trait and the derived syntax queries in this module.

mod snapshot;

pub use snapshot::{FunctionBuilder, Snapshot, SnapshotBuilder};

use crate::core::{FunctionIdentity, FunctionKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Index of a node in the snapshot's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Index of a function in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionId(pub u32);

/// The syntax shapes purity analysis needs to see. Anything the policies do
/// not care about can be supplied as [`NodeKind::Literal`].
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A `throw` statement in the function's own scope.
    Throw,
    Return {
        value: Option<NodeId>,
    },
    /// A local variable declarator, with its optional initializer.
    LocalDecl {
        name: String,
        init: Option<NodeId>,
    },
    Assign {
        target: NodeId,
        value: NodeId,
    },
    Identifier {
        name: String,
    },
    /// One link of an access chain: `base.member`.
    Member {
        base: NodeId,
        member: NodeId,
    },
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    /// Constructor invocation; inherently fresh.
    New {
        args: Vec<NodeId>,
    },
    /// Built-in operator application; inherently fresh.
    Operator {
        args: Vec<NodeId>,
    },
    /// A lambda or local function reference. Its body belongs to its own
    /// [`FunctionNode`], so in-scope traversal never descends into it.
    Lambda {
        function: FunctionId,
    },
    This,
    Literal,
}

impl NodeKind {
    /// Child nodes within the same function scope.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::Return { value: Some(v) } => vec![*v],
            NodeKind::LocalDecl { init: Some(i), .. } => vec![*i],
            NodeKind::Assign { target, value } => vec![*target, *value],
            NodeKind::Member { base, member } => vec![*base, *member],
            NodeKind::Call { callee, args } => {
                let mut out = vec![*callee];
                out.extend(args.iter().copied());
                out
            }
            NodeKind::New { args } | NodeKind::Operator { args } => args.clone(),
            _ => Vec::new(),
        }
    }
}

/// A named type with the one fact purity analysis needs: whether values of
/// it alias (reference type) or copy (value type).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub name: String,
    pub is_reference: bool,
}

impl TypeRef {
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_reference: true,
        }
    }

    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_reference: false,
        }
    }

    pub fn void() -> Self {
        Self::value("void")
    }

    pub fn is_void(&self) -> bool {
        self.name == "void"
    }
}

/// Resolved symbol classification, as supplied by the code model service.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Field {
        is_const: bool,
    },
    Property,
    EnumConstant,
    Local,
    Parameter {
        is_this: bool,
        /// The parameter belongs to an enclosing function, not the one
        /// under analysis; a lambda or local function captured it.
        of_enclosing: bool,
    },
    Method {
        identity: FunctionIdentity,
        is_abstract: bool,
        is_constructor: bool,
        is_builtin_operator: bool,
    },
}

/// A resolved symbol: kind, staticness and declared type.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub is_static: bool,
    pub declared_type: TypeRef,
}

impl Symbol {
    pub fn instance_field(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Field { is_const: false },
            is_static: false,
            declared_type,
        }
    }

    pub fn static_field(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Field { is_const: false },
            is_static: true,
            declared_type,
        }
    }

    pub fn const_field(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Field { is_const: true },
            is_static: true,
            declared_type,
        }
    }

    pub fn enum_constant(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::EnumConstant,
            is_static: true,
            declared_type,
        }
    }

    pub fn property(name: impl Into<String>, declared_type: TypeRef, is_static: bool) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Property,
            is_static,
            declared_type,
        }
    }

    pub fn local(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Local,
            is_static: false,
            declared_type,
        }
    }

    pub fn parameter(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Parameter {
                is_this: false,
                of_enclosing: false,
            },
            is_static: false,
            declared_type,
        }
    }

    /// A parameter of an enclosing function, seen from inside a lambda or
    /// local function that captures it.
    pub fn captured_parameter(name: impl Into<String>, declared_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Parameter {
                is_this: false,
                of_enclosing: true,
            },
            is_static: false,
            declared_type,
        }
    }

    pub fn this_parameter(declared_type: TypeRef) -> Self {
        Self {
            name: "this".to_string(),
            kind: SymbolKind::Parameter {
                is_this: true,
                of_enclosing: false,
            },
            is_static: false,
            declared_type,
        }
    }

    pub fn method(identity: FunctionIdentity, declared_type: TypeRef, is_abstract: bool) -> Self {
        Self {
            name: identity.name.clone(),
            kind: SymbolKind::Method {
                identity,
                is_abstract,
                is_constructor: false,
                is_builtin_operator: false,
            },
            is_static: false,
            declared_type,
        }
    }
}

/// One analyzable function as supplied by the code model.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionNode {
    pub identity: FunctionIdentity,
    pub file: PathBuf,
    pub line_start: u32,
    pub line_end: u32,
    pub source_lines: u32,
    pub return_type: TypeRef,
    /// Top-level statements; `None` when the body could not be obtained.
    pub body: Option<Vec<NodeId>>,
}

impl FunctionNode {
    pub fn kind(&self) -> FunctionKind {
        self.identity.kind
    }
}

/// The facts the external code model service must answer. Mirrors the
/// consumed interface of the analysis: node access, parentage and symbol
/// resolution; everything else is derived in [`queries`].
pub trait CodeModel {
    fn functions(&self) -> &[FunctionNode];

    fn node(&self, id: NodeId) -> &NodeKind;

    fn parent(&self, id: NodeId) -> Option<NodeId>;

    /// The symbol a node resolves to, if binding succeeded.
    fn resolve_symbol(&self, id: NodeId) -> Option<&Symbol>;

    /// Approximate source text, used for placeholder names and logging.
    fn node_text(&self, id: NodeId) -> String {
        match self.node(id) {
            NodeKind::Identifier { name } => name.clone(),
            NodeKind::Member { base, member } => {
                format!("{}.{}", self.node_text(*base), self.node_text(*member))
            }
            NodeKind::Call { callee, .. } => format!("{}()", self.node_text(*callee)),
            NodeKind::New { .. } => "new()".to_string(),
            NodeKind::This => "this".to_string(),
            _ => "<expr>".to_string(),
        }
    }

    /// Symbol of an expression, looking through one access-chain link the
    /// way a binder resolves `this.field` to the field symbol.
    fn resolve_expr_symbol(&self, id: NodeId) -> Option<&Symbol> {
        match self.node(id) {
            NodeKind::Member { member, .. } => self.resolve_symbol(*member),
            _ => self.resolve_symbol(id),
        }
    }
}

pub mod queries {
    //! Syntax queries derived from the code model, shared by all policies.

    use super::{CodeModel, FunctionNode, NodeId, NodeKind};

    /// Every node in the function's own scope, excluding the bodies of
    /// nested lambdas and local functions (those live in their own
    /// [`FunctionNode`]s). Depth-first, statement order.
    pub fn descendants_in_scope<M: CodeModel + ?Sized>(
        model: &M,
        function: &FunctionNode,
    ) -> Vec<NodeId> {
        let mut out = Vec::new();
        let Some(body) = &function.body else {
            return out;
        };
        let mut stack: Vec<NodeId> = body.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            let children = model.node(id).children();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Whether the node sits on the target side of the nearest enclosing
    /// assignment. Reaching the value side, or running out of parents,
    /// means it is only read.
    pub fn is_assignment_target<M: CodeModel + ?Sized>(model: &M, id: NodeId) -> bool {
        let mut current = id;
        while let Some(parent) = model.parent(current) {
            if let NodeKind::Assign { target, value } = model.node(parent) {
                if *target == current {
                    return true;
                }
                if *value == current {
                    return false;
                }
            }
            current = parent;
        }
        false
    }

    /// Whether a *member* of the node's value is assigned (`x.field = v`).
    /// Reassigning the variable itself (`x = v`) does not qualify.
    pub fn is_member_assignment_target<M: CodeModel + ?Sized>(model: &M, id: NodeId) -> bool {
        match model.parent(id) {
            Some(parent) => match model.node(parent) {
                NodeKind::Member { base, .. } if *base == id => is_assignment_target(model, id),
                _ => false,
            },
            None => false,
        }
    }

    /// Whether an identifier is the outermost subject of its access chain.
    /// In `a.b.c` only `a` is outermost; `this.field` counts `field` as
    /// outermost because the receiver is explicit.
    pub fn is_outermost<M: CodeModel + ?Sized>(model: &M, id: NodeId) -> bool {
        match model.parent(id) {
            Some(parent) => match model.node(parent) {
                NodeKind::Member { base, member } if *member == id => {
                    matches!(model.node(*base), NodeKind::This)
                }
                _ => true,
            },
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::queries::*;
    use super::*;
    use crate::core::FunctionKind;

    fn snapshot_with(build: impl FnOnce(&mut FunctionBuilder<'_>)) -> (Snapshot, Vec<NodeId>) {
        let mut snap = SnapshotBuilder::new();
        let mut f = snap.function("T.M", "Tests", TypeRef::void(), FunctionKind::Ordinary);
        build(&mut f);
        f.finish();
        let snap = snap.build();
        let nodes = descendants_in_scope(&snap, &snap.functions()[0]);
        (snap, nodes)
    }

    #[test]
    fn assignment_target_side_is_detected() {
        let (snap, _) = snapshot_with(|f| {
            let target = f.ident_with("s", Symbol::static_field("s", TypeRef::value("int")));
            let value = f.ident_with("x", Symbol::local("x", TypeRef::value("int")));
            let assign = f.assign(target, value);
            f.stmt(assign);
        });
        let func = &snap.functions()[0];
        let nodes = descendants_in_scope(&snap, func);
        // nodes: [assign, target, value]
        assert!(is_assignment_target(&snap, nodes[1]));
        assert!(!is_assignment_target(&snap, nodes[2]));
    }

    #[test]
    fn member_assignment_marks_only_the_base() {
        // p.field = 1
        let (snap, nodes) = snapshot_with(|f| {
            let p = f.ident_with("p", Symbol::parameter("p", TypeRef::reference("Poco")));
            let field = f.ident("field");
            let access = f.member(p, field);
            let one = f.literal();
            let assign = f.assign(access, one);
            f.stmt(assign);
        });
        // nodes: [assign, member, p, field, literal]
        let p = nodes[2];
        assert!(is_member_assignment_target(&snap, p));
        assert!(is_assignment_target(&snap, p));
    }

    #[test]
    fn plain_reassignment_is_not_member_assignment() {
        // p = new Poco()
        let (snap, nodes) = snapshot_with(|f| {
            let p = f.ident_with("p", Symbol::parameter("p", TypeRef::reference("Poco")));
            let fresh = f.new_object(vec![]);
            let assign = f.assign(p, fresh);
            f.stmt(assign);
        });
        let p = nodes[1];
        assert!(is_assignment_target(&snap, p));
        assert!(!is_member_assignment_target(&snap, p));
    }

    #[test]
    fn only_chain_head_is_outermost() {
        // a.b read
        let (snap, nodes) = snapshot_with(|f| {
            let a = f.ident_with("a", Symbol::local("a", TypeRef::reference("T")));
            let b = f.ident("b");
            let access = f.member(a, b);
            f.stmt(access);
        });
        // nodes: [member, a, b]
        assert!(is_outermost(&snap, nodes[1]));
        assert!(!is_outermost(&snap, nodes[2]));
    }

    #[test]
    fn explicit_this_receiver_counts_member_as_outermost() {
        // this.field
        let (snap, nodes) = snapshot_with(|f| {
            let this = f.this();
            let field = f.ident_with("field", Symbol::instance_field("field", TypeRef::value("int")));
            let access = f.member(this, field);
            f.stmt(access);
        });
        // nodes: [member, this, field]
        assert!(is_outermost(&snap, nodes[2]));
    }

    #[test]
    fn scope_traversal_does_not_enter_lambda_bodies() {
        let mut snap = SnapshotBuilder::new();
        let mut lambda = snap.function(
            "T.M.<lambda>.0",
            "Tests",
            TypeRef::void(),
            FunctionKind::Lambda,
        );
        let t = lambda.throw_stmt();
        lambda.stmt(t);
        let lambda_id = lambda.finish();

        let mut f = snap.function("T.M", "Tests", TypeRef::void(), FunctionKind::Ordinary);
        let l = f.lambda(lambda_id);
        f.stmt(l);
        f.finish();

        let snap = snap.build();
        let outer = &snap.functions()[1];
        let nodes = descendants_in_scope(&snap, outer);
        assert_eq!(nodes.len(), 1);
        assert!(matches!(snap.node(nodes[0]), NodeKind::Lambda { .. }));
    }
}
