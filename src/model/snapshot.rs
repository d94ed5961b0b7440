//! In-memory [`CodeModel`] implementation.
//!
//! A [`Snapshot`] is the concrete form adapters hand to the analysis: a
//! node arena with parent links, per-node symbol facts and the function
//! list. [`SnapshotBuilder`]/[`FunctionBuilder`] are the construction API
//! used by adapters and, extensively, by tests.

use super::{CodeModel, FunctionId, FunctionNode, NodeId, NodeKind, Symbol, SymbolKind, TypeRef};
use crate::core::{FunctionIdentity, FunctionKind};
use std::path::PathBuf;

/// Immutable code model snapshot: node arena + symbols + functions.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    nodes: Vec<NodeKind>,
    parents: Vec<Option<NodeId>>,
    symbols: Vec<Option<Symbol>>,
    functions: Vec<FunctionNode>,
}

impl CodeModel for Snapshot {
    fn functions(&self) -> &[FunctionNode] {
        &self.functions
    }

    fn node(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0 as usize]
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents[id.0 as usize]
    }

    fn resolve_symbol(&self, id: NodeId) -> Option<&Symbol> {
        self.symbols[id.0 as usize].as_ref()
    }
}

impl Snapshot {
    pub fn function(&self, id: FunctionId) -> &FunctionNode {
        &self.functions[id.0 as usize]
    }
}

/// Mutable accumulator for a [`Snapshot`].
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    nodes: Vec<NodeKind>,
    parents: Vec<Option<NodeId>>,
    symbols: Vec<Option<Symbol>>,
    functions: Vec<FunctionNode>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a function; the returned builder allocates its body nodes.
    /// The function's slot is reserved immediately so nested lambdas can be
    /// built before their encloser references them.
    pub fn function(
        &mut self,
        name: impl Into<String>,
        namespace: impl Into<String>,
        return_type: TypeRef,
        kind: FunctionKind,
    ) -> FunctionBuilder<'_> {
        let identity = FunctionIdentity::new(
            name,
            namespace,
            return_type.name.clone(),
            Vec::new(),
            kind,
        );
        let index = self.functions.len();
        self.functions.push(FunctionNode {
            identity,
            file: PathBuf::from("<memory>"),
            line_start: 0,
            line_end: 0,
            source_lines: 1,
            return_type,
            body: Some(Vec::new()),
        });
        FunctionBuilder {
            builder: self,
            index,
            body: Vec::new(),
            has_body: true,
        }
    }

    pub fn build(self) -> Snapshot {
        Snapshot {
            nodes: self.nodes,
            parents: self.parents,
            symbols: self.symbols,
            functions: self.functions,
        }
    }

    fn push_node(&mut self, kind: NodeKind, symbol: Option<Symbol>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(kind);
        self.parents.push(None);
        self.symbols.push(symbol);
        id
    }

    fn set_parent(&mut self, child: NodeId, parent: NodeId) {
        self.parents[child.0 as usize] = Some(parent);
    }
}

/// Builds the body of one function inside a [`SnapshotBuilder`].
pub struct FunctionBuilder<'a> {
    builder: &'a mut SnapshotBuilder,
    index: usize,
    body: Vec<NodeId>,
    has_body: bool,
}

impl FunctionBuilder<'_> {
    /// Override source location metadata.
    pub fn at(&mut self, file: impl Into<PathBuf>, line_start: u32, line_end: u32) -> &mut Self {
        let f = &mut self.builder.functions[self.index];
        f.file = file.into();
        f.line_start = line_start;
        f.line_end = line_end;
        f.source_lines = line_end.saturating_sub(line_start) + 1;
        self
    }

    /// Declare the ordered parameter type names of the identity.
    pub fn params(&mut self, parameter_types: Vec<String>) -> &mut Self {
        self.builder.functions[self.index].identity.parameter_types = parameter_types;
        self
    }

    /// Mark the function as having no obtainable body.
    pub fn no_body(&mut self) -> &mut Self {
        self.has_body = false;
        self
    }

    pub fn identity(&self) -> &FunctionIdentity {
        &self.builder.functions[self.index].identity
    }

    // ----- node constructors ------------------------------------------------

    pub fn literal(&mut self) -> NodeId {
        self.builder.push_node(NodeKind::Literal, None)
    }

    pub fn this(&mut self) -> NodeId {
        self.builder.push_node(NodeKind::This, None)
    }

    /// An identifier with no resolvable symbol.
    pub fn ident(&mut self, name: impl Into<String>) -> NodeId {
        self.builder
            .push_node(NodeKind::Identifier { name: name.into() }, None)
    }

    /// An identifier bound to the given symbol.
    pub fn ident_with(&mut self, name: impl Into<String>, symbol: Symbol) -> NodeId {
        self.builder
            .push_node(NodeKind::Identifier { name: name.into() }, Some(symbol))
    }

    pub fn member(&mut self, base: NodeId, member: NodeId) -> NodeId {
        let id = self
            .builder
            .push_node(NodeKind::Member { base, member }, None);
        self.builder.set_parent(base, id);
        self.builder.set_parent(member, id);
        id
    }

    pub fn assign(&mut self, target: NodeId, value: NodeId) -> NodeId {
        let id = self
            .builder
            .push_node(NodeKind::Assign { target, value }, None);
        self.builder.set_parent(target, id);
        self.builder.set_parent(value, id);
        id
    }

    pub fn local(&mut self, name: impl Into<String>, init: Option<NodeId>) -> NodeId {
        let id = self.builder.push_node(
            NodeKind::LocalDecl {
                name: name.into(),
                init,
            },
            None,
        );
        if let Some(init) = init {
            self.builder.set_parent(init, id);
        }
        id
    }

    pub fn ret(&mut self, value: Option<NodeId>) -> NodeId {
        let id = self.builder.push_node(NodeKind::Return { value }, None);
        if let Some(value) = value {
            self.builder.set_parent(value, id);
        }
        id
    }

    pub fn throw_stmt(&mut self) -> NodeId {
        self.builder.push_node(NodeKind::Throw, None)
    }

    /// A call resolved to the given callee identity.
    pub fn call(&mut self, callee: FunctionIdentity, args: Vec<NodeId>) -> NodeId {
        self.call_inner(callee, false, args)
    }

    /// A call resolved to an abstract callee.
    pub fn call_abstract(&mut self, callee: FunctionIdentity, args: Vec<NodeId>) -> NodeId {
        self.call_inner(callee, true, args)
    }

    fn call_inner(
        &mut self,
        callee: FunctionIdentity,
        is_abstract: bool,
        args: Vec<NodeId>,
    ) -> NodeId {
        let symbol = Symbol {
            name: callee.name.clone(),
            kind: SymbolKind::Method {
                identity: callee.clone(),
                is_abstract,
                is_constructor: false,
                is_builtin_operator: false,
            },
            is_static: false,
            declared_type: TypeRef::value(callee.return_type.clone()),
        };
        let callee_node = self
            .builder
            .push_node(NodeKind::Identifier { name: callee.name }, Some(symbol.clone()));
        let id = self.builder.push_node(
            NodeKind::Call {
                callee: callee_node,
                args: args.clone(),
            },
            Some(symbol),
        );
        self.builder.set_parent(callee_node, id);
        for arg in args {
            self.builder.set_parent(arg, id);
        }
        id
    }

    /// A call whose target symbol could not be resolved.
    pub fn call_unresolved(&mut self, text: impl Into<String>, args: Vec<NodeId>) -> NodeId {
        let callee_node = self
            .builder
            .push_node(NodeKind::Identifier { name: text.into() }, None);
        let id = self.builder.push_node(
            NodeKind::Call {
                callee: callee_node,
                args: args.clone(),
            },
            None,
        );
        self.builder.set_parent(callee_node, id);
        for arg in args {
            self.builder.set_parent(arg, id);
        }
        id
    }

    pub fn new_object(&mut self, args: Vec<NodeId>) -> NodeId {
        let id = self
            .builder
            .push_node(NodeKind::New { args: args.clone() }, None);
        for arg in args {
            self.builder.set_parent(arg, id);
        }
        id
    }

    pub fn operator(&mut self, args: Vec<NodeId>) -> NodeId {
        let id = self
            .builder
            .push_node(NodeKind::Operator { args: args.clone() }, None);
        for arg in args {
            self.builder.set_parent(arg, id);
        }
        id
    }

    /// Reference to a lambda or local function built earlier.
    pub fn lambda(&mut self, function: FunctionId) -> NodeId {
        let identity = self.builder.functions[function.0 as usize].identity.clone();
        let declared_type = self.builder.functions[function.0 as usize].return_type.clone();
        let symbol = Symbol {
            name: identity.name.clone(),
            kind: SymbolKind::Method {
                identity,
                is_abstract: false,
                is_constructor: false,
                is_builtin_operator: false,
            },
            is_static: false,
            declared_type,
        };
        self.builder
            .push_node(NodeKind::Lambda { function }, Some(symbol))
    }

    /// Append a top-level statement to the body.
    pub fn stmt(&mut self, node: NodeId) {
        self.body.push(node);
    }

    pub fn finish(self) -> FunctionId {
        let body = if self.has_body { Some(self.body) } else { None };
        self.builder.functions[self.index].body = body;
        FunctionId(self.index as u32)
    }
}
