//! Return-value freshness tracing.
//!
//! A function's return value is *fresh* when it is guaranteed to be a newly
//! allocated object, not aliased to anything the caller can already see.
//! Provenance is traced through local assignments with an explicit
//! dequeue-once work queue, so cyclic data flow (`a = b; b = a;`) always
//! terminates.

use crate::core::FunctionIdentity;
use crate::model::{queries, CodeModel, FunctionNode, NodeId, NodeKind, SymbolKind};
use std::collections::{HashSet, VecDeque};
use std::hash::Hash;

/// A queue that accepts each item at most once over its whole lifetime.
/// The memory of past items is what makes cyclic traces terminate.
#[derive(Debug)]
pub struct OnceQueue<T> {
    seen: HashSet<T>,
    queue: VecDeque<T>,
}

impl<T: Eq + Hash + Clone> OnceQueue<T> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
            queue: VecDeque::new(),
        }
    }

    pub fn enqueue(&mut self, item: T) {
        if self.seen.insert(item.clone()) {
            self.queue.push_back(item);
        }
    }

    pub fn dequeue(&mut self) -> Option<T> {
        self.queue.pop_front()
    }
}

impl<T: Eq + Hash + Clone> Default for OnceQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Why an expression entered the work queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Trace {
    /// Flows into a return statement: callees found here must return fresh
    /// for the owner to be fresh.
    ReturnValue,
    /// Flows into a tracked variable: callees found here are expected to
    /// return fresh values.
    FreshDependency,
}

/// Result of tracing one function's return-value provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreshnessOutcome {
    pub is_fresh: bool,
    /// Callees the owner's freshness presupposes to be fresh.
    pub return_dependencies: HashSet<FunctionIdentity>,
    /// Callees whose results are stored into tracked variables.
    pub fresh_dependencies: HashSet<FunctionIdentity>,
}

/// Trace whether `function`'s return value is a freshly allocated object.
///
/// Constructors and built-in operators are inherently fresh; method calls
/// become recorded dependencies instead of being descended into; locals are
/// traced through their declaration initializer and every assignment to a
/// same-named variable. Anything else (fields, parameters) aliases caller
/// state and poisons freshness, but draining continues so dependency
/// information is still collected. Void and value-type returns carry no
/// aliasing risk and force `is_fresh`.
pub fn analyze_return_freshness<M: CodeModel + ?Sized>(
    function: &FunctionNode,
    model: &M,
) -> FreshnessOutcome {
    let scope = queries::descendants_in_scope(model, function);
    let mut queue: OnceQueue<(NodeId, Trace)> = OnceQueue::new();

    for &id in &scope {
        match model.node(id) {
            NodeKind::Return { value: Some(value) } => {
                queue.enqueue((*value, Trace::ReturnValue));
            }
            NodeKind::LocalDecl { init: Some(init), .. } => {
                queue.enqueue((*init, Trace::FreshDependency));
            }
            NodeKind::Assign { value, .. } => {
                queue.enqueue((*value, Trace::FreshDependency));
            }
            _ => {}
        }
    }

    let mut is_fresh = true;
    let mut return_dependencies = HashSet::new();
    let mut fresh_dependencies = HashSet::new();

    while let Some((id, trace)) = queue.dequeue() {
        if matches!(model.node(id), NodeKind::New { .. } | NodeKind::Operator { .. }) {
            continue;
        }

        let Some(symbol) = model.resolve_expr_symbol(id) else {
            // No information; drop the branch.
            continue;
        };

        match &symbol.kind {
            SymbolKind::Method {
                identity,
                is_constructor,
                is_builtin_operator,
                ..
            } => {
                if *is_constructor || *is_builtin_operator {
                    continue;
                }
                match trace {
                    Trace::ReturnValue => return_dependencies.insert(identity.clone()),
                    Trace::FreshDependency => fresh_dependencies.insert(identity.clone()),
                };
            }
            SymbolKind::Local => {
                for source in local_sources(model, &scope, &symbol.name) {
                    queue.enqueue((source, trace));
                }
            }
            _ => {
                is_fresh = false;
            }
        }
    }

    if function.return_type.is_void() || !function.return_type.is_reference {
        is_fresh = true;
    }

    FreshnessOutcome {
        is_fresh,
        return_dependencies,
        fresh_dependencies,
    }
}

/// Every expression assigned into the named local within the scope: the
/// declaration initializer plus the right-hand side of each assignment
/// whose target is a same-named identifier. Name matching within one
/// function is an approximation: shadowed redeclarations merge.
fn local_sources<M: CodeModel + ?Sized>(model: &M, scope: &[NodeId], name: &str) -> Vec<NodeId> {
    let mut sources = Vec::new();
    for &id in scope {
        match model.node(id) {
            NodeKind::LocalDecl {
                name: decl_name,
                init: Some(init),
            } if decl_name == name => sources.push(*init),
            NodeKind::Assign { target, value } => {
                if let NodeKind::Identifier { name: target_name } = model.node(*target) {
                    if target_name == name {
                        sources.push(*value);
                    }
                }
            }
            _ => {}
        }
    }
    sources
}

/// Three-state freshness of one local variable, used by the identifier
/// policy to spot writes through stale references:
/// - `Some(false)`: some assigned value is not a call at all (literal,
///   field, uninitialized declaration) — assumed aliased.
/// - `Some(true)`: every assigned value is a constructor — known fresh.
/// - `None`: only method calls of unknown freshness — left to the
///   cross-function freshness flags to settle.
pub fn local_is_fresh<M: CodeModel + ?Sized>(
    model: &M,
    function: &FunctionNode,
    name: &str,
) -> Option<bool> {
    let scope = queries::descendants_in_scope(model, function);

    let mut classes: Vec<Option<bool>> = Vec::new();
    for &id in &scope {
        match model.node(id) {
            NodeKind::LocalDecl {
                name: decl_name,
                init,
            } if decl_name == name => {
                // An uninitialized declaration counts as a non-call source.
                classes.push(match init {
                    Some(init) => source_is_constructor(model, *init),
                    None => None,
                });
            }
            NodeKind::Assign { target, value } => {
                if let NodeKind::Identifier { name: target_name } = model.node(*target) {
                    if target_name == name {
                        classes.push(source_is_constructor(model, *value));
                    }
                }
            }
            _ => {}
        }
    }

    if classes.iter().any(|c| c.is_none()) {
        return Some(false);
    }
    if classes.iter().all(|c| *c == Some(true)) {
        return Some(true);
    }
    None
}

/// `Some(true)` for constructors/operators, `Some(false)` for other calls,
/// `None` for anything that is not a call.
fn source_is_constructor<M: CodeModel + ?Sized>(model: &M, id: NodeId) -> Option<bool> {
    match model.node(id) {
        NodeKind::New { .. } | NodeKind::Operator { .. } => Some(true),
        _ => match model.resolve_expr_symbol(id).map(|s| &s.kind) {
            Some(SymbolKind::Method {
                is_constructor,
                is_builtin_operator,
                ..
            }) => Some(*is_constructor || *is_builtin_operator),
            _ => None,
        },
    }
}
