//! Violation policies.
//!
//! Each policy inspects one function's own scope and reports the violations
//! it is responsible for. Policies never look across function boundaries;
//! transitive effects are the score calculator's job.

use super::freshness::local_is_fresh;
use crate::core::Violation;
use crate::model::{queries, CodeModel, FunctionNode, NodeKind, SymbolKind};

/// One detector over a function body. Returns every occurrence it finds,
/// duplicates included.
pub trait ViolationPolicy {
    fn name(&self) -> &'static str;

    fn check(&self, function: &FunctionNode, model: &dyn CodeModel) -> Vec<Violation>;
}

/// Flags every `throw` in the function's own scope.
pub struct ThrowsExceptionPolicy;

impl ViolationPolicy for ThrowsExceptionPolicy {
    fn name(&self) -> &'static str {
        "throws-exception"
    }

    fn check(&self, function: &FunctionNode, model: &dyn CodeModel) -> Vec<Violation> {
        queries::descendants_in_scope(model, function)
            .into_iter()
            .filter(|&id| matches!(model.node(id), NodeKind::Throw))
            .map(|_| Violation::ThrowsException)
            .collect()
    }
}

/// Classifies every interesting identifier in scope as a state read, state
/// write, parameter mutation or stale-reference mutation.
///
/// Only identifiers that head their access chain are considered, plus static
/// symbols anywhere in a chain (`Config.Flag` reaches global state no matter
/// how deep it sits). Compile-time constants and enum members carry no
/// runtime state and are skipped, as are method names.
pub struct IdentifierPolicy;

impl ViolationPolicy for IdentifierPolicy {
    fn name(&self) -> &'static str {
        "identifier"
    }

    fn check(&self, function: &FunctionNode, model: &dyn CodeModel) -> Vec<Violation> {
        let mut violations = Vec::new();

        for id in queries::descendants_in_scope(model, function) {
            let is_identifier = matches!(
                model.node(id),
                NodeKind::Identifier { .. } | NodeKind::This
            );
            if !is_identifier {
                continue;
            }
            let Some(symbol) = model.resolve_symbol(id) else {
                continue;
            };
            if !queries::is_outermost(model, id) && !symbol.is_static {
                continue;
            }

            let written = queries::is_assignment_target(model, id);
            match &symbol.kind {
                SymbolKind::EnumConstant => {}
                SymbolKind::Field { is_const: true } => {}
                SymbolKind::Field { .. } | SymbolKind::Property => {
                    violations.push(match (symbol.is_static, written) {
                        (true, true) => Violation::ModifiesGlobalState,
                        (true, false) => Violation::ReadsGlobalState,
                        (false, true) => Violation::ModifiesLocalState,
                        (false, false) => Violation::ReadsLocalState,
                    });
                }
                SymbolKind::Parameter { is_this: true, .. } => {
                    // `this` is instance state, same as an unqualified field.
                    violations.push(if written {
                        Violation::ModifiesLocalState
                    } else {
                        Violation::ReadsLocalState
                    });
                }
                SymbolKind::Parameter {
                    is_this: false,
                    of_enclosing: true,
                } => {
                    // A captured parameter is the enclosing function's
                    // state, not a parameter of this one.
                    violations.push(if written {
                        Violation::ModifiesLocalState
                    } else {
                        Violation::ReadsLocalState
                    });
                }
                SymbolKind::Parameter {
                    is_this: false,
                    of_enclosing: false,
                } => {
                    // Reassigning the parameter variable only rebinds a
                    // local slot; writing through it mutates caller state.
                    if symbol.declared_type.is_reference
                        && queries::is_member_assignment_target(model, id)
                    {
                        violations.push(Violation::ModifiesParameter);
                    }
                }
                SymbolKind::Local => {
                    if symbol.declared_type.is_reference
                        && queries::is_member_assignment_target(model, id)
                        && local_is_fresh(model, function, &symbol.name) == Some(false)
                    {
                        violations.push(Violation::ModifiesNonFreshObject);
                    }
                }
                SymbolKind::Method { .. } => {}
            }
        }

        violations
    }
}
