//! Execution Dispatcher
//!
//! Orchestrates one operator evaluation: arity check, positional argument
//! binding through the bridge, handler invocation, and result marshaling.
//! Each phase is traced; any failure aborts the dispatch fail-fast,
//! degrades to the declared return type's safe default, and is surfaced as
//! a non-fatal author-facing diagnostic. An authoring mistake in one
//! operator must never take the simulation down.
//!
//! The dispatcher holds no mutable state; everything per-call lives on the
//! stack, so a handler may recursively trigger further dispatches on the
//! same logic thread.

use std::fmt;

use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::bridge::{self, BridgeError};
use crate::registry::{Opcode, OperatorTable};
use crate::tree::{ExprNodes, NodeId};
use crate::types::TypeRegistry;
use crate::value::{ScriptValue, SexpResult};

/// Error type for one aborted dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// The opcode has no entry in the operator table
    UnknownOpcode(Opcode),
    /// Argument count outside the declared bounds
    ArityViolation {
        operator: String,
        min: usize,
        max: Option<usize>,
        actual: usize,
    },
    /// One argument node failed to convert; nothing was invoked
    ArgumentConversionFailed {
        operator: String,
        position: usize,
        expected: String,
    },
    /// The definition is registered but no handler is bound
    UnboundOperator(String),
    /// The handler itself reported a runtime error
    HandlerFailed { operator: String, message: String },
    /// The handler's return list did not match the declared return type
    ReturnTypeMismatch { operator: String, detail: String },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownOpcode(opcode) => {
                write!(f, "opcode {} is not registered", opcode)
            }
            DispatchError::ArityViolation {
                operator,
                min,
                max,
                actual,
            } => match max {
                Some(max) => write!(
                    f,
                    "operator '{}' takes {}..{} arguments, got {}",
                    operator, min, max, actual
                ),
                None => write!(
                    f,
                    "operator '{}' takes at least {} arguments, got {}",
                    operator, min, actual
                ),
            },
            DispatchError::ArgumentConversionFailed {
                operator,
                position,
                expected,
            } => write!(
                f,
                "operator '{}': argument {} is not convertible to '{}'",
                operator, position, expected
            ),
            DispatchError::UnboundOperator(operator) => {
                write!(f, "operator '{}' has no handler bound", operator)
            }
            DispatchError::HandlerFailed { operator, message } => {
                write!(f, "operator '{}': handler failed: {}", operator, message)
            }
            DispatchError::ReturnTypeMismatch { operator, detail } => {
                write!(f, "operator '{}': {}", operator, detail)
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// Result of one dispatch: the expression-language result (a safe default
/// when the dispatch aborted) plus the diagnostic, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub result: SexpResult,
    pub error: Option<DispatchError>,
}

impl DispatchOutcome {
    fn done(result: SexpResult) -> Self {
        Self {
            result,
            error: None,
        }
    }

    fn aborted(result: SexpResult, error: DispatchError) -> Self {
        Self {
            result,
            error: Some(error),
        }
    }

    /// Whether the dispatch ran to completion.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// One-evaluation orchestrator over an operator table and type registry.
///
/// Borrows both; all per-call state is stack-local, so dispatch is
/// reentrant on the single logic thread.
pub struct Dispatcher<'a> {
    table: &'a OperatorTable,
    types: &'a TypeRegistry,
}

impl<'a> Dispatcher<'a> {
    pub fn new(table: &'a OperatorTable, types: &'a TypeRegistry) -> Self {
        Self { table, types }
    }

    /// Evaluate one operator node. The node's children are its arguments,
    /// in order.
    pub fn dispatch(&self, nodes: &dyn ExprNodes, opcode: Opcode, node: NodeId) -> DispatchOutcome {
        let Some((def, handler)) = self.table.entry(opcode) else {
            let error = DispatchError::UnknownOpcode(opcode);
            warn!(%error, "dispatch aborted");
            return DispatchOutcome::aborted(SexpResult::Nothing, error);
        };

        let default = bridge::safe_default(def.return_type(), self.types);
        trace!(operator = def.name(), opcode, "dispatch begin");

        // Arity check.
        let actual = nodes.count_children(node);
        let too_few = actual < def.min_args();
        let too_many = def.max_args().is_some_and(|max| actual > max);
        if too_few || too_many {
            let error = DispatchError::ArityViolation {
                operator: def.name().to_string(),
                min: def.min_args(),
                max: def.max_args(),
                actual,
            };
            warn!(%error, "dispatch aborted");
            return DispatchOutcome::aborted(default, error);
        }
        trace!(operator = def.name(), args = actual, "arity checked");

        // Bind arguments in order, fail-fast. No partial binding survives
        // an abort; the argument list is dropped with this frame.
        let mut args: SmallVec<[ScriptValue; 8]> = SmallVec::new();
        let mut cursor = nodes.first_child(node);
        let mut position = 0;
        while let Some(child) = cursor {
            let Some(ty) = def.type_for_position(position) else {
                // Unreachable past the arity check; kept as a guard.
                let error = DispatchError::ArgumentConversionFailed {
                    operator: def.name().to_string(),
                    position,
                    expected: "a declared argument position".to_string(),
                };
                warn!(%error, "dispatch aborted");
                return DispatchOutcome::aborted(default, error);
            };

            match bridge::marshal_argument(nodes, child, ty, self.types) {
                Ok(value) => args.push(value),
                Err(err) => {
                    let expected = match err {
                        BridgeError::Conversion { expected, .. } => expected,
                        other => other.to_string(),
                    };
                    let error = DispatchError::ArgumentConversionFailed {
                        operator: def.name().to_string(),
                        position,
                        expected,
                    };
                    warn!(%error, "dispatch aborted");
                    return DispatchOutcome::aborted(default, error);
                }
            }

            position += 1;
            cursor = nodes.next_sibling(child);
        }
        trace!(operator = def.name(), "arguments bound");

        // Invoke the handler.
        let Some(handler) = handler else {
            let error = DispatchError::UnboundOperator(def.name().to_string());
            warn!(%error, "dispatch aborted");
            return DispatchOutcome::aborted(default, error);
        };
        let returned = match handler.invoke(&args) {
            Ok(values) => values,
            Err(message) => {
                let error = DispatchError::HandlerFailed {
                    operator: def.name().to_string(),
                    message,
                };
                warn!(%error, "dispatch aborted");
                return DispatchOutcome::aborted(default, error);
            }
        };
        trace!(
            operator = def.name(),
            values = returned.len(),
            "handler invoked"
        );

        // Marshal the result back.
        match bridge::marshal_return(&returned, def.return_type(), self.types) {
            Ok(result) => {
                trace!(operator = def.name(), %result, "dispatch done");
                DispatchOutcome::done(result)
            }
            Err(err) => {
                let error = DispatchError::ReturnTypeMismatch {
                    operator: def.name().to_string(),
                    detail: err.to_string(),
                };
                warn!(%error, "dispatch aborted");
                DispatchOutcome::aborted(default, error)
            }
        }
    }
}
