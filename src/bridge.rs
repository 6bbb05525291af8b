//! Value Marshaling Bridge
//!
//! Bidirectional conversion between the expression tree's node-based
//! argument representation and the embedded runtime's value representation.
//!
//! Argument direction: a node plus its resolved type tag become one
//! [`ScriptValue`]. Numeric tags read the node's numeric payload, textual
//! tags its text, boolean tags accept `true`/`false` text or a number, and
//! opaque tags wrap the node's entity id without ever dereferencing it.
//!
//! Return direction: the handler's return list is reduced to exactly one
//! [`SexpResult`] under the declared return type. Boolean-shaped returns
//! map into the tri-valued logic domain; numeric-shaped returns map to a
//! number, with runtime nil becoming the distinguished invalid-numeric
//! sentinel. A return list of the wrong shape is a mismatch, reported as a
//! diagnostic by the dispatcher rather than a crash.

use std::fmt;

use crate::tree::{ExprNodes, NodeId};
use crate::types::{TypeCode, TypeRegistry, ValueKind};
use crate::value::{ScriptValue, SexpResult};

/// Error type for marshaling in either direction
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// An argument node did not carry a value of the expected type
    Conversion { expected: String, node: NodeId },
    /// The handler's return list did not match the declared return type
    ReturnTypeMismatch { expected: String, got: String },
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::Conversion { expected, node } => {
                write!(f, "node {} is not convertible to '{}'", node, expected)
            }
            BridgeError::ReturnTypeMismatch { expected, got } => {
                write!(f, "return type mismatch: expected {}, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for BridgeError {}

/// Convert one argument node into the runtime's representation, driven by
/// the resolved type tag.
pub fn marshal_argument(
    nodes: &dyn ExprNodes,
    node: NodeId,
    ty: TypeCode,
    types: &TypeRegistry,
) -> Result<ScriptValue, BridgeError> {
    let tag = types.tag(ty).ok_or_else(|| BridgeError::Conversion {
        expected: format!("type #{}", ty),
        node,
    })?;

    let value = match tag.kind() {
        ValueKind::Number => nodes.numeric_value(node).map(ScriptValue::Number),
        ValueKind::Text => nodes
            .text_value(node)
            .map(|s| ScriptValue::Text(s.to_string())),
        ValueKind::Boolean => marshal_boolean(nodes, node),
        ValueKind::Opaque => nodes
            .handle_value(node)
            .map(|id| ScriptValue::Handle { ty, id }),
    };

    value.ok_or_else(|| BridgeError::Conversion {
        expected: tag.name().to_string(),
        node,
    })
}

/// Boolean argument nodes carry either `true`/`false` text or a number
/// (zero is false).
fn marshal_boolean(nodes: &dyn ExprNodes, node: NodeId) -> Option<ScriptValue> {
    if let Some(text) = nodes.text_value(node) {
        if text.eq_ignore_ascii_case("true") {
            return Some(ScriptValue::Bool(true));
        }
        if text.eq_ignore_ascii_case("false") {
            return Some(ScriptValue::Bool(false));
        }
        return None;
    }
    nodes
        .numeric_value(node)
        .map(|n| ScriptValue::Bool(n != 0.0))
}

/// Reduce a handler's return list to one expression-language result under
/// the declared return type.
pub fn marshal_return(
    values: &[ScriptValue],
    return_type: Option<TypeCode>,
    types: &TypeRegistry,
) -> Result<SexpResult, BridgeError> {
    let Some(code) = return_type else {
        // No declared value: whatever the handler returned is ignored.
        return Ok(SexpResult::Nothing);
    };

    let Some(tag) = types.tag(code) else {
        return Err(BridgeError::ReturnTypeMismatch {
            expected: format!("type #{}", code),
            got: describe_values(values),
        });
    };

    match tag.kind() {
        ValueKind::Boolean => match values {
            [ScriptValue::Bool(true)] => Ok(SexpResult::True),
            [ScriptValue::Bool(false)] => Ok(SexpResult::False),
            other => Err(BridgeError::ReturnTypeMismatch {
                expected: "a single boolean".to_string(),
                got: describe_values(other),
            }),
        },
        ValueKind::Number => match values {
            [ScriptValue::Number(n)] => Ok(SexpResult::Number(*n)),
            [ScriptValue::Nil] => Ok(SexpResult::NotANumber),
            other => Err(BridgeError::ReturnTypeMismatch {
                expected: "a single number".to_string(),
                got: describe_values(other),
            }),
        },
        // The expression language's result encoding cannot carry text or
        // handles back out of an operator.
        ValueKind::Text | ValueKind::Opaque => Err(BridgeError::ReturnTypeMismatch {
            expected: "a boolean, number, or no-value return type".to_string(),
            got: format!("declared return tag '{}'", tag.name()),
        }),
    }
}

/// Safe default result for a declared return type, used when a dispatch
/// aborts: definitely-false for booleans, the invalid-numeric sentinel for
/// numbers, nothing otherwise.
pub fn safe_default(return_type: Option<TypeCode>, types: &TypeRegistry) -> SexpResult {
    match return_type.and_then(|code| types.kind_of(code)) {
        Some(ValueKind::Boolean) => SexpResult::False,
        Some(ValueKind::Number) => SexpResult::NotANumber,
        _ => SexpResult::Nothing,
    }
}

fn describe_values(values: &[ScriptValue]) -> String {
    match values {
        [] => "no values".to_string(),
        [single] => format!("one {}", single.shape_name()),
        many => {
            let shapes: Vec<&str> = many.iter().map(|v| v.shape_name()).collect();
            format!("{} values ({})", many.len(), shapes.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::ExprArena;
    use crate::types::TypeRegistry;

    fn setup() -> (TypeRegistry, ExprArena) {
        (TypeRegistry::with_builtin_tags(), ExprArena::new())
    }

    #[test]
    fn test_number_argument_marshals() {
        let (types, mut arena) = setup();
        let number = types.resolve("number").unwrap();
        let node = arena.number(42.0);
        let value = marshal_argument(&arena, node, number, &types).unwrap();
        assert_eq!(value, ScriptValue::Number(42.0));
    }

    #[test]
    fn test_string_argument_marshals() {
        let (types, mut arena) = setup();
        let string = types.resolve("string").unwrap();
        let node = arena.text("Alpha 1");
        let value = marshal_argument(&arena, node, string, &types).unwrap();
        assert_eq!(value, ScriptValue::Text("Alpha 1".to_string()));
    }

    #[test]
    fn test_boolean_argument_accepts_text_and_number() {
        let (types, mut arena) = setup();
        let boolean = types.resolve("boolean").unwrap();

        let t = arena.text("True");
        let f = arena.text("false");
        let n = arena.number(0.0);
        assert_eq!(
            marshal_argument(&arena, t, boolean, &types).unwrap(),
            ScriptValue::Bool(true)
        );
        assert_eq!(
            marshal_argument(&arena, f, boolean, &types).unwrap(),
            ScriptValue::Bool(false)
        );
        assert_eq!(
            marshal_argument(&arena, n, boolean, &types).unwrap(),
            ScriptValue::Bool(false)
        );
    }

    #[test]
    fn test_opaque_argument_wraps_handle() {
        let (types, mut arena) = setup();
        let ship = types.resolve("ship").unwrap();
        let node = arena.handle(17);
        let value = marshal_argument(&arena, node, ship, &types).unwrap();
        assert_eq!(value, ScriptValue::Handle { ty: ship, id: 17 });
    }

    #[test]
    fn test_wrong_payload_is_conversion_failure() {
        let (types, mut arena) = setup();
        let number = types.resolve("number").unwrap();
        let node = arena.text("not a number");
        let err = marshal_argument(&arena, node, number, &types).unwrap_err();
        assert_eq!(
            err,
            BridgeError::Conversion {
                expected: "number".to_string(),
                node,
            }
        );
    }

    #[test]
    fn test_primitive_round_trip() {
        // Node -> ScriptValue -> node -> ScriptValue is stable for the
        // primitive tags.
        let (types, mut arena) = setup();
        let number = types.resolve("number").unwrap();
        let string = types.resolve("string").unwrap();

        let n = arena.number(3.5);
        let first = marshal_argument(&arena, n, number, &types).unwrap();
        let n2 = arena.number(first.as_number().unwrap());
        let second = marshal_argument(&arena, n2, number, &types).unwrap();
        assert_eq!(first, second);

        let s = arena.text("round trip");
        let first = marshal_argument(&arena, s, string, &types).unwrap();
        let ScriptValue::Text(text) = &first else {
            panic!("expected text");
        };
        let s2 = arena.text(text.clone());
        let second = marshal_argument(&arena, s2, string, &types).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_boolean_return_maps_to_tri_valued_logic() {
        let types = TypeRegistry::with_builtin_tags();
        let boolean = types.resolve("boolean").unwrap();
        assert_eq!(
            marshal_return(&[ScriptValue::Bool(true)], Some(boolean), &types).unwrap(),
            SexpResult::True
        );
        assert_eq!(
            marshal_return(&[ScriptValue::Bool(false)], Some(boolean), &types).unwrap(),
            SexpResult::False
        );
    }

    #[test]
    fn test_boolean_return_wrong_shape_is_mismatch() {
        let types = TypeRegistry::with_builtin_tags();
        let boolean = types.resolve("boolean").unwrap();
        let two = [ScriptValue::Bool(true), ScriptValue::Bool(false)];
        let err = marshal_return(&two, Some(boolean), &types).unwrap_err();
        assert!(matches!(err, BridgeError::ReturnTypeMismatch { .. }));
    }

    #[test]
    fn test_number_return_and_nan_sentinel() {
        let types = TypeRegistry::with_builtin_tags();
        let number = types.resolve("number").unwrap();
        assert_eq!(
            marshal_return(&[ScriptValue::Number(7.0)], Some(number), &types).unwrap(),
            SexpResult::Number(7.0)
        );
        assert_eq!(
            marshal_return(&[ScriptValue::Nil], Some(number), &types).unwrap(),
            SexpResult::NotANumber
        );
    }

    #[test]
    fn test_no_value_return_ignores_handler_output() {
        let types = TypeRegistry::with_builtin_tags();
        let result = marshal_return(&[ScriptValue::Number(1.0)], None, &types).unwrap();
        assert_eq!(result, SexpResult::Nothing);
    }

    #[test]
    fn test_safe_defaults_by_kind() {
        let types = TypeRegistry::with_builtin_tags();
        let boolean = types.resolve("boolean").unwrap();
        let number = types.resolve("number").unwrap();
        assert_eq!(safe_default(Some(boolean), &types), SexpResult::False);
        assert_eq!(safe_default(Some(number), &types), SexpResult::NotANumber);
        assert_eq!(safe_default(None, &types), SexpResult::Nothing);
    }
}
