//! Value representations on the two sides of the marshaling bridge.
//!
//! [`ScriptValue`] is the engine's view of an embedded-runtime value: the
//! shapes a handler can receive as arguments and hand back as results.
//! Game-object handles travel through it opaquely; the runtime can pass
//! them back unchanged but never introspect them.
//!
//! [`SexpResult`] is the expression language's tri-valued result encoding.
//! The invalid-numeric sentinel is a distinct variant so callers branching
//! on numeric validity can never confuse it with zero.

use std::fmt;

use crate::types::TypeCode;

/// A value in the embedded scripting runtime's representation.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    /// Numeric value
    Number(f64),
    /// Textual value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// The runtime's "no value" (nil)
    Nil,
    /// Opaque game-object handle: the tag it was marshaled under plus the
    /// entity id owned by the game-object model. Pass-through only.
    Handle { ty: TypeCode, id: u64 },
}

impl ScriptValue {
    /// Friendly shape name for diagnostics.
    pub fn shape_name(&self) -> &'static str {
        match self {
            ScriptValue::Number(_) => "number",
            ScriptValue::Text(_) => "string",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Nil => "nil",
            ScriptValue::Handle { .. } => "handle",
        }
    }

    /// Extract a numeric value, if this is one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract a boolean value, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ScriptValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Number(n) => write!(f, "{}", n),
            ScriptValue::Text(s) => write!(f, "\"{}\"", s),
            ScriptValue::Bool(b) => write!(f, "{}", b),
            ScriptValue::Nil => write!(f, "nil"),
            ScriptValue::Handle { ty, id } => write!(f, "<handle #{}:{}>", ty, id),
        }
    }
}

/// The expression language's tri-valued result encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SexpResult {
    /// Definitely true
    True,
    /// Definitely false
    False,
    /// A valid numeric result
    Number(f64),
    /// The distinguished invalid-numeric sentinel. Distinct from zero.
    NotANumber,
    /// No value: the operator executed for effect only.
    Nothing,
}

impl SexpResult {
    /// Whether this result carries a valid number.
    pub fn is_valid_number(&self) -> bool {
        matches!(self, SexpResult::Number(_))
    }
}

impl fmt::Display for SexpResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SexpResult::True => write!(f, "true"),
            SexpResult::False => write!(f, "false"),
            SexpResult::Number(n) => write!(f, "{}", n),
            SexpResult::NotANumber => write!(f, "NaN"),
            SexpResult::Nothing => write!(f, "nothing"),
        }
    }
}
