//! Type Tag Registry
//!
//! Maps the symbolic type names used by the authoring surface (`number`,
//! `string`, `ship`, ...) to stable internal type codes plus a marshaling
//! kind. Every type an operator declares must resolve here at
//! definition-construction time; an unknown name is a hard authoring error.
//!
//! # Design
//!
//! Codes are assigned sequentially at registration and never reused; the
//! registry is append-only for its whole lifetime. Name lookup is
//! case-insensitive because the authoring surface is.

use std::collections::HashMap;
use std::fmt;

/// Internal integer code for a registered type tag.
pub type TypeCode = u32;

/// How values of a tag cross the marshaling bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Numeric argument or return value.
    Number,
    /// Textual argument.
    Text,
    /// Tri-valued boolean argument or return value.
    Boolean,
    /// Pass-through game-object handle; never dereferenced by this engine.
    Opaque,
}

/// One registered type tag: symbolic name, stable code, marshaling kind.
#[derive(Debug, Clone)]
pub struct TypeTag {
    name: String,
    code: TypeCode,
    kind: ValueKind,
}

impl TypeTag {
    /// The symbolic name as it was registered.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The stable internal code.
    pub fn code(&self) -> TypeCode {
        self.code
    }

    /// The marshaling kind.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }
}

/// Error type for type tag registration and resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// Name already registered (codes are never rebound)
    DuplicateType(String),
    /// Name not present in the registry
    UnknownType(String),
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeError::DuplicateType(name) => {
                write!(f, "type tag '{}' is already registered", name)
            }
            TypeError::UnknownType(name) => write!(f, "unknown type tag '{}'", name),
        }
    }
}

impl std::error::Error for TypeError {}

/// Registry of type tags for one scripting environment.
///
/// Owned by the environment's lifecycle; passed by reference to the table
/// parser, the bridge, and the dispatcher.
pub struct TypeRegistry {
    /// Tags stored by code (index)
    tags: Vec<TypeTag>,
    /// Lowercased name -> code mapping for resolution
    name_to_code: HashMap<String, TypeCode>,
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("tag_count", &self.tags.len())
            .field("names", &self.tags.iter().map(|t| t.name()).collect::<Vec<_>>())
            .finish()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            tags: Vec::new(),
            name_to_code: HashMap::new(),
        }
    }

    /// Create a registry with the mission language's standard tags
    /// pre-registered: `number`, `string`, `boolean`, and the opaque
    /// game-object handles (`ship`, `wing`, `team`, `waypoint`, `message`,
    /// `object`).
    pub fn with_builtin_tags() -> Self {
        let mut registry = Self::new();
        registry.register_builtin_tags();
        registry
    }

    /// Register a type tag, returning its assigned code.
    pub fn register(&mut self, name: &str, kind: ValueKind) -> Result<TypeCode, TypeError> {
        let key = name.to_ascii_lowercase();
        if self.name_to_code.contains_key(&key) {
            return Err(TypeError::DuplicateType(name.to_string()));
        }

        let code = self.tags.len() as TypeCode;
        self.tags.push(TypeTag {
            name: name.to_string(),
            code,
            kind,
        });
        self.name_to_code.insert(key, code);
        Ok(code)
    }

    /// Resolve a symbolic name to its code. Case-insensitive.
    pub fn resolve(&self, name: &str) -> Result<TypeCode, TypeError> {
        self.name_to_code
            .get(&name.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| TypeError::UnknownType(name.to_string()))
    }

    /// Get the tag registered under a code.
    pub fn tag(&self, code: TypeCode) -> Option<&TypeTag> {
        self.tags.get(code as usize)
    }

    /// Get the marshaling kind for a code.
    pub fn kind_of(&self, code: TypeCode) -> Option<ValueKind> {
        self.tag(code).map(|t| t.kind())
    }

    /// Get the number of registered tags
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    fn register_builtin_tags(&mut self) {
        // These names predate this engine; resolution is case-insensitive
        // so the casing here is cosmetic.
        let builtin: &[(&str, ValueKind)] = &[
            ("number", ValueKind::Number),
            ("string", ValueKind::Text),
            ("boolean", ValueKind::Boolean),
            ("ship", ValueKind::Opaque),
            ("wing", ValueKind::Opaque),
            ("team", ValueKind::Opaque),
            ("waypoint", ValueKind::Opaque),
            ("message", ValueKind::Opaque),
            ("object", ValueKind::Opaque),
        ];

        for (name, kind) in builtin {
            // The list above has no duplicates, so this cannot fail.
            let _ = self.register(name, *kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_sequential_codes() {
        let mut registry = TypeRegistry::new();
        let a = registry.register("number", ValueKind::Number).unwrap();
        let b = registry.register("string", ValueKind::Text).unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = TypeRegistry::new();
        registry.register("ship", ValueKind::Opaque).unwrap();
        let err = registry.register("Ship", ValueKind::Opaque).unwrap_err();
        assert_eq!(err, TypeError::DuplicateType("Ship".to_string()));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let mut registry = TypeRegistry::new();
        let code = registry.register("Waypoint", ValueKind::Opaque).unwrap();
        assert_eq!(registry.resolve("waypoint").unwrap(), code);
        assert_eq!(registry.resolve("WAYPOINT").unwrap(), code);
    }

    #[test]
    fn test_unknown_type_fails() {
        let registry = TypeRegistry::with_builtin_tags();
        let err = registry.resolve("nebula").unwrap_err();
        assert_eq!(err, TypeError::UnknownType("nebula".to_string()));
    }

    #[test]
    fn test_builtin_tags_present() {
        let registry = TypeRegistry::with_builtin_tags();
        for name in ["number", "string", "boolean", "ship", "team"] {
            assert!(registry.resolve(name).is_ok(), "missing builtin '{}'", name);
        }
        let number = registry.resolve("number").unwrap();
        assert_eq!(registry.kind_of(number), Some(ValueKind::Number));
    }

    #[test]
    fn test_codes_are_stable() {
        let mut registry = TypeRegistry::with_builtin_tags();
        let before = registry.resolve("ship").unwrap();
        registry.register("nav-buoy", ValueKind::Opaque).unwrap();
        assert_eq!(registry.resolve("ship").unwrap(), before);
    }
}
