//! Dynamic Operator Table
//!
//! Registry mapping opcodes to operator definitions and their bound
//! handlers. Opcodes are assigned by the expression language's symbol table
//! and treated here as an injected identity.
//!
//! # Design
//!
//! A definition is registered first (usually straight from the table
//! parse); the scripting runtime binds its handler later, once script code
//! actually declares one. Rebinding replaces the handler only, never the
//! definition's arity/type contract. The table is an explicit context
//! object owned by the scripting environment's lifecycle: created at
//! environment start, dropped at teardown, mutated only between dispatches.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::operator::OperatorDefinition;
use crate::value::ScriptValue;

/// Opcode assigned to an operator name by the symbol table.
pub type Opcode = u32;

/// Result type for handler invocations: the runtime's return list, or a
/// runtime-side error message.
pub type HandlerResult = Result<Vec<ScriptValue>, String>;

/// Shared callable supplied by a binding technology.
pub type HandlerFn = Arc<dyn Fn(&[ScriptValue]) -> HandlerResult + Send + Sync>;

/// Which binding technology supplied a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Authored in the embedded scripting runtime.
    Script,
    /// In-process Rust function.
    Native,
}

/// A handler bound to one operator definition.
///
/// One variant per binding technology; both share the same call signature,
/// so dispatch never branches on the kind. The kind exists for the
/// narrowing query ("is this opcode bound to a script handler").
#[derive(Clone)]
pub enum Handler {
    Script(HandlerFn),
    Native(HandlerFn),
}

impl Handler {
    /// Wrap a scripting-runtime callable.
    pub fn script<F>(f: F) -> Self
    where
        F: Fn(&[ScriptValue]) -> HandlerResult + Send + Sync + 'static,
    {
        Handler::Script(Arc::new(f))
    }

    /// Wrap a native Rust function.
    pub fn native<F>(f: F) -> Self
    where
        F: Fn(&[ScriptValue]) -> HandlerResult + Send + Sync + 'static,
    {
        Handler::Native(Arc::new(f))
    }

    /// The binding technology behind this handler.
    pub fn kind(&self) -> HandlerKind {
        match self {
            Handler::Script(_) => HandlerKind::Script,
            Handler::Native(_) => HandlerKind::Native,
        }
    }

    pub(crate) fn invoke(&self, args: &[ScriptValue]) -> HandlerResult {
        match self {
            Handler::Script(f) | Handler::Native(f) => f(args),
        }
    }
}

impl fmt::Debug for Handler {
    // Closures have no useful Debug; show only the kind.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.kind()).finish()
    }
}

/// Error type for table registration and rebinding
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryError {
    /// Opcode already bound to a definition
    DuplicateOperator { opcode: Opcode, name: String },
    /// Rebind or lookup of an unregistered opcode
    NotFound(Opcode),
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::DuplicateOperator { opcode, name } => {
                write!(f, "opcode {} is already registered (as '{}')", opcode, name)
            }
            RegistryError::NotFound(opcode) => {
                write!(f, "opcode {} is not registered", opcode)
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// Table entry: the immutable definition plus its (rebindable) handler.
struct TableEntry {
    definition: OperatorDefinition,
    handler: Option<Handler>,
}

/// Process-wide table of dynamically registered operators, keyed by opcode.
pub struct OperatorTable {
    entries: HashMap<Opcode, TableEntry>,
}

impl fmt::Debug for OperatorTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorTable")
            .field("operator_count", &self.entries.len())
            .field(
                "names",
                &self
                    .entries
                    .values()
                    .map(|e| e.definition.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorTable {
    /// Create a new empty table
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a definition under an opcode, with no handler bound yet.
    pub fn register(
        &mut self,
        opcode: Opcode,
        definition: OperatorDefinition,
    ) -> Result<(), RegistryError> {
        if let Some(existing) = self.entries.get(&opcode) {
            return Err(RegistryError::DuplicateOperator {
                opcode,
                name: existing.definition.name().to_string(),
            });
        }
        self.entries.insert(
            opcode,
            TableEntry {
                definition,
                handler: None,
            },
        );
        Ok(())
    }

    /// Register a definition and bind its handler in one step.
    pub fn register_with_handler(
        &mut self,
        opcode: Opcode,
        definition: OperatorDefinition,
        handler: Handler,
    ) -> Result<(), RegistryError> {
        self.register(opcode, definition)?;
        // Entry was just inserted.
        if let Some(entry) = self.entries.get_mut(&opcode) {
            entry.handler = Some(handler);
        }
        Ok(())
    }

    /// Look up the definition registered under an opcode.
    pub fn lookup(&self, opcode: Opcode) -> Option<&OperatorDefinition> {
        self.entries.get(&opcode).map(|e| &e.definition)
    }

    /// Bind (or replace) the handler of a registered opcode.
    ///
    /// The definition's contract is unchanged by rebinding. Failing here
    /// means the binding layer is using an opcode it never registered,
    /// which is a coding error rather than bad content.
    pub fn bind_handler(&mut self, opcode: Opcode, handler: Handler) -> Result<(), RegistryError> {
        match self.entries.get_mut(&opcode) {
            Some(entry) => {
                entry.handler = Some(handler);
                Ok(())
            }
            None => {
                debug_assert!(false, "bind_handler on unregistered opcode {}", opcode);
                Err(RegistryError::NotFound(opcode))
            }
        }
    }

    /// Replace the handler of a registered opcode. Alias of
    /// [`bind_handler`](Self::bind_handler), named for the runtime-facing
    /// rebind path.
    pub fn rebind_handler(
        &mut self,
        opcode: Opcode,
        handler: Handler,
    ) -> Result<(), RegistryError> {
        self.bind_handler(opcode, handler)
    }

    /// Narrowing query: which handler family is bound under this opcode,
    /// if any.
    pub fn handler_kind(&self, opcode: Opcode) -> Option<HandlerKind> {
        self.entries
            .get(&opcode)?
            .handler
            .as_ref()
            .map(|h| h.kind())
    }

    /// Definition and handler together, for dispatch.
    pub(crate) fn entry(&self, opcode: Opcode) -> Option<(&OperatorDefinition, Option<&Handler>)> {
        self.entries
            .get(&opcode)
            .map(|e| (&e.definition, e.handler.as_ref()))
    }

    /// Get the number of registered operators
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::OperatorDefinition;

    fn noop_def(name: &str) -> OperatorDefinition {
        OperatorDefinition::new(name, "Change", "", "", vec![], vec![], None)
    }

    #[test]
    fn test_register_and_lookup() {
        let mut table = OperatorTable::new();
        table.register(100, noop_def("do-nothing")).unwrap();
        assert_eq!(table.lookup(100).unwrap().name(), "do-nothing");
        assert_eq!(table.lookup(101), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicate_opcode_rejected() {
        let mut table = OperatorTable::new();
        table.register(100, noop_def("first")).unwrap();
        let err = table.register(100, noop_def("second")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateOperator {
                opcode: 100,
                name: "first".to_string(),
            }
        );
        // The original binding is untouched.
        assert_eq!(table.lookup(100).unwrap().name(), "first");
    }

    #[test]
    fn test_handler_kind_narrowing() {
        let mut table = OperatorTable::new();
        table
            .register_with_handler(1, noop_def("scripted"), Handler::script(|_| Ok(vec![])))
            .unwrap();
        table.register(2, noop_def("unbound")).unwrap();

        assert_eq!(table.handler_kind(1), Some(HandlerKind::Script));
        assert_eq!(table.handler_kind(2), None);
        assert_eq!(table.handler_kind(3), None);

        table
            .bind_handler(2, Handler::native(|_| Ok(vec![])))
            .unwrap();
        assert_eq!(table.handler_kind(2), Some(HandlerKind::Native));
    }

    #[test]
    fn test_rebind_replaces_handler_only() {
        let mut table = OperatorTable::new();
        table
            .register_with_handler(7, noop_def("stable"), Handler::script(|_| Ok(vec![])))
            .unwrap();
        let before = table.lookup(7).unwrap().clone();

        table
            .rebind_handler(7, Handler::native(|_| Ok(vec![])))
            .unwrap();

        let after = table.lookup(7).unwrap();
        assert_eq!(after.name(), before.name());
        assert_eq!(after.min_args(), before.min_args());
        assert_eq!(after.max_args(), before.max_args());
        assert_eq!(table.handler_kind(7), Some(HandlerKind::Native));
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_rebind_unknown_opcode_fails() {
        let mut table = OperatorTable::new();
        let err = table
            .rebind_handler(9, Handler::script(|_| Ok(vec![])))
            .unwrap_err();
        assert_eq!(err, RegistryError::NotFound(9));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "unregistered opcode")]
    fn test_rebind_unknown_opcode_asserts_in_debug() {
        let mut table = OperatorTable::new();
        let _ = table.rebind_handler(9, Handler::script(|_| Ok(vec![])));
    }
}
