//! dynsexp - Dynamic Operator Engine
//!
//! This library is the extensibility layer of an s-expression mission
//! scripting language: it lets content authors declare new expression-tree
//! operators in a data table, bind them to handlers supplied by an embedded
//! scripting runtime, and have them dispatched during expression evaluation
//! with full argument marshaling and tri-valued result encoding, all
//! without recompiling the host.
//!
//! # Architecture
//!
//! The engine sits between three value representations: the expression
//! tree's node-based arguments, the expression language's tri-valued result
//! encoding, and the embedded runtime's values.
//!
//! 1. **Type tags** (`types`) - symbolic type names resolved to stable
//!    internal codes with a marshaling kind.
//! 2. **Operator definitions** (`operator`, `parse`) - immutable per-operator
//!    contracts (arity bounds, static argument types, a cyclically repeating
//!    vararg tail, return type), built by a table-driven parse.
//! 3. **Operator table** (`registry`) - opcode-keyed registry of definitions
//!    and their rebindable handlers, owned by the scripting environment.
//! 4. **Dispatch** (`dispatch`, `bridge`, `tree`) - per-evaluation
//!    orchestration: arity check, positional type resolution, node-to-runtime
//!    marshaling, handler invocation, and result marshaling back into the
//!    tri-valued domain. Failures degrade to safe defaults with diagnostics;
//!    a bad operator never crashes the simulation.
//!
//! # Example
//!
//! ```rust
//! use dynsexp::{
//!     Dispatcher, ExprArena, Handler, OperatorTable, ScriptValue, SexpResult, TypeRegistry,
//!     parse_operator_table,
//! };
//!
//! let types = TypeRegistry::with_builtin_tags();
//!
//! let table_source = r#"
//! $Operator: echo-number
//! $Category: Status
//! $Parameter:
//!   +Description: value
//!   +Type: number
//! $Return Type: number
//! $End Operator
//! "#;
//!
//! let report = parse_operator_table(table_source, &types);
//! assert!(report.failures.is_empty());
//!
//! let mut table = OperatorTable::new();
//! for (opcode, def) in report.definitions.into_iter().enumerate() {
//!     table.register(opcode as u32, def).unwrap();
//! }
//! table
//!     .bind_handler(0, Handler::script(|args| Ok(args.to_vec())))
//!     .unwrap();
//!
//! let mut arena = ExprArena::new();
//! let arg = arena.number(42.0);
//! let call = arena.list_with(&[arg]);
//!
//! let outcome = Dispatcher::new(&table, &types).dispatch(&arena, 0, call);
//! assert_eq!(outcome.result, SexpResult::Number(42.0));
//! ```
//!
//! # Concurrency
//!
//! Evaluation is single-threaded and cooperative: dispatch is synchronous,
//! holds no mutable state, and may re-enter itself when a handler triggers
//! further evaluation. The operator table is mutated only between
//! dispatches.

pub mod bridge;
pub mod dispatch;
pub mod operator;
pub mod parse;
pub mod registry;
pub mod tree;
pub mod types;
pub mod value;

pub use bridge::{marshal_argument, marshal_return, safe_default, BridgeError};
pub use dispatch::{DispatchError, DispatchOutcome, Dispatcher};
pub use operator::{ArgSpec, OperatorDefinition};
pub use parse::{parse_operator_table, TableError, TableLoadReport};
pub use registry::{Handler, HandlerKind, Opcode, OperatorTable, RegistryError};
pub use tree::{ExprArena, ExprNodes, NodeId};
pub use types::{TypeCode, TypeError, TypeRegistry, ValueKind};
pub use value::{ScriptValue, SexpResult};
