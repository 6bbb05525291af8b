//! Shared utilities for integration tests: a pre-seeded type registry and
//! helpers to build call nodes without repeating arena plumbing.

use std::sync::Once;

use dynsexp::{ExprArena, NodeId, TypeRegistry};

static INIT: Once = Once::new();

/// Route engine diagnostics to the test output.
fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Registry with the builtin mission-language tags.
pub fn types() -> TypeRegistry {
    init_tracing();
    TypeRegistry::with_builtin_tags()
}

/// Arguments for a call node built through [`call_node`].
pub enum Arg<'a> {
    Number(f64),
    Text(&'a str),
    Handle(u64),
}

/// Build an operator call node whose children are the given arguments.
pub fn call_node(arena: &mut ExprArena, args: &[Arg<'_>]) -> NodeId {
    let children: Vec<NodeId> = args
        .iter()
        .map(|arg| match arg {
            Arg::Number(n) => arena.number(*n),
            Arg::Text(s) => arena.text(*s),
            Arg::Handle(id) => arena.handle(*id),
        })
        .collect();
    arena.list_with(&children)
}
