//! Operator definitions and positional argument binding.
//!
//! An [`OperatorDefinition`] is the immutable contract of one dynamically
//! registered operator: arity bounds, the ordered static argument list, the
//! cyclic vararg tail pattern, and the return type. It is built once by the
//! table parser, registered into the operator table, and never mutated.
//!
//! Positional type resolution (`type_for_position`) covers both regions of
//! the argument list: the static prefix by direct lookup, and everything
//! past it by cycling through the vararg pattern. The cyclic rule lets one
//! block describe a repeating group (e.g. "ship, delay" pairs) rather than
//! a single repeating scalar.

use crate::types::TypeCode;

/// One declared argument position: authoring label, resolved type, and
/// whether the position counts toward the arity floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    label: String,
    ty: TypeCode,
    required: bool,
}

impl ArgSpec {
    /// A required argument position.
    pub fn required(label: impl Into<String>, ty: TypeCode) -> Self {
        Self {
            label: label.into(),
            ty,
            required: true,
        }
    }

    /// A trailing optional argument position (present in the static list,
    /// excluded from the arity floor).
    pub fn optional(label: impl Into<String>, ty: TypeCode) -> Self {
        Self {
            label: label.into(),
            ty,
            required: false,
        }
    }

    /// The authoring-surface label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The resolved type code.
    pub fn ty(&self) -> TypeCode {
        self.ty
    }

    /// Whether this position counts toward `min_args`.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Immutable contract of one dynamically registered operator.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorDefinition {
    name: String,
    category: String,
    subcategory: String,
    description: String,

    min_args: usize,
    /// `None` means an unbounded vararg tail.
    max_args: Option<usize>,

    static_args: Vec<ArgSpec>,
    vararg_pattern: Vec<ArgSpec>,

    /// `None` means the operator produces no value.
    return_type: Option<TypeCode>,
}

impl OperatorDefinition {
    /// Build a definition from its declared parts.
    ///
    /// `min_args` is computed as the count of leading required static
    /// arguments; `max_args` is the static length when there is no vararg
    /// pattern and unbounded otherwise.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        subcategory: impl Into<String>,
        description: impl Into<String>,
        static_args: Vec<ArgSpec>,
        vararg_pattern: Vec<ArgSpec>,
        return_type: Option<TypeCode>,
    ) -> Self {
        let min_args = static_args.iter().take_while(|a| a.is_required()).count();
        let max_args = if vararg_pattern.is_empty() {
            Some(static_args.len())
        } else {
            None
        };

        Self {
            name: name.into(),
            category: category.into(),
            subcategory: subcategory.into(),
            description: description.into(),
            min_args,
            max_args,
            static_args,
            vararg_pattern,
            return_type,
        }
    }

    /// The operator's unique name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Authoring-tool category. Not used by evaluation.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Authoring-tool subcategory. Not used by evaluation.
    pub fn subcategory(&self) -> &str {
        &self.subcategory
    }

    /// Authoring-tool help text.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Arity floor.
    pub fn min_args(&self) -> usize {
        self.min_args
    }

    /// Arity ceiling; `None` when a vararg tail accepts any count.
    pub fn max_args(&self) -> Option<usize> {
        self.max_args
    }

    /// The fixed leading argument positions.
    pub fn static_args(&self) -> &[ArgSpec] {
        &self.static_args
    }

    /// The cyclically repeating tail pattern (may be empty).
    pub fn vararg_pattern(&self) -> &[ArgSpec] {
        &self.vararg_pattern
    }

    /// Declared return type; `None` means no value.
    pub fn return_type(&self) -> Option<TypeCode> {
        self.return_type
    }

    /// Resolve the argument spec that governs a concrete position.
    ///
    /// Positions inside the static prefix resolve directly; positions past
    /// it cycle through the vararg pattern. Returns `None` only for a
    /// position past the prefix of an operator with no vararg pattern,
    /// which the arity check must already have rejected.
    pub fn spec_for_position(&self, index: usize) -> Option<&ArgSpec> {
        if index < self.static_args.len() {
            return Some(&self.static_args[index]);
        }
        if self.vararg_pattern.is_empty() {
            return None;
        }
        let offset = index - self.static_args.len();
        Some(&self.vararg_pattern[offset % self.vararg_pattern.len()])
    }

    /// Resolve the type that applies to a concrete argument position.
    pub fn type_for_position(&self, index: usize) -> Option<TypeCode> {
        self.spec_for_position(index).map(|spec| spec.ty())
    }
}
