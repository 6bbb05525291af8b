//! Table-driven operator definition parsing.
//!
//! Reads the authoring-time declaration stream and produces validated
//! [`OperatorDefinition`]s. The format is line-oriented:
//!
//! ```text
//! $Operator: send-to-ships
//! $Category: Change
//! $Subcategory: Messaging
//! $Description: Sends a message to each listed ship after a delay.
//! $Parameter:
//!   +Description: message
//!   +Type: message
//! $Repeat
//! $Parameter:
//!   +Description: ship
//!   +Type: ship
//! $Parameter:
//!   +Description: delay
//!   +Type: number
//! $End Repeat
//! $Return Type: none
//! $End Operator
//! ```
//!
//! `$Parameter` blocks before `$Repeat` form the fixed-arity prefix (a
//! trailing parameter may carry `+Optional: true`); blocks between
//! `$Repeat` and `$End Repeat` form the cyclic vararg pattern. Keys are
//! case-insensitive; `;` starts a comment.
//!
//! An error in one declaration is fatal to that operator only: the loader
//! skips to the next `$Operator:` line and keeps going, so one authoring
//! mistake never suppresses the rest of the table. Validation is decoupled
//! from activation; registering the resulting definitions into an
//! [`OperatorTable`](crate::registry::OperatorTable) is a separate step.

use std::fmt;

use itertools::Itertools;
use tracing::{trace, warn};

use crate::operator::{ArgSpec, OperatorDefinition};
use crate::types::TypeRegistry;

/// Error type for one failed operator declaration
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    /// A declared type name is not in the type tag registry
    UnknownType { operator: String, type_name: String },
    /// A `$Repeat` block was opened but never closed, or was empty
    MalformedVarargBlock { operator: String },
    /// A required field is missing from a declaration
    MissingField {
        operator: String,
        field: &'static str,
    },
    /// A line could not be understood in its context
    MalformedDeclaration {
        operator: String,
        line: usize,
        detail: String,
    },
}

impl TableError {
    /// The operator the failure belongs to.
    pub fn operator(&self) -> &str {
        match self {
            TableError::UnknownType { operator, .. }
            | TableError::MalformedVarargBlock { operator }
            | TableError::MissingField { operator, .. }
            | TableError::MalformedDeclaration { operator, .. } => operator,
        }
    }
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::UnknownType {
                operator,
                type_name,
            } => write!(
                f,
                "operator '{}': unknown type tag '{}'",
                operator, type_name
            ),
            TableError::MalformedVarargBlock { operator } => write!(
                f,
                "operator '{}': $Repeat block is empty or missing $End Repeat",
                operator
            ),
            TableError::MissingField { operator, field } => {
                write!(f, "operator '{}': missing {}", operator, field)
            }
            TableError::MalformedDeclaration {
                operator,
                line,
                detail,
            } => write!(f, "operator '{}': line {}: {}", operator, line, detail),
        }
    }
}

impl std::error::Error for TableError {}

/// Outcome of one table load: every definition that parsed, and every
/// declaration that failed.
#[derive(Debug, Default)]
pub struct TableLoadReport {
    pub definitions: Vec<OperatorDefinition>,
    pub failures: Vec<TableError>,
}

impl TableLoadReport {
    /// One-line summary naming every failed operator, or `None` if the
    /// whole table loaded.
    pub fn summary(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let names = self
            .failures
            .iter()
            .map(|e| e.operator())
            .join(", ");
        Some(format!(
            "{} operator declaration(s) failed to load: {}",
            self.failures.len(),
            names
        ))
    }
}

/// Parse a whole declaration stream.
///
/// Failures are per-operator; see [`TableLoadReport`].
pub fn parse_operator_table(source: &str, types: &TypeRegistry) -> TableLoadReport {
    let mut reader = TableReader::new(source);
    let mut report = TableLoadReport::default();

    while reader.skip_to_operator() {
        match parse_one_operator(&mut reader, types) {
            Ok(def) => {
                trace!(operator = def.name(), "loaded operator definition");
                report.definitions.push(def);
            }
            Err(err) => {
                warn!(error = %err, "operator declaration failed to load");
                report.failures.push(err);
                reader.skip_past_operator_body();
            }
        }
    }

    if let Some(summary) = report.summary() {
        warn!("{}", summary);
    }
    report
}

/// A parsed `$Parameter` block, before type resolution.
struct RawParameter {
    label: String,
    type_name: String,
    optional: bool,
    /// Source line of the `$Parameter:` marker, for diagnostics.
    line: usize,
}

fn parse_one_operator(
    reader: &mut TableReader<'_>,
    types: &TypeRegistry,
) -> Result<OperatorDefinition, TableError> {
    let name = match reader.take_value("$Operator:") {
        Some(name) if !name.is_empty() => name,
        _ => {
            return Err(TableError::MissingField {
                operator: "<unnamed>".to_string(),
                field: "$Operator:",
            })
        }
    };

    let mut category = String::new();
    let mut subcategory = String::new();
    let mut description = String::new();
    let mut static_params: Vec<RawParameter> = Vec::new();
    let mut vararg_params: Vec<RawParameter> = Vec::new();
    let mut return_type_name: Option<String> = None;

    loop {
        // The block ends at its terminator, at the next declaration, or at
        // the end of the stream.
        if reader.at_key("$Operator:") || reader.at_end() {
            break;
        }
        if reader.take_marker("$End Operator") {
            break;
        }

        if let Some(value) = reader.take_value("$Category:") {
            category = value;
        } else if let Some(value) = reader.take_value("$Subcategory:") {
            subcategory = value;
        } else if let Some(value) = reader.take_value("$Description:") {
            description = value;
        } else if reader.take_marker("$Parameter:") {
            // The static prefix must be closed once a vararg block exists;
            // positions past it can only follow the cyclic pattern.
            if !vararg_params.is_empty() {
                let (line, _) = reader.previous().unwrap_or((0, ""));
                return Err(TableError::MalformedDeclaration {
                    operator: name,
                    line,
                    detail: "$Parameter after $End Repeat".to_string(),
                });
            }
            static_params.push(parse_parameter(reader, &name)?);
        } else if reader.take_marker("$Repeat") {
            if !vararg_params.is_empty() {
                let (line, _) = reader.previous().unwrap_or((0, ""));
                return Err(TableError::MalformedDeclaration {
                    operator: name,
                    line,
                    detail: "more than one $Repeat block".to_string(),
                });
            }
            vararg_params = parse_vararg_block(reader, &name)?;
        } else if let Some(value) = reader.take_value("$Return Type:") {
            return_type_name = Some(value);
        } else {
            let (line, text) = reader.current().unwrap_or((0, ""));
            return Err(TableError::MalformedDeclaration {
                operator: name,
                line,
                detail: format!("unexpected '{}'", text),
            });
        }
    }

    // Required parameters may not follow optional ones; the arity floor is
    // always a prefix count.
    let mut optional_seen = false;
    for param in &static_params {
        if param.optional {
            optional_seen = true;
        } else if optional_seen {
            return Err(TableError::MalformedDeclaration {
                operator: name,
                line: param.line,
                detail: format!(
                    "required parameter '{}' follows an optional parameter",
                    param.label
                ),
            });
        }
    }

    let static_args = resolve_params(&static_params, &name, types)?;
    let vararg_pattern = resolve_params(&vararg_params, &name, types)?;

    let return_type = match return_type_name.as_deref() {
        None => None,
        Some(value) if value.eq_ignore_ascii_case("none") => None,
        Some(value) if value.eq_ignore_ascii_case("nothing") => None,
        Some(value) => Some(types.resolve(value).map_err(|_| TableError::UnknownType {
            operator: name.clone(),
            type_name: value.to_string(),
        })?),
    };

    Ok(OperatorDefinition::new(
        name,
        category,
        subcategory,
        description,
        static_args,
        vararg_pattern,
        return_type,
    ))
}

fn parse_parameter(
    reader: &mut TableReader<'_>,
    operator: &str,
) -> Result<RawParameter, TableError> {
    // The caller just consumed the `$Parameter:` marker.
    let marker_line = reader.previous().map(|(line, _)| line).unwrap_or(0);
    let mut label: Option<String> = None;
    let mut type_name: Option<String> = None;
    let mut optional = false;

    loop {
        if let Some(value) = reader.take_value("+Description:") {
            label = Some(value);
        } else if let Some(value) = reader.take_value("+Type:") {
            type_name = Some(value);
        } else if let Some(value) = reader.take_value("+Optional:") {
            optional = match value.to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => {
                    let (line, _) = reader.previous().unwrap_or((0, ""));
                    return Err(TableError::MalformedDeclaration {
                        operator: operator.to_string(),
                        line,
                        detail: format!("+Optional: expects true or false, got '{}'", value),
                    });
                }
            };
        } else {
            break;
        }
    }

    let type_name = type_name.ok_or(TableError::MissingField {
        operator: operator.to_string(),
        field: "+Type:",
    })?;
    // The description doubles as the positional label; fall back to the
    // type name when authors omit it.
    let label = label.unwrap_or_else(|| type_name.clone());

    Ok(RawParameter {
        label,
        type_name,
        optional,
        line: marker_line,
    })
}

fn parse_vararg_block(
    reader: &mut TableReader<'_>,
    operator: &str,
) -> Result<Vec<RawParameter>, TableError> {
    let mut params = Vec::new();

    loop {
        if reader.take_marker("$End Repeat") {
            break;
        }
        // Hitting the end of the operator (or the stream) before the block
        // closes is a fatal authoring error for this declaration.
        if reader.at_end() || reader.at_key("$Operator:") || reader.at_key("$End Operator") {
            return Err(TableError::MalformedVarargBlock {
                operator: operator.to_string(),
            });
        }
        if reader.take_marker("$Parameter:") {
            let param = parse_parameter(reader, operator)?;
            if param.optional {
                let (line, _) = reader.previous().unwrap_or((0, ""));
                return Err(TableError::MalformedDeclaration {
                    operator: operator.to_string(),
                    line,
                    detail: "+Optional is not meaningful inside $Repeat".to_string(),
                });
            }
            params.push(param);
        } else {
            let (line, text) = reader.current().unwrap_or((0, ""));
            return Err(TableError::MalformedDeclaration {
                operator: operator.to_string(),
                line,
                detail: format!("unexpected '{}' inside $Repeat", text),
            });
        }
    }

    if params.is_empty() {
        return Err(TableError::MalformedVarargBlock {
            operator: operator.to_string(),
        });
    }
    Ok(params)
}

fn resolve_params(
    params: &[RawParameter],
    operator: &str,
    types: &TypeRegistry,
) -> Result<Vec<ArgSpec>, TableError> {
    params
        .iter()
        .map(|p| {
            let ty = types
                .resolve(&p.type_name)
                .map_err(|_| TableError::UnknownType {
                    operator: operator.to_string(),
                    type_name: p.type_name.clone(),
                })?;
            Ok(if p.optional {
                ArgSpec::optional(p.label.clone(), ty)
            } else {
                ArgSpec::required(p.label.clone(), ty)
            })
        })
        .collect()
}

/// Line cursor over the declaration stream. Comments (`;` to end of line)
/// and blank lines are stripped up front; original line numbers are kept
/// for diagnostics.
struct TableReader<'a> {
    lines: Vec<(usize, &'a str)>,
    pos: usize,
}

impl<'a> TableReader<'a> {
    fn new(source: &'a str) -> Self {
        let lines = source
            .lines()
            .enumerate()
            .filter_map(|(idx, raw)| {
                let text = match raw.find(';') {
                    Some(cut) => &raw[..cut],
                    None => raw,
                };
                let text = text.trim();
                if text.is_empty() {
                    None
                } else {
                    Some((idx + 1, text))
                }
            })
            .collect();
        Self { lines, pos: 0 }
    }

    fn current(&self) -> Option<(usize, &'a str)> {
        self.lines.get(self.pos).copied()
    }

    fn previous(&self) -> Option<(usize, &'a str)> {
        self.pos
            .checked_sub(1)
            .and_then(|p| self.lines.get(p).copied())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.lines.len()
    }

    /// Does the current line start with this key (case-insensitive)?
    fn at_key(&self, key: &str) -> bool {
        match self.current() {
            Some((_, text)) => text
                .get(..key.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(key)),
            None => false,
        }
    }

    /// Consume a `Key: value` line, returning the trimmed value.
    fn take_value(&mut self, key: &str) -> Option<String> {
        if !self.at_key(key) {
            return None;
        }
        let (_, text) = self.current()?;
        let value = text[key.len()..].trim().to_string();
        self.pos += 1;
        Some(value)
    }

    /// Consume a bare marker line (exact match, case-insensitive).
    fn take_marker(&mut self, key: &str) -> bool {
        match self.current() {
            Some((_, text)) if text.eq_ignore_ascii_case(key) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Advance to the next `$Operator:` line. Returns false at stream end.
    fn skip_to_operator(&mut self) -> bool {
        while !self.at_end() && !self.at_key("$Operator:") {
            self.pos += 1;
        }
        !self.at_end()
    }

    /// Error recovery: step past the current line, then advance to the next
    /// `$Operator:` declaration. A failure may already have stopped at the
    /// next declaration, which must not be consumed.
    fn skip_past_operator_body(&mut self) {
        if self.at_key("$Operator:") {
            return;
        }
        if !self.at_end() {
            self.pos += 1;
        }
        self.skip_to_operator();
    }
}
