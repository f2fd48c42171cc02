//! Error taxonomy for dispatch and array evaluation.
//!
//! Every fatal condition surfaces as an [`Error`] and propagates straight to
//! the caller of [`Executor::execute`](crate::Executor::execute). Per-row
//! conditions (an out-of-bounds index, a missing array) are never errors;
//! they degrade to [`Scalar::Null`](crate::Scalar::Null) in the affected row.

use thiserror::Error;

use crate::expr::OpKind;
use crate::type_tag::ArgTag;

/// Unified error type for registry, driver and rule failures.
#[derive(Debug, Error)]
pub enum Error {
    /// No registered pattern for `kind` accepts the runtime argument tags.
    #[error("no rule registered for {kind} with arguments ({signature})")]
    Dispatch { kind: OpKind, signature: String },

    /// Two or more equally specific patterns accept the same arguments.
    ///
    /// Patterns registered for one kind are expected to be disjoint at each
    /// specificity level; hitting this means the registry is misconfigured.
    #[error("ambiguous dispatch for {kind} with arguments ({signature}): {candidates} candidates")]
    AmbiguousDispatch {
        kind: OpKind,
        signature: String,
        candidates: usize,
    },

    /// The exact same pattern was registered twice for one kind.
    #[error("a rule for {kind} with pattern {pattern} is already registered")]
    DuplicateRule { kind: OpKind, pattern: String },

    /// Broadcast reconciliation found no partitioned operand to take a shape from.
    #[error("cannot determine a target shape for {kind}: no partitioned operand")]
    EmptyOperand { kind: OpKind },

    /// Operands that must be combined row-wise disagree on length.
    #[error("shape mismatch in {kind}: expected {expected} rows, found {found}")]
    ShapeMismatch {
        kind: OpKind,
        expected: usize,
        found: usize,
    },

    /// A grouping key column does not line up with the grouped data.
    #[error("grouping keys cover {found} rows but the data has {expected}")]
    KeyLengthMismatch { expected: usize, found: usize },

    /// A rule received an argument shape its pattern does not cover.
    #[error("{kind} cannot take a {found} operand")]
    UnexpectedOperand { kind: OpKind, found: ArgTag },

    /// A column leaf names nothing bound in the current scope.
    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    /// An ungrouped aggregate was evaluated without an aggregation context.
    #[error("{kind} requires an aggregation context")]
    MissingAggContext { kind: OpKind },

    /// Invalid runtime configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text that is not valid JSON for the expected shape.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
