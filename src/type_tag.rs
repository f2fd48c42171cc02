//! Runtime type tags and the argument patterns built from them.
//!
//! This module provides:
//! - [`ArgTag`]: a lightweight identifier for the concrete runtime shape of one
//!   argument (a scalar variant, a partitioned column, a grouped column, an
//!   unevaluated expression tuple, or an omitted argument).
//! - [`Slot`]: what one position of a rule's signature accepts, either an exact
//!   tag or one of a few supertypes.
//! - [`Pattern`]: an ordered list of slots with an optional variadic tail.
//!
//! The registry matches a node's argument tags against patterns and ranks the
//! matches by [`Pattern::specificity`], so no reflection is involved at
//! dispatch time.

use std::fmt;

/// Concrete runtime shape of one argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArgTag {
    Null,
    Bool,
    Int,
    Float,
    Str,
    Array,
    Partitioned,
    Grouped,
    Exprs,
    Absent,
}

impl ArgTag {
    /// `true` for every tag produced by a [`Scalar`](crate::Scalar).
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            ArgTag::Null | ArgTag::Bool | ArgTag::Int | ArgTag::Float | ArgTag::Str | ArgTag::Array
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ArgTag::Null => "null",
            ArgTag::Bool => "bool",
            ArgTag::Int => "int",
            ArgTag::Float => "float",
            ArgTag::Str => "str",
            ArgTag::Array => "array",
            ArgTag::Partitioned => "partitioned",
            ArgTag::Grouped => "grouped",
            ArgTag::Exprs => "exprs",
            ArgTag::Absent => "absent",
        }
    }
}

impl fmt::Display for ArgTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One position in a rule signature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Exactly this tag.
    Is(ArgTag),
    /// Any scalar.
    Scalar,
    /// Any scalar or a partitioned column.
    Columnar,
    /// Anything at all.
    Any,
}

impl Slot {
    pub fn accepts(self, tag: ArgTag) -> bool {
        match self {
            Slot::Is(t) => t == tag,
            Slot::Scalar => tag.is_scalar(),
            Slot::Columnar => tag.is_scalar() || tag == ArgTag::Partitioned,
            Slot::Any => true,
        }
    }

    /// Exact slots are the only ones that do not widen a pattern.
    fn is_wildcard(self) -> bool {
        !matches!(self, Slot::Is(_))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Is(t) => write!(f, "{t}"),
            Slot::Scalar => f.write_str("<scalar>"),
            Slot::Columnar => f.write_str("<columnar>"),
            Slot::Any => f.write_str("_"),
        }
    }
}

/// A rule signature: fixed leading slots, optionally followed by a variadic
/// slot that absorbs any number (including zero) of trailing arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern {
    slots: Vec<Slot>,
    rest: Option<Slot>,
}

impl Pattern {
    /// Fixed-arity pattern.
    pub fn new(slots: impl Into<Vec<Slot>>) -> Self {
        Self {
            slots: slots.into(),
            rest: None,
        }
    }

    /// Pattern accepting any number of arguments matching `slot`.
    pub fn variadic(slot: Slot) -> Self {
        Self {
            slots: Vec::new(),
            rest: Some(slot),
        }
    }

    /// Shorthand for a fixed pattern of exact tags.
    pub fn exact(tags: &[ArgTag]) -> Self {
        Self::new(tags.iter().copied().map(Slot::Is).collect::<Vec<_>>())
    }

    pub fn matches(&self, tags: &[ArgTag]) -> bool {
        if tags.len() < self.slots.len() {
            return false;
        }
        if self.rest.is_none() && tags.len() != self.slots.len() {
            return false;
        }
        let (head, tail) = tags.split_at(self.slots.len());
        let head_ok = self.slots.iter().zip(head).all(|(s, t)| s.accepts(*t));
        head_ok
            && match self.rest {
                Some(slot) => tail.iter().all(|t| slot.accepts(*t)),
                None => true,
            }
    }

    /// Number of widening positions; lower means more specific.
    pub fn specificity(&self) -> usize {
        self.slots.iter().filter(|s| s.is_wildcard()).count() + usize::from(self.rest.is_some())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        let mut first = true;
        for slot in &self.slots {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{slot}")?;
        }
        if let Some(rest) = self.rest {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{rest}...")?;
        }
        f.write_str(")")
    }
}

/// Render argument tags the way error messages show them.
pub fn signature(tags: &[ArgTag]) -> String {
    tags.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
}
