//! The dispatch registry.
//!
//! Rules are keyed by `(OpKind, Pattern)`. Resolving a node takes its kind and
//! the [`ArgTag`]s of its runtime arguments and picks the matching pattern
//! with the fewest wildcard slots. Registration stays open for the lifetime of
//! the registry, so callers can add rules for new argument shapes without
//! touching the built-in ones.
//!
//! Resolutions are cached per `(kind, tags)`; any registration clears the
//! cache.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::executor::Session;
use crate::expr::OpKind;
use crate::type_tag::{signature, ArgTag, Pattern};
use crate::value::{Arg, Value};

/// An evaluation rule: evaluated (or deferred) arguments in, one value out.
pub type Rule = Arc<dyn Fn(&Session<'_>, Vec<Arg>) -> Result<Value> + Send + Sync>;

struct Entry {
    pattern: Pattern,
    rule: Rule,
}

/// Mapping from `(kind, argument pattern)` to an evaluation rule.
#[derive(Default)]
pub struct Registry {
    rules: RwLock<HashMap<OpKind, Vec<Entry>>>,
    cache: RwLock<HashMap<(OpKind, Vec<ArgTag>), Rule>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self
            .rules
            .read()
            .map(|m| m.values().map(Vec::len).sum::<usize>())
            .unwrap_or_default();
        f.debug_struct("Registry").field("rules", &count).finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in array rules.
    pub fn with_array_rules() -> Result<Self> {
        let registry = Self::new();
        crate::arrays::register(&registry)?;
        Ok(registry)
    }

    /// Add a rule for `kind` applying to arguments matching `pattern`.
    ///
    /// Fails with [`Error::DuplicateRule`] if the identical pattern is already
    /// registered for `kind`.
    pub fn register<F>(&self, kind: OpKind, pattern: Pattern, rule: F) -> Result<()>
    where
        F: Fn(&Session<'_>, Vec<Arg>) -> Result<Value> + Send + Sync + 'static,
    {
        let mut rules = self.rules.write().expect("dispatch registry lock poisoned");
        let entries = rules.entry(kind).or_default();
        if entries.iter().any(|e| e.pattern == pattern) {
            return Err(Error::DuplicateRule {
                kind,
                pattern: pattern.to_string(),
            });
        }
        debug!(%kind, %pattern, "registering rule");
        entries.push(Entry {
            pattern,
            rule: Arc::new(rule),
        });
        self.cache
            .write()
            .expect("dispatch cache lock poisoned")
            .clear();
        Ok(())
    }

    /// Select the most specific rule for `kind` applied to arguments tagged `tags`.
    pub fn resolve(&self, kind: OpKind, tags: &[ArgTag]) -> Result<Rule> {
        let key = (kind, tags.to_vec());
        if let Some(rule) = self
            .cache
            .read()
            .expect("dispatch cache lock poisoned")
            .get(&key)
        {
            trace!(%kind, args = %signature(tags), "dispatch cache hit");
            return Ok(Arc::clone(rule));
        }

        let rule = {
            let rules = self.rules.read().expect("dispatch registry lock poisoned");
            let matching: Vec<&Entry> = rules
                .get(&kind)
                .map(|entries| entries.iter().filter(|e| e.pattern.matches(tags)).collect())
                .unwrap_or_default();
            let Some(best) = matching.iter().map(|e| e.pattern.specificity()).min() else {
                return Err(Error::Dispatch {
                    kind,
                    signature: signature(tags),
                });
            };
            let winners: Vec<&&Entry> = matching
                .iter()
                .filter(|e| e.pattern.specificity() == best)
                .collect();
            if winners.len() > 1 {
                return Err(Error::AmbiguousDispatch {
                    kind,
                    signature: signature(tags),
                    candidates: winners.len(),
                });
            }
            debug!(%kind, args = %signature(tags), pattern = %winners[0].pattern, "resolved rule");
            Arc::clone(&winners[0].rule)
        };

        self.cache
            .write()
            .expect("dispatch cache lock poisoned")
            .insert(key, Arc::clone(&rule));
        Ok(rule)
    }

    /// Patterns registered for `kind`, in registration order.
    pub fn patterns(&self, kind: OpKind) -> Vec<Pattern> {
        self.rules
            .read()
            .expect("dispatch registry lock poisoned")
            .get(&kind)
            .map(|entries| entries.iter().map(|e| e.pattern.clone()).collect())
            .unwrap_or_default()
    }

    /// Total number of registered rules.
    pub fn len(&self) -> usize {
        self.rules
            .read()
            .expect("dispatch registry lock poisoned")
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::type_tag::Slot;
    use crate::value::Scalar;

    fn constant(n: i64) -> impl Fn(&Session<'_>, Vec<Arg>) -> Result<Value> + Send + Sync {
        move |_: &Session<'_>, _: Vec<Arg>| Ok(Value::Scalar(Scalar::Int(n)))
    }

    #[test]
    fn unknown_shape_is_a_dispatch_error() {
        let r = Registry::new();
        r.register(OpKind::ArrayLength, Pattern::exact(&[ArgTag::Partitioned]), constant(1))
            .unwrap();
        let err = r.resolve(OpKind::ArrayLength, &[ArgTag::Grouped]).err().unwrap();
        assert!(matches!(err, Error::Dispatch { kind: OpKind::ArrayLength, .. }));
        let err = r.resolve(OpKind::ArrayIndex, &[ArgTag::Partitioned]).err().unwrap();
        assert!(matches!(err, Error::Dispatch { kind: OpKind::ArrayIndex, .. }));
    }

    #[test]
    fn duplicate_pattern_rejected() {
        let r = Registry::new();
        let p = Pattern::exact(&[ArgTag::Partitioned]);
        r.register(OpKind::ArrayLength, p.clone(), constant(1)).unwrap();
        let err = r.register(OpKind::ArrayLength, p, constant(2)).unwrap_err();
        assert!(matches!(err, Error::DuplicateRule { .. }));
        assert_eq!(r.len(), 1);
    }

    #[test]
    fn equal_specificity_overlap_is_ambiguous() {
        let r = Registry::new();
        r.register(
            OpKind::ArrayIndex,
            Pattern::new(vec![Slot::Any, Slot::Is(ArgTag::Int)]),
            constant(1),
        )
        .unwrap();
        r.register(
            OpKind::ArrayIndex,
            Pattern::new(vec![Slot::Is(ArgTag::Partitioned), Slot::Any]),
            constant(2),
        )
        .unwrap();
        let err = r
            .resolve(OpKind::ArrayIndex, &[ArgTag::Partitioned, ArgTag::Int])
            .err()
            .unwrap();
        assert!(matches!(err, Error::AmbiguousDispatch { candidates: 2, .. }));
        // Only one of them covers this shape.
        assert!(r.resolve(OpKind::ArrayIndex, &[ArgTag::Str, ArgTag::Int]).is_ok());
    }

    #[test]
    fn resolution_is_cached_and_reset_on_register() {
        let r = Registry::new();
        r.register(OpKind::ArrayLength, Pattern::new(vec![Slot::Any]), constant(1))
            .unwrap();
        let a = r.resolve(OpKind::ArrayLength, &[ArgTag::Partitioned]).unwrap();
        let b = r.resolve(OpKind::ArrayLength, &[ArgTag::Partitioned]).unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        r.register(
            OpKind::ArrayLength,
            Pattern::exact(&[ArgTag::Partitioned]),
            constant(2),
        )
        .unwrap();
        let c = r.resolve(OpKind::ArrayLength, &[ArgTag::Partitioned]).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(r.patterns(OpKind::ArrayLength).len(), 2);
    }
}
