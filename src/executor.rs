//! The evaluation driver.
//!
//! [`Executor::execute`] walks an [`Expr`] bottom-up: leaves are resolved from
//! the [`Scope`], every other node has its arguments prepared and is handed to
//! the rule the [`Registry`] selects for them. Argument preparation per kind:
//!
//! | kind           | arguments                                      |
//! |----------------|------------------------------------------------|
//! | `ArrayLength`  | `[eval(arg)]`                                  |
//! | `ArrayIndex`   | `[eval(arg), Int(index)]`                      |
//! | `Array`        | `[Exprs(items)]`                               |
//! | `ArrayConcat`  | `[Exprs(items)]`                               |
//! | `ArrayCollect` | `[eval(arg), eval(filter)]` or `[.., Absent]`  |
//!
//! Tuple-shaped nodes pass their children unevaluated; their rules evaluate
//! them through the [`Session`] they receive.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::aggregate::AggContext;
use crate::dispatch::Registry;
use crate::error::{Error, Result};
use crate::expr::{Expr, OpKind};
use crate::runner::{ExecConfig, Runner};
use crate::value::{Arg, Scalar, Value};

/// Column bindings visible to [`Expr::Column`] leaves.
#[derive(Clone, Debug, Default)]
pub struct Scope {
    columns: HashMap<String, Value>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.columns.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.bind(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.get(name)
    }
}

/// Evaluates expressions against a registry of rules.
#[derive(Clone, Debug)]
pub struct Executor {
    registry: Arc<Registry>,
    runner: Runner,
}

impl Executor {
    /// Executor with the built-in array rules.
    pub fn new(config: &ExecConfig) -> Result<Self> {
        Ok(Self::with_registry(
            Arc::new(Registry::with_array_rules()?),
            Runner::from_config(config)?,
        ))
    }

    pub fn with_registry(registry: Arc<Registry>, runner: Runner) -> Self {
        Self { registry, runner }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Evaluate `expr` with `scope` bindings, running aggregates in `aggcontext`.
    pub fn execute(
        &self,
        expr: &Expr,
        scope: &Scope,
        aggcontext: Option<&dyn AggContext>,
    ) -> Result<Value> {
        Session {
            executor: self,
            scope,
            aggcontext,
        }
        .execute(expr)
    }
}

/// Per-evaluation state handed to rules.
///
/// Rules use it to evaluate child expressions they received unevaluated, to
/// re-dispatch on evaluated arguments, and to reach the runner and the
/// aggregation context.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    executor: &'a Executor,
    scope: &'a Scope,
    aggcontext: Option<&'a dyn AggContext>,
}

impl<'a> Session<'a> {
    pub fn runner(&self) -> &'a Runner {
        &self.executor.runner
    }

    pub fn aggcontext(&self, kind: OpKind) -> Result<&'a dyn AggContext> {
        self.aggcontext.ok_or(Error::MissingAggContext { kind })
    }

    pub fn execute(&self, expr: &Expr) -> Result<Value> {
        let (kind, args) = match expr {
            Expr::Column(name) => {
                return self
                    .scope
                    .get(name)
                    .cloned()
                    .ok_or_else(|| Error::UnknownColumn(name.clone()));
            }
            Expr::Literal(s) => return Ok(Value::Scalar(s.clone())),
            Expr::ArrayLength(arg) => (OpKind::ArrayLength, vec![self.execute(arg)?.into()]),
            Expr::ArrayIndex { arg, index } => (
                OpKind::ArrayIndex,
                vec![self.execute(arg)?.into(), Arg::Scalar(Scalar::Int(*index))],
            ),
            Expr::Array(items) => (OpKind::Array, vec![Arg::Exprs(items.clone())]),
            Expr::ArrayConcat(items) => (OpKind::ArrayConcat, vec![Arg::Exprs(items.clone())]),
            Expr::ArrayCollect { arg, filter } => {
                let filter = match filter {
                    Some(f) => self.execute(f)?.into(),
                    None => Arg::Absent,
                };
                (OpKind::ArrayCollect, vec![self.execute(arg)?.into(), filter])
            }
        };
        self.dispatch(kind, args)
    }

    /// Resolve and run the rule for `kind` on already prepared arguments.
    pub fn dispatch(&self, kind: OpKind, args: Vec<Arg>) -> Result<Value> {
        let tags: Vec<_> = args.iter().map(Arg::tag).collect();
        let rule = self.executor.registry.resolve(kind, &tags)?;
        trace!(%kind, args = tags.len(), "dispatching");
        rule(self, args)
    }
}
