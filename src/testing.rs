//! Testing utilities for array evaluation.
//!
//! This module provides helpers for writing concise tests against the rules
//! and the driver:
//!
//! - **Fixtures**: build scalars and partitioned columns from plain Rust values
//! - **Assertions**: compare column rows, per-partition contents and multisets
//!   with readable failure messages
//!
//! # Quick Start
//!
//! ```
//! use arrayflow::*;
//! use arrayflow::testing::*;
//!
//! # fn main() -> arrayflow::Result<()> {
//! let exec = Executor::new(&ExecConfig::sequential())?;
//! let scope = Scope::new().with("xs", int_column(vec![vec![1, 2], vec![3]]));
//!
//! let out = exec.execute(&Expr::col("xs").collect(), &scope, Some(&Summarize))?;
//! assert_scalar_eq(&out, &Scalar::from(vec![1i64, 2, 3]));
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
