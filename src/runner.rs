//! Execution configuration and the partition-parallel work loop.
//!
//! A [`Runner`] is the only place that decides whether per-partition work runs
//! in order on the calling thread or fans out over Rayon. Rules describe work
//! as "do `f` for partition `i`" and the runner collects results back in
//! partition order, so output never depends on the mode.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::partitioned::PartitionedValue;
use crate::value::Scalar;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    Sequential,
    Parallel {
        #[serde(default)]
        threads: Option<usize>,
    },
}

impl Default for ExecMode {
    fn default() -> Self {
        ExecMode::Parallel { threads: None }
    }
}

/// Runtime settings.
///
/// ```
/// use arrayflow::{ExecConfig, ExecMode};
///
/// let cfg = ExecConfig::from_json(r#"{ "mode": "sequential", "default_partitions": 4 }"#)?;
/// assert_eq!(cfg.mode, ExecMode::Sequential);
/// assert_eq!(cfg.default_partitions, 4);
/// # Ok::<_, arrayflow::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    #[serde(default)]
    pub mode: ExecMode,
    /// Partition count used when splitting plain row vectors.
    #[serde(default = "default_partitions")]
    pub default_partitions: usize,
}

fn default_partitions() -> usize {
    2 * num_cpus::get().max(2)
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            mode: ExecMode::default(),
            default_partitions: default_partitions(),
        }
    }
}

impl ExecConfig {
    pub fn sequential() -> Self {
        Self {
            mode: ExecMode::Sequential,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> Result<Self> {
        let cfg: ExecConfig = serde_json::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_partitions == 0 {
            return Err(Error::InvalidConfig(
                "default_partitions must be at least 1".into(),
            ));
        }
        if let ExecMode::Parallel { threads: Some(0) } = self.mode {
            return Err(Error::InvalidConfig("threads must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Runner {
    pub mode: ExecMode,
    pub default_partitions: usize,
}

impl Default for Runner {
    fn default() -> Self {
        let cfg = ExecConfig::default();
        Self {
            mode: cfg.mode,
            default_partitions: cfg.default_partitions,
        }
    }
}

impl Runner {
    pub fn from_config(cfg: &ExecConfig) -> Result<Self> {
        cfg.validate()?;
        if let ExecMode::Parallel { threads: Some(t) } = cfg.mode {
            // ok() to ignore "already built" when several runners are created
            rayon::ThreadPoolBuilder::new()
                .num_threads(t)
                .build_global()
                .ok();
        }
        Ok(Self {
            mode: cfg.mode,
            default_partitions: cfg.default_partitions,
        })
    }

    pub fn sequential() -> Self {
        Self {
            mode: ExecMode::Sequential,
            default_partitions: 1,
        }
    }

    /// Run `f` for every partition index in `0..n`, returning results in index order.
    pub fn run_indexed<R, F>(&self, n: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Send + Sync,
    {
        match self.mode {
            ExecMode::Sequential => (0..n).map(f).collect(),
            ExecMode::Parallel { .. } => (0..n).into_par_iter().map(f).collect(),
        }
    }

    /// Split plain rows into `default_partitions` partitions.
    pub fn partition(&self, rows: Vec<Scalar>) -> PartitionedValue {
        PartitionedValue::from_rows(rows, self.default_partitions)
    }
}
