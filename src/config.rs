//! Optimizer and rule-chain configuration.
//!
//! Both records deserialize from JSON with every field optional:
//!
//! ```
//! use u_splash::config::OptimizerSpec;
//! use u_splash::logic::RuleKind;
//!
//! let spec = OptimizerSpec::from_json(r#"{
//!     "scorers": [{"name": "SECTIONS_SCHEDULED"}],
//!     "perturbers": [{"name": "GREEDY"}, {"name": "SWAPPING", "temperature_factor": 0.5}],
//!     "n_threads": 2,
//!     "logic": {"rules": ["DUPLICATE_SECTIONS", "ROOM_CONFLICT"]}
//! }"#).unwrap();
//!
//! assert_eq!(spec.n_threads, 2);
//! assert_eq!(spec.steps_per_optimizer_iteration, 1000);
//! assert_eq!(spec.logic.rules, vec![RuleKind::DuplicateSections, RuleKind::RoomConflict]);
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;
use crate::logic::RuleKind;
use crate::models::SerialAssignment;
use crate::optimizer::{ConcurrentConfig, TemperatureKind};
use crate::perturbation::PerturberComponent;
use crate::scoring::ScorerComponent;

/// Rule chain selection and rule parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogicSpec {
    pub rules: Vec<RuleKind>,
    /// Smallest allowed room capacity over course max size.
    pub min_class_cap_ratio: f64,
    /// Largest allowed room capacity over estimated size; absent is unbounded.
    pub max_est_class_size_ratio: Option<f64>,
    /// Pinned placements.
    pub locked: Vec<SerialAssignment>,
    /// Seed for randomized rules. Drawn from entropy when absent.
    pub seed: Option<u64>,
}

impl Default for LogicSpec {
    fn default() -> Self {
        Self {
            rules: RuleKind::DEFAULT_CHAIN.to_vec(),
            min_class_cap_ratio: 1.0,
            max_est_class_size_ratio: None,
            locked: Vec::new(),
            seed: None,
        }
    }
}

impl LogicSpec {
    pub fn max_est_class_size_ratio(&self) -> f64 {
        self.max_est_class_size_ratio.unwrap_or(f64::INFINITY)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_class_cap_ratio > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "min_class_cap_ratio",
                reason: format!("must be positive, got {}", self.min_class_cap_ratio),
            });
        }
        if let Some(max) = self.max_est_class_size_ratio {
            if !(max > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "max_est_class_size_ratio",
                    reason: format!("must be positive, got {max}"),
                });
            }
        }
        Ok(())
    }
}

/// Full optimizer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSpec {
    pub scorers: Vec<ScorerComponent>,
    pub perturbers: Vec<PerturberComponent>,
    /// Drives the round temperature.
    pub primary_temperature: TemperatureKind,
    /// Drives each worker's steps, scaled by the round temperature.
    pub sub_temperature: TemperatureKind,
    pub n_threads: usize,
    pub steps_per_optimizer_iteration: u64,
    pub n_iterations: u64,
    pub iteration_timeout_ms: u64,
    pub no_progress_cancel_ms: u64,
    pub seed: Option<u64>,
    pub logic: LogicSpec,
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        Self {
            scorers: Vec::new(),
            perturbers: Vec::new(),
            primary_temperature: TemperatureKind::Linear,
            sub_temperature: TemperatureKind::Linear,
            n_threads: 4,
            steps_per_optimizer_iteration: 1000,
            n_iterations: 100,
            iteration_timeout_ms: 10_000,
            no_progress_cancel_ms: 1_200_000,
            seed: None,
            logic: LogicSpec::default(),
        }
    }
}

impl OptimizerSpec {
    /// Parses and validates.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let spec: Self = serde_json::from_str(json)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scorers.is_empty() {
            return Err(ConfigError::Empty { role: "scorer" });
        }
        if self.perturbers.is_empty() {
            return Err(ConfigError::Empty { role: "perturber" });
        }
        if self.n_threads == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "n_threads",
                reason: "must be at least 1".into(),
            });
        }
        if self.iteration_timeout_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "iteration_timeout_ms",
                reason: "must be positive".into(),
            });
        }
        if let Some(p) = self.perturbers.iter().find(|p| !p.temperature_factor.is_finite()) {
            return Err(ConfigError::InvalidParameter {
                name: "temperature_factor",
                reason: format!("{:?} has factor {}", p.name, p.temperature_factor),
            });
        }
        self.logic.validate()
    }

    /// Round parameters for the concurrent optimizer.
    pub fn concurrent_config(&self) -> ConcurrentConfig {
        ConcurrentConfig {
            n_threads: self.n_threads,
            steps_per_iteration: self.steps_per_optimizer_iteration,
            iteration_timeout: Duration::from_millis(self.iteration_timeout_ms),
            no_progress_cancel: Duration::from_millis(self.no_progress_cancel_ms),
            seed: self.seed.unwrap_or_else(rand::random),
        }
    }
}
