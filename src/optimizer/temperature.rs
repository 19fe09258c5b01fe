//! Cooling schedules.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::TemperatureFunction;

/// Named cooling schedules, from 1 down toward 0 over `total` steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemperatureKind {
    /// `(n - 1 - s) / n`: reaches 0 on the last step.
    #[default]
    Linear,
    /// `(n - s) / n`: never reaches 0.
    LinearInclusive,
    /// `((n - s) / n)^2`
    Quadratic,
}

impl TemperatureFunction for TemperatureKind {
    fn temperature(&self, step: u64, total: u64) -> f64 {
        if total == 0 {
            return 0.0;
        }
        let n = total as f64;
        let s = step.min(total) as f64;
        match self {
            TemperatureKind::Linear => ((n - 1.0 - s) / n).max(0.0),
            TemperatureKind::LinearInclusive => (n - s) / n,
            TemperatureKind::Quadratic => ((n - s) / n).powi(2),
        }
    }
}

/// Multiplies another schedule by a constant.
#[derive(Debug, Clone)]
pub struct ScaledTemperature {
    inner: Arc<dyn TemperatureFunction>,
    factor: f64,
}

impl ScaledTemperature {
    pub fn new(inner: Arc<dyn TemperatureFunction>, factor: f64) -> Self {
        Self { inner, factor }
    }
}

impl TemperatureFunction for ScaledTemperature {
    fn temperature(&self, step: u64, total: u64) -> f64 {
        self.factor * self.inner.temperature(step, total)
    }
}
