//! Named numeric strategy parameters

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping of named numeric parameters owned by a strategy instance
///
/// Mutated only through [`crate::strategy::Strategy::update_params`], never
/// concurrently with signal generation for the same strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams(BTreeMap<String, f64>);

impl StrategyParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Parameter value or a default when absent
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    /// Strictly positive parameter, erroring on malformed values
    pub fn require_positive(&self, name: &str, default: f64) -> Result<f64, EngineError> {
        let value = self.get_or(name, default);
        if !value.is_finite() || value <= 0.0 {
            return Err(EngineError::Configuration(format!(
                "parameter '{name}' must be a positive number, got {value}"
            )));
        }
        Ok(value)
    }

    /// Positive integer parameter (lookback windows and the like)
    pub fn require_window(&self, name: &str, default: usize) -> Result<usize, EngineError> {
        let value = self.get_or(name, default as f64);
        if !value.is_finite() || value < 2.0 || value.fract() != 0.0 {
            return Err(EngineError::Configuration(format!(
                "parameter '{name}' must be an integer >= 2, got {value}"
            )));
        }
        Ok(value as usize)
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.0.insert(name.into(), value);
    }

    /// Overlay `other` onto these parameters
    pub fn merge(&mut self, other: &StrategyParams) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), *v);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, f64>> for StrategyParams {
    fn from(map: BTreeMap<String, f64>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, f64)> for StrategyParams {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
