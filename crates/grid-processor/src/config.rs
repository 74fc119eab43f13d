//! Tunables of the index engine.

use serde::{Deserialize, Serialize};

/// Parameters of index, anomaly and fusion computations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Floor applied to reflectances before taking reciprocals.
    pub epsilon: f32,
    /// Floor applied to the baseline standard deviation.
    pub std_epsilon: f32,
    /// Number of most recent index grids (current included) in the baseline.
    pub baseline_window: usize,
    /// Weight of `tanh(z)` in the bloom score.
    pub anomaly_weight: f32,
    /// Weight of `tanh(gain * delta)` in the bloom score.
    pub change_weight: f32,
    /// Gain applied to delta before `tanh`.
    pub change_gain: f32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            std_epsilon: 1e-6,
            baseline_window: 5,
            anomaly_weight: 0.6,
            change_weight: 0.4,
            change_gain: 5.0,
        }
    }
}

impl IndexConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.epsilon > 0.0) {
            return Err("epsilon must be > 0".to_string());
        }

        if !(self.std_epsilon > 0.0) {
            return Err("std_epsilon must be > 0".to_string());
        }

        if self.baseline_window == 0 {
            return Err("baseline_window must be > 0".to_string());
        }

        if (self.anomaly_weight + self.change_weight - 1.0).abs() > 1e-6 {
            return Err("anomaly_weight + change_weight must equal 1".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        IndexConfig::default().validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_zero_window() {
        let config = IndexConfig {
            baseline_window: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
