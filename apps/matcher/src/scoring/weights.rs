use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analyzers::Dimension;
use crate::errors::ConfigError;

/// Allowed distance of the weight sum from 1.0.
pub const WEIGHT_TOLERANCE: f64 = 0.01;

/// Per-dimension weights of the final score. Validated once at configuration
/// time; the aggregator trusts them afterwards.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Weights {
    pub skills: f64,
    pub location: f64,
    pub experience: f64,
    pub preferences: f64,
    pub education: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            skills: 0.30,
            location: 0.15,
            experience: 0.25,
            preferences: 0.10,
            education: 0.20,
        }
    }
}

impl Weights {
    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Skills => self.skills,
            Dimension::Location => self.location,
            Dimension::Experience => self.experience,
            Dimension::Preferences => self.preferences,
            Dimension::Education => self.education,
        }
    }

    pub fn sum(&self) -> f64 {
        Dimension::ALL.iter().map(|d| self.get(*d)).sum()
    }

    /// Rejects negative weights and sums outside 1.0 ± `WEIGHT_TOLERANCE`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for dimension in Dimension::ALL {
            let value = self.get(dimension);
            if value < 0.0 || !value.is_finite() {
                return Err(ConfigError::NegativeWeight {
                    name: dimension.name().to_string(),
                    value,
                });
            }
        }

        let total = self.sum();
        if (total - 1.0).abs() >= WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSum { total });
        }
        Ok(())
    }

    /// `{"skills_weight": .., ...}` as recorded alongside each aggregation.
    pub fn to_map(&self) -> Map<String, Value> {
        Dimension::ALL
            .iter()
            .map(|d| (format!("{}_weight", d.name()), Value::from(self.get(*d))))
            .collect()
    }
}
