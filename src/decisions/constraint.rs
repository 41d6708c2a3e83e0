//! Generation hints attached to a target.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// A bag of generation hints for one type-in-context.
///
/// Absent fields mean "use the default", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    /// Probability that a nullable target is generated as null.
    #[serde(rename = "nullProb", default, skip_serializing_if = "Option::is_none")]
    pub null_prob: Option<f64>,

    /// Numeric hint for the value generator: `P(true)` for booleans, probability
    /// of a boundary draw for numbers and text.
    #[serde(rename = "prob", default, skip_serializing_if = "Option::is_none")]
    pub prob: Option<f64>,
}

impl Constraint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_null_prob(mut self, p: f64) -> Self {
        self.null_prob = Some(p);
        self
    }

    pub fn with_prob(mut self, p: f64) -> Self {
        self.prob = Some(p);
        self
    }

    /// Whether every hint is unset.
    pub fn is_unset(&self) -> bool {
        self.null_prob.is_none() && self.prob.is_none()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_probability("nullProb", self.null_prob)?;
        check_probability("prob", self.prob)
    }
}

fn check_probability(field: &'static str, value: Option<f64>) -> ConfigResult<()> {
    match value {
        Some(p) if !(0.0..=1.0).contains(&p) => Err(ConfigError::InvalidProbability { field, value: p }),
        _ => Ok(()),
    }
}
