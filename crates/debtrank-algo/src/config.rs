//! Solver configuration.
//!
//! Every field has a default, so a TOML file only needs the settings it
//! changes:
//!
//! ```toml
//! max_iter = 250
//! semiring = "plus_decayed"
//! decay = 0.5
//! weight_axis = "borrower"
//! ```

use crate::error::{DebtRankError, DebtRankResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Axis of the loan matrix used for the loan-fraction weights.
///
/// `L[i][j]` is the amount institution `j` lent to institution `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightAxis {
    /// Column sums: each institution's share of total lending.
    #[default]
    Lender,
    /// Row sums: each institution's share of total borrowing.
    Borrower,
}

/// DebtRank solver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtRankConfig {
    /// Hard cap on iterations; reaching it is not an error
    pub max_iter: usize,
    /// Absolute tolerance of the health convergence check
    pub tolerance: f64,
    /// Registry name of the propagation semiring
    pub semiring: String,
    /// Damping factor for decayed semirings
    pub decay: Option<f64>,
    /// Axis used for loan-fraction weights
    pub weight_axis: WeightAxis,
}

impl Default for DebtRankConfig {
    fn default() -> Self {
        Self {
            max_iter: 100,
            tolerance: 1e-9,
            semiring: "plus_times".to_string(),
            decay: None,
            weight_axis: WeightAxis::Lender,
        }
    }
}

impl DebtRankConfig {
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_semiring(mut self, name: impl Into<String>) -> Self {
        self.semiring = name.into();
        self
    }

    pub fn with_decay(mut self, beta: f64) -> Self {
        self.decay = Some(beta);
        self
    }

    pub fn with_weight_axis(mut self, axis: WeightAxis) -> Self {
        self.weight_axis = axis;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(input: &str) -> DebtRankResult<Self> {
        let config: DebtRankConfig = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> DebtRankResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> DebtRankResult<()> {
        if self.max_iter == 0 {
            return Err(DebtRankError::Configuration(
                "max_iter must be at least 1".to_string(),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(DebtRankError::Configuration(format!(
                "tolerance must be a non-negative finite number, got {}",
                self.tolerance
            )));
        }
        if let Some(beta) = self.decay {
            if !(0.0..=1.0).contains(&beta) {
                return Err(DebtRankError::Configuration(format!(
                    "decay must lie in [0, 1], got {}",
                    beta
                )));
            }
        }
        if self.semiring.trim().is_empty() {
            return Err(DebtRankError::Configuration(
                "semiring name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
