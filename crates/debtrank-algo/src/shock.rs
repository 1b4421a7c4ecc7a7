//! Institution states and initial shocks.

use crate::error::{DebtRankError, DebtRankResult};
use debtrank_core::{BinaryOp, UnaryOp, Vector, DISTRESSED, INACTIVE, UNDISTRESSED};
use serde::{Deserialize, Serialize};

/// Distress state of an institution.
///
/// States only move forward: `Undistressed → Distressed → Inactive`.
/// `Inactive` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionState {
    Undistressed,
    Distressed,
    Inactive,
}

impl InstitutionState {
    /// Numeric code used inside state vectors.
    pub fn code(self) -> f64 {
        match self {
            InstitutionState::Undistressed => UNDISTRESSED,
            InstitutionState::Distressed => DISTRESSED,
            InstitutionState::Inactive => INACTIVE,
        }
    }

    pub fn from_code(code: f64) -> Option<Self> {
        if code == UNDISTRESSED {
            Some(InstitutionState::Undistressed)
        } else if code == DISTRESSED {
            Some(InstitutionState::Distressed)
        } else if code == INACTIVE {
            Some(InstitutionState::Inactive)
        } else {
            None
        }
    }

    pub fn is_terminal(self) -> bool {
        self == InstitutionState::Inactive
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstitutionState::Undistressed => "undistressed",
            InstitutionState::Distressed => "distressed",
            InstitutionState::Inactive => "inactive",
        }
    }
}

/// Initial loss applied to the all-zero health baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shock {
    /// `(institution, magnitude)` pairs; repeated institutions add up (capped at 1).
    Sparse(Vec<(usize, f64)>),
    /// One magnitude per institution.
    Dense(Vec<f64>),
}

impl Shock {
    /// No shock at all.
    pub fn none() -> Self {
        Shock::Sparse(Vec::new())
    }

    /// Shock a single institution.
    pub fn single(institution: usize, magnitude: f64) -> Self {
        Shock::Sparse(vec![(institution, magnitude)])
    }

    fn check_magnitude(institution: usize, magnitude: f64) -> DebtRankResult<()> {
        if !magnitude.is_finite() || !(0.0..=1.0).contains(&magnitude) {
            return Err(DebtRankError::InvalidInput(format!(
                "shock magnitude {} at institution {} is outside [0, 1]",
                magnitude, institution
            )));
        }
        Ok(())
    }

    /// Apply the shock to an all-zero health vector of length `institutions`.
    pub fn initial_health(&self, institutions: usize) -> DebtRankResult<Vector> {
        let shock = match self {
            Shock::Sparse(entries) => {
                for &(institution, magnitude) in entries {
                    if institution >= institutions {
                        return Err(DebtRankError::Shape(format!(
                            "shock targets institution {} but the network has {}",
                            institution, institutions
                        )));
                    }
                    Self::check_magnitude(institution, magnitude)?;
                }
                Vector::from_entries(institutions, entries)?
            }
            Shock::Dense(values) => {
                if values.len() != institutions {
                    return Err(DebtRankError::Shape(format!(
                        "dense shock has {} entries but the network has {} institutions",
                        values.len(),
                        institutions
                    )));
                }
                for (institution, &magnitude) in values.iter().enumerate() {
                    Self::check_magnitude(institution, magnitude)?;
                }
                Vector::dense(values.clone())
            }
        };

        let health = Vector::zeros(institutions)
            .ewise_union(&shock, BinaryOp::Plus, None)?
            .apply(UnaryOp::ClampToOne, None)?;
        Ok(health)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes_round_trip() {
        for state in [
            InstitutionState::Undistressed,
            InstitutionState::Distressed,
            InstitutionState::Inactive,
        ] {
            assert_eq!(InstitutionState::from_code(state.code()), Some(state));
        }
        assert_eq!(InstitutionState::from_code(0.5), None);
        assert!(InstitutionState::Inactive.is_terminal());
        assert!(InstitutionState::Undistressed < InstitutionState::Inactive);
    }

    #[test]
    fn test_sparse_shock() {
        let h = Shock::Sparse(vec![(1, 0.5), (1, 0.75), (3, 0.2)])
            .initial_health(4)
            .unwrap();
        assert!(h.is_dense());
        assert_eq!(h.to_dense(0.0), vec![0.0, 1.0, 0.0, 0.2]);
    }

    #[test]
    fn test_dense_shock() {
        let h = Shock::Dense(vec![0.1, 0.0]).initial_health(2).unwrap();
        assert_eq!(h.to_dense(0.0), vec![0.1, 0.0]);
    }

    #[test]
    fn test_empty_shock_is_zero_baseline() {
        let h = Shock::none().initial_health(3).unwrap();
        assert_eq!(h, Vector::zeros(3));
    }

    #[test]
    fn test_shock_validation() {
        assert!(matches!(
            Shock::single(5, 0.5).initial_health(3),
            Err(DebtRankError::Shape(_))
        ));
        assert!(matches!(
            Shock::single(0, 1.5).initial_health(3),
            Err(DebtRankError::InvalidInput(_))
        ));
        assert!(matches!(
            Shock::Dense(vec![0.1, f64::NAN]).initial_health(2),
            Err(DebtRankError::InvalidInput(_))
        ));
        assert!(matches!(
            Shock::Dense(vec![0.1]).initial_health(2),
            Err(DebtRankError::Shape(_))
        ));
    }
}
