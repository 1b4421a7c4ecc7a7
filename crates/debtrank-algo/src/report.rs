//! Simulation results.

use crate::error::{DebtRankError, DebtRankResult};
use crate::shock::InstitutionState;
use crate::solver::Propagation;
use debtrank_core::Vector;
use serde::{Deserialize, Serialize};

/// Outcome of one DebtRank run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtRankReport {
    /// Final health per institution
    pub health: Vec<f64>,
    /// Final state per institution
    pub states: Vec<InstitutionState>,
    /// Health right after the shock
    pub initial_health: Vec<f64>,
    /// `v_i * (h_final[i] - h_initial[i])`
    pub contributions: Vec<f64>,
    /// `v·h_final - v·h_initial`
    pub debt_rank: f64,
    /// Iterations executed, including the one that detected convergence
    pub iterations: usize,
    pub converged: bool,
}

impl DebtRankReport {
    /// Score the final propagation against the initial one using weights `v`.
    pub fn assemble(
        loan_fractions: &Vector,
        initial: &Propagation,
        last: &Propagation,
        iterations: usize,
        converged: bool,
    ) -> DebtRankResult<Self> {
        if initial.institutions() != last.institutions() {
            return Err(DebtRankError::Shape(format!(
                "initial propagation has {} institutions, final has {}",
                initial.institutions(),
                last.institutions()
            )));
        }

        let debt_rank =
            loan_fractions.dot(last.health())? - loan_fractions.dot(initial.health())?;

        let health = last.health().to_dense(0.0);
        let initial_health = initial.health().to_dense(0.0);
        let weights = loan_fractions.to_dense(0.0);
        let contributions = weights
            .iter()
            .zip(health.iter().zip(&initial_health))
            .map(|(v, (h, h0))| v * (h - h0))
            .collect();

        Ok(Self {
            health,
            states: last.states(),
            initial_health,
            contributions,
            debt_rank,
            iterations,
            converged,
        })
    }

    pub fn institutions(&self) -> usize {
        self.health.len()
    }

    /// Number of institutions that ended in `state`.
    pub fn count(&self, state: InstitutionState) -> usize {
        self.states.iter().filter(|&&s| s == state).count()
    }

    pub fn summary(&self) -> String {
        format!(
            "DebtRank {:.6} after {} iterations ({}): {} undistressed, {} distressed, {} inactive",
            self.debt_rank,
            self.iterations,
            if self.converged {
                "converged"
            } else {
                "not converged"
            },
            self.count(InstitutionState::Undistressed),
            self.count(InstitutionState::Distressed),
            self.count(InstitutionState::Inactive)
        )
    }

    pub fn to_json(&self) -> DebtRankResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use InstitutionState::{Distressed as D, Inactive as I, Undistressed as U};

    fn report() -> DebtRankReport {
        let v = Vector::dense(vec![0.5, 0.3, 0.2]);
        let initial = Propagation::new(vec![0.0, 0.5, 0.0], vec![U, D, U]).unwrap();
        let last = Propagation::new(vec![0.25, 0.5, 0.125], vec![I, I, U]).unwrap();
        DebtRankReport::assemble(&v, &initial, &last, 3, true).unwrap()
    }

    #[test]
    fn test_assemble_scores_and_contributions() {
        let report = report();
        assert!((report.debt_rank - 0.15).abs() < 1e-12);
        assert_eq!(report.contributions[1], 0.0);

        let total: f64 = report.contributions.iter().sum();
        assert!((total - report.debt_rank).abs() < 1e-12);
    }

    #[test]
    fn test_counts_and_summary() {
        let report = report();
        assert_eq!(report.count(I), 2);
        assert_eq!(report.count(D), 0);

        let summary = report.summary();
        assert!(summary.contains("3 iterations"));
        assert!(summary.contains("2 inactive"));
        assert!(summary.contains("converged"));
    }

    #[test]
    fn test_json_uses_state_names() {
        let json = report().to_json().unwrap();
        assert!(json.contains("\"inactive\""));

        let decoded: DebtRankReport = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.states, vec![I, I, U]);
        assert_eq!(decoded.iterations, 3);
    }

    #[test]
    fn test_assemble_rejects_mismatched_runs() {
        let v = Vector::dense(vec![1.0]);
        let a = Propagation::new(vec![0.0], vec![U]).unwrap();
        let b = Propagation::new(vec![0.0, 0.0], vec![U, U]).unwrap();
        assert!(matches!(
            DebtRankReport::assemble(&v, &a, &b, 1, true),
            Err(DebtRankError::Shape(_))
        ));
    }
}
