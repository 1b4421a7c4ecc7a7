//! Per-institution DebtRank: shock each institution alone and score the
//! loss it causes the rest of the network.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::DebtRankResult;
use crate::solver::DebtRankSolver;
use crate::shock::Shock;

/// Systemic impact of one institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionRank {
    pub institution: usize,
    pub debt_rank: f64,
    pub iterations: usize,
    pub converged: bool,
}

fn rank_one(
    solver: &DebtRankSolver,
    institution: usize,
    magnitude: f64,
) -> DebtRankResult<InstitutionRank> {
    let report = solver.run(&Shock::single(institution, magnitude))?;
    Ok(InstitutionRank {
        institution,
        debt_rank: report.debt_rank,
        iterations: report.iterations,
        converged: report.converged,
    })
}

/// Run one independent simulation per institution, shocking it by `magnitude`.
///
/// Sorted by descending score; ties keep institution order.
pub fn rank_institutions(
    solver: &DebtRankSolver,
    magnitude: f64,
) -> DebtRankResult<Vec<InstitutionRank>> {
    let n = solver.network().institutions();

    #[cfg(feature = "parallel")]
    let mut ranks = (0..n)
        .into_par_iter()
        .map(|i| rank_one(solver, i, magnitude))
        .collect::<DebtRankResult<Vec<_>>>()?;

    #[cfg(not(feature = "parallel"))]
    let mut ranks = (0..n)
        .map(|i| rank_one(solver, i, magnitude))
        .collect::<DebtRankResult<Vec<_>>>()?;

    ranks.sort_by(|a, b| {
        b.debt_rank
            .total_cmp(&a.debt_rank)
            .then(a.institution.cmp(&b.institution))
    });

    let unconverged = ranks.iter().filter(|r| !r.converged).count();
    info!(
        "Ranked {} institutions ({} did not converge)",
        ranks.len(),
        unconverged
    );

    Ok(ranks)
}
