//! # debtrank-algo: Systemic Risk Propagation
//!
//! DebtRank measures how much of a financial network's economic value is
//! lost when distress at some institutions spreads through interbank
//! exposures.
//!
//! ## Pipeline
//!
//! 1. [`LoanBook`] collects the loan matrix `L` and capital vector `c`.
//! 2. [`ExposureNetwork`] derives the capped exposure matrix
//!    `W = min(1, L / c)` and the loan-fraction weights `v`.
//! 3. [`DebtRankSolver`] applies a [`Shock`] and iterates the lock-step
//!    health/state update until it converges or hits `max_iter`.
//! 4. [`DebtRankReport`] holds the final health, states and the score
//!    `R = v·h_final - v·h_initial`.
//!
//! [`rank_institutions`] repeats the run once per institution to rank
//! institutions by systemic impact.
//!
//! ## Example
//!
//! ```rust
//! use debtrank_algo::{DebtRankSolver, InstitutionState, LoanBook, Shock, WeightAxis};
//!
//! let book = LoanBook::from_edges(
//!     &[(0, 1, 20.0), (0, 2, 30.0), (1, 0, 40.0), (2, 1, 80.0)],
//!     &[(0, 100.0), (1, 200.0), (2, 300.0)],
//!     None,
//! )?;
//! let network = book.exposure_network(WeightAxis::Lender)?;
//! let solver = DebtRankSolver::with_defaults(network)?;
//!
//! let report = solver.run(&Shock::single(1, 0.5))?;
//! assert!(report.converged);
//! assert!(report.debt_rank > 0.0);
//! assert_eq!(report.count(InstitutionState::Undistressed), 0);
//! # Ok::<(), debtrank_algo::DebtRankError>(())
//! ```
//!
//! ## Configuration
//!
//! [`DebtRankConfig`] can be loaded from TOML; the propagation semiring is
//! looked up by name in a [`debtrank_core::OperatorRegistry`].
//!
//! ## Logging
//!
//! The solver emits `tracing` events (per-iteration `debug`, `info` on
//! convergence, `warn` when `max_iter` is reached). Install a subscriber to
//! see them.

pub mod config;
pub mod error;
pub mod exposure;
pub mod ranking;
pub mod report;
pub mod shock;
pub mod solver;

pub use config::{DebtRankConfig, WeightAxis};
pub use error::{DebtRankError, DebtRankResult};
pub use exposure::{exposure_matrix, loan_fractions, ExposureNetwork, LoanBook};
pub use ranking::{rank_institutions, InstitutionRank};
pub use report::DebtRankReport;
pub use shock::{InstitutionState, Shock};
pub use solver::{DebtRankSolver, Propagation};
