//! Lock-step DebtRank propagation.
//!
//! Each iteration reads only the previous health `h` and states `s`:
//!
//! ```text
//! impact = W ⊕.⊗ h
//! h'     = min(1, h + impact)                      where s != Inactive
//! s'     = max(threshold_state(h), distressed_inactive(s), s)
//! ```
//!
//! Every institution's health feeds the product, but only institutions that
//! are not yet inactive absorb it. A distressed institution retires as
//! inactive one iteration later. The loop stops when `h' ≈ h` and
//! `s' == s`, or after `max_iter` iterations.

use crate::config::DebtRankConfig;
use crate::error::{DebtRankError, DebtRankResult};
use crate::exposure::{ExposureNetwork, LoanBook};
use crate::report::DebtRankReport;
use crate::shock::{InstitutionState, Shock};
use debtrank_core::{
    BinaryOp, OperatorRegistry, SelectOp, Semiring, UnaryOp, Vector, INACTIVE, UNDISTRESSED,
};
use tracing::{debug, info, warn};

/// Health and state vectors at one point of a propagation.
///
/// Both vectors are dense; states hold the numeric codes of
/// [`InstitutionState`].
#[derive(Debug, Clone, PartialEq)]
pub struct Propagation {
    health: Vector,
    states: Vector,
}

impl Propagation {
    pub fn new(health: Vec<f64>, states: Vec<InstitutionState>) -> DebtRankResult<Self> {
        let codes = states.into_iter().map(InstitutionState::code).collect();
        Self::from_vectors(Vector::dense(health), Vector::dense(codes))
    }

    /// Absent health reads as `0.0`, absent states as undistressed.
    pub fn from_vectors(health: Vector, states: Vector) -> DebtRankResult<Self> {
        if health.len() != states.len() {
            return Err(DebtRankError::Shape(format!(
                "health has {} entries but states have {}",
                health.len(),
                states.len()
            )));
        }
        if let Some((i, h)) = health
            .iter()
            .find(|(_, h)| !h.is_finite() || !(0.0..=1.0).contains(h))
        {
            return Err(DebtRankError::InvalidInput(format!(
                "health {} of institution {} is outside [0, 1]",
                h, i
            )));
        }
        if let Some((i, code)) = states
            .iter()
            .find(|(_, code)| InstitutionState::from_code(*code).is_none())
        {
            return Err(DebtRankError::InvalidInput(format!(
                "institution {} has unknown state code {}",
                i, code
            )));
        }

        Ok(Self {
            health: Vector::dense(health.to_dense(0.0)),
            states: Vector::dense(states.to_dense(UNDISTRESSED)),
        })
    }

    pub fn health(&self) -> &Vector {
        &self.health
    }

    /// State codes as stored.
    pub fn state_codes(&self) -> &Vector {
        &self.states
    }

    pub fn states(&self) -> Vec<InstitutionState> {
        self.states
            .iter()
            .map(|(_, code)| {
                InstitutionState::from_code(code).unwrap_or(InstitutionState::Undistressed)
            })
            .collect()
    }

    pub fn institutions(&self) -> usize {
        self.health.len()
    }

    /// Number of institutions in `state`.
    pub fn count(&self, state: InstitutionState) -> usize {
        let code = state.code();
        self.states.iter().filter(|(_, c)| *c == code).count()
    }
}

/// DebtRank solver bound to one exposure network.
#[derive(Debug, Clone)]
pub struct DebtRankSolver {
    network: ExposureNetwork,
    config: DebtRankConfig,
    semiring: Semiring,
    clamp: UnaryOp,
    threshold: UnaryOp,
    retire: UnaryOp,
}

impl DebtRankSolver {
    /// Resolve the configured semiring and update operators from `registry`.
    pub fn new(
        network: ExposureNetwork,
        config: DebtRankConfig,
        registry: &OperatorRegistry,
    ) -> DebtRankResult<Self> {
        config.validate()?;

        let mut semiring = registry.semiring(&config.semiring)?;
        if let Some(beta) = config.decay {
            if !matches!(semiring.multiply(), BinaryOp::DecayedPlus { .. }) {
                return Err(DebtRankError::Configuration(format!(
                    "decay {} set but semiring '{}' has no damping factor",
                    beta, config.semiring
                )));
            }
            semiring = semiring.with_decay(beta);
        }
        if semiring.add().identity() != 0.0 {
            return Err(DebtRankError::Configuration(format!(
                "semiring '{}' has additive identity {}; propagation needs 0",
                config.semiring,
                semiring.add().identity()
            )));
        }
        if semiring.multiply().is_fallible() {
            return Err(DebtRankError::Configuration(format!(
                "semiring '{}' multiplies with the fallible operator '{}'",
                config.semiring,
                semiring.multiply().as_str()
            )));
        }

        Ok(Self {
            clamp: registry.unary("min_one")?,
            threshold: registry.unary("threshold_state")?,
            retire: registry.unary("distressed_inactive")?,
            network,
            config,
            semiring,
        })
    }

    /// Solver with the default configuration and registry.
    pub fn with_defaults(network: ExposureNetwork) -> DebtRankResult<Self> {
        Self::new(
            network,
            DebtRankConfig::default(),
            &OperatorRegistry::with_defaults(),
        )
    }

    /// Build the network from `book` using the configured weight axis.
    pub fn from_loan_book(
        book: &LoanBook,
        config: DebtRankConfig,
        registry: &OperatorRegistry,
    ) -> DebtRankResult<Self> {
        let network = book.exposure_network(config.weight_axis)?;
        Self::new(network, config, registry)
    }

    pub fn network(&self) -> &ExposureNetwork {
        &self.network
    }

    pub fn config(&self) -> &DebtRankConfig {
        &self.config
    }

    pub fn semiring(&self) -> Semiring {
        self.semiring
    }

    /// Shock the all-zero baseline and propagate until convergence.
    ///
    /// Shocked institutions start distressed.
    pub fn run(&self, shock: &Shock) -> DebtRankResult<DebtRankReport> {
        let health = shock.initial_health(self.network.institutions())?;
        let states = health.apply(self.threshold, None)?;
        self.run_from(Propagation::from_vectors(health, states)?)
    }

    /// Propagate from explicit initial vectors.
    pub fn run_from(&self, initial: Propagation) -> DebtRankResult<DebtRankReport> {
        self.check_shape(&initial)?;

        let mut current = initial.clone();
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iter {
            let next = self.advance(&current)?;
            iterations += 1;

            let changed = next
                .states
                .iter()
                .zip(current.states.iter())
                .filter(|((_, a), (_, b))| a != b)
                .count();
            debug!(
                "Iteration {}: {} state changes, {} distressed, {} inactive",
                iterations,
                changed,
                next.count(InstitutionState::Distressed),
                next.count(InstitutionState::Inactive)
            );

            let settled = next
                .health
                .is_close(&current.health, 0.0, self.config.tolerance)
                && next.states == current.states;
            current = next;
            if settled {
                converged = true;
                break;
            }
        }

        if converged {
            info!("DebtRank converged after {} iterations", iterations);
        } else {
            warn!(
                "DebtRank stopped at max_iter={} without converging",
                self.config.max_iter
            );
        }

        DebtRankReport::assemble(
            self.network.loan_fractions(),
            &initial,
            &current,
            iterations,
            converged,
        )
    }

    /// One synchronous iteration.
    pub fn step(&self, current: &Propagation) -> DebtRankResult<Propagation> {
        self.check_shape(current)?;
        self.advance(current)
    }

    fn check_shape(&self, propagation: &Propagation) -> DebtRankResult<()> {
        let n = self.network.institutions();
        if propagation.institutions() != n {
            return Err(DebtRankError::Shape(format!(
                "propagation has {} institutions but the network has {}",
                propagation.institutions(),
                n
            )));
        }
        if self.network.loan_fractions().len() != n {
            return Err(DebtRankError::Shape(format!(
                "loan-fraction vector has {} entries but the network has {}",
                self.network.loan_fractions().len(),
                n
            )));
        }
        Ok(())
    }

    fn advance(&self, current: &Propagation) -> DebtRankResult<Propagation> {
        let h = &current.health;
        let s = &current.states;

        let impact = self.network.exposure().mat_vec(h, &self.semiring)?;

        let active = s.select(SelectOp::Ne(INACTIVE));
        let health = h
            .ewise_union(&impact, BinaryOp::Plus, Some(&active))?
            .apply(self.clamp, Some(&active))?;

        let states = h
            .apply(self.threshold, None)?
            .ewise_union(&s.apply(self.retire, None)?, BinaryOp::Max, None)?
            .ewise_union(s, BinaryOp::Max, None)?;

        Ok(Propagation { health, states })
    }
}
