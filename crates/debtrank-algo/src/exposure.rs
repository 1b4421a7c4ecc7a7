//! Exposure network (W) and loan-fraction weights (v).
//!
//! The loan matrix `L[i][j]` holds the amount institution `j` (creditor,
//! column) lent to institution `i` (debtor, row). From it:
//! ```text
//! W[i,j] = min(1, L[i,j] / c_j)           for every stored L[i,j]
//! v_j    = Σ_i L[i,j] / Σ_{i,j} L[i,j]     (lender axis, default)
//! v_i    = Σ_j L[i,j] / Σ_{i,j} L[i,j]     (borrower axis)
//! ```
//!
//! Both are computed once and never mutated afterwards.

use crate::config::WeightAxis;
use crate::error::{DebtRankError, DebtRankResult};
use debtrank_core::{BinaryOp, Monoid, SparseMatrix, UnaryOp, Vector};
use std::collections::HashSet;
use tracing::debug;

/// Raw inputs: loan matrix and capital vector.
#[derive(Debug, Clone)]
pub struct LoanBook {
    loans: SparseMatrix,
    capital: Vector,
}

impl LoanBook {
    /// Build from `(from, to, exposure)` edges and `(institution, capital)` pairs.
    ///
    /// Each edge adds `exposure` to `L[from][to]`; repeated edges add up.
    /// Each institution may list its capital at most once.
    /// The institution count is `max index + 1` unless `institutions` is given.
    pub fn from_edges(
        edges: &[(usize, usize, f64)],
        capitals: &[(usize, f64)],
        institutions: Option<usize>,
    ) -> DebtRankResult<Self> {
        if let Some(&(from, to, amount)) = edges
            .iter()
            .find(|(_, _, amount)| !amount.is_finite() || *amount < 0.0)
        {
            return Err(DebtRankError::InvalidInput(format!(
                "exposure {} -> {} must be a non-negative finite amount, got {}",
                from, to, amount
            )));
        }
        if let Some(&(index, capital)) = capitals.iter().find(|(_, c)| !c.is_finite()) {
            return Err(DebtRankError::InvalidInput(format!(
                "capital of institution {} must be finite, got {}",
                index, capital
            )));
        }
        let mut seen = HashSet::with_capacity(capitals.len());
        if let Some(&(index, _)) = capitals.iter().find(|(index, _)| !seen.insert(*index)) {
            return Err(DebtRankError::InvalidInput(format!(
                "capital of institution {} is listed more than once",
                index
            )));
        }

        let n = match institutions {
            Some(n) => n,
            None => edges
                .iter()
                .map(|&(from, to, _)| from.max(to) + 1)
                .chain(capitals.iter().map(|&(index, _)| index + 1))
                .max()
                .unwrap_or(0),
        };

        let loans = SparseMatrix::from_triplets(edges, Some((n, n)))?;
        let capital = Vector::from_entries(n, capitals)?;
        Ok(Self { loans, capital })
    }

    /// Use an already built loan matrix and capital vector.
    pub fn from_parts(loans: SparseMatrix, capital: Vector) -> DebtRankResult<Self> {
        if !loans.is_square() {
            return Err(DebtRankError::Shape(format!(
                "loan matrix must be square, got {}x{}",
                loans.rows(),
                loans.cols()
            )));
        }
        if capital.len() != loans.cols() {
            return Err(DebtRankError::Shape(format!(
                "capital vector has {} entries but the loan matrix has {} columns",
                capital.len(),
                loans.cols()
            )));
        }
        Ok(Self { loans, capital })
    }

    pub fn loans(&self) -> &SparseMatrix {
        &self.loans
    }

    pub fn capital(&self) -> &Vector {
        &self.capital
    }

    /// Number of institutions.
    pub fn institutions(&self) -> usize {
        self.loans.rows()
    }

    pub fn exposure_network(&self, axis: WeightAxis) -> DebtRankResult<ExposureNetwork> {
        ExposureNetwork::build_with_axis(&self.loans, &self.capital, axis)
    }
}

/// `W[i,j] = min(1, L[i,j] / c[j])` over the stored entries of `L`.
///
/// Fails with [`DebtRankError::Division`] when a referenced capital is
/// missing or non-positive.
pub fn exposure_matrix(loans: &SparseMatrix, capital: &Vector) -> DebtRankResult<SparseMatrix> {
    if capital.len() != loans.cols() {
        return Err(DebtRankError::Shape(format!(
            "capital vector has {} entries but the loan matrix has {} columns",
            capital.len(),
            loans.cols()
        )));
    }

    for (_, col, _) in loans.triplets() {
        let c = capital.get(col).unwrap_or(0.0);
        if c <= 0.0 || c.is_nan() {
            return Err(DebtRankError::Division {
                institution: col,
                capital: c,
            });
        }
    }

    let w = loans
        .apply_by_column(BinaryOp::TrueDiv, capital)?
        .apply(UnaryOp::ClampToOne, None)?;
    Ok(w)
}

/// Share of total exposure along `axis`. Sums to one.
pub fn loan_fractions(loans: &SparseMatrix, axis: WeightAxis) -> DebtRankResult<Vector> {
    let sums = match axis {
        WeightAxis::Lender => loans.reduce_cols(Monoid::PLUS),
        WeightAxis::Borrower => loans.reduce_rows(Monoid::PLUS),
    };
    let total = sums.reduce(Monoid::PLUS);
    if total <= 0.0 || !total.is_finite() {
        return Err(DebtRankError::DegenerateNetwork);
    }
    Ok(sums.apply_binary(BinaryOp::TrueDiv, total, None)?)
}

/// Normalized exposure matrix with its loan-fraction weights.
#[derive(Debug, Clone)]
pub struct ExposureNetwork {
    exposure: SparseMatrix,
    loan_fractions: Vector,
    axis: WeightAxis,
}

impl ExposureNetwork {
    /// Build with lender-axis weights.
    pub fn build(loans: &SparseMatrix, capital: &Vector) -> DebtRankResult<Self> {
        Self::build_with_axis(loans, capital, WeightAxis::default())
    }

    pub fn build_with_axis(
        loans: &SparseMatrix,
        capital: &Vector,
        axis: WeightAxis,
    ) -> DebtRankResult<Self> {
        if !loans.is_square() {
            return Err(DebtRankError::Shape(format!(
                "loan matrix must be square, got {}x{}",
                loans.rows(),
                loans.cols()
            )));
        }
        if let Some((row, col, value)) = loans
            .triplets()
            .into_iter()
            .find(|(_, _, v)| !v.is_finite() || *v < 0.0)
        {
            return Err(DebtRankError::InvalidInput(format!(
                "loan L[{}][{}] must be non-negative, got {}",
                row, col, value
            )));
        }

        let exposure = exposure_matrix(loans, capital)?;
        let loan_fractions = loan_fractions(loans, axis)?;

        debug!(
            "Exposure network: {} institutions, {} exposures (density {:.4}), {:?} weights",
            exposure.rows(),
            exposure.nnz(),
            exposure.density(),
            axis
        );

        Ok(Self {
            exposure,
            loan_fractions,
            axis,
        })
    }

    /// Use a precomputed exposure matrix and weights.
    pub fn from_parts(exposure: SparseMatrix, loan_fractions: Vector) -> DebtRankResult<Self> {
        if !exposure.is_square() {
            return Err(DebtRankError::Shape(format!(
                "exposure matrix must be square, got {}x{}",
                exposure.rows(),
                exposure.cols()
            )));
        }
        if loan_fractions.len() != exposure.rows() {
            return Err(DebtRankError::Shape(format!(
                "loan-fraction vector has {} entries but the network has {} institutions",
                loan_fractions.len(),
                exposure.rows()
            )));
        }
        Ok(Self {
            exposure,
            loan_fractions,
            axis: WeightAxis::default(),
        })
    }

    pub fn exposure(&self) -> &SparseMatrix {
        &self.exposure
    }

    pub fn loan_fractions(&self) -> &Vector {
        &self.loan_fractions
    }

    pub fn axis(&self) -> WeightAxis {
        self.axis
    }

    /// Number of institutions.
    pub fn institutions(&self) -> usize {
        self.exposure.rows()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic_loans() -> SparseMatrix {
        SparseMatrix::from_triplets(
            &[(0, 1, 20.0), (0, 2, 30.0), (1, 0, 40.0), (2, 1, 80.0)],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_exposure_basic() {
        let capital = Vector::dense(vec![100.0, 200.0, 300.0]);
        let w = exposure_matrix(&basic_loans(), &capital).unwrap();

        let expected = [(0, 1, 0.1), (0, 2, 0.1), (1, 0, 0.4), (2, 1, 0.4)];
        assert_eq!(w.nnz(), expected.len());
        for (i, j, value) in expected {
            assert!(
                (w.get(i, j).unwrap() - value).abs() < 1e-12,
                "W[{},{}]={:?} expected {}",
                i,
                j,
                w.get(i, j),
                value
            );
        }
    }

    #[test]
    fn test_exposure_is_capped_at_one() {
        let loans = SparseMatrix::from_triplets(
            &[(0, 0, 40.0), (1, 0, 60.0), (2, 0, 80.0), (0, 2, 120.0)],
            None,
        )
        .unwrap();
        let capital = Vector::dense(vec![30.0, 10.0, 240.0]);
        let w = exposure_matrix(&loans, &capital).unwrap();

        assert_eq!(w.get(0, 0), Some(1.0));
        assert_eq!(w.get(1, 0), Some(1.0));
        assert_eq!(w.get(2, 0), Some(1.0));
        assert_eq!(w.get(0, 2), Some(0.5));
    }

    #[test]
    fn test_exposure_zero_loans() {
        let loans = SparseMatrix::from_triplets(
            &[(0, 0, 0.0), (0, 1, 0.0), (1, 0, 0.0), (1, 1, 0.0)],
            None,
        )
        .unwrap();
        let capital = Vector::dense(vec![2.0, 3.0]);
        let w = exposure_matrix(&loans, &capital).unwrap();
        assert_eq!(w.reduce_all(Monoid::MAX), 0.0);
    }

    #[test]
    fn test_exposure_rejects_non_positive_capital() {
        let capital = Vector::dense(vec![100.0, 0.0, 300.0]);
        assert!(matches!(
            exposure_matrix(&basic_loans(), &capital),
            Err(DebtRankError::Division { institution: 1, .. })
        ));

        // Capital of an institution nobody lends to is never referenced.
        let loans = SparseMatrix::from_triplets(&[(0, 1, 5.0)], Some((2, 2))).unwrap();
        let capital = Vector::dense(vec![-1.0, 10.0]);
        assert!(exposure_matrix(&loans, &capital).is_ok());
    }

    #[test]
    fn test_loan_fractions_lender_axis() {
        let v = loan_fractions(&basic_loans(), WeightAxis::Lender).unwrap();
        let expected = [0.2353, 0.5882, 0.1765];
        for (got, want) in v.to_dense(0.0).iter().zip(expected) {
            assert!((got - want).abs() < 1e-4, "got {} want {}", got, want);
        }
    }

    #[test]
    fn test_loan_fractions_borrower_axis() {
        let v = loan_fractions(&basic_loans(), WeightAxis::Borrower).unwrap();
        let expected = [50.0 / 170.0, 40.0 / 170.0, 80.0 / 170.0];
        for (got, want) in v.to_dense(0.0).iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_loan_fractions_owe_equal() {
        let loans = SparseMatrix::from_triplets(
            &[
                (0, 1, 20.0),
                (0, 2, 20.0),
                (1, 0, 20.0),
                (1, 2, 20.0),
                (2, 0, 20.0),
                (2, 1, 20.0),
            ],
            None,
        )
        .unwrap();
        let v = loan_fractions(&loans, WeightAxis::Lender).unwrap();
        for value in v.to_dense(0.0) {
            assert!((value - 1.0 / 3.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_degenerate_network() {
        let loans = SparseMatrix::from_triplets(&[(0, 1, 0.0)], Some((2, 2))).unwrap();
        assert!(matches!(
            loan_fractions(&loans, WeightAxis::Lender),
            Err(DebtRankError::DegenerateNetwork)
        ));
        let capital = Vector::dense(vec![1.0, 1.0]);
        assert!(matches!(
            ExposureNetwork::build(&loans, &capital),
            Err(DebtRankError::DegenerateNetwork)
        ));
    }

    #[test]
    fn test_build_rejects_bad_shapes() {
        let loans = SparseMatrix::from_triplets(&[(0, 2, 1.0)], None).unwrap();
        let capital = Vector::dense(vec![1.0, 1.0, 1.0]);
        assert!(matches!(
            ExposureNetwork::build(&loans, &capital),
            Err(DebtRankError::Shape(_))
        ));

        let capital = Vector::dense(vec![1.0, 1.0]);
        assert!(matches!(
            ExposureNetwork::build(&basic_loans(), &capital),
            Err(DebtRankError::Shape(_))
        ));
    }

    #[test]
    fn test_loan_book_from_edges() {
        let book = LoanBook::from_edges(
            &[(0, 1, 20.0), (0, 2, 30.0), (1, 0, 40.0), (2, 1, 80.0)],
            &[(0, 100.0), (1, 200.0), (2, 300.0)],
            None,
        )
        .unwrap();
        assert_eq!(book.institutions(), 3);

        let network = book.exposure_network(WeightAxis::Lender).unwrap();
        assert_eq!(network.institutions(), 3);
        assert!((network.loan_fractions().reduce(Monoid::PLUS) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_loan_book_validation() {
        assert!(matches!(
            LoanBook::from_edges(&[(0, 1, -5.0)], &[(0, 1.0), (1, 1.0)], None),
            Err(DebtRankError::InvalidInput(_))
        ));
        assert!(matches!(
            LoanBook::from_edges(&[(0, 1, 5.0)], &[(0, f64::INFINITY)], None),
            Err(DebtRankError::InvalidInput(_))
        ));
        assert!(matches!(
            LoanBook::from_edges(&[(0, 4, 5.0)], &[], Some(3)),
            Err(DebtRankError::Shape(_))
        ));
        assert!(matches!(
            LoanBook::from_edges(&[(0, 1, 5.0)], &[(0, 50.0), (1, 10.0), (0, 50.0)], None),
            Err(DebtRankError::InvalidInput(_))
        ));
        // Capital listed for an isolated institution widens the network.
        let book = LoanBook::from_edges(&[(0, 1, 5.0)], &[(3, 1.0)], None).unwrap();
        assert_eq!(book.institutions(), 4);
    }
}
