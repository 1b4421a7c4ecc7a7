//! # debtrank-core: Sparse Propagation Primitives
//!
//! Provides the sparse matrix/vector store and the operator algebra that the
//! DebtRank solver is written in.
//!
//! ## Design Philosophy
//!
//! Propagation over a financial network is a sequence of masked sparse
//! updates. Instead of hard-coding arithmetic, every step is expressed as an
//! elementwise operator, a reduction over a monoid, or a matrix-vector product
//! over a semiring:
//!
//! ```text
//! impact = W ⊕.⊗ h          (semiring product, default plus.times)
//! h'<m>  = min(1, h + impact)  (masked elementwise update)
//! R      = ⊕ v ⊗ h          (monoid reduction)
//! ```
//!
//! Swapping the semiring (for example to a damped `plus.decayed`) changes the
//! propagation rule without touching the solver.
//!
//! ## Quick Start
//!
//! ```rust
//! use debtrank_core::{OperatorRegistry, SparseMatrix, Vector};
//!
//! let w = SparseMatrix::from_triplets(&[(0, 1, 0.5), (2, 1, 0.25)], Some((3, 3))).unwrap();
//! let h = Vector::dense(vec![0.0, 0.5, 0.0]);
//!
//! let registry = OperatorRegistry::with_defaults();
//! let plus_times = registry.semiring("plus_times").unwrap();
//! let impact = w.mat_vec(&h, &plus_times).unwrap();
//! assert_eq!(impact.to_dense(0.0), vec![0.25, 0.0, 0.125]);
//! ```
//!
//! ## Modules
//!
//! - [`matrix`] - CSR sparse matrix: construction, apply, reductions, `mat_vec`
//! - [`vector`] - Dense-or-sparse vectors and boolean masks
//! - [`ops`] - Unary/binary operators, monoids, semirings, select predicates
//! - [`registry`] - Name → operator lookup
//! - [`error`] - [`SparseError`]
//!
//! ## Features
//!
//! - `parallel` (default): row-parallel `mat_vec` with rayon. Results are
//!   identical with and without it.

pub mod error;
pub mod matrix;
pub mod ops;
pub mod registry;
pub mod vector;

pub use error::{SparseError, SparseResult};
pub use matrix::SparseMatrix;
pub use ops::{BinaryOp, Monoid, SelectOp, Semiring, UnaryOp, DISTRESSED, INACTIVE, UNDISTRESSED};
pub use registry::{Operator, OperatorRegistry};
pub use vector::{Mask, Vector, VectorIter};
