//! Dense-or-sparse vectors and boolean masks.
//!
//! A [`Vector`] stores either every position (dense) or only the positions
//! that carry a value (sparse, `sprs::CsVec`). Callers never pick the storage;
//! every operation returns whichever fits the result. Positions without a
//! stored value are *absent*, which is different from a stored `0.0`:
//! elementwise operators only visit stored positions.
//!
//! Masked operations follow accumulator semantics: a position is written only
//! when the mask holds there *and* the operation produced a value for it.
//! Every other position keeps its prior value.

use crate::error::{SparseError, SparseResult};
use crate::ops::{BinaryOp, Monoid, SelectOp, UnaryOp};
use sprs::CsVec;
use std::collections::BTreeMap;

#[derive(Clone, Debug)]
enum Storage {
    Dense(Vec<f64>),
    Sparse(CsVec<f64>),
}

/// A length-`n` vector of `f64` with dense or sparse storage.
#[derive(Clone, Debug)]
pub struct Vector {
    storage: Storage,
}

/// Boolean vector selecting the positions an operation may write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    bits: Vec<bool>,
}

impl Mask {
    /// A mask with every position set to `value`.
    pub fn all(len: usize, value: bool) -> Self {
        Self {
            bits: vec![value; len],
        }
    }

    pub fn from_bits(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Out-of-range positions read as unset.
    pub fn get(&self, index: usize) -> bool {
        self.bits.get(index).copied().unwrap_or(false)
    }

    /// Number of set positions.
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn not(&self) -> Self {
        Self {
            bits: self.bits.iter().map(|b| !b).collect(),
        }
    }

    pub fn and(&self, other: &Mask) -> SparseResult<Self> {
        check_len("mask and", self.len(), other.len())?;
        Ok(Self {
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(a, b)| *a && *b)
                .collect(),
        })
    }

    pub fn or(&self, other: &Mask) -> SparseResult<Self> {
        check_len("mask or", self.len(), other.len())?;
        Ok(Self {
            bits: self
                .bits
                .iter()
                .zip(&other.bits)
                .map(|(a, b)| *a || *b)
                .collect(),
        })
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }
}

fn check_len(context: &'static str, expected: usize, found: usize) -> SparseResult<()> {
    if expected != found {
        return Err(SparseError::ShapeMismatch {
            context,
            expected,
            found,
        });
    }
    Ok(())
}

fn check_mask(context: &'static str, len: usize, mask: Option<&Mask>) -> SparseResult<()> {
    match mask {
        Some(m) => check_len(context, len, m.len()),
        None => Ok(()),
    }
}

impl Vector {
    /// All positions stored as `0.0`.
    pub fn zeros(len: usize) -> Self {
        Self::dense(vec![0.0; len])
    }

    /// No stored positions.
    pub fn empty(len: usize) -> Self {
        Self {
            storage: Storage::Sparse(CsVec::empty(len)),
        }
    }

    pub fn dense(values: Vec<f64>) -> Self {
        Self {
            storage: Storage::Dense(values),
        }
    }

    /// Build from `(index, value)` pairs; duplicate indices are summed.
    pub fn from_entries(len: usize, entries: &[(usize, f64)]) -> SparseResult<Self> {
        let mut acc: BTreeMap<usize, f64> = BTreeMap::new();
        for &(index, value) in entries {
            if index >= len {
                return Err(SparseError::IndexOutOfRange { index, len });
            }
            *acc.entry(index).or_insert(0.0) += value;
        }

        if acc.len() == len {
            return Ok(Self::dense(acc.into_values().collect()));
        }
        let (indices, data): (Vec<usize>, Vec<f64>) = acc.into_iter().unzip();
        Ok(Self {
            storage: Storage::Sparse(CsVec::new(len, indices, data)),
        })
    }

    /// Build from per-position slots, picking dense storage when every slot is filled.
    pub(crate) fn from_slots(slots: Vec<Option<f64>>) -> Self {
        if slots.iter().all(Option::is_some) {
            return Self::dense(slots.into_iter().flatten().collect());
        }
        let len = slots.len();
        let (indices, data): (Vec<usize>, Vec<f64>) = slots
            .into_iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
            .unzip();
        Self {
            storage: Storage::Sparse(CsVec::new(len, indices, data)),
        }
    }

    pub(crate) fn slots(&self) -> Vec<Option<f64>> {
        match &self.storage {
            Storage::Dense(values) => values.iter().copied().map(Some).collect(),
            Storage::Sparse(sparse) => {
                let mut slots = vec![None; sparse.dim()];
                for (i, &v) in sparse.iter() {
                    slots[i] = Some(v);
                }
                slots
            }
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Dense(values) => values.len(),
            Storage::Sparse(sparse) => sparse.dim(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored positions.
    pub fn nnz(&self) -> usize {
        match &self.storage {
            Storage::Dense(values) => values.len(),
            Storage::Sparse(sparse) => sparse.nnz(),
        }
    }

    /// Stored fraction of positions.
    pub fn density(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.nnz() as f64 / self.len() as f64
    }

    pub fn is_dense(&self) -> bool {
        matches!(self.storage, Storage::Dense(_))
    }

    /// Stored value at `index`, or `None` when absent or out of range.
    pub fn get(&self, index: usize) -> Option<f64> {
        match &self.storage {
            Storage::Dense(values) => values.get(index).copied(),
            Storage::Sparse(sparse) => {
                if index >= sparse.dim() {
                    return None;
                }
                sparse.get(index).copied()
            }
        }
    }

    /// Stored `(index, value)` pairs in ascending index order.
    pub fn iter(&self) -> VectorIter<'_> {
        match &self.storage {
            Storage::Dense(values) => VectorIter::Dense(values.iter().enumerate()),
            Storage::Sparse(sparse) => VectorIter::Sparse {
                indices: sparse.indices().iter(),
                data: sparse.data().iter(),
            },
        }
    }

    /// Dense copy with absent positions replaced by `fill`.
    pub fn to_dense(&self, fill: f64) -> Vec<f64> {
        match &self.storage {
            Storage::Dense(values) => values.clone(),
            Storage::Sparse(_) => {
                let mut out = vec![fill; self.len()];
                for (i, v) in self.iter() {
                    out[i] = v;
                }
                out
            }
        }
    }

    /// Write `computed` values into a copy of `self` wherever the mask allows.
    fn write_masked(&self, computed: Vec<Option<f64>>, mask: Option<&Mask>) -> Self {
        let mut slots = self.slots();
        for (i, value) in computed.into_iter().enumerate() {
            if let Some(value) = value {
                if mask.map_or(true, |m| m.get(i)) {
                    slots[i] = Some(value);
                }
            }
        }
        Self::from_slots(slots)
    }

    /// `op(x)` at every stored, masked position.
    pub fn apply(&self, op: UnaryOp, mask: Option<&Mask>) -> SparseResult<Self> {
        check_mask("apply", self.len(), mask)?;
        let computed = self
            .slots()
            .into_iter()
            .map(|v| v.map(|x| op.apply(x)))
            .collect();
        Ok(self.write_masked(computed, mask))
    }

    /// `op(x, scalar)` at every stored, masked position.
    pub fn apply_binary(
        &self,
        op: BinaryOp,
        scalar: f64,
        mask: Option<&Mask>,
    ) -> SparseResult<Self> {
        check_mask("apply_binary", self.len(), mask)?;
        let mut computed = Vec::with_capacity(self.len());
        for (i, slot) in self.slots().into_iter().enumerate() {
            match slot {
                Some(x) if mask.map_or(true, |m| m.get(i)) => {
                    computed.push(Some(op.apply(x, scalar)?))
                }
                _ => computed.push(None),
            }
        }
        Ok(self.write_masked(computed, mask))
    }

    /// Elementwise combine over the union of stored positions.
    ///
    /// Where only one side is stored, that side's value is taken unchanged.
    pub fn ewise_union(
        &self,
        other: &Vector,
        op: BinaryOp,
        mask: Option<&Mask>,
    ) -> SparseResult<Self> {
        check_len("ewise_union", self.len(), other.len())?;
        check_mask("ewise_union", self.len(), mask)?;
        let mut computed = Vec::with_capacity(self.len());
        for (i, (a, b)) in self.slots().into_iter().zip(other.slots()).enumerate() {
            if !mask.map_or(true, |m| m.get(i)) {
                computed.push(None);
                continue;
            }
            computed.push(match (a, b) {
                (Some(a), Some(b)) => Some(op.apply(a, b)?),
                (Some(a), None) => Some(a),
                (None, Some(b)) => Some(b),
                (None, None) => None,
            });
        }
        Ok(self.write_masked(computed, mask))
    }

    /// Elementwise combine over the intersection of stored positions.
    pub fn ewise_intersect(
        &self,
        other: &Vector,
        op: BinaryOp,
        mask: Option<&Mask>,
    ) -> SparseResult<Self> {
        check_len("ewise_intersect", self.len(), other.len())?;
        check_mask("ewise_intersect", self.len(), mask)?;
        let mut computed = Vec::with_capacity(self.len());
        for (i, (a, b)) in self.slots().into_iter().zip(other.slots()).enumerate() {
            match (a, b) {
                (Some(a), Some(b)) if mask.map_or(true, |m| m.get(i)) => {
                    computed.push(Some(op.apply(a, b)?))
                }
                _ => computed.push(None),
            }
        }
        Ok(self.write_masked(computed, mask))
    }

    /// Fold stored values in index order.
    pub fn reduce(&self, monoid: Monoid) -> f64 {
        monoid.fold(self.iter().map(|(_, v)| v))
    }

    /// Mask of stored positions whose value satisfies `op`.
    pub fn select(&self, op: SelectOp) -> Mask {
        self.select_by(|x| op.matches(x))
    }

    pub fn select_by<F: Fn(f64) -> bool>(&self, predicate: F) -> Mask {
        let mut bits = vec![false; self.len()];
        for (i, v) in self.iter() {
            bits[i] = predicate(v);
        }
        Mask::from_bits(bits)
    }

    /// Keep only the stored positions the mask selects.
    pub fn extract(&self, mask: &Mask) -> SparseResult<Self> {
        check_len("extract", self.len(), mask.len())?;
        let slots = self
            .slots()
            .into_iter()
            .enumerate()
            .map(|(i, v)| if mask.get(i) { v } else { None })
            .collect();
        Ok(Self::from_slots(slots))
    }

    /// Sum of `self[i] * other[i]` over positions stored in both, in index order.
    pub fn dot(&self, other: &Vector) -> SparseResult<f64> {
        check_len("dot", self.len(), other.len())?;
        Ok(self
            .iter()
            .filter_map(|(i, a)| other.get(i).map(|b| a * b))
            .fold(0.0, |acc, x| acc + x))
    }

    /// Same stored pattern and `|a - b| <= max(rel_tol * max(|a|, |b|), abs_tol)` everywhere.
    pub fn is_close(&self, other: &Vector, rel_tol: f64, abs_tol: f64) -> bool {
        if self.len() != other.len() || self.nnz() != other.nnz() {
            return false;
        }
        self.iter().zip(other.iter()).all(|((i, a), (j, b))| {
            if i != j {
                return false;
            }
            if a == b {
                return true;
            }
            let tol = (rel_tol * a.abs().max(b.abs())).max(abs_tol);
            (a - b).abs() <= tol
        })
    }
}

impl PartialEq for Vector {
    /// Equal when lengths and stored entries agree, regardless of storage.
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

/// Iterator over stored `(index, value)` pairs.
pub enum VectorIter<'a> {
    Dense(std::iter::Enumerate<std::slice::Iter<'a, f64>>),
    Sparse {
        indices: std::slice::Iter<'a, usize>,
        data: std::slice::Iter<'a, f64>,
    },
}

impl Iterator for VectorIter<'_> {
    type Item = (usize, f64);

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            VectorIter::Dense(inner) => inner.next().map(|(i, &v)| (i, v)),
            VectorIter::Sparse { indices, data } => match (indices.next(), data.next()) {
                (Some(&i), Some(&v)) => Some((i, v)),
                _ => None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_entries_sums_duplicates() {
        let v = Vector::from_entries(4, &[(1, 0.5), (3, 1.0), (1, 0.25)]).unwrap();
        assert_eq!(v.len(), 4);
        assert_eq!(v.nnz(), 2);
        assert!(!v.is_dense());
        assert_eq!(v.get(1), Some(0.75));
        assert_eq!(v.get(0), None);
    }

    #[test]
    fn test_from_entries_full_pattern_is_dense() {
        let v = Vector::from_entries(2, &[(1, 2.0), (0, 1.0)]).unwrap();
        assert!(v.is_dense());
        assert_eq!(v.to_dense(0.0), vec![1.0, 2.0]);
    }

    #[test]
    fn test_from_entries_rejects_out_of_range() {
        assert_eq!(
            Vector::from_entries(2, &[(2, 1.0)]),
            Err(SparseError::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn test_storage_is_transparent_to_equality() {
        let sparse = Vector::from_entries(3, &[(0, 1.0), (2, 3.0)]).unwrap();
        let dense = Vector::dense(vec![1.0, 0.0, 3.0]);
        assert_ne!(sparse, dense);
        assert_eq!(sparse.to_dense(0.0), dense.to_dense(0.0));
        let full = sparse
            .ewise_union(&Vector::zeros(3), BinaryOp::Plus, None)
            .unwrap();
        assert_eq!(full, dense);
    }

    #[test]
    fn test_masked_apply_keeps_unmasked_values() {
        let v = Vector::dense(vec![1.5, 0.2, 3.0]);
        let mask = Mask::from_bits(vec![true, true, false]);
        let out = v.apply(UnaryOp::ClampToOne, Some(&mask)).unwrap();
        assert_eq!(out.to_dense(0.0), vec![1.0, 0.2, 3.0]);
        // Operand untouched
        assert_eq!(v.get(0), Some(1.5));
    }

    #[test]
    fn test_mask_length_mismatch() {
        let v = Vector::zeros(3);
        let mask = Mask::all(2, true);
        assert!(matches!(
            v.apply(UnaryOp::Identity, Some(&mask)),
            Err(SparseError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_apply_binary_truediv_by_zero() {
        let v = Vector::dense(vec![1.0, 2.0]);
        assert!(v.apply_binary(BinaryOp::TrueDiv, 0.0, None).is_err());
        let halved = v.apply_binary(BinaryOp::TrueDiv, 2.0, None).unwrap();
        assert_eq!(halved.to_dense(0.0), vec![0.5, 1.0]);
    }

    #[test]
    fn test_apply_binary_skips_unmasked_division() {
        // The zero divisor is never evaluated at unmasked positions.
        let v = Vector::dense(vec![1.0, 2.0]);
        let mask = Mask::from_bits(vec![false, false]);
        assert_eq!(
            v.apply_binary(BinaryOp::TrueDiv, 0.0, Some(&mask)).unwrap(),
            v
        );
    }

    #[test]
    fn test_union_and_intersect() {
        let a = Vector::from_entries(4, &[(0, 1.0), (1, 2.0)]).unwrap();
        let b = Vector::from_entries(4, &[(1, 5.0), (3, 7.0)]).unwrap();

        let union = a.ewise_union(&b, BinaryOp::Max, None).unwrap();
        assert_eq!(
            union.iter().collect::<Vec<_>>(),
            vec![(0, 1.0), (1, 5.0), (3, 7.0)]
        );

        let inter = a.ewise_intersect(&b, BinaryOp::Times, None).unwrap();
        assert_eq!(inter.iter().collect::<Vec<_>>(), vec![(0, 1.0), (1, 10.0)]);
    }

    #[test]
    fn test_masked_union_accumulates() {
        let h = Vector::dense(vec![0.1, 0.2, 0.3]);
        let impact = Vector::dense(vec![0.5, 0.5, 0.5]);
        let active = Mask::from_bits(vec![true, false, true]);
        let out = h.ewise_union(&impact, BinaryOp::Plus, Some(&active)).unwrap();
        let dense = out.to_dense(0.0);
        assert!((dense[0] - 0.6).abs() < 1e-12);
        assert_eq!(dense[1], 0.2);
        assert!((dense[2] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_select_and_extract() {
        let s = Vector::dense(vec![0.0, 1.0, 2.0, 1.0]);
        let distressed = s.select(SelectOp::Eq(1.0));
        assert_eq!(distressed.as_slice(), &[false, true, false, true]);
        assert_eq!(distressed.count(), 2);

        let h = Vector::dense(vec![0.1, 0.2, 0.3, 0.4]);
        let picked = h.extract(&distressed).unwrap();
        assert_eq!(picked.iter().collect::<Vec<_>>(), vec![(1, 0.2), (3, 0.4)]);
    }

    #[test]
    fn test_reduce_and_dot() {
        let v = Vector::dense(vec![0.25, 0.5, 0.25]);
        assert_eq!(v.reduce(Monoid::PLUS), 1.0);
        assert_eq!(v.reduce(Monoid::MAX), 0.5);
        assert_eq!(Vector::empty(3).reduce(Monoid::MAX), f64::NEG_INFINITY);

        let w = Vector::from_entries(3, &[(1, 2.0)]).unwrap();
        assert_eq!(v.dot(&w).unwrap(), 1.0);
        assert!(v.dot(&Vector::zeros(2)).is_err());
    }

    #[test]
    fn test_is_close() {
        let a = Vector::dense(vec![0.1, 0.2]);
        let b = Vector::dense(vec![0.1 + 1e-12, 0.2]);
        assert!(a.is_close(&b, 0.0, 1e-9));
        assert!(!a.is_close(&b, 0.0, 0.0));
        assert!(!a.is_close(&Vector::from_entries(2, &[(0, 0.1)]).unwrap(), 0.0, 1.0));
    }

    #[test]
    fn test_mask_logic() {
        let a = Mask::from_bits(vec![true, false, true]);
        let b = Mask::from_bits(vec![true, true, false]);
        assert_eq!(a.and(&b).unwrap().as_slice(), &[true, false, false]);
        assert_eq!(a.or(&b).unwrap().as_slice(), &[true, true, true]);
        assert_eq!(a.not().as_slice(), &[false, true, false]);
        assert!(a.and(&Mask::all(2, true)).is_err());
    }
}
