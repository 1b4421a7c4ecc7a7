//! Named operator table.
//!
//! Solvers refer to operators by name so that propagation rules can be
//! swapped from configuration. Names are case-insensitive.

use crate::error::{SparseError, SparseResult};
use crate::ops::{BinaryOp, Monoid, Semiring, UnaryOp};
use std::collections::HashMap;

/// A registry entry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Operator {
    Unary(UnaryOp),
    Binary(BinaryOp),
    Monoid(Monoid),
    Semiring(Semiring),
}

impl Operator {
    pub fn kind(&self) -> &'static str {
        match self {
            Operator::Unary(_) => "unary operator",
            Operator::Binary(_) => "binary operator",
            Operator::Monoid(_) => "monoid",
            Operator::Semiring(_) => "semiring",
        }
    }
}

/// Name → operator lookup.
///
/// Create with `OperatorRegistry::new()` for an empty table or
/// `OperatorRegistry::with_defaults()` for the built-in operators.
#[derive(Clone, Debug, Default)]
pub struct OperatorRegistry {
    entries: HashMap<String, Operator>,
}

impl OperatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in operator.
    ///
    /// The decayed operators are registered with `beta = 1.0`; use
    /// [`Semiring::with_decay`] to set the damping factor.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        for op in [
            UnaryOp::Identity,
            UnaryOp::ClampToOne,
            UnaryOp::ClampFloor,
            UnaryOp::ThresholdToState,
            UnaryOp::ZeroToInactive,
            UnaryOp::DistressedToInactive,
            UnaryOp::Abs,
        ] {
            registry.register(op.as_str(), Operator::Unary(op));
        }

        for op in [
            BinaryOp::Plus,
            BinaryOp::Minus,
            BinaryOp::Times,
            BinaryOp::TrueDiv,
            BinaryOp::Min,
            BinaryOp::Max,
            BinaryOp::LAnd,
            BinaryOp::LOr,
            BinaryOp::DecayedPlus { beta: 1.0 },
        ] {
            registry.register(op.as_str(), Operator::Binary(op));
        }

        registry.register("plus_monoid", Operator::Monoid(Monoid::PLUS));
        registry.register("max_monoid", Operator::Monoid(Monoid::MAX));
        registry.register("min_monoid", Operator::Monoid(Monoid::MIN));
        registry.register("land_monoid", Operator::Monoid(Monoid::LAND));
        registry.register("lor_monoid", Operator::Monoid(Monoid::LOR));

        registry.register("plus_times", Operator::Semiring(Semiring::PLUS_TIMES));
        registry.register("plus_decayed", Operator::Semiring(Semiring::damped(1.0)));
        registry.register("max_times", Operator::Semiring(Semiring::MAX_TIMES));
        registry.register("min_plus", Operator::Semiring(Semiring::MIN_PLUS));
        registry.register("lor_land", Operator::Semiring(Semiring::LOR_LAND));

        registry
    }

    /// Register (or replace) an operator. Returns the previous entry, if any.
    pub fn register(&mut self, name: impl Into<String>, op: Operator) -> Option<Operator> {
        let name: String = name.into();
        self.entries.insert(name.to_ascii_lowercase(), op)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_ascii_lowercase())
    }

    /// Look up an operator of any kind.
    pub fn get(&self, name: &str) -> SparseResult<Operator> {
        self.entries
            .get(&name.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| SparseError::UnknownOperator(name.to_string()))
    }

    pub fn unary(&self, name: &str) -> SparseResult<UnaryOp> {
        match self.get(name)? {
            Operator::Unary(op) => Ok(op),
            other => Err(kind_error(name, "unary operator", &other)),
        }
    }

    pub fn binary(&self, name: &str) -> SparseResult<BinaryOp> {
        match self.get(name)? {
            Operator::Binary(op) => Ok(op),
            other => Err(kind_error(name, "binary operator", &other)),
        }
    }

    pub fn monoid(&self, name: &str) -> SparseResult<Monoid> {
        match self.get(name)? {
            Operator::Monoid(m) => Ok(m),
            other => Err(kind_error(name, "monoid", &other)),
        }
    }

    pub fn semiring(&self, name: &str) -> SparseResult<Semiring> {
        match self.get(name)? {
            Operator::Semiring(s) => Ok(s),
            other => Err(kind_error(name, "semiring", &other)),
        }
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn kind_error(name: &str, expected: &'static str, found: &Operator) -> SparseError {
    SparseError::OperatorKind {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}
